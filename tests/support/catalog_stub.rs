//! In-memory product catalog served through a stub handler.

use super::{Handler, json_response, set_handler};
use apicheck::catalog::{NewProduct, Product, Rating};
use bytes::Bytes;
use hyper::{Method, Request, StatusCode};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

/// Products the stub starts with.
pub fn seed() -> Vec<Product> {
    let product = |id, title: &str, price, category: &str| Product {
        id,
        title: title.into(),
        price,
        description: format!("{title} description"),
        category: category.into(),
        image: format!("https://fakestoreapi.com/img/{id}.jpg"),
        rating: Some(Rating {
            rate: 4.1,
            count: 120,
        }),
    };
    vec![
        product(1, "Canvas Backpack", 109.95, "bags"),
        product(2, "Solid Gold Ring", 168.0, "jewelery"),
        product(3, "Portable Drive", 64.0, "electronics"),
        product(4, "Monitor", 599.0, "electronics"),
    ]
}

/// A well-formed payload for create and replace requests.
pub fn new_product() -> NewProduct {
    NewProduct {
        title: "Rain Jacket".into(),
        price: 39.99,
        description: "Lightweight and water resistant".into(),
        category: "clothing".into(),
        image: "https://fakestoreapi.com/img/71HblAHs5xL.jpg".into(),
    }
}

fn limit_param(req: &Request<Bytes>) -> Option<usize> {
    let query = req.uri().query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "limit")
        .and_then(|(_, v)| v.parse().ok())
}

fn not_found() -> hyper::Response<http_body_util::Full<Bytes>> {
    json_response(StatusCode::NOT_FOUND, &json!({ "error": "not found" }))
}

fn bad_request(message: String) -> hyper::Response<http_body_util::Full<Bytes>> {
    json_response(StatusCode::BAD_REQUEST, &json!({ "error": message }))
}

fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).expect("serialise stub value")
}

/// Install the catalog on `handler`, answering creates with `created_status`.
///
/// Returns the shared store so tests can inspect what the stub holds.
pub fn install(handler: &Handler, created_status: StatusCode) -> Arc<Mutex<Vec<Product>>> {
    let store = Arc::new(Mutex::new(seed()));
    let shared = Arc::clone(&store);
    set_handler(handler, move |req| {
        let mut products = shared.lock().expect("lock catalog");
        let segments: Vec<&str> = req.uri().path().split('/').filter(|s| !s.is_empty()).collect();
        match (req.method(), segments.as_slice()) {
            (&Method::GET, ["products"]) => {
                let limit = limit_param(req).unwrap_or(products.len());
                let page: Vec<&Product> = products.iter().take(limit).collect();
                json_response(StatusCode::OK, &to_json(&page))
            }
            (&Method::GET, ["products", "categories"]) => {
                let mut categories: Vec<&str> =
                    products.iter().map(|p| p.category.as_str()).collect();
                categories.sort_unstable();
                categories.dedup();
                json_response(StatusCode::OK, &to_json(&categories))
            }
            (&Method::GET, ["products", "category", category]) => {
                let matching: Vec<&Product> =
                    products.iter().filter(|p| p.category == *category).collect();
                json_response(StatusCode::OK, &to_json(&matching))
            }
            (&Method::GET, ["products", id]) => id
                .parse::<u64>()
                .ok()
                .and_then(|id| products.iter().find(|p| p.id == id))
                .map_or_else(not_found, |p| json_response(StatusCode::OK, &to_json(p))),
            (&Method::POST, ["products"]) => match serde_json::from_slice::<NewProduct>(req.body()) {
                Ok(payload) => {
                    let id = products.iter().map(|p| p.id).max().unwrap_or(0) + 1;
                    let created = Product::from_new(id, payload);
                    products.push(created.clone());
                    json_response(created_status, &to_json(&created))
                }
                Err(e) => bad_request(e.to_string()),
            },
            (&Method::PUT, ["products", id]) => {
                let Some(slot) = id
                    .parse::<u64>()
                    .ok()
                    .and_then(|id| products.iter_mut().find(|p| p.id == id))
                else {
                    return not_found();
                };
                match serde_json::from_slice::<NewProduct>(req.body()) {
                    Ok(payload) => {
                        *slot = Product::from_new(slot.id, payload);
                        json_response(StatusCode::OK, &to_json(slot))
                    }
                    Err(e) => bad_request(e.to_string()),
                }
            }
            (&Method::PATCH, ["products", id]) => {
                let Some(slot) = id
                    .parse::<u64>()
                    .ok()
                    .and_then(|id| products.iter_mut().find(|p| p.id == id))
                else {
                    return not_found();
                };
                let Ok(Value::Object(changes)) = serde_json::from_slice::<Value>(req.body()) else {
                    return bad_request("expected a JSON object".into());
                };
                let mut merged = to_json(slot);
                if let Value::Object(map) = &mut merged {
                    for (k, v) in changes {
                        if k != "id" {
                            map.insert(k, v);
                        }
                    }
                }
                match serde_json::from_value::<Product>(merged) {
                    Ok(updated) => {
                        *slot = updated;
                        json_response(StatusCode::OK, &to_json(slot))
                    }
                    Err(e) => bad_request(e.to_string()),
                }
            }
            (&Method::DELETE, ["products", id]) => {
                let Some(pos) = id
                    .parse::<u64>()
                    .ok()
                    .and_then(|id| products.iter().position(|p| p.id == id))
                else {
                    return not_found();
                };
                let removed = products.remove(pos);
                json_response(StatusCode::OK, &to_json(&removed))
            }
            _ => not_found(),
        }
    });
    store
}
