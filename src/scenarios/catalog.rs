//! Product catalog scenarios.

use std::collections::HashSet;
use std::time::Duration;

use log::info;
use reqwest::StatusCode;
use serde_json::{Value, json};

use super::ensure;
use crate::catalog::{Catalog, NewProduct, Product, Validate, decode_valid};
use crate::client::HttpClient;
use crate::error::{BoxedStr, HarnessError};

/// The listing is a non-empty JSON array of valid products with unique ids.
///
/// # Errors
///
/// Returns the first failed expectation or transport error.
pub async fn list_products(client: &HttpClient) -> Result<(), HarnessError> {
    info!("scenario: list products");
    let resp = client.get("products", &[]).await?;
    ensure(resp.is_json(), || {
        format!("content-type {:?} is not JSON", resp.content_type())
    })?;
    let products: Vec<Product> = decode_valid(&resp)?;
    ensure(!products.is_empty(), || "catalog listing is empty".into())?;
    let ids: HashSet<u64> = products.iter().map(|p| p.id).collect();
    ensure(ids.len() == products.len(), || {
        "catalog listing repeats product ids".into()
    })
}

/// Product `id` is returned with every field present and typed.
///
/// # Errors
///
/// Returns the first failed expectation or transport error.
pub async fn single_product(client: &HttpClient, id: u64) -> Result<(), HarnessError> {
    info!("scenario: single product {id}");
    let product = Catalog::new(client).product(id).await?;
    ensure(product.id == id, || {
        format!("asked for product {id}, got {}", product.id)
    })
}

/// `limit` caps the listing length. A positive limit must still yield at
/// least one product; a limit of zero accepts an empty listing.
///
/// # Errors
///
/// Returns the first failed expectation or transport error.
pub async fn limit_products(client: &HttpClient, limit: usize) -> Result<(), HarnessError> {
    info!("scenario: list at most {limit} products");
    let products = Catalog::new(client).products(Some(limit)).await?;
    ensure(limit == 0 || !products.is_empty(), || {
        "limited listing is empty".into()
    })?;
    ensure(products.len() <= limit, || {
        format!("asked for {limit} products, got {}", products.len())
    })
}

/// Categories are a non-empty list of distinct, non-blank names.
///
/// # Errors
///
/// Returns the first failed expectation or transport error.
pub async fn list_categories(client: &HttpClient) -> Result<Vec<String>, HarnessError> {
    info!("scenario: list categories");
    let categories = Catalog::new(client).categories().await?;
    ensure(!categories.is_empty(), || "no categories".into())?;
    ensure(categories.iter().all(|c| !c.trim().is_empty()), || {
        "blank category name".into()
    })?;
    let distinct: HashSet<&str> = categories.iter().map(String::as_str).collect();
    ensure(distinct.len() == categories.len(), || {
        "duplicate category names".into()
    })?;
    Ok(categories)
}

/// Every product listed under `category` belongs to it.
///
/// # Errors
///
/// Returns the first failed expectation or transport error.
pub async fn products_in_category(
    client: &HttpClient,
    category: &str,
) -> Result<(), HarnessError> {
    info!("scenario: products in category {category:?}");
    let products = Catalog::new(client).in_category(category).await?;
    ensure(!products.is_empty(), || {
        format!("category {category:?} has no products")
    })?;
    if let Some(stray) = products.iter().find(|p| p.category != category) {
        return Err(HarnessError::Assertion(
            format!(
                "product {} has category {:?}, expected {category:?}",
                stray.id, stray.category
            )
            .boxed(),
        ));
    }
    Ok(())
}

/// Creation answers 201 with an id and echoes every submitted field.
///
/// # Errors
///
/// Returns the first failed expectation or transport error.
pub async fn create_product(
    client: &HttpClient,
    payload: &NewProduct,
) -> Result<Product, HarnessError> {
    info!("scenario: create product {:?}", payload.title);
    payload.validate()?;
    let written = Catalog::new(client).create(payload).await?;
    ensure(written.status == StatusCode::CREATED, || {
        format!("create answered {}, expected 201", written.status)
    })?;
    payload.expect_echoed_by(&written.value)?;
    Ok(written.value)
}

/// Post a product without a title and report what the catalog says.
///
/// No contract is enforced for incomplete payloads: the status is logged and
/// returned for the caller to inspect.
///
/// # Errors
///
/// Returns transport errors only.
pub async fn create_incomplete_product(
    client: &HttpClient,
    payload: &NewProduct,
) -> Result<StatusCode, HarnessError> {
    info!("scenario: create product without a title");
    let mut body = serde_json::to_value(payload)
        .map_err(|e| HarnessError::Payload(format!("POST products: {e}").boxed()))?;
    if let Value::Object(map) = &mut body {
        map.remove("title");
    }
    let resp = client.post("products", Some(&body)).await?;
    info!(
        "catalog answered {} for a product without title: {}",
        resp.status(),
        resp.snippet()
    );
    Ok(resp.status())
}

/// Replacing product `id` answers 200 and echoes the new fields.
///
/// # Errors
///
/// Returns the first failed expectation or transport error.
pub async fn update_product(
    client: &HttpClient,
    id: u64,
    payload: &NewProduct,
) -> Result<(), HarnessError> {
    info!("scenario: replace product {id}");
    let written = Catalog::new(client).replace(id, payload).await?;
    ensure(written.status == StatusCode::OK, || {
        format!("replace answered {}, expected 200", written.status)
    })?;
    ensure(written.value.id == id, || {
        format!("replaced product {id}, got back {}", written.value.id)
    })?;
    payload.expect_echoed_by(&written.value)
}

/// Patching the title of product `id` echoes the new title.
///
/// # Errors
///
/// Returns the first failed expectation or transport error.
pub async fn patch_product(client: &HttpClient, id: u64, title: &str) -> Result<(), HarnessError> {
    info!("scenario: patch title of product {id}");
    let resp = client
        .patch(&format!("products/{id}"), Some(&json!({ "title": title })))
        .await?;
    ensure(resp.status() == StatusCode::OK, || {
        format!("patch answered {}, expected 200", resp.status())
    })?;
    let product: Product = decode_valid(&resp)?;
    ensure(product.title == title, || {
        format!("patched title {title:?}, got back {:?}", product.title)
    })
}

/// Deleting product `id` answers a success status.
///
/// # Errors
///
/// Returns the first failed expectation or transport error.
pub async fn delete_product(client: &HttpClient, id: u64) -> Result<(), HarnessError> {
    info!("scenario: delete product {id}");
    let resp = Catalog::new(client).delete(id).await?;
    ensure(resp.status().is_success(), || {
        format!("delete answered {}", resp.status())
    })
}

/// A single GET of `path` completes within `budget`.
///
/// # Errors
///
/// Returns the first failed expectation or transport error.
pub async fn response_time(
    client: &HttpClient,
    path: &str,
    budget: Duration,
) -> Result<Duration, HarnessError> {
    info!("scenario: GET {path} within {}ms", budget.as_millis());
    let resp = client.get(path, &[]).await?;
    let elapsed = resp.elapsed();
    ensure(elapsed <= budget, || {
        format!(
            "GET {path} took {}ms, budget {}ms",
            elapsed.as_millis(),
            budget.as_millis()
        )
    })?;
    Ok(elapsed)
}

/// An intercepted empty catalog answers 200 with an empty array.
///
/// # Errors
///
/// Returns the first failed expectation or transport error.
pub async fn empty_catalog(client: &HttpClient) -> Result<(), HarnessError> {
    info!("scenario: empty catalog");
    let resp = client.get("products", &[]).await?;
    let items: Vec<Value> = resp.json()?;
    ensure(items.is_empty(), || {
        format!("expected no products, got {}", items.len())
    })
}

/// An intercepted failing catalog answers 500 and the strict GET rejects it.
///
/// # Errors
///
/// Returns the first failed expectation or transport error.
pub async fn server_error(client: &HttpClient) -> Result<(), HarnessError> {
    info!("scenario: catalog server error");
    let resp = client.get_raw("products", &[]).await?;
    ensure(resp.status() == StatusCode::INTERNAL_SERVER_ERROR, || {
        format!("expected 500, got {}", resp.status())
    })?;
    match client.get("products", &[]).await {
        Err(HarnessError::UnexpectedStatus { status, .. })
            if status == StatusCode::INTERNAL_SERVER_ERROR =>
        {
            Ok(())
        }
        Err(other) => Err(other),
        Ok(resp) => Err(HarnessError::Assertion(
            format!("strict GET accepted status {}", resp.status()).boxed(),
        )),
    }
}

/// A created product reads back field-for-field equal to the payload.
///
/// # Errors
///
/// Returns the first failed expectation or transport error.
pub async fn round_trip(client: &HttpClient, payload: &NewProduct) -> Result<(), HarnessError> {
    info!("scenario: create and read back {:?}", payload.title);
    let created = create_product(client, payload).await?;
    let fetched = Catalog::new(client).product(created.id).await?;
    ensure(fetched.id == created.id, || {
        format!("read back product {} as {}", created.id, fetched.id)
    })?;
    payload.expect_echoed_by(&fetched)
}
