//! Typed access to the product catalog.
//!
//! Responses are decoded into [`Product`] records and validated once here, so
//! scenarios work with typed values instead of probing raw JSON.

mod product;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::client::{ApiResponse, HttpClient};
use crate::error::HarnessError;

pub use self::product::{NewProduct, Product, Rating, Validate};

/// Status and decoded entity of a write request.
#[derive(Debug, Clone)]
pub struct Written<T> {
    pub status: StatusCode,
    pub value: T,
}

/// Decode `resp` into `T` and validate it.
///
/// # Errors
///
/// Returns [`HarnessError::BadResponseSerde`] when the body does not decode
/// and [`HarnessError::InvalidEntity`] when a decoded value is invalid.
pub fn decode_valid<T>(resp: &ApiResponse) -> Result<T, HarnessError>
where
    T: DeserializeOwned + Validate,
{
    let value: T = resp.json()?;
    value.validate()?;
    Ok(value)
}

/// Catalog operations over a borrowed request context.
#[derive(Clone, Copy)]
pub struct Catalog<'c> {
    client: &'c HttpClient,
}

impl<'c> Catalog<'c> {
    #[must_use]
    pub fn new(client: &'c HttpClient) -> Self {
        Self { client }
    }

    /// All products, optionally limited to the first `limit`.
    ///
    /// # Errors
    ///
    /// Fails on a non-200 status, a transport error, or an invalid body.
    pub async fn products(&self, limit: Option<usize>) -> Result<Vec<Product>, HarnessError> {
        let limit = limit.map(|n| n.to_string());
        let resp = match limit.as_deref() {
            Some(n) => self.client.get("products", &[("limit", n)]).await?,
            None => self.client.get("products", &[]).await?,
        };
        decode_valid(&resp)
    }

    /// # Errors
    ///
    /// Fails on a non-200 status, a transport error, or an invalid body.
    pub async fn product(&self, id: u64) -> Result<Product, HarnessError> {
        let resp = self.client.get(&format!("products/{id}"), &[]).await?;
        decode_valid(&resp)
    }

    /// # Errors
    ///
    /// Fails on a non-200 status, a transport error, or an undecodable body.
    pub async fn categories(&self) -> Result<Vec<String>, HarnessError> {
        self.client.get("products/categories", &[]).await?.json()
    }

    /// # Errors
    ///
    /// Fails on a non-200 status, a transport error, or an invalid body.
    pub async fn in_category(&self, category: &str) -> Result<Vec<Product>, HarnessError> {
        let resp = self
            .client
            .get(&format!("products/category/{category}"), &[])
            .await?;
        decode_valid(&resp)
    }

    /// Submit `payload` and decode the created product.
    ///
    /// The status is returned unchecked so callers decide what "created"
    /// means.
    ///
    /// # Errors
    ///
    /// Fails on a transport error or when the body is not a valid product.
    pub async fn create(&self, payload: &NewProduct) -> Result<Written<Product>, HarnessError> {
        let resp = self.client.post("products", Some(payload)).await?;
        Ok(Written {
            status: resp.status(),
            value: decode_valid(&resp)?,
        })
    }

    /// Replace product `id` with `payload`.
    ///
    /// # Errors
    ///
    /// Fails on a transport error or when the body is not a valid product.
    pub async fn replace(
        &self,
        id: u64,
        payload: &NewProduct,
    ) -> Result<Written<Product>, HarnessError> {
        let resp = self
            .client
            .put(&format!("products/{id}"), Some(payload))
            .await?;
        Ok(Written {
            status: resp.status(),
            value: decode_valid(&resp)?,
        })
    }

    /// # Errors
    ///
    /// Fails on a transport error only.
    pub async fn delete(&self, id: u64) -> Result<ApiResponse, HarnessError> {
        self.client.delete(&format!("products/{id}")).await
    }
}
