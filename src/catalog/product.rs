//! Product records exchanged with the catalog API.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{BoxedStr, HarnessError};

/// Checks applied once when a remote entity is decoded.
pub trait Validate {
    /// # Errors
    ///
    /// Returns [`HarnessError::InvalidEntity`] describing the first violation.
    fn validate(&self) -> Result<(), HarnessError>;
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), HarnessError> {
        self.iter().try_for_each(Validate::validate)
    }
}

/// Customer rating attached to listed products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub rate: f64,
    pub count: u64,
}

/// A product as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
}

/// Payload submitted when creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    pub image: String,
}

fn check_fields(title: &str, price: f64, category: &str, image: &str) -> Result<(), HarnessError> {
    if title.trim().is_empty() {
        return Err(HarnessError::InvalidEntity("title is empty".boxed()));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(HarnessError::InvalidEntity(
            format!("price {price} is not a non-negative amount").boxed(),
        ));
    }
    if category.trim().is_empty() {
        return Err(HarnessError::InvalidEntity("category is empty".boxed()));
    }
    Url::parse(image).map_err(|e| {
        HarnessError::InvalidEntity(format!("image {image:?} is not a URL: {e}").boxed())
    })?;
    Ok(())
}

impl Validate for Product {
    fn validate(&self) -> Result<(), HarnessError> {
        check_fields(&self.title, self.price, &self.category, &self.image).map_err(|e| match e {
            HarnessError::InvalidEntity(msg) => {
                HarnessError::InvalidEntity(format!("product {}: {msg}", self.id).boxed())
            }
            other => other,
        })
    }
}

impl Validate for NewProduct {
    fn validate(&self) -> Result<(), HarnessError> {
        check_fields(&self.title, self.price, &self.category, &self.image)
    }
}

impl NewProduct {
    /// Names of fields whose values differ in `product`.
    ///
    /// Decoding into [`Product`] has already enforced matching types, so an
    /// empty result means every submitted field was echoed faithfully.
    #[must_use]
    pub fn mismatches(&self, product: &Product) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.title != product.title {
            out.push("title");
        }
        if self.price.to_bits() != product.price.to_bits() {
            out.push("price");
        }
        if self.description != product.description {
            out.push("description");
        }
        if self.category != product.category {
            out.push("category");
        }
        if self.image != product.image {
            out.push("image");
        }
        out
    }

    /// Require `product` to echo every submitted field.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Assertion`] listing the mismatched fields.
    pub fn expect_echoed_by(&self, product: &Product) -> Result<(), HarnessError> {
        let diff = self.mismatches(product);
        if diff.is_empty() {
            Ok(())
        } else {
            Err(HarnessError::Assertion(
                format!(
                    "product {} does not echo submitted fields: {}",
                    product.id,
                    diff.join(", ")
                )
                .boxed(),
            ))
        }
    }
}

impl Product {
    /// Build the record the catalog should hold after accepting `payload`.
    #[must_use]
    pub fn from_new(id: u64, payload: NewProduct) -> Self {
        let NewProduct {
            title,
            price,
            description,
            category,
            image,
        } = payload;
        Self {
            id,
            title,
            price,
            description,
            category,
            image,
            rating: None,
        }
    }
}
