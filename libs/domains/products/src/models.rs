use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{ProductError, ProductResult};

/// Product entity as stored and as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Opaque identifier assigned by the store
    #[schema(example = "01920b8f-6f3a-7c2e-9d41-5f1c2a7e8b90")]
    pub id: String,
    #[schema(example = "Mate imperial")]
    pub title: String,
    pub description: String,
    /// Merchant product code
    #[schema(example = "MATE-001")]
    pub code: String,
    #[schema(example = 15000.0)]
    pub price: f64,
    #[schema(example = 25)]
    pub stock: i64,
    #[schema(example = "bazar")]
    pub category: String,
    /// Image URLs, in display order
    #[serde(default)]
    pub thumbnails: Vec<String>,
    /// Whether the product is available; `true` for new products
    pub status: bool,
}

/// Request body for creating a product.
///
/// Every field except `thumbnails` is required. They are modelled as
/// `Option` so a missing, null or wrongly typed field is a validation
/// failure rather than a deserialization error. A `status` key in the body
/// is ignored.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[serde(default, deserialize_with = "lenient")]
    #[validate(required, length(min = 1))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    #[validate(required, length(min = 1))]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    #[validate(required, length(min = 1))]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    #[validate(required)]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    #[validate(required)]
    pub stock: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    #[validate(required, length(min = 1))]
    pub category: Option<String>,
    #[serde(default)]
    pub thumbnails: Option<Vec<String>>,
}

// A value of the wrong JSON type reads as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

impl CreateProduct {
    /// Returns the complete creation payload, or `None` if a required field
    /// is missing.
    pub fn into_new_product(self) -> Option<NewProduct> {
        Some(NewProduct {
            title: self.title?,
            description: self.description?,
            code: self.code?,
            price: self.price?,
            stock: self.stock?,
            category: self.category?,
            thumbnails: self.thumbnails.unwrap_or_default(),
        })
    }
}

/// Validated creation payload handed to a [`ProductRepository`](crate::ProductRepository).
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub code: String,
    pub price: f64,
    pub stock: i64,
    pub category: String,
    pub thumbnails: Vec<String>,
}

impl Product {
    /// Builds a stored product from a creation payload; new products are active.
    pub fn from_new(id: String, input: NewProduct) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            code: input.code,
            price: input.price,
            stock: input.stock,
            category: input.category,
            thumbnails: input.thumbnails,
            status: true,
        }
    }

    /// Returns a copy of this product with `patch` merged over it.
    ///
    /// Keys that name a product field overwrite it; `id` and unknown keys
    /// are ignored. Fails with [`ProductError::InvalidPatch`] when the merged
    /// document is no longer a valid product.
    pub fn apply_patch(&self, patch: &ProductPatch) -> ProductResult<Product> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(fields) = &mut value {
            for (key, new_value) in patch.fields() {
                if key == "id" {
                    continue;
                }
                if let Some(slot) = fields.get_mut(key) {
                    *slot = new_value.clone();
                }
            }
        }

        let merged: Product = serde_json::from_value(value)
            .map_err(|e| ProductError::InvalidPatch(e.to_string()))?;
        merged.ensure_required_text()?;
        Ok(merged)
    }

    fn ensure_required_text(&self) -> ProductResult<()> {
        let required = [
            ("title", &self.title),
            ("description", &self.description),
            ("code", &self.code),
            ("category", &self.category),
        ];
        match required.iter().find(|(_, value)| value.is_empty()) {
            Some((name, _)) => Err(ProductError::InvalidPatch(format!(
                "{name} must not be empty"
            ))),
            None => Ok(()),
        }
    }
}

/// Partial update body: any JSON object.
///
/// ```json
/// { "price": 15500, "stock": 20 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(value_type = Object)]
pub struct ProductPatch(pub Map<String, Value>);

impl ProductPatch {
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Query parameters for listing products
#[derive(Debug, Clone, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Maximum number of products to return. Values that are not a
    /// non-negative integer are ignored.
    #[param(example = "10")]
    pub limit: Option<String>,
}

impl ListParams {
    /// Reads `limit` from a raw query string. The first occurrence wins;
    /// an undecodable query reads as no parameters.
    pub fn from_query(query: Option<&str>) -> Self {
        let limit = query
            .and_then(|query| serde_urlencoded::from_str::<Vec<(String, String)>>(query).ok())
            .and_then(|pairs| {
                pairs
                    .into_iter()
                    .find(|(key, _)| key == "limit")
                    .map(|(_, value)| value)
            });
        Self { limit }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
    }
}
