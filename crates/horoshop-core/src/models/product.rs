use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::lenient;

/// Default page size for `catalog/export`
pub const DEFAULT_CATALOG_LIMIT: u32 = 20;

/// A catalog entry as returned by `catalog/export`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub article: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_article: Option<String>,
    /// Plain string or a per-language map, depending on store settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(
        default,
        deserialize_with = "lenient_price",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

/// Prices arrive as numbers or as numeric strings
fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(lenient::as_f64))
}

/// Articles may be purely numeric and arrive as JSON numbers
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(lenient::as_string))
}

/// Parameters for `catalog/export`.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    /// Filter expression, e.g. `{"article": "A-1"}`
    pub expr: Map<String, Value>,
    pub limit: u32,
    pub offset: Option<u32>,
    pub included_params: Vec<String>,
    pub excluded_params: Vec<String>,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            expr: Map::new(),
            limit: DEFAULT_CATALOG_LIMIT,
            offset: None,
            included_params: Vec::new(),
            excluded_params: Vec::new(),
        }
    }
}

impl CatalogQuery {
    pub fn expr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.expr.insert(key.into(), value.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn include(mut self, param: impl Into<String>) -> Self {
        self.included_params.push(param.into());
        self
    }

    pub fn exclude(mut self, param: impl Into<String>) -> Self {
        self.excluded_params.push(param.into());
        self
    }

    pub(crate) fn to_params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("expr".to_string(), Value::Object(self.expr.clone()));
        params.insert("limit".to_string(), Value::from(self.limit));

        // A zero offset is the same as none and is not sent
        if let Some(offset) = self.offset.filter(|o| *o > 0) {
            params.insert("offset".to_string(), Value::from(offset));
        }
        if !self.included_params.is_empty() {
            params.insert(
                "includedParams".to_string(),
                Value::from(self.included_params.join(", ")),
            );
        }
        if !self.excluded_params.is_empty() {
            params.insert(
                "excludedParams".to_string(),
                Value::from(self.excluded_params.join(", ")),
            );
        }
        params
    }
}
