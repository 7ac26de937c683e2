use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

/// An order as returned by `orders/get`.
///
/// The id is read from `id` or, failing that, `order_id`. Numeric fields
/// accept numeric strings; values that do not convert stay in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Order {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stat_status: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_sum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TryFrom<Map<String, Value>> for Order {
    type Error = String;

    fn try_from(mut extra: Map<String, Value>) -> Result<Self, Self::Error> {
        let id = lenient::take(&mut extra, "id", lenient::as_i64);
        let order_id = lenient::take(&mut extra, "order_id", lenient::as_i64);
        let id = id
            .or(order_id)
            .ok_or_else(|| "order has no usable `id` or `order_id`".to_string())?;

        Ok(Self {
            id,
            stat_status: lenient::take(&mut extra, "stat_status", lenient::as_i64),
            total_sum: lenient::take(&mut extra, "total_sum", lenient::as_f64),
            currency: lenient::take(&mut extra, "currency", lenient::as_string),
            extra,
        })
    }
}

impl Order {
    /// Any field of the original payload, typed or not
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

/// Optional filters for `orders/get`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderFilters {
    /// Lower bound of the order date, `YYYY-MM-DD HH:MM:SS`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(rename = "additionalData", skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl OrderFilters {
    pub fn date_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn date_to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    pub fn status(mut self, status: i64) -> Self {
        self.status = Some(status);
        self
    }

    pub fn additional_data(mut self, enabled: bool) -> Self {
        self.additional_data = Some(enabled);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Request parameters with `ids` merged in
    pub(crate) fn to_params(&self, ids: &[i64]) -> Map<String, Value> {
        let mut params = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        params.insert("ids".to_string(), Value::from(ids.to_vec()));
        params
    }
}
