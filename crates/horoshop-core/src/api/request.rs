//! Request descriptors, response envelopes and parameter encoding.

use std::fmt;

use serde_json::{Map, Value};

/// HTTP methods the API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// GET carries parameters in the query string, the rest in the body
    pub fn sends_body(&self) -> bool {
        !matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One logical API call: path relative to `<base>/api`, method and parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub path: String,
    pub method: Method,
    pub params: Map<String, Value>,
    pub include_token: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            params: Map::new(),
            include_token: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn params(mut self, params: Map<String, Value>) -> Self {
        self.params.extend(params);
        self
    }

    /// Send without the session token. Only the login request does this.
    pub fn without_token(mut self) -> Self {
        self.include_token = false;
        self
    }
}

/// Status code and parsed JSON body of a completed call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub status: u16,
    /// `None` when the body was empty or not valid JSON
    pub payload: Option<Value>,
    pub raw_body: String,
}

impl ResponseEnvelope {
    pub fn from_raw(status: u16, raw_body: String) -> Self {
        let payload = if raw_body.trim().is_empty() {
            None
        } else {
            serde_json::from_str::<Value>(&raw_body)
                .ok()
                .filter(|value| !value.is_null())
        };
        Self {
            status,
            payload,
            raw_body,
        }
    }

    pub fn is(&self, status: u16) -> bool {
        self.status == status
    }

    /// Look up a value in the payload by JSON pointer, e.g. `/response/token`
    pub fn lookup(&self, pointer: &str) -> Option<&Value> {
        self.payload.as_ref()?.pointer(pointer)
    }
}

/// Encode parameters the way PHP's `http_build_query` does.
///
/// Nested maps become `key[sub]`, lists of scalars become `key[]`, booleans
/// become `1`/`0` and nulls are dropped.
pub fn encode_params(params: &Map<String, Value>) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        append_pairs(key, value, &mut pairs);
    }
    pairs.join("&")
}

fn append_pairs(key: &str, value: &Value, pairs: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => push_pair(key, if *flag { "1" } else { "0" }, pairs),
        Value::Number(number) => push_pair(key, &number.to_string(), pairs),
        Value::String(text) => push_pair(key, text, pairs),
        Value::Array(items) => {
            let scalars = items.iter().all(|item| !item.is_array() && !item.is_object());
            for (index, item) in items.iter().enumerate() {
                let nested = if scalars {
                    format!("{}[]", key)
                } else {
                    format!("{}[{}]", key, index)
                };
                append_pairs(&nested, item, pairs);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                append_pairs(&format!("{}[{}]", key, sub), item, pairs);
            }
        }
    }
}

fn push_pair(key: &str, value: &str, pairs: &mut Vec<String>) {
    pairs.push(format!(
        "{}={}",
        urlencoding::encode(key),
        urlencoding::encode(value)
    ));
}
