//! Request and response values exchanged with the transport.

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use super::interceptor::bearer_token;
use crate::error::ApiError;

/// A request as handed over by the transport, already parsed.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub token: Option<String>,
    pub query: BTreeMap<String, String>,
    pub body: Value,
}

impl Request {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Attach the raw token header; an optional `Bearer ` prefix is
    /// stripped and a blank value means no token.
    #[must_use]
    pub fn with_token(mut self, header: Option<&str>) -> Self {
        self.token = bearer_token(header);
        self
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Parse the body into `T`; a missing body parses as `T::default()`.
    pub fn body_as<T: DeserializeOwned + Default>(&self) -> Result<T, ApiError> {
        if self.body.is_null() {
            return Ok(T::default());
        }
        T::deserialize(&self.body)
            .map_err(|e| ApiError::Validation(format!("malformed request body: {e}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    pub payload: Value,
    pub content_kind: ContentKind,
}

impl Response {
    /// 200 with `body` as the JSON payload.
    pub fn ok(body: &impl Serialize) -> Self {
        match serde_json::to_value(body) {
            Ok(payload) => Self {
                status_code: 200,
                payload,
                content_kind: ContentKind::Json,
            },
            Err(e) => Self::from_error(&ApiError::Io(format!("response encoding failed: {e}"))),
        }
    }

    /// 200 with an empty object.
    pub fn empty() -> Self {
        Self::ok(&json!({}))
    }

    /// `{"Error": message}`, plus reconciliation details for partial
    /// failures.
    pub fn from_error(err: &ApiError) -> Self {
        let mut payload = Map::new();
        payload.insert("Error".into(), Value::String(err.to_string()));
        match err {
            ApiError::PartialFailure { check_id, .. } => {
                payload.insert("checkId".into(), json!(check_id));
            }
            ApiError::PartialCascadeFailure {
                deleted,
                total,
                failed,
            } => {
                payload.insert("deleted".into(), json!(deleted));
                payload.insert("total".into(), json!(total));
                payload.insert("failed".into(), json!(failed));
            }
            _ => {}
        }
        Self {
            status_code: err.status_code(),
            payload: Value::Object(payload),
            content_kind: ContentKind::Json,
        }
    }
}
