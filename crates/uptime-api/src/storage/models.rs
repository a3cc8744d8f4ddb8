//! Data models for Uptime storage.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const USERS: &str = "users";
pub const TOKENS: &str = "tokens";
pub const CHECKS: &str = "checks";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub hashed_password: String,
    pub tos_agreement: bool,
    /// Ids of the checks this user owns, in creation order.
    #[serde(default)]
    pub checks: Vec<String>,
}

/// A [`User`] as returned to its owner: everything but the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub tos_agreement: bool,
    pub checks: Vec<String>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            phone: user.phone,
            first_name: user.first_name,
            last_name: user.last_name,
            tos_agreement: user.tos_agreement,
            checks: user.checks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    pub phone: String,
    /// Expiry instant, milliseconds since the Unix epoch.
    pub expires: i64,
}

impl Token {
    pub const fn is_live_at(&self, now_millis: i64) -> bool {
        self.expires > now_millis
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Check {
    pub id: String,
    pub user_phone: String,
    pub protocol: Protocol,
    pub url: String,
    pub method: HttpMethod,
    pub success_codes: Vec<u16>,
    pub timeout_seconds: u8,
}

/// Error for an unrecognised enum literal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value {0:?}")]
pub struct UnknownVariant(pub String);

impl FromStr for Protocol {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl FromStr for HttpMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "put" => Ok(Self::Put),
            "delete" => Ok(Self::Delete),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn enum_literals_parse_and_reject_unknowns() {
        assert_eq!("https".parse::<Protocol>(), Ok(Protocol::Https));
        assert_eq!("delete".parse::<HttpMethod>(), Ok(HttpMethod::Delete));

        let err = "ftp".parse::<Protocol>().unwrap_err();
        assert_eq!(err, UnknownVariant("ftp".into()));
        assert_eq!(err.to_string(), r#"unknown value "ftp""#);
    }
}
