//! Request fields and their domain rules.
//!
//! Every field is optional at the type level so a payload can be parsed
//! before it is judged; the `validate_*` methods enforce presence and
//! ranges. A field that is present but invalid is an error, never skipped.

use std::ops::RangeInclusive;

use serde::Deserialize;

use crate::auth::ids::is_well_formed_id;
use crate::error::ApiError;
use crate::storage::{Check, HttpMethod, Protocol};

pub const PHONE_LEN: usize = 10;
pub const TIMEOUT_SECONDS: RangeInclusive<i64> = 1..=5;
const STATUS_CODES: RangeInclusive<i64> = 100..=599;

fn invalid(msg: impl Into<String>) -> ApiError {
    ApiError::Validation(msg.into())
}

/// A phone is exactly ten ASCII digits after trimming.
pub fn phone(value: Option<&str>) -> Result<String, ApiError> {
    let phone = value.map(str::trim).unwrap_or_default();
    if phone.len() == PHONE_LEN && phone.bytes().all(|b| b.is_ascii_digit()) {
        Ok(phone.to_string())
    } else {
        Err(invalid(format!("phone must be {PHONE_LEN} digits")))
    }
}

/// A token or check id as generated by this service.
pub fn record_id(name: &str, value: Option<&str>) -> Result<String, ApiError> {
    let id = value.map(str::trim).unwrap_or_default();
    if is_well_formed_id(id) {
        Ok(id.to_string())
    } else {
        Err(invalid(format!("{name} is missing or malformed")))
    }
}

fn required_text(name: &str, value: Option<String>) -> Result<String, ApiError> {
    optional_text(name, value)?.ok_or_else(|| invalid(format!("{name} is required")))
}

fn optional_text(name: &str, value: Option<String>) -> Result<Option<String>, ApiError> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Err(invalid(format!("{name} must not be empty"))),
        Some(v) => Ok(Some(v.trim().to_string())),
    }
}

// =========================================================================
// Users and credentials
// =========================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub tos_agreement: Option<bool>,
}

pub(crate) struct ValidNewUser {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub password: String,
}

impl NewUser {
    pub(crate) fn validate(self) -> Result<ValidNewUser, ApiError> {
        let user = ValidNewUser {
            first_name: required_text("firstName", self.first_name)?,
            last_name: required_text("lastName", self.last_name)?,
            phone: phone(self.phone.as_deref())?,
            password: required_text("password", self.password)?,
        };
        if self.tos_agreement != Some(true) {
            return Err(invalid("tosAgreement must be true"));
        }
        Ok(user)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

pub(crate) struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

impl UserChanges {
    pub(crate) fn validate(self) -> Result<UserPatch, ApiError> {
        let patch = UserPatch {
            first_name: optional_text("firstName", self.first_name)?,
            last_name: optional_text("lastName", self.last_name)?,
            password: optional_text("password", self.password)?,
        };
        if patch.first_name.is_none() && patch.last_name.is_none() && patch.password.is_none() {
            return Err(invalid(
                "at least one of firstName, lastName, password is required",
            ));
        }
        Ok(patch)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    pub phone: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    /// Returns `(phone, password)`.
    pub fn validate(self) -> Result<(String, String), ApiError> {
        Ok((
            phone(self.phone.as_deref())?,
            required_text("password", self.password)?,
        ))
    }
}

// =========================================================================
// Checks
// =========================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckFields {
    pub protocol: Option<String>,
    pub url: Option<String>,
    pub method: Option<String>,
    pub success_codes: Option<Vec<i64>>,
    pub timeout_seconds: Option<i64>,
}

/// Fully validated fields of a new check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CheckSpec {
    pub protocol: Protocol,
    pub url: String,
    pub method: HttpMethod,
    pub success_codes: Vec<u16>,
    pub timeout_seconds: u8,
}

impl CheckSpec {
    pub fn into_check(self, id: String, user_phone: String) -> Check {
        Check {
            id,
            user_phone,
            protocol: self.protocol,
            url: self.url,
            method: self.method,
            success_codes: self.success_codes,
            timeout_seconds: self.timeout_seconds,
        }
    }
}

/// Validated subset of check fields to overwrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CheckPatch {
    pub protocol: Option<Protocol>,
    pub url: Option<String>,
    pub method: Option<HttpMethod>,
    pub success_codes: Option<Vec<u16>>,
    pub timeout_seconds: Option<u8>,
}

impl CheckPatch {
    pub fn apply(self, check: &mut Check) {
        if let Some(protocol) = self.protocol {
            check.protocol = protocol;
        }
        if let Some(url) = self.url {
            check.url = url;
        }
        if let Some(method) = self.method {
            check.method = method;
        }
        if let Some(codes) = self.success_codes {
            check.success_codes = codes;
        }
        if let Some(timeout) = self.timeout_seconds {
            check.timeout_seconds = timeout;
        }
    }

    const fn is_empty(&self) -> bool {
        self.protocol.is_none()
            && self.url.is_none()
            && self.method.is_none()
            && self.success_codes.is_none()
            && self.timeout_seconds.is_none()
    }
}

impl CheckFields {
    fn patch(self) -> Result<CheckPatch, ApiError> {
        Ok(CheckPatch {
            protocol: self.protocol.as_deref().map(parse_protocol).transpose()?,
            url: optional_text("url", self.url)?,
            method: self.method.as_deref().map(parse_method).transpose()?,
            success_codes: self.success_codes.map(parse_success_codes).transpose()?,
            timeout_seconds: self.timeout_seconds.map(parse_timeout).transpose()?,
        })
    }

    /// Every field is required.
    pub(crate) fn validate_new(self) -> Result<CheckSpec, ApiError> {
        let patch = self.patch()?;
        Ok(CheckSpec {
            protocol: patch.protocol.ok_or_else(|| invalid("protocol is required"))?,
            url: patch.url.ok_or_else(|| invalid("url is required"))?,
            method: patch.method.ok_or_else(|| invalid("method is required"))?,
            success_codes: patch
                .success_codes
                .ok_or_else(|| invalid("successCodes is required"))?,
            timeout_seconds: patch
                .timeout_seconds
                .ok_or_else(|| invalid("timeoutSeconds is required"))?,
        })
    }

    /// At least one field is required.
    pub(crate) fn validate_changes(self) -> Result<CheckPatch, ApiError> {
        let patch = self.patch()?;
        if patch.is_empty() {
            return Err(invalid("at least one check field to update is required"));
        }
        Ok(patch)
    }
}

fn parse_protocol(value: &str) -> Result<Protocol, ApiError> {
    value
        .parse()
        .map_err(|_| invalid("protocol must be one of http, https"))
}

fn parse_method(value: &str) -> Result<HttpMethod, ApiError> {
    value
        .parse()
        .map_err(|_| invalid("method must be one of get, post, put, delete"))
}

/// Non-empty; each code a valid HTTP status; duplicates dropped in order.
fn parse_success_codes(codes: Vec<i64>) -> Result<Vec<u16>, ApiError> {
    if codes.is_empty() {
        return Err(invalid("successCodes must not be empty"));
    }
    let mut out: Vec<u16> = Vec::with_capacity(codes.len());
    for code in codes {
        let valid = u16::try_from(code)
            .ok()
            .filter(|_| STATUS_CODES.contains(&code))
            .ok_or_else(|| invalid(format!("successCodes contains invalid status {code}")))?;
        if !out.contains(&valid) {
            out.push(valid);
        }
    }
    Ok(out)
}

fn parse_timeout(seconds: i64) -> Result<u8, ApiError> {
    if !TIMEOUT_SECONDS.contains(&seconds) {
        return Err(invalid(format!(
            "timeoutSeconds must be between {} and {}",
            TIMEOUT_SECONDS.start(),
            TIMEOUT_SECONDS.end()
        )));
    }
    u8::try_from(seconds).map_err(|_| invalid("timeoutSeconds out of range"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn full_check() -> CheckFields {
        CheckFields {
            protocol: Some("https".into()),
            url: Some("  example.com/health ".into()),
            method: Some("get".into()),
            success_codes: Some(vec![200, 201, 200]),
            timeout_seconds: Some(3),
        }
    }

    #[test]
    fn phone_rules() {
        assert_eq!(phone(Some(" 5551234567 ")).unwrap(), "5551234567");
        assert!(phone(Some("555123456")).is_err());
        assert!(phone(Some("555123456a")).is_err());
        assert!(phone(None).is_err());
    }

    #[test]
    fn new_check_is_trimmed_and_deduplicated() {
        let spec = full_check().validate_new().unwrap();
        assert_eq!(spec.url, "example.com/health");
        assert_eq!(spec.success_codes, vec![200, 201]);
        assert_eq!(spec.protocol, Protocol::Https);
        assert_eq!(spec.method, HttpMethod::Get);
        assert_eq!(spec.timeout_seconds, 3);
    }

    #[test]
    fn timeout_bounds_are_inclusive() {
        for ok in [1, 5] {
            let fields = CheckFields {
                timeout_seconds: Some(ok),
                ..full_check()
            };
            assert!(fields.validate_new().is_ok(), "{ok} rejected");
        }
        for bad in [0, 6, -1] {
            let fields = CheckFields {
                timeout_seconds: Some(bad),
                ..full_check()
            };
            assert!(
                matches!(fields.validate_new(), Err(ApiError::Validation(_))),
                "{bad} accepted"
            );
        }
    }

    #[test]
    fn new_check_rejects_bad_enums_and_codes() {
        let bad = [
            CheckFields {
                protocol: Some("ftp".into()),
                ..full_check()
            },
            CheckFields {
                method: Some("patch".into()),
                ..full_check()
            },
            CheckFields {
                success_codes: Some(vec![]),
                ..full_check()
            },
            CheckFields {
                success_codes: Some(vec![200, 99_999]),
                ..full_check()
            },
            CheckFields {
                url: Some("   ".into()),
                ..full_check()
            },
            CheckFields {
                url: None,
                ..full_check()
            },
        ];
        for fields in bad {
            assert!(fields.validate_new().is_err());
        }
    }

    #[test]
    fn changes_need_at_least_one_field() {
        assert!(CheckFields::default().validate_changes().is_err());

        let patch = CheckFields {
            timeout_seconds: Some(5),
            ..CheckFields::default()
        }
        .validate_changes()
        .unwrap();
        assert_eq!(patch.timeout_seconds, Some(5));
        assert!(patch.url.is_none());
    }

    #[test]
    fn changes_validate_each_present_field() {
        let fields = CheckFields {
            url: Some("example.org".into()),
            timeout_seconds: Some(9),
            ..CheckFields::default()
        };
        assert!(matches!(
            fields.validate_changes(),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn new_user_requires_tos_agreement() {
        let user = NewUser {
            first_name: Some("Alice".into()),
            last_name: Some("Liddell".into()),
            phone: Some("5551234567".into()),
            password: Some("secret".into()),
            tos_agreement: Some(false),
        };
        assert!(user.clone().validate().is_err());

        let ok = NewUser {
            tos_agreement: Some(true),
            ..user
        }
        .validate()
        .unwrap();
        assert_eq!(ok.phone, "5551234567");
    }

    #[test]
    fn user_changes_need_a_field() {
        assert!(UserChanges::default().validate().is_err());
        assert!(
            UserChanges {
                last_name: Some("".into()),
                ..UserChanges::default()
            }
            .validate()
            .is_err()
        );
    }
}
