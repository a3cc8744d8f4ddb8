//! Caller token extraction.

/// Extract the token from a raw `token`/`authorization` header value.
///
/// Accepts the bare id or `Bearer <id>`. A missing or blank header yields
/// `None`; whether the token is any good is left to the token authority.
pub fn bearer_token(header: Option<&str>) -> Option<String> {
    let raw = header?.trim_start();
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_and_bearer_forms_match() {
        assert_eq!(
            bearer_token(Some("abcdefghij0123456789")).as_deref(),
            Some("abcdefghij0123456789")
        );
        assert_eq!(
            bearer_token(Some("Bearer abcdefghij0123456789 ")).as_deref(),
            Some("abcdefghij0123456789")
        );
    }

    #[test]
    fn missing_or_blank_header_is_none() {
        assert!(bearer_token(None).is_none());
        assert!(bearer_token(Some("   ")).is_none());
        assert!(bearer_token(Some("Bearer ")).is_none());
    }
}
