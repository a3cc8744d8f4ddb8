//! Record and stream key rules shared by the entity store and the log archive.

/// Upper bound on key length; keeps file names well inside platform limits.
pub const MAX_KEY_LEN: usize = 128;

/// Upper bound on an active log stream id. Rotation appends `-` and a
/// millisecond stamp of at most 19 digits, and the result must still be a
/// valid key.
pub const MAX_STREAM_ID_LEN: usize = MAX_KEY_LEN - 20;

/// A key is usable as a file stem when it is non-empty, bounded, and made of
/// ASCII alphanumerics, `-` and `_` only.
///
/// This rules out path separators, `.`/`..`, and hidden files such as the
/// temporaries written while publishing an archive.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// A valid key short enough to be rotated into a valid archive id.
pub fn is_valid_stream_id(id: &str) -> bool {
    id.len() <= MAX_STREAM_ID_LEN && is_valid_key(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ids_and_rotated_names() {
        assert!(is_valid_key("5551234567"));
        assert!(is_valid_key("abc123xyz0abc123xyz0"));
        assert!(is_valid_key("access-1700000000000"));
        assert!(is_valid_key("user_checks"));
    }

    #[test]
    fn rejects_traversal_and_dots() {
        assert!(!is_valid_key(""));
        assert!(!is_valid_key(".."));
        assert!(!is_valid_key("../users/x"));
        assert!(!is_valid_key("a/b"));
        assert!(!is_valid_key(".hidden"));
        assert!(!is_valid_key("id.json"));
        assert!(!is_valid_key(&"a".repeat(MAX_KEY_LEN + 1)));
    }

    #[test]
    fn stream_ids_leave_room_for_a_rotation_stamp() {
        let longest = "s".repeat(MAX_STREAM_ID_LEN);
        assert!(is_valid_stream_id(&longest));
        assert!(!is_valid_stream_id(&format!("{longest}s")));
        assert!(is_valid_key(&format!("{longest}-{}", i64::MAX)));
        assert!(!is_valid_stream_id("a/b"));
    }
}
