//! Length-prefixed key encoding for LMDB storage.
//!
//! Keys are encoded as: [len1][bytes1][len2][bytes2]...
//! - No delimiters, no escaping; the empty anchor `""` is a valid part
//! - A prefix built from whole parts only matches those exact parts
//!
//! Parts longer than `MAX_ID_LEN` bytes cannot be encoded; callers validate
//! ids before they reach this module.

/// Build a length-prefixed key from parts
#[inline]
pub fn build_key(parts: &[&str]) -> Vec<u8> {
    let total_len: usize = parts.iter().map(|p| 1 + p.len()).sum();
    let mut key = Vec::with_capacity(total_len);
    for part in parts {
        key.push(part.len() as u8);
        key.extend_from_slice(part.as_bytes());
    }
    key
}

/// Build a prefix for scanning (same as build_key, just clearer intent)
#[inline]
pub fn build_prefix(parts: &[&str]) -> Vec<u8> {
    build_key(parts)
}

/// Parse a length-prefixed key into parts. Stops at the first malformed part.
pub fn parse_key(bytes: &[u8]) -> Vec<&str> {
    let mut parts = Vec::with_capacity(2);
    let mut i = 0;
    while let Some((part, next)) = next_part(bytes, i) {
        parts.push(part);
        i = next;
    }
    parts
}

/// Get the Nth part from a key without allocating
#[inline]
pub fn get_part(bytes: &[u8], n: usize) -> Option<&str> {
    let mut i = 0;
    for _ in 0..n {
        i = next_part(bytes, i)?.1;
    }
    next_part(bytes, i).map(|(part, _)| part)
}

#[inline]
fn next_part(bytes: &[u8], i: usize) -> Option<(&str, usize)> {
    let len = *bytes.get(i)? as usize;
    let end = i + 1 + len;
    let raw = bytes.get(i + 1..end)?;
    std::str::from_utf8(raw).ok().map(|s| (s, end))
}

// ============================================================================
// Anchor index (2-part: anchor id, user name)
// ============================================================================

/// Build anchor index key: [anchor_len][anchor][user_len][user]
#[inline]
pub fn anchor_key(anchor_id: &str, user: &str) -> Vec<u8> {
    build_key(&[anchor_id, user])
}

/// Prefix matching every user holding a right on `anchor_id`
#[inline]
pub fn anchor_prefix(anchor_id: &str) -> Vec<u8> {
    build_prefix(&[anchor_id])
}

/// Parse anchor index key into (anchor id, user name)
#[inline]
pub fn parse_anchor(bytes: &[u8]) -> Option<(&str, &str)> {
    Some((get_part(bytes, 0)?, get_part(bytes, 1)?))
}

// ============================================================================
// Child index (2-part: parent id, child id)
// ============================================================================

/// Build child index key: [parent_len][parent][child_len][child]
#[inline]
pub fn child_key(parent_id: &str, child_id: &str) -> Vec<u8> {
    build_key(&[parent_id, child_id])
}

/// Prefix matching every direct child of `parent_id`
#[inline]
pub fn child_prefix(parent_id: &str) -> Vec<u8> {
    build_prefix(&[parent_id])
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_and_parse() {
        let key = build_key(&["collection-1", "alice"]);
        assert_eq!(parse_key(&key), vec!["collection-1", "alice"]);
    }

    #[test]
    fn test_get_part() {
        let key = build_key(&["aaa", "bbb", "ccc"]);
        assert_eq!(get_part(&key, 0), Some("aaa"));
        assert_eq!(get_part(&key, 1), Some("bbb"));
        assert_eq!(get_part(&key, 2), Some("ccc"));
        assert_eq!(get_part(&key, 3), None);
    }

    #[test]
    fn test_anchor_prefix_is_exact() {
        let key = anchor_key("lvl1", "alice");
        assert!(key.starts_with(&anchor_prefix("lvl1")));
        assert!(!key.starts_with(&anchor_prefix("lvl")));
        assert!(!anchor_key("lvl10", "alice").starts_with(&anchor_prefix("lvl1")));
    }

    #[test]
    fn test_all_users_anchor() {
        // The empty anchor only matches keys whose first part is empty
        let key = anchor_key("", "bob");
        assert!(key.starts_with(&anchor_prefix("")));
        assert!(!anchor_key("x", "bob").starts_with(&anchor_prefix("")));
        assert_eq!(parse_anchor(&key), Some(("", "bob")));
    }

    #[test]
    fn test_special_chars() {
        // Slashes, colons, anything allowed
        let key = build_key(&["info:fedora/obj:1", "user/admin"]);
        assert_eq!(parse_anchor(&key), Some(("info:fedora/obj:1", "user/admin")));
    }

    #[test]
    fn test_child_prefix() {
        let key = child_key("L1", "L2");
        assert!(key.starts_with(&child_prefix("L1")));
        assert!(!child_key("L10", "L2").starts_with(&child_prefix("L1")));
        assert_eq!(get_part(&key, 1), Some("L2"));
    }

    #[test]
    fn test_truncated_key() {
        let mut key = anchor_key("abc", "alice");
        key.truncate(6);
        assert_eq!(parse_key(&key), vec!["abc"]);
        assert_eq!(parse_anchor(&key), None);
    }
}
