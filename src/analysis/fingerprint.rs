// =============================================================================
// fingerprint.rs — THE COAT-CHECK TICKET PRINTER
// =============================================================================
//
// A 32-bit rolling hash over the raw content, base-36 encoded. The
// recurrence is the old standby `h = h * 31 + code`, written as
// `(h << 5) - h + code` with signed 32-bit wraparound, run over UTF-16
// code units. Rows keyed by this hash are already in the store, so the
// recurrence is frozen — changing it would orphan every existing row.
//
// This is NOT cryptography. Collisions are possible and priced in — the
// hash is a dedup key for "have we analyzed this page before", where a
// rare collision costs one skipped analysis row, not a security incident.
// Anyone caught using this as an auth token will be reassigned to the
// billing dashboard team.
// =============================================================================

/// Fingerprint raw content into a short base-36 string.
///
/// Pure and order-sensitive: same bytes in, same ticket out, always.
/// The title deliberately does not participate — two pages with the same
/// body but different titles are the same content.
pub fn fingerprint(content: &str) -> String {
    let mut hash: i32 = 0;
    for code_unit in content.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(code_unit));
    }
    to_base36(hash.unsigned_abs())
}

/// Lowercase base-36 for a u32. Small enough that pulling in a radix
/// crate would cost more than these ten lines.
fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 digits are ASCII")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let content = "This is the best budget laptop deal, buy now for $499";
        assert_eq!(fingerprint(content), fingerprint(content));
    }

    #[test]
    fn test_empty_content_hashes_to_zero() {
        assert_eq!(fingerprint(""), "0");
    }

    #[test]
    fn test_different_content_usually_differs() {
        assert_ne!(fingerprint("hello world"), fingerprint("hello worlds"));
    }

    #[test]
    fn test_order_sensitive() {
        assert_ne!(fingerprint("ab"), fingerprint("ba"));
    }

    #[test]
    fn test_base36_alphabet_only() {
        let hash = fingerprint("some perfectly ordinary page text");
        assert!(hash.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_known_single_char() {
        // h = 0*31 + 'a' (97) = 97 -> base36 "2p"
        assert_eq!(fingerprint("a"), "2p");
    }

    #[test]
    fn test_to_base36_round_numbers() {
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
