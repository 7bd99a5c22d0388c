//! Positional base-36 conversion for the composite numeral.
//!
//! Digits are `0-9` then `a-z`. Output is always lowercase; parsing accepts
//! either case. Values are exact `u128`, which covers every 27-digit decimal
//! composite and every 17-character base-36 token.

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Render `value` in lowercase base 36 without leading zeros.
pub fn encode(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    // 36^25 > u128::MAX
    let mut buf = [0u8; 25];
    let mut pos = buf.len();
    while value > 0 {
        pos -= 1;
        buf[pos] = DIGITS[(value % 36) as usize];
        value /= 36;
    }
    buf[pos..].iter().map(|&b| b as char).collect()
}

fn digit_value(c: u8) -> Option<u32> {
    match c {
        b'0'..=b'9' => Some((c - b'0') as u32),
        b'a'..=b'z' => Some((c - b'a') as u32 + 10),
        b'A'..=b'Z' => Some((c - b'A') as u32 + 10),
        _ => None,
    }
}

/// Parse a base-36 string. Returns `None` on an empty string, a character
/// outside the alphabet, or a value that does not fit in `u128`.
pub fn decode(s: &str) -> Option<u128> {
    if s.is_empty() {
        return None;
    }
    s.bytes().try_fold(0u128, |acc, c| {
        acc.checked_mul(36)?.checked_add(digit_value(c)? as u128)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_small_values() {
        assert_eq!(encode(0), "0");
        assert_eq!(encode(35), "z");
        assert_eq!(encode(36), "10");
        assert_eq!(encode(1295), "zz");
    }

    #[test]
    fn encodes_composite_numerals() {
        assert_eq!(
            encode(100_000_000_000_000_000_000_000_000),
            "ckc59atwun6imhkhs"
        );
        assert_eq!(
            encode(199_999_999_999_999_999_999_999_999),
            "p4oailntpad18z4zj"
        );
    }

    #[test]
    fn encodes_u128_max() {
        let s = encode(u128::MAX);
        assert_eq!(s, "f5lxx1zz5pnorynqglhzmsp33");
        assert_eq!(decode(&s), Some(u128::MAX));
    }

    #[test]
    fn decode_is_case_insensitive() {
        assert_eq!(decode("CKC59AWNBCJ3I51HU"), decode("ckc59awnbcj3i51hu"));
        assert_eq!(
            decode("ckc59awnbcj3i51hu"),
            Some(100_000_000_010_000_000_000_001_234)
        );
    }

    #[test]
    fn decode_rejects_bad_input() {
        assert_eq!(decode(""), None);
        assert_eq!(decode("abc-1"), None);
        assert_eq!(decode("é"), None);
        // one digit past u128::MAX
        assert_eq!(decode("f5lxx1zz5pnorynqglhzmsp34"), None);
        assert_eq!(decode("zzzzzzzzzzzzzzzzzzzzzzzzzz"), None);
    }
}
