//! Utility functions for encoding binary values the way UAF messages carry them.
//!
//! Everything the server emits is `base64url` without padding. Clients are less consistent, so
//! decoding accepts `base64url` and `base64`, with or without padding.

use data_encoding::{Specification, BASE64, BASE64URL, BASE64URL_NOPAD, BASE64_NOPAD, HEXLOWER};

/// Convert bytes to base64 without padding
pub fn base64(data: &[u8]) -> String {
    BASE64_NOPAD.encode(data)
}

/// Convert bytes to base64url without padding
pub fn base64url(data: &[u8]) -> String {
    BASE64URL_NOPAD.encode(data)
}

/// Convert bytes to lowercase hexadecimal
pub fn hex(data: &[u8]) -> String {
    HEXLOWER.encode(data)
}

/// Try parsing from base64 with or without padding
pub fn try_from_base64(input: &str) -> Option<Vec<u8>> {
    let padding = BASE64.specification().padding?;
    let sane_string = input.trim_end_matches(padding);
    BASE64_NOPAD.decode(sane_string.as_bytes()).ok()
}

/// Try parsing from base64url with or without padding
pub fn try_from_base64url(input: &str) -> Option<Vec<u8>> {
    let specs = BASE64URL.specification();
    let padding = specs.padding?;
    let specs = Specification {
        check_trailing_bits: false,
        padding: None,
        ..specs
    };
    let encoding = specs.encoding().ok()?;
    let sane_string = input.trim_end_matches(padding);
    encoding.decode(sane_string.as_bytes()).ok()
}

/// Try parsing from either alphabet, `base64url` first.
pub fn try_from_any_base64(input: &str) -> Option<Vec<u8>> {
    try_from_base64url(input).or_else(|| try_from_base64(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_both_alphabets_with_and_without_padding() {
        let data = [0xfb, 0xff, 0xfe, 0x01];
        assert_eq!(base64url(&data), "-__-AQ");
        assert_eq!(base64(&data), "+//+AQ");

        for encoded in ["-__-AQ", "-__-AQ==", "+//+AQ", "+//+AQ=="] {
            assert_eq!(
                try_from_any_base64(encoded).as_deref(),
                Some(data.as_slice()),
                "{encoded}"
            );
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(try_from_any_base64("not base64!").is_none());
    }
}
