//! Bidirectional, stateless translation between ASCII and the EBCDIC
//! code page 037 printable-character subset used by the 5250 data stream.
//!
//! Both directions are backed by `'static` 256-byte lookup tables built
//! once behind [`std::sync::LazyLock`]. Unmapped bytes round-trip through
//! space (ASCII `0x20` / EBCDIC `0x40`) rather than erroring — the data
//! stream has no way to signal an encoding failure mid-frame, so silent
//! substitution is the only sound behavior here.

#![deny(unsafe_code)]

use std::sync::LazyLock;

const ASCII_SPACE: u8 = 0x20;
const EBCDIC_SPACE: u8 = 0x40;

/// `(ascii, ebcdic)` pairs explicitly mapped by this codec. Everything not
/// listed here decodes/encodes to space.
const EXPLICIT_PAIRS: &[(u8, u8)] = &[
    (0x00, 0x00), // NUL
    (ASCII_SPACE, EBCDIC_SPACE),
    // digits
    (b'0', 0xF0),
    (b'1', 0xF1),
    (b'2', 0xF2),
    (b'3', 0xF3),
    (b'4', 0xF4),
    (b'5', 0xF5),
    (b'6', 0xF6),
    (b'7', 0xF7),
    (b'8', 0xF8),
    (b'9', 0xF9),
    // uppercase A-I, J-R, S-Z
    (b'A', 0xC1),
    (b'B', 0xC2),
    (b'C', 0xC3),
    (b'D', 0xC4),
    (b'E', 0xC5),
    (b'F', 0xC6),
    (b'G', 0xC7),
    (b'H', 0xC8),
    (b'I', 0xC9),
    (b'J', 0xD1),
    (b'K', 0xD2),
    (b'L', 0xD3),
    (b'M', 0xD4),
    (b'N', 0xD5),
    (b'O', 0xD6),
    (b'P', 0xD7),
    (b'Q', 0xD8),
    (b'R', 0xD9),
    (b'S', 0xE2),
    (b'T', 0xE3),
    (b'U', 0xE4),
    (b'V', 0xE5),
    (b'W', 0xE6),
    (b'X', 0xE7),
    (b'Y', 0xE8),
    (b'Z', 0xE9),
    // lowercase a-i, j-r, s-z
    (b'a', 0x81),
    (b'b', 0x82),
    (b'c', 0x83),
    (b'd', 0x84),
    (b'e', 0x85),
    (b'f', 0x86),
    (b'g', 0x87),
    (b'h', 0x88),
    (b'i', 0x89),
    (b'j', 0x91),
    (b'k', 0x92),
    (b'l', 0x93),
    (b'm', 0x94),
    (b'n', 0x95),
    (b'o', 0x96),
    (b'p', 0x97),
    (b'q', 0x98),
    (b'r', 0x99),
    (b's', 0xA2),
    (b't', 0xA3),
    (b'u', 0xA4),
    (b'v', 0xA5),
    (b'w', 0xA6),
    (b'x', 0xA7),
    (b'y', 0xA8),
    (b'z', 0xA9),
    // punctuation
    (b'!', 0x5A),
    (b'"', 0x7F),
    (b'#', 0x7B),
    (b'$', 0x5B),
    (b'%', 0x6C),
    (b'&', 0x50),
    (b'\'', 0x7D),
    (b'(', 0x4D),
    (b')', 0x5D),
    (b'*', 0x5C),
    (b'+', 0x4E),
    (b',', 0x6B),
    (b'-', 0x60),
    (b'.', 0x4B),
    (b'/', 0x61),
    (b':', 0x7A),
    (b';', 0x5E),
    (b'<', 0x4C),
    (b'=', 0x7E),
    (b'>', 0x6E),
    (b'?', 0x6F),
    (b'@', 0x7C),
    (b'[', 0xBA),
    (b'\\', 0xE0),
    (b']', 0xBB),
    (b'^', 0x5F),
    (b'_', 0x6D),
    (b'`', 0x79),
    (b'{', 0xC0),
    (b'|', 0x4F),
    (b'}', 0xD0),
    (b'~', 0xA1),
];

static ASCII_TO_EBCDIC: LazyLock<[u8; 256]> = LazyLock::new(|| {
    let mut table = [EBCDIC_SPACE; 256];
    for &(ascii, ebcdic) in EXPLICIT_PAIRS {
        table[ascii as usize] = ebcdic;
    }
    table
});

static EBCDIC_TO_ASCII: LazyLock<[u8; 256]> = LazyLock::new(|| {
    let mut table = [ASCII_SPACE; 256];
    for &(ascii, ebcdic) in EXPLICIT_PAIRS {
        table[ebcdic as usize] = ascii;
    }
    table
});

/// Translate a single ASCII byte into its EBCDIC encoding.
///
/// Bytes with no explicit mapping encode to EBCDIC space (`0x40`).
#[must_use]
pub fn from_ascii(byte: u8) -> u8 {
    ASCII_TO_EBCDIC[byte as usize]
}

/// Translate a single EBCDIC byte into its ASCII decoding.
///
/// Bytes with no explicit mapping decode to ASCII space (`0x20`).
#[must_use]
pub fn to_ascii(byte: u8) -> u8 {
    EBCDIC_TO_ASCII[byte as usize]
}

/// Encode an ASCII string into EBCDIC bytes, one byte per input byte.
///
/// Operates on raw bytes, not `char`s: non-ASCII UTF-8 input is translated
/// byte-by-byte like any other unmapped input, which is an acceptable
/// (if degenerate) outcome for a screen whose catalog is expected to be
/// plain ASCII.
#[must_use]
pub fn encode_str(input: &str) -> Vec<u8> {
    input.bytes().map(from_ascii).collect()
}

/// Decode EBCDIC bytes into an ASCII `String`.
#[must_use]
pub fn decode_bytes(input: &[u8]) -> String {
    input.iter().copied().map(to_ascii).map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nul_round_trips() {
        assert_eq!(from_ascii(0x00), 0x00);
        assert_eq!(to_ascii(0x00), 0x00);
    }

    #[test]
    fn space_round_trips() {
        assert_eq!(from_ascii(b' '), EBCDIC_SPACE);
        assert_eq!(to_ascii(EBCDIC_SPACE), b' ');
    }

    #[test]
    fn digits_pin_fixed_bytes() {
        assert_eq!(from_ascii(b'0'), 0xF0);
        assert_eq!(from_ascii(b'9'), 0xF9);
        assert_eq!(to_ascii(0xF0), b'0');
    }

    #[test]
    fn letters_pin_fixed_bytes() {
        assert_eq!(from_ascii(b'A'), 0xC1);
        assert_eq!(from_ascii(b'Z'), 0xE9);
        assert_eq!(from_ascii(b'a'), 0x81);
        assert_eq!(from_ascii(b'z'), 0xA9);
    }

    #[test]
    fn punctuation_pin_fixed_bytes() {
        assert_eq!(from_ascii(b'$'), 0x5B);
        assert_eq!(from_ascii(b'.'), 0x4B);
        assert_eq!(from_ascii(b','), 0x6B);
    }

    #[test]
    fn every_explicit_pair_round_trips() {
        for &(ascii, ebcdic) in EXPLICIT_PAIRS {
            assert_eq!(from_ascii(ascii), ebcdic, "ascii 0x{ascii:02X} -> ebcdic");
            assert_eq!(to_ascii(ebcdic), ascii, "ebcdic 0x{ebcdic:02X} -> ascii");
        }
    }

    #[test]
    fn unmapped_byte_round_trips_through_space() {
        // 0x01 (SOH) has no explicit mapping.
        assert_eq!(from_ascii(0x01), EBCDIC_SPACE);
        assert_eq!(to_ascii(0x01), ASCII_SPACE);
    }

    #[test]
    fn string_helpers_round_trip() {
        let original = "Hello, World! $1,234.56";
        let encoded = encode_str(original);
        let decoded = decode_bytes(&encoded);
        assert_eq!(decoded, original);
    }

    #[test]
    fn no_duplicate_ebcdic_targets() {
        let mut seen = std::collections::HashSet::new();
        for &(_, ebcdic) in EXPLICIT_PAIRS {
            assert!(seen.insert(ebcdic), "duplicate EBCDIC byte 0x{ebcdic:02X}");
        }
    }
}
