//! WinAnsiEncoding for replacement text
//!
//! The overlay font is a non-embedded Type1 Helvetica with
//! `/Encoding /WinAnsiEncoding`, so every shown byte must be a WinAnsi code.
//! Text is mapped character by character; anything outside the table is
//! substituted or rejected according to [`UnsupportedCharPolicy`].

use tracing::warn;

use crate::error::{PdfPatchError, Result};
use crate::options::UnsupportedCharPolicy;

const SUBSTITUTE: u8 = b'?';

/// Windows-1252 assignments in 0x80..=0x9F. Unassigned slots are absent.
const WIN_ANSI_HIGH: [(char, u8); 27] = [
    ('\u{20AC}', 0x80),
    ('\u{201A}', 0x82),
    ('\u{0192}', 0x83),
    ('\u{201E}', 0x84),
    ('\u{2026}', 0x85),
    ('\u{2020}', 0x86),
    ('\u{2021}', 0x87),
    ('\u{02C6}', 0x88),
    ('\u{2030}', 0x89),
    ('\u{0160}', 0x8A),
    ('\u{2039}', 0x8B),
    ('\u{0152}', 0x8C),
    ('\u{017D}', 0x8E),
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('\u{2022}', 0x95),
    ('\u{2013}', 0x96),
    ('\u{2014}', 0x97),
    ('\u{02DC}', 0x98),
    ('\u{2122}', 0x99),
    ('\u{0161}', 0x9A),
    ('\u{203A}', 0x9B),
    ('\u{0153}', 0x9C),
    ('\u{017E}', 0x9E),
    ('\u{0178}', 0x9F),
];

/// Replacement text as WinAnsi bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedText {
    pub bytes: Vec<u8>,
    /// Number of characters replaced by `?`
    pub substituted: usize,
}

/// WinAnsi code for `c`, if it has one.
pub fn win_ansi_byte(c: char) -> Option<u8> {
    match c as u32 {
        0x20..=0x7E => Some(c as u8),
        0xA0..=0xFF => Some(c as u32 as u8),
        _ => WIN_ANSI_HIGH
            .iter()
            .find(|(ch, _)| *ch == c)
            .map(|(_, byte)| *byte),
    }
}

pub fn encode_win_ansi(text: &str, policy: UnsupportedCharPolicy) -> Result<EncodedText> {
    let mut bytes = Vec::with_capacity(text.len());
    let mut substituted = 0;

    for c in text.chars() {
        match win_ansi_byte(c) {
            Some(byte) => bytes.push(byte),
            None => match policy {
                UnsupportedCharPolicy::Substitute => {
                    bytes.push(SUBSTITUTE);
                    substituted += 1;
                }
                UnsupportedCharPolicy::Reject => {
                    return Err(PdfPatchError::EncodingHazard(format!(
                        "U+{:04X} in {:?}",
                        c as u32, text
                    )));
                }
            },
        }
    }

    if substituted > 0 {
        warn!(
            "Substituted {} unsupported character(s) in {:?}",
            substituted, text
        );
    }

    Ok(EncodedText { bytes, substituted })
}

/// Body of a PDF literal string (without the enclosing parentheses).
///
/// Delimiters and backslash are escaped; bytes outside printable ASCII are
/// written as octal escapes.
pub fn escape_literal(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 8);
    for &byte in bytes {
        match byte {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(byte);
            }
            0x20..=0x7E => out.push(byte),
            _ => out.extend_from_slice(format!("\\{:03o}", byte).as_bytes()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ascii_passes_through() {
        let encoded = encode_win_ansi("Hello, World!", UnsupportedCharPolicy::Reject).unwrap();
        assert_eq!(encoded.bytes, b"Hello, World!".to_vec());
        assert_eq!(encoded.substituted, 0);
    }

    #[test]
    fn test_latin1_and_windows_1252_ranges() {
        let encoded = encode_win_ansi("café – €5", UnsupportedCharPolicy::Reject).unwrap();
        assert_eq!(
            encoded.bytes,
            vec![b'c', b'a', b'f', 0xE9, b' ', 0x96, b' ', 0x80, b'5']
        );
    }

    #[test]
    fn test_substitute_unsupported() {
        let encoded = encode_win_ansi("日本 ok", UnsupportedCharPolicy::Substitute).unwrap();
        assert_eq!(encoded.bytes, b"?? ok".to_vec());
        assert_eq!(encoded.substituted, 2);
    }

    #[test]
    fn test_control_characters_are_unsupported() {
        let encoded = encode_win_ansi("a\nb\u{7}", UnsupportedCharPolicy::Substitute).unwrap();
        assert_eq!(encoded.bytes, b"a?b?".to_vec());
    }

    #[test]
    fn test_reject_unsupported() {
        let err = encode_win_ansi("snow ☃", UnsupportedCharPolicy::Reject).unwrap_err();
        assert!(matches!(err, PdfPatchError::EncodingHazard(_)));
        assert!(err.to_string().contains("U+2603"));
    }

    #[test]
    fn test_unassigned_1252_slot_is_unsupported() {
        // 0x81 has no Windows-1252 assignment; U+0081 must not map to it
        assert_eq!(win_ansi_byte('\u{0081}'), None);
    }

    #[test]
    fn test_escape_delimiters() {
        assert_eq!(escape_literal(b"a(b)c\\d"), b"a\\(b\\)c\\\\d".to_vec());
    }

    #[test]
    fn test_escape_high_bytes_as_octal() {
        assert_eq!(escape_literal(&[b'x', 0xE9, 0x80]), b"x\\351\\200".to_vec());
    }
}
