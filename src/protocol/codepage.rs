//! # Single-Byte Codepages
//!
//! Converts Unicode strings to the single-byte tables the legacy printer
//! understands. The printer must be switched to the matching table with
//! `ESC t n` ([`select`]) before the encoded bytes are sent.
//!
//! - Printable ASCII and LF pass through unchanged in every table.
//! - Other C0 controls (ESC, GS, ...) are not text and become `?`, so text
//!   can never start a device command.
//! - The upper half (0x80–0xFF) is looked up in a 128-entry table.
//! - Characters with no representation become `?` and a warning is logged.
//!
//! PC862 is PC437 with the first 27 upper-half slots replaced by the Hebrew
//! alphabet (א at 0x80 through ת at 0x9A, final forms in Unicode order).
//! Neither table knows anything about text direction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::commands::ESC;

/// Upper half of IBM PC437, bytes 0x80–0xFF in order.
const PC437_UPPER: &str = concat!(
    "ÇüéâäàåçêëèïîìÄÅ",
    "ÉæÆôöòûùÿÖÜ¢£¥₧ƒ",
    "áíóúñÑªº¿⌐¬½¼¡«»",
    "░▒▓│┤╡╢╖╕╣║╗╝╜╛┐",
    "└┴┬├─┼╞╟╚╔╩╦╠═╬╧",
    "╨╤╥╙╘╒╓╫╪┘┌█▄▌▐▀",
    "αßΓπΣσµτΦΘΩδ∞φε∩",
    "≡±≥≤⌠⌡÷≈°∙·√ⁿ²■\u{00A0}",
);

/// First Hebrew letter (א) and the number of letters PC862 maps from 0x80.
const HEBREW_ALEF: u32 = 0x05D0;
const HEBREW_LETTERS: u32 = 27;

/// A single-byte character table selectable with `ESC t n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codepage {
    /// PC437 (USA, standard Europe)
    #[default]
    Pc437,
    /// PC862 (Hebrew)
    Pc862,
    /// Any other table id; only ASCII is encodable
    Table(u8),
}

impl Codepage {
    /// Table id sent as the `ESC t` parameter.
    pub fn table_id(self) -> u8 {
        match self {
            Self::Pc437 => 0,
            Self::Pc862 => 15,
            Self::Table(n) => n,
        }
    }

    /// Encode `s` into this table.
    pub fn encode(self, s: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(s.len());
        for ch in s.chars() {
            match self.encode_char(ch) {
                Some(byte) => out.push(byte),
                None => {
                    warn!(
                        codepage = %self,
                        "unmapped character {:?} (U+{:04X}), replacing with '?'",
                        ch,
                        ch as u32
                    );
                    out.push(b'?');
                }
            }
        }
        out
    }

    /// Decode bytes from this table back to a string (unknown bytes become U+FFFD).
    pub fn decode(self, bytes: &[u8]) -> String {
        bytes.iter().map(|&b| self.decode_byte(b)).collect()
    }

    fn encode_char(self, ch: char) -> Option<u8> {
        let code = ch as u32;
        if code < 0x20 && ch != '\n' {
            return None;
        }
        if code < 0x80 {
            return Some(code as u8);
        }
        match self {
            Self::Pc862 if (HEBREW_ALEF..HEBREW_ALEF + HEBREW_LETTERS).contains(&code) => {
                Some(0x80 + (code - HEBREW_ALEF) as u8)
            }
            Self::Pc862 => upper_position(ch).filter(|&b| b >= 0x80 + HEBREW_LETTERS as u8),
            Self::Pc437 => upper_position(ch),
            Self::Table(_) => None,
        }
    }

    fn decode_byte(self, byte: u8) -> char {
        if byte < 0x80 {
            return byte as char;
        }
        match self {
            Self::Pc862 if u32::from(byte - 0x80) < HEBREW_LETTERS => {
                char::from_u32(HEBREW_ALEF + u32::from(byte - 0x80)).unwrap_or('\u{FFFD}')
            }
            Self::Pc437 | Self::Pc862 => PC437_UPPER
                .chars()
                .nth(usize::from(byte - 0x80))
                .unwrap_or('\u{FFFD}'),
            Self::Table(_) => '\u{FFFD}',
        }
    }
}

fn upper_position(ch: char) -> Option<u8> {
    PC437_UPPER
        .chars()
        .position(|c| c == ch)
        .map(|i| 0x80 + i as u8)
}

impl fmt::Display for Codepage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pc437 => write!(f, "pc437"),
            Self::Pc862 => write!(f, "pc862"),
            Self::Table(n) => write!(f, "table-{}", n),
        }
    }
}

impl FromStr for Codepage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pc437" | "cp437" | "437" => Ok(Self::Pc437),
            "pc862" | "cp862" | "862" | "hebrew" => Ok(Self::Pc862),
            other => other
                .strip_prefix("table-")
                .unwrap_or(other)
                .parse::<u8>()
                .map(Self::Table)
                .map_err(|_| format!("Unknown codepage '{}'", s)),
        }
    }
}

/// # Select Codepage (ESC t n)
///
/// | Format  | Bytes     |
/// |---------|-----------|
/// | Hex     | 1B 74 n   |
///
/// ```
/// use kabala::protocol::codepage::{select, Codepage};
///
/// assert_eq!(select(Codepage::Pc862), vec![0x1B, 0x74, 0x0F]);
/// ```
pub fn select(cp: Codepage) -> Vec<u8> {
    vec![ESC, b't', cp.table_id()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_has_128_entries() {
        assert_eq!(PC437_UPPER.chars().count(), 128);
    }

    #[test]
    fn test_ascii_passthrough() {
        assert_eq!(Codepage::Pc862.encode("Total: 42"), b"Total: 42");
        assert_eq!(Codepage::Table(3).encode("abc"), b"abc");
    }

    #[test]
    fn test_control_bytes_replaced() {
        assert_eq!(Codepage::Pc437.encode("Dana\u{1D}V1"), b"Dana?V1");
        assert_eq!(Codepage::Pc862.encode("\u{1B}@x"), b"?@x");
        assert_eq!(Codepage::Table(3).encode("a\tb"), b"a?b");
        assert_eq!(Codepage::Pc437.encode("a\nb"), b"a\nb");
    }

    #[test]
    fn test_hebrew_letters() {
        assert_eq!(Codepage::Pc862.encode("א"), vec![0x80]);
        assert_eq!(Codepage::Pc862.encode("ת"), vec![0x9A]);
        // "בדיקה": bet, dalet, yod, qof, he
        assert_eq!(
            Codepage::Pc862.encode("בדיקה"),
            vec![0x81, 0x83, 0x89, 0x97, 0x84]
        );
    }

    #[test]
    fn test_final_forms() {
        // final kaf, final mem, final nun, final pe, final tsadi
        assert_eq!(
            Codepage::Pc862.encode("ךםןףץ"),
            vec![0x8A, 0x8D, 0x8F, 0x93, 0x95]
        );
    }

    #[test]
    fn test_pc862_shares_box_drawing() {
        assert_eq!(Codepage::Pc862.encode("┌─┐"), vec![0xDA, 0xC4, 0xBF]);
        assert_eq!(Codepage::Pc437.encode("┌─┐"), vec![0xDA, 0xC4, 0xBF]);
    }

    #[test]
    fn test_pc862_has_no_latin_accents() {
        // 0x82 is 'é' in PC437 but 'ג' in PC862
        assert_eq!(Codepage::Pc437.encode("é"), vec![0x82]);
        assert_eq!(Codepage::Pc862.encode("é"), vec![b'?']);
    }

    #[test]
    fn test_hebrew_not_in_pc437() {
        assert_eq!(Codepage::Pc437.encode("שלום"), b"????");
    }

    #[test]
    fn test_decode() {
        assert_eq!(Codepage::Pc862.decode(&[0x81, 0x83, 0x20, 0x31]), "בד 1");
        assert_eq!(Codepage::Pc437.decode(&[0x82, 0xF8]), "é°");
    }

    #[test]
    fn test_select() {
        assert_eq!(select(Codepage::Pc437), vec![0x1B, 0x74, 0x00]);
        assert_eq!(select(Codepage::Table(17)), vec![0x1B, 0x74, 17]);
    }

    #[test]
    fn test_parse() {
        assert_eq!("cp862".parse::<Codepage>().unwrap(), Codepage::Pc862);
        assert_eq!("PC437".parse::<Codepage>().unwrap(), Codepage::Pc437);
        assert_eq!("table-21".parse::<Codepage>().unwrap(), Codepage::Table(21));
        assert_eq!("21".parse::<Codepage>().unwrap(), Codepage::Table(21));
        assert!("klingon".parse::<Codepage>().is_err());
    }
}
