// RVOracle - RV32I Commit-Trace Verification Oracle
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Program images: flat word lists parsed from hex dumps, one 32-bit
//! word per line, based at PC zero.

use crate::{OracleError, OracleResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramImage {
    words: Vec<u32>,
}

impl ProgramImage {
    pub fn from_words(words: Vec<u32>) -> Self {
        Self { words }
    }

    /// Parse the hex dump format used by RTL testbenches: one word per
    /// line, optional `0x` prefix, `#` and `//` comments, blank lines
    /// skipped. Anything else on a line is a hard error; silently
    /// dropping a word would shift every PC after it.
    pub fn parse_hex(text: &str) -> OracleResult<Self> {
        let mut words = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.split_once('#').map_or(raw, |(head, _)| head);
            let line = line.split_once("//").map_or(line, |(head, _)| head);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let digits = line
                .strip_prefix("0x")
                .or_else(|| line.strip_prefix("0X"))
                .unwrap_or(line);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(OracleError::MalformedImage {
                    line: idx + 1,
                    token: raw.trim().to_string(),
                });
            }
            // Words wider than 32 bits keep their low 32, same as
            // masking with 0xFFFFFFFF.
            let digits = if digits.len() > 8 {
                &digits[digits.len() - 8..]
            } else {
                digits
            };
            let word = u32::from_str_radix(digits, 16).map_err(|_| OracleError::MalformedImage {
                line: idx + 1,
                token: raw.trim().to_string(),
            })?;
            words.push(word);
        }
        Ok(Self { words })
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Word holding `pc`, or `None` when `pc` is unaligned or past the
    /// end of the image.
    pub fn word_at(&self, pc: u32) -> Option<u32> {
        if pc % 4 != 0 {
            return None;
        }
        self.words.get((pc / 4) as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_basic() {
        let image = ProgramImage::parse_hex("00500093\n0x00A00113\nDEADBEEF\n").unwrap();
        assert_eq!(image.words(), &[0x00500093, 0x00A00113, 0xDEADBEEF]);
    }

    #[test]
    fn test_parse_hex_skips_comments_and_blanks() {
        let text = "# header comment\n\n00500093  # addi x1, x0, 5\n// full line comment\n00A00113 // trailing\n   \n";
        let image = ProgramImage::parse_hex(text).unwrap();
        assert_eq!(image.words(), &[0x00500093, 0x00A00113]);
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        let err = ProgramImage::parse_hex("00500093\nnot-hex\n").unwrap_err();
        match err {
            OracleError::MalformedImage { line, token } => {
                assert_eq!(line, 2);
                assert_eq!(token, "not-hex");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_hex_truncates_wide_words() {
        // Nine digits: only the low 32 bits survive.
        let image = ProgramImage::parse_hex("100000001\n").unwrap();
        assert_eq!(image.words(), &[0x00000001]);
    }

    #[test]
    fn test_word_at() {
        let image = ProgramImage::from_words(vec![0x11, 0x22]);
        assert_eq!(image.word_at(0), Some(0x11));
        assert_eq!(image.word_at(4), Some(0x22));
        assert_eq!(image.word_at(8), None);
        assert_eq!(image.word_at(2), None);
    }
}
