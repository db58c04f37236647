//! Conversion between byte offsets and (line, token) coordinates
//!
//! Downstream consumers of zones index documents by line number and token
//! index instead of by offset. This module builds both lookup tables once per
//! document and answers queries with binary search.
//!
//! ## Coordinates
//!
//! - Lines are 1-based and separated by `\n` or `\r\n`
//! - Tokens are 0-based runs of non-whitespace within a line
//! - An offset maps to the last token on its line that begins at or before
//!   it, or token 0 when no token has begun yet
//!
//! Converting a token's begin offset to coordinates and back yields the same
//! offset. Offsets inside a token or inside whitespace round to the begin of
//! the token that covers them.

use crate::error::CoordinateError;
use serde::Serialize;
use std::fmt;

/// A line:token position in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LineTokenPosition {
    /// 1-based line number
    pub line: usize,
    /// 0-based token index within the line
    pub token: usize,
}

impl LineTokenPosition {
    pub fn new(line: usize, token: usize) -> Self {
        Self { line, token }
    }
}

impl fmt::Display for LineTokenPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.token)
    }
}

/// Provides fast conversion between byte offsets and line/token positions
#[derive(Debug, Clone)]
pub struct OffsetConverter {
    len: usize,
    /// Byte offsets where each line starts
    line_starts: Vec<usize>,
    /// Byte offsets where each token starts, per line
    token_starts: Vec<Vec<usize>>,
}

impl OffsetConverter {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        let mut token_starts = vec![Vec::new()];
        let mut in_token = false;

        for (byte_pos, ch) in text.char_indices() {
            if ch == '\n' {
                line_starts.push(byte_pos + 1);
                token_starts.push(Vec::new());
                in_token = false;
            } else if ch.is_whitespace() {
                in_token = false;
            } else if !in_token {
                if let Some(line) = token_starts.last_mut() {
                    line.push(byte_pos);
                }
                in_token = true;
            }
        }

        Self {
            len: text.len(),
            line_starts,
            token_starts,
        }
    }

    /// Convert a byte offset to a line/token position.
    ///
    /// `offset == len` is valid and maps onto the last line.
    pub fn offset_to_line_token(
        &self,
        offset: usize,
    ) -> Result<LineTokenPosition, CoordinateError> {
        if offset > self.len {
            return Err(CoordinateError::OffsetOutOfBounds {
                offset,
                len: self.len,
            });
        }

        let line = self
            .line_starts
            .binary_search(&offset)
            .unwrap_or_else(|i| i - 1);
        let token = self.token_starts[line]
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);

        Ok(LineTokenPosition::new(line + 1, token))
    }

    /// Convert a line/token position back to the token's begin offset.
    ///
    /// Token 0 of a line without tokens is that line's start.
    pub fn line_token_to_offset(
        &self,
        position: LineTokenPosition,
    ) -> Result<usize, CoordinateError> {
        let not_found = CoordinateError::PositionNotFound {
            line: position.line,
            token: position.token,
        };
        let index = position.line.checked_sub(1).ok_or_else(|| not_found.clone())?;
        let tokens = self.token_starts.get(index).ok_or_else(|| not_found.clone())?;

        match tokens.get(position.token) {
            Some(&offset) => Ok(offset),
            None if tokens.is_empty() && position.token == 0 => Ok(self.line_starts[index]),
            None => Err(not_found),
        }
    }

    /// Get the total number of lines in the document
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offsets of every token begin, in document order.
    pub fn token_offsets(&self) -> impl Iterator<Item = usize> + '_ {
        self.token_starts.iter().flatten().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "HPI: cough\r\n\n  Plan:  rest well\n";

    #[test]
    fn test_line_and_token_lookup() {
        let conv = OffsetConverter::new(TEXT);
        assert_eq!(conv.line_count(), 4);
        assert_eq!(conv.offset_to_line_token(0).unwrap(), LineTokenPosition::new(1, 0));
        assert_eq!(conv.offset_to_line_token(5).unwrap(), LineTokenPosition::new(1, 1));
        // inside "cough"
        assert_eq!(conv.offset_to_line_token(7).unwrap(), LineTokenPosition::new(1, 1));
        // the empty line
        assert_eq!(conv.offset_to_line_token(12).unwrap(), LineTokenPosition::new(2, 0));
        // leading whitespace before "Plan:"
        assert_eq!(conv.offset_to_line_token(13).unwrap(), LineTokenPosition::new(3, 0));
        assert_eq!(conv.offset_to_line_token(22).unwrap(), LineTokenPosition::new(3, 1));
    }

    #[test]
    fn test_inverse_returns_token_begin() {
        let conv = OffsetConverter::new(TEXT);
        assert_eq!(conv.line_token_to_offset(LineTokenPosition::new(3, 0)).unwrap(), 15);
        assert_eq!(conv.line_token_to_offset(LineTokenPosition::new(3, 2)).unwrap(), 27);
        assert_eq!(conv.line_token_to_offset(LineTokenPosition::new(2, 0)).unwrap(), 12);
    }

    #[test]
    fn test_round_trip_on_token_begins() {
        let conv = OffsetConverter::new(TEXT);
        for offset in conv.token_offsets().collect::<Vec<_>>() {
            let pos = conv.offset_to_line_token(offset).unwrap();
            assert_eq!(conv.line_token_to_offset(pos).unwrap(), offset);
        }
    }

    #[test]
    fn test_end_of_document_is_valid() {
        let conv = OffsetConverter::new(TEXT);
        assert_eq!(
            conv.offset_to_line_token(TEXT.len()).unwrap(),
            LineTokenPosition::new(4, 0)
        );
    }

    #[test]
    fn test_out_of_bounds_is_an_error() {
        let conv = OffsetConverter::new("abc");
        assert_eq!(
            conv.offset_to_line_token(4),
            Err(CoordinateError::OffsetOutOfBounds { offset: 4, len: 3 })
        );
        assert_eq!(
            conv.line_token_to_offset(LineTokenPosition::new(0, 0)),
            Err(CoordinateError::PositionNotFound { line: 0, token: 0 })
        );
        assert_eq!(
            conv.line_token_to_offset(LineTokenPosition::new(1, 1)),
            Err(CoordinateError::PositionNotFound { line: 1, token: 1 })
        );
    }

    #[test]
    fn test_multibyte_text() {
        let conv = OffsetConverter::new("é ü\nß");
        assert_eq!(conv.offset_to_line_token(3).unwrap(), LineTokenPosition::new(1, 1));
        assert_eq!(conv.line_token_to_offset(LineTokenPosition::new(2, 0)).unwrap(), 6);
    }
}
