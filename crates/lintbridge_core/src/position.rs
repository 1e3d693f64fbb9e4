//! Conversion between engine line/column locations and document offsets.
//!
//! The engine reports 1-based lines and columns counted in UTF-16 code
//! units, the same space its fix ranges use. Offsets produced here are in
//! that space as well; [`utf16_to_byte`] converts them for slicing a `str`.

use serde::{Deserialize, Serialize};

use crate::LintError;
use crate::document::LineEnding;

/// A 1-based source location as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl SourcePosition {
    /// Creates a new source position.
    pub const fn new(line: u32, column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            line,
            column,
            end_line,
            end_column,
        }
    }
}

/// A half-open range of UTF-16 offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OffsetRange {
    pub start: u32,
    pub end: u32,
}

impl OffsetRange {
    /// Creates a new range.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Returns true if the range is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if this range contains the given offset.
    #[inline]
    pub const fn contains(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Returns true if the two ranges share at least one offset.
    ///
    /// Empty ranges never intersect anything.
    #[inline]
    pub const fn intersects(&self, other: &OffsetRange) -> bool {
        self.start < other.end && other.start < self.end && !self.is_empty() && !other.is_empty()
    }
}

/// Maps a 1-based engine location to an offset range within `text`.
///
/// Lines are split on `line_ending`; the running offset advances by each
/// line's length plus the marker length. Scanning stops at `end_line`.
pub fn to_range(
    text: &str,
    line_ending: LineEnding,
    pos: SourcePosition,
) -> Result<OffsetRange, LintError> {
    if pos.line == 0 || pos.column == 0 || pos.end_line == 0 || pos.end_column == 0 {
        return Err(LintError::position(format!(
            "{}:{}-{}:{} is not 1-based",
            pos.line, pos.column, pos.end_line, pos.end_column
        )));
    }
    if (pos.end_line, pos.end_column) < (pos.line, pos.column) {
        return Err(LintError::position(format!(
            "end {}:{} precedes start {}:{}",
            pos.end_line, pos.end_column, pos.line, pos.column
        )));
    }

    let marker_len = line_ending.len_utf16();
    let mut running = 0u32;
    let mut start = None;
    let mut end = None;
    let mut line_count = 0u32;

    for (index, line) in text.split(line_ending.as_str()).enumerate() {
        let line_no = index as u32 + 1;
        line_count = line_no;
        if line_no == pos.line {
            start = Some(offset_in_line(running, pos.column)?);
        }
        if line_no == pos.end_line {
            end = Some(offset_in_line(running, pos.end_column)?);
            break;
        }
        running += line.encode_utf16().count() as u32 + marker_len;
    }

    match (start, end) {
        (Some(start), Some(end)) => Ok(OffsetRange::new(start, end)),
        _ => Err(LintError::position(format!(
            "line {} is beyond the end of a {line_count}-line document",
            pos.end_line
        ))),
    }
}

fn offset_in_line(line_start: u32, column: u32) -> Result<u32, LintError> {
    line_start
        .checked_add(column - 1)
        .ok_or_else(|| LintError::position(format!("column {column} is out of range")))
}

/// Converts a UTF-16 offset into a byte offset within `text`.
///
/// Returns `None` if the offset is past the end or splits a surrogate pair.
pub fn utf16_to_byte(text: &str, offset: u32) -> Option<usize> {
    let mut units = 0u32;
    for (byte, ch) in text.char_indices() {
        if units == offset {
            return Some(byte);
        }
        if units > offset {
            return None;
        }
        units += ch.len_utf16() as u32;
    }
    (units == offset).then_some(text.len())
}

/// Converts a byte offset into a UTF-16 offset within `text`.
///
/// Returns `None` if the offset is past the end or not on a char boundary.
pub fn byte_to_utf16(text: &str, offset: usize) -> Option<u32> {
    if !text.is_char_boundary(offset) {
        return None;
    }
    Some(text[..offset].encode_utf16().count() as u32)
}

/// Returns the 0-based line and UTF-16 column of an offset.
///
/// Any of `\n`, `\r\n` or `\r` ends a line.
pub fn line_column_of(text: &str, offset: u32) -> Option<(u32, u32)> {
    let mut line = 0u32;
    let mut col = 0u32;
    let mut units = 0u32;
    let mut chars = text.chars().peekable();

    while units < offset {
        let ch = chars.next()?;
        units += ch.len_utf16() as u32;
        match ch {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                units += 1;
                line += 1;
                col = 0;
            }
            '\n' | '\r' => {
                line += 1;
                col = 0;
            }
            _ => col += ch.len_utf16() as u32,
        }
    }

    (units == offset).then_some((line, col))
}

/// Returns the UTF-16 offset of a 0-based line and UTF-16 column.
///
/// Columns past the end of the line are clamped to the line end, matching
/// how editors treat positions beyond the last character.
pub fn offset_of(text: &str, line: u32, column: u32) -> Option<u32> {
    let mut current_line = 0u32;
    let mut units = 0u32;
    let mut chars = text.chars().peekable();

    while current_line < line {
        let ch = chars.next()?;
        units += ch.len_utf16() as u32;
        match ch {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                units += 1;
                current_line += 1;
            }
            '\n' | '\r' => current_line += 1,
            _ => {}
        }
    }

    let mut col = 0u32;
    while col < column {
        match chars.peek() {
            Some('\n') | Some('\r') | None => break,
            Some(ch) => {
                let width = ch.len_utf16() as u32;
                col += width;
                units += width;
                chars.next();
            }
        }
    }

    Some(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn slice(text: &str, range: OffsetRange) -> &str {
        let start = utf16_to_byte(text, range.start).unwrap();
        let end = utf16_to_byte(text, range.end).unwrap();
        &text[start..end]
    }

    #[test]
    fn maps_single_line_span() {
        let text = "var a = 1;";
        let range = to_range(text, LineEnding::Lf, SourcePosition::new(1, 1, 1, 4)).unwrap();
        assert_eq!(range, OffsetRange::new(0, 3));
        assert_eq!(slice(text, range), "var");
    }

    #[test]
    fn maps_span_on_later_line() {
        let text = "const a = 1;\nvar b = 2;\n";
        let range = to_range(text, LineEnding::Lf, SourcePosition::new(2, 1, 2, 4)).unwrap();
        assert_eq!(range, OffsetRange::new(13, 16));
        assert_eq!(slice(text, range), "var");
    }

    #[test]
    fn maps_multi_line_span() {
        let text = "if (a) {\n  b();\n}\n";
        let range = to_range(text, LineEnding::Lf, SourcePosition::new(1, 8, 3, 2)).unwrap();
        assert_eq!(slice(text, range), "{\n  b();\n}");
    }

    #[test]
    fn counts_two_character_line_endings() {
        let text = "let a;\r\nlet b;\r\nlet c;";
        let range = to_range(text, LineEnding::CrLf, SourcePosition::new(3, 5, 3, 6)).unwrap();
        assert_eq!(range, OffsetRange::new(20, 21));
        assert_eq!(slice(text, range), "c");
    }

    #[test]
    fn counts_utf16_units_for_non_ascii_lines() {
        let text = "const s = \"日本🎉\";\nfoo();";
        // "日本🎉" is 2 + 2 UTF-16 units; the second line starts at 18.
        let range = to_range(text, LineEnding::Lf, SourcePosition::new(2, 1, 2, 4)).unwrap();
        assert_eq!(range, OffsetRange::new(18, 21));
        assert_eq!(slice(text, range), "foo");

        let emoji = to_range(text, LineEnding::Lf, SourcePosition::new(1, 14, 1, 16)).unwrap();
        assert_eq!(slice(text, emoji), "🎉");
    }

    #[test]
    fn zero_width_range_at_end_of_line() {
        let text = "a\nb";
        let range = to_range(text, LineEnding::Lf, SourcePosition::new(1, 2, 1, 2)).unwrap();
        assert_eq!(range, OffsetRange::new(1, 1));
        assert!(range.is_empty());
    }

    #[test]
    fn line_beyond_document_fails() {
        let err = to_range("a\nb", LineEnding::Lf, SourcePosition::new(3, 1, 3, 2)).unwrap_err();
        assert!(matches!(err, LintError::Position(_)));
    }

    #[test]
    fn start_found_but_end_beyond_document_fails() {
        let err = to_range("a\nb", LineEnding::Lf, SourcePosition::new(1, 1, 9, 1)).unwrap_err();
        assert!(matches!(err, LintError::Position(_)));
    }

    #[test]
    fn zero_based_input_fails() {
        assert!(to_range("a", LineEnding::Lf, SourcePosition::new(0, 1, 1, 1)).is_err());
        assert!(to_range("a", LineEnding::Lf, SourcePosition::new(1, 0, 1, 1)).is_err());
    }

    #[test]
    fn huge_column_fails_instead_of_overflowing() {
        let pos = SourcePosition::new(2, u32::MAX, 2, u32::MAX);
        let err = to_range("a\nb", LineEnding::Lf, pos).unwrap_err();
        assert!(matches!(err, LintError::Position(_)));
    }

    #[test]
    fn reversed_input_fails() {
        assert!(to_range("abc", LineEnding::Lf, SourcePosition::new(1, 3, 1, 1)).is_err());
    }

    #[test]
    fn every_in_bounds_span_round_trips() {
        let text = "ab\r\nc日d\r\n\r\nefg";
        let lines: Vec<&str> = text.split("\r\n").collect();
        for (li, line) in lines.iter().enumerate() {
            let chars: Vec<char> = line.chars().collect();
            for start in 0..=chars.len() {
                for end in start..=chars.len() {
                    let column = chars[..start].iter().map(|c| c.len_utf16()).sum::<usize>() as u32 + 1;
                    let end_column = chars[..end].iter().map(|c| c.len_utf16()).sum::<usize>() as u32 + 1;
                    let line_no = li as u32 + 1;
                    let pos = SourcePosition::new(line_no, column, line_no, end_column);
                    let range = to_range(text, LineEnding::CrLf, pos).unwrap();
                    assert!(range.start <= range.end);
                    let expected: String = chars[start..end].iter().collect();
                    assert_eq!(slice(text, range), expected);
                }
            }
        }
    }

    #[test]
    fn offset_range_predicates() {
        let range = OffsetRange::new(5, 10);
        assert!(range.contains(5));
        assert!(!range.contains(10));
        assert!(range.intersects(&OffsetRange::new(9, 12)));
        assert!(!range.intersects(&OffsetRange::new(10, 12)));
        assert!(!range.intersects(&OffsetRange::new(7, 7)));
    }

    #[test]
    fn utf16_byte_conversions() {
        let text = "a🎉b";
        assert_eq!(utf16_to_byte(text, 0), Some(0));
        assert_eq!(utf16_to_byte(text, 1), Some(1));
        assert_eq!(utf16_to_byte(text, 2), None);
        assert_eq!(utf16_to_byte(text, 3), Some(5));
        assert_eq!(utf16_to_byte(text, 4), Some(6));
        assert_eq!(utf16_to_byte(text, 5), None);

        assert_eq!(byte_to_utf16(text, 5), Some(3));
        assert_eq!(byte_to_utf16(text, 2), None);
    }

    #[test]
    fn line_column_round_trip() {
        let text = "ab\r\nc日d\ne";
        assert_eq!(line_column_of(text, 0), Some((0, 0)));
        assert_eq!(line_column_of(text, 4), Some((1, 0)));
        assert_eq!(line_column_of(text, 6), Some((1, 2)));
        assert_eq!(line_column_of(text, 8), Some((2, 0)));
        assert_eq!(line_column_of(text, 9), Some((2, 1)));
        assert_eq!(line_column_of(text, 10), None);

        for offset in [0, 1, 2, 4, 5, 6, 7, 8, 9] {
            let (line, col) = line_column_of(text, offset).unwrap();
            assert_eq!(offset_of(text, line, col), Some(offset));
        }
    }

    #[test]
    fn offset_of_clamps_column_to_line_end() {
        let text = "ab\ncd";
        assert_eq!(offset_of(text, 0, 99), Some(2));
        assert_eq!(offset_of(text, 1, 1), Some(4));
        assert_eq!(offset_of(text, 5, 0), None);
    }
}
