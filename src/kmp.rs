use crate::error::ScanError;
use crate::pattern::Pattern;
use crate::reader::{BufferedForwardReader, Byte};

/// Outcome of a KMP search: either the pattern was not present, or it was
/// found starting at the given byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    Found(u64),
    NotFound,
}

impl MatchResult {
    pub fn offset(self) -> Option<u64> {
        match self {
            MatchResult::Found(offset) => Some(offset),
            MatchResult::NotFound => None,
        }
    }
}

/// Search `reader`'s byte stream for the first occurrence of `pattern`,
/// in Θ(n + m) comparisons.
///
/// The sequence of offsets probed on `reader` (`match_offset +
/// pattern_index` at each step) is strictly non-decreasing, which is
/// exactly what [`BufferedForwardReader`]'s monotonicity contract permits.
pub fn search(
    reader: &mut BufferedForwardReader,
    pattern: &Pattern,
) -> Result<MatchResult, ScanError> {
    let m = pattern.len();
    if m < 2 {
        return Err(ScanError::invalid_usage("pattern must have length >= 2"));
    }
    let table = pattern.table();
    if table.len() != m {
        return Err(ScanError::invalid_usage(
            "pattern and partial-match table lengths differ",
        ));
    }
    let bytes = pattern.bytes();

    let mut match_offset: u64 = 0;
    let mut pattern_index: i64 = 0;

    loop {
        let probe = match_offset + pattern_index as u64;
        let c = match reader.byte_at(probe)? {
            Byte::Eof => return Ok(MatchResult::NotFound),
            Byte::Value(b) => b,
        };

        if bytes[pattern_index as usize] == c {
            if pattern_index as usize == m - 1 {
                return Ok(MatchResult::Found(match_offset));
            }
            pattern_index += 1;
        } else {
            let fallback = table[pattern_index as usize];
            if fallback > -1 {
                match_offset += (pattern_index - fallback) as u64;
                pattern_index = fallback;
            } else {
                pattern_index = 0;
                match_offset += 1;
            }
        }
    }
}
