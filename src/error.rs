use std::fmt;

/// Errors raised while building a [`crate::pattern::Pattern`], stepping a
/// [`crate::reader::BufferedForwardReader`], or running a scan.
///
/// [`ScanError::InvalidUsage`] is a programmer error: a non-monotonic read
/// offset, a pattern shorter than two bytes, a non-ASCII pattern byte, or a
/// mismatched pattern/table length. Callers should not swallow it. Absence
/// of the embedded-identifier header in a file is not an error at all — see
/// [`crate::kmp::MatchResult::NotFound`].
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("invalid usage: {0}")]
    InvalidUsage(String),

    #[error("read error: {0}")]
    Read(#[from] std::io::Error),
}

impl ScanError {
    pub(crate) fn invalid_usage(msg: impl fmt::Display) -> Self {
        Self::InvalidUsage(msg.to_string())
    }
}
