use std::path::Path;

use crate::error::ScanError;
use crate::evidence::EvidenceSink;
use crate::extractor;
use crate::kmp::{self, MatchResult};
use crate::pattern::Pattern;
use crate::reader::BufferedForwardReader;

/// The 22-byte ASCII header that triggers extraction. Case-sensitive,
/// compiled in, not configurable at runtime.
pub const MAGIC: &str = "EID:50CA347E-88EF4066:";

/// Orchestrates one end-to-end scan: KMP search for [`MAGIC`], then
/// identifier extraction over the tail.
///
/// Carries only the immutable [`Pattern`] and its partial-match table, so a
/// single instance can be shared read-only across parallel scans of
/// different files — there is no per-scan mutable state to reset between
/// calls. A fresh [`BufferedForwardReader`] is opened inside
/// [`scan_file`](Self::scan_file) for each file, retaining a margin equal
/// to [`MAGIC`]'s length so a match straddling a buffer refill is still
/// seekable once extraction begins.
#[derive(Debug, Clone)]
pub struct EmbeddedIdentifierScanner {
    pattern: Pattern,
}

impl EmbeddedIdentifierScanner {
    pub fn new() -> Self {
        let pattern =
            Pattern::from_ascii_str(MAGIC).expect("MAGIC is a valid >= 2 byte ASCII pattern");
        Self { pattern }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Open `path`, search for [`MAGIC`], and if found, extract every
    /// identifier in the tail into `sink`. Returns the KMP match result so
    /// callers can distinguish "no header" from "header, no identifiers."
    pub fn scan_file(
        &self,
        path: impl AsRef<Path>,
        sink: &mut dyn EvidenceSink,
    ) -> Result<MatchResult, ScanError> {
        let path = path.as_ref();
        let mut reader = BufferedForwardReader::with_retention(path, self.pattern.len())?;
        let result = kmp::search(&mut reader, &self.pattern).map_err(|err| {
            if let ScanError::Read(source) = &err {
                tracing::warn!(
                    path = %path.display(),
                    error = %source,
                    "I/O error during header search; scan aborted, no evidence emitted"
                );
            }
            err
        })?;
        if let MatchResult::Found(offset) = result {
            extractor::extract(&mut reader, offset, self.pattern.len(), path, sink)?;
        }
        Ok(result)
    }
}

impl Default for EmbeddedIdentifierScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// The boundary a directory-walking engine would use to decide whether a
/// file is worth fully analyzing: does it contain the header at all?
///
/// Resolves the "stateful `lastFile` field" open question (see DESIGN.md):
/// there is no carried state between calls. Each call opens its own
/// reader and releases it on return; running this twice on the same file
/// does two independent scans rather than reusing anything.
pub fn accepts(
    scanner: &EmbeddedIdentifierScanner,
    path: impl AsRef<Path>,
) -> Result<bool, ScanError> {
    let mut reader = BufferedForwardReader::open(path)?;
    let result = kmp::search(&mut reader, scanner.pattern())?;
    Ok(matches!(result, MatchResult::Found(_)))
}
