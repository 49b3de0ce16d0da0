//! Embedded product identifier scanner.
//!
//! Streams a file forward exactly once, locates the fixed ASCII header
//! `EID:50CA347E-88EF4066:` with a Knuth–Morris–Pratt search, and — if
//! found — extracts every printable-ASCII run that follows it, parsing the
//! recognized key–value and CPE 2.3 identifier forms into vendor/product/
//! version [`Evidence`].
//!
//! The pieces are independently usable:
//!
//! * [`pattern`] — builds a [`pattern::Pattern`] and its KMP partial-match
//!   table.
//! * [`reader`] — [`reader::BufferedForwardReader`], a monotonic buffered
//!   cursor over a [`std::fs::File`].
//! * [`kmp`] — [`kmp::search`], locating the first occurrence of a pattern.
//! * [`extractor`] — [`extractor::extract`], walking the tail after a match
//!   into [`Evidence`].
//!
//! Most callers just want [`scanner::EmbeddedIdentifierScanner`], which
//! wires the three together for the common "scan one file end to end" case.
//!
//! ## Example
//! ```
//! use eid_scanner::{EmbeddedIdentifierScanner, VecSink};
//!
//! # fn main() -> Result<(), eid_scanner::ScanError> {
//! let scanner = EmbeddedIdentifierScanner::new();
//! let mut sink = VecSink::new();
//! // scanner.scan_file("path/to/file", &mut sink)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod evidence;
pub mod extractor;
pub mod kmp;
pub mod pattern;
pub mod reader;
pub mod scanner;

pub use error::ScanError;
pub use evidence::{Confidence, Evidence, EvidenceKind, EvidenceSink, VecSink};
pub use kmp::MatchResult;
pub use pattern::Pattern;
pub use reader::{BufferedForwardReader, Byte};
pub use scanner::{EmbeddedIdentifierScanner, MAGIC};
