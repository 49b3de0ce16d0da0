use std::path::Path;

use crate::error::ScanError;
use crate::evidence::{Confidence, Evidence, EvidenceKind, EvidenceSink};
use crate::reader::{BufferedForwardReader, Byte};
use crate::scanner::MAGIC;

const KEY_VALUE_SOURCE_TAG: &str = "Embedded ID";
const CPE_SOURCE_TAG: &str = "Embedded CPE";
const CPE_PREFIX: &str = "cpe:2.3:a:";
const MAX_KEY_VALUE_FIELDS: usize = 3;

/// Walk `reader` forward from `match_offset`, cut the tail into maximal
/// printable-ASCII runs, and emit every recognized identifier as evidence.
///
/// `pattern_len` is the minimum run length to consider a candidate (the
/// length of the MAGIC pattern that was matched). `source_path` is used
/// only for the warning logged if an I/O fault interrupts extraction —
/// evidence already pushed to `sink` before the fault is retained.
pub fn extract(
    reader: &mut BufferedForwardReader,
    match_offset: u64,
    pattern_len: usize,
    source_path: &Path,
    sink: &mut dyn EvidenceSink,
) -> Result<(), ScanError> {
    reader.seek(match_offset)?;

    let mut run: Vec<u8> = Vec::new();
    loop {
        let byte = match reader.next_byte() {
            Ok(byte) => byte,
            Err(ScanError::Read(source)) => {
                tracing::warn!(
                    path = %source_path.display(),
                    error = %source,
                    "I/O error while extracting embedded identifier; evidence emitted so far is retained"
                );
                flush_run(&run, pattern_len, sink);
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        match byte {
            Byte::Value(b) if (0x20..=0x7e).contains(&b) => run.push(b),
            Byte::Value(_) => {
                flush_run(&run, pattern_len, sink);
                run.clear();
            }
            Byte::Eof => {
                flush_run(&run, pattern_len, sink);
                return Ok(());
            }
        }
    }
}

fn flush_run(run: &[u8], pattern_len: usize, sink: &mut dyn EvidenceSink) {
    if run.len() < pattern_len {
        return;
    }
    // The run is built entirely from bytes in 0x20..=0x7e, so it is always
    // valid (single-byte) UTF-8.
    let candidate = std::str::from_utf8(run).expect("printable ASCII run is valid UTF-8");
    parse_key_value(candidate, sink);
    parse_cpe(candidate, sink);
}

/// `EID:...:(vendor|product|version)=<v1>;(?:...=<v2>;(?:...=<v3>;)?)?`
fn parse_key_value(candidate: &str, sink: &mut dyn EvidenceSink) {
    let Some(mut rest) = strip_prefix_ci(candidate, MAGIC) else {
        return;
    };

    let mut pairs = Vec::with_capacity(MAX_KEY_VALUE_FIELDS);
    while pairs.len() < MAX_KEY_VALUE_FIELDS {
        match parse_one_pair(rest) {
            Some((kind, value, consumed)) => {
                pairs.push((kind, value));
                rest = &rest[consumed..];
            }
            None => break,
        }
    }

    for (kind, value) in pairs {
        sink.emit(Evidence::new(
            kind,
            KEY_VALUE_SOURCE_TAG,
            field_name(kind),
            value,
            Confidence::Highest,
        ));
    }
}

/// Parse one `name=value;` group at the start of `s`, returning the
/// recognized field, its value, and how many bytes of `s` it consumed.
fn parse_one_pair(s: &str) -> Option<(EvidenceKind, String, usize)> {
    let eq = s.find('=')?;
    let kind = match_field_name(&s[..eq])?;
    let after_eq = &s[eq + 1..];
    let semi = after_eq.find(';')?;
    let value = after_eq[..semi].to_string();
    Some((kind, value, eq + 1 + semi + 1))
}

fn match_field_name(s: &str) -> Option<EvidenceKind> {
    if s.eq_ignore_ascii_case("vendor") {
        Some(EvidenceKind::Vendor)
    } else if s.eq_ignore_ascii_case("product") {
        Some(EvidenceKind::Product)
    } else if s.eq_ignore_ascii_case("version") {
        Some(EvidenceKind::Version)
    } else {
        None
    }
}

fn field_name(kind: EvidenceKind) -> &'static str {
    match kind {
        EvidenceKind::Vendor => "vendor",
        EvidenceKind::Product => "product",
        EvidenceKind::Version => "version",
    }
}

/// `EID:...:cpe:2.3:a:<vendor>:<product>:<version>:<u>:<e>:<l>:<sw>:<tsw>:<thw>:<o>`
fn parse_cpe(candidate: &str, sink: &mut dyn EvidenceSink) {
    let Some(rest) = strip_prefix_ci(candidate, MAGIC) else {
        return;
    };
    let Some(fields) = strip_prefix_ci(rest, CPE_PREFIX) else {
        return;
    };

    let parts: Vec<&str> = fields.splitn(9, ':').collect();
    if parts.len() != 9 {
        return;
    }

    let vendor = substitute_underscores(parts[0]);
    let product = substitute_underscores(parts[1]);
    let version = substitute_underscores(parts[2]);

    sink.emit(Evidence::new(
        EvidenceKind::Vendor,
        CPE_SOURCE_TAG,
        "vendor",
        vendor,
        Confidence::Highest,
    ));
    sink.emit(Evidence::new(
        EvidenceKind::Product,
        CPE_SOURCE_TAG,
        "product",
        product,
        Confidence::Highest,
    ));
    sink.emit(Evidence::new(
        EvidenceKind::Version,
        CPE_SOURCE_TAG,
        "version",
        version,
        Confidence::Highest,
    ));
}

fn substitute_underscores(s: &str) -> String {
    s.replace('_', " ")
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() < prefix.len() {
        return None;
    }
    if s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes()) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::VecSink;
    use std::io::Write;

    fn reader_over(bytes: &[u8]) -> (tempfile::NamedTempFile, BufferedForwardReader) {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        let r = BufferedForwardReader::open(f.path()).unwrap();
        (f, r)
    }

    #[test]
    fn key_value_identifier_emits_three_records() {
        let body = format!("{MAGIC}vendor=V;product=P;version=X;");
        let (_f, mut r) = reader_over(body.as_bytes());
        let mut sink = VecSink::new();
        extract(&mut r, 0, MAGIC.len(), Path::new("test"), &mut sink).unwrap();

        assert_eq!(sink.evidence.len(), 3);
        assert_eq!(sink.evidence[0].kind, EvidenceKind::Vendor);
        assert_eq!(sink.evidence[0].value, "V");
        assert_eq!(sink.evidence[0].source_tag, "Embedded ID");
        assert_eq!(sink.evidence[0].confidence, Confidence::Highest);
        assert_eq!(sink.evidence[1].value, "P");
        assert_eq!(sink.evidence[2].value, "X");
    }

    #[test]
    fn reversed_field_order_yields_same_set() {
        let body = format!("{MAGIC}version=X;vendor=V;product=P;");
        let (_f, mut r) = reader_over(body.as_bytes());
        let mut sink = VecSink::new();
        extract(&mut r, 0, MAGIC.len(), Path::new("test"), &mut sink).unwrap();

        let mut found: Vec<(EvidenceKind, String)> = sink
            .evidence
            .into_iter()
            .map(|e| (e.kind, e.value))
            .collect();
        found.sort_by_key(|(k, _)| format!("{k:?}"));
        assert_eq!(
            found,
            vec![
                (EvidenceKind::Product, "P".to_string()),
                (EvidenceKind::Vendor, "V".to_string()),
                (EvidenceKind::Version, "X".to_string()),
            ]
        );
    }

    #[test]
    fn trailing_unknown_field_is_ignored() {
        let body = format!("{MAGIC}vendor=V;product=P;version=X;license=Q;");
        let (_f, mut r) = reader_over(body.as_bytes());
        let mut sink = VecSink::new();
        extract(&mut r, 0, MAGIC.len(), Path::new("test"), &mut sink).unwrap();
        assert_eq!(sink.evidence.len(), 3);
    }

    #[test]
    fn cpe_form_substitutes_underscores() {
        let body = format!(
            "{MAGIC}cpe:2.3:a:Institute_for_Defense_Analyses:ID_Embedding_Tests:0.2:*:*:*:*:*:*"
        );
        let (_f, mut r) = reader_over(body.as_bytes());
        let mut sink = VecSink::new();
        extract(&mut r, 0, MAGIC.len(), Path::new("test"), &mut sink).unwrap();

        assert_eq!(sink.evidence.len(), 3);
        assert_eq!(sink.evidence[0].value, "Institute for Defense Analyses");
        assert_eq!(sink.evidence[1].value, "ID Embedding Tests");
        assert_eq!(sink.evidence[2].value, "0.2");
        assert!(sink.evidence.iter().all(|e| e.source_tag == "Embedded CPE"));
    }

    #[test]
    fn header_with_no_fields_yields_no_evidence() {
        let body = MAGIC.to_string();
        let (_f, mut r) = reader_over(body.as_bytes());
        let mut sink = VecSink::new();
        extract(&mut r, 0, MAGIC.len(), Path::new("test"), &mut sink).unwrap();
        assert!(sink.evidence.is_empty());
    }

    #[test]
    fn two_headers_both_emit_evidence() {
        let body = format!(
            "{MAGIC}vendor=V1;product=P1;version=X1;\0\0{MAGIC}vendor=V2;product=P2;version=X2;"
        );
        let (_f, mut r) = reader_over(body.as_bytes());
        let mut sink = VecSink::new();
        extract(&mut r, 0, MAGIC.len(), Path::new("test"), &mut sink).unwrap();
        assert_eq!(sink.evidence.len(), 6);
        assert_eq!(sink.evidence[0].value, "V1");
        assert_eq!(sink.evidence[3].value, "V2");
    }
}
