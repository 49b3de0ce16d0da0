/// What a piece of [`Evidence`] is evidence of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceKind {
    Vendor,
    Product,
    Version,
}

/// How much weight a consumer should give an [`Evidence`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    Lowest,
    Low,
    Medium,
    High,
    Highest,
}

/// A single typed fact surfaced by the identifier extractor: a kind, the
/// parser that produced it, the field it came from, its value, and a
/// confidence level. Evidence never carries enough context to stand alone
/// — it flows to a sink owned by the surrounding analyzer pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    pub kind: EvidenceKind,
    pub source_tag: String,
    pub field_name: String,
    pub value: String,
    pub confidence: Confidence,
}

impl Evidence {
    pub fn new(
        kind: EvidenceKind,
        source_tag: impl Into<String>,
        field_name: impl Into<String>,
        value: impl Into<String>,
        confidence: Confidence,
    ) -> Self {
        Self {
            kind,
            source_tag: source_tag.into(),
            field_name: field_name.into(),
            value: value.into(),
            confidence,
        }
    }
}

/// The boundary to the surrounding pipeline: anything that can accept
/// evidence as it is produced. The identifier extractor never inspects or
/// stores evidence itself; it only ever pushes to a sink.
pub trait EvidenceSink {
    fn emit(&mut self, evidence: Evidence);
}

/// Convenience sink that simply collects everything emitted, for callers
/// that just want the full list rather than streaming consumption.
#[derive(Debug, Default, Clone)]
pub struct VecSink {
    pub evidence: Vec<Evidence>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_vec(self) -> Vec<Evidence> {
        self.evidence
    }
}

impl EvidenceSink for VecSink {
    fn emit(&mut self, evidence: Evidence) {
        self.evidence.push(evidence);
    }
}

impl<F: FnMut(Evidence)> EvidenceSink for F {
    fn emit(&mut self, evidence: Evidence) {
        self(evidence)
    }
}
