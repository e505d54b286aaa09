use serde::Serialize;

const LLM_MARKER: &str = "odpověď podložená redmine zdroji (llm)";
const SAFETY_FALLBACK_MARKER: &str = "bezpečnostní fallback";
const LLM_RUNTIME_MARKER: &str = "llm runtime";
const DETERMINISTIC_MARKER: &str = "odpověď podložená redmine zdroji";

/// Which answer-generation path produced the markdown.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisMode {
    Llm,
    Deterministic,
    Fallback,
    Unknown,
}

impl SynthesisMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::Deterministic => "deterministic",
            Self::Fallback => "fallback",
            Self::Unknown => "unknown",
        }
    }
}

pub fn detect_synthesis_mode(markdown: &str) -> SynthesisMode {
    let lowered = markdown.to_lowercase();

    // The LLM marker extends the deterministic one, so it has to win first.
    if lowered.contains(LLM_MARKER) {
        return SynthesisMode::Llm;
    }
    if lowered.contains(SAFETY_FALLBACK_MARKER) || lowered.contains(LLM_RUNTIME_MARKER) {
        return SynthesisMode::Fallback;
    }
    if lowered.contains(DETERMINISTIC_MARKER) {
        return SynthesisMode::Deterministic;
    }
    SynthesisMode::Unknown
}

const INSUFFICIENT_EVIDENCE_MARKERS: [&str; 4] = [
    "nemám dostatek důkazů",
    "nedostatek důkazů",
    "insufficient evidence",
    "not enough evidence",
];

/// True when the answer admits it could not ground a response.
pub fn reports_insufficient_evidence(markdown: &str) -> bool {
    let lowered = markdown.to_lowercase();
    INSUFFICIENT_EVIDENCE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}
