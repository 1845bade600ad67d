//! # Encoding Probe
//!
//! Text-based formats arrive without a declared encoding. An [`EncodingProbe`]
//! tries an ordered list of candidates; each candidate must decode without
//! replacement characters and then satisfy a caller-supplied predicate (a CSV
//! must also parse, plain text only has to decode). The first candidate that
//! passes both wins.

use super::traits::IngestError;
use encoding_rs::{Encoding, SHIFT_JIS, UTF_8, WINDOWS_1252};
use serde::{Deserialize, Serialize};
use tracing::debug;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// One named entry in a probe list.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub label: &'static str,
    pub encoding: &'static Encoding,
}

/// UTF-8 then Shift_JIS. `encoding_rs` decodes Shift_JIS as the Windows-31J
/// (CP932) superset, so vendor extensions such as NEC special characters are
/// covered by the same entry.
pub const STRICT_CANDIDATES: &[Candidate] = &[
    Candidate {
        label: "utf-8",
        encoding: UTF_8,
    },
    Candidate {
        label: "shift_jis",
        encoding: SHIFT_JIS,
    },
];

/// The strict list plus windows-1252, a single-byte encoding that accepts any
/// input. Probing with this list never fails.
pub const PERMISSIVE_CANDIDATES: &[Candidate] = &[
    Candidate {
        label: "utf-8",
        encoding: UTF_8,
    },
    Candidate {
        label: "shift_jis",
        encoding: SHIFT_JIS,
    },
    Candidate {
        label: "windows-1252",
        encoding: WINDOWS_1252,
    },
];

/// Whether plain-text probing ends with the universal single-byte fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncodingPolicy {
    #[default]
    Permissive,
    Strict,
}

impl TextEncodingPolicy {
    pub fn probe(&self) -> EncodingProbe {
        match self {
            TextEncodingPolicy::Permissive => EncodingProbe::new(PERMISSIVE_CANDIDATES),
            TextEncodingPolicy::Strict => EncodingProbe::new(STRICT_CANDIDATES),
        }
    }
}

/// An ordered list of candidate encodings.
#[derive(Debug, Clone)]
pub struct EncodingProbe {
    candidates: &'static [Candidate],
}

impl EncodingProbe {
    pub fn new(candidates: &'static [Candidate]) -> Self {
        Self { candidates }
    }

    /// Returns the first `(value, label)` for which the bytes decode strictly
    /// and `accept` returns `Some`.
    pub fn probe<T>(
        &self,
        bytes: &[u8],
        mut accept: impl FnMut(&str) -> Option<T>,
    ) -> Result<(T, &'static str), IngestError> {
        for candidate in self.candidates {
            let Some(text) = decode_strict(candidate.encoding, bytes) else {
                debug!(encoding = candidate.label, "Candidate failed to decode.");
                continue;
            };
            match accept(&text) {
                Some(value) => return Ok((value, candidate.label)),
                None => debug!(encoding = candidate.label, "Candidate rejected by predicate."),
            }
        }

        let tried = self
            .candidates
            .iter()
            .map(|c| c.label)
            .collect::<Vec<_>>()
            .join(", ");
        Err(IngestError::EncodingUndetermined(tried))
    }
}

/// Decodes without replacement; a leading UTF-8 BOM is dropped for UTF-8.
fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    let bytes = if encoding == UTF_8 {
        bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
    } else {
        bytes
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}
