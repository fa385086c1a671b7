//! Language-dispatched conversion from raw text to canonical phone sequences.
//!
//! All three variants produce the same output shape: a phone sequence plus
//! an optional parallel accent sequence (Japanese only). Callers never
//! branch on language to interpret the result.

pub mod english;
pub mod espeak;
pub mod japanese;
pub mod mandarin;

pub use english::EnglishPhonemizer;
pub use espeak::EspeakG2p;
pub use japanese::JapanesePhonemizer;
pub use mandarin::MandarinPhonemizer;

use crate::error::SynthesisError;

/// Canonical phonemization result.
///
/// `phones` is the ordered phone-token sequence (the silence marker `sp`
/// included); `accents` is the parallel pitch-accent sequence for the
/// Japanese variant and `None` otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhonemeOutput {
    pub phones: Vec<String>,
    pub accents: Option<Vec<String>>,
}

impl PhonemeOutput {
    /// Space-joined phone sequence, the display form of the canonical
    /// representation.
    pub fn phone_string(&self) -> String {
        self.phones.join(" ")
    }
}

/// Grapheme-to-phoneme fallback used by the English variant for tokens
/// missing from the lexicon.
///
/// Implementations may emit whitespace-only phones; the phonemizer filters
/// them out.
pub trait GraphemeToPhoneme {
    fn phones(&self, token: &str) -> Result<Vec<String>, SynthesisError>;
}

/// Full-context linguistic label extraction for the Japanese variant.
pub trait FullContextExtractor {
    fn extract(&self, text: &str) -> Result<Vec<String>, SynthesisError>;
}

/// A phonemizer for one of the supported languages.
pub enum Phonemizer {
    English(EnglishPhonemizer),
    Mandarin(MandarinPhonemizer),
    Japanese(JapanesePhonemizer),
}

impl Phonemizer {
    /// Convert raw text into the canonical phone representation.
    pub fn phonemize(&self, text: &str) -> Result<PhonemeOutput, SynthesisError> {
        let output = match self {
            Phonemizer::English(p) => p.phonemize(text),
            Phonemizer::Mandarin(p) => p.phonemize(text),
            Phonemizer::Japanese(p) => p.phonemize(text),
        }?;
        log::debug!("Phoneme sequence: {}", output.phone_string());
        Ok(output)
    }
}

impl From<EnglishPhonemizer> for Phonemizer {
    fn from(p: EnglishPhonemizer) -> Self {
        Phonemizer::English(p)
    }
}

impl From<MandarinPhonemizer> for Phonemizer {
    fn from(p: MandarinPhonemizer) -> Self {
        Phonemizer::Mandarin(p)
    }
}

impl From<JapanesePhonemizer> for Phonemizer {
    fn from(p: JapanesePhonemizer) -> Self {
        Phonemizer::Japanese(p)
    }
}
