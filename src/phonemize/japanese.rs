use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SynthesisError;

use super::{FullContextExtractor, PhonemeOutput};

/// Japanese phonemizer: full-context label extraction, parallel
/// phone/accent symbol derivation, then remapping into the target phone
/// alphabet.
///
/// The two derived sequences are index-aligned; a phone dropped by the
/// inventory translation (silence at utterance edges) drops its accent
/// token with it, so the output sequences stay parallel.
pub struct JapanesePhonemizer {
    extractor: Box<dyn FullContextExtractor>,
}

impl JapanesePhonemizer {
    pub fn new(extractor: Box<dyn FullContextExtractor>) -> Self {
        Self { extractor }
    }

    pub fn phonemize(&self, text: &str) -> Result<PhonemeOutput, SynthesisError> {
        let labels = self.extractor.extract(text)?;
        let (raw_phones, raw_accents) = labels_to_symbols(&labels)?;
        debug_assert_eq!(raw_phones.len(), raw_accents.len());

        let mut phones = Vec::with_capacity(raw_phones.len());
        let mut accents = Vec::with_capacity(raw_accents.len());
        for (phone, accent) in raw_phones.into_iter().zip(raw_accents) {
            let translated = translate_phone(&phone);
            if translated.is_empty() {
                continue;
            }
            phones.push(translated);
            accents.push(accent);
        }

        Ok(PhonemeOutput {
            phones,
            accents: Some(accents),
        })
    }
}

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\-(.*?)\+").unwrap());
static ACCENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/A:([0-9\-]+)\+(\d+)\+(\d+)").unwrap());
static F1_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/F:(\d+)_").unwrap());

/// Accent-feature values of one label: position in accent phrase relative
/// to the accent nucleus (a1), mora index from phrase start (a2), mora
/// index from phrase end (a3), and the phrase's mora count (f1).
struct AccentFeatures {
    a1: i32,
    a2: i32,
    a3: i32,
    f1: i32,
}

fn phone_of(label: &str) -> Result<&str, SynthesisError> {
    PHONE_RE
        .captures(label)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| SynthesisError::MalformedLabel(label.to_string()))
}

fn accent_features(label: &str) -> Option<AccentFeatures> {
    let caps = ACCENT_RE.captures(label)?;
    let f1 = F1_RE.captures(label)?;
    Some(AccentFeatures {
        a1: caps.get(1)?.as_str().parse().ok()?,
        a2: caps.get(2)?.as_str().parse().ok()?,
        a3: caps.get(3)?.as_str().parse().ok()?,
        f1: f1.get(1)?.as_str().parse().ok()?,
    })
}

/// Derive parallel phone and accent-boundary sequences from full-context
/// labels. The sequences have equal length by construction: silence and
/// pause labels contribute a phrase-boundary accent token.
pub fn labels_to_symbols(
    labels: &[String],
) -> Result<(Vec<String>, Vec<String>), SynthesisError> {
    let mut phones = Vec::with_capacity(labels.len());
    let mut accents = Vec::with_capacity(labels.len());

    for (n, label) in labels.iter().enumerate() {
        let phone = phone_of(label)?;

        if phone == "sil" || phone == "pau" {
            phones.push(phone.to_string());
            accents.push("#".to_string());
            continue;
        }

        let features = accent_features(label)
            .ok_or_else(|| SynthesisError::MalformedLabel(label.to_string()))?;
        let a2_next = labels
            .get(n + 1)
            .and_then(|next| accent_features(next))
            .map(|f| f.a2)
            .unwrap_or(0);

        let accent = if features.a3 == 1 && a2_next == 1 {
            // Accent-phrase boundary.
            "#"
        } else if features.a1 == 0 && a2_next == features.a2 + 1 && features.a2 != features.f1 {
            // Pitch falling after the accent nucleus.
            "]"
        } else if features.a2 == 1 && a2_next == 2 {
            // Pitch rising at the phrase-initial mora.
            "["
        } else {
            "0"
        };

        phones.push(phone.to_string());
        accents.push(accent.to_string());
    }

    Ok((phones, accents))
}

/// Fixed phone-inventory translation into the target model's alphabet.
///
/// Unvoiced vowels are folded onto their voiced counterparts, the closure
/// phone becomes `q`, pauses become the silence marker, and edge silence
/// maps to the empty string (dropped by the caller).
pub fn translate_phone(phone: &str) -> String {
    match phone {
        "A" | "I" | "U" | "E" | "O" => phone.to_lowercase(),
        "cl" => "q".to_string(),
        "pau" => "sp".to_string(),
        "sil" => String::new(),
        other => other.to_string(),
    }
}

/// [`FullContextExtractor`] backed by the `jpreprocess` text-analysis crate.
#[cfg(feature = "openjtalk")]
pub struct JpreprocessExtractor {
    inner: jpreprocess::JPreprocess<jpreprocess::DefaultFetcher>,
}

#[cfg(feature = "openjtalk")]
impl JpreprocessExtractor {
    /// Build an extractor over the bundled NAIST dictionary.
    pub fn new() -> Result<Self, SynthesisError> {
        use jpreprocess::{
            kind::JPreprocessDictionaryKind, JPreprocess, JPreprocessConfig,
            SystemDictionaryConfig,
        };

        let config = JPreprocessConfig {
            dictionary: SystemDictionaryConfig::Bundled(JPreprocessDictionaryKind::NaistJdic),
            user_dictionary: None,
        };
        let inner = JPreprocess::from_config(config)
            .map_err(|e| SynthesisError::LabelExtraction(e.to_string()))?;
        Ok(Self { inner })
    }
}

#[cfg(feature = "openjtalk")]
impl FullContextExtractor for JpreprocessExtractor {
    fn extract(&self, text: &str) -> Result<Vec<String>, SynthesisError> {
        self.inner
            .extract_fullcontext(text)
            .map_err(|e| SynthesisError::LabelExtraction(e.to_string()))
    }
}
