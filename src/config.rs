use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SynthesisError;

/// Closed set of supported input languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "zh")]
    Mandarin,
    #[serde(rename = "ja")]
    Japanese,
}

impl FromStr for Language {
    type Err = SynthesisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Language::English),
            "zh" => Ok(Language::Mandarin),
            "ja" => Ok(Language::Japanese),
            other => Err(SynthesisError::Config(format!(
                "unknown language {other:?}, expected one of \"en\", \"zh\", \"ja\""
            ))),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::English => write!(f, "en"),
            Language::Mandarin => write!(f, "zh"),
            Language::Japanese => write!(f, "ja"),
        }
    }
}

/// Scalar prosody controls passed through to the acoustic model unmodified.
///
/// Each value is a multiplier with a neutral default of 1.0; their semantics
/// are owned by the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
pub struct ControlValues {
    /// Larger value for higher pitch.
    #[serde(default = "neutral")]
    #[builder(default = "1.0")]
    pub pitch: f32,
    /// Larger value for larger volume.
    #[serde(default = "neutral")]
    #[builder(default = "1.0")]
    pub energy: f32,
    /// Larger value for slower speaking rate.
    #[serde(default = "neutral")]
    #[builder(default = "1.0")]
    pub duration: f32,
}

fn neutral() -> f32 {
    1.0
}

impl Default for ControlValues {
    fn default() -> Self {
        Self {
            pitch: 1.0,
            energy: 1.0,
            duration: 1.0,
        }
    }
}

fn default_cleaners() -> Vec<String> {
    vec!["english_cleaners".to_string()]
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// Configuration surface for a synthesis run, loaded once at startup and
/// read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Input language, selects the phonemization strategy.
    pub language: Language,
    /// Path to the word/syllable → phone-sequence lexicon file.
    pub lexicon_path: PathBuf,
    /// Named text-cleaning transforms, applied in order (en/zh path only).
    #[serde(default = "default_cleaners")]
    pub text_cleaners: Vec<String>,
    /// Whether batches carry a pitch-accent conditioning stream.
    #[serde(default)]
    pub use_accent: bool,
    /// Whether batches carry a filled-pause conditioning stream.
    #[serde(default)]
    pub use_fp_tag: bool,
    /// Speaker id for multi-speaker synthesis.
    #[serde(default)]
    pub speaker_id: i64,
    /// Prosody control scalars.
    #[serde(default)]
    pub controls: ControlValues,
    /// Directory synthesis artifacts are written into.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl SynthesisConfig {
    /// Load a configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SynthesisError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| SynthesisError::Config(format!("{}: {e}", path.display())))
    }

    /// Write the effective configuration into `dir` as `synthesize.json`,
    /// so the artifacts in a result directory are reproducible.
    pub fn dump(&self, dir: &Path) -> Result<(), SynthesisError> {
        std::fs::create_dir_all(dir)?;
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SynthesisError::Config(e.to_string()))?;
        std::fs::write(dir.join("synthesize.json"), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_values_default_to_neutral() {
        let c = ControlValues::default();
        assert_eq!((c.pitch, c.energy, c.duration), (1.0, 1.0, 1.0));
    }

    #[test]
    fn control_values_builder_fills_unset_fields() {
        let c = ControlValuesBuilder::default()
            .pitch(1.2)
            .build()
            .expect("builder should succeed");
        assert_eq!(c.pitch, 1.2);
        assert_eq!(c.energy, 1.0);
        assert_eq!(c.duration, 1.0);
    }

    #[test]
    fn parses_minimal_config_with_defaults() {
        let cfg: SynthesisConfig = serde_json::from_str(
            r#"{"language": "zh", "lexicon_path": "assets/pinyin-lexicon.txt"}"#,
        )
        .unwrap();
        assert_eq!(cfg.language, Language::Mandarin);
        assert!(!cfg.use_accent);
        assert!(!cfg.use_fp_tag);
        assert_eq!(cfg.speaker_id, 0);
        assert_eq!(cfg.controls, ControlValues::default());
        assert_eq!(cfg.text_cleaners, vec!["english_cleaners".to_string()]);
    }

    #[test]
    fn rejects_unknown_language() {
        assert!("ko".parse::<Language>().is_err());
        assert_eq!("ja".parse::<Language>().unwrap(), Language::Japanese);
    }
}
