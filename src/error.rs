use std::path::PathBuf;

/// Which symbol table a failed lookup was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabularyKind {
    /// The phone symbol table.
    Phone,
    /// The 4-entry pitch-accent table.
    Accent,
}

impl std::fmt::Display for VocabularyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VocabularyKind::Phone => write!(f, "phone"),
            VocabularyKind::Accent => write!(f, "accent"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SynthesisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Failed to read lexicon at {path}: {reason}")]
    Lexicon { path: PathBuf, reason: String },
    /// A token was not found in its symbol table. This signals a mismatch
    /// between the preprocessing assets and the target model's vocabulary
    /// and must abort the run; substituting a default id would corrupt the
    /// conditioning sequence fed to the model.
    #[error("{kind} symbol {token:?} is not in the vocabulary; preprocessing assets do not match the model")]
    VocabularyMiss {
        kind: VocabularyKind,
        token: String,
    },
    #[error("Unknown text cleaner: {0:?}")]
    UnknownCleaner(String),
    #[error(
        "Batch has {actual} elements but the configured flags require {expected}; \
         producer and consumer disagree on use_accent/use_fp_tag"
    )]
    BatchShape { expected: usize, actual: usize },
    #[error("Malformed full-context label: {0:?}")]
    MalformedLabel(String),
    #[error(
        "espeak-ng not found. Install: Linux: `sudo apt-get install espeak-ng`, \
         macOS: `brew install espeak-ng`, Windows: https://espeak-ng.org/download"
    )]
    EspeakNotFound,
    #[error("Grapheme-to-phoneme conversion failed: {0}")]
    G2pFailed(String),
    #[error("Full-context label extraction failed: {0}")]
    LabelExtraction(String),
    #[error("Acoustic model error: {0}")]
    Model(String),
    #[error("Vocoder error: {0}")]
    Vocoder(String),
    #[error("Render error: {0}")]
    Render(String),
    #[error("WAV write error: {0}")]
    Wav(#[from] hound::Error),
    #[cfg(feature = "onnx")]
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[cfg(feature = "onnx")]
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}
