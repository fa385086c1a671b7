//! # polyglot-tts
//!
//! Multilingual (English, Mandarin, Japanese) text front-end and inference
//! orchestration for a FastSpeech2-style speech synthesizer.
//!
//! The crate turns raw text into fixed-vocabulary integer symbol sequences,
//! assembles per-utterance batches carrying optional conditioning streams
//! (pitch-accent labels, filled-pause tags) and scalar prosody controls,
//! and drives them through pluggable acoustic-model and vocoder
//! collaborators.
//!
//! ## Pipeline
//!
//! raw text → [`Phonemizer`] → canonical phone sequence → [`SymbolEncoder`]
//! → integer sequence → [`ControlledBatchBuilder`] → batch tuple →
//! [`InferenceOrchestrator`] → model/vocoder.
//!
//! ## Quick Start
//!
//! ```no_run
//! use polyglot_tts::{
//!     ControlledBatchBuilder, ControlValues, EnglishPhonemizer, EspeakG2p,
//!     InferenceOrchestrator, Lexicon, SymbolTable, SynthesisContext, TextFrontend,
//! };
//! # fn model() -> impl polyglot_tts::AcousticModel { struct M; impl polyglot_tts::AcousticModel for M { fn forward(&self, _: polyglot_tts::ModelInputs<'_>) -> Result<Vec<polyglot_tts::MelSpectrogram>, polyglot_tts::SynthesisError> { unimplemented!() } } M }
//! # fn vocoder() -> impl polyglot_tts::Vocoder { struct V; impl polyglot_tts::Vocoder for V { fn infer(&self, _: &polyglot_tts::MelSpectrogram) -> Result<Vec<f32>, polyglot_tts::SynthesisError> { unimplemented!() } fn sample_rate(&self) -> u32 { 22050 } } V }
//!
//! let lexicon = Lexicon::load(std::path::Path::new("assets/librispeech-lexicon.txt"))?;
//! let frontend = TextFrontend::new(
//!     EnglishPhonemizer::new(lexicon, Box::new(EspeakG2p::new("en-us"))),
//!     SymbolTable::multilingual(),
//!     vec!["english_cleaners".to_string()],
//! );
//!
//! let utterance = frontend.prepare("utt-0", "Hello, world!", 0)?;
//! let mut builder = ControlledBatchBuilder::new(false, false);
//! builder.push(utterance);
//! let batch = builder.build()?.into_tuple();
//!
//! let model = model();
//! let vocoder = vocoder();
//! let ctx = SynthesisContext::new(&model, &vocoder, "output");
//! let orchestrator = InferenceOrchestrator::new(false, false, ControlValues::default());
//! orchestrator.run(&ctx, vec![batch])?;
//! # Ok::<(), polyglot_tts::SynthesisError>(())
//! ```

pub mod batch;
pub mod cleaners;
pub mod config;
pub mod encoder;
pub mod error;
pub mod frontend;
pub mod lexicon;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod phonemize;
pub mod symbols;
pub mod synthesize;

pub use batch::{Batch, BatchElement, BatchTuple, ControlledBatchBuilder, Utterance};
pub use config::{ControlValues, ControlValuesBuilder, Language, SynthesisConfig};
pub use encoder::SymbolEncoder;
pub use error::{SynthesisError, VocabularyKind};
pub use frontend::TextFrontend;
pub use lexicon::Lexicon;
pub use phonemize::{
    EnglishPhonemizer, EspeakG2p, FullContextExtractor, GraphemeToPhoneme,
    JapanesePhonemizer, MandarinPhonemizer, PhonemeOutput, Phonemizer,
};
pub use symbols::{AccentTable, SymbolTable};
pub use synthesize::{
    AcousticModel, InferenceOrchestrator, MelSpectrogram, ModelInputs, RunSummary,
    SynthesisContext, Vocoder,
};

use std::path::Path;

/// The result of synthesizing one utterance.
///
/// Contains raw f32 audio samples and the sample rate of the output audio.
#[derive(Debug)]
pub struct SynthesisResult {
    /// Raw audio samples as f32 values
    pub samples: Vec<f32>,
    /// Sample rate of the audio
    pub sample_rate: u32,
}

impl SynthesisResult {
    /// Write the audio to a 32-bit float WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), SynthesisError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}
