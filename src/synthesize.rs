//! Inference orchestration over a finite sequence of batches.
//!
//! The orchestrator owns nothing heavyweight: the acoustic model, vocoder,
//! and output configuration live in an explicit [`SynthesisContext`]
//! constructed at startup and passed in by reference. Processing is
//! strictly sequential; the first error aborts the run and artifacts
//! already written stay on disk.

use std::path::{Path, PathBuf};

use crate::batch::BatchTuple;
use crate::config::ControlValues;
use crate::error::SynthesisError;
use crate::SynthesisResult;

/// A mel spectrogram produced by the acoustic model, row-major
/// `[frames, bins]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MelSpectrogram {
    pub frames: usize,
    pub bins: usize,
    pub data: Vec<f32>,
}

impl MelSpectrogram {
    pub fn new(frames: usize, bins: usize, data: Vec<f32>) -> Result<Self, SynthesisError> {
        if data.len() != frames * bins {
            return Err(SynthesisError::Model(format!(
                "mel data length {} does not match {frames}x{bins}",
                data.len()
            )));
        }
        Ok(Self { frames, bins, data })
    }

    pub fn frame(&self, index: usize) -> &[f32] {
        &self.data[index * self.bins..(index + 1) * self.bins]
    }
}

/// Model-facing view of one batch: every batch field except the `ids` and
/// `raw_texts` metadata, plus the prosody controls and the optional
/// conditioning streams.
pub struct ModelInputs<'a> {
    pub speaker_ids: &'a [i64],
    pub text_ids: &'a [Vec<i64>],
    pub text_lengths: &'a [usize],
    pub max_length: usize,
    pub controls: ControlValues,
    pub accents: Option<&'a [Vec<i64>]>,
    pub fp_tags: Option<&'a [Vec<i64>]>,
}

/// The pretrained acoustic model, consumed at its interface boundary.
pub trait AcousticModel {
    /// Move tensor-shaped batch elements onto the compute device. Element
    /// order must be preserved. The default is the identity, for models
    /// that compute wherever the data already lives.
    fn place_on_device(&self, batch: BatchTuple) -> Result<BatchTuple, SynthesisError> {
        Ok(batch)
    }

    /// Run the forward pass, producing one mel spectrogram per utterance.
    fn forward(&self, inputs: ModelInputs<'_>) -> Result<Vec<MelSpectrogram>, SynthesisError>;
}

/// The vocoder turning mel spectrograms into waveforms.
pub trait Vocoder {
    fn infer(&self, mel: &MelSpectrogram) -> Result<Vec<f32>, SynthesisError>;

    fn sample_rate(&self) -> u32;
}

/// Collaborators for a synthesis run, constructed once at startup.
pub struct SynthesisContext<'a> {
    pub model: &'a dyn AcousticModel,
    pub vocoder: &'a dyn Vocoder,
    pub output_dir: PathBuf,
}

impl<'a> SynthesisContext<'a> {
    pub fn new(
        model: &'a dyn AcousticModel,
        vocoder: &'a dyn Vocoder,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            model,
            vocoder,
            output_dir: output_dir.into(),
        }
    }
}

/// Counts reported after a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub batches: usize,
    pub utterances: usize,
}

/// Drives batches through device placement, tail stripping, model
/// invocation, and rendering, in order, one batch at a time.
pub struct InferenceOrchestrator {
    use_accent: bool,
    use_fp_tag: bool,
    controls: ControlValues,
}

impl InferenceOrchestrator {
    pub fn new(use_accent: bool, use_fp_tag: bool, controls: ControlValues) -> Self {
        Self {
            use_accent,
            use_fp_tag,
            controls,
        }
    }

    /// Consume the batch sequence to completion, or abort on the first
    /// error. No retries, no skip-and-continue: a failure mid-sequence
    /// leaves earlier batches' artifacts on disk and processes nothing
    /// further.
    pub fn run(
        &self,
        ctx: &SynthesisContext<'_>,
        batches: impl IntoIterator<Item = BatchTuple>,
    ) -> Result<RunSummary, SynthesisError> {
        let data_dir = ctx.output_dir.join("data");
        std::fs::create_dir_all(&data_dir)?;

        let mut summary = RunSummary::default();

        for tuple in batches {
            let tuple = ctx.model.place_on_device(tuple)?;
            let batch = tuple.decode(self.use_accent, self.use_fp_tag)?;

            let inputs = ModelInputs {
                speaker_ids: &batch.speaker_ids,
                text_ids: &batch.text_ids,
                text_lengths: &batch.text_lengths,
                max_length: batch.max_length,
                controls: self.controls,
                accents: batch.accents.as_deref(),
                fp_tags: batch.fp_tags.as_deref(),
            };
            let mels = ctx.model.forward(inputs)?;

            if mels.len() != batch.len() {
                return Err(SynthesisError::Model(format!(
                    "model produced {} outputs for {} utterances",
                    mels.len(),
                    batch.len()
                )));
            }

            for (id, mel) in batch.ids.iter().zip(&mels) {
                render_utterance(ctx, id, mel, &data_dir)?;
            }

            summary.batches += 1;
            summary.utterances += batch.len();
            log::debug!(
                "Synthesized batch {} ({} utterances)",
                summary.batches,
                batch.len()
            );
        }

        log::info!(
            "Run complete: {} batches, {} utterances",
            summary.batches,
            summary.utterances
        );
        Ok(summary)
    }
}

fn render_utterance(
    ctx: &SynthesisContext<'_>,
    id: &str,
    mel: &MelSpectrogram,
    data_dir: &Path,
) -> Result<(), SynthesisError> {
    let samples = ctx.vocoder.infer(mel)?;
    let result = SynthesisResult {
        samples,
        sample_rate: ctx.vocoder.sample_rate(),
    };
    let path = data_dir.join(format!("{id}.wav"));
    result.write_wav(&path)?;
    log::debug!(
        "Wrote {} ({:.2}s)",
        path.display(),
        result.duration_secs()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{ControlledBatchBuilder, Utterance};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Emits one constant-valued frame per input symbol.
    struct StubModel {
        calls: AtomicUsize,
    }

    impl StubModel {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl AcousticModel for StubModel {
        fn forward(
            &self,
            inputs: ModelInputs<'_>,
        ) -> Result<Vec<MelSpectrogram>, SynthesisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            inputs
                .text_ids
                .iter()
                .map(|ids| MelSpectrogram::new(ids.len(), 2, vec![0.5; ids.len() * 2]))
                .collect()
        }
    }

    /// Fails on every forward pass.
    struct FailingModel;

    impl AcousticModel for FailingModel {
        fn forward(
            &self,
            _inputs: ModelInputs<'_>,
        ) -> Result<Vec<MelSpectrogram>, SynthesisError> {
            Err(SynthesisError::Model("checkpoint mismatch".to_string()))
        }
    }

    struct StubVocoder;

    impl Vocoder for StubVocoder {
        fn infer(&self, mel: &MelSpectrogram) -> Result<Vec<f32>, SynthesisError> {
            Ok(vec![0.0; mel.frames * 4])
        }

        fn sample_rate(&self) -> u32 {
            22050
        }
    }

    fn batch(id: &str, len: usize) -> BatchTuple {
        let mut builder = ControlledBatchBuilder::new(false, false);
        builder.push(Utterance {
            id: id.to_string(),
            raw_text: "test".to_string(),
            speaker_id: 0,
            text_ids: (0..len as i64).collect(),
            accent_ids: None,
            fp_tag: None,
        });
        builder.build().unwrap().into_tuple()
    }

    #[test]
    fn processes_all_batches_and_writes_artifacts() {
        let dir = std::env::temp_dir().join(format!(
            "polyglot-tts-test-{}-{}",
            std::process::id(),
            line!()
        ));
        let model = StubModel::new();
        let ctx = SynthesisContext::new(&model, &StubVocoder, &dir);
        let orchestrator =
            InferenceOrchestrator::new(false, false, ControlValues::default());

        let summary = orchestrator
            .run(&ctx, vec![batch("a", 3), batch("b", 5)])
            .unwrap();

        assert_eq!(summary, RunSummary { batches: 2, utterances: 2 });
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
        assert!(dir.join("data").join("a.wav").exists());
        assert!(dir.join("data").join("b.wav").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn first_failure_aborts_without_processing_further_batches() {
        let dir = std::env::temp_dir().join(format!(
            "polyglot-tts-test-{}-{}",
            std::process::id(),
            line!()
        ));
        let ctx = SynthesisContext::new(&FailingModel, &StubVocoder, &dir);
        let orchestrator =
            InferenceOrchestrator::new(false, false, ControlValues::default());

        let err = orchestrator
            .run(&ctx, vec![batch("a", 3), batch("b", 5)])
            .unwrap_err();
        assert!(matches!(err, SynthesisError::Model(_)));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn flag_mismatch_surfaces_before_invocation() {
        let dir = std::env::temp_dir().join(format!(
            "polyglot-tts-test-{}-{}",
            std::process::id(),
            line!()
        ));
        let model = StubModel::new();
        let ctx = SynthesisContext::new(&model, &StubVocoder, &dir);
        // Orchestrator expects an accent stream the producer never added.
        let orchestrator =
            InferenceOrchestrator::new(true, false, ControlValues::default());

        let err = orchestrator.run(&ctx, vec![batch("a", 3)]).unwrap_err();
        assert!(matches!(err, SynthesisError::BatchShape { .. }));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        std::fs::remove_dir_all(&dir).ok();
    }
}
