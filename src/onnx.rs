//! ONNX-backed acoustic model and vocoder adapters.
//!
//! Both adapters expect models exported with dynamic batch/length axes.
//! The acoustic model consumes `speakers`, `texts`, `text_lens`, `max_len`,
//! the three control scalars, and (when exported with conditioning)
//! `accents` / `fp_tag`; its first output is a mel tensor of shape
//! `[batch, frames, bins]`. The vocoder consumes `mel` of shape
//! `[1, frames, bins]` and produces a waveform.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ndarray::{Array1, Array2, Array3};
use ort::execution_providers::CPUExecutionProvider;
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;

use crate::error::SynthesisError;
use crate::synthesize::{AcousticModel, MelSpectrogram, ModelInputs, Vocoder};

/// Options shared by both ONNX adapters.
#[derive(Debug, Clone, Default)]
pub struct OnnxSessionParams {
    /// Number of CPU threads for inference. `None` uses the ORT default.
    pub num_threads: Option<usize>,
    /// Path for caching the Level3-optimized graph. First load optimizes
    /// and serialises; later loads read the pre-built graph directly.
    pub optimized_cache_path: Option<PathBuf>,
}

pub struct OnnxAcousticModel {
    session: Mutex<Session>,
}

impl OnnxAcousticModel {
    /// Load the acoustic model from a directory containing an `.onnx` file.
    pub fn load(model_dir: &Path, params: &OnnxSessionParams) -> Result<Self, SynthesisError> {
        let onnx_path = find_onnx_file(model_dir)?;
        log::info!("Loading acoustic model from {}", onnx_path.display());
        let session = init_session(&onnx_path, params)?;
        Ok(Self {
            session: Mutex::new(session),
        })
    }

    fn run_forward(
        &self,
        inputs: &ModelInputs<'_>,
    ) -> Result<Array3<f32>, SynthesisError> {
        let batch = inputs.speaker_ids.len();
        let speakers = Array1::from_vec(inputs.speaker_ids.to_vec());
        let texts = pad_to_matrix(inputs.text_ids, inputs.max_length);
        let text_lens =
            Array1::from_vec(inputs.text_lengths.iter().map(|&l| l as i64).collect());
        let max_len = Array1::from_vec(vec![inputs.max_length as i64]);
        let pitch = Array1::from_vec(vec![inputs.controls.pitch]);
        let energy = Array1::from_vec(vec![inputs.controls.energy]);
        let duration = Array1::from_vec(vec![inputs.controls.duration]);
        let accents = inputs
            .accents
            .map(|streams| pad_to_matrix(streams, inputs.max_length));
        let fp_tags = inputs
            .fp_tags
            .map(|streams| pad_to_matrix(streams, inputs.max_length));

        let mut session = self
            .session
            .lock()
            .map_err(|_| SynthesisError::Model("session lock poisoned".to_string()))?;

        // The exported graph either has both conditioning inputs, one, or
        // neither; feed exactly the streams the batch carries.
        let outputs = match (&accents, &fp_tags) {
            (Some(accents), Some(fp_tags)) => session.run(inputs![
                "speakers" => TensorRef::from_array_view(speakers.view())?,
                "texts" => TensorRef::from_array_view(texts.view())?,
                "text_lens" => TensorRef::from_array_view(text_lens.view())?,
                "max_len" => TensorRef::from_array_view(max_len.view())?,
                "pitch_control" => TensorRef::from_array_view(pitch.view())?,
                "energy_control" => TensorRef::from_array_view(energy.view())?,
                "duration_control" => TensorRef::from_array_view(duration.view())?,
                "accents" => TensorRef::from_array_view(accents.view())?,
                "fp_tag" => TensorRef::from_array_view(fp_tags.view())?,
            ])?,
            (Some(accents), None) => session.run(inputs![
                "speakers" => TensorRef::from_array_view(speakers.view())?,
                "texts" => TensorRef::from_array_view(texts.view())?,
                "text_lens" => TensorRef::from_array_view(text_lens.view())?,
                "max_len" => TensorRef::from_array_view(max_len.view())?,
                "pitch_control" => TensorRef::from_array_view(pitch.view())?,
                "energy_control" => TensorRef::from_array_view(energy.view())?,
                "duration_control" => TensorRef::from_array_view(duration.view())?,
                "accents" => TensorRef::from_array_view(accents.view())?,
            ])?,
            (None, Some(fp_tags)) => session.run(inputs![
                "speakers" => TensorRef::from_array_view(speakers.view())?,
                "texts" => TensorRef::from_array_view(texts.view())?,
                "text_lens" => TensorRef::from_array_view(text_lens.view())?,
                "max_len" => TensorRef::from_array_view(max_len.view())?,
                "pitch_control" => TensorRef::from_array_view(pitch.view())?,
                "energy_control" => TensorRef::from_array_view(energy.view())?,
                "duration_control" => TensorRef::from_array_view(duration.view())?,
                "fp_tag" => TensorRef::from_array_view(fp_tags.view())?,
            ])?,
            (None, None) => session.run(inputs![
                "speakers" => TensorRef::from_array_view(speakers.view())?,
                "texts" => TensorRef::from_array_view(texts.view())?,
                "text_lens" => TensorRef::from_array_view(text_lens.view())?,
                "max_len" => TensorRef::from_array_view(max_len.view())?,
                "pitch_control" => TensorRef::from_array_view(pitch.view())?,
                "energy_control" => TensorRef::from_array_view(energy.view())?,
                "duration_control" => TensorRef::from_array_view(duration.view())?,
            ])?,
        };

        let first = outputs
            .iter()
            .next()
            .ok_or_else(|| SynthesisError::Model("no output from model".to_string()))?;
        let mel = first.1.try_extract_array::<f32>()?;
        let mel = mel
            .into_dimensionality::<ndarray::Ix3>()
            .map_err(SynthesisError::Shape)?
            .to_owned();

        if mel.shape()[0] != batch {
            return Err(SynthesisError::Model(format!(
                "mel batch dimension {} does not match input batch {batch}",
                mel.shape()[0]
            )));
        }
        Ok(mel)
    }
}

impl AcousticModel for OnnxAcousticModel {
    fn forward(
        &self,
        inputs: ModelInputs<'_>,
    ) -> Result<Vec<MelSpectrogram>, SynthesisError> {
        let mel = self.run_forward(&inputs)?;
        let (frames, bins) = (mel.shape()[1], mel.shape()[2]);

        mel.outer_iter()
            .map(|utterance| {
                MelSpectrogram::new(
                    frames,
                    bins,
                    utterance.iter().copied().collect(),
                )
            })
            .collect()
    }
}

pub struct OnnxVocoder {
    session: Mutex<Session>,
    sample_rate: u32,
}

impl OnnxVocoder {
    pub fn load(
        model_dir: &Path,
        sample_rate: u32,
        params: &OnnxSessionParams,
    ) -> Result<Self, SynthesisError> {
        let onnx_path = find_onnx_file(model_dir)?;
        log::info!("Loading vocoder from {}", onnx_path.display());
        let session = init_session(&onnx_path, params)?;
        Ok(Self {
            session: Mutex::new(session),
            sample_rate,
        })
    }
}

impl Vocoder for OnnxVocoder {
    fn infer(&self, mel: &MelSpectrogram) -> Result<Vec<f32>, SynthesisError> {
        let tensor = Array3::from_shape_vec((1, mel.frames, mel.bins), mel.data.clone())?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| SynthesisError::Vocoder("session lock poisoned".to_string()))?;
        let outputs = session.run(inputs![
            "mel" => TensorRef::from_array_view(tensor.view())?,
        ])?;

        let first = outputs
            .iter()
            .next()
            .ok_or_else(|| SynthesisError::Vocoder("no output from vocoder".to_string()))?;
        let waveform = first.1.try_extract_array::<f32>()?;
        Ok(waveform.iter().copied().collect())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Right-pad each id sequence with the pad id (0) to `max_len` and stack
/// into a `[batch, max_len]` matrix.
fn pad_to_matrix(sequences: &[Vec<i64>], max_len: usize) -> Array2<i64> {
    let mut matrix = Array2::zeros((sequences.len(), max_len));
    for (row, sequence) in sequences.iter().enumerate() {
        for (col, &id) in sequence.iter().take(max_len).enumerate() {
            matrix[(row, col)] = id;
        }
    }
    matrix
}

/// Find the ONNX model file in the given directory, or accept a direct
/// `.onnx` path.
fn find_onnx_file(model_dir: &Path) -> Result<PathBuf, SynthesisError> {
    if model_dir.extension().and_then(|e| e.to_str()) == Some("onnx") {
        return Ok(model_dir.to_path_buf());
    }

    for entry in std::fs::read_dir(model_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("onnx") {
            log::info!("Using ONNX file: {}", path.display());
            return Ok(path);
        }
    }

    Err(SynthesisError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("No .onnx file found in {}", model_dir.display()),
    )))
}

/// Initialize an ONNX session with optional on-disk graph caching.
///
/// The first load runs Level3 graph optimization and serialises the result
/// to the cache path; subsequent loads read the pre-optimized file at
/// `Disable` optimization level, cutting cold-start time.
fn init_session(
    onnx_path: &Path,
    params: &OnnxSessionParams,
) -> Result<Session, SynthesisError> {
    let providers = vec![CPUExecutionProvider::default().build()];

    let (load_path, opt_level, write_cache) = match params.optimized_cache_path.as_deref() {
        Some(cache) if cache.exists() => {
            log::info!("Loading pre-optimized graph from {}", cache.display());
            (cache, GraphOptimizationLevel::Disable, false)
        }
        Some(cache) => {
            log::info!(
                "First load: running Level3 optimization; saving graph to {}",
                cache.display()
            );
            (onnx_path, GraphOptimizationLevel::Level3, true)
        }
        None => (onnx_path, GraphOptimizationLevel::Level3, false),
    };

    let mut builder = Session::builder()?
        .with_optimization_level(opt_level)?
        .with_execution_providers(providers)?
        .with_parallel_execution(true)?;

    if write_cache {
        let cache = params.optimized_cache_path.as_deref().unwrap();
        builder = builder.with_optimized_model_path(cache)?;
    }

    if let Some(threads) = params.num_threads {
        builder = builder
            .with_intra_threads(threads)?
            .with_inter_threads(threads)?;
    }

    Ok(builder.commit_from_file(load_path)?)
}
