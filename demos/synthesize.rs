use std::time::Instant;

use polyglot_tts::{
    AcousticModel, ControlValues, ControlledBatchBuilder, EnglishPhonemizer,
    GraphemeToPhoneme, InferenceOrchestrator, Lexicon, MelSpectrogram, ModelInputs,
    SymbolTable, SynthesisContext, SynthesisError, TextFrontend, Vocoder,
};

/// Toy G2P that spells out-of-vocabulary words letter by letter.
struct SpellingG2p;

impl GraphemeToPhoneme for SpellingG2p {
    fn phones(&self, token: &str) -> Result<Vec<String>, SynthesisError> {
        Ok(token.chars().map(|c| c.to_uppercase().to_string()).collect())
    }
}

/// Toy acoustic model: a handful of constant frames per input symbol.
struct ToyModel;

impl AcousticModel for ToyModel {
    fn forward(&self, inputs: ModelInputs<'_>) -> Result<Vec<MelSpectrogram>, SynthesisError> {
        inputs
            .text_ids
            .iter()
            .map(|ids| {
                let frames = ids.len() * 8;
                MelSpectrogram::new(frames, 80, vec![0.1; frames * 80])
            })
            .collect()
    }
}

/// Toy vocoder: a 220 Hz tone, one hop of samples per mel frame.
struct ToyVocoder;

impl Vocoder for ToyVocoder {
    fn infer(&self, mel: &MelSpectrogram) -> Result<Vec<f32>, SynthesisError> {
        let samples = mel.frames * 256;
        Ok((0..samples)
            .map(|i| (i as f32 * 220.0 * std::f32::consts::TAU / 22050.0).sin() * 0.3)
            .collect())
    }

    fn sample_rate(&self) -> u32 {
        22050
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let lexicon = Lexicon::from_pairs([
        ("hello", vec!["HH", "AH0", "L", "OW1"]),
        ("world", vec!["W", "ER1", "L", "D"]),
        ("i", vec!["AY1"]),
        ("am", vec!["AE1", "M"]),
    ]);

    let frontend = TextFrontend::new(
        EnglishPhonemizer::new(lexicon, Box::new(SpellingG2p)),
        SymbolTable::multilingual(),
        vec!["english_cleaners".to_string()],
    );

    let texts = ["Hello, world!", "I am."];
    let mut builder = ControlledBatchBuilder::new(false, false);
    for (index, text) in texts.iter().enumerate() {
        let utterance = frontend.prepare(format!("utt-{index}"), text, 0)?;
        println!(
            "{text:?} -> {} symbols: {:?}",
            utterance.text_ids.len(),
            utterance.text_ids
        );
        builder.push(utterance);
    }
    let batch = builder.build()?.into_tuple();

    let model = ToyModel;
    let vocoder = ToyVocoder;
    let ctx = SynthesisContext::new(&model, &vocoder, "output");
    let orchestrator = InferenceOrchestrator::new(false, false, ControlValues::default());

    let start = Instant::now();
    let summary = orchestrator.run(&ctx, vec![batch])?;
    println!(
        "Synthesized {} utterances in {:.2?}; see output/data/",
        summary.utterances,
        start.elapsed()
    );

    Ok(())
}
