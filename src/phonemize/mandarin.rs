use pinyin::ToPinyin;

use crate::error::SynthesisError;
use crate::lexicon::Lexicon;

use super::english::SILENCE;
use super::PhonemeOutput;

/// Mandarin phonemizer: character-level pinyin conversion followed by
/// syllable lookup.
///
/// Syllables use tone-number style with the neutral tone always written as
/// tone 5, matching the lexicon's key convention. A syllable missing from
/// the lexicon yields the silence marker; there is no secondary fallback.
pub struct MandarinPhonemizer {
    lexicon: Lexicon,
}

impl MandarinPhonemizer {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn phonemize(&self, text: &str) -> Result<PhonemeOutput, SynthesisError> {
        let mut phones = Vec::new();

        for syllable in tone3_syllables(text) {
            if let Some(entry) = self.lexicon.lookup(&syllable) {
                phones.extend(entry.iter().cloned());
            } else {
                phones.push(SILENCE.to_string());
            }
        }

        Ok(PhonemeOutput {
            phones,
            accents: None,
        })
    }
}

/// Convert text into tone-numbered pinyin syllables, one per Han character.
///
/// Neutral-tone syllables get an explicit `5` appended so they are never
/// left toneless. Non-Han characters pass through as their own "syllable"
/// (whitespace excepted), which then misses the lexicon and becomes `sp`.
fn tone3_syllables(text: &str) -> Vec<String> {
    let mut syllables = Vec::new();

    for (ch, converted) in text.chars().zip(text.to_pinyin()) {
        match converted {
            Some(p) => {
                let mut syllable = p.with_tone_num_end().to_string();
                if !syllable.ends_with(|c: char| c.is_ascii_digit()) {
                    syllable.push('5');
                }
                syllables.push(syllable);
            }
            None if ch.is_whitespace() => {}
            None => syllables.push(ch.to_string()),
        }
    }

    syllables
}
