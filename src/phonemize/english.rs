use crate::error::SynthesisError;
use crate::lexicon::Lexicon;

use super::{GraphemeToPhoneme, PhonemeOutput};

/// The silence marker emitted for punctuation.
pub const SILENCE: &str = "sp";

/// English phonemizer: lexicon-first lookup with a grapheme-to-phoneme
/// fallback for out-of-vocabulary words.
///
/// Token boundaries are `,` `;` `.` `-` `?` `!` and whitespace. Each
/// maximal run of boundary characters that contains at least one
/// punctuation mark collapses to exactly one `sp`; whitespace-only runs
/// produce nothing.
pub struct EnglishPhonemizer {
    lexicon: Lexicon,
    g2p: Box<dyn GraphemeToPhoneme>,
}

impl EnglishPhonemizer {
    pub fn new(lexicon: Lexicon, g2p: Box<dyn GraphemeToPhoneme>) -> Self {
        Self { lexicon, g2p }
    }

    pub fn phonemize(&self, text: &str) -> Result<PhonemeOutput, SynthesisError> {
        let mut phones = Vec::new();

        for token in tokenize(text) {
            match token {
                Token::Word(word) => {
                    if let Some(entry) = self.lexicon.lookup(&word) {
                        phones.extend(entry.iter().cloned());
                    } else {
                        let fallback = self.g2p.phones(&word)?;
                        phones.extend(
                            fallback
                                .into_iter()
                                .filter(|p| !p.trim().is_empty()),
                        );
                    }
                }
                Token::Pause => phones.push(SILENCE.to_string()),
            }
        }

        Ok(PhonemeOutput {
            phones,
            accents: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Pause,
}

fn is_boundary(ch: char) -> bool {
    matches!(ch, ',' | ';' | '.' | '-' | '?' | '!') || ch.is_whitespace()
}

/// Split text into words and pause markers. Consecutive boundary characters
/// form one run; a run yields a single `Pause` iff it contains punctuation.
fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut pending_pause = false;

    for ch in text.chars() {
        if is_boundary(ch) {
            if !word.is_empty() {
                tokens.push(Token::Word(std::mem::take(&mut word)));
            }
            if !ch.is_whitespace() {
                pending_pause = true;
            }
        } else {
            if pending_pause {
                tokens.push(Token::Pause);
                pending_pause = false;
            }
            word.push(ch);
        }
    }

    if !word.is_empty() {
        tokens.push(Token::Word(word));
    }
    if pending_pause {
        tokens.push(Token::Pause);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Spells out each letter as an uppercase pseudo-phone.
    struct SpellingG2p;

    impl GraphemeToPhoneme for SpellingG2p {
        fn phones(&self, token: &str) -> Result<Vec<String>, SynthesisError> {
            Ok(token
                .chars()
                .map(|c| c.to_uppercase().to_string())
                .collect())
        }
    }

    /// Emits phones with whitespace noise to exercise filtering.
    struct NoisyG2p;

    impl GraphemeToPhoneme for NoisyG2p {
        fn phones(&self, _token: &str) -> Result<Vec<String>, SynthesisError> {
            Ok(vec![" ".to_string(), "K".to_string(), String::new()])
        }
    }

    fn lexicon() -> Lexicon {
        Lexicon::from_pairs([
            ("i", vec!["AY1"]),
            ("am", vec!["AE1", "M"]),
            ("hello", vec!["HH", "AH0", "L", "OW1"]),
        ])
    }

    #[test]
    fn splits_words_and_collapses_punctuation_runs() {
        assert_eq!(
            tokenize("Hello, world!?  next"),
            vec![
                Token::Word("Hello".to_string()),
                Token::Pause,
                Token::Word("world".to_string()),
                Token::Pause,
                Token::Word("next".to_string()),
            ]
        );
    }

    #[test]
    fn whitespace_only_runs_produce_no_pause() {
        assert_eq!(
            tokenize("one  two"),
            vec![
                Token::Word("one".to_string()),
                Token::Word("two".to_string()),
            ]
        );
    }

    #[test]
    fn empty_tokens_between_delimiters_produce_nothing() {
        // ",,," is one run: exactly one pause, no empty words.
        assert_eq!(tokenize(",,,"), vec![Token::Pause]);
    }

    #[test]
    fn i_am_yields_trailing_silence() {
        let phonemizer = EnglishPhonemizer::new(lexicon(), Box::new(SpellingG2p));
        let out = phonemizer.phonemize("I am.").unwrap();
        assert_eq!(out.phone_string(), "AY1 AE1 M sp");
        assert!(out.accents.is_none());
    }

    #[test]
    fn lexicon_lookup_is_case_insensitive() {
        let phonemizer = EnglishPhonemizer::new(lexicon(), Box::new(SpellingG2p));
        let out = phonemizer.phonemize("HELLO").unwrap();
        assert_eq!(out.phones, vec!["HH", "AH0", "L", "OW1"]);
    }

    #[test]
    fn g2p_fallback_fires_on_lexicon_miss() {
        let phonemizer = EnglishPhonemizer::new(lexicon(), Box::new(SpellingG2p));
        let out = phonemizer.phonemize("i ok").unwrap();
        assert_eq!(out.phones, vec!["AY1", "O", "K"]);
    }

    #[test]
    fn whitespace_only_g2p_phones_are_discarded() {
        let phonemizer = EnglishPhonemizer::new(lexicon(), Box::new(NoisyG2p));
        let out = phonemizer.phonemize("xyz").unwrap();
        assert_eq!(out.phones, vec!["K"]);
    }

    #[test]
    fn punctuation_runs_never_duplicate_silence() {
        let phonemizer = EnglishPhonemizer::new(lexicon(), Box::new(SpellingG2p));
        let out = phonemizer.phonemize("i -- am ...").unwrap();
        assert_eq!(out.phone_string(), "AY1 sp AE1 M sp");
    }
}
