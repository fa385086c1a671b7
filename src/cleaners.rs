//! Named text-cleaning transforms applied before symbol lookup.
//!
//! Cleaners are selected by name in the configuration and run in the
//! configured order over text outside brace-delimited phone groups.
//! `basic_cleaners` suits already-transliterated input, `english_cleaners`
//! adds abbreviation expansion for raw English text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SynthesisError;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Abbreviations expanded by `english_cleaners`, matched case-insensitively
/// as `{abbr}.` on a word boundary.
static ABBREVIATIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        ("mrs", "misess"),
        ("mr", "mister"),
        ("dr", "doctor"),
        ("st", "saint"),
        ("co", "company"),
        ("jr", "junior"),
        ("maj", "major"),
        ("gen", "general"),
        ("drs", "doctors"),
        ("rev", "reverend"),
        ("lt", "lieutenant"),
        ("hon", "honorable"),
        ("sgt", "sergeant"),
        ("capt", "captain"),
        ("esq", "esquire"),
        ("ltd", "limited"),
        ("col", "colonel"),
        ("ft", "fort"),
    ]
    .into_iter()
    .map(|(abbr, expansion)| {
        (
            Regex::new(&format!(r"(?i)\b{abbr}\.")).unwrap(),
            expansion,
        )
    })
    .collect()
});

/// Apply the named cleaners to `text` in order.
///
/// Unknown names are a configuration error; silently skipping one would
/// desynchronize the preprocessing from the model's training-time text
/// pipeline.
pub fn apply_cleaners(text: &str, names: &[String]) -> Result<String, SynthesisError> {
    let mut text = text.to_string();
    for name in names {
        text = match name.as_str() {
            "basic_cleaners" => collapse_whitespace(&lowercase(&text)),
            "transliteration_cleaners" => {
                collapse_whitespace(&lowercase(&transliterate(&text)))
            }
            "english_cleaners" => {
                collapse_whitespace(&expand_abbreviations(&lowercase(&transliterate(&text))))
            }
            other => return Err(SynthesisError::UnknownCleaner(other.to_string())),
        };
    }
    Ok(text)
}

fn lowercase(text: &str) -> String {
    text.to_lowercase()
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").into_owned()
}

fn expand_abbreviations(text: &str) -> String {
    let mut text = text.to_string();
    for (re, expansion) in ABBREVIATIONS.iter() {
        text = re.replace_all(&text, *expansion).into_owned();
    }
    text
}

/// Fold common accented Latin characters to ASCII and drop anything still
/// outside the ASCII range afterwards.
fn transliterate(text: &str) -> String {
    text.chars()
        .filter_map(|ch| match ch {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => Some('a'),
            'è' | 'é' | 'ê' | 'ë' => Some('e'),
            'ì' | 'í' | 'î' | 'ï' => Some('i'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' => Some('o'),
            'ù' | 'ú' | 'û' | 'ü' => Some('u'),
            'ý' | 'ÿ' => Some('y'),
            'ñ' => Some('n'),
            'ç' => Some('c'),
            'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => Some('A'),
            'È' | 'É' | 'Ê' | 'Ë' => Some('E'),
            'Ì' | 'Í' | 'Î' | 'Ï' => Some('I'),
            'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => Some('O'),
            'Ù' | 'Ú' | 'Û' | 'Ü' => Some('U'),
            'Ñ' => Some('N'),
            'Ç' => Some('C'),
            c if c.is_ascii() => Some(c),
            _ => None,
        })
        .collect()
}
