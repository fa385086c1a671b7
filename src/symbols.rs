use std::collections::HashMap;
use std::path::Path;

use crate::error::{SynthesisError, VocabularyKind};

/// Bijective mapping between phone-symbol strings and integer ids.
///
/// Fixed at load time and read-only for the process duration. The inventory
/// must match the vocabulary the target model was trained with; see
/// [`SymbolTable::require`] for the miss policy.
pub struct SymbolTable {
    ids: HashMap<String, i64>,
    symbols: Vec<String>,
}

/// ARPAbet vowels carry an optional stress digit (none, 0, 1, 2).
const ARPABET_VOWELS: &[&str] = &[
    "AA", "AE", "AH", "AO", "AW", "AY", "EH", "ER", "EY", "IH", "IY", "OW", "OY", "UH", "UW",
];

const ARPABET_CONSONANTS: &[&str] = &[
    "B", "CH", "D", "DH", "F", "G", "HH", "JH", "K", "L", "M", "N", "NG", "P", "R", "S", "SH",
    "T", "TH", "V", "W", "Y", "Z", "ZH",
];

const PINYIN_INITIALS: &[&str] = &[
    "b", "c", "ch", "d", "f", "g", "h", "j", "k", "l", "m", "n", "p", "q", "r", "s", "sh", "t",
    "w", "x", "y", "z", "zh",
];

/// Pinyin finals; every final appears with tone numbers 1–5 (5 = neutral).
const PINYIN_FINALS: &[&str] = &[
    "a", "ai", "an", "ang", "ao", "e", "ei", "en", "eng", "er", "i", "ia", "ian", "iang", "iao",
    "ie", "ii", "iii", "in", "ing", "iong", "iou", "o", "ong", "ou", "u", "ua", "uai", "uan",
    "uang", "uei", "uen", "ueng", "uo", "v", "van", "ve", "vn",
];

/// Julius-style Japanese phones that are not already covered by the
/// single-letter entries.
const JAPANESE_PHONES: &[&str] = &[
    "ky", "gy", "kw", "gw", "sh", "ch", "ts", "ny", "hy", "my", "ry", "py", "by", "dy", "ty",
    "sp", "sil", "spn",
];

impl SymbolTable {
    /// The hardcoded multilingual inventory: pad, special, punctuation,
    /// ASCII letters, `@`-prefixed ARPAbet and pinyin phones, silences, and
    /// the Japanese phone set.
    ///
    /// Prefer [`SymbolTable::from_json`] when the model ships its own
    /// vocabulary file; this inventory matches the reference checkpoints.
    pub fn multilingual() -> Self {
        let mut builder = TableBuilder::default();

        builder.push("_");
        builder.push("-");
        for ch in "!'(),.:;? ".chars() {
            builder.push(&ch.to_string());
        }
        for ch in ('A'..='Z').chain('a'..='z') {
            builder.push(&ch.to_string());
        }
        for vowel in ARPABET_VOWELS {
            for stress in ["", "0", "1", "2"] {
                builder.push(&format!("@{vowel}{stress}"));
            }
        }
        for consonant in ARPABET_CONSONANTS {
            builder.push(&format!("@{consonant}"));
        }
        for initial in PINYIN_INITIALS {
            builder.push(&format!("@{initial}"));
        }
        for final_ in PINYIN_FINALS {
            for tone in 1..=5 {
                builder.push(&format!("@{final_}{tone}"));
            }
        }
        for silence in ["@sp", "@spn", "@sil"] {
            builder.push(silence);
        }
        for phone in JAPANESE_PHONES {
            builder.push(phone);
        }

        builder.finish()
    }

    /// Load a symbol inventory from a JSON file with a `"symbols"` array.
    ///
    /// Order in the array defines the ids. Duplicate symbols keep their
    /// first position.
    pub fn from_json(path: &Path) -> Result<Self, SynthesisError> {
        let content = std::fs::read_to_string(path)?;
        let json: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| SynthesisError::Config(format!("Failed to parse JSON: {e}")))?;

        let list = json
            .get("symbols")
            .ok_or_else(|| SynthesisError::Config("Missing 'symbols' field".to_string()))?
            .as_array()
            .ok_or_else(|| SynthesisError::Config("'symbols' must be an array".to_string()))?;

        let mut builder = TableBuilder::default();
        for value in list {
            let symbol = value.as_str().ok_or_else(|| {
                SynthesisError::Config(format!("Non-string symbol entry: {value}"))
            })?;
            builder.push(symbol);
        }

        let table = builder.finish();
        log::info!(
            "Loaded {} symbols from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn get(&self, symbol: &str) -> Option<i64> {
        self.ids.get(symbol).copied()
    }

    /// Total lookup: a miss is a fatal vocabulary mismatch, not a condition
    /// the pipeline can recover from.
    pub fn require(&self, symbol: &str) -> Result<i64, SynthesisError> {
        self.get(symbol).ok_or_else(|| SynthesisError::VocabularyMiss {
            kind: VocabularyKind::Phone,
            token: symbol.to_string(),
        })
    }

    pub fn symbol(&self, id: i64) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.symbols.get(i))
            .map(String::as_str)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.ids.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[derive(Default)]
struct TableBuilder {
    ids: HashMap<String, i64>,
    symbols: Vec<String>,
}

impl TableBuilder {
    fn push(&mut self, symbol: &str) {
        if self.ids.contains_key(symbol) {
            return;
        }
        self.ids.insert(symbol.to_string(), self.symbols.len() as i64);
        self.symbols.push(symbol.to_string());
    }

    fn finish(self) -> SymbolTable {
        SymbolTable {
            ids: self.ids,
            symbols: self.symbols,
        }
    }
}

/// The fixed 4-symbol pitch-accent alphabet for Japanese prosody.
///
/// `0` = no event, `[` = pitch rise, `]` = pitch fall, `#` = accent-phrase
/// boundary.
pub struct AccentTable;

impl AccentTable {
    pub fn get(token: &str) -> Option<i64> {
        match token {
            "0" => Some(0),
            "[" => Some(1),
            "]" => Some(2),
            "#" => Some(3),
            _ => None,
        }
    }

    /// Total lookup over the 4-symbol alphabet; anything else is a fatal
    /// asset mismatch.
    pub fn require(token: &str) -> Result<i64, SynthesisError> {
        Self::get(token).ok_or_else(|| SynthesisError::VocabularyMiss {
            kind: VocabularyKind::Accent,
            token: token.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_bijective() {
        let table = SymbolTable::multilingual();
        for id in 0..table.len() as i64 {
            let symbol = table.symbol(id).expect("every id maps to a symbol");
            assert_eq!(table.get(symbol), Some(id));
        }
    }

    #[test]
    fn pad_is_id_zero() {
        let table = SymbolTable::multilingual();
        assert_eq!(table.get("_"), Some(0));
    }

    #[test]
    fn covers_arpabet_stress_variants() {
        let table = SymbolTable::multilingual();
        for symbol in ["@AY1", "@AE1", "@M", "@AH0", "@ZH"] {
            assert!(table.contains(symbol), "{symbol} missing");
        }
    }

    #[test]
    fn covers_pinyin_tones_one_through_five() {
        let table = SymbolTable::multilingual();
        for tone in 1..=5 {
            assert!(table.contains(&format!("@i{tone}")));
            assert!(table.contains(&format!("@uang{tone}")));
        }
        assert!(table.contains("@zh"));
    }

    #[test]
    fn covers_japanese_phones_and_silences() {
        let table = SymbolTable::multilingual();
        for symbol in ["a", "k", "sh", "ch", "N", "q", "sp", "@sp"] {
            assert!(table.contains(symbol), "{symbol} missing");
        }
    }

    #[test]
    fn require_miss_is_a_vocabulary_error() {
        let table = SymbolTable::multilingual();
        let err = table.require("@NOPE").unwrap_err();
        assert!(matches!(
            err,
            SynthesisError::VocabularyMiss {
                kind: VocabularyKind::Phone,
                ..
            }
        ));
    }

    #[test]
    fn accent_table_maps_the_four_symbols_in_order() {
        assert_eq!(AccentTable::get("0"), Some(0));
        assert_eq!(AccentTable::get("["), Some(1));
        assert_eq!(AccentTable::get("]"), Some(2));
        assert_eq!(AccentTable::get("#"), Some(3));
        assert!(AccentTable::require("^").is_err());
    }
}
