use std::collections::HashMap;
use std::path::Path;

use crate::error::SynthesisError;

/// Word/syllable → phone-sequence lookup table.
///
/// Loaded once at startup and read-only afterwards. Keys are stored
/// lowercased and looked up case-insensitively.
pub struct Lexicon {
    entries: HashMap<String, Vec<String>>,
}

impl Lexicon {
    /// Load a lexicon from a line-oriented text file.
    ///
    /// Each line is whitespace-separated: the first field is the key, the
    /// remaining fields are its phone tokens. The first occurrence of a key
    /// wins; later duplicates are ignored. A line with a key but no phones
    /// is kept as a degenerate entry with an empty phone list. Blank lines
    /// are skipped.
    pub fn load(path: &Path) -> Result<Self, SynthesisError> {
        let content = std::fs::read_to_string(path).map_err(|e| SynthesisError::Lexicon {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let lexicon = Self::parse(&content);
        log::info!(
            "Loaded {} lexicon entries from {}",
            lexicon.len(),
            path.display()
        );
        Ok(lexicon)
    }

    fn parse(content: &str) -> Self {
        let mut entries = HashMap::new();
        for line in content.lines() {
            let mut fields = line.split_whitespace();
            let Some(key) = fields.next() else {
                continue;
            };
            let key = key.to_lowercase();
            entries
                .entry(key)
                .or_insert_with(|| fields.map(str::to_string).collect());
        }
        Self { entries }
    }

    /// Build a lexicon from in-memory pairs, first-seen entry winning.
    pub fn from_pairs<K, P>(pairs: impl IntoIterator<Item = (K, Vec<P>)>) -> Self
    where
        K: AsRef<str>,
        P: Into<String>,
    {
        let mut entries = HashMap::new();
        for (key, phones) in pairs {
            entries
                .entry(key.as_ref().to_lowercase())
                .or_insert_with(|| phones.into_iter().map(Into::into).collect());
        }
        Self { entries }
    }

    /// Case-insensitive lookup. Returns `None` for absent keys; the caller
    /// decides the fallback.
    pub fn lookup(&self, key: &str) -> Option<&[String]> {
        self.entries.get(&key.to_lowercase()).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lines_and_lowercases_keys() {
        let lex = Lexicon::parse("HELLO HH AH0 L OW1\nworld W ER1 L D\n");
        assert_eq!(
            lex.lookup("hello").unwrap(),
            &["HH", "AH0", "L", "OW1"][..]
        );
        assert_eq!(lex.lookup("World").unwrap(), &["W", "ER1", "L", "D"][..]);
        assert!(lex.lookup("missing").is_none());
    }

    #[test]
    fn first_seen_entry_wins() {
        let lex = Lexicon::parse("read R IY1 D\nREAD R EH1 D\n");
        assert_eq!(lex.lookup("read").unwrap(), &["R", "IY1", "D"][..]);
    }

    #[test]
    fn keeps_degenerate_entries_with_empty_phones() {
        let lex = Lexicon::parse("orphan\nword W ER1 D\n");
        assert_eq!(lex.lookup("orphan").unwrap(), &[] as &[String]);
    }

    #[test]
    fn skips_blank_lines() {
        let lex = Lexicon::parse("\n\na AH0\n\n");
        assert_eq!(lex.len(), 1);
    }

    #[test]
    fn lookup_is_case_insensitive_both_ways() {
        let lex = Lexicon::from_pairs([("MiXeD", vec!["M", "IH1"])]);
        assert_eq!(lex.lookup("mixed").unwrap(), &["M", "IH1"][..]);
        assert_eq!(lex.lookup("MIXED").unwrap(), &["M", "IH1"][..]);
    }
}
