//! Conversion from canonical phone representations to integer id sequences.

use crate::cleaners::apply_cleaners;
use crate::error::SynthesisError;
use crate::symbols::{AccentTable, SymbolTable};

/// Encodes canonical phone/accent tokens against the fixed vocabularies.
///
/// Two independent paths: the English/Mandarin path consumes a
/// brace-delimited phone string (cleaners apply to text outside braces),
/// while the Japanese path looks phones and accent tokens up directly.
/// A phone or accent token absent from its table aborts the run; see
/// [`SymbolTable::require`].
pub struct SymbolEncoder<'a> {
    table: &'a SymbolTable,
    cleaners: &'a [String],
}

impl<'a> SymbolEncoder<'a> {
    pub fn new(table: &'a SymbolTable, cleaners: &'a [String]) -> Self {
        Self { table, cleaners }
    }

    /// Wrap a phone sequence in the single-brace canonical form consumed by
    /// [`SymbolEncoder::encode_braced`].
    pub fn braced(phones: &[String]) -> String {
        format!("{{{}}}", phones.join(" "))
    }

    /// Encode a phone sequence via the brace-delimited text path.
    pub fn encode_phones(&self, phones: &[String]) -> Result<Vec<i64>, SynthesisError> {
        self.encode_braced(&Self::braced(phones))
    }

    /// Encode mixed text: segments inside `{...}` are whitespace-separated
    /// phones looked up as `@phone` (fatal on miss); segments outside are
    /// run through the configured cleaners, then looked up per character
    /// (unknown characters and padding are skipped — they are stray
    /// punctuation, not phones).
    pub fn encode_braced(&self, text: &str) -> Result<Vec<i64>, SynthesisError> {
        let mut sequence = Vec::new();
        let mut rest = text;

        while !rest.is_empty() {
            let Some(open) = rest.find('{') else {
                self.push_cleaned(rest, &mut sequence)?;
                break;
            };
            let Some(close) = rest[open..].find('}') else {
                // Unterminated brace group: treat the remainder as plain text.
                self.push_cleaned(rest, &mut sequence)?;
                break;
            };

            self.push_cleaned(&rest[..open], &mut sequence)?;
            for phone in rest[open + 1..open + close].split_whitespace() {
                sequence.push(self.table.require(&format!("@{phone}"))?);
            }
            rest = &rest[open + close + 1..];
        }

        Ok(sequence)
    }

    fn push_cleaned(
        &self,
        text: &str,
        sequence: &mut Vec<i64>,
    ) -> Result<(), SynthesisError> {
        if text.is_empty() {
            return Ok(());
        }
        let cleaned = apply_cleaners(text, self.cleaners)?;
        for ch in cleaned.chars() {
            let symbol = ch.to_string();
            if symbol == "_" {
                continue;
            }
            if let Some(id) = self.table.get(&symbol) {
                sequence.push(id);
            }
        }
        Ok(())
    }

    /// Encode the Japanese path: phones already in the target alphabet are
    /// looked up directly, accent tokens against the 4-symbol accent table.
    /// Both lookups are total.
    pub fn encode_japanese(
        &self,
        phones: &[String],
        accents: Option<&[String]>,
    ) -> Result<(Vec<i64>, Option<Vec<i64>>), SynthesisError> {
        let ids = phones
            .iter()
            .map(|p| self.table.require(p))
            .collect::<Result<Vec<_>, _>>()?;

        let accent_ids = accents
            .map(|tokens| {
                tokens
                    .iter()
                    .map(|t| AccentTable::require(t))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok((ids, accent_ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VocabularyKind;

    fn cleaners() -> Vec<String> {
        vec!["english_cleaners".to_string()]
    }

    fn to_strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn encodes_braced_phones_as_arpabet_lookups() {
        let table = SymbolTable::multilingual();
        let names = cleaners();
        let encoder = SymbolEncoder::new(&table, &names);

        let ids = encoder.encode_braced("{AY1 AE1 M sp}").unwrap();
        let expected: Vec<i64> = ["@AY1", "@AE1", "@M", "@sp"]
            .iter()
            .map(|s| table.get(s).unwrap())
            .collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn encode_phones_matches_braced_form() {
        let table = SymbolTable::multilingual();
        let names = cleaners();
        let encoder = SymbolEncoder::new(&table, &names);

        let phones = to_strings(&["n", "i3"]);
        assert_eq!(SymbolEncoder::braced(&phones), "{n i3}");
        assert_eq!(
            encoder.encode_phones(&phones).unwrap(),
            encoder.encode_braced("{n i3}").unwrap()
        );
    }

    #[test]
    fn cleans_text_outside_braces() {
        let table = SymbolTable::multilingual();
        let names = cleaners();
        let encoder = SymbolEncoder::new(&table, &names);

        let ids = encoder.encode_braced("OK {AY1}").unwrap();
        let expected: Vec<i64> = [
            table.get("o").unwrap(),
            table.get("k").unwrap(),
            table.get(" ").unwrap(),
            table.get("@AY1").unwrap(),
        ]
        .to_vec();
        assert_eq!(ids, expected);
    }

    #[test]
    fn phone_miss_inside_braces_is_fatal() {
        let table = SymbolTable::multilingual();
        let names = cleaners();
        let encoder = SymbolEncoder::new(&table, &names);

        let err = encoder.encode_braced("{QX9}").unwrap_err();
        assert!(matches!(
            err,
            SynthesisError::VocabularyMiss {
                kind: VocabularyKind::Phone,
                ..
            }
        ));
    }

    #[test]
    fn japanese_path_is_total_over_both_tables() {
        let table = SymbolTable::multilingual();
        let names = cleaners();
        let encoder = SymbolEncoder::new(&table, &names);

        let phones = to_strings(&["k", "o", "N", "n", "i", "ch", "i", "w", "a"]);
        let accents = to_strings(&["0", "[", "0", "0", "0", "0", "]", "0", "#"]);
        let (ids, accent_ids) = encoder
            .encode_japanese(&phones, Some(&accents))
            .unwrap();
        assert_eq!(ids.len(), phones.len());
        assert_eq!(accent_ids.unwrap(), vec![0, 1, 0, 0, 0, 0, 2, 0, 3]);

        let err = encoder
            .encode_japanese(&to_strings(&["zz9"]), None)
            .unwrap_err();
        assert!(matches!(err, SynthesisError::VocabularyMiss { .. }));
    }

    #[test]
    fn encoding_is_deterministic() {
        let table = SymbolTable::multilingual();
        let names = cleaners();
        let encoder = SymbolEncoder::new(&table, &names);

        let first = encoder.encode_braced("{HH AH0 L OW1} again").unwrap();
        let second = encoder.encode_braced("{HH AH0 L OW1} again").unwrap();
        assert_eq!(first, second);
    }
}
