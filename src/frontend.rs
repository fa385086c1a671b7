//! Text front-end: raw text in, encoded [`Utterance`] out.

use crate::batch::Utterance;
use crate::encoder::SymbolEncoder;
use crate::error::SynthesisError;
use crate::phonemize::Phonemizer;
use crate::symbols::SymbolTable;

/// Couples a language's phonemizer with the symbol vocabularies and the
/// configured cleaning pipeline.
///
/// Built once at startup; all state is read-only afterwards.
pub struct TextFrontend {
    phonemizer: Phonemizer,
    table: SymbolTable,
    cleaners: Vec<String>,
}

impl TextFrontend {
    pub fn new(
        phonemizer: impl Into<Phonemizer>,
        table: SymbolTable,
        cleaners: Vec<String>,
    ) -> Self {
        Self {
            phonemizer: phonemizer.into(),
            table,
            cleaners,
        }
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.table
    }

    /// Phonemize and encode one utterance.
    ///
    /// Phonemizer output with an accent sequence takes the direct total
    /// encoding path; output without one goes through the brace-delimited
    /// text-cleaning path. The caller never branches on language.
    pub fn prepare(
        &self,
        id: impl Into<String>,
        text: &str,
        speaker_id: i64,
    ) -> Result<Utterance, SynthesisError> {
        let output = self.phonemizer.phonemize(text)?;
        let encoder = SymbolEncoder::new(&self.table, &self.cleaners);

        let (text_ids, accent_ids) = match &output.accents {
            Some(accents) => encoder.encode_japanese(&output.phones, Some(accents))?,
            None => (encoder.encode_phones(&output.phones)?, None),
        };

        Ok(Utterance {
            id: id.into(),
            raw_text: text.to_string(),
            speaker_id,
            text_ids,
            accent_ids,
            fp_tag: None,
        })
    }
}
