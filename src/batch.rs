//! Per-utterance inference batches and the positional tuple protocol.
//!
//! Inside the crate a batch is an explicit record ([`Batch`]) with named
//! optional conditioning streams. On the producer/consumer boundary it
//! travels as an ordered tuple ([`BatchTuple`]) whose length depends on the
//! `use_accent`/`use_fp_tag` flags: 6 base elements, then accents, then
//! fp_tag. Both sides must agree on the flags; the tuple length is checked
//! before stripping so a mismatch surfaces as an error instead of silently
//! feeding the wrong stream to the model.

use crate::error::SynthesisError;

/// Raw texts carried in a batch are truncated to this many characters; they
/// are metadata for naming artifacts, not model input.
pub const RAW_TEXT_LIMIT: usize = 100;

/// Number of elements in a batch tuple with no optional conditioning.
pub const BASE_TUPLE_LEN: usize = 6;

/// One utterance prepared for batching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub id: String,
    pub raw_text: String,
    pub speaker_id: i64,
    pub text_ids: Vec<i64>,
    pub accent_ids: Option<Vec<i64>>,
    pub fp_tag: Option<Vec<i64>>,
}

/// An assembled inference batch with named fields.
///
/// Created per utterance or per corpus chunk, consumed exactly once, never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub ids: Vec<String>,
    pub raw_texts: Vec<String>,
    pub speaker_ids: Vec<i64>,
    pub text_ids: Vec<Vec<i64>>,
    pub text_lengths: Vec<usize>,
    pub max_length: usize,
    pub accents: Option<Vec<Vec<i64>>>,
    pub fp_tags: Option<Vec<Vec<i64>>>,
}

impl Batch {
    /// Number of utterances in the batch.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Encode into the positional wire form. Element order: ids, raw_texts,
    /// speaker_ids, text_ids, text_lengths, max_length, then accents (if
    /// present), then fp_tags (if present).
    pub fn into_tuple(self) -> BatchTuple {
        let mut elements = vec![
            BatchElement::Ids(self.ids),
            BatchElement::RawTexts(self.raw_texts),
            BatchElement::SpeakerIds(self.speaker_ids),
            BatchElement::TextIds(self.text_ids),
            BatchElement::TextLengths(self.text_lengths),
            BatchElement::MaxLength(self.max_length),
        ];
        if let Some(accents) = self.accents {
            elements.push(BatchElement::Accents(accents));
        }
        if let Some(fp_tags) = self.fp_tags {
            elements.push(BatchElement::FpTags(fp_tags));
        }
        BatchTuple { elements }
    }
}

/// One positional element of a batch tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchElement {
    Ids(Vec<String>),
    RawTexts(Vec<String>),
    SpeakerIds(Vec<i64>),
    TextIds(Vec<Vec<i64>>),
    TextLengths(Vec<usize>),
    MaxLength(usize),
    Accents(Vec<Vec<i64>>),
    FpTags(Vec<Vec<i64>>),
}

/// The positional batch form exchanged between producer and consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTuple {
    elements: Vec<BatchElement>,
}

impl BatchTuple {
    pub fn new(elements: Vec<BatchElement>) -> Self {
        Self { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BatchElement> {
        self.elements.get(index)
    }

    pub fn last(&self) -> Option<&BatchElement> {
        self.elements.last()
    }

    fn check_len(&self, use_accent: bool, use_fp_tag: bool) -> Result<(), SynthesisError> {
        let expected = BASE_TUPLE_LEN + usize::from(use_accent) + usize::from(use_fp_tag);
        if self.elements.len() != expected {
            return Err(SynthesisError::BatchShape {
                expected,
                actual: self.elements.len(),
            });
        }
        Ok(())
    }

    /// Pop the optional trailing elements in the fixed protocol order: when
    /// both flags are set, fp_tag is popped first (it is the last element),
    /// then accents. The remaining tuple holds exactly the 6 base fields.
    ///
    /// The tuple length is checked against the flags first; a mismatch means
    /// producer and consumer were configured differently.
    pub fn strip_optional_tail(
        mut self,
        use_accent: bool,
        use_fp_tag: bool,
    ) -> Result<StrippedBatch, SynthesisError> {
        self.check_len(use_accent, use_fp_tag)?;

        let fp_tags = if use_fp_tag {
            match self.elements.pop() {
                Some(BatchElement::FpTags(v)) => Some(v),
                other => return Err(unexpected_element("fp_tag", other)),
            }
        } else {
            None
        };

        let accents = if use_accent {
            match self.elements.pop() {
                Some(BatchElement::Accents(v)) => Some(v),
                other => return Err(unexpected_element("accents", other)),
            }
        } else {
            None
        };

        Ok(StrippedBatch {
            base: self,
            accents,
            fp_tags,
        })
    }

    /// Decode the wire form back into the named record.
    pub fn decode(
        self,
        use_accent: bool,
        use_fp_tag: bool,
    ) -> Result<Batch, SynthesisError> {
        let stripped = self.strip_optional_tail(use_accent, use_fp_tag)?;
        let mut base = stripped.base.elements.into_iter();

        // Element order is fixed by the protocol.
        let (ids, raw_texts, speaker_ids, text_ids, text_lengths, max_length) = match (
            base.next(),
            base.next(),
            base.next(),
            base.next(),
            base.next(),
            base.next(),
        ) {
            (
                Some(BatchElement::Ids(ids)),
                Some(BatchElement::RawTexts(raw_texts)),
                Some(BatchElement::SpeakerIds(speaker_ids)),
                Some(BatchElement::TextIds(text_ids)),
                Some(BatchElement::TextLengths(text_lengths)),
                Some(BatchElement::MaxLength(max_length)),
            ) => (ids, raw_texts, speaker_ids, text_ids, text_lengths, max_length),
            _ => {
                return Err(SynthesisError::Config(
                    "batch tuple base elements are out of order".to_string(),
                ))
            }
        };

        Ok(Batch {
            ids,
            raw_texts,
            speaker_ids,
            text_ids,
            text_lengths,
            max_length,
            accents: stripped.accents,
            fp_tags: stripped.fp_tags,
        })
    }
}

fn unexpected_element(wanted: &str, got: Option<BatchElement>) -> SynthesisError {
    SynthesisError::Config(format!(
        "expected {wanted} at the batch tuple tail, found {got:?}"
    ))
}

/// Result of [`BatchTuple::strip_optional_tail`]: the 6 base fields plus the
/// extracted conditioning streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedBatch {
    pub base: BatchTuple,
    pub accents: Option<Vec<Vec<i64>>>,
    pub fp_tags: Option<Vec<Vec<i64>>>,
}

/// Assembles [`Batch`]es under the configured conditioning flags.
///
/// No padding is performed; cross-utterance padding is the responsibility
/// of whoever materializes tensors from the id sequences.
pub struct ControlledBatchBuilder {
    use_accent: bool,
    use_fp_tag: bool,
    utterances: Vec<Utterance>,
}

impl ControlledBatchBuilder {
    pub fn new(use_accent: bool, use_fp_tag: bool) -> Self {
        Self {
            use_accent,
            use_fp_tag,
            utterances: Vec::new(),
        }
    }

    pub fn push(&mut self, utterance: Utterance) -> &mut Self {
        self.utterances.push(utterance);
        self
    }

    /// Build the batch. With accent conditioning enabled, every utterance
    /// must carry an accent sequence (and likewise for fp tags): a missing
    /// stream under an enabled flag would shift the tuple shape the
    /// consumer expects.
    pub fn build(self) -> Result<Batch, SynthesisError> {
        if self.utterances.is_empty() {
            return Err(SynthesisError::Config(
                "cannot build an empty batch".to_string(),
            ));
        }

        let mut ids = Vec::with_capacity(self.utterances.len());
        let mut raw_texts = Vec::with_capacity(self.utterances.len());
        let mut speaker_ids = Vec::with_capacity(self.utterances.len());
        let mut text_ids = Vec::with_capacity(self.utterances.len());
        let mut text_lengths = Vec::with_capacity(self.utterances.len());
        let mut accents = self.use_accent.then(Vec::new);
        let mut fp_tags = self.use_fp_tag.then(Vec::new);

        for utterance in self.utterances {
            ids.push(utterance.id.clone());
            raw_texts.push(utterance.raw_text.chars().take(RAW_TEXT_LIMIT).collect());
            speaker_ids.push(utterance.speaker_id);
            text_lengths.push(utterance.text_ids.len());
            text_ids.push(utterance.text_ids);

            if let Some(accents) = accents.as_mut() {
                let stream = utterance.accent_ids.ok_or_else(|| {
                    SynthesisError::Config(format!(
                        "use_accent is enabled but utterance {:?} has no accent sequence",
                        utterance.id
                    ))
                })?;
                accents.push(stream);
            }
            if let Some(fp_tags) = fp_tags.as_mut() {
                let stream = utterance.fp_tag.ok_or_else(|| {
                    SynthesisError::Config(format!(
                        "use_fp_tag is enabled but utterance {:?} has no fp tag",
                        utterance.id
                    ))
                })?;
                fp_tags.push(stream);
            }
        }

        let max_length = text_lengths.iter().copied().max().unwrap_or(0);

        Ok(Batch {
            ids,
            raw_texts,
            speaker_ids,
            text_ids,
            text_lengths,
            max_length,
            accents,
            fp_tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utterance(id: &str, len: usize, accented: bool, tagged: bool) -> Utterance {
        Utterance {
            id: id.to_string(),
            raw_text: format!("text for {id}"),
            speaker_id: 0,
            text_ids: (0..len as i64).collect(),
            accent_ids: accented.then(|| vec![0; len]),
            fp_tag: tagged.then(|| vec![0; len]),
        }
    }

    fn build(use_accent: bool, use_fp_tag: bool) -> Batch {
        let mut builder = ControlledBatchBuilder::new(use_accent, use_fp_tag);
        builder.push(utterance("utt1", 4, use_accent, use_fp_tag));
        builder.build().unwrap()
    }

    #[test]
    fn tuple_length_matches_flags_for_all_combinations() {
        for (use_accent, use_fp_tag) in
            [(false, false), (true, false), (false, true), (true, true)]
        {
            let tuple = build(use_accent, use_fp_tag).into_tuple();
            assert_eq!(
                tuple.len(),
                6 + usize::from(use_accent) + usize::from(use_fp_tag),
                "flags ({use_accent}, {use_fp_tag})"
            );
        }
    }

    #[test]
    fn strip_pops_fp_tag_then_accents_when_both_flags_set() {
        let tuple = build(true, true).into_tuple();
        assert_eq!(tuple.len(), 8);

        let last = tuple.last().cloned().unwrap();
        let second_last = tuple.get(tuple.len() - 2).cloned().unwrap();

        let stripped = tuple.strip_optional_tail(true, true).unwrap();
        assert_eq!(stripped.base.len(), 6);
        assert_eq!(
            BatchElement::FpTags(stripped.fp_tags.clone().unwrap()),
            last
        );
        assert_eq!(
            BatchElement::Accents(stripped.accents.clone().unwrap()),
            second_last
        );
    }

    #[test]
    fn strip_with_only_fp_tag_pops_the_last_element() {
        let tuple = build(false, true).into_tuple();
        assert_eq!(tuple.len(), 7);
        let last = tuple.last().cloned().unwrap();

        let stripped = tuple.strip_optional_tail(false, true).unwrap();
        assert_eq!(stripped.base.len(), 6);
        assert!(stripped.accents.is_none());
        assert_eq!(BatchElement::FpTags(stripped.fp_tags.unwrap()), last);
    }

    #[test]
    fn strip_with_neither_flag_pops_nothing() {
        let tuple = build(false, false).into_tuple();
        let stripped = tuple.strip_optional_tail(false, false).unwrap();
        assert_eq!(stripped.base.len(), 6);
        assert!(stripped.accents.is_none());
        assert!(stripped.fp_tags.is_none());
    }

    #[test]
    fn flag_mismatch_is_a_batch_shape_error() {
        let tuple = build(true, false).into_tuple(); // 7 elements
        let err = tuple.strip_optional_tail(false, false).unwrap_err();
        assert!(matches!(
            err,
            SynthesisError::BatchShape {
                expected: 6,
                actual: 7
            }
        ));
    }

    #[test]
    fn decode_round_trips_the_record() {
        let batch = build(true, true);
        let decoded = batch.clone().into_tuple().decode(true, true).unwrap();
        assert_eq!(decoded, batch);
    }

    #[test]
    fn raw_text_is_truncated_to_one_hundred_chars() {
        let long_text: String = "あ".repeat(150);
        let mut builder = ControlledBatchBuilder::new(false, false);
        builder.push(Utterance {
            id: "long".to_string(),
            raw_text: long_text,
            speaker_id: 3,
            text_ids: vec![1, 2, 3],
            accent_ids: None,
            fp_tag: None,
        });
        let batch = builder.build().unwrap();
        assert_eq!(batch.raw_texts[0].chars().count(), 100);
        assert_eq!(batch.speaker_ids, vec![3]);
    }

    #[test]
    fn max_length_is_the_longest_sequence() {
        let mut builder = ControlledBatchBuilder::new(false, false);
        builder.push(utterance("short", 3, false, false));
        builder.push(utterance("long", 9, false, false));
        let batch = builder.build().unwrap();
        assert_eq!(batch.text_lengths, vec![3, 9]);
        assert_eq!(batch.max_length, 9);
    }

    #[test]
    fn enabled_accent_flag_requires_accent_streams() {
        let mut builder = ControlledBatchBuilder::new(true, false);
        builder.push(utterance("plain", 3, false, false));
        assert!(builder.build().is_err());
    }
}
