use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a bank entry cannot be turned into a playable round.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionError {
    /// The bank holds no question at all.
    #[error("question bank is empty")]
    EmptyBank,
    /// The question has no option to display.
    #[error("question `{text}` has no options")]
    NoOptions {
        /// Text of the offending question.
        text: String,
    },
    /// The correct index does not point inside the options.
    #[error("question `{text}` marks option {index} as correct but only has {len} options")]
    CorrectIndexOutOfBounds {
        /// Text of the offending question.
        text: String,
        /// Declared correct index.
        index: usize,
        /// Number of options available.
        len: usize,
    },
    /// Fewer than two options make the question trivial.
    #[error("question `{text}` needs at least two options (got {len})")]
    TooFewOptions {
        /// Text of the offending question.
        text: String,
        /// Number of options available.
        len: usize,
    },
    /// Two options carry the same text, so the answer cannot be located after a shuffle.
    #[error("question `{text}` lists option `{option}` more than once")]
    DuplicateOption {
        /// Text of the offending question.
        text: String,
        /// Repeated option.
        option: String,
    },
}

/// A single trivia item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionItem {
    /// Question shown to the player.
    #[serde(alias = "question")]
    pub text: String,
    /// Options in their authored order.
    pub options: Vec<String>,
    /// Index into `options` of the right answer.
    #[serde(alias = "correct")]
    pub correct_index: usize,
}

impl QuestionItem {
    /// Build a question from its parts.
    pub fn new(
        text: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        correct_index: usize,
    ) -> Self {
        Self {
            text: text.into(),
            options: options.into_iter().map(Into::into).collect(),
            correct_index,
        }
    }

    /// Text of the right answer, if the item is well formed.
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_index).map(String::as_str)
    }

    /// Checks the minimum needed to play a round: options exist and the answer index is in range.
    pub fn ensure_playable(&self) -> Result<(), QuestionError> {
        if self.options.is_empty() {
            return Err(QuestionError::NoOptions {
                text: self.text.clone(),
            });
        }

        if self.correct_index >= self.options.len() {
            return Err(QuestionError::CorrectIndexOutOfBounds {
                text: self.text.clone(),
                index: self.correct_index,
                len: self.options.len(),
            });
        }

        Ok(())
    }

    /// Stricter check applied when loading a bank: playable, at least two options, no duplicates.
    pub fn validate(&self) -> Result<(), QuestionError> {
        self.ensure_playable()?;

        if self.options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                text: self.text.clone(),
                len: self.options.len(),
            });
        }

        let mut seen = HashSet::with_capacity(self.options.len());
        for option in &self.options {
            if !seen.insert(option.as_str()) {
                return Err(QuestionError::DuplicateOption {
                    text: self.text.clone(),
                    option: option.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Ordered, read-only collection of questions rounds are drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionBank {
    items: Vec<QuestionItem>,
}

impl QuestionBank {
    /// Wrap items as-is. Malformed entries surface later as [`QuestionError`]s when drawn.
    pub fn new(items: Vec<QuestionItem>) -> Self {
        Self { items }
    }

    /// Keep only the items passing [`QuestionItem::validate`], returning the rejected ones' errors.
    pub fn from_validated(items: Vec<QuestionItem>) -> (Self, Vec<QuestionError>) {
        let mut rejected = Vec::new();
        let items = items
            .into_iter()
            .filter(|item| match item.validate() {
                Ok(()) => true,
                Err(err) => {
                    rejected.push(err);
                    false
                }
            })
            .collect();
        (Self { items }, rejected)
    }

    /// Like [`QuestionBank::from_validated`], but falls back to [`default_bank`] when
    /// nothing valid remains.
    pub fn validated_or_default(items: Vec<QuestionItem>) -> (Self, Vec<QuestionError>) {
        let (bank, rejected) = Self::from_validated(items);
        if bank.is_empty() {
            (default_bank(), rejected)
        } else {
            (bank, rejected)
        }
    }

    /// Questions in authored order.
    pub fn items(&self) -> &[QuestionItem] {
        &self.items
    }

    /// Question at `index`.
    pub fn get(&self, index: usize) -> Option<&QuestionItem> {
        self.items.get(index)
    }

    /// Number of questions.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the bank holds nothing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Bank shipped with the binary.
pub fn default_bank() -> QuestionBank {
    QuestionBank::new(vec![
        QuestionItem::new(
            "What does BIS stand for?",
            [
                "Bureau of Indian Standards",
                "British Industrial Standards",
                "Basic International System",
                "Board of Industry Standards",
            ],
            0,
        ),
        QuestionItem::new(
            "Which BIS standard is followed for drinking water quality?",
            ["IS 10500", "IS 456", "IS 3025", "IS 1200"],
            0,
        ),
        QuestionItem::new(
            "In BIS, what does the ISI mark signify?",
            [
                "Product Safety",
                "International Standard",
                "Quality and Safety",
                "Bureau Membership",
            ],
            2,
        ),
        QuestionItem::new(
            "What is the BIS standard for the cement testing procedure?",
            ["IS 269", "IS 383", "IS 650", "IS 4031"],
            3,
        ),
        QuestionItem::new(
            "Which BIS code specifies the grading of coarse and fine aggregates?",
            ["IS 383", "IS 456", "IS 10262", "IS 2386"],
            0,
        ),
    ])
}
