use rand::{Rng, seq::SliceRandom};
use thiserror::Error;

use crate::state::question::{QuestionBank, QuestionError, QuestionItem};

/// Caller misuse when answering a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoundError {
    /// The round already accepted its single answer.
    #[error("round has already been answered")]
    AlreadyAnswered,
    /// The selected option does not exist.
    #[error("option {index} does not exist (round shows {len} options)")]
    InvalidSelection {
        /// Index sent by the caller.
        index: usize,
        /// Number of displayed options.
        len: usize,
    },
}

/// Outcome of a submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerResult {
    /// Whether the selected option was the right one.
    pub is_correct: bool,
}

/// One question as presented to the player, with its options in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    question: QuestionItem,
    displayed_options: Vec<String>,
    correct_display_index: usize,
    answered_option_index: Option<usize>,
}

impl RoundState {
    /// Question drawn for this round.
    pub fn question(&self) -> &QuestionItem {
        &self.question
    }

    /// Options in the order they are shown.
    pub fn displayed_options(&self) -> &[String] {
        &self.displayed_options
    }

    /// Position of the right answer inside [`Self::displayed_options`].
    pub fn correct_display_index(&self) -> usize {
        self.correct_display_index
    }

    /// The option picked by the player, once answered.
    pub fn answered_option_index(&self) -> Option<usize> {
        self.answered_option_index
    }

    /// True once the round accepted its answer.
    pub fn is_answered(&self) -> bool {
        self.answered_option_index.is_some()
    }
}

/// Draw a question uniformly at random (with replacement) and shuffle its options.
pub fn start_round<R>(bank: &QuestionBank, rng: &mut R) -> Result<RoundState, QuestionError>
where
    R: Rng + ?Sized,
{
    if bank.is_empty() {
        return Err(QuestionError::EmptyBank);
    }

    let index = rng.random_range(0..bank.len());
    let question = bank.get(index).ok_or(QuestionError::EmptyBank)?;
    round_for(question.clone(), rng)
}

/// Build a round for a given question, shuffling its options with `rng`.
pub fn round_for<R>(question: QuestionItem, rng: &mut R) -> Result<RoundState, QuestionError>
where
    R: Rng + ?Sized,
{
    question.ensure_playable()?;

    // Shuffle positions rather than strings so the answer is tracked by identity even if two
    // options happen to share the same text.
    let mut order: Vec<usize> = (0..question.options.len()).collect();
    order.shuffle(rng);

    let correct_display_index = order
        .iter()
        .position(|&original| original == question.correct_index)
        .ok_or_else(|| QuestionError::CorrectIndexOutOfBounds {
            text: question.text.clone(),
            index: question.correct_index,
            len: question.options.len(),
        })?;
    let displayed_options = order
        .iter()
        .map(|&original| question.options[original].clone())
        .collect();

    Ok(RoundState {
        question,
        displayed_options,
        correct_display_index,
        answered_option_index: None,
    })
}

/// Record the player's single answer for `round`.
pub fn submit_answer(round: &mut RoundState, selected: usize) -> Result<AnswerResult, RoundError> {
    if round.answered_option_index.is_some() {
        return Err(RoundError::AlreadyAnswered);
    }

    let len = round.displayed_options.len();
    if selected >= len {
        return Err(RoundError::InvalidSelection {
            index: selected,
            len,
        });
    }

    round.answered_option_index = Some(selected);
    Ok(AnswerResult {
        is_correct: selected == round.correct_display_index,
    })
}
