//! Prompt question selection.
//!
//! The compose step shows a random question from the guest's tone bank; the
//! recap step shows the first one, so the two can disagree for the same
//! memory.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tone::{Tone, ToneQuestions};

/// Shown when there is no tone or the tone's bank is empty.
pub const FALLBACK_QUESTION: &str = "What do you wish them never to forget?";

/// How to pick among the candidate questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Uniformly random (compose step).
    Random,
    /// Always the first candidate (recap step).
    First,
}

/// Select a question using the thread-local RNG.
pub fn select_question(tone: Option<Tone>, bank: &ToneQuestions, mode: SelectionMode) -> String {
    select_question_with(tone, bank, mode, &mut rand::rng())
}

/// Select a question with an explicit RNG (deterministic in tests).
pub fn select_question_with<R: Rng + ?Sized>(
    tone: Option<Tone>,
    bank: &ToneQuestions,
    mode: SelectionMode,
    rng: &mut R,
) -> String {
    let Some(tone) = tone else {
        return FALLBACK_QUESTION.to_string();
    };
    let candidates = bank.bank(tone).candidates();
    if candidates.is_empty() {
        return FALLBACK_QUESTION.to_string();
    }
    let picked = match mode {
        SelectionMode::First => candidates[0],
        SelectionMode::Random => candidates[rng.random_range(0..candidates.len())],
    };
    picked.to_string()
}
