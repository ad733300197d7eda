//! Message tones and their prompt question banks.
//!
//! Question banks arrive in several historical shapes (a single string, an
//! array of any length, or nothing at all). Everything is normalized here
//! into a fixed-capacity [`QuestionBank`] per known [`Tone`], so no other
//! module ever has to look at the raw JSON.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Number of question slots kept per tone. Empty slots mean "unset".
pub const QUESTION_SLOTS: usize = 10;

/// Maximum length of a single prompt question.
pub const MAX_QUESTION_LENGTH: usize = 200;

// ---------------------------------------------------------------------------
// Tone
// ---------------------------------------------------------------------------

/// The category a guest picks to steer which question they are asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Wise,
    Funny,
    Advice,
    Emotional,
}

impl Tone {
    /// Every known tone, in display order.
    pub const ALL: [Tone; 4] = [Tone::Wise, Tone::Funny, Tone::Advice, Tone::Emotional];

    /// Parse a tone id as stored in the database or sent by a client.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "wise" => Ok(Self::Wise),
            "funny" => Ok(Self::Funny),
            "advice" => Ok(Self::Advice),
            "emotional" => Ok(Self::Emotional),
            _ => Err(CoreError::Validation(format!(
                "Invalid tone '{s}'. Must be one of: wise, funny, advice, emotional"
            ))),
        }
    }

    /// Convert to the stable string id.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wise => "wise",
            Self::Funny => "funny",
            Self::Advice => "advice",
            Self::Emotional => "emotional",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// QuestionBank
// ---------------------------------------------------------------------------

/// Ordered, fixed-capacity list of prompt questions for one tone.
///
/// Always holds exactly [`QUESTION_SLOTS`] entries; blank entries are unset
/// slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QuestionBank(Vec<String>);

impl QuestionBank {
    /// A bank with every slot unset.
    pub fn empty() -> Self {
        Self(vec![String::new(); QUESTION_SLOTS])
    }

    /// Build a bank from an ordered list, padding or truncating to capacity.
    pub fn from_questions<I, S>(questions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut slots: Vec<String> = questions
            .into_iter()
            .take(QUESTION_SLOTS)
            .map(Into::into)
            .collect();
        slots.resize(QUESTION_SLOTS, String::new());
        Self(slots)
    }

    /// Normalize one raw tone entry.
    ///
    /// - A string becomes the first slot (legacy single-question format).
    /// - An array keeps its string entries in order; non-string entries
    ///   become unset slots.
    /// - Anything else is malformed and yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::from_questions([s.as_str()])),
            Value::Array(items) => Some(Self::from_questions(
                items.iter().map(|v| v.as_str().unwrap_or_default()),
            )),
            _ => None,
        }
    }

    /// All slots, including unset ones.
    pub fn slots(&self) -> &[String] {
        &self.0
    }

    /// Non-blank questions in their original order.
    pub fn candidates(&self) -> Vec<&str> {
        self.0
            .iter()
            .map(String::as_str)
            .filter(|q| !q.trim().is_empty())
            .collect()
    }

    /// `true` if no slot holds a usable question.
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|q| q.trim().is_empty())
    }

    /// Reject questions that are too long to display.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (idx, q) in self.0.iter().enumerate() {
            if q.chars().count() > MAX_QUESTION_LENGTH {
                return Err(CoreError::Validation(format!(
                    "Question {} exceeds maximum length of {MAX_QUESTION_LENGTH} characters",
                    idx + 1
                )));
            }
        }
        Ok(())
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'de> Deserialize<'de> for QuestionBank {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value).unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// ToneQuestions
// ---------------------------------------------------------------------------

/// Question banks for every known tone.
///
/// Serializes as `{"wise": [...], "funny": [...], ...}`. Always contains an
/// entry for each tone in [`Tone::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToneQuestions {
    wise: QuestionBank,
    funny: QuestionBank,
    advice: QuestionBank,
    emotional: QuestionBank,
}

impl ToneQuestions {
    /// Banks with every slot unset.
    pub fn empty() -> Self {
        Self {
            wise: QuestionBank::empty(),
            funny: QuestionBank::empty(),
            advice: QuestionBank::empty(),
            emotional: QuestionBank::empty(),
        }
    }

    /// Product default questions (five per tone).
    pub fn defaults() -> Self {
        let mut out = Self::empty();
        out.set(
            Tone::Wise,
            QuestionBank::from_questions([
                "What wisdom would you share with them?",
                "What life lesson do you hope they remember?",
                "What truth about love would you tell them?",
                "What would you want them to never forget?",
                "What wise words would you give to them?",
            ]),
        );
        out.set(
            Tone::Funny,
            QuestionBank::from_questions([
                "What's a funny memory or joke for them?",
                "What always makes you laugh about them?",
                "What's the funniest thing you remember?",
                "What would make them smile today?",
                "What's your most hilarious memory together?",
            ]),
        );
        out.set(
            Tone::Advice,
            QuestionBank::from_questions([
                "What advice would you give them?",
                "What tip would help their journey?",
                "What suggestion do you have for them?",
                "What would you recommend they do?",
                "What guidance would you share?",
            ]),
        );
        out.set(
            Tone::Emotional,
            QuestionBank::from_questions([
                "What heartfelt message do you have for them?",
                "What touches your heart about them?",
                "What do you love most about them?",
                "What makes them special to you?",
                "What would you want them to feel?",
            ]),
        );
        out
    }

    /// Normalize a raw JSON mapping. Unknown keys are ignored, missing or
    /// malformed tones get an empty bank.
    pub fn normalize(value: &Value) -> Self {
        let mut out = Self::empty();
        if let Some(obj) = value.as_object() {
            for tone in Tone::ALL {
                if let Some(bank) = obj.get(tone.as_str()).and_then(QuestionBank::from_value) {
                    out.set(tone, bank);
                }
            }
        }
        out
    }

    /// Normalize a raw JSON mapping layered over `base`: a tone whose raw
    /// entry is missing, malformed, or entirely blank keeps `base`'s bank.
    pub fn normalize_over(value: &Value, base: &ToneQuestions) -> Self {
        let mut out = base.clone();
        if let Some(obj) = value.as_object() {
            for tone in Tone::ALL {
                if let Some(bank) = obj.get(tone.as_str()).and_then(QuestionBank::from_value) {
                    if !bank.is_blank() {
                        out.set(tone, bank);
                    }
                }
            }
        }
        out
    }

    /// The bank for `tone`.
    pub fn bank(&self, tone: Tone) -> &QuestionBank {
        match tone {
            Tone::Wise => &self.wise,
            Tone::Funny => &self.funny,
            Tone::Advice => &self.advice,
            Tone::Emotional => &self.emotional,
        }
    }

    /// Replace the bank for `tone`.
    pub fn set(&mut self, tone: Tone, bank: QuestionBank) {
        let slot = match tone {
            Tone::Wise => &mut self.wise,
            Tone::Funny => &mut self.funny,
            Tone::Advice => &mut self.advice,
            Tone::Emotional => &mut self.emotional,
        };
        *slot = bank;
    }

    /// Validate every bank.
    pub fn validate(&self) -> Result<(), CoreError> {
        for tone in Tone::ALL {
            self.bank(tone).validate().map_err(|e| match e {
                CoreError::Validation(msg) => CoreError::Validation(format!("{tone}: {msg}")),
                other => other,
            })?;
        }
        Ok(())
    }

    /// JSON form for storage.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Default::default()))
    }
}

impl Default for ToneQuestions {
    fn default() -> Self {
        Self::defaults()
    }
}

impl<'de> Deserialize<'de> for ToneQuestions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::normalize(&value))
    }
}
