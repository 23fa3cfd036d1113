use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single flashcard, stored as a flat JSON document in `cards.json`.
///
/// `due_date` is kept as the raw stored string: cards written by older
/// versions (or edited by hand) may carry malformed or missing timestamps,
/// and those cards must still surface as due rather than poison the whole
/// collection. The scheduler owns the lenient parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub deck_id: Uuid,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub interval: i64,
}

impl Card {
    /// A freshly created card is due immediately and has never been reviewed.
    pub fn new(deck_id: Uuid, question: String, answer: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            deck_id,
            question,
            answer,
            due_date: Some(now.to_rfc3339()),
            interval: 0,
        }
    }
}

/// A deck groups cards by `Card::deck_id`; there is no back-pointer and
/// deleting a deck does not cascade to its cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// User-editable study settings, stored in `config.json`.
///
/// Re-read from the store on every call that needs them; missing fields fall
/// back to the defaults below so partially written files keep working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySettings {
    #[serde(default = "default_new_cards_per_day")]
    pub new_cards_per_day: usize,
    #[serde(default = "default_quiz_questions")]
    pub quiz_questions: usize,
    #[serde(default = "default_language")]
    pub question_language: String,
    #[serde(default = "default_language")]
    pub answer_language: String,
}

fn default_new_cards_per_day() -> usize {
    20
}

fn default_quiz_questions() -> usize {
    10
}

fn default_language() -> String {
    "en-US".to_string()
}

impl Default for StudySettings {
    fn default() -> Self {
        Self {
            new_cards_per_day: default_new_cards_per_day(),
            quiz_questions: default_quiz_questions(),
            question_language: default_language(),
            answer_language: default_language(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeckRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCardRequest {
    pub deck_id: Uuid,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCardRequest {
    pub question: Option<String>,
    pub answer: Option<String>,
}

/// Bare question/answer content, as produced by bulk import payloads and by
/// the LLM card generator before ids and scheduling state are assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardContent {
    pub question: String,
    pub answer: String,
}

/// Partial settings update; absent fields keep their stored values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub new_cards_per_day: Option<usize>,
    pub quiz_questions: Option<usize>,
    pub question_language: Option<String>,
    pub answer_language: Option<String>,
}
