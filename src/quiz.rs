use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::models::Card;

/// Target option count for a multiple-choice question: the correct answer
/// plus three distractors. Decks with fewer distinct answers produce shorter
/// option lists instead of failing.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// How the quiz presents each sampled card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuizMode {
    #[default]
    LongAnswer,
    MultipleChoice,
}

impl QuizMode {
    /// The quiz endpoint has always treated anything other than
    /// "multiple-choice" as a long-answer request.
    pub fn parse(value: &str) -> Self {
        match value {
            "multiple-choice" => QuizMode::MultipleChoice,
            _ => QuizMode::LongAnswer,
        }
    }
}

/// An ephemeral quiz question. `options` is present only in multiple-choice
/// mode and may hold fewer than four entries when the deck is small.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub answer: String,
}

/// Sample up to `count` cards uniformly without replacement and turn each
/// into a question. Sampling is shuffle-then-truncate over a copy of the
/// collection; the caller's slice is left untouched.
pub fn sample_quiz<R: Rng>(
    cards: &[Card],
    count: usize,
    mode: QuizMode,
    rng: &mut R,
) -> Vec<QuizQuestion> {
    let mut sampled: Vec<Card> = cards.to_vec();
    sampled.shuffle(rng);
    sampled.truncate(count);

    sampled
        .iter()
        .map(|card| QuizQuestion {
            question: card.question.clone(),
            options: match mode {
                QuizMode::MultipleChoice => Some(multiple_choice_options(card, cards, rng)),
                QuizMode::LongAnswer => None,
            },
            answer: card.answer.clone(),
        })
        .collect()
}

/// Build the option list for one card: up to three distinct wrong answers
/// drawn uniformly from the other cards, plus the correct answer, shuffled.
/// The correct answer appears exactly once; duplicates of it among other
/// cards' answers are filtered out before selection.
fn multiple_choice_options<R: Rng>(card: &Card, cards: &[Card], rng: &mut R) -> Vec<String> {
    let mut wrong_answers: Vec<String> = cards
        .iter()
        .filter(|other| other.id != card.id && other.answer != card.answer)
        .map(|other| other.answer.clone())
        .collect();
    wrong_answers.sort();
    wrong_answers.dedup();
    wrong_answers.shuffle(rng);
    wrong_answers.truncate(OPTIONS_PER_QUESTION - 1);

    let mut options = wrong_answers;
    options.push(card.answer.clone());
    options.shuffle(rng);
    options
}
