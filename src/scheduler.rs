use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::warn;

use crate::models::Card;

/// A card with an interval of at least this many days counts as mature.
pub const MATURE_INTERVAL_DAYS: i64 = 21;

/// Recall quality reported by the user after seeing a card's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Again,
    Good,
    Easy,
}

impl Rating {
    /// Parse a client-submitted rating string. Anything outside the known set
    /// yields `None`; callers treat that as a diagnostic no-op rather than an
    /// error, matching the historical behavior of the review endpoint.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "again" => Some(Rating::Again),
            "good" => Some(Rating::Good),
            "easy" => Some(Rating::Easy),
            _ => None,
        }
    }
}

/// Review lifecycle stage, derived entirely from the stored interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    New,
    Learning,
    Mature,
}

impl Card {
    pub fn state(&self) -> CardState {
        if self.interval == 0 {
            CardState::New
        } else if self.interval < MATURE_INTERVAL_DAYS {
            CardState::Learning
        } else {
            CardState::Mature
        }
    }
}

/// One study session's worth of cards: capped new cards plus every due
/// review card, shuffled together. Field names match the wire format the
/// learn endpoint has always produced.
#[derive(Debug, Clone, Serialize)]
pub struct LearnQueue {
    pub learn_queue: Vec<Card>,
    pub total_cards_in_queue: usize,
    pub new_cards_in_queue: usize,
    pub review_cards_in_queue: usize,
}

/// Per-deck progress tally over the three-state partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeckStats {
    pub total_cards: usize,
    pub to_learn_count: usize,
    pub learning_count: usize,
    pub mastered_count: usize,
}

/// Simplified Leitner-style scheduler: intervals double on `good`, quadruple
/// on `easy`, and reset on `again`. No ease factor is tracked.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewScheduler;

impl ReviewScheduler {
    pub fn new() -> Self {
        Self
    }

    /// All cards whose due date has passed. A card with a missing or
    /// unparsable due date is included: losing a timestamp must never hide a
    /// card from review, and one bad record must never block the rest.
    pub fn due_cards(&self, cards: &[Card], now: DateTime<Utc>) -> Vec<Card> {
        cards
            .iter()
            .filter(|card| due_at(card, now) <= now)
            .cloned()
            .collect()
    }

    /// Compose the session queue from the due set: uniformly pick at most
    /// `new_cards_per_day` new cards, keep every review card, shuffle the
    /// combined result. Review cards are never capped or dropped.
    pub fn build_learn_queue<R: Rng>(
        &self,
        due_cards: Vec<Card>,
        new_cards_per_day: usize,
        rng: &mut R,
    ) -> LearnQueue {
        let (mut new_cards, review_cards): (Vec<Card>, Vec<Card>) =
            due_cards.into_iter().partition(|card| card.interval == 0);

        new_cards.shuffle(rng);
        new_cards.truncate(new_cards_per_day);

        let new_count = new_cards.len();
        let review_count = review_cards.len();

        let mut queue = new_cards;
        queue.extend(review_cards);
        queue.shuffle(rng);

        LearnQueue {
            total_cards_in_queue: queue.len(),
            new_cards_in_queue: new_count,
            review_cards_in_queue: review_count,
            learn_queue: queue,
        }
    }

    /// Apply a rating transition and return the updated card. The multiplier
    /// acts on the previous interval, so a new card rated `good` or `easy`
    /// lands on exactly one day. Persistence is the caller's concern.
    pub fn apply_rating(&self, card: &Card, rating: Rating, now: DateTime<Utc>) -> Card {
        let mut updated = card.clone();
        match rating {
            Rating::Again => {
                updated.interval = 0;
                updated.due_date = Some(now.to_rfc3339());
            }
            Rating::Good => {
                updated.interval = (card.interval * 2).max(1);
                updated.due_date = Some((now + Duration::days(updated.interval)).to_rfc3339());
            }
            Rating::Easy => {
                updated.interval = (card.interval * 4).max(1);
                updated.due_date = Some((now + Duration::days(updated.interval)).to_rfc3339());
            }
        }
        updated
    }

    /// Tally cards by lifecycle stage. Date-independent and idempotent.
    pub fn deck_stats(&self, cards: &[Card]) -> DeckStats {
        let mut stats = DeckStats {
            total_cards: cards.len(),
            to_learn_count: 0,
            learning_count: 0,
            mastered_count: 0,
        };
        for card in cards {
            match card.state() {
                CardState::New => stats.to_learn_count += 1,
                CardState::Learning => stats.learning_count += 1,
                CardState::Mature => stats.mastered_count += 1,
            }
        }
        stats
    }
}

/// Resolve a card's due timestamp, failing open to `now`.
///
/// Stored files contain RFC 3339 values, but historical data may carry
/// offset-less ISO-8601 strings; both parse. Anything else is logged and the
/// card is treated as due immediately.
fn due_at(card: &Card, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(raw) = card.due_date.as_deref() else {
        warn!(card_id = %card.id, "card has no due_date, treating as due now");
        return now;
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Utc);
    }
    if let Ok(naive) = raw.parse::<NaiveDateTime>() {
        return naive.and_utc();
    }

    warn!(card_id = %card.id, due_date = raw, "malformed due_date, treating card as due now");
    now
}
