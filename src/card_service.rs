use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    Card, CardContent, CreateCardRequest, CreateDeckRequest, Deck, SettingsUpdate, StudySettings,
    UpdateCardRequest,
};
use crate::quiz::{self, QuizMode, QuizQuestion};
use crate::scheduler::{DeckStats, LearnQueue, Rating, ReviewScheduler};
use crate::store::JsonStore;

/// Service layer over the document store: CRUD, the learn/review flow, and
/// quiz sampling. Operations on a missing id return `Ok(None)`; the API
/// layer turns that into a 404.
#[derive(Clone)]
pub struct CardService {
    store: JsonStore,
    scheduler: ReviewScheduler,
}

impl CardService {
    pub fn new(store: JsonStore) -> Self {
        Self {
            store,
            scheduler: ReviewScheduler::new(),
        }
    }

    // Deck operations

    pub async fn create_deck(&self, request: CreateDeckRequest) -> Result<Deck> {
        let deck = Deck {
            id: Uuid::new_v4(),
            name: request.name,
            description: request.description,
        };
        self.store.insert_deck(&deck).await?;
        info!(deck_id = %deck.id, name = %deck.name, "Deck created");
        Ok(deck)
    }

    pub async fn list_decks(&self) -> Result<Vec<Deck>> {
        self.store.load_decks().await
    }

    // Card CRUD operations

    pub async fn create_card(&self, request: CreateCardRequest) -> Result<Card> {
        let card = Card::new(request.deck_id, request.question, request.answer, Utc::now());
        self.store.insert_cards(std::slice::from_ref(&card)).await?;
        Ok(card)
    }

    /// Bulk-import question/answer pairs into a deck. Every imported card
    /// starts fresh: new id, due now, interval zero.
    pub async fn import_cards(&self, deck_id: Uuid, entries: Vec<CardContent>) -> Result<Vec<Card>> {
        let now = Utc::now();
        let cards: Vec<Card> = entries
            .into_iter()
            .map(|entry| Card::new(deck_id, entry.question, entry.answer, now))
            .collect();
        self.store.insert_cards(&cards).await?;
        info!(deck_id = %deck_id, count = cards.len(), "Cards imported");
        Ok(cards)
    }

    pub async fn get_card(&self, id: Uuid) -> Result<Option<Card>> {
        self.store.get_card(id).await
    }

    pub async fn list_cards(&self, deck_id: Option<Uuid>) -> Result<Vec<Card>> {
        self.store.load_cards(deck_id).await
    }

    /// Edit question/answer text; scheduling state is untouched.
    pub async fn update_card(&self, id: Uuid, request: UpdateCardRequest) -> Result<Option<Card>> {
        let mut card = match self.store.get_card(id).await? {
            Some(card) => card,
            None => return Ok(None),
        };

        if let Some(question) = request.question {
            card.question = question;
        }
        if let Some(answer) = request.answer {
            card.answer = answer;
        }

        self.store.upsert_card(&card).await?;
        Ok(Some(card))
    }

    pub async fn delete_card(&self, id: Uuid) -> Result<bool> {
        self.store.delete_card(id).await
    }

    // Learning flow

    /// Build the study queue for a deck: due cards, the daily new-card cap
    /// from the settings document, shuffled. Settings are re-read on every
    /// call so edits apply to the next session immediately.
    pub async fn learn_queue(&self, deck_id: Uuid) -> Result<LearnQueue> {
        let cards = self.store.load_cards(Some(deck_id)).await?;
        let settings = self.store.load_settings().await?;

        let due = self.scheduler.due_cards(&cards, Utc::now());
        let mut rng = rand::rng();
        Ok(self
            .scheduler
            .build_learn_queue(due, settings.new_cards_per_day, &mut rng))
    }

    /// Apply a recall rating to a card and persist the transition. An
    /// unrecognized rating value is a deliberate no-op: the card comes back
    /// unchanged and the bad value is logged.
    pub async fn answer_card(&self, card_id: Uuid, rating: &str) -> Result<Option<Card>> {
        let card = match (self.store.get_card(card_id).await?, Rating::parse(rating)) {
            (None, _) => return Ok(None),
            (Some(card), None) => {
                warn!(card_id = %card_id, rating = rating, "Unknown rating value, leaving card unchanged");
                return Ok(Some(card));
            }
            (Some(card), Some(rating)) => {
                let updated = self.scheduler.apply_rating(&card, rating, Utc::now());
                self.store.upsert_card(&updated).await?;
                updated
            }
        };
        Ok(Some(card))
    }

    pub async fn deck_stats(&self, deck_id: Uuid) -> Result<DeckStats> {
        let cards = self.store.load_cards(Some(deck_id)).await?;
        Ok(self.scheduler.deck_stats(&cards))
    }

    // Quizzes

    /// Sample an ephemeral quiz over a deck (or the whole collection). The
    /// question count falls back to the stored settings.
    pub async fn build_quiz(
        &self,
        deck_id: Option<Uuid>,
        count: Option<usize>,
        mode: QuizMode,
    ) -> Result<Vec<QuizQuestion>> {
        let cards = self.store.load_cards(deck_id).await?;
        let settings = self.store.load_settings().await?;
        let count = count.unwrap_or(settings.quiz_questions);

        let mut rng = rand::rng();
        Ok(quiz::sample_quiz(&cards, count, mode, &mut rng))
    }

    // Settings

    pub async fn settings(&self) -> Result<StudySettings> {
        self.store.load_settings().await
    }

    pub async fn update_settings(&self, update: SettingsUpdate) -> Result<StudySettings> {
        self.store.update_settings(update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_service() -> (tempfile::TempDir, CardService) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path()).await.unwrap();
        (dir, CardService::new(store))
    }

    async fn deck_with_cards(service: &CardService, count: usize) -> Deck {
        let deck = service
            .create_deck(CreateDeckRequest {
                name: "test deck".to_string(),
                description: None,
            })
            .await
            .unwrap();
        for i in 0..count {
            service
                .create_card(CreateCardRequest {
                    deck_id: deck.id,
                    question: format!("question {i}"),
                    answer: format!("answer {i}"),
                })
                .await
                .unwrap();
        }
        deck
    }

    #[tokio::test]
    async fn test_card_crud() {
        let (_dir, service) = create_test_service().await;
        let deck = deck_with_cards(&service, 0).await;

        let card = service
            .create_card(CreateCardRequest {
                deck_id: deck.id,
                question: "What is ownership?".to_string(),
                answer: "A set of move semantics rules".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(card.interval, 0);

        let fetched = service.get_card(card.id).await.unwrap().unwrap();
        assert_eq!(fetched.question, "What is ownership?");

        let updated = service
            .update_card(
                card.id,
                UpdateCardRequest {
                    question: None,
                    answer: Some("Move semantics plus borrowing".to_string()),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.question, "What is ownership?");
        assert_eq!(updated.answer, "Move semantics plus borrowing");

        assert!(service.delete_card(card.id).await.unwrap());
        assert!(service.get_card(card.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_card_operations() {
        let (_dir, service) = create_test_service().await;
        let missing = Uuid::new_v4();

        assert!(service.get_card(missing).await.unwrap().is_none());
        assert!(
            service
                .update_card(
                    missing,
                    UpdateCardRequest {
                        question: Some("x".to_string()),
                        answer: None
                    }
                )
                .await
                .unwrap()
                .is_none()
        );
        assert!(!service.delete_card(missing).await.unwrap());
        assert!(service.answer_card(missing, "good").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_learn_queue_caps_new_cards_from_settings() {
        let (_dir, service) = create_test_service().await;
        let deck = deck_with_cards(&service, 25).await;

        // Default cap of 20 over 25 fresh cards.
        let queue = service.learn_queue(deck.id).await.unwrap();
        assert_eq!(queue.total_cards_in_queue, 20);
        assert_eq!(queue.new_cards_in_queue, 20);
        assert_eq!(queue.review_cards_in_queue, 0);

        // Lowering the cap takes effect on the next call.
        service
            .update_settings(SettingsUpdate {
                new_cards_per_day: Some(4),
                ..Default::default()
            })
            .await
            .unwrap();
        let queue = service.learn_queue(deck.id).await.unwrap();
        assert_eq!(queue.total_cards_in_queue, 4);
        assert_eq!(queue.new_cards_in_queue, 4);
    }

    #[tokio::test]
    async fn test_learn_queue_scoped_to_deck() {
        let (_dir, service) = create_test_service().await;
        let deck = deck_with_cards(&service, 3).await;
        let _other = deck_with_cards(&service, 5).await;

        let queue = service.learn_queue(deck.id).await.unwrap();
        assert_eq!(queue.total_cards_in_queue, 3);
        assert!(queue.learn_queue.iter().all(|c| c.deck_id == deck.id));
    }

    #[tokio::test]
    async fn test_answer_card_persists_transition() {
        let (_dir, service) = create_test_service().await;
        let deck = deck_with_cards(&service, 1).await;
        let card = service.list_cards(Some(deck.id)).await.unwrap().remove(0);

        let rated = service.answer_card(card.id, "good").await.unwrap().unwrap();
        assert_eq!(rated.interval, 1);

        // The transition survived the round trip through the store.
        let stored = service.get_card(card.id).await.unwrap().unwrap();
        assert_eq!(stored.interval, 1);

        let rated = service.answer_card(card.id, "easy").await.unwrap().unwrap();
        assert_eq!(rated.interval, 4);

        let rated = service.answer_card(card.id, "again").await.unwrap().unwrap();
        assert_eq!(rated.interval, 0);
    }

    #[tokio::test]
    async fn test_answer_card_unknown_rating_is_noop() {
        let (_dir, service) = create_test_service().await;
        let deck = deck_with_cards(&service, 1).await;
        let card = service.list_cards(Some(deck.id)).await.unwrap().remove(0);

        let result = service.answer_card(card.id, "superb").await.unwrap().unwrap();
        assert_eq!(result.interval, card.interval);
        assert_eq!(result.due_date, card.due_date);

        let stored = service.get_card(card.id).await.unwrap().unwrap();
        assert_eq!(stored.interval, 0);
    }

    #[tokio::test]
    async fn test_deck_stats_over_mixed_deck() {
        let (_dir, service) = create_test_service().await;
        let deck = deck_with_cards(&service, 2).await;

        let card = service.list_cards(Some(deck.id)).await.unwrap().remove(0);
        // good (1) -> easy (4) -> easy (16) -> good (32): mature.
        for rating in ["good", "easy", "easy", "good"] {
            service.answer_card(card.id, rating).await.unwrap();
        }

        let stats = service.deck_stats(deck.id).await.unwrap();
        assert_eq!(stats.total_cards, 2);
        assert_eq!(stats.to_learn_count, 1);
        assert_eq!(stats.learning_count, 0);
        assert_eq!(stats.mastered_count, 1);
    }

    #[tokio::test]
    async fn test_empty_deck_yields_empty_results() {
        let (_dir, service) = create_test_service().await;
        let deck = deck_with_cards(&service, 0).await;

        let queue = service.learn_queue(deck.id).await.unwrap();
        assert_eq!(queue.total_cards_in_queue, 0);

        let stats = service.deck_stats(deck.id).await.unwrap();
        assert_eq!(stats.total_cards, 0);

        let quiz = service
            .build_quiz(Some(deck.id), None, QuizMode::MultipleChoice)
            .await
            .unwrap();
        assert!(quiz.is_empty());
    }

    #[tokio::test]
    async fn test_import_cards() {
        let (_dir, service) = create_test_service().await;
        let deck = deck_with_cards(&service, 0).await;

        let imported = service
            .import_cards(
                deck.id,
                vec![
                    CardContent {
                        question: "Q1".to_string(),
                        answer: "A1".to_string(),
                    },
                    CardContent {
                        question: "Q2".to_string(),
                        answer: "A2".to_string(),
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(imported.len(), 2);
        assert!(imported.iter().all(|c| c.interval == 0));
        assert_eq!(service.list_cards(Some(deck.id)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_build_quiz_count_falls_back_to_settings() {
        let (_dir, service) = create_test_service().await;
        let deck = deck_with_cards(&service, 15).await;

        // Default quiz_questions is 10.
        let quiz = service
            .build_quiz(Some(deck.id), None, QuizMode::LongAnswer)
            .await
            .unwrap();
        assert_eq!(quiz.len(), 10);

        let quiz = service
            .build_quiz(Some(deck.id), Some(3), QuizMode::LongAnswer)
            .await
            .unwrap();
        assert_eq!(quiz.len(), 3);
    }
}
