use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Card, Deck, SettingsUpdate, StudySettings};

const CARDS_FILE: &str = "cards.json";
const DECKS_FILE: &str = "decks.json";
const CONFIG_FILE: &str = "config.json";

/// Flat-JSON document store. Each collection lives in one file under the
/// data directory and is read and written whole.
///
/// Every mutating method performs its load-modify-save cycle while holding
/// `write_lock`, so concurrent requests cannot interleave partial writes to
/// the same file set. Reads outside the lock see the last complete write.
#[derive(Clone)]
pub struct JsonStore {
    dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonStore {
    pub async fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create data directory {}", dir.display()))?;
        debug!(data_dir = %dir.display(), "JSON store opened");
        Ok(Self {
            dir,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    async fn read_collection<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>> {
        let path = self.dir.join(file);
        match fs::read(&path).await {
            Ok(bytes) => {
                let value = serde_json::from_slice(&bytes)
                    .with_context(|| format!("failed to parse {}", path.display()))?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(anyhow::Error::from(e).context(format!("failed to read {}", path.display())))
            }
        }
    }

    async fn write_collection<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.dir.join(file);
        let body = serde_json::to_vec_pretty(value)?;
        fs::write(&path, body)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    // Card operations

    /// Load all cards, optionally restricted to one deck. A missing file is
    /// an empty collection, not an error.
    pub async fn load_cards(&self, deck_id: Option<Uuid>) -> Result<Vec<Card>> {
        let cards: Vec<Card> = self.read_collection(CARDS_FILE).await?.unwrap_or_default();
        Ok(match deck_id {
            Some(deck_id) => cards.into_iter().filter(|c| c.deck_id == deck_id).collect(),
            None => cards,
        })
    }

    pub async fn get_card(&self, id: Uuid) -> Result<Option<Card>> {
        let cards: Vec<Card> = self.read_collection(CARDS_FILE).await?.unwrap_or_default();
        Ok(cards.into_iter().find(|c| c.id == id))
    }

    pub async fn insert_cards(&self, new_cards: &[Card]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut cards: Vec<Card> = self.read_collection(CARDS_FILE).await?.unwrap_or_default();
        cards.extend_from_slice(new_cards);
        self.write_collection(CARDS_FILE, &cards).await?;
        debug!(count = new_cards.len(), total = cards.len(), "cards inserted");
        Ok(())
    }

    /// Replace the stored card with the same id, or append it if absent.
    pub async fn upsert_card(&self, card: &Card) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut cards: Vec<Card> = self.read_collection(CARDS_FILE).await?.unwrap_or_default();
        match cards.iter_mut().find(|c| c.id == card.id) {
            Some(existing) => *existing = card.clone(),
            None => cards.push(card.clone()),
        }
        self.write_collection(CARDS_FILE, &cards).await
    }

    /// Remove a card by id; returns whether anything was deleted.
    pub async fn delete_card(&self, id: Uuid) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut cards: Vec<Card> = self.read_collection(CARDS_FILE).await?.unwrap_or_default();
        let before = cards.len();
        cards.retain(|c| c.id != id);
        if cards.len() == before {
            return Ok(false);
        }
        self.write_collection(CARDS_FILE, &cards).await?;
        Ok(true)
    }

    // Deck operations

    pub async fn load_decks(&self) -> Result<Vec<Deck>> {
        Ok(self.read_collection(DECKS_FILE).await?.unwrap_or_default())
    }

    pub async fn insert_deck(&self, deck: &Deck) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut decks: Vec<Deck> = self.read_collection(DECKS_FILE).await?.unwrap_or_default();
        decks.push(deck.clone());
        self.write_collection(DECKS_FILE, &decks).await
    }

    // Settings operations

    /// Settings are read fresh on every call site; nothing caches them.
    pub async fn load_settings(&self) -> Result<StudySettings> {
        Ok(self.read_collection(CONFIG_FILE).await?.unwrap_or_default())
    }

    /// Merge a partial update into the stored settings and persist the
    /// result, all under the writer lock.
    pub async fn update_settings(&self, update: SettingsUpdate) -> Result<StudySettings> {
        let _guard = self.write_lock.lock().await;
        let mut settings: StudySettings =
            self.read_collection(CONFIG_FILE).await?.unwrap_or_default();

        if let Some(new_cards_per_day) = update.new_cards_per_day {
            settings.new_cards_per_day = new_cards_per_day;
        }
        if let Some(quiz_questions) = update.quiz_questions {
            settings.quiz_questions = quiz_questions;
        }
        if let Some(question_language) = update.question_language {
            settings.question_language = question_language;
        }
        if let Some(answer_language) = update.answer_language {
            settings.answer_language = answer_language;
        }

        self.write_collection(CONFIG_FILE, &settings).await?;
        Ok(settings)
    }
}
