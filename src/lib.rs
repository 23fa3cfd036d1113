pub mod api;
pub mod card_service;
pub mod config;
pub mod errors;
pub mod llm_providers;
pub mod llm_service;
pub mod logging;
pub mod models;
pub mod quiz;
pub mod scheduler;
pub mod store;

pub use card_service::CardService;
pub use config::Config;
pub use errors::*;
pub use llm_providers::{LLMProvider, LLMProviderType};
pub use llm_service::LLMService;
pub use models::*;
pub use quiz::{QuizMode, QuizQuestion};
pub use scheduler::{CardState, DeckStats, LearnQueue, Rating, ReviewScheduler};
pub use store::JsonStore;
