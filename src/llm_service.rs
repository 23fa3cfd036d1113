use anyhow::Result;

use crate::llm_providers::{LLMProvider, LLMProviderType, parse_json_response};
use crate::log_llm_operation;
use crate::models::{Card, CardContent};
use crate::quiz::{QuizMode, QuizQuestion};

/// How many cards one generation request asks for.
const CARDS_PER_GENERATION: usize = 5;
/// How many questions one generated quiz asks for.
const QUESTIONS_PER_GENERATED_QUIZ: usize = 5;

const SYSTEM_MESSAGE: &str =
    "You are a flashcard author. Respond with JSON only, no commentary.";

/// AI-assisted generation of cards and quizzes. The provider returns
/// semi-structured text (JSON, often wrapped in markdown fences); this
/// service owns the prompts and the parsing.
#[derive(Debug, Clone)]
pub struct LLMService {
    provider: LLMProvider,
}

impl LLMService {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self::new_with_provider(api_key, base_url, LLMProviderType::Gemini, None)
    }

    pub fn new_with_provider(
        api_key: String,
        base_url: Option<String>,
        provider_type: LLMProviderType,
        model: Option<String>,
    ) -> Self {
        Self {
            provider: LLMProvider::new(provider_type, api_key, base_url, model),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Generate question/answer pairs about a topic. The caller assigns ids
    /// and scheduling state and persists the result.
    pub async fn generate_cards(&self, topic: &str) -> Result<Vec<CardContent>> {
        log_llm_operation!(start, "generate_cards", provider = self.provider_name());

        let prompt = cards_prompt(topic);
        let response = self.provider.generate(Some(SYSTEM_MESSAGE), &prompt).await;

        match response.and_then(|text| parse_json_response::<Vec<CardContent>>(&text)) {
            Ok(cards) => {
                log_llm_operation!(
                    success,
                    "generate_cards",
                    provider = self.provider_name(),
                    count = cards.len()
                );
                Ok(cards)
            }
            Err(e) => {
                log_llm_operation!(error, "generate_cards", provider = self.provider_name(), error = e);
                Err(e)
            }
        }
    }

    /// Generate an ephemeral quiz from existing flashcards. Nothing is
    /// persisted; the questions go straight back to the caller.
    pub async fn generate_quiz(&self, cards: &[Card], mode: QuizMode) -> Result<Vec<QuizQuestion>> {
        log_llm_operation!(start, "generate_quiz", provider = self.provider_name());

        let pairs: Vec<CardContent> = cards
            .iter()
            .map(|card| CardContent {
                question: card.question.clone(),
                answer: card.answer.clone(),
            })
            .collect();
        let cards_json = serde_json::to_string(&pairs)?;
        let prompt = quiz_prompt(&cards_json, mode);

        let response = self.provider.generate(Some(SYSTEM_MESSAGE), &prompt).await;

        match response.and_then(|text| parse_json_response::<Vec<QuizQuestion>>(&text)) {
            Ok(questions) => {
                log_llm_operation!(
                    success,
                    "generate_quiz",
                    provider = self.provider_name(),
                    count = questions.len()
                );
                Ok(questions)
            }
            Err(e) => {
                log_llm_operation!(error, "generate_quiz", provider = self.provider_name(), error = e);
                Err(e)
            }
        }
    }
}

fn cards_prompt(topic: &str) -> String {
    format!(
        "Generate {} flashcards about {} as a JSON array where each element \
         has 'question' and 'answer' keys.",
        CARDS_PER_GENERATION, topic
    )
}

fn quiz_prompt(cards_json: &str, mode: QuizMode) -> String {
    match mode {
        QuizMode::MultipleChoice => format!(
            "Based on the following flashcards, generate a quiz with {} multiple \
             choice questions as a JSON array. Each question should have \
             'question', 'options' (an array of 4 strings), and 'answer' keys:\n\n{}",
            QUESTIONS_PER_GENERATED_QUIZ, cards_json
        ),
        QuizMode::LongAnswer => format!(
            "Based on the following flashcards, generate a quiz with {} long \
             answer questions as a JSON array where each element has 'question' \
             and 'answer' keys:\n\n{}",
            QUESTIONS_PER_GENERATED_QUIZ, cards_json
        ),
    }
}
