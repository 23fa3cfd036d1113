use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    card_service::CardService,
    errors::{ApiError, ErrorContext},
    llm_service::LLMService,
    models::{
        Card, CardContent, CreateCardRequest, CreateDeckRequest, Deck, SettingsUpdate,
        StudySettings, UpdateCardRequest,
    },
    quiz::{QuizMode, QuizQuestion},
    scheduler::{DeckStats, LearnQueue},
};

// Import logging macros
use crate::{log_api_start, log_api_success, log_api_warn};

#[derive(Clone)]
pub struct AppState {
    pub card_service: CardService,
    pub llm_service: LLMService,
}

#[derive(Deserialize)]
pub struct AnswerRequest {
    pub rating: String,
}

#[derive(Deserialize)]
pub struct ImportParams {
    pub deck_id: Uuid,
}

#[derive(Deserialize)]
pub struct LearnParams {
    pub deck_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct QuizParams {
    pub deck_id: Option<Uuid>,
    pub quiz_type: Option<String>,
    pub num_questions: Option<usize>,
}

#[derive(Deserialize)]
pub struct GenerateQuizParams {
    pub deck_id: Option<Uuid>,
    pub quiz_type: Option<String>,
}

#[derive(Deserialize)]
pub struct GenerateCardsRequest {
    pub topic: String,
    pub deck_id: Uuid,
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<()>>)>;

fn quiz_mode(param: Option<&str>) -> QuizMode {
    param.map(QuizMode::parse).unwrap_or_default()
}

// Deck endpoints

pub async fn get_decks(State(state): State<AppState>) -> ApiResult<Vec<Deck>> {
    debug!("Getting all decks");

    match state.card_service.list_decks().await {
        Ok(decks) => Ok(Json(ApiResponse::success(decks))),
        Err(e) => {
            let context = ErrorContext::new("get_decks", "deck");
            Err(ApiError::StoreError(e).to_response_with_context(context))
        }
    }
}

pub async fn create_deck(
    State(state): State<AppState>,
    Json(request): Json<CreateDeckRequest>,
) -> ApiResult<Deck> {
    info!(name = %request.name, "Creating new deck");

    match state.card_service.create_deck(request).await {
        Ok(deck) => Ok(Json(ApiResponse::success(deck))),
        Err(e) => {
            let context = ErrorContext::new("create_deck", "deck");
            Err(ApiError::StoreError(e).to_response_with_context(context))
        }
    }
}

pub async fn get_deck_cards(
    State(state): State<AppState>,
    Path(deck_id): Path<Uuid>,
) -> ApiResult<Vec<Card>> {
    log_api_start!("get_deck_cards", deck_id = deck_id);

    match state.card_service.list_cards(Some(deck_id)).await {
        Ok(cards) => {
            log_api_success!("get_deck_cards", count = cards.len(), "deck cards retrieved");
            Ok(Json(ApiResponse::success(cards)))
        }
        Err(e) => {
            let context =
                ErrorContext::new("get_deck_cards", "deck").with_id(&deck_id.to_string());
            Err(ApiError::StoreError(e).to_response_with_context(context))
        }
    }
}

pub async fn get_deck_stats(
    State(state): State<AppState>,
    Path(deck_id): Path<Uuid>,
) -> ApiResult<DeckStats> {
    log_api_start!("get_deck_stats", deck_id = deck_id);

    match state.card_service.deck_stats(deck_id).await {
        Ok(stats) => Ok(Json(ApiResponse::success(stats))),
        Err(e) => {
            let context =
                ErrorContext::new("get_deck_stats", "deck").with_id(&deck_id.to_string());
            Err(ApiError::StoreError(e).to_response_with_context(context))
        }
    }
}

// Card endpoints

pub async fn create_card(
    State(state): State<AppState>,
    Json(request): Json<CreateCardRequest>,
) -> ApiResult<Card> {
    log_api_start!("create_card", deck_id = request.deck_id);

    match state.card_service.create_card(request).await {
        Ok(card) => {
            log_api_success!("create_card", card_id = card.id, "card created");
            Ok(Json(ApiResponse::success(card)))
        }
        Err(e) => {
            let context = ErrorContext::new("create_card", "card");
            Err(ApiError::StoreError(e).to_response_with_context(context))
        }
    }
}

pub async fn get_card(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Card> {
    log_api_start!("get_card", card_id = id);

    match state.card_service.get_card(id).await {
        Ok(Some(card)) => Ok(Json(ApiResponse::success(card))),
        Ok(None) => {
            log_api_warn!("get_card", card_id = id, "card not found");
            let error = ApiError::NotFound(format!("Card with ID '{}' not found", id));
            let context = ErrorContext::new("get_card", "card").with_id(&id.to_string());
            Err(error.to_response_with_context(context))
        }
        Err(e) => {
            let context = ErrorContext::new("get_card", "card").with_id(&id.to_string());
            Err(ApiError::StoreError(e).to_response_with_context(context))
        }
    }
}

pub async fn update_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCardRequest>,
) -> ApiResult<Card> {
    log_api_start!("update_card", card_id = id);

    match state.card_service.update_card(id, request).await {
        Ok(Some(card)) => {
            log_api_success!("update_card", card_id = id, "card updated");
            Ok(Json(ApiResponse::success(card)))
        }
        Ok(None) => {
            let error = ApiError::NotFound(format!("Card with ID '{}' not found", id));
            let context = ErrorContext::new("update_card", "card").with_id(&id.to_string());
            Err(error.to_response_with_context(context))
        }
        Err(e) => {
            let context = ErrorContext::new("update_card", "card").with_id(&id.to_string());
            Err(ApiError::StoreError(e).to_response_with_context(context))
        }
    }
}

pub async fn delete_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    log_api_start!("delete_card", card_id = id);

    match state.card_service.delete_card(id).await {
        Ok(true) => {
            log_api_success!("delete_card", card_id = id, "card deleted");
            Ok(Json(ApiResponse::success(json!({"message": "Card deleted"}))))
        }
        Ok(false) => {
            let error = ApiError::NotFound(format!("Card with ID '{}' not found", id));
            let context = ErrorContext::new("delete_card", "card").with_id(&id.to_string());
            Err(error.to_response_with_context(context))
        }
        Err(e) => {
            let context = ErrorContext::new("delete_card", "card").with_id(&id.to_string());
            Err(ApiError::StoreError(e).to_response_with_context(context))
        }
    }
}

pub async fn import_cards(
    State(state): State<AppState>,
    Query(params): Query<ImportParams>,
    Json(entries): Json<Vec<CardContent>>,
) -> ApiResult<serde_json::Value> {
    log_api_start!("import_cards", deck_id = params.deck_id);

    match state.card_service.import_cards(params.deck_id, entries).await {
        Ok(cards) => {
            log_api_success!("import_cards", count = cards.len(), "cards imported");
            Ok(Json(ApiResponse::success(json!({
                "message": format!("{} cards imported successfully", cards.len())
            }))))
        }
        Err(e) => {
            let context =
                ErrorContext::new("import_cards", "deck").with_id(&params.deck_id.to_string());
            Err(ApiError::StoreError(e).to_response_with_context(context))
        }
    }
}

// Learning endpoints

pub async fn get_learn_data(
    State(state): State<AppState>,
    Query(params): Query<LearnParams>,
) -> ApiResult<LearnQueue> {
    let Some(deck_id) = params.deck_id else {
        log_api_warn!("get_learn_data", "deck_id missing");
        let error = ApiError::BadRequest("Deck ID is required for learning data".to_string());
        let context = ErrorContext::new("get_learn_data", "deck");
        return Err(error.to_response_with_context(context));
    };

    log_api_start!("get_learn_data", deck_id = deck_id);

    match state.card_service.learn_queue(deck_id).await {
        Ok(queue) => {
            log_api_success!(
                "get_learn_data",
                count = queue.total_cards_in_queue,
                "learn queue built"
            );
            Ok(Json(ApiResponse::success(queue)))
        }
        Err(e) => {
            let context =
                ErrorContext::new("get_learn_data", "deck").with_id(&deck_id.to_string());
            Err(ApiError::StoreError(e).to_response_with_context(context))
        }
    }
}

pub async fn answer_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AnswerRequest>,
) -> ApiResult<Card> {
    log_api_start!("answer_card", card_id = id);

    match state.card_service.answer_card(id, &request.rating).await {
        Ok(Some(card)) => {
            log_api_success!("answer_card", card_id = id, "rating applied");
            Ok(Json(ApiResponse::success(card)))
        }
        Ok(None) => {
            let error = ApiError::NotFound(format!("Card with ID '{}' not found", id));
            let context = ErrorContext::new("answer_card", "card").with_id(&id.to_string());
            Err(error.to_response_with_context(context))
        }
        Err(e) => {
            let context = ErrorContext::new("answer_card", "card").with_id(&id.to_string());
            Err(ApiError::StoreError(e).to_response_with_context(context))
        }
    }
}

// Quiz endpoints

pub async fn get_quiz(
    State(state): State<AppState>,
    Query(params): Query<QuizParams>,
) -> ApiResult<Vec<QuizQuestion>> {
    log_api_start!("get_quiz");

    let mode = quiz_mode(params.quiz_type.as_deref());
    match state
        .card_service
        .build_quiz(params.deck_id, params.num_questions, mode)
        .await
    {
        Ok(questions) => {
            log_api_success!("get_quiz", count = questions.len(), "quiz sampled");
            Ok(Json(ApiResponse::success(questions)))
        }
        Err(e) => {
            let context = ErrorContext::new("get_quiz", "quiz");
            Err(ApiError::StoreError(e).to_response_with_context(context))
        }
    }
}

// Settings endpoints

pub async fn get_settings(State(state): State<AppState>) -> ApiResult<StudySettings> {
    debug!("Getting study settings");

    match state.card_service.settings().await {
        Ok(settings) => Ok(Json(ApiResponse::success(settings))),
        Err(e) => {
            let context = ErrorContext::new("get_settings", "settings");
            Err(ApiError::StoreError(e).to_response_with_context(context))
        }
    }
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> ApiResult<StudySettings> {
    info!("Updating study settings");

    match state.card_service.update_settings(update).await {
        Ok(settings) => Ok(Json(ApiResponse::success(settings))),
        Err(e) => {
            let context = ErrorContext::new("update_settings", "settings");
            Err(ApiError::StoreError(e).to_response_with_context(context))
        }
    }
}

// AI generation endpoints

pub async fn generate_cards(
    State(state): State<AppState>,
    Json(request): Json<GenerateCardsRequest>,
) -> ApiResult<Vec<Card>> {
    log_api_start!("generate_cards", deck_id = request.deck_id);

    let contents = match state.llm_service.generate_cards(&request.topic).await {
        Ok(contents) => contents,
        Err(e) => {
            let error = ApiError::LLMError(e.to_string());
            let context = ErrorContext::new("generate_cards", "card");
            return Err(error.to_response_with_context(context));
        }
    };

    match state
        .card_service
        .import_cards(request.deck_id, contents)
        .await
    {
        Ok(cards) => {
            log_api_success!("generate_cards", count = cards.len(), "cards generated");
            Ok(Json(ApiResponse::success(cards)))
        }
        Err(e) => {
            let context =
                ErrorContext::new("generate_cards", "deck").with_id(&request.deck_id.to_string());
            Err(ApiError::StoreError(e).to_response_with_context(context))
        }
    }
}

pub async fn generate_quiz_from_flashcards(
    State(state): State<AppState>,
    Query(params): Query<GenerateQuizParams>,
) -> ApiResult<Vec<QuizQuestion>> {
    log_api_start!("generate_quiz_from_flashcards");

    let cards = match state.card_service.list_cards(params.deck_id).await {
        Ok(cards) => cards,
        Err(e) => {
            let context = ErrorContext::new("generate_quiz_from_flashcards", "deck");
            return Err(ApiError::StoreError(e).to_response_with_context(context));
        }
    };

    if cards.is_empty() {
        let error = ApiError::BadRequest("No flashcards available to build a quiz from".to_string());
        let context = ErrorContext::new("generate_quiz_from_flashcards", "deck");
        return Err(error.to_response_with_context(context));
    }

    let mode = quiz_mode(params.quiz_type.as_deref());
    match state.llm_service.generate_quiz(&cards, mode).await {
        Ok(questions) => {
            log_api_success!(
                "generate_quiz_from_flashcards",
                count = questions.len(),
                "quiz generated"
            );
            Ok(Json(ApiResponse::success(questions)))
        }
        Err(e) => {
            let error = ApiError::LLMError(e.to_string());
            let context = ErrorContext::new("generate_quiz_from_flashcards", "quiz");
            Err(error.to_response_with_context(context))
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Deck management
        .route("/api/decks", get(get_decks))
        .route("/api/decks", post(create_deck))
        .route("/api/decks/:deck_id/cards", get(get_deck_cards))
        .route("/api/decks/:deck_id/stats", get(get_deck_stats))
        // Card management
        .route("/api/cards", post(create_card))
        .route("/api/cards/import", post(import_cards))
        .route("/api/cards/:id", get(get_card))
        .route("/api/cards/:id", put(update_card))
        .route("/api/cards/:id", delete(delete_card))
        // Learning flow
        .route("/api/learn/data", get(get_learn_data))
        .route("/api/learn/cards/:id/answer", post(answer_card))
        // Quizzes
        .route("/api/quiz", get(get_quiz))
        .route(
            "/api/generate-quiz-from-flashcards",
            get(generate_quiz_from_flashcards),
        )
        // Settings and AI generation
        .route("/api/settings", get(get_settings))
        .route("/api/settings", post(update_settings))
        .route("/api/generate-cards", post(generate_cards))
        .with_state(state)
}
