use axum::http::StatusCode;
use axum_test::TestServer;
use flashdeck::{CardService, JsonStore, LLMService, api::*};
use serde_json::{Value, json};
use uuid::Uuid;

async fn create_test_server() -> (TestServer, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::new(dir.path()).await.unwrap();
    let card_service = CardService::new(store);
    let llm_service = LLMService::new("test_key".to_string(), None);
    let app_state = AppState {
        card_service,
        llm_service,
    };

    let app = create_router(app_state);
    (TestServer::new(app).unwrap(), dir)
}

async fn create_deck(server: &TestServer, name: &str) -> String {
    let response = server
        .post("/api/decks")
        .json(&json!({ "name": name, "description": null }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn create_card(server: &TestServer, deck_id: &str, question: &str, answer: &str) -> Value {
    let response = server
        .post("/api/cards")
        .json(&json!({
            "deck_id": deck_id,
            "question": question,
            "answer": answer
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["data"].clone()
}

#[tokio::test]
async fn test_api_create_and_list_decks() {
    let (server, _dir) = create_test_server().await;

    let response = server
        .post("/api/decks")
        .json(&json!({ "name": "Rust", "description": "Language deck" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Rust");

    let response = server.get("/api/decks").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_api_create_card_starts_new_and_due() {
    let (server, _dir) = create_test_server().await;
    let deck_id = create_deck(&server, "Basics").await;

    let card = create_card(&server, &deck_id, "What is a slice?", "A view into a sequence").await;
    assert_eq!(card["interval"], 0);
    assert!(card["due_date"].is_string());
    assert_eq!(card["deck_id"], Value::String(deck_id.clone()));

    let response = server.get(&format!("/api/decks/{}/cards", deck_id)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_api_get_card_not_found() {
    let (server, _dir) = create_test_server().await;

    let response = server.get(&format!("/api/cards/{}", Uuid::new_v4())).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_api_update_card_content() {
    let (server, _dir) = create_test_server().await;
    let deck_id = create_deck(&server, "Edit me").await;
    let card = create_card(&server, &deck_id, "Old question", "Old answer").await;
    let card_id = card["id"].as_str().unwrap();

    let response = server
        .put(&format!("/api/cards/{}", card_id))
        .json(&json!({ "question": null, "answer": "New answer" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["question"], "Old question");
    assert_eq!(body["data"]["answer"], "New answer");

    let response = server
        .put(&format!("/api/cards/{}", Uuid::new_v4()))
        .json(&json!({ "question": "x", "answer": null }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_delete_card() {
    let (server, _dir) = create_test_server().await;
    let deck_id = create_deck(&server, "Trash").await;
    let card = create_card(&server, &deck_id, "Q", "A").await;
    let card_id = card["id"].as_str().unwrap();

    let response = server.delete(&format!("/api/cards/{}", card_id)).await;
    response.assert_status_ok();

    let response = server.get(&format!("/api/cards/{}", card_id)).await;
    response.assert_status(StatusCode::NOT_FOUND);

    // Deleting again is a 404, not a silent success.
    let response = server.delete(&format!("/api/cards/{}", card_id)).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_import_cards() {
    let (server, _dir) = create_test_server().await;
    let deck_id = create_deck(&server, "Imported").await;

    let response = server
        .post("/api/cards/import")
        .add_query_param("deck_id", &deck_id)
        .json(&json!([
            { "question": "Q1", "answer": "A1" },
            { "question": "Q2", "answer": "A2" },
            { "question": "Q3", "answer": "A3" }
        ]))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["message"], "3 cards imported successfully");

    let response = server.get(&format!("/api/decks/{}/cards", deck_id)).await;
    let body: Value = response.json();
    let cards = body["data"].as_array().unwrap();
    assert_eq!(cards.len(), 3);
    assert!(cards.iter().all(|c| c["interval"] == 0));
}

#[tokio::test]
async fn test_api_learn_data_requires_deck_id() {
    let (server, _dir) = create_test_server().await;

    let response = server.get("/api/learn/data").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_api_learn_data_shape() {
    let (server, _dir) = create_test_server().await;
    let deck_id = create_deck(&server, "Study").await;
    for i in 0..3 {
        create_card(&server, &deck_id, &format!("Q{i}"), &format!("A{i}")).await;
    }

    let response = server
        .get("/api/learn/data")
        .add_query_param("deck_id", &deck_id)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let data = &body["data"];
    assert_eq!(data["total_cards_in_queue"], 3);
    assert_eq!(data["new_cards_in_queue"], 3);
    assert_eq!(data["review_cards_in_queue"], 0);
    assert_eq!(data["learn_queue"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_api_answer_card_transitions() {
    let (server, _dir) = create_test_server().await;
    let deck_id = create_deck(&server, "Review").await;
    let card = create_card(&server, &deck_id, "Q", "A").await;
    let card_id = card["id"].as_str().unwrap();

    let response = server
        .post(&format!("/api/learn/cards/{}/answer", card_id))
        .json(&json!({ "rating": "good" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["interval"], 1);

    let response = server
        .post(&format!("/api/learn/cards/{}/answer", card_id))
        .json(&json!({ "rating": "easy" }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"]["interval"], 4);

    let response = server
        .post(&format!("/api/learn/cards/{}/answer", card_id))
        .json(&json!({ "rating": "again" }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"]["interval"], 0);
}

#[tokio::test]
async fn test_api_answer_card_unknown_rating_is_noop() {
    let (server, _dir) = create_test_server().await;
    let deck_id = create_deck(&server, "Review").await;
    let card = create_card(&server, &deck_id, "Q", "A").await;
    let card_id = card["id"].as_str().unwrap();

    let response = server
        .post(&format!("/api/learn/cards/{}/answer", card_id))
        .json(&json!({ "rating": "fantastic" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["interval"], 0);
    assert_eq!(body["data"]["due_date"], card["due_date"]);
}

#[tokio::test]
async fn test_api_answer_card_not_found() {
    let (server, _dir) = create_test_server().await;

    let response = server
        .post(&format!("/api/learn/cards/{}/answer", Uuid::new_v4()))
        .json(&json!({ "rating": "good" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_deck_stats() {
    let (server, _dir) = create_test_server().await;
    let deck_id = create_deck(&server, "Stats").await;
    for i in 0..4 {
        create_card(&server, &deck_id, &format!("Q{i}"), &format!("A{i}")).await;
    }

    let response = server.get(&format!("/api/decks/{}/stats", deck_id)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["total_cards"], 4);
    assert_eq!(body["data"]["to_learn_count"], 4);
    assert_eq!(body["data"]["learning_count"], 0);
    assert_eq!(body["data"]["mastered_count"], 0);
}

#[tokio::test]
async fn test_api_settings_roundtrip() {
    let (server, _dir) = create_test_server().await;

    let response = server.get("/api/settings").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["new_cards_per_day"], 20);
    assert_eq!(body["data"]["quiz_questions"], 10);

    let response = server
        .post("/api/settings")
        .json(&json!({ "new_cards_per_day": 7 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["new_cards_per_day"], 7);
    assert_eq!(body["data"]["quiz_questions"], 10);

    let response = server.get("/api/settings").await;
    let body: Value = response.json();
    assert_eq!(body["data"]["new_cards_per_day"], 7);
}

#[tokio::test]
async fn test_api_quiz_long_answer() {
    let (server, _dir) = create_test_server().await;
    let deck_id = create_deck(&server, "Quiz").await;
    for i in 0..5 {
        create_card(&server, &deck_id, &format!("Q{i}"), &format!("A{i}")).await;
    }

    let response = server
        .get("/api/quiz")
        .add_query_param("deck_id", &deck_id)
        .add_query_param("num_questions", "3")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let questions = body["data"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    for q in questions {
        assert!(q["question"].is_string());
        assert!(q["answer"].is_string());
        assert!(q.get("options").is_none() || q["options"].is_null());
    }
}

#[tokio::test]
async fn test_api_quiz_multiple_choice() {
    let (server, _dir) = create_test_server().await;
    let deck_id = create_deck(&server, "Quiz").await;
    for i in 0..6 {
        create_card(&server, &deck_id, &format!("Q{i}"), &format!("A{i}")).await;
    }

    let response = server
        .get("/api/quiz")
        .add_query_param("deck_id", &deck_id)
        .add_query_param("quiz_type", "multiple-choice")
        .add_query_param("num_questions", "4")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let questions = body["data"].as_array().unwrap();
    assert_eq!(questions.len(), 4);
    for q in questions {
        let options = q["options"].as_array().unwrap();
        assert_eq!(options.len(), 4);
        let answer = q["answer"].as_str().unwrap();
        let hits = options.iter().filter(|o| o.as_str() == Some(answer)).count();
        assert_eq!(hits, 1);
    }
}

#[tokio::test]
async fn test_api_quiz_defaults_to_settings_count() {
    let (server, _dir) = create_test_server().await;
    let deck_id = create_deck(&server, "Quiz").await;
    for i in 0..15 {
        create_card(&server, &deck_id, &format!("Q{i}"), &format!("A{i}")).await;
    }

    let response = server
        .get("/api/quiz")
        .add_query_param("deck_id", &deck_id)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_api_generate_quiz_requires_cards() {
    let (server, _dir) = create_test_server().await;
    let deck_id = create_deck(&server, "Empty").await;

    // The empty-deck check fires before any provider call is made.
    let response = server
        .get("/api/generate-quiz-from-flashcards")
        .add_query_param("deck_id", &deck_id)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
