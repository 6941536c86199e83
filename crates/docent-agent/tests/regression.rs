//! Regression tests for docent-agent: ModelConfig, ContextWindow, evaluation
//! parsing, and the Tutor facade against a mock completion server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use docent_agent::{
    parse_evaluation, ContextWindow, LlmClient, LlmProvider, ModelConfig, Tutor,
};
use docent_core::{DocentError, Message, Role};
use docent_memory::{
    Chunker, DocumentIndex, IndexState, InMemoryVectorStore, LocalEmbedding, RetrievalConfig,
    RetrievalEngine,
};
use docent_session::InMemorySessionStore;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// --- ModelConfig & LlmProvider ---

#[test]
fn test_llm_provider_serialization() {
    for (provider, expected) in [
        (LlmProvider::OpenAi, "\"openai\""),
        (LlmProvider::OpenRouter, "\"openrouter\""),
        (LlmProvider::Groq, "\"groq\""),
    ] {
        let json = serde_json::to_string(&provider).unwrap();
        assert_eq!(json, expected);
        let back: LlmProvider = serde_json::from_str(&json).unwrap();
        assert_eq!(serde_json::to_string(&back).unwrap(), expected);
    }
}

#[test]
fn test_model_config_base_url_defaults() {
    let mut config = ModelConfig::default();
    assert_eq!(config.base_url(), "https://api.groq.com/openai");

    config.provider = LlmProvider::OpenAi;
    assert_eq!(config.base_url(), "https://api.openai.com");

    config.provider = LlmProvider::OpenRouter;
    assert_eq!(config.base_url(), "https://openrouter.ai/api");

    config.api_base_url = Some("http://localhost:8080".to_string());
    assert_eq!(config.base_url(), "http://localhost:8080");
}

#[test]
fn test_model_config_deserialization_with_defaults() {
    let config: ModelConfig = toml::from_str(
        r#"
        provider = "openai"
        model_id = "gpt-4o-mini"
        api_key = "sk-test"
    "#,
    )
    .unwrap();

    assert!(matches!(config.provider, LlmProvider::OpenAi));
    assert_eq!(config.model_id, "gpt-4o-mini");
    assert_eq!(config.timeout_secs, 30);
    assert!(config.api_base_url.is_none());
    assert_eq!(config.resolved_api_key(), "sk-test");
}

#[test]
fn test_model_config_empty_toml_is_groq_default() {
    let config: ModelConfig = toml::from_str("").unwrap();
    assert!(matches!(config.provider, LlmProvider::Groq));
    assert_eq!(config.model_id, "llama-3.3-70b-versatile");
}

// --- ContextWindow ---

#[test]
fn test_context_window_keeps_newest_messages() {
    let history: Vec<Message> = (0..10).map(|i| Message::user(format!("m{i}"))).collect();
    let mut ctx = ContextWindow::from_history(4, &history);
    ctx.set_system_prompt("be brief");

    let request = ctx.into_request("latest", 100, 0.5);
    assert_eq!(request.messages.len(), 5);
    assert_eq!(request.messages[0].content, "m6");
    assert_eq!(request.messages[4].role, Role::User);
    assert_eq!(request.messages[4].content, "latest");
    assert_eq!(request.system_prompt.as_deref(), Some("be brief"));
}

// --- Evaluation parsing ---

#[test]
fn test_parse_evaluation_free_form_reply() {
    let eval = parse_evaluation(
        "I'd give this 12 out of 10! Great job naming the organelle.",
        "Chloroplasts hold chlorophyll.",
    );
    assert_eq!(eval.score, 10);
    assert!(!eval.correct_points.is_empty());
    assert!(eval.improved_answer.contains("Chloroplasts hold chlorophyll."));
}

// --- Tutor end-to-end ---

async fn mock_completion(content: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })))
        .mount(&server)
        .await;
    server
}

fn tutor(server: &MockServer) -> Tutor {
    let config = ModelConfig {
        api_key: "gsk-test".to_string(),
        api_base_url: Some(server.uri()),
        timeout_secs: 5,
        ..ModelConfig::default()
    };
    let index = Arc::new(DocumentIndex::new(Arc::new(InMemoryVectorStore::new()), 128));
    let retrieval = Arc::new(RetrievalEngine::new(
        Arc::new(LocalEmbedding::new(128)),
        index,
        Chunker::new(120, 20),
        Duration::from_secs(5),
    ));
    Tutor::new(
        retrieval,
        Arc::new(InMemorySessionStore::new()),
        Arc::new(LlmClient::new(config)),
        RetrievalConfig::default(),
    )
}

const NOTES: &str = "The water cycle moves water between oceans, air and land.\n\n\
    Evaporation turns liquid water into vapour when the sun heats the ocean.\n\n\
    Condensation forms clouds as vapour cools high in the atmosphere.";

#[tokio::test]
async fn test_tutor_document_chat() {
    let server = mock_completion("Evaporation is water turning into vapour.").await;
    let tutor = tutor(&server);

    let err = tutor.chat("what is evaporation?").await.unwrap_err();
    assert!(matches!(err, DocentError::NotReady(_)));

    let status = tutor.upload("notes.txt", NOTES.as_bytes().to_vec()).await.unwrap();
    assert_eq!(status.name, "notes.txt");
    assert!(matches!(tutor.status().await, IndexState::Ready(_)));

    let reply = tutor.chat("what is evaporation?").await.unwrap();
    assert_eq!(reply.response, "Evaporation is water turning into vapour.");
    assert!(!reply.sources.is_empty());

    tutor.clear().await.unwrap();
    assert_eq!(tutor.status().await, IndexState::NotReady);
}

#[tokio::test]
async fn test_tutor_session_evaluation() {
    let server = mock_completion(
        "SCORE: 8\n\nCORRECT POINTS:\n- Named evaporation\n\nMISSING POINTS:\n- Did not mention the sun\n\nIMPROVED ANSWER:\nThe sun heats the ocean and water evaporates.",
    )
    .await;
    let tutor = tutor(&server);
    tutor.upload("notes.txt", NOTES.as_bytes().to_vec()).await.unwrap();

    let feedback = tutor
        .evaluate_answer("How does water reach the air?", "It evaporates", Some("learner-1"))
        .await
        .unwrap();
    assert_eq!(feedback.evaluation.score, 8);
    assert!(feedback.is_correct);
    assert_eq!(feedback.evaluation.correct_points, vec!["Named evaporation"]);

    let progress = tutor.progress("learner-1").await.unwrap();
    assert_eq!(progress.questions_asked, 1);
    assert_eq!(progress.correct_answers, 1);

    let json = serde_json::to_value(&feedback).unwrap();
    assert_eq!(json["score"], 8);
    assert_eq!(json["is_correct"], true);
    assert_eq!(json["session_info"]["questions_asked"], 1);
}

#[tokio::test]
async fn test_tutor_degrades_when_provider_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let tutor = tutor(&server);

    let reply = tutor.converse("learner-2", "tell me about clouds").await.unwrap();
    assert!(!reply.response.is_empty());
    assert!(reply.session.current_topic.is_none());

    let practice = tutor.practice_question("learner-2", None).await.unwrap();
    assert_eq!(practice.topic, "general knowledge");
    assert!(practice.question.contains("general knowledge"));
}
