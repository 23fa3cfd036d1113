use flashdeck::config::Config;
use flashdeck::llm_providers::LLMProviderType;
use std::env;

// All environment mutation lives in this single test so parallel test
// threads never race on the same variables.
#[test]
fn test_config_from_env_roundtrip() {
    unsafe {
        env::set_var("DATA_DIR", "/tmp/flashdeck-test-data");
        env::set_var("LLM_API_KEY", "test-api-key");
        env::set_var("LLM_PROVIDER", "openai");
        env::set_var("LLM_MODEL", "gpt-4o-mini");
        env::set_var("PORT", "8099");
        env::set_var("HOST", "127.0.0.1");
        env::set_var("RUST_LOG", "debug");
    }

    let config = Config::from_env().unwrap();
    assert_eq!(config.store.data_dir, "/tmp/flashdeck-test-data");
    assert_eq!(config.llm.api_key, "test-api-key");
    assert_eq!(config.llm.provider, LLMProviderType::OpenAI);
    assert_eq!(config.llm.model.as_deref(), Some("gpt-4o-mini"));
    assert_eq!(config.server.port, 8099);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.logging.level, "debug");

    assert!(config.validate().is_ok());

    unsafe {
        env::remove_var("DATA_DIR");
        env::remove_var("LLM_API_KEY");
        env::remove_var("LLM_PROVIDER");
        env::remove_var("LLM_MODEL");
        env::remove_var("PORT");
        env::remove_var("HOST");
        env::remove_var("RUST_LOG");
    }

    // With everything cleared, the defaults apply and still validate.
    let config = Config::from_env().unwrap();
    assert_eq!(config.store.data_dir, "data");
    assert_eq!(config.server.port, 5001);
    assert_eq!(config.llm.provider, LLMProviderType::Gemini);
    assert!(config.validate().is_ok());
}
