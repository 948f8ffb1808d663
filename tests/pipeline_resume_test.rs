//! 跨进程恢复集成测试：用同一个数据库重建 Pipeline，模拟进程重启

use std::sync::Arc;

use chef::config::AppConfig;
use chef::llm::{LlmError, MockLlmClient};
use chef::memory::{PreferenceSet, Role};
use chef::store::{CheckpointStore, FileCheckpointStore, SqliteCheckpointStore};
use chef::{PipelineBuilder, PipelineError};
use tempfile::TempDir;

async fn sqlite_store(dir: &TempDir) -> Arc<dyn CheckpointStore> {
    Arc::new(
        SqliteCheckpointStore::open(dir.path().join("checkpoints.db"), 10)
            .await
            .unwrap(),
    )
}

#[tokio::test]
async fn test_session_resumes_after_restart() {
    let dir = TempDir::new().unwrap();

    {
        let extractor = Arc::new(MockLlmClient::with_replies([r#"{"skill_level":"beginner"}"#]));
        let generator = Arc::new(MockLlmClient::with_replies(["Start with a simple omelette."]));
        let pipeline = PipelineBuilder::new(AppConfig::default())
            .with_llm(generator)
            .with_extractor_llm(extractor)
            .with_store(sqlite_store(&dir).await)
            .build()
            .await
            .unwrap();
        pipeline
            .process_turn("cooking_session_1", "I just started cooking")
            .await
            .unwrap();
    }

    let extractor = Arc::new(MockLlmClient::with_replies([
        r#"{"skill_level":"advanced","favorite_cuisine":"thai"}"#,
    ]));
    let generator = Arc::new(MockLlmClient::with_replies(["Try a green curry from scratch."]));
    let pipeline = PipelineBuilder::new(AppConfig::default())
        .with_llm(generator.clone())
        .with_extractor_llm(extractor)
        .with_store(sqlite_store(&dir).await)
        .build()
        .await
        .unwrap();

    let outcome = pipeline
        .process_turn("cooking_session_1", "Actually I'm advanced and love thai")
        .await
        .unwrap();

    let expected: PreferenceSet = [("skill_level", "advanced"), ("favorite_cuisine", "thai")]
        .into_iter()
        .collect();
    assert_eq!(outcome.preferences, expected);
    assert_eq!(outcome.reply.content, "Try a green curry from scratch.");

    // 重启后的第一轮 prompt 已经带着上一进程的历史
    let prompt = &generator.requests()[0];
    assert!(prompt.iter().any(|m| m.content == "I just started cooking"));
    assert!(prompt.iter().any(|m| m.content == "Start with a simple omelette."));

    let saved = pipeline.load_session("cooking_session_1").await.unwrap().unwrap();
    assert_eq!(saved.messages.len(), 4);
    let roles: Vec<Role> = saved.messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);
}

#[tokio::test]
async fn test_failed_turn_is_not_persisted_across_restart() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_store(&dir).await;

    let generator = Arc::new(MockLlmClient::with_script([
        Ok("Roast the vegetables.".to_string()),
        Err(LlmError::Api("rate limited".into())),
    ]));
    let pipeline = PipelineBuilder::new(AppConfig::default())
        .with_llm(generator)
        .with_extractor_llm(Arc::new(MockLlmClient::new()))
        .with_store(store.clone())
        .build()
        .await
        .unwrap();

    pipeline.process_turn("s1", "what's for dinner?").await.unwrap();
    let before = store.load("s1").await.unwrap().unwrap();

    let err = pipeline.process_turn("s1", "and dessert?").await.unwrap_err();
    assert!(matches!(err, PipelineError::Generation(_)));
    assert!(err.is_retryable());

    let reopened = sqlite_store(&dir).await;
    assert_eq!(reopened.load("s1").await.unwrap().unwrap(), before);
}

#[tokio::test]
async fn test_extractor_outage_still_replies() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn CheckpointStore> =
        Arc::new(FileCheckpointStore::open(dir.path()).await.unwrap());

    let pipeline = PipelineBuilder::new(AppConfig::default())
        .with_llm(Arc::new(MockLlmClient::with_replies(["Use firm tofu."])))
        .with_extractor_llm(Arc::new(MockLlmClient::with_script([Err(LlmError::Timeout(60))])))
        .with_store(store.clone())
        .build()
        .await
        .unwrap();

    let outcome = pipeline.process_turn("s1", "I'm vegan, suggest dinner").await.unwrap();
    assert_eq!(outcome.reply.content, "Use firm tofu.");
    assert!(outcome.preferences.is_empty());
    assert_eq!(store.load("s1").await.unwrap().unwrap().messages.len(), 2);
}
