//! Pipeline 构建器：统一的初始化逻辑
//!
//! 从配置选出 LLM 后端与检查点存储，读取 system prompt，组装出可直接调用 process_turn 的 Pipeline。

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{load_config, load_system_prompt, AppConfig};
use crate::core::Pipeline;
use crate::llm::{create_llm_from_config, LlmClient};
use crate::stages::{PreferenceExtractor, ResponseGenerator};
use crate::store::{create_checkpoint_store, CheckpointStore, StoreError};

pub struct PipelineBuilder {
    config: AppConfig,
    llm: Option<Arc<dyn LlmClient>>,
    extractor_llm: Option<Arc<dyn LlmClient>>,
    store: Option<Arc<dyn CheckpointStore>>,
    system_prompt: Option<String>,
}

impl PipelineBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            llm: None,
            extractor_llm: None,
            store: None,
            system_prompt: None,
        }
    }

    /// 两个阶段共用的 LLM；不设置时按配置创建
    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// 给 Extractor 单独指定一个（通常更便宜的）LLM
    pub fn with_extractor_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.extractor_llm = Some(llm);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn CheckpointStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// 从 config/prompts/system.txt 读取人设（文件不存在时保持内置人设）
    pub fn with_system_prompt_from_file(mut self) -> Self {
        if let Some(prompt) = load_system_prompt() {
            self.system_prompt = Some(prompt);
        }
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 组装 Pipeline；存储打不开时返回错误，调用方应在进入对话循环前终止
    pub async fn build(self) -> Result<Pipeline, StoreError> {
        let store = match self.store {
            Some(store) => store,
            None => create_checkpoint_store(&self.config.store).await?,
        };
        let llm = self
            .llm
            .unwrap_or_else(|| create_llm_from_config(&self.config));
        let extractor_llm = self.extractor_llm.unwrap_or_else(|| llm.clone());

        let mut generator = ResponseGenerator::new(llm);
        if let Some(prompt) = self.system_prompt {
            generator = generator.with_system_prompt(prompt);
        }

        Ok(Pipeline::new(
            PreferenceExtractor::new(extractor_llm),
            generator,
            store,
        ))
    }
}

/// 便捷函数：从默认路径加载配置并创建 PipelineBuilder；配置加载失败时用默认值
pub fn create_pipeline_builder(config_path: Option<PathBuf>) -> PipelineBuilder {
    let config = load_config(config_path).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });
    PipelineBuilder::new(config).with_system_prompt_from_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::store::MemoryCheckpointStore;

    #[tokio::test]
    async fn test_build_with_injected_parts() {
        let extractor_llm = Arc::new(MockLlmClient::with_replies([r#"{"skill_level":"advanced"}"#]));
        let llm = Arc::new(MockLlmClient::with_replies(["Sear it hot."]));
        let pipeline = PipelineBuilder::new(AppConfig::default())
            .with_llm(llm.clone())
            .with_extractor_llm(extractor_llm.clone())
            .with_store(Arc::new(MemoryCheckpointStore::new()))
            .with_system_prompt("You are a grill master.")
            .build()
            .await
            .unwrap();

        let outcome = pipeline.process_turn("s1", "How do I cook steak?").await.unwrap();
        assert_eq!(outcome.reply.content, "Sear it hot.");
        assert_eq!(extractor_llm.call_count(), 1);
        assert_eq!(llm.requests()[0][0].content, "You are a grill master.");
    }

    #[tokio::test]
    async fn test_build_fails_when_store_cannot_open() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let mut config = AppConfig::default();
        config.store.path = Some(blocker.join("checkpoints.db"));

        let result = PipelineBuilder::new(config)
            .with_llm(Arc::new(MockLlmClient::new()))
            .build()
            .await;
        assert!(result.is_err());
    }
}
