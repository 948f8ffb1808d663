//! LLM 层：客户端抽象与实现（OpenAI 兼容 / Gemini / DeepSeek / Mock）与后端选择

pub mod deepseek;
pub mod gemini;
pub mod mock;
pub mod openai;
pub mod timeout;
pub mod traits;

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;

pub use deepseek::{create_deepseek_client, DEEPSEEK_CHAT};
pub use gemini::{create_gemini_client, GEMINI_FLASH};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, TokenUsage};
pub use timeout::TimeoutLlmClient;
pub use traits::{LlmClient, LlmError};

/// 根据配置与环境变量选择 LLM 后端，并套上请求超时
///
/// provider 为 gemini / deepseek / openai 时需要对应 API Key；缺少 Key 或 provider 为 mock 时退回 Mock。
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let model_override = cfg.llm.model.as_deref();

    let base: Arc<dyn LlmClient> = match provider.as_str() {
        "gemini" if gemini::gemini_api_key().is_some() => {
            let model = cfg.llm.gemini.model.as_deref().or(model_override);
            let client = create_gemini_client(model, cfg.llm.temperature);
            tracing::info!("Using Gemini LLM ({})", client.model());
            Arc::new(client)
        }
        "deepseek" if deepseek::deepseek_api_key().is_some() => {
            let model = cfg.llm.deepseek.model.as_deref().or(model_override);
            let client = create_deepseek_client(model, cfg.llm.temperature);
            tracing::info!("Using DeepSeek LLM ({})", client.model());
            Arc::new(client)
        }
        "openai" if std::env::var("OPENAI_API_KEY").is_ok() => {
            let model = cfg
                .llm
                .openai
                .model
                .as_deref()
                .or(model_override)
                .unwrap_or("gpt-4o-mini");
            let mut client = OpenAiClient::new(
                cfg.llm.base_url.as_deref(),
                model,
                std::env::var("OPENAI_API_KEY").ok().as_deref(),
            );
            if let Some(t) = cfg.llm.temperature {
                client = client.with_temperature(t);
            }
            tracing::info!("Using OpenAI LLM ({})", model);
            Arc::new(client)
        }
        "mock" => {
            tracing::info!("Using Mock LLM");
            Arc::new(MockLlmClient::new())
        }
        other => {
            tracing::warn!(provider = other, "No API key set or provider unknown, using Mock LLM");
            Arc::new(MockLlmClient::new())
        }
    };

    Arc::new(TimeoutLlmClient::new(
        base,
        Duration::from_secs(cfg.llm.timeouts.request),
    ))
}
