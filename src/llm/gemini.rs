//! Gemini 客户端（走 Google 的 OpenAI 兼容端点）
//!
//! - Base URL: https://generativelanguage.googleapis.com/v1beta/openai/
//! - Key: `GOOGLE_API_KEY`（兼容 `GEMINI_API_KEY`）

use crate::llm::OpenAiClient;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";
pub const GEMINI_FLASH: &str = "gemini-flash-latest";
pub const GEMINI_DEFAULT_TEMPERATURE: f32 = 0.7;

/// 从环境变量读取 Gemini API Key
pub fn gemini_api_key() -> Option<String> {
    std::env::var("GOOGLE_API_KEY")
        .ok()
        .or_else(|| std::env::var("GEMINI_API_KEY").ok())
}

/// 创建 Gemini 客户端；model 为空时用 `gemini-flash-latest`，temperature 为空时用 0.7
pub fn create_gemini_client(model: Option<&str>, temperature: Option<f32>) -> OpenAiClient {
    let api_key = gemini_api_key().unwrap_or_else(|| "placeholder".to_string());
    let model = model.unwrap_or(GEMINI_FLASH);

    OpenAiClient::new(Some(GEMINI_BASE_URL), model, Some(api_key.as_str()))
        .with_temperature(temperature.unwrap_or(GEMINI_DEFAULT_TEMPERATURE))
}
