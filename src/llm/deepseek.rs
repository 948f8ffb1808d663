//! DeepSeek 客户端（OpenAI 兼容端点）
//!
//! Key 取 `DEEPSEEK_API_KEY`，没有时退回 `OPENAI_API_KEY`。

use crate::llm::OpenAiClient;

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";

/// 从环境变量读取 DeepSeek API Key
pub fn deepseek_api_key() -> Option<String> {
    std::env::var("DEEPSEEK_API_KEY")
        .ok()
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
}

/// 创建 DeepSeek 客户端；model 为空时用 `deepseek-chat`，temperature 为空时沿用服务端默认值
pub fn create_deepseek_client(model: Option<&str>, temperature: Option<f32>) -> OpenAiClient {
    let api_key = deepseek_api_key().unwrap_or_else(|| "placeholder".to_string());
    let client = OpenAiClient::new(
        Some(DEEPSEEK_BASE_URL),
        model.unwrap_or(DEEPSEEK_CHAT),
        Some(api_key.as_str()),
    );

    match temperature {
        Some(t) => client.with_temperature(t),
        None => client,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_defaults_to_chat() {
        assert_eq!(create_deepseek_client(None, None).model(), DEEPSEEK_CHAT);
        assert_eq!(
            create_deepseek_client(Some("deepseek-reasoner"), Some(0.2)).model(),
            "deepseek-reasoner"
        );
    }
}
