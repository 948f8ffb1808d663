//! Preference Extractor：从最新一条用户消息中提取偏好事实
//!
//! 单轮调用 LLM（不带历史），要求只返回一个 JSON 对象。解析结果是显式的
//! `ExtractionOutcome`：`Parsed(facts)` 或 `NoFacts(reason)`，任何失败都降级为 NoFacts，不会让本轮失败。

use std::fmt;
use std::sync::Arc;

use crate::core::SessionState;
use crate::llm::LlmClient;
use crate::memory::{Message, PreferenceSet};

/// 默认提取 prompt；`{message}` 会被替换为用户原文
pub const DEFAULT_EXTRACTION_PROMPT: &str = "Analyze this message and extract any cooking preferences, dietary restrictions, \
or food-related information: \"{message}\"

Return ONLY a JSON object with keys like: dietary_restriction, favorite_cuisine, allergies, skill_level, etc.
If no preferences found, return empty JSON object {}.";

/// 提取结果
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// 得到一组事实（可能为空对象）
    Parsed(PreferenceSet),
    /// 没有新事实，附原因（仅用于日志）
    NoFacts(NoFactsReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoFactsReason {
    /// 最后一条消息不是 user
    NoUserMessage,
    /// LLM 调用失败或超时
    LlmFailed(String),
    /// 去空白后不是以 `{` 开头、`}` 结尾
    NotAnObject,
    /// 形如对象但 JSON 解析失败
    ParseFailed(String),
}

impl fmt::Display for NoFactsReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoUserMessage => f.write_str("last message is not from the user"),
            Self::LlmFailed(e) => write!(f, "llm call failed: {e}"),
            Self::NotAnObject => f.write_str("response is not an object"),
            Self::ParseFailed(e) => write!(f, "response is not valid JSON: {e}"),
        }
    }
}

/// 解析 LLM 输出：必须整体是一个 JSON 对象，否则 NoFacts
pub fn parse_extraction(output: &str) -> ExtractionOutcome {
    let trimmed = output.trim();
    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return ExtractionOutcome::NoFacts(NoFactsReason::NotAnObject);
    }

    match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(trimmed) {
        Ok(map) => ExtractionOutcome::Parsed(PreferenceSet::from_json_object(&map)),
        Err(e) => ExtractionOutcome::NoFacts(NoFactsReason::ParseFailed(e.to_string())),
    }
}

pub struct PreferenceExtractor {
    llm: Arc<dyn LlmClient>,
}

impl PreferenceExtractor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    fn build_prompt(&self, user_text: &str) -> String {
        DEFAULT_EXTRACTION_PROMPT.replace("{message}", user_text)
    }

    /// 只读地跑一次提取，不修改状态
    pub async fn extract(&self, state: &SessionState) -> ExtractionOutcome {
        let Some(last) = state.pending_user_message() else {
            return ExtractionOutcome::NoFacts(NoFactsReason::NoUserMessage);
        };

        let request = [Message::user(self.build_prompt(&last.content))];
        match self.llm.complete(&request).await {
            Ok(output) => parse_extraction(&output),
            Err(e) => ExtractionOutcome::NoFacts(NoFactsReason::LlmFailed(e.to_string())),
        }
    }

    /// 快照进、快照出：把提取到的事实按 last-write-wins 合并进偏好，历史不变
    pub async fn apply(&self, state: SessionState) -> SessionState {
        match self.extract(&state).await {
            ExtractionOutcome::Parsed(facts) => {
                tracing::debug!(
                    session_id = %state.session_id,
                    facts = %facts,
                    "preferences extracted"
                );
                let merged = state.preferences.merged(&facts);
                state.with_preferences(merged)
            }
            ExtractionOutcome::NoFacts(NoFactsReason::NoUserMessage) => state,
            ExtractionOutcome::NoFacts(reason) => {
                tracing::warn!(
                    session_id = %state.session_id,
                    "preference extraction skipped: {}",
                    reason
                );
                state
            }
        }
    }
}
