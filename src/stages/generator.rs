//! Response Generator：拼接人设 + 偏好 + 完整历史，调用 LLM 生成回复
//!
//! LLM 失败不会被掩盖：没有回复就无法替代，整轮失败。

use std::sync::Arc;

use crate::core::SessionState;
use crate::llm::{LlmClient, LlmError};
use crate::memory::Message;

/// 内置烹饪助手人设（config/prompts/system.txt 可覆盖）
pub const COOKING_SYSTEM_PROMPT: &str = "You are a specialized cooking assistant with expertise in:
- Recipe recommendations based on ingredients, cuisine types, and dietary restrictions
- Cooking techniques and tips
- Ingredient substitutions
- Meal planning and preparation
- Food safety and storage
- Dietary accommodations (vegetarian, vegan, gluten-free, etc.)

Always provide helpful, accurate cooking advice. If you know the user's preferences, use them to personalize your responses.
Be concise but thorough in your explanations.";

pub struct ResponseGenerator {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
}

impl ResponseGenerator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            system_prompt: COOKING_SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// 底层 LLM 的累计 token 用量 (prompt, completion, total)
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }

    /// 人设 system 消息 +（偏好非空时）偏好 system 消息 + 完整历史
    pub fn build_prompt(&self, state: &SessionState) -> Vec<Message> {
        let mut messages = Vec::with_capacity(state.messages.len() + 2);
        messages.push(Message::system(self.system_prompt.clone()));
        if !state.preferences.is_empty() {
            messages.push(Message::system(format!(
                "User preferences: {}",
                state.preferences.render()
            )));
        }
        messages.extend(state.messages.iter().cloned());
        messages
    }

    /// 生成一条 assistant 回复（不修改状态）
    pub async fn generate(&self, state: &SessionState) -> Result<Message, LlmError> {
        let prompt = self.build_prompt(state);
        let reply = self.llm.complete(&prompt).await?;
        if reply.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(Message::assistant(reply))
    }

    /// 快照进、快照出：回复追加到历史末尾
    pub async fn apply(&self, state: SessionState) -> Result<SessionState, LlmError> {
        let reply = self.generate(&state).await?;
        Ok(state.with_message(reply))
    }
}
