//! 会话状态：一个会话的完整快照（历史 + 偏好）
//!
//! 每个阶段都是「快照进、快照出」：消费旧状态并返回新状态，历史只追加，偏好只增不丢。

use serde::{Deserialize, Serialize};

use crate::memory::{Message, PreferenceSet};

/// 会话快照；由 Orchestrator 整体加载、整体保存
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub preferences: PreferenceSet,
}

impl SessionState {
    /// 首次引用某会话时的空状态
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            preferences: PreferenceSet::new(),
        }
    }

    /// 追加一条消息，返回新快照
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// 替换偏好集合，返回新快照
    pub fn with_preferences(mut self, preferences: PreferenceSet) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// 历史中最后一条是 user 消息时返回它
    pub fn pending_user_message(&self) -> Option<&Message> {
        self.last_message().filter(|m| m.is_user())
    }

    /// 已完成的轮数（user + assistant 成对计）
    pub fn turn_count(&self) -> usize {
        self.messages.len() / 2
    }
}
