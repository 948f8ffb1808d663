//! Pipeline Orchestrator：单轮处理的唯一入口
//!
//! 顺序固定：加载 -> 追加 user 消息 -> Extractor -> Generator -> 整体保存 -> 返回。
//! 阶段只在内存中的工作副本上变换；Generator 或保存失败时整份副本丢弃，存储中仍是上一轮快照。

use std::sync::Arc;

use crate::core::{PipelineError, SessionState, SessionSupervisor};
use crate::llm::LlmError;
use crate::memory::{Message, PreferenceSet};
use crate::stages::{PreferenceExtractor, ResponseGenerator};
use crate::store::CheckpointStore;

/// 一轮成功处理的结果：assistant 回复与当前偏好
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub reply: Message,
    pub preferences: PreferenceSet,
}

pub struct Pipeline {
    extractor: PreferenceExtractor,
    generator: ResponseGenerator,
    store: Arc<dyn CheckpointStore>,
    supervisor: SessionSupervisor,
}

impl Pipeline {
    pub fn new(
        extractor: PreferenceExtractor,
        generator: ResponseGenerator,
        store: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            extractor,
            generator,
            store,
            supervisor: SessionSupervisor::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn CheckpointStore> {
        &self.store
    }

    /// 处理一轮对话；同会话的并发调用会排队执行
    pub async fn process_turn(
        &self,
        session_id: &str,
        user_text: &str,
    ) -> Result<TurnOutcome, PipelineError> {
        if session_id.trim().is_empty() {
            return Err(PipelineError::InvalidInput("session id cannot be empty".into()));
        }
        if user_text.trim().is_empty() {
            return Err(PipelineError::InvalidInput("message cannot be empty".into()));
        }

        let result = {
            let _turn = self.supervisor.acquire(session_id).await;
            self.run_turn(session_id, user_text).await
        };
        self.supervisor.release(session_id).await;
        result
    }

    async fn run_turn(
        &self,
        session_id: &str,
        user_text: &str,
    ) -> Result<TurnOutcome, PipelineError> {
        let state = self.load_or_init(session_id).await?;
        tracing::debug!(session_id, turns = state.turn_count(), "turn started");

        let state = state.with_message(Message::user(user_text));
        let state = self.extractor.apply(state).await;
        let state = self.generator.apply(state).await.map_err(|e| {
            tracing::error!(session_id, "response generation failed: {}", e);
            e
        })?;

        self.store.save(&state).await.map_err(|e| {
            tracing::error!(session_id, "checkpoint save failed: {}", e);
            e
        })?;

        let reply = state
            .last_message()
            .cloned()
            .ok_or(PipelineError::Generation(LlmError::EmptyResponse))?;
        let (prompt_tokens, completion_tokens, total_tokens) = self.generator.token_usage();
        tracing::debug!(
            session_id,
            turns = state.turn_count(),
            prompt_tokens,
            completion_tokens,
            total_tokens,
            "turn committed"
        );

        Ok(TurnOutcome {
            reply,
            preferences: state.preferences,
        })
    }

    /// 读取会话当前快照（不存在时为 None）
    pub async fn load_session(&self, session_id: &str) -> Result<Option<SessionState>, PipelineError> {
        Ok(self.store.load(session_id).await?)
    }

    /// 显式清空偏好；历史保留。会话不存在时不做任何事
    pub async fn clear_preferences(&self, session_id: &str) -> Result<(), PipelineError> {
        let result = {
            let _turn = self.supervisor.acquire(session_id).await;
            self.clear_preferences_locked(session_id).await
        };
        self.supervisor.release(session_id).await;
        result
    }

    async fn clear_preferences_locked(&self, session_id: &str) -> Result<(), PipelineError> {
        if let Some(mut state) = self.store.load(session_id).await? {
            state.preferences.clear();
            self.store.save(&state).await?;
            tracing::info!(session_id, "preferences cleared");
        }
        Ok(())
    }

    async fn load_or_init(&self, session_id: &str) -> Result<SessionState, PipelineError> {
        match self.store.load(session_id).await {
            Ok(Some(state)) => Ok(state),
            Ok(None) => {
                tracing::info!(session_id, "starting new session");
                Ok(SessionState::new(session_id))
            }
            Err(e) => {
                tracing::error!(session_id, "checkpoint load failed: {}", e);
                Err(e.into())
            }
        }
    }
}
