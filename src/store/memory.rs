//! 内存检查点存储（测试与本地开发用，进程退出即丢失）

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{validate_session_id, CheckpointStore, StoreError};
use crate::core::SessionState;

#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    sessions: RwLock<HashMap<String, SessionState>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>, StoreError> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn save(&self, state: &SessionState) -> Result<(), StoreError> {
        validate_session_id(&state.session_id)?;
        self.sessions
            .write()
            .await
            .insert(state.session_id.clone(), state.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<String>, StoreError> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Message;

    #[tokio::test]
    async fn test_save_then_load() {
        let store = MemoryCheckpointStore::new();
        assert!(store.load("s1").await.unwrap().is_none());

        let mut state = SessionState::new("s1").with_message(Message::user("hi"));
        state.preferences.insert("skill_level", "beginner");
        store.save(&state).await.unwrap();

        assert_eq!(store.load("s1").await.unwrap(), Some(state));
        assert!(store.load("s2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryCheckpointStore::new();
        store.save(&SessionState::new("a")).await.unwrap();
        store.save(&SessionState::new("b")).await.unwrap();
        store.delete("a").await.unwrap();
        assert_eq!(store.list_sessions().await.unwrap(), vec!["b".to_string()]);
    }
}
