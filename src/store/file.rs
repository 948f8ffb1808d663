//! 文件检查点存储：每个会话一个 JSON 文件
//!
//! 写入先落到临时文件再 rename，保证读者只会看到完整的旧快照或完整的新快照。

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{validate_session_id, CheckpointStore, StoreError};
use crate::core::SessionState;

#[derive(Debug)]
pub struct FileCheckpointStore {
    base_path: PathBuf,
}

impl FileCheckpointStore {
    /// 打开存储目录，不存在时创建
    pub async fn open(base_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_path = base_path.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&base_path).await?;
        Ok(Self { base_path })
    }

    fn session_path(&self, session_id: &str) -> Result<PathBuf, StoreError> {
        validate_session_id(session_id)?;
        if session_id.contains('/') || session_id.contains('\\') || session_id.contains("..") {
            return Err(StoreError::InvalidId(format!(
                "session id contains path characters: {session_id:?}"
            )));
        }
        Ok(self.base_path.join(format!("{session_id}.json")))
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>, StoreError> {
        let path = self.session_path(session_id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(data) => Ok(Some(serde_json::from_str(&data)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, state: &SessionState) -> Result<(), StoreError> {
        let path = self.session_path(&state.session_id)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_string_pretty(state)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::debug!(session_id = %state.session_id, "checkpoint written to {:?}", path);
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        let path = self.session_path(session_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_sessions(&self) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Message;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_round_trip_and_overwrite() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::open(dir.path()).await.unwrap();

        let first = SessionState::new("s1").with_message(Message::user("hi"));
        store.save(&first).await.unwrap();
        assert_eq!(store.load("s1").await.unwrap(), Some(first.clone()));

        let second = first.with_message(Message::assistant("hello"));
        store.save(&second).await.unwrap();
        assert_eq!(store.load("s1").await.unwrap(), Some(second));
        assert_eq!(store.list_sessions().await.unwrap(), vec!["s1".to_string()]);
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::open(dir.path()).await.unwrap();
        assert!(matches!(
            store.load("../etc/passwd").await,
            Err(StoreError::InvalidId(_))
        ));
        assert!(store.save(&SessionState::new("a/b")).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::open(dir.path()).await.unwrap();
        store.delete("nothing").await.unwrap();
        assert!(store.load("nothing").await.unwrap().is_none());
    }
}
