//! 检查点存储抽象层
//!
//! 按会话 ID 整体保存 / 读取 SessionState。同一会话 save 之后的 load 必须读到刚写入的快照；
//! 跨会话隔离与多写者仲裁由具体存储负责。

pub mod file;
pub mod memory;
pub mod sqlite;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{StoreBackend, StoreSection};
use crate::core::SessionState;

pub use file::FileCheckpointStore;
pub use memory::MemoryCheckpointStore;
pub use sqlite::SqliteCheckpointStore;

/// 存储层错误
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid session id: {0}")]
    InvalidId(String),

    #[error("Store task failed: {0}")]
    Task(String),
}

/// 检查点存储接口
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// 读取会话最新快照；不存在时返回 None
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>, StoreError>;

    /// 整体覆盖保存会话快照
    async fn save(&self, state: &SessionState) -> Result<(), StoreError>;

    /// 删除会话的全部检查点
    async fn delete(&self, session_id: &str) -> Result<(), StoreError>;

    /// 列出已有会话 ID，按字典序升序
    async fn list_sessions(&self) -> Result<Vec<String>, StoreError>;
}

/// 会话 ID 不能为空，也不能含控制字符；用作文件名时另有路径检查
pub(crate) fn validate_session_id(session_id: &str) -> Result<(), StoreError> {
    if session_id.trim().is_empty() {
        return Err(StoreError::InvalidId("session id cannot be empty".to_string()));
    }
    if session_id.chars().any(|c| c.is_control()) {
        return Err(StoreError::InvalidId(format!(
            "session id contains control characters: {session_id:?}"
        )));
    }
    Ok(())
}

/// 按配置创建检查点存储；连接失败即返回错误（启动阶段视为致命）
pub async fn create_checkpoint_store(
    cfg: &StoreSection,
) -> Result<Arc<dyn CheckpointStore>, StoreError> {
    match cfg.backend {
        StoreBackend::Sqlite => {
            let path = cfg
                .path
                .clone()
                .unwrap_or_else(|| PathBuf::from("data/checkpoints.db"));
            let store = SqliteCheckpointStore::open(&path, cfg.keep_checkpoints).await?;
            tracing::info!("Using SQLite checkpoint store: {:?}", path);
            Ok(Arc::new(store))
        }
        StoreBackend::File => {
            let dir = cfg.path.clone().unwrap_or_else(|| PathBuf::from("data/sessions"));
            let store = FileCheckpointStore::open(&dir).await?;
            tracing::info!("Using file checkpoint store: {:?}", dir);
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory checkpoint store, sessions will not survive restart");
            Ok(Arc::new(MemoryCheckpointStore::new()))
        }
    }
}
