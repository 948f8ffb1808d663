//! SQLite 检查点存储
//!
//! 每次 save 追加一条新检查点（step 递增），并在同一事务内裁剪到最近 keep 条；
//! load 读取 step 最大的那条。rusqlite 为同步接口，所有调用经 spawn_blocking 执行。

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use super::{validate_session_id, CheckpointStore, StoreError};
use crate::core::SessionState;

/// 检查点元数据（不含状态正文）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointMeta {
    pub step: i64,
    pub created_at: String,
}

pub struct SqliteCheckpointStore {
    conn: Arc<Mutex<Connection>>,
    keep_checkpoints: usize,
}

impl SqliteCheckpointStore {
    /// 打开（或创建）数据库文件并初始化表；父目录不存在时自动创建
    pub async fn open(path: impl AsRef<Path>, keep_checkpoints: usize) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection, StoreError> {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Ok(Connection::open(&path)?)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))??;

        Self::from_connection(conn, keep_checkpoints).await
    }

    /// 内存数据库（测试用）
    pub async fn open_in_memory(keep_checkpoints: usize) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?, keep_checkpoints).await
    }

    async fn from_connection(conn: Connection, keep_checkpoints: usize) -> Result<Self, StoreError> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            keep_checkpoints: keep_checkpoints.max(1),
        };
        store.run(init_tables).await?;
        Ok(store)
    }

    /// 在阻塞线程上持锁执行一段数据库操作
    async fn run<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::Task("sqlite connection lock poisoned".to_string()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    /// 会话当前保留的检查点（旧 -> 新）
    pub async fn history(&self, session_id: &str) -> Result<Vec<CheckpointMeta>, StoreError> {
        let session_id = session_id.to_string();
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT step, created_at FROM checkpoints WHERE session_id = ?1 ORDER BY step ASC",
            )?;
            let rows = stmt
                .query_map(params![session_id], |row| {
                    Ok(CheckpointMeta {
                        step: row.get(0)?,
                        created_at: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    /// 读取指定 step 的历史快照
    pub async fn load_step(
        &self,
        session_id: &str,
        step: i64,
    ) -> Result<Option<SessionState>, StoreError> {
        let session_id = session_id.to_string();
        let raw: Option<String> = self
            .run(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT state FROM checkpoints WHERE session_id = ?1 AND step = ?2",
                        params![session_id, step],
                        |row| row.get(0),
                    )
                    .optional()?)
            })
            .await?;
        raw.map(|s| serde_json::from_str(&s).map_err(StoreError::from))
            .transpose()
    }

    /// 会话当前保留的检查点条数；不存在的会话为 0
    pub async fn checkpoint_count(&self, session_id: &str) -> Result<usize, StoreError> {
        let session_id = session_id.to_string();
        let count: i64 = self
            .run(move |conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM checkpoints WHERE session_id = ?1",
                    params![session_id],
                    |row| row.get(0),
                )?)
            })
            .await?;
        Ok(count as usize)
    }
}

fn init_tables(conn: &mut Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS checkpoints (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT NOT NULL,
            step INTEGER NOT NULL,
            state TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_checkpoints_session_step
            ON checkpoints(session_id, step);",
    )?;
    Ok(())
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>, StoreError> {
        let session_id = session_id.to_string();
        let raw: Option<String> = self
            .run(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT state FROM checkpoints WHERE session_id = ?1 ORDER BY step DESC LIMIT 1",
                        params![session_id],
                        |row| row.get(0),
                    )
                    .optional()?)
            })
            .await?;
        raw.map(|s| serde_json::from_str(&s).map_err(StoreError::from))
            .transpose()
    }

    async fn save(&self, state: &SessionState) -> Result<(), StoreError> {
        validate_session_id(&state.session_id)?;
        let session_id = state.session_id.clone();
        let body = serde_json::to_string(state)?;
        let keep = self.keep_checkpoints as i64;

        let step = self
            .run(move |conn| {
                let tx = conn.transaction()?;
                let step: i64 = tx.query_row(
                    "SELECT COALESCE(MAX(step), 0) + 1 FROM checkpoints WHERE session_id = ?1",
                    params![session_id],
                    |row| row.get(0),
                )?;
                tx.execute(
                    "INSERT INTO checkpoints (session_id, step, state, created_at) VALUES (?1, ?2, ?3, ?4)",
                    params![session_id, step, body, chrono::Utc::now().to_rfc3339()],
                )?;
                tx.execute(
                    "DELETE FROM checkpoints WHERE session_id = ?1 AND step <= ?2",
                    params![session_id, step - keep],
                )?;
                tx.commit()?;
                Ok(step)
            })
            .await?;

        tracing::debug!(session_id = %state.session_id, step, "checkpoint saved");
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        let session_id = session_id.to_string();
        self.run(move |conn| {
            conn.execute(
                "DELETE FROM checkpoints WHERE session_id = ?1",
                params![session_id],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_sessions(&self) -> Result<Vec<String>, StoreError> {
        self.run(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT session_id FROM checkpoints ORDER BY session_id",
            )?;
            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(ids)
        })
        .await
    }
}
