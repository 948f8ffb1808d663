//! 会话监管：保证同一会话同一时刻只有一个在途轮次
//!
//! 每轮都是「读整份快照 -> 覆盖整份快照」，同会话并发会丢失其中一轮的更新，
//! 因此按 session_id 持有一把异步互斥锁；不同会话之间互不等待。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// 在途轮次的占用凭证，drop 时释放
pub type TurnGuard = OwnedMutexGuard<()>;

#[derive(Debug, Default)]
pub struct SessionSupervisor {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 等待并占用该会话；返回的 guard 存活期间其它同会话轮次排队
    pub async fn acquire(&self, session_id: &str) -> TurnGuard {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(
                locks
                    .entry(session_id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }

    /// 轮次结束、guard 已 drop 之后调用：若该会话锁无人占用也无人排队则移除，返回是否移除
    ///
    /// 排队者在 map 锁内克隆 Arc，因此 strong_count == 1 时不会有人正在等待它。
    pub async fn release(&self, session_id: &str) -> bool {
        let mut locks = self.locks.lock().await;
        let idle = locks
            .get(session_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if idle {
            locks.remove(session_id);
        }
        idle
    }

    /// 已登记的会话数
    pub async fn tracked_sessions(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_session_is_serialized() {
        let supervisor = Arc::new(SessionSupervisor::new());
        let guard = supervisor.acquire("s1").await;

        let sup = Arc::clone(&supervisor);
        let waiter = tokio::spawn(async move {
            let _g = sup.acquire("s1").await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_distinct_sessions_do_not_block() {
        let supervisor = SessionSupervisor::new();
        let _a = supervisor.acquire("a").await;
        let b = tokio::time::timeout(Duration::from_millis(100), supervisor.acquire("b")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_release_removes_only_idle_entries() {
        let supervisor = SessionSupervisor::new();
        let held = supervisor.acquire("busy").await;
        drop(supervisor.acquire("idle").await);

        assert!(supervisor.release("idle").await);
        assert!(!supervisor.release("busy").await);
        assert!(!supervisor.release("unknown").await);
        assert_eq!(supervisor.tracked_sessions().await, 1);

        drop(held);
        assert!(supervisor.release("busy").await);
        assert_eq!(supervisor.tracked_sessions().await, 0);
    }

    #[tokio::test]
    async fn test_release_keeps_entry_while_someone_waits() {
        let supervisor = Arc::new(SessionSupervisor::new());
        let guard = supervisor.acquire("s1").await;

        let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();
        let sup = Arc::clone(&supervisor);
        let waiter = tokio::spawn(async move {
            let _g = sup.acquire("s1").await;
            let _ = done_rx.await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(guard);
        assert!(!supervisor.release("s1").await);

        let _ = done_tx.send(());
        waiter.await.unwrap();
        assert!(supervisor.release("s1").await);
    }
}
