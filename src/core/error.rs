//! 流水线错误类型
//!
//! 只有「整轮失败」的错误才会出现在这里：Extractor 的失败在阶段内部降级为 NoFacts，不会传播。

use thiserror::Error;

use crate::llm::LlmError;
use crate::store::StoreError;

/// 单轮处理失败的原因；出现时本轮不提交任何状态，上一轮快照仍然有效
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Generator 调用 LLM 失败（网络 / 超时 / 配额 / 空回复）
    #[error("Response generation failed: {0}")]
    Generation(#[from] LlmError),

    /// 检查点加载或保存失败
    #[error("Checkpoint store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl PipelineError {
    /// 用户可以原样重发同一条输入再试
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PipelineError::InvalidInput(_))
    }
}
