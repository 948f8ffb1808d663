//! Chef - Rust 烹饪助手
//!
//! 一轮对话依次经过「偏好提取」与「回复生成」两个阶段，会话历史与用户偏好按会话 ID 持久化，
//! 进程重启后可以接着聊。
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 会话状态、Pipeline 编排、会话监管、构建器
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Gemini / DeepSeek / Mock）
//! - **memory**: 对话消息与用户偏好
//! - **observability**: 日志初始化
//! - **stages**: Preference Extractor 与 Response Generator
//! - **store**: 检查点存储（SQLite / 文件 / 内存）

pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod stages;
pub mod store;

pub use crate::core::{Pipeline, PipelineBuilder, PipelineError, SessionState, TurnOutcome};
