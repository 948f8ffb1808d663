//! 核心编排层：会话状态、错误、会话监管、Pipeline 与构建器

pub mod builder;
pub mod error;
pub mod orchestrator;
pub mod session_supervisor;
pub mod state;

pub use builder::{create_pipeline_builder, PipelineBuilder};
pub use error::PipelineError;
pub use orchestrator::{Pipeline, TurnOutcome};
pub use session_supervisor::{SessionSupervisor, TurnGuard};
pub use state::SessionState;
