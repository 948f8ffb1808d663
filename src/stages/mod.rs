//! 流水线阶段：Preference Extractor -> Response Generator
//!
//! 每个阶段都是 SessionState -> SessionState 的纯变换，加载与保存只由 Orchestrator 负责。

pub mod extractor;
pub mod generator;

pub use extractor::{
    parse_extraction, ExtractionOutcome, NoFactsReason, PreferenceExtractor,
    DEFAULT_EXTRACTION_PROMPT,
};
pub use generator::{ResponseGenerator, COOKING_SYSTEM_PROMPT};
