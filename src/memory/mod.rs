//! 记忆层：对话消息与用户偏好

pub mod conversation;
pub mod preferences;

pub use conversation::{Message, Role};
pub use preferences::{PreferenceSet, PreferenceValue};
