//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `CHEF__*` 覆盖（双下划线表示嵌套，如 `CHEF__LLM__PROVIDER=gemini`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub store: StoreSection,
}

/// [app] 段：应用名、默认会话 ID、退出命令
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    pub name: Option<String>,
    #[serde(default = "default_session_id")]
    pub session_id: String,
    #[serde(default = "default_quit_commands")]
    pub quit_commands: Vec<String>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            session_id: default_session_id(),
            quit_commands: default_quit_commands(),
        }
    }
}

fn default_session_id() -> String {
    "cooking_session_1".to_string()
}

fn default_quit_commands() -> Vec<String> {
    vec!["quit".into(), "exit".into(), "q".into()]
}

/// [llm] 段：后端选择、采样温度与超时
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：gemini / deepseek / openai / mock
    #[serde(default = "default_provider")]
    pub provider: String,
    /// 通用模型名；各 provider 子段的 model 优先
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    #[serde(default)]
    pub gemini: LlmModelSection,
    #[serde(default)]
    pub deepseek: LlmModelSection,
    #[serde(default)]
    pub openai: LlmModelSection,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            base_url: None,
            temperature: None,
            gemini: LlmModelSection::default(),
            deepseek: LlmModelSection::default(),
            openai: LlmModelSection::default(),
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmModelSection {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmTimeoutsSection {
    /// 单次补全请求超时（秒）
    #[serde(default = "default_request_timeout")]
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

/// 检查点存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    File,
    Memory,
}

/// [store] 段：检查点存储后端、路径与保留条数
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    #[serde(default = "default_store_backend")]
    pub backend: StoreBackend,
    /// sqlite 为数据库文件，file 为目录；未设置时用 ./data 下的默认位置
    pub path: Option<PathBuf>,
    /// 每个会话保留的历史检查点数（仅 sqlite）
    #[serde(default = "default_keep_checkpoints")]
    pub keep_checkpoints: usize,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: None,
            keep_checkpoints: default_keep_checkpoints(),
        }
    }
}

fn default_store_backend() -> StoreBackend {
    StoreBackend::Sqlite
}

fn default_keep_checkpoints() -> usize {
    10
}

/// 从 config 目录加载配置，环境变量 CHEF__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 CHEF__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("CHEF")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

/// 读取 Generator 的系统提示词：config/prompts/system.txt 存在时优先，否则用内置烹饪助手人设
pub fn load_system_prompt() -> Option<String> {
    ["config/prompts/system.txt", "../config/prompts/system.txt"]
        .into_iter()
        .find_map(|p| std::fs::read_to_string(p).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
