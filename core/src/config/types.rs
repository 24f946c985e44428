use serde::{Deserialize, Serialize};

use crate::executor::types::{ExecutorConfig, ToolKind};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub http_server: HttpServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "stepflow_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses ~/.stepflow/logs.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// One optional backend per tool kind. A missing entry means steps of that
/// kind fail with "no collaborator configured".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub search: Option<ToolBackendConfig>,
    #[serde(default)]
    pub summarize: Option<ToolBackendConfig>,
    #[serde(default)]
    pub generate: Option<ToolBackendConfig>,
    #[serde(default)]
    pub edit: Option<ToolBackendConfig>,
    #[serde(default)]
    pub image: Option<ToolBackendConfig>,
}

impl ToolsConfig {
    pub fn for_kind(&self, kind: &ToolKind) -> Option<&ToolBackendConfig> {
        match kind {
            ToolKind::Search => self.search.as_ref(),
            ToolKind::Summarize => self.summarize.as_ref(),
            ToolKind::Generate => self.generate.as_ref(),
            ToolKind::Edit => self.edit.as_ref(),
            ToolKind::Image => self.image.as_ref(),
            ToolKind::Other(_) => None,
        }
    }

    fn backends_mut(&mut self) -> impl Iterator<Item = &mut ToolBackendConfig> {
        [
            self.search.as_mut(),
            self.summarize.as_mut(),
            self.generate.as_mut(),
            self.edit.as_mut(),
            self.image.as_mut(),
        ]
        .into_iter()
        .flatten()
    }

    /// Expand `${VAR}` / `$VAR` / `~` inside secrets and paths.
    pub fn expand_env(&mut self) {
        for backend in self.backends_mut() {
            backend.expand_env();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ToolBackendConfig {
    #[serde(rename = "command")]
    Command(CommandToolConfig),
    #[serde(rename = "search_api")]
    SearchApi(SearchApiConfig),
    #[serde(rename = "chat")]
    Chat(ChatToolConfig),
    #[serde(rename = "image_api")]
    ImageApi(ImageApiConfig),
}

impl ToolBackendConfig {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Command(_) => "command",
            Self::SearchApi(_) => "search_api",
            Self::Chat(_) => "chat",
            Self::ImageApi(_) => "image_api",
        }
    }

    fn expand_env(&mut self) {
        match self {
            Self::Command(c) => {
                c.program = expand(&c.program);
                c.args = c.args.iter().map(|a| expand(a)).collect();
            }
            Self::SearchApi(c) => c.api_key = expand(&c.api_key),
            Self::Chat(c) => c.api_key = expand(&c.api_key),
            Self::ImageApi(c) => c.api_key = expand(&c.api_key),
        }
    }
}

/// Unresolvable variables are left as written.
fn expand(raw: &str) -> String {
    match shellexpand::full(raw) {
        Ok(v) => v.into_owned(),
        Err(e) => {
            tracing::warn!(value = raw, error = %e, "failed to expand config value");
            raw.to_string()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandToolConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchApiConfig {
    #[serde(default = "default_search_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatToolConfig {
    #[serde(default = "default_chat_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_chat_model")]
    pub model: String,
    /// Overrides the per-kind default temperature.
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageApiConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_image_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    60_000
}

fn default_image_timeout_ms() -> u64 {
    120_000
}

fn default_search_url() -> String {
    "https://api.tavily.com".to_string()
}

fn default_max_results() -> u32 {
    5
}

fn default_chat_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
}

fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    8080
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::types::UnknownToolPolicy;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert!(cfg.logging.enabled);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.executor.unknown_tool, UnknownToolPolicy::Error);
        assert!(cfg.tools.search.is_none());
        assert_eq!(cfg.http_server.port, 8080);
    }

    #[test]
    fn test_tagged_tool_backends() {
        let raw = r#"
            [executor]
            max_parallel = 4
            unknown_tool = "placeholder"

            [tools.search]
            kind = "search_api"
            api_key = "k"
            max_results = 3

            [tools.generate]
            kind = "chat"
            model = "local-model"
            base_url = "http://localhost:11434/v1"

            [tools.image]
            kind = "command"
            program = "render-image"
            args = ["--png"]
        "#;
        let cfg: AppConfig = toml::from_str(raw).unwrap();

        assert_eq!(cfg.executor.max_parallel, Some(4));
        assert_eq!(cfg.executor.unknown_tool, UnknownToolPolicy::Placeholder);

        match cfg.tools.for_kind(&ToolKind::Search) {
            Some(ToolBackendConfig::SearchApi(s)) => {
                assert_eq!(s.max_results, 3);
                assert_eq!(s.base_url, "https://api.tavily.com");
            }
            other => panic!("unexpected search backend: {other:?}"),
        }
        match cfg.tools.for_kind(&ToolKind::Generate) {
            Some(ToolBackendConfig::Chat(c)) => {
                assert_eq!(c.model, "local-model");
                assert_eq!(c.temperature, None);
            }
            other => panic!("unexpected generate backend: {other:?}"),
        }
        assert_eq!(
            cfg.tools.for_kind(&ToolKind::Image).map(|b| b.kind_name()),
            Some("command")
        );
        assert!(cfg.tools.for_kind(&ToolKind::Other("x".into())).is_none());
    }

    #[test]
    fn test_unknown_backend_kind_is_rejected() {
        let raw = r#"
            [tools.search]
            kind = "carrier_pigeon"
        "#;
        assert!(toml::from_str::<AppConfig>(raw).is_err());
    }

    #[test]
    fn test_expand_env_in_api_keys() {
        std::env::set_var("STEPFLOW_TEST_CHAT_KEY", "sk-test");
        let mut tools = ToolsConfig {
            edit: Some(ToolBackendConfig::Chat(ChatToolConfig {
                base_url: default_chat_url(),
                api_key: "${STEPFLOW_TEST_CHAT_KEY}".to_string(),
                model: default_chat_model(),
                temperature: None,
                timeout_ms: default_timeout_ms(),
            })),
            ..Default::default()
        };
        tools.expand_env();
        match tools.edit {
            Some(ToolBackendConfig::Chat(c)) => assert_eq!(c.api_key, "sk-test"),
            other => panic!("unexpected edit backend: {other:?}"),
        }
    }
}
