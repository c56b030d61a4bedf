use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "relaychat.duckdb".to_string(),
        }
    }
}

/// Upstream chat-completion API. `api_key` is the only required secret and has
/// no default; config.yaml points it at `${DEEPSEEK_API_KEY}`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UpstreamConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub system_prompt: String,
    pub timeout_secs: Option<u64>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base: "https://ark.cn-beijing.volces.com/api/v3".to_string(),
            api_key: None,
            model: "deepseek-r1-250120".to_string(),
            system_prompt: "你是人工智能助手.".to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClientConfig {
    pub relay_url: String,
    pub stream: bool,
    /// When set, store writes during streaming are throttled to this interval.
    pub persist_interval_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: "http://127.0.0.1:8080".to_string(),
            stream: true,
            persist_interval_ms: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AccountConfig {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct IdentityConfig {
    pub accounts: Vec<AccountConfig>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub upstream: UpstreamConfig,
    pub client: ClientConfig,
    pub identity: IdentityConfig,
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("RELAYCHAT").separator("__"))
            .build()?;

        let mut app_config: AppConfig = settings.try_deserialize()?;
        app_config.expand();
        Ok(app_config)
    }

    /// Resolves `${VAR}` placeholders. An empty credential counts as unset.
    fn expand(&mut self) {
        self.server.host = expand_env(&self.server.host);
        self.database.path = expand_env(&self.database.path);
        self.upstream.api_key = self
            .upstream
            .api_key
            .as_deref()
            .map(expand_env)
            .filter(|key| !key.trim().is_empty());

        for account in &mut self.identity.accounts {
            account.password = expand_env(&account.password);
        }
    }
}

fn expand_env(val: &str) -> String {
    match val.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
        Some(var_name) => std::env::var(var_name).unwrap_or_default(),
        None => val.to_string(),
    }
}
