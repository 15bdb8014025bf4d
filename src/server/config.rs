use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Expand environment variables in a string.
/// Supports $VAR_NAME and ${VAR_NAME} syntax. Expanded values are not
/// expanded again; unset variables become empty.
fn expand_env_vars(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  let mut chars = input.chars().peekable();

  while let Some(c) = chars.next() {
    if c != '$' {
      out.push(c);
      continue;
    }

    if chars.peek() == Some(&'{') {
      chars.next();
      let mut name = String::new();
      let mut closed = false;
      for c in chars.by_ref() {
        if c == '}' {
          closed = true;
          break;
        }
        name.push(c);
      }
      if closed {
        out.push_str(&std::env::var(&name).unwrap_or_default());
      } else {
        // Unterminated, keep as written
        out.push_str("${");
        out.push_str(&name);
      }
      continue;
    }

    let mut name = String::new();
    while let Some(&c) = chars.peek() {
      if c.is_ascii_alphanumeric() || c == '_' {
        name.push(c);
        chars.next();
      } else {
        break;
      }
    }
    if name.is_empty() {
      out.push('$');
    } else {
      out.push_str(&std::env::var(&name).unwrap_or_default());
    }
  }

  out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
  Postgres,
  Sqlite,
}

impl BackendType {
  /// Pick the backend from a connection string. Anything that is not a
  /// PostgreSQL URL is treated as a SQLite location.
  pub fn from_url(url: &str) -> Self {
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
      Self::Postgres
    } else {
      Self::Sqlite
    }
  }

  /// Strip the `sqlite:` scheme, leaving a path or `:memory:`.
  pub fn sqlite_path(url: &str) -> &str {
    url
      .strip_prefix("sqlite://")
      .or_else(|| url.strip_prefix("sqlite:"))
      .unwrap_or(url)
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
  #[serde(default)]
  pub server: ServerSection,
  #[serde(default)]
  pub database: DatabaseSection,
  #[serde(default)]
  pub autosave: AutosaveSection,
  #[serde(default)]
  pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
  #[serde(default = "default_host")]
  pub host: String,
  #[serde(default = "default_port")]
  pub port: u16,
  /// CORS allowed origins. `["*"]` or an empty list is permissive.
  #[serde(default)]
  pub cors_origins: Vec<String>,
}

fn default_host() -> String {
  "0.0.0.0".into()
}
fn default_port() -> u16 {
  3000
}

impl Default for ServerSection {
  fn default() -> Self {
    Self {
      host: default_host(),
      port: default_port(),
      cors_origins: vec!["*".to_string()],
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
  /// Single connection string: `postgres://...`, `sqlite://path` or a file path
  #[serde(default = "default_database_url")]
  pub url: String,
  #[serde(default = "default_max_conn")]
  pub max_connections: usize,
}
fn default_database_url() -> String {
  "sqlite://scribble.db".into()
}
fn default_max_conn() -> usize {
  16
}
impl Default for DatabaseSection {
  fn default() -> Self {
    Self {
      url: default_database_url(),
      max_connections: default_max_conn(),
    }
  }
}

impl DatabaseSection {
  pub fn backend(&self) -> BackendType {
    BackendType::from_url(&self.url)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutosaveSection {
  /// Quiet period after the last edit before a write is issued
  #[serde(default = "default_quiet_period_ms")]
  pub quiet_period_ms: u64,
}
fn default_quiet_period_ms() -> u64 {
  1000
}
impl Default for AutosaveSection {
  fn default() -> Self {
    Self {
      quiet_period_ms: default_quiet_period_ms(),
    }
  }
}

impl AutosaveSection {
  pub fn quiet_period(&self) -> Duration {
    Duration::from_millis(self.quiet_period_ms)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
  #[serde(default = "default_level")]
  pub level: String,
}
fn default_level() -> String {
  "info".into()
}
impl Default for LoggingSection {
  fn default() -> Self {
    Self {
      level: default_level(),
    }
  }
}

impl ServerConfig {
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
    let content = std::fs::read_to_string(&path)?;
    Self::from_yaml(&content)
  }

  pub fn from_yaml(content: &str) -> Result<Self, anyhow::Error> {
    let expanded = expand_env_vars(content);
    Ok(serde_yaml::from_str(&expanded)?)
  }

  pub fn find_and_load() -> Result<Option<Self>, anyhow::Error> {
    for p in ["scribble.yaml", "scribble.yml"] {
      if Path::new(p).exists() {
        tracing::info!("Loading config from {}", p);
        return Ok(Some(Self::from_file(p)?));
      }
    }
    Ok(None)
  }

  pub fn address(&self) -> String {
    format!("{}:{}", self.server.host, self.server.port)
  }
}
