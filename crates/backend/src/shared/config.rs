use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub tables: TablesConfig,
    #[serde(default)]
    pub etl: EtlSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

/// Где живут таблицы
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Локальный файл SQLite (разработка)
    Sqlite,
    /// PostgREST / Supabase
    Rest,
    /// В памяти, без сохранения между запусками
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
    #[serde(default)]
    pub rest_url: String,
    #[serde(default)]
    pub rest_key: String,
}

fn default_sqlite_path() -> String {
    "target/db/fitzone.db".to_string()
}

/// Имена таблиц. Загрузчики получают их отсюда, а не из констант.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TablesConfig {
    pub members: String,
    pub check_ins: String,
    pub payments: String,
    pub memberships: String,
    pub membership_types: String,
    pub dim_member: String,
    pub dim_date: String,
    pub fact_visits: String,
    pub fact_revenue: String,
    pub etl_run_log: String,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            members: "members".to_string(),
            check_ins: "check_ins".to_string(),
            payments: "payments".to_string(),
            memberships: "memberships".to_string(),
            membership_types: "membership_types".to_string(),
            dim_member: "dim_member".to_string(),
            dim_date: "dim_date".to_string(),
            fact_visits: "fact_visits".to_string(),
            fact_revenue: "fact_revenue".to_string(),
            etl_run_log: "etl_run_log".to_string(),
        }
    }
}

impl TablesConfig {
    /// Таблицы хранилища вместе с их ключевой колонкой
    pub fn warehouse_tables(&self) -> Vec<(&str, &'static str)> {
        vec![
            (self.dim_member.as_str(), "member_key"),
            (self.dim_date.as_str(), "date_key"),
            (self.fact_visits.as_str(), "visit_key"),
            (self.fact_revenue.as_str(), "revenue_key"),
        ]
    }
}

/// Квантование времени суток для `time_key`
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    /// hour*100 + минуты, округлённые вниз до 15
    QuarterHour,
    /// hour*100
    Hour,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EtlSettings {
    pub days_back: i64,
    pub days_forward: i64,
    pub time_bucket: TimeBucket,
}

impl Default for EtlSettings {
    fn default() -> Self {
        Self {
            days_back: 365,
            days_forward: 180,
            time_bucket: TimeBucket::QuarterHour,
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
port = 3000

[store]
backend = "sqlite"
sqlite_path = "target/db/fitzone.db"

[etl]
days_back = 365
days_forward = 180
time_bucket = "quarter_hour"
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
///
/// `SUPABASE_URL` / `SUPABASE_ANON_KEY` override the REST settings either way.
pub fn load_config() -> anyhow::Result<Config> {
    let mut config = load_file_or_default()?;
    apply_env_overrides(
        &mut config,
        std::env::var("SUPABASE_URL").ok(),
        std::env::var("SUPABASE_ANON_KEY").ok(),
    );
    Ok(config)
}

fn load_file_or_default() -> anyhow::Result<Config> {
    // Try to find config.toml next to the executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                return parse_config(&contents);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    // Fall back to default config
    tracing::info!("Using default embedded configuration");
    parse_config(DEFAULT_CONFIG)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut Config, url: Option<String>, key: Option<String>) {
    if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
        config.store.rest_url = url;
    }
    if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
        config.store.rest_key = key;
    }
}

/// Get the SQLite file path from configuration
/// Resolves relative paths relative to the executable directory
pub fn get_database_path(config: &Config) -> PathBuf {
    let db_path = Path::new(&config.store.sqlite_path);

    // If absolute path, use as is
    if db_path.is_absolute() {
        return db_path.to_path_buf();
    }

    // If relative path, resolve it relative to the executable directory
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return exe_dir.join(db_path);
        }
    }

    // Fallback: use relative to current directory
    PathBuf::from(&config.store.sqlite_path)
}
