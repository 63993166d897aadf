use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub otp: OtpConfig,
    #[serde(default)]
    pub admin: AdminBootstrapConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

/// Token signing settings. `key` must be at least 32 bytes.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    #[serde(default)]
    pub key: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_audience")]
    pub audience: String,
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: i64,
}

fn default_issuer() -> String { "bank-sim-api".into() }
fn default_audience() -> String { "bank-sim-clients".into() }
fn default_expiry_hours() -> i64 { 24 }

impl Default for JwtConfig {
    fn default() -> Self {
        Self { key: String::new(), issuer: default_issuer(), audience: default_audience(), expiry_hours: default_expiry_hours() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_origins() -> Vec<String> {
    vec!["http://localhost:3000".into(), "http://localhost:5173".into()]
}

impl Default for CorsConfig {
    fn default() -> Self { Self { allowed_origins: default_origins() } }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_dir() -> String { "logs".into() }

impl Default for LoggingConfig {
    fn default() -> Self { Self { dir: default_log_dir(), json: false } }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfig {
    #[serde(default = "default_otp_ttl")]
    pub ttl_minutes: i64,
    #[serde(default = "default_otp_attempts")]
    pub max_attempts: i32,
}

fn default_otp_ttl() -> i64 { 10 }
fn default_otp_attempts() -> i32 { 3 }

impl Default for OtpConfig {
    fn default() -> Self { Self { ttl_minutes: default_otp_ttl(), max_attempts: default_otp_attempts() } }
}

/// Admin account ensured at startup. Empty email disables bootstrapping.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminBootstrapConfig {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` if present (defaults otherwise), then apply env fallbacks and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default().unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.jwt.normalize_from_env();
        self.jwt.validate()?;
        self.logging.normalize_from_env();
        self.otp.validate()?;
        self.admin.normalize_from_env();
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl JwtConfig {
    pub fn normalize_from_env(&mut self) {
        if self.key.trim().is_empty() {
            if let Ok(key) = std::env::var("JWT_SECRET") {
                self.key = key;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.key.len() < 32 {
            return Err(anyhow!("jwt.key must be at least 32 bytes; set it in config.toml or JWT_SECRET"));
        }
        if self.expiry_hours <= 0 {
            return Err(anyhow!("jwt.expiry_hours must be positive"));
        }
        Ok(())
    }
}

impl LoggingConfig {
    fn normalize_from_env(&mut self) {
        if let Ok(dir) = std::env::var("LOG_DIR") {
            self.dir = dir;
        }
    }
}

impl OtpConfig {
    fn validate(&self) -> Result<()> {
        if self.ttl_minutes <= 0 || self.max_attempts <= 0 {
            return Err(anyhow!("otp.ttl_minutes and otp.max_attempts must be positive"));
        }
        Ok(())
    }
}

impl AdminBootstrapConfig {
    fn normalize_from_env(&mut self) {
        if self.email.trim().is_empty() {
            if let Ok(email) = std::env::var("ADMIN_EMAIL") {
                self.email = email;
            }
        }
        if self.password.is_empty() {
            if let Ok(pw) = std::env::var("ADMIN_PASSWORD") {
                self.password = pw;
            }
        }
        if self.full_name.trim().is_empty() {
            self.full_name = "System Administrator".into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_toml_with_defaults() {
        let cfg = load_from_str(r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [jwt]
            key = "0123456789abcdef0123456789abcdef"
        "#).unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.jwt.expiry_hours, 24);
        assert_eq!(cfg.jwt.issuer, "bank-sim-api");
        assert_eq!(cfg.otp.max_attempts, 3);
        assert_eq!(cfg.database.max_connections, 10);
        assert!(cfg.cors.allowed_origins.contains(&"http://localhost:3000".to_string()));
    }

    #[test]
    fn short_jwt_key_rejected() {
        let jwt = JwtConfig { key: "short".into(), ..JwtConfig::default() };
        assert!(jwt.validate().is_err());
    }

    #[test]
    fn database_url_scheme_checked() {
        let db = DatabaseConfig { url: "mysql://x".into(), min_connections: 1, max_connections: 2, connect_timeout_secs: 1, acquire_timeout_secs: 1, ..Default::default() };
        assert!(db.validate().is_err());
        let db = DatabaseConfig { url: "postgres://u:p@localhost/bank".into(), ..db };
        assert!(db.validate().is_ok());
    }
}
