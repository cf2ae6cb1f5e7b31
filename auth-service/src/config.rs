use anyhow::{anyhow, bail, Context, Result};
use common_auth::{JwtConfig, DEFAULT_TTL_SECONDS, MAX_TTL_SECONDS, MIN_SECRET_BYTES};
use std::env;
use std::net::SocketAddr;

/// Patterns that never require a principal unless `AUTH_PUBLIC_PATHS` overrides them.
pub const DEFAULT_PUBLIC_PATHS: &[&str] = &[
    "/",
    "/favicon.ico",
    "/**/*.png",
    "/**/*.gif",
    "/**/*.svg",
    "/**/*.jpg",
    "/**/*.html",
    "/**/*.css",
    "/**/*.js",
    "/api/auth/**",
    "/healthz",
];

const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt: JwtConfig,
    pub public_paths: Vec<String>,
    pub cors_allowed_origins: Vec<String>,
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
}

impl AuthConfig {
    /// Configuration with defaults for everything except the signing secret.
    pub fn with_secret(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            jwt: JwtConfig::new(secret),
            public_paths: DEFAULT_PUBLIC_PATHS.iter().map(|p| p.to_string()).collect(),
            cors_allowed_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
            database_url: None,
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

pub fn load_auth_config() -> Result<AuthConfig> {
    auth_config_from(|key| env::var(key).ok())
}

/// Builds the configuration from an arbitrary variable lookup.
pub fn auth_config_from<F>(lookup: F) -> Result<AuthConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let secret = lookup("JWT_SECRET")
        .and_then(|value| normalize_optional(&value))
        .ok_or_else(|| anyhow!("JWT_SECRET must be set"))?;
    if secret.len() < MIN_SECRET_BYTES {
        bail!(
            "JWT_SECRET must be at least {MIN_SECRET_BYTES} bytes, got {}",
            secret.len()
        );
    }

    let ttl_seconds = lookup("JWT_TTL_SECONDS")
        .and_then(|value| normalize_optional(&value))
        .map(|value| parse_ttl(&value))
        .transpose()
        .context("Failed to parse JWT_TTL_SECONDS")?
        .unwrap_or(DEFAULT_TTL_SECONDS);

    let mut config = AuthConfig::with_secret(secret.into_bytes());
    config.jwt = config.jwt.with_ttl_seconds(ttl_seconds);

    if let Some(paths) = lookup("AUTH_PUBLIC_PATHS") {
        let parsed = parse_list(&paths);
        if !parsed.is_empty() {
            config.public_paths = parsed;
        }
    }

    if let Some(origins) = lookup("CORS_ALLOWED_ORIGINS") {
        let parsed = parse_list(&origins);
        if !parsed.is_empty() {
            config.cors_allowed_origins = parsed;
        }
    }

    config.database_url = lookup("DATABASE_URL").and_then(|value| normalize_optional(&value));

    if let Some(host) = lookup("HOST").and_then(|value| normalize_optional(&value)) {
        config.host = host;
    }
    if let Some(port) = lookup("PORT").and_then(|value| normalize_optional(&value)) {
        config.port = port
            .parse()
            .map_err(|err| anyhow!("Invalid PORT '{port}': {err}"))?;
    }

    Ok(config)
}

fn parse_ttl(value: &str) -> Result<i64> {
    let seconds: i64 = value
        .parse()
        .map_err(|err| anyhow!("Invalid token lifetime '{value}': {err}"))?;
    if seconds <= 0 {
        bail!("Token lifetime must be positive, got {seconds}");
    }
    if seconds > MAX_TTL_SECONDS {
        bail!("Token lifetime must be at most {MAX_TTL_SECONDS} seconds, got {seconds}");
    }
    Ok(seconds)
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(|c| c == ',' || c == ';' || c == ' ')
        .filter_map(normalize_optional)
        .collect()
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
