//! Configuration module
//!
//! Process configuration is read once at startup by [`Config::from_env`] and then
//! handed to constructors. Nothing below the binary reads the environment.

use std::env;

use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 8080;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const ACCESS_TOKEN_TTL_MINUTES: i64 = 15;
const REFRESH_TOKEN_TTL_DAYS: i64 = 7;
const MAX_UPLOAD_SIZE_MB: usize = 50;
const SMTP_PORT: u16 = 587;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_S3_REGION: &str = "us-east-1";
const DEFAULT_LOCAL_STORAGE_PATH: &str = "./storage";
const DEFAULT_LOCAL_STORAGE_BASE_URL: &str = "http://localhost:8080/media";
const DEFAULT_YOOKASSA_API_URL: &str = "https://api.yookassa.ru";

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub max_upload_size_mb: usize,
    pub environment: String,
    /// `pretty` or `json`
    pub log_format: String,
}

/// Token signing and lifetimes
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: String,
    /// Custom endpoint for S3-compatible providers (MinIO, Yandex Object Storage, ...)
    pub s3_endpoint: Option<String>,
    pub local_storage_path: String,
    pub local_storage_base_url: String,
}

/// Payment gateway (YooKassa) credentials
#[derive(Clone, Debug, Default)]
pub struct PaymentConfig {
    pub shop_id: Option<String>,
    pub secret_key: Option<String>,
    pub api_url: String,
    pub webhook_secret: Option<String>,
}

impl PaymentConfig {
    pub fn gateway_configured(&self) -> bool {
        self.shop_id.is_some() && self.secret_key.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
    pub tls: bool,
}

impl SmtpConfig {
    pub fn is_configured(&self) -> bool {
        self.host.is_some() && self.from.is_some()
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: SMTP_PORT,
            user: None,
            password: None,
            from: None,
            tls: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub database_url: String,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    /// Base URL of the web client; short links and redirects are built on it.
    pub frontend_url: String,
    pub payment: PaymentConfig,
    pub smtp: SmtpConfig,
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server_port = match lookup("SERVER_PORT").or_else(|| lookup("PORT")) {
            Some(port) => port
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("SERVER_PORT must be a valid number"))?,
            None => SERVER_PORT,
        };

        let base = BaseConfig {
            server_port,
            cors_origins,
            db_max_connections: parse_or(lookup("DB_MAX_CONNECTIONS"), MAX_CONNECTIONS),
            db_timeout_seconds: parse_or(lookup("DB_TIMEOUT_SECONDS"), CONNECTION_TIMEOUT_SECS),
            max_upload_size_mb: parse_or(lookup("MAX_UPLOAD_SIZE_MB"), MAX_UPLOAD_SIZE_MB),
            environment,
            log_format: lookup("LOG_FORMAT").unwrap_or_else(|| "pretty".to_string()),
        };

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let auth = AuthConfig {
            jwt_secret: lookup("JWT_SECRET")
                .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            access_token_ttl_minutes: parse_or(
                lookup("ACCESS_TOKEN_TTL_MINUTES"),
                ACCESS_TOKEN_TTL_MINUTES,
            ),
            refresh_token_ttl_days: parse_or(
                lookup("REFRESH_TOKEN_TTL_DAYS"),
                REFRESH_TOKEN_TTL_DAYS,
            ),
        };

        let backend = match lookup("STORAGE_BACKEND") {
            Some(raw) => raw
                .parse::<StorageBackend>()
                .map_err(|e| anyhow::anyhow!("STORAGE_BACKEND: {}", e))?,
            None => StorageBackend::S3,
        };

        let storage = StorageConfig {
            backend,
            s3_bucket: non_empty(lookup("S3_BUCKET")),
            s3_region: lookup("S3_REGION")
                .or_else(|| lookup("AWS_REGION"))
                .unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
            s3_endpoint: non_empty(lookup("S3_ENDPOINT")),
            local_storage_path: lookup("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|| DEFAULT_LOCAL_STORAGE_PATH.to_string()),
            local_storage_base_url: lookup("LOCAL_STORAGE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_LOCAL_STORAGE_BASE_URL.to_string()),
        };

        let frontend_url = lookup("FRONTEND_URL")
            .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let payment = PaymentConfig {
            shop_id: non_empty(lookup("YOOKASSA_SHOP_ID")),
            secret_key: non_empty(lookup("YOOKASSA_SECRET_KEY")),
            api_url: lookup("YOOKASSA_API_URL")
                .unwrap_or_else(|| DEFAULT_YOOKASSA_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            webhook_secret: non_empty(lookup("PAYMENT_WEBHOOK_SECRET")),
        };

        let smtp = SmtpConfig {
            host: non_empty(lookup("SMTP_HOST")),
            port: parse_or(lookup("SMTP_PORT"), SMTP_PORT),
            user: non_empty(lookup("SMTP_USER")),
            password: non_empty(lookup("SMTP_PASSWORD")),
            from: non_empty(lookup("SMTP_FROM")),
            tls: lookup("SMTP_TLS")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(true),
        };

        Ok(Self {
            base,
            database_url,
            auth,
            storage,
            frontend_url,
            payment,
            smtp,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.auth.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !(self.database_url.starts_with("postgresql://")
            || self.database_url.starts_with("postgres://"))
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.is_production() && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.storage.backend == StorageBackend::S3 && self.storage.s3_bucket.is_none() {
            return Err(anyhow::anyhow!(
                "S3_BUCKET must be set when using S3 storage backend"
            ));
        }

        if self.smtp.host.is_some() && self.smtp.from.is_none() {
            return Err(anyhow::anyhow!("SMTP_HOST requires SMTP_FROM to be set"));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.base.server_port
    }

    pub fn jwt_secret(&self) -> &str {
        &self.auth.jwt_secret
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.base.max_upload_size_mb * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const SECRET: &str = "test-secret-key-min-32-characters-long";

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgresql://localhost/fotoart"),
            ("JWT_SECRET", SECRET),
            ("S3_BUCKET", "photos"),
        ]))
        .unwrap();

        assert_eq!(config.server_port(), 8080);
        assert_eq!(config.auth.access_token_ttl_minutes, 15);
        assert_eq!(config.auth.refresh_token_ttl_days, 7);
        assert_eq!(config.storage.backend, StorageBackend::S3);
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert!(!config.payment.gateway_configured());
        assert!(!config.smtp.is_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_jwt_secret_is_error() {
        let result = Config::from_lookup(lookup_from(&[(
            "DATABASE_URL",
            "postgresql://localhost/fotoart",
        )]));
        assert!(result.is_err());
    }

    #[test]
    fn test_short_jwt_secret_fails_validation() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgresql://localhost/fotoart"),
            ("JWT_SECRET", "short"),
            ("STORAGE_BACKEND", "local"),
        ]))
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_s3_backend_requires_bucket() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/fotoart"),
            ("JWT_SECRET", SECRET),
        ]))
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("S3_BUCKET"));
    }

    #[test]
    fn test_frontend_url_trailing_slash_trimmed() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgresql://localhost/fotoart"),
            ("JWT_SECRET", SECRET),
            ("STORAGE_BACKEND", "local"),
            ("FRONTEND_URL", "https://book-foto-art.ru/"),
        ]))
        .unwrap();
        assert_eq!(config.frontend_url, "https://book-foto-art.ru");
    }

    #[test]
    fn test_wildcard_cors_rejected_in_production() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgresql://localhost/fotoart"),
            ("JWT_SECRET", SECRET),
            ("STORAGE_BACKEND", "local"),
            ("ENVIRONMENT", "production"),
        ]))
        .unwrap();
        assert!(config.is_production());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_port_is_error() {
        let result = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgresql://localhost/fotoart"),
            ("JWT_SECRET", SECRET),
            ("SERVER_PORT", "not-a-port"),
        ]));
        assert!(result.is_err());
    }
}
