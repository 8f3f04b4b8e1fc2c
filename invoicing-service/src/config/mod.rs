use rust_decimal::Decimal;
use serde::Deserialize;
use service_core::config::{self as core_config, get_env};
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct InvoicingConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub persistence: PersistenceBackend,
    pub mongodb: MongoConfig,
    pub jwt: JwtConfig,
    pub tax: TaxConfig,
    pub document: DocumentConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: Option<String>,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxConfig {
    pub rate: Decimal,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentConfig {
    pub brand: String,
    pub tagline: String,
    pub title: String,
    pub currency_prefix: String,
    pub amount_precision: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub login_attempts: u32,
    pub login_window_seconds: u64,
    pub register_attempts: u32,
    pub register_window_seconds: u64,
}

const DEV_JWT_SECRET: &str = "dev-only-invoicing-secret-change-me";

impl InvoicingConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common = core_config::Config::load()?;

        let environment: Environment = get_env("ENVIRONMENT", Some("dev"), false)?.parse()?;
        let is_prod = environment == Environment::Prod;

        let persistence: PersistenceBackend =
            get_env("PERSISTENCE_BACKEND", Some("memory"), is_prod)?.parse()?;
        let mongo_uri = env::var("MONGODB_URI").ok();
        if persistence == PersistenceBackend::Mongo && mongo_uri.is_none() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "MONGODB_URI is required when PERSISTENCE_BACKEND=mongo"
            )));
        }

        let amount_precision = parse_number::<u32>(
            "AMOUNT_PRECISION",
            &get_env("AMOUNT_PRECISION", Some("2"), false)?,
        )?;
        if amount_precision != 0 && amount_precision != 2 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "AMOUNT_PRECISION must be 0 or 2, got {}",
                amount_precision
            )));
        }

        let tax_rate = parse_number::<Decimal>("TAX_RATE", &get_env("TAX_RATE", Some("0.18"), false)?)?;
        if tax_rate.is_sign_negative() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "TAX_RATE must not be negative"
            )));
        }

        Ok(Self {
            common,
            environment,
            service_name: get_env("SERVICE_NAME", Some("invoicing-service"), false)?,
            log_level: get_env("LOG_LEVEL", Some("info"), false)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            persistence,
            mongodb: MongoConfig {
                uri: mongo_uri,
                database: get_env("MONGODB_DATABASE", Some("invoice_db"), false)?,
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET", Some(DEV_JWT_SECRET), is_prod)?,
                expiry_hours: parse_number(
                    "JWT_EXPIRY_HOURS",
                    &get_env("JWT_EXPIRY_HOURS", Some("24"), false)?,
                )?,
            },
            tax: TaxConfig {
                rate: tax_rate,
                label: get_env("TAX_LABEL", Some("GST"), false)?,
            },
            document: DocumentConfig {
                brand: get_env("DOCUMENT_BRAND", Some("Levitation"), false)?,
                tagline: get_env("DOCUMENT_TAGLINE", Some("infotech"), false)?,
                title: get_env("DOCUMENT_TITLE", Some("INVOICE GENERATOR"), false)?,
                currency_prefix: get_env("CURRENCY_PREFIX", Some("Rs."), false)?,
                amount_precision,
            },
            rate_limit: RateLimitConfig {
                login_attempts: parse_number(
                    "RATE_LIMIT_LOGIN_ATTEMPTS",
                    &get_env("RATE_LIMIT_LOGIN_ATTEMPTS", Some("5"), false)?,
                )?,
                login_window_seconds: parse_number(
                    "RATE_LIMIT_LOGIN_WINDOW_SECONDS",
                    &get_env("RATE_LIMIT_LOGIN_WINDOW_SECONDS", Some("900"), false)?,
                )?,
                register_attempts: parse_number(
                    "RATE_LIMIT_REGISTER_ATTEMPTS",
                    &get_env("RATE_LIMIT_REGISTER_ATTEMPTS", Some("3"), false)?,
                )?,
                register_window_seconds: parse_number(
                    "RATE_LIMIT_REGISTER_WINDOW_SECONDS",
                    &get_env("RATE_LIMIT_REGISTER_WINDOW_SECONDS", Some("3600"), false)?,
                )?,
            },
        })
    }
}

/// Development settings with in-memory persistence.
impl Default for InvoicingConfig {
    fn default() -> Self {
        Self {
            common: core_config::Config { port: 8080 },
            environment: Environment::Dev,
            service_name: "invoicing-service".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            persistence: PersistenceBackend::Memory,
            mongodb: MongoConfig {
                uri: None,
                database: "invoice_db".to_string(),
            },
            jwt: JwtConfig {
                secret: DEV_JWT_SECRET.to_string(),
                expiry_hours: 24,
            },
            tax: TaxConfig {
                rate: Decimal::new(18, 2),
                label: "GST".to_string(),
            },
            document: DocumentConfig::default(),
            rate_limit: RateLimitConfig {
                login_attempts: 5,
                login_window_seconds: 900,
                register_attempts: 3,
                register_window_seconds: 3600,
            },
        }
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            brand: "Levitation".to_string(),
            tagline: "infotech".to_string(),
            title: "INVOICE GENERATOR".to_string(),
            currency_prefix: "Rs.".to_string(),
            amount_precision: 2,
        }
    }
}

impl FromStr for Environment {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "prod" | "production" => Ok(Environment::Prod),
            _ => Err(AppError::ConfigError(anyhow::anyhow!(
                "Invalid environment: {}",
                s
            ))),
        }
    }
}

impl FromStr for PersistenceBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(PersistenceBackend::Mongo),
            "memory" => Ok(PersistenceBackend::Memory),
            _ => Err(AppError::ConfigError(anyhow::anyhow!(
                "Invalid persistence backend: {}",
                s
            ))),
        }
    }
}

fn parse_number<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("{} is invalid: {}", key, e)))
}
