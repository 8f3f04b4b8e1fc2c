use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PLACEHOLDER_ISSUER_NAME: &str = "Person_name";
pub const PLACEHOLDER_ISSUER_EMAIL: &str = "example@email.com";

/// Registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }

    pub fn issuer(&self) -> Issuer {
        Issuer::new(Some(self.name.clone()), Some(self.email.clone()))
    }
}

/// The party an invoice is issued on behalf of.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Issuer {
    pub fn new(name: Option<String>, email: Option<String>) -> Self {
        Self { name, email }
    }

    /// Issuer name, or `"Person_name"` when unknown or blank.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(PLACEHOLDER_ISSUER_NAME)
    }

    /// Issuer email, or `"example@email.com"` when unknown or blank.
    pub fn display_email(&self) -> &str {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(PLACEHOLDER_ISSUER_EMAIL)
    }
}
