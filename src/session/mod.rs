pub mod sqlite;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::AppError;

pub use sqlite::SqliteSessionStore;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const LANGUAGE_KEY: &str = "preferred-language";

/// Key/value persistence for the handful of values that outlive a page:
/// the JWT pair and the UI language.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Language::En),
            "es" => Some(Language::Es),
            _ => None,
        }
    }
}

/// Every token or preference read goes through this handle.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    pub async fn access_token(&self) -> Result<Option<String>, AppError> {
        self.store.get(ACCESS_TOKEN_KEY).await
    }

    pub async fn refresh_token(&self) -> Result<Option<String>, AppError> {
        self.store.get(REFRESH_TOKEN_KEY).await
    }

    pub async fn set_tokens(&self, access: &str, refresh: &str) -> Result<(), AppError> {
        self.store.set(ACCESS_TOKEN_KEY, access).await?;
        self.store.set(REFRESH_TOKEN_KEY, refresh).await
    }

    pub async fn set_access_token(&self, access: &str) -> Result<(), AppError> {
        self.store.set(ACCESS_TOKEN_KEY, access).await
    }

    pub async fn clear_tokens(&self) -> Result<(), AppError> {
        self.store.remove(ACCESS_TOKEN_KEY).await?;
        self.store.remove(REFRESH_TOKEN_KEY).await
    }

    /// Unknown stored codes fall back to English.
    pub async fn language(&self) -> Result<Language, AppError> {
        let stored = self.store.get(LANGUAGE_KEY).await?;
        Ok(stored
            .as_deref()
            .and_then(Language::parse)
            .unwrap_or_default())
    }

    pub async fn set_language(&self, language: Language) -> Result<(), AppError> {
        self.store.set(LANGUAGE_KEY, language.code()).await
    }
}
