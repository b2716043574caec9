use std::env;
use std::net::SocketAddr;

use crate::error::AppError;

pub const API_BASE_VAR: &str = "NEXT_PUBLIC_PROFESSORS_API_SERVICE";
pub const API_BASE_ALIAS: &str = "PROFESSORS_API_SERVICE";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base: String,
    pub database_url: String,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_base = env::var(API_BASE_VAR)
            .or_else(|_| env::var(API_BASE_ALIAS))
            .map_err(|_| AppError::Config(format!("{} is not set", API_BASE_VAR)))?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://faculty_admin.db?mode=rwc".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("BIND_ADDR is invalid: {}", e)))?;

        Ok(Self::new(api_base, database_url, bind_addr))
    }

    pub fn new(api_base: impl Into<String>, database_url: impl Into<String>, bind_addr: SocketAddr) -> Self {
        Self {
            api_base: normalize_base(&api_base.into()),
            database_url: database_url.into(),
            bind_addr,
        }
    }

    /// `{base}/api/{path}` without a trailing slash; callers append one.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.api_base, path.trim_matches('/'))
    }
}

fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slashes() {
        let config = AppConfig::new("http://backend:8000/", "sqlite::memory:", "127.0.0.1:0".parse().unwrap());
        assert_eq!(config.endpoint("/sections/"), "http://backend:8000/api/sections");
        assert_eq!(config.endpoint("joined-academic-years"), "http://backend:8000/api/joined-academic-years");
    }
}
