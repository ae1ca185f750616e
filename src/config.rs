use std::env;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use dotenvy::dotenv;

use crate::model::role::Role;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,

    pub rate_protected_per_min: u32,
    pub db_max_connections: u32,
    pub role_cache_ttl_secs: u64,

    // Logging
    pub log_dir: String,
    pub log_level: String,

    /// Roles notified when a leave request is submitted.
    pub leave_approver_roles: Vec<Role>,
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{} must be set", key))
}

fn parsed_or<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, env::var(key).ok(), default)
}

fn parse_value<T>(key: &str, raw: Option<String>, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = raw.unwrap_or_else(|| default.to_string());
    raw.parse()
        .map_err(|e| anyhow!("{} has invalid value '{}': {}", key, raw, e))
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();

        let roles = env::var("LEAVE_APPROVER_ROLES").unwrap_or_else(|_| "admin,hr".to_string());
        let leave_approver_roles = Role::parse_list(&roles)
            .map_err(|e| anyhow!("LEAVE_APPROVER_ROLES has invalid value '{}': {}", roles, e))?;

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", "1000")?,
            db_max_connections: parsed_or("DB_MAX_CONNECTIONS", "10")?,
            role_cache_ttl_secs: parsed_or("ROLE_CACHE_TTL_SECS", "60")?,

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            leave_approver_roles,
        })
    }
}
