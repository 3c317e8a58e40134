//! Environment-driven configuration.

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub nats_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(v) => v.parse().context("PORT must be a valid port number")?,
            Err(_) => 5000,
        };
        Ok(Self {
            port,
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?,
            jwt_secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            nats_url: std::env::var("NATS_URL").ok(),
        })
    }
}
