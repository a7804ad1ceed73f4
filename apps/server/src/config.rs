use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use kgiq_connect::PlaidEnvironment;

use crate::auth::decode_secret_key;

/// Plaid credentials; bank sync is disabled when they are absent.
#[derive(Clone)]
pub struct PlaidSettings {
    pub client_id: String,
    pub secret: String,
    pub environment: PlaidEnvironment,
}

#[derive(Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub jwt_secret: Vec<u8>,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// Key for provider access tokens at rest.
    pub secret_key: Vec<u8>,
    pub login_max_attempts: u32,
    pub login_window: Duration,
    pub scheduler_enabled: bool,
    pub plaid: Option<PlaidSettings>,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = env_or("KGIQ_LISTEN_ADDR", "0.0.0.0:8080")
            .parse()
            .context("Invalid KGIQ_LISTEN_ADDR")?;
        let db_path = env_or("KGIQ_DB_PATH", "./db/app.db");
        let cors_allow = env_or("KGIQ_CORS_ALLOW_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = env_parse("KGIQ_REQUEST_TIMEOUT_MS", 30000);

        let raw_jwt_secret =
            std::env::var("KGIQ_JWT_SECRET").context("KGIQ_JWT_SECRET must be set")?;
        let jwt_secret = decode_secret_key(&raw_jwt_secret).context("Invalid KGIQ_JWT_SECRET")?;
        let secret_key = match std::env::var("KGIQ_SECRET_KEY") {
            Ok(raw) if !raw.trim().is_empty() => {
                decode_secret_key(&raw).context("Invalid KGIQ_SECRET_KEY")?
            }
            _ => jwt_secret.clone(),
        };

        let plaid = match (
            std::env::var("PLAID_CLIENT_ID"),
            std::env::var("PLAID_SECRET"),
        ) {
            (Ok(client_id), Ok(secret))
                if !client_id.trim().is_empty() && !secret.trim().is_empty() =>
            {
                let environment: PlaidEnvironment = env_or("PLAID_ENV", "sandbox")
                    .parse()
                    .map_err(|e| anyhow::anyhow!("Invalid PLAID_ENV: {}", e))?;
                Some(PlaidSettings {
                    client_id,
                    secret,
                    environment,
                })
            }
            _ => None,
        };

        Ok(Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            jwt_secret,
            access_token_ttl: Duration::from_secs(env_parse("KGIQ_ACCESS_TOKEN_TTL_SECS", 900)),
            refresh_token_ttl: Duration::from_secs(env_parse(
                "KGIQ_REFRESH_TOKEN_TTL_SECS",
                2_592_000,
            )),
            secret_key,
            login_max_attempts: env_parse("KGIQ_LOGIN_MAX_ATTEMPTS", 5),
            login_window: Duration::from_secs(env_parse("KGIQ_LOGIN_WINDOW_SECS", 300)),
            scheduler_enabled: env_parse("KGIQ_SCHEDULER_ENABLED", true),
            plaid,
        })
    }
}
