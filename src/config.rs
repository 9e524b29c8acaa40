use anyhow::{bail, Context, Result};
use std::env;

const DEV_SECRET: &str = "dev-mode-secret-not-for-production-use-123456";
// one week
const MAX_TOKEN_EXPIRE_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub jwt_secret: String,
    pub token_expire_minutes: i64,
    pub seed_demo_data: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = parse_var("PORT", 8000)?;
        let token_expire_minutes = token_lifetime(parse_var("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?)?;
        let seed_demo_data = parse_var("SEED_DEMO_DATA", true)?;

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(s) if s.len() >= 32 => s,
            Ok(_) => bail!("JWT_SECRET must be at least 32 characters"),
            Err(_) => {
                tracing::warn!("JWT_SECRET not set, using development secret");
                DEV_SECRET.to_owned()
            }
        };

        Ok(Config {
            port,
            jwt_secret,
            token_expire_minutes,
            seed_demo_data,
        })
    }

    pub fn dev() -> Self {
        Config {
            port: 8000,
            jwt_secret: DEV_SECRET.to_owned(),
            token_expire_minutes: 30,
            seed_demo_data: false,
        }
    }
}

fn token_lifetime(minutes: i64) -> Result<i64> {
    if !(1..=MAX_TOKEN_EXPIRE_MINUTES).contains(&minutes) {
        bail!("ACCESS_TOKEN_EXPIRE_MINUTES must be between 1 and {MAX_TOKEN_EXPIRE_MINUTES}, got {minutes}");
    }
    Ok(minutes)
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(v) => v.parse().with_context(|| format!("invalid {key}: {v:?}")),
        Err(_) => Ok(default),
    }
}
