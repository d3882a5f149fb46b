use std::env;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::Context;
use chrono::Duration;
use evlog::meta;

use crate::runtime::get_logger;

pub struct Config {
    pub database_url: String,
    pub bind: String,
    pub max_connections: u32,
    pub bcrypt_cost: u32,
    pub code_ttl: Duration,
    pub mail_from: String,
}

impl Config {
    /// Reads `MEMBERVOTE_*` variables; call after `dotenv` so a local `.env` is honoured.
    pub fn load() -> anyhow::Result<Self> {
        let database_url = env::var("MEMBERVOTE_DATABASE_URL")
            .context("expected MEMBERVOTE_DATABASE_URL")?;

        let code_ttl_minutes: i64 = try_load("MEMBERVOTE_CODE_TTL_MINUTES", 120)?;
        if code_ttl_minutes < 1 {
            anyhow::bail!("MEMBERVOTE_CODE_TTL_MINUTES must be at least 1; got {}", code_ttl_minutes);
        }

        Ok(Self {
            database_url,
            bind: try_load("MEMBERVOTE_BIND", "0.0.0.0:8080".to_owned())?,
            max_connections: try_load("MEMBERVOTE_MAX_CONNECTIONS", 5)?,
            bcrypt_cost: try_load("MEMBERVOTE_BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            code_ttl: Duration::minutes(code_ttl_minutes),
            mail_from: try_load("MEMBERVOTE_MAIL_FROM", "no-reply@membervote.local".to_owned())?,
        })
    }
}

fn try_load<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(v) => v.trim().parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {} value '{}': {}", key, v, e)),
        Err(_) => {
            get_logger().debug("Environment variable not set; using default.", meta! {
                "Key" => key,
                "Default" => default.to_string(),
            });
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variable_falls_back_to_default() {
        let v: u32 = try_load("MEMBERVOTE_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(v, 7);
    }

    #[test]
    fn unparsable_variable_is_an_error() {
        env::set_var("MEMBERVOTE_TEST_BAD_NUMBER", "seven");
        let r: anyhow::Result<u32> = try_load("MEMBERVOTE_TEST_BAD_NUMBER", 7);
        assert!(r.is_err());
    }
}
