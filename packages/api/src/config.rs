use std::{env, fmt::Display, str::FromStr, time::Duration};

#[derive(Clone, Debug)]
pub struct RedemptionConfig {
    pub radius_m: f64,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
}

#[derive(Clone, Debug)]
pub struct DispatchConfig {
    pub push_url: Option<String>,
    pub email_url: Option<String>,
    pub token: Option<String>,
    pub email_delay: Duration,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    /// Memory store is used when unset
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub redemption: RedemptionConfig,
    pub dispatch: DispatchConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingVar("JWT_SECRET"))?;

        let radius_m: f64 = parse_or(&lookup, "REDEMPTION_RADIUS_M", 100.0)?;
        if !(radius_m.is_finite() && radius_m > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "REDEMPTION_RADIUS_M",
                reason: "must be a positive number of meters".to_string(),
            });
        }

        Ok(Config {
            port: parse_or(&lookup, "PORT", 8080)?,
            database_url: non_empty(&lookup, "DATABASE_URL"),
            jwt_secret,
            redemption: RedemptionConfig {
                radius_m,
                rate_limit_max: parse_or(&lookup, "RATE_LIMIT_MAX", 10)?,
                rate_limit_window: Duration::from_secs(parse_or(
                    &lookup,
                    "RATE_LIMIT_WINDOW_SECS",
                    60,
                )?),
            },
            dispatch: DispatchConfig {
                push_url: non_empty(&lookup, "PUSH_WEBHOOK_URL"),
                email_url: non_empty(&lookup, "EMAIL_WEBHOOK_URL"),
                token: non_empty(&lookup, "DISPATCH_TOKEN"),
                email_delay: Duration::from_secs(parse_or(&lookup, "EMAIL_DELAY_SECS", 5)?),
            },
        })
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = non_empty(lookup, key) else {
        tracing::info!("{key} not set, using default: {default}");
        return Ok(default);
    };

    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[("JWT_SECRET", "secret")]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url, None);
        assert_eq!(config.redemption.radius_m, 100.0);
        assert_eq!(config.redemption.rate_limit_max, 10);
        assert_eq!(config.redemption.rate_limit_window, Duration::from_secs(60));
        assert_eq!(config.dispatch.email_delay, Duration::from_secs(5));
        assert_eq!(config.dispatch.push_url, None);
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("JWT_SECRET", "secret"),
            ("PORT", "9000"),
            ("DATABASE_URL", "postgres://localhost/m1ssion"),
            ("REDEMPTION_RADIUS_M", "250"),
            ("RATE_LIMIT_MAX", "3"),
            ("PUSH_WEBHOOK_URL", "https://example.test/push"),
            ("EMAIL_WEBHOOK_URL", " "),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/m1ssion"));
        assert_eq!(config.redemption.radius_m, 250.0);
        assert_eq!(config.redemption.rate_limit_max, 3);
        assert_eq!(config.dispatch.push_url.as_deref(), Some("https://example.test/push"));
        assert_eq!(config.dispatch.email_url, None);
    }

    #[test]
    fn jwt_secret_is_required() {
        assert!(matches!(
            config(&[]),
            Err(ConfigError::MissingVar("JWT_SECRET"))
        ));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config(&[("JWT_SECRET", "s"), ("PORT", "eighty")]),
            Err(ConfigError::InvalidValue { key: "PORT", .. })
        ));
        assert!(matches!(
            config(&[("JWT_SECRET", "s"), ("REDEMPTION_RADIUS_M", "-5")]),
            Err(ConfigError::InvalidValue { key: "REDEMPTION_RADIUS_M", .. })
        ));
    }
}
