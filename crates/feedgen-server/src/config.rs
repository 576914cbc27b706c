//! Server Configuration
//!
//! Resolved once at startup: Shuttle secrets first, then process
//! environment (after `.env`), then defaults.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub max_concurrent_runs: usize,
    pub webhook_default_timeout_s: i32,
    pub webhook_default_retries: i32,
    pub pipeline_deadline: Duration,
    /// `None` disables the internal ticker (external cron only)
    pub scheduler_tick: Option<Duration>,
    pub webhook_retry_base: Duration,
    pub dispatcher_poll: Duration,
    pub dispatcher_concurrency: usize,
    pub dispatcher_batch_size: i64,
    pub api_key: Option<String>,
    pub preview_max_products: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: 50,
            webhook_default_timeout_s: 30,
            webhook_default_retries: 3,
            pipeline_deadline: Duration::from_secs(600),
            scheduler_tick: Some(Duration::from_secs(300)),
            webhook_retry_base: Duration::from_millis(1000),
            dispatcher_poll: Duration::from_secs(5),
            dispatcher_concurrency: 10,
            dispatcher_batch_size: 50,
            api_key: None,
            preview_max_products: 500,
        }
    }
}

impl AppConfig {
    /// Load from Shuttle secrets with environment fallback
    pub fn load(secrets: &shuttle_runtime::SecretStore) -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| secrets.get(key).or_else(|| std::env::var(key).ok()))
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let tick_secs: u64 = parse_or(&lookup, "SCHEDULER_TICK_SECS", 300);

        Self {
            max_concurrent_runs: parse_or(&lookup, "MAX_CONCURRENT_RUNS", defaults.max_concurrent_runs)
                .max(1),
            webhook_default_timeout_s: parse_or(
                &lookup,
                "WEBHOOK_DEFAULT_TIMEOUT_S",
                defaults.webhook_default_timeout_s,
            ),
            webhook_default_retries: parse_or(
                &lookup,
                "WEBHOOK_DEFAULT_RETRIES",
                defaults.webhook_default_retries,
            ),
            pipeline_deadline: Duration::from_secs(parse_or(&lookup, "PIPELINE_DEADLINE_S", 600)),
            scheduler_tick: (tick_secs > 0).then(|| Duration::from_secs(tick_secs)),
            webhook_retry_base: Duration::from_millis(parse_or(&lookup, "WEBHOOK_RETRY_BASE_MS", 1000)),
            dispatcher_poll: Duration::from_secs(parse_or(&lookup, "DISPATCHER_POLL_SECS", 5).max(1)),
            dispatcher_concurrency: parse_or(
                &lookup,
                "DISPATCHER_CONCURRENCY",
                defaults.dispatcher_concurrency,
            )
            .max(1),
            dispatcher_batch_size: parse_or(
                &lookup,
                "DISPATCHER_BATCH_SIZE",
                defaults.dispatcher_batch_size,
            )
            .max(1),
            api_key: lookup("FEEDGEN_API_KEY").filter(|k| !k.trim().is_empty()),
            preview_max_products: parse_or(
                &lookup,
                "PREVIEW_MAX_PRODUCTS",
                defaults.preview_max_products,
            ),
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("⚠️  Invalid value for {}: {:?}, using default", key, raw);
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg.max_concurrent_runs, 50);
        assert_eq!(cfg.webhook_default_timeout_s, 30);
        assert_eq!(cfg.webhook_default_retries, 3);
        assert_eq!(cfg.pipeline_deadline, Duration::from_secs(600));
        assert_eq!(cfg.scheduler_tick, Some(Duration::from_secs(300)));
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let cfg = config(&[
            ("MAX_CONCURRENT_RUNS", "8"),
            ("PIPELINE_DEADLINE_S", "not-a-number"),
            ("SCHEDULER_TICK_SECS", "0"),
            ("FEEDGEN_API_KEY", "secret"),
        ]);
        assert_eq!(cfg.max_concurrent_runs, 8);
        assert_eq!(cfg.pipeline_deadline, Duration::from_secs(600));
        assert!(cfg.scheduler_tick.is_none());
        assert_eq!(cfg.api_key.as_deref(), Some("secret"));
    }
}
