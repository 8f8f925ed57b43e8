use std::env;
use std::time::Duration;

const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";

#[derive(Debug, Clone)]
pub struct PreflightConfig {
    pub registry_url: String,
    pub registry_concurrency: usize,
    pub fetch_retries: u32,
    pub retry_base_delay: Duration,
    pub verbose: bool,
}

impl PreflightConfig {
    pub fn from_env() -> Self {
        let mut config = PreflightConfig::default();

        if let Ok(value) =
            env::var("NPM_CONFIG_REGISTRY").or_else(|_| env::var("npm_config_registry"))
        {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                config.registry_url = normalize_registry_url(trimmed);
            }
        }

        if let Ok(value) = env::var("PREFLIGHT_REGISTRY_CONCURRENCY")
            && let Ok(parsed) = value.trim().parse::<usize>()
            && parsed > 0
        {
            config.registry_concurrency = parsed;
        }

        if let Ok(value) = env::var("PREFLIGHT_RETRIES")
            && let Ok(parsed) = value.trim().parse::<u32>()
            && parsed > 0
        {
            config.fetch_retries = parsed;
        }

        if let Ok(value) = env::var("PREFLIGHT_RETRY_DELAY_MS")
            && let Ok(parsed) = value.trim().parse::<u64>()
        {
            config.retry_base_delay = Duration::from_millis(parsed);
        }

        if let Ok(value) = env::var("PREFLIGHT_VERBOSE") {
            let v = value.trim().to_ascii_lowercase();
            config.verbose = matches!(v.as_str(), "1" | "true" | "yes" | "y" | "on");
        }

        config
    }
}

impl Default for PreflightConfig {
    fn default() -> Self {
        PreflightConfig {
            registry_url: DEFAULT_REGISTRY.to_string(),
            registry_concurrency: 16,
            fetch_retries: 3,
            retry_base_delay: Duration::from_millis(250),
            verbose: false,
        }
    }
}

fn normalize_registry_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
