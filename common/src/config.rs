use std::{env, path::PathBuf, time::Duration};

/// Umbral de straggler: una tarea despachada hace más de esto vuelve a ser elegible.
pub const DEFAULT_STALE_AFTER_MS: u64 = 10_000;
/// Pausa del worker entre pedidos (y tras un WAIT).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_COORDINATOR_URL: &str = "http://127.0.0.1:8080";

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|s| s.parse::<u64>().ok())
}

/// Se puede sobreescribir con la env var MR_STALE_AFTER_MS.
pub fn stale_after() -> Duration {
    Duration::from_millis(env_u64("MR_STALE_AFTER_MS").unwrap_or(DEFAULT_STALE_AFTER_MS))
}

/// Se puede sobreescribir con la env var MR_POLL_INTERVAL_MS.
pub fn poll_interval() -> Duration {
    Duration::from_millis(env_u64("MR_POLL_INTERVAL_MS").unwrap_or(DEFAULT_POLL_INTERVAL_MS))
}

/// Directorio compartido para intermedios y salidas (MR_WORK_DIR, por defecto ".").
pub fn work_dir() -> PathBuf {
    env::var("MR_WORK_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// URL base del coordinator (COORDINATOR_URL).
pub fn coordinator_url() -> String {
    env::var("COORDINATOR_URL").unwrap_or_else(|_| DEFAULT_COORDINATOR_URL.to_string())
}

/// Parámetros de la política de planificación.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub stale_after: Duration,
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        Self {
            stale_after: stale_after(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_millis(DEFAULT_STALE_AFTER_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_after_respeta_env_var() {
        env::set_var("MR_STALE_AFTER_MS", "250");
        assert_eq!(stale_after(), Duration::from_millis(250));
        env::remove_var("MR_STALE_AFTER_MS");
        assert_eq!(stale_after(), Duration::from_millis(DEFAULT_STALE_AFTER_MS));
    }

    #[test]
    fn poll_interval_ignora_valores_invalidos() {
        env::set_var("MR_POLL_INTERVAL_MS", "no-es-un-numero");
        assert_eq!(poll_interval(), Duration::from_millis(DEFAULT_POLL_INTERVAL_MS));
        env::remove_var("MR_POLL_INTERVAL_MS");
    }
}
