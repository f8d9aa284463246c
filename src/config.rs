use std::env;
use std::str::FromStr;

use serde::Deserialize;
use tracing::warn;

pub const WORKERS_ENV: &str = "PAR_PARTITION_WORKERS";
pub const THREAD_PERCENTAGE_ENV: &str = "PAR_PARTITION_THREAD_PERCENTAGE";

/// Worker pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Number of worker threads (0 = derive from available cores)
    pub workers: usize,
    /// Percentage of CPU cores to use when `workers` is 0 (1-100)
    pub thread_percentage: u8,
    /// Worker thread name prefix
    pub thread_name: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            workers: 0,
            thread_percentage: 100,
            thread_name: "par_partition worker".to_string(),
        }
    }
}

impl ExecutorConfig {
    /// Default configuration with environment overrides applied.
    pub fn from_env() -> ExecutorConfig {
        ExecutorConfig::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> ExecutorConfig {
        if let Some(workers) = read_env(WORKERS_ENV) {
            self.workers = workers;
        }
        if let Some(percentage) = read_env::<u8>(THREAD_PERCENTAGE_ENV) {
            if (1 ..= 100).contains(&percentage) {
                self.thread_percentage = percentage;
            } else {
                warn!(value = percentage, "ignoring {} outside of 1..=100", THREAD_PERCENTAGE_ENV);
            }
        }
        self
    }

    /// Number of workers to spawn: the explicit count if set, otherwise the
    /// configured percentage of available cores, never less than one.
    pub fn resolve_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        let cpu_cores = num_cpus::get();
        let percentage = self.thread_percentage.clamp(1, 100) as usize;
        ((cpu_cores * percentage) / 100).max(1)
    }
}

fn read_env<T>(name: &str) -> Option<T> where T: FromStr {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) =>
            Some(value),
        Err(_) => {
            warn!(value = %raw, "ignoring unparsable {}", name);
            None
        },
    }
}

/// Tunables of the automatic chunking heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target number of chunks per unit of executor concurrency
    pub chunks_per_worker: usize,
    /// Smallest chunk the heuristic will create (the last chunk may be smaller)
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        ChunkingConfig {
            chunks_per_worker: 4,
            min_chunk_size: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChunkingConfig, ExecutorConfig};

    #[test]
    fn explicit_workers_win() {
        let config = ExecutorConfig { workers: 3, ..Default::default() };
        assert_eq!(config.resolve_workers(), 3);
    }

    #[test]
    fn percentage_never_yields_zero_workers() {
        let config = ExecutorConfig { thread_percentage: 1, ..Default::default() };
        assert!(config.resolve_workers() >= 1);
        assert!(config.resolve_workers() <= num_cpus::get());
    }

    #[test]
    fn partial_documents_keep_defaults() {
        let config: ExecutorConfig = serde_json::from_str(r#"{ "workers": 6 }"#).unwrap();
        assert_eq!(config.workers, 6);
        assert_eq!(config.thread_percentage, 100);

        let chunking: ChunkingConfig = serde_json::from_str(r#"{ "min_chunk_size": 1 }"#).unwrap();
        assert_eq!(chunking, ChunkingConfig { chunks_per_worker: 4, min_chunk_size: 1 });
    }
}
