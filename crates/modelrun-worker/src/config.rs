// Worker configuration
// Decision: Environment variables with defaults, no config file

use uuid::Uuid;

/// Configuration for the model side worker
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Worker ID (unique identifier for this worker instance)
    pub worker_id: String,
    /// Whether the display side shares the worker's address space
    pub object_steps: bool,
    /// Log level applied to the worker and core crates
    pub log_level: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: format!("worker-{}", Uuid::now_v7()),
            object_steps: true,
            log_level: "info".to_string(),
        }
    }
}

impl WorkerConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let worker_id = std::env::var("MODELRUN_WORKER_ID").unwrap_or(defaults.worker_id);

        let object_steps = std::env::var("MODELRUN_OBJECT_STEPS")
            .ok()
            .and_then(|s| parse_bool(&s))
            .unwrap_or(defaults.object_steps);

        let log_level = std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level);

        Self {
            worker_id,
            object_steps,
            log_level,
        }
    }

    pub fn with_worker_id(mut self, worker_id: impl Into<String>) -> Self {
        self.worker_id = worker_id.into();
        self
    }

    pub fn with_object_steps(mut self, object_steps: bool) -> Self {
        self.object_steps = object_steps;
        self
    }

    /// Default tracing filter for the worker binary
    pub fn log_filter(&self) -> String {
        format!(
            "modelrun_worker={level},modelrun_core={level}",
            level = self.log_level
        )
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
