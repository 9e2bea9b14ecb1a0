use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounds and pacing for a single draft's journey through the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Upper bound on one `analyze` call.
    pub analyze_timeout: Duration,
    /// Upper bound on one `commit` call.
    pub commit_timeout: Duration,
    /// Wall-clock length of one cooldown tick.
    pub tick_period: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            analyze_timeout: DEFAULT_TIMEOUT,
            commit_timeout: DEFAULT_TIMEOUT,
            tick_period: Duration::from_secs(1),
        }
    }
}

impl WorkflowConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            analyze_timeout: timeout,
            commit_timeout: timeout,
            ..Self::default()
        }
    }
}

/// Location of the risk and commit services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Joins `path` onto the base URL without doubling slashes.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joining() {
        let config = ServiceConfig::new("http://localhost:5000/");
        assert_eq!(
            config.endpoint("/api/analyze"),
            "http://localhost:5000/api/analyze"
        );
        assert_eq!(
            ServiceConfig::default().endpoint("api/send"),
            "http://localhost:5000/api/send"
        );
    }

    #[test]
    fn test_with_timeout_keeps_tick_period() {
        let config = WorkflowConfig::with_timeout(Duration::from_millis(250));
        assert_eq!(config.analyze_timeout, Duration::from_millis(250));
        assert_eq!(config.commit_timeout, Duration::from_millis(250));
        assert_eq!(config.tick_period, Duration::from_secs(1));
    }
}
