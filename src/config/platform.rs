use std::env;
use std::time::Duration;

/// Settings for outbound coding-platform API calls. Base URLs are
/// overridable so tests can point at a local stub server.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub leetcode_base: String,
    pub codeforces_base: String,
    pub github_base: String,
    /// Every upstream call carries this timeout. The upstreams are plain
    /// reads, so a hung call is cut rather than retried.
    pub timeout: Duration,
}

impl PlatformConfig {
    pub fn from_env() -> Self {
        let leetcode_base = env::var("LEETCODE_API_BASE")
            .unwrap_or_else(|_| "https://leetcode-stats-api.herokuapp.com".to_string());
        let codeforces_base = env::var("CODEFORCES_API_BASE")
            .unwrap_or_else(|_| "https://codeforces.com/api".to_string());
        let github_base =
            env::var("GITHUB_API_BASE").unwrap_or_else(|_| "https://api.github.com".to_string());

        let timeout_secs: u64 = env::var("PLATFORM_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Self {
            leetcode_base,
            codeforces_base,
            github_base,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}
