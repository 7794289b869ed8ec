use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Which index layout to target on disk.
///
/// `Leaderf` reuses indices maintained by the LeaderF vim plugin; in that
/// mode tagscope never creates or mutates index files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Tagscope,
    Leaderf,
}

/// Names of the external executables. A seam so tests can substitute
/// stub scripts for the real GNU Global toolchain.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub gtags: String,
    pub global: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            gtags: "gtags".to_string(),
            global: "global".to_string(),
        }
    }
}

/// Which of the official LSP methods are answered on the standard
/// protocol surface. The `$tagscope/*` custom requests are always live.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MethodFilter {
    Keyword(String),
    Subset(Vec<String>),
}

impl Default for MethodFilter {
    fn default() -> Self {
        MethodFilter::Keyword("all".to_string())
    }
}

impl MethodFilter {
    pub fn allows(&self, method: &str) -> bool {
        match self {
            MethodFilter::Keyword(k) => k == "all",
            MethodFilter::Subset(methods) => methods.iter().any(|m| m == method),
        }
    }
}

/// Session options, deserialized from the client's `initialization_options`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    #[serde(rename = "gtags_provider")]
    pub provider: Provider,
    /// Overrides the per-provider default cache root.
    #[serde(rename = "cache_dir")]
    pub cache_root: Option<PathBuf>,
    pub register_official_methods: MethodFilter,
    /// Deadline for a single toolchain invocation, in seconds.
    pub tool_timeout_secs: u64,
}

impl SessionConfig {
    pub fn tool_timeout(&self) -> Duration {
        if self.tool_timeout_secs == 0 {
            crate::process::DEFAULT_TIMEOUT
        } else {
            Duration::from_secs(self.tool_timeout_secs)
        }
    }
}
