//! Backend configuration.
//!
//! The browser build reads these at compile time; tests feed them through
//! a map-backed [`EnvAdapter`].

use crate::error::{ClubError, ClubResult};

pub const ENV_SERVICE_URL: &str = "CLUBHUB_SUPABASE_URL";
pub const ENV_ANON_KEY: &str = "CLUBHUB_SUPABASE_ANON_KEY";
pub const ENV_ROW_SCOPE: &str = "CLUBHUB_ROW_SCOPE";

/// Source of configuration variables.
pub trait EnvAdapter {
    fn var(&self, name: &str) -> Option<String>;
}

/// Whether views list every row or only rows created by the signed-in identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopeMode {
    #[default]
    ClubWide,
    PerOwner,
}

impl ScopeMode {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "club" => Some(Self::ClubWide),
            "owner" => Some(Self::PerOwner),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Project URL without trailing slash.
    pub service_url: String,
    pub anon_key: String,
    pub scope: ScopeMode,
}

impl BackendConfig {
    pub fn new(service_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let service_url = service_url.into().trim().trim_end_matches('/').to_string();
        Self {
            service_url,
            anon_key: anon_key.into().trim().to_string(),
            scope: ScopeMode::default(),
        }
    }

    pub fn with_scope(mut self, scope: ScopeMode) -> Self {
        self.scope = scope;
        self
    }

    /// Build the configuration, naming every missing or blank variable in the error.
    ///
    /// An unrecognized scope value falls back to club-wide with a warning.
    pub fn from_env(env: &impl EnvAdapter) -> ClubResult<Self> {
        let read = |name: &str| env.var(name).filter(|v| !v.trim().is_empty());

        let url = read(ENV_SERVICE_URL);
        let key = read(ENV_ANON_KEY);

        let (url, key) = match (url, key) {
            (Some(url), Some(key)) => (url, key),
            (url, key) => {
                let missing: Vec<&str> = [(ENV_SERVICE_URL, url.is_none()), (ENV_ANON_KEY, key.is_none())]
                    .into_iter()
                    .filter_map(|(name, absent)| absent.then_some(name))
                    .collect();
                return Err(ClubError::configuration(format!(
                    "Backend not configured. Set {} before building.",
                    missing.join(" and ")
                ))
                .in_op("config.from_env"));
            }
        };

        let scope = match env.var(ENV_ROW_SCOPE) {
            None => ScopeMode::default(),
            Some(raw) => ScopeMode::parse(&raw).unwrap_or_else(|| {
                log::warn!("unknown {ENV_ROW_SCOPE} value {raw:?}, listing rows club-wide");
                ScopeMode::default()
            }),
        };

        Ok(Self::new(url, key).with_scope(scope))
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.service_url, path)
    }

    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.service_url, table)
    }
}
