use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::aws::sigv4::Error as AuthError;

pub const DEFAULT_REGION: &str = "ap-southeast-2";
pub const DEFAULT_PROFILE: &str = "default";
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Bounds of the bucket existence polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaiterConfig {
    pub delay: Duration,
    pub max_attempts: u32,
}

impl Default for WaiterConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            max_attempts: 20,
        }
    }
}

/// Process wide settings, built once at startup and only ever borrowed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub region: String,
    /// Shared credentials file. `None` when neither `AWS_SHARED_CREDENTIALS_FILE` nor `HOME` is set.
    pub credentials_path: Option<PathBuf>,
    pub profile: String,
    pub max_retries: u32,
    /// S3 compatible endpoint, addressed path style. `None` targets AWS.
    pub endpoint: Option<String>,
    pub waiter: WaiterConfig,
}

impl Config {
    pub fn new<T>(region: &str, credentials_path: T) -> Self
    where
        T: Into<PathBuf>,
    {
        Self {
            region: region.to_owned(),
            credentials_path: Some(credentials_path.into()),
            profile: DEFAULT_PROFILE.to_owned(),
            max_retries: DEFAULT_MAX_RETRIES,
            endpoint: None,
            waiter: WaiterConfig::default(),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let region = lookup("AWS_REGION")
            .or_else(|| lookup("AWS_DEFAULT_REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.to_owned());

        let credentials_path = lookup("AWS_SHARED_CREDENTIALS_FILE")
            .map(PathBuf::from)
            .or_else(|| {
                lookup("HOME").map(|home| {
                    let mut path = PathBuf::from(home);
                    path.push(".aws");
                    path.push("credentials");
                    path
                })
            });

        let config = Self {
            credentials_path,
            ..Self::new(&region, PathBuf::new())
        };
        let config = match lookup("AWS_PROFILE") {
            Some(profile) => config.with_profile(&profile),
            None => config,
        };
        match lookup("AWS_ENDPOINT_URL_S3").or_else(|| lookup("AWS_ENDPOINT_URL")) {
            Some(endpoint) => config.with_endpoint(&endpoint),
            None => config,
        }
    }

    pub fn with_profile(mut self, profile: &str) -> Self {
        self.profile = profile.to_owned();
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_owned());
        self
    }

    /// The shared credentials file, failing only once a caller actually needs it.
    pub fn shared_credentials_path(&self) -> Result<&Path, AuthError> {
        self.credentials_path
            .as_deref()
            .ok_or_else(|| AuthError::env_var_error("HOME", std::env::VarError::NotPresent))
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_waiter(mut self, delay: Duration, max_attempts: u32) -> Self {
        self.waiter = WaiterConfig {
            delay,
            max_attempts,
        };
        self
    }
}
