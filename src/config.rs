//! Export configuration
//!
//! Read once from the process environment at startup and passed by reference
//! into every stage. All problems are collected so each one can be logged.

use reqwest::Url;
use std::path::{Path, PathBuf};

pub const ENV_PROPERTY_ID: &str = "GA_PROPERTY_ID";
pub const ENV_CREDENTIALS_PATH: &str = "GA_CREDENTIALS_PATH";
pub const ENV_DAYS_TO_PULL: &str = "GA_DAYS_TO_PULL";
pub const ENV_REPORT_LIMIT: &str = "GA_REPORT_LIMIT";
pub const ENV_STORE_HOST: &str = "ELASTICSEARCH_HOST";
pub const ENV_STORE_API_KEY: &str = "ELASTICSEARCH_API_KEY";
pub const ENV_VERIFY_CERTS: &str = "ELASTICSEARCH_VERIFY_CERTS";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

pub const DEFAULT_DAYS_TO_PULL: u32 = 30;
pub const DEFAULT_REPORT_LIMIT: u64 = 100_000;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    pub property_id: String,
    pub credentials_path: PathBuf,
    pub days_to_pull: u32,
    pub report_row_limit: u64,
    pub store_host: String,
    pub store_api_key: Option<String>,
    /// TLS certificate verification for the document store. Disabling it is an explicit opt-in.
    pub verify_certs: bool,
}

impl ExportConfig {
    /// Build and validate from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigErrors>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut errors = ConfigErrors::default();

        let property_id = match get(ENV_PROPERTY_ID) {
            Some(id) => id,
            None => {
                errors.push(ConfigIssue::Missing(ENV_PROPERTY_ID));
                String::new()
            }
        };

        let credentials_path = match get(ENV_CREDENTIALS_PATH) {
            Some(raw) => {
                let path = PathBuf::from(raw);
                if !path.is_file() {
                    errors.push(ConfigIssue::CredentialsNotFound(path.clone()));
                }
                path
            }
            None => {
                errors.push(ConfigIssue::Missing(ENV_CREDENTIALS_PATH));
                PathBuf::new()
            }
        };

        let days_to_pull = parse_positive(&get, ENV_DAYS_TO_PULL, DEFAULT_DAYS_TO_PULL, &mut errors);
        let report_row_limit =
            parse_positive(&get, ENV_REPORT_LIMIT, DEFAULT_REPORT_LIMIT, &mut errors);

        let store_host = match get(ENV_STORE_HOST) {
            Some(host) => {
                if let Err(reason) = check_store_host(&host) {
                    errors.push(ConfigIssue::Invalid {
                        key: ENV_STORE_HOST,
                        value: host.clone(),
                        reason,
                    });
                }
                host
            }
            None => {
                errors.push(ConfigIssue::Missing(ENV_STORE_HOST));
                String::new()
            }
        };

        let verify_certs = match get(ENV_VERIFY_CERTS) {
            None => true,
            Some(raw) => parse_flag(&raw).unwrap_or_else(|| {
                errors.push(ConfigIssue::Invalid {
                    key: ENV_VERIFY_CERTS,
                    value: raw,
                    reason: "expected true or false".to_string(),
                });
                true
            }),
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            property_id,
            credentials_path,
            days_to_pull,
            report_row_limit,
            store_host,
            store_api_key: get(ENV_STORE_API_KEY),
            verify_certs,
        })
    }

    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }
}

fn parse_positive<T, G>(get: &G, key: &'static str, default: T, errors: &mut ConfigErrors) -> T
where
    T: std::str::FromStr + PartialOrd + From<u8>,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    let Some(raw) = get(key) else {
        return default;
    };
    match raw.parse::<T>() {
        Ok(v) if v >= T::from(1u8) => v,
        Ok(_) => {
            errors.push(ConfigIssue::Invalid {
                key,
                value: raw,
                reason: "must be at least 1".to_string(),
            });
            default
        }
        Err(e) => {
            errors.push(ConfigIssue::Invalid {
                key,
                value: raw,
                reason: e.to_string(),
            });
            default
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

fn check_store_host(host: &str) -> Result<(), String> {
    let url = Url::parse(host).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme {:?}, expected http or https", other)),
    }
}

/// Translate `LOG_LEVEL` into a tracing filter directive.
///
/// Accepts the usual level names (including WARNING and CRITICAL) as well as
/// full directives such as `ga4_export=debug,reqwest=info`.
pub fn log_filter_directive(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return DEFAULT_LOG_LEVEL.to_string();
    };
    match raw.to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        other => other.to_string(),
    }
}

/// A single missing or invalid setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssue {
    Missing(&'static str),
    CredentialsNotFound(PathBuf),
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "{} environment variable is not set", key),
            Self::CredentialsNotFound(path) => write!(
                f,
                "GA service account credentials file not found at: {}",
                path.display()
            ),
            Self::Invalid { key, value, reason } => {
                write!(f, "{}={:?} is invalid: {}", key, value, reason)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigErrors {
    pub issues: Vec<ConfigIssue>,
}

impl ConfigErrors {
    fn push(&mut self, issue: ConfigIssue) {
        self.issues.push(issue);
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigIssue> {
        self.issues.iter()
    }
}

impl std::fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<String> = self.issues.iter().map(|i| i.to_string()).collect();
        write!(f, "{} problem(s): {}", self.issues.len(), messages.join("; "))
    }
}

impl std::error::Error for ConfigErrors {}
