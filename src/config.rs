// config.rs - Runtime configuration
//
// Values come from the environment (a `.env` file is loaded first, like the
// rest of our tooling). Every value has a default so the in-memory store
// works without any configuration at all.

use std::env;

use crate::error::ConfigError;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_PAGE_SIZE_OPTIONS: [usize; 5] = [5, 10, 25, 50, 100];
pub const DEFAULT_EXPORT_BATCH_SIZE: usize = 100;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_DOCUMENTS_TABLE: &str = "documents";

/// Browser and store configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrowserConfig {
    /// PostgreSQL connection string; `None` means in-memory only
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub documents_table: String,
    pub default_page_size: usize,
    pub page_size_options: Vec<usize>,
    pub export_batch_size: usize,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            documents_table: DEFAULT_DOCUMENTS_TABLE.to_string(),
            default_page_size: DEFAULT_PAGE_SIZE,
            page_size_options: DEFAULT_PAGE_SIZE_OPTIONS.to_vec(),
            export_batch_size: DEFAULT_EXPORT_BATCH_SIZE,
        }
    }
}

impl BrowserConfig {
    /// Load `.env` and read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup (tests pass a map)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        if let Some(value) = lookup("DATABASE_MAX_CONNECTIONS") {
            config.max_connections = parse_positive("DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = lookup("BROWSER_DOCUMENTS_TABLE") {
            config.documents_table = validate_identifier(value.trim())?;
        }
        if let Some(value) = lookup("BROWSER_PAGE_SIZE") {
            config.default_page_size = parse_positive("BROWSER_PAGE_SIZE", &value)?;
        }
        if let Some(value) = lookup("BROWSER_PAGE_SIZE_OPTIONS") {
            config.page_size_options = parse_options("BROWSER_PAGE_SIZE_OPTIONS", &value)?;
        }
        if let Some(value) = lookup("BROWSER_EXPORT_BATCH_SIZE") {
            config.export_batch_size = parse_positive("BROWSER_EXPORT_BATCH_SIZE", &value)?;
        }

        if !config.page_size_options.contains(&config.default_page_size) {
            return Err(ConfigError::PageSizeNotAnOption {
                page_size: config.default_page_size,
                options: config.page_size_options,
            });
        }

        tracing::debug!(
            "Browser config loaded: table={}, page_size={}, options={:?}, database={}",
            config.documents_table,
            config.default_page_size,
            config.page_size_options,
            if config.database_url.is_some() { "postgres" } else { "none" }
        );

        Ok(config)
    }
}

fn parse_positive<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_options(key: &str, value: &str) -> Result<Vec<usize>, ConfigError> {
    let invalid = || ConfigError::InvalidPageSizeOptions {
        key: key.to_string(),
        value: value.to_string(),
    };

    let mut options = value
        .split(',')
        .map(|part| match part.trim().parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(invalid()),
        })
        .collect::<Result<Vec<_>, _>>()?;

    options.sort_unstable();
    options.dedup();
    Ok(options)
}

/// Table names are interpolated into SQL, so only `[A-Za-z_][A-Za-z0-9_]*`
/// (optionally schema-qualified) is accepted.
pub fn validate_identifier(name: &str) -> Result<String, ConfigError> {
    let valid_part = |part: &str| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() <= 2 && parts.iter().all(|part| valid_part(part)) && name.len() <= 63 {
        Ok(name.to_string())
    } else {
        Err(ConfigError::InvalidIdentifier(name.to_string()))
    }
}
