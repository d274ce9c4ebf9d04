//! # Demo Server Configuration
//!
//! Read from the environment:
//!
//! | Variable                      | Default | Meaning                                  |
//! |-------------------------------|---------|------------------------------------------|
//! | `PORT`                        | `8080`  | listen port                              |
//! | `GATECHECK_COOKIE_SECRET_HEX` | unset   | signed-cookie key, hex, at least 64 bytes |
//! | `GATECHECK_BUNDLE`            | unset   | bundle document for `POST /echo/{id}`    |
//! | `GATECHECK_REQ_CONTEXT`       | `false` | pass the request as validation context   |
//! | `GATECHECK_ABORT_EARLY`       | `true`  | report only the first violation          |
//! | `GATECHECK_CONVERT`           | `true`  | coerce string input                      |
//! | `GATECHECK_STRIP_UNKNOWN`     | `false` | drop undeclared keys                     |

use std::path::PathBuf;

use axum_extra::extract::cookie::Key;
use gatecheck_core::{CheckOptions, ValidationOptions};
use thiserror::Error;

/// Minimum signed-cookie secret length accepted by [`Key`].
pub const MIN_SECRET_LEN: usize = 64;

/// Invalid demo configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} is not a valid port: {value}")]
    InvalidPort { var: &'static str, value: String },

    #[error("{var} must be true or false, got {value:?}")]
    InvalidBool { var: &'static str, value: String },

    #[error("GATECHECK_COOKIE_SECRET_HEX invalid hex: {0}")]
    InvalidHex(String),

    #[error("GATECHECK_COOKIE_SECRET_HEX must decode to at least {MIN_SECRET_LEN} bytes, got {actual}")]
    SecretTooShort { actual: usize },
}

/// Demo server configuration.
#[derive(Clone)]
pub struct DemoConfig {
    pub port: u16,
    /// Signed-cookie key; `None` disables signed cookies.
    pub cookie_key: Option<Key>,
    /// Bundle document guarding `POST /echo/{id}`.
    pub bundle_path: Option<PathBuf>,
    pub options: ValidationOptions,
    pub check: CheckOptions,
}

impl std::fmt::Debug for DemoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoConfig")
            .field("port", &self.port)
            .field("cookie_key", &self.cookie_key.as_ref().map(|_| "[REDACTED]"))
            .field("bundle_path", &self.bundle_path)
            .field("options", &self.options)
            .field("check", &self.check)
            .finish()
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            cookie_key: None,
            bundle_path: None,
            options: ValidationOptions::default(),
            check: CheckOptions::default(),
        }
    }
}

impl DemoConfig {
    /// Build configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] for unparseable values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] for unparseable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port: u16 = match lookup("PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort { var: "PORT", value })?,
            None => defaults.port,
        };

        let cookie_key = lookup("GATECHECK_COOKIE_SECRET_HEX")
            .filter(|s| !s.trim().is_empty())
            .map(|hex| cookie_key_from_hex(&hex))
            .transpose()?;

        let bundle_path = lookup("GATECHECK_BUNDLE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let flag = |var: &'static str, default: bool| -> Result<bool, ConfigError> {
            match lookup(var) {
                None => Ok(default),
                Some(value) => parse_bool(&value).ok_or(ConfigError::InvalidBool { var, value }),
            }
        };

        let options = ValidationOptions::default()
            .abort_early(flag("GATECHECK_ABORT_EARLY", defaults.options.abort_early)?)
            .convert(flag("GATECHECK_CONVERT", defaults.options.convert)?)
            .strip_unknown(flag("GATECHECK_STRIP_UNKNOWN", defaults.options.strip_unknown)?);
        let check = CheckOptions {
            req_context: flag("GATECHECK_REQ_CONTEXT", defaults.check.req_context)?,
        };

        Ok(Self {
            port,
            cookie_key,
            bundle_path,
            options,
            check,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn cookie_key_from_hex(hex: &str) -> Result<Key, ConfigError> {
    let bytes = hex_decode(hex).map_err(ConfigError::InvalidHex)?;
    if bytes.len() < MIN_SECRET_LEN {
        return Err(ConfigError::SecretTooShort {
            actual: bytes.len(),
        });
    }
    Ok(Key::from(bytes.as_slice()))
}

/// Decode a hex string into bytes.
fn hex_decode(s: &str) -> Result<Vec<u8>, String> {
    let s = s.trim();
    if s.len() % 2 != 0 {
        return Err(format!("hex string has odd length: {}", s.len()));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            s.get(i..i + 2)
                .ok_or_else(|| format!("non-ASCII input at position {i}"))
                .and_then(|pair| {
                    u8::from_str_radix(pair, 16)
                        .map_err(|e| format!("invalid hex at position {i}: {e}"))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = DemoConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.cookie_key.is_none());
        assert!(config.bundle_path.is_none());
        assert_eq!(config.options, ValidationOptions::default());
        assert!(!config.check.req_context);
    }

    #[test]
    fn flags_and_port_are_read() {
        let config = DemoConfig::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("GATECHECK_REQ_CONTEXT", "true"),
            ("GATECHECK_ABORT_EARLY", "0"),
            ("GATECHECK_STRIP_UNKNOWN", "yes"),
            ("GATECHECK_BUNDLE", "/etc/gatecheck/echo.yaml"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert!(config.check.req_context);
        assert!(!config.options.abort_early);
        assert!(config.options.convert);
        assert!(config.options.strip_unknown);
        assert_eq!(
            config.bundle_path,
            Some(PathBuf::from("/etc/gatecheck/echo.yaml"))
        );
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(matches!(
            DemoConfig::from_lookup(lookup(&[("PORT", "http")])),
            Err(ConfigError::InvalidPort { .. })
        ));
        assert!(matches!(
            DemoConfig::from_lookup(lookup(&[("GATECHECK_CONVERT", "maybe")])),
            Err(ConfigError::InvalidBool { .. })
        ));
    }

    #[test]
    fn cookie_secret_must_be_long_enough() {
        let short = "ab".repeat(32);
        assert!(matches!(
            DemoConfig::from_lookup(lookup(&[("GATECHECK_COOKIE_SECRET_HEX", short.as_str())])),
            Err(ConfigError::SecretTooShort { actual: 32 })
        ));
        let long = "ab".repeat(64);
        let config =
            DemoConfig::from_lookup(lookup(&[("GATECHECK_COOKIE_SECRET_HEX", long.as_str())])).unwrap();
        assert!(config.cookie_key.is_some());
    }

    #[test]
    fn debug_redacts_cookie_key() {
        let long = "cd".repeat(64);
        let config =
            DemoConfig::from_lookup(lookup(&[("GATECHECK_COOKIE_SECRET_HEX", long.as_str())])).unwrap();
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("cdcd"));
    }

    #[test]
    fn hex_decode_rejects_garbage() {
        assert!(hex_decode("abc").is_err());
        assert!(hex_decode("zz").is_err());
        assert_eq!(hex_decode("00ff").unwrap(), vec![0x00, 0xff]);
    }
}
