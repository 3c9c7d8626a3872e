//! Settings document model and layered resolution.
//!
//! A run's configuration comes from up to three layers, highest priority
//! first: environment variables (`DYNUP_*`), the JSON settings document,
//! and built-in defaults. [`SettingsFile`] is the raw document;
//! [`SettingsFile::resolve`] applies the overlay, decrypts the credential
//! and validates, producing an immutable [`Settings`] that is never
//! re-resolved during the run.

use std::env;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::crypto::{self, KeySource};
use crate::error::{Error, Result};

/// Environment override for the account user name.
pub const ENV_USERNAME: &str = "DYNUP_USERNAME";
/// Environment override for the account password.
pub const ENV_PASSWORD: &str = "DYNUP_PASSWORD";
/// Environment override for the hostname to update.
pub const ENV_HOSTNAME: &str = "DYNUP_HOSTNAME";
/// Environment override for the User-Agent header.
pub const ENV_USER_AGENT: &str = "DYNUP_USER_AGENT";
/// Environment override for the address-family policy.
pub const ENV_IP_PROTOCOL: &str = "DYNUP_IP_PROTOCOL";

/// Fallback User-Agent when neither the environment nor the document
/// provides one. Exempt from the format check below.
pub const DEFAULT_USER_AGENT: &str = "dynup/0.1 no-reply@dynup.invalid";

// Provider-mandated shape: product/version, a space, a contact address
static USER_AGENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^/]+/[^\s]+ [^@]+@[^\s]+$").expect("valid user-agent pattern"));

/// Address-family policy the discovered IP must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IpProtocol {
    /// IPv4 addresses only
    Ipv4,
    /// IPv6 addresses only
    Ipv6,
    /// Either family
    #[default]
    Dual,
}

impl IpProtocol {
    /// Parse a protocol name, falling back to Dual on anything absent or
    /// unrecognized.
    pub fn from_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("ipv4") => IpProtocol::Ipv4,
            Some(v) if v.eq_ignore_ascii_case("ipv6") => IpProtocol::Ipv6,
            _ => IpProtocol::Dual,
        }
    }

    /// Canonical lowercase name, as used in the settings document.
    pub fn as_str(&self) -> &'static str {
        match self {
            IpProtocol::Ipv4 => "ipv4",
            IpProtocol::Ipv6 => "ipv6",
            IpProtocol::Dual => "dual",
        }
    }
}

impl std::fmt::Display for IpProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the provider status table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMapping {
    /// Status token as it appears as the first word of the reply
    pub status: String,
    /// Exit code reported for this status
    pub exit_code: i32,
    /// Human-readable meaning, used for logging
    pub description: String,
    /// Whether this status represents a successful update
    #[serde(default)]
    pub successful: bool,
}

/// Built-in status table for the standard dynamic-update reply set.
///
/// Used when the settings document omits `responseMappings` entirely. An
/// explicitly empty list is kept empty and rejected by validation.
pub fn default_response_mappings() -> Vec<ResponseMapping> {
    fn entry(status: &str, exit_code: i32, description: &str, successful: bool) -> ResponseMapping {
        ResponseMapping {
            status: status.to_string(),
            exit_code,
            description: description.to_string(),
            successful,
        }
    }

    vec![
        entry("good", 0, "DNS hostname update successful", true),
        entry("nochg", 1, "IP address is current, no update performed", true),
        entry("nohost", 2, "Hostname supplied does not exist under specified account", false),
        entry("badauth", 3, "Invalid username password combination", false),
        entry("badagent", 4, "Client disabled", false),
        entry("!donator", 5, "An update request was sent including a feature that is not available", false),
        entry("abuse", 6, "Username is blocked due to abuse", false),
        entry("911", 7, "A fatal error on the provider side", false),
    ]
}

/// Raw settings document, prior to overlay and validation.
///
/// All fields are optional at the document level; required fields are
/// enforced after resolution so environment-only operation works with an
/// empty document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsFile {
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub host_name: Option<String>,
    pub user_agent: Option<String>,
    /// Raw protocol name; unrecognized values fall back to dual
    pub ip_protocol: Option<String>,
    pub response_mappings: Option<Vec<ResponseMapping>>,
}

impl SettingsFile {
    /// Load a settings document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!(
                "failed to read settings file '{}': {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            Error::configuration(format!(
                "malformed settings file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Resolve the document against the process environment and validate.
    pub fn resolve(self, keys: &KeySource) -> Result<Settings> {
        self.resolve_with(keys, |name| env::var(name).ok())
    }

    /// Resolution against an injected environment lookup.
    ///
    /// The overlay rule is uniform across fields: a set, non-empty
    /// environment value wins over the document value.
    pub(crate) fn resolve_with(
        self,
        keys: &KeySource,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Settings> {
        let user_name =
            resolve_field(self.user_name.as_deref(), ENV_USERNAME, &env).unwrap_or_default();
        let host_name =
            resolve_field(self.host_name.as_deref(), ENV_HOSTNAME, &env).unwrap_or_default();

        let raw_password =
            resolve_field(self.password.as_deref(), ENV_PASSWORD, &env).unwrap_or_default();
        let password = resolve_password(&raw_password, keys)?;

        let user_agent = resolve_field(self.user_agent.as_deref(), ENV_USER_AGENT, &env)
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let ip_protocol = IpProtocol::from_value(
            resolve_field(self.ip_protocol.as_deref(), ENV_IP_PROTOCOL, &env).as_deref(),
        );

        let response_mappings = self
            .response_mappings
            .unwrap_or_else(default_response_mappings);

        let settings = Settings {
            user_name,
            password,
            host_name,
            user_agent,
            ip_protocol,
            response_mappings,
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// Env-over-file precedence for one field.
fn resolve_field(
    file_value: Option<&str>,
    env_var: &str,
    env: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    match env(env_var) {
        Some(value) if !value.is_empty() => Some(value),
        _ => file_value
            .map(str::to_string)
            .filter(|value| !value.is_empty()),
    }
}

/// Resolve the effective plaintext password.
///
/// Marker-wrapped values are decrypted with the key source; cipher
/// failures surface as configuration errors so callers see a settings
/// problem, not cipher internals.
fn resolve_password(raw: &str, keys: &KeySource) -> Result<String> {
    if !crypto::is_encrypted(raw) {
        return Ok(raw.to_string());
    }
    let key = keys
        .require()
        .map_err(|e| Error::configuration(format!("failed to decrypt password: {}", e)))?;
    crypto::decrypt(raw, &key).map_err(|_| {
        Error::configuration(
            "failed to decrypt password: invalid encryption key or corrupted encrypted value",
        )
    })
}

/// Fully-resolved update target. Immutable for the duration of a run.
#[derive(Clone)]
pub struct Settings {
    pub user_name: String,
    /// Effective plaintext password
    pub password: String,
    pub host_name: String,
    pub user_agent: String,
    pub ip_protocol: IpProtocol,
    pub response_mappings: Vec<ResponseMapping>,
}

// The resolved password never appears in Debug output
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("user_name", &self.user_name)
            .field("password", &"<REDACTED>")
            .field("host_name", &self.host_name)
            .field("user_agent", &self.user_agent)
            .field("ip_protocol", &self.ip_protocol)
            .field("response_mappings", &self.response_mappings.len())
            .finish()
    }
}

impl Settings {
    /// Validate the resolved configuration.
    ///
    /// Checks run in a fixed order so failure messages are deterministic:
    /// userName, password, hostName, userAgent format, responseMappings.
    pub fn validate(&self) -> Result<()> {
        if self.user_name.trim().is_empty() {
            return Err(Error::configuration("userName is required and cannot be empty"));
        }
        if self.password.trim().is_empty() {
            return Err(Error::configuration("password is required and cannot be empty"));
        }
        if self.host_name.trim().is_empty() {
            return Err(Error::configuration("hostName is required and cannot be empty"));
        }
        if self.user_agent != DEFAULT_USER_AGENT
            && !USER_AGENT_PATTERN.is_match(self.user_agent.trim())
        {
            return Err(Error::configuration(format!(
                "userAgent '{}' is invalid, expected format 'Name/Version contact@domain.com'",
                self.user_agent
            )));
        }
        if self.response_mappings.is_empty() {
            return Err(Error::configuration("responseMappings cannot be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn valid_file() -> SettingsFile {
        SettingsFile {
            user_name: Some("file-user".to_string()),
            password: Some("file-pass".to_string()),
            host_name: Some("home.example.com".to_string()),
            user_agent: Some("Test Client/1.2.3 admin@example.com".to_string()),
            ip_protocol: Some("ipv4".to_string()),
            response_mappings: None,
        }
    }

    fn valid_settings() -> Settings {
        valid_file().resolve_with(&KeySource::default(), no_env).unwrap()
    }

    #[test]
    fn resolves_file_values() {
        let settings = valid_settings();

        assert_eq!(settings.user_name, "file-user");
        assert_eq!(settings.password, "file-pass");
        assert_eq!(settings.host_name, "home.example.com");
        assert_eq!(settings.ip_protocol, IpProtocol::Ipv4);
        assert!(!settings.response_mappings.is_empty());
    }

    #[test]
    fn env_value_wins_over_file_value() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_USERNAME, "env-user"),
            (ENV_HOSTNAME, "env.example.com"),
        ]);
        let settings = valid_file()
            .resolve_with(&KeySource::default(), |name| {
                env.get(name).map(|v| v.to_string())
            })
            .unwrap();

        assert_eq!(settings.user_name, "env-user");
        assert_eq!(settings.host_name, "env.example.com");
        // Fields without an override keep the file value
        assert_eq!(settings.password, "file-pass");
    }

    #[test]
    fn empty_env_value_does_not_override() {
        let settings = valid_file()
            .resolve_with(&KeySource::default(), |name| {
                (name == ENV_USERNAME).then(String::new)
            })
            .unwrap();

        assert_eq!(settings.user_name, "file-user");
    }

    #[test]
    fn user_agent_falls_back_to_default() {
        let mut file = valid_file();
        file.user_agent = None;
        let settings = file.resolve_with(&KeySource::default(), no_env).unwrap();

        assert_eq!(settings.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn unrecognized_protocol_falls_back_to_dual() {
        assert_eq!(IpProtocol::from_value(None), IpProtocol::Dual);
        assert_eq!(IpProtocol::from_value(Some("carrier-pigeon")), IpProtocol::Dual);
        assert_eq!(IpProtocol::from_value(Some("IPv6")), IpProtocol::Ipv6);
        assert_eq!(IpProtocol::from_value(Some("ipv4")), IpProtocol::Ipv4);
    }

    #[test]
    fn encrypted_password_is_resolved() {
        let key = "resolver-test-key";
        let encrypted = crypto::encrypt("s3cret", key).unwrap();

        let mut file = valid_file();
        file.password = Some(encrypted);
        let settings = file
            .resolve_with(&KeySource::new(Some(key.to_string())), no_env)
            .unwrap();

        assert_eq!(settings.password, "s3cret");
    }

    #[test]
    fn wrong_key_surfaces_as_configuration_error() {
        let encrypted = crypto::encrypt("s3cret", "right-key").unwrap();

        let mut file = valid_file();
        file.password = Some(encrypted);
        let err = file
            .resolve_with(&KeySource::new(Some("wrong-key".to_string())), no_env)
            .unwrap_err();

        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("failed to decrypt password"));
    }

    #[test]
    fn missing_key_surfaces_as_configuration_error() {
        let encrypted = crypto::encrypt("s3cret", "some-key").unwrap();

        let mut file = valid_file();
        file.password = Some(encrypted);
        // No explicit key; sidestep the process environment entirely
        let keys = KeySource::new(None);
        let result = if keys.resolve().is_none() {
            file.resolve_with(&keys, no_env)
        } else {
            // Environment provides a key; the decrypt then fails the same way
            file.resolve_with(&KeySource::new(Some("wrong".into())), no_env)
        };

        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn validation_reports_user_name_first() {
        let mut settings = valid_settings();
        settings.user_name = String::new();
        settings.host_name = String::new();

        let err = settings.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: userName is required and cannot be empty"
        );
    }

    #[test]
    fn validation_order_is_deterministic() {
        let mut settings = valid_settings();
        settings.password = String::new();
        settings.host_name = String::new();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("password is required"));

        let mut settings = valid_settings();
        settings.host_name = "  ".to_string();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("hostName is required"));
    }

    #[test]
    fn validation_rejects_malformed_user_agent() {
        let mut settings = valid_settings();
        settings.user_agent = "invalid-user-agent".to_string();

        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("userAgent 'invalid-user-agent' is invalid"));
    }

    #[test]
    fn default_user_agent_is_exempt_from_pattern() {
        let mut settings = valid_settings();
        settings.user_agent = DEFAULT_USER_AGENT.to_string();

        assert!(settings.validate().is_ok());
    }

    #[test]
    fn explicitly_empty_mappings_fail_validation() {
        let mut file = valid_file();
        file.response_mappings = Some(Vec::new());

        let err = file.resolve_with(&KeySource::default(), no_env).unwrap_err();
        assert!(err.to_string().contains("responseMappings cannot be empty"));
    }

    #[test]
    fn absent_mappings_use_builtin_table() {
        let settings = valid_settings();
        let good = settings
            .response_mappings
            .iter()
            .find(|m| m.status == "good")
            .expect("builtin table has 'good'");

        assert_eq!(good.exit_code, 0);
        assert!(good.successful);
    }

    #[test]
    fn loads_document_from_disk() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"{{
                "userName": "alice",
                "password": "hunter2",
                "hostName": "home.example.com",
                "ipProtocol": "dual",
                "responseMappings": [
                    {{"status": "good", "exitCode": 0, "description": "updated", "successful": true}}
                ]
            }}"#
        )
        .unwrap();

        let file = SettingsFile::load(tmp.path()).unwrap();
        assert_eq!(file.user_name.as_deref(), Some("alice"));
        assert_eq!(
            file.response_mappings.as_ref().map(|m| m.len()),
            Some(1)
        );
    }

    #[test]
    fn load_failures_are_configuration_errors() {
        let err = SettingsFile::load(Path::new("/nonexistent/settings.json")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "not json at all").unwrap();
        let err = SettingsFile::load(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("malformed settings file"));
    }

    #[test]
    fn settings_debug_redacts_password() {
        let debug = format!("{:?}", valid_settings());
        assert!(!debug.contains("file-pass"));
        assert!(debug.contains("<REDACTED>"));
    }
}
