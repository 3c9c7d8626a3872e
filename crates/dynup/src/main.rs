// # dynup - one-shot dynamic DNS updater
//
// Thin integration layer: parses the command line, initializes tracing,
// resolves the settings document, wires the discovery and update
// collaborators and maps the workflow outcome to a process exit code.
// All update logic lives in dynup-core.
//
// ## Configuration
//
// Settings come from a JSON document plus environment overrides:
// - `DYNUP_USERNAME`, `DYNUP_PASSWORD`, `DYNUP_HOSTNAME` (required)
// - `DYNUP_USER_AGENT`, `DYNUP_IP_PROTOCOL` (optional)
// - `DYNUP_ENCRYPT_KEY` / `DYNUP_ENCRYPT_KEY_FILE` for the credential key
//
// With the three required variables set, `--settings` may be omitted.
//
// ## Example
//
// ```bash
// dynup --settings settings.json
// dynup --encrypt hunter2 --key mysecret
// DYNUP_USERNAME=alice DYNUP_PASSWORD=... DYNUP_HOSTNAME=home.example.com dynup
// ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use dynup_core::settings::{ENV_HOSTNAME, ENV_PASSWORD, ENV_USERNAME};
use dynup_core::{
    Error, KeySource, Result, SettingsFile, UNKNOWN_EXIT_CODE, Updater, crypto,
};
use dynup_ip_http::HttpIpDiscovery;
use dynup_provider_noip::NoipClient;

/// Exit codes for failures ahead of (or instead of) a classified provider
/// reply. Classified codes come straight from the response table; the
/// unknown-reply sentinel and unexpected failures map to the generic code.
const EXIT_USAGE: u8 = 2;
const EXIT_CONFIGURATION: u8 = 10;
const EXIT_INVALID_ARGUMENT: u8 = 11;
const EXIT_DISCOVERY: u8 = 12;
const EXIT_UPDATE: u8 = 13;
const EXIT_CRYPTO: u8 = 14;
const EXIT_UNEXPECTED: u8 = 255;

#[derive(Debug, Parser)]
#[command(name = "dynup", version, about = "One-shot dynamic DNS updater")]
struct Cli {
    /// Path to the settings JSON document
    #[arg(short, long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Encrypt a credential value and print the ENC(...) form
    #[arg(short, long, value_name = "VALUE", conflicts_with = "decrypt")]
    encrypt: Option<String>,

    /// Decrypt an ENC(...) value and print the plaintext
    #[arg(short, long, value_name = "VALUE")]
    decrypt: Option<String>,

    /// Encryption key (falls back to DYNUP_ENCRYPT_KEY, then DYNUP_ENCRYPT_KEY_FILE)
    #[arg(short, long, value_name = "KEY")]
    key: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", default_value = "info", env = "DYNUP_LOG_LEVEL")]
    log_level: String,
}

/// Where the settings document comes from for this run
enum SettingsSource {
    File(PathBuf),
    EnvOnly,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to set tracing subscriber: {}", e);
        return ExitCode::from(EXIT_UNEXPECTED);
    }

    let keys = KeySource::new(cli.key.clone());

    // Auxiliary credential tooling bypasses the update workflow
    if let Some(value) = cli.encrypt.as_deref() {
        return run_cipher(value, &keys, crypto::encrypt);
    }
    if let Some(value) = cli.decrypt.as_deref() {
        return run_cipher(value, &keys, crypto::decrypt);
    }

    let Some(source) = settings_source(&cli) else {
        error!("missing --settings argument and required environment variables");
        error!(
            "pass --settings <path>, or set {}, {} and {}",
            ENV_USERNAME, ENV_PASSWORD, ENV_HOSTNAME
        );
        return ExitCode::from(EXIT_USAGE);
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("failed to create tokio runtime: {}", e);
            return ExitCode::from(EXIT_UNEXPECTED);
        }
    };

    match rt.block_on(run_update(source, &keys)) {
        Ok(code) => {
            if code == 0 {
                info!("update completed successfully");
            } else {
                warn!("update completed with status code {}", code);
            }
            ExitCode::from(status_exit_code(code))
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(error_exit_code(&e))
        }
    }
}

/// Run the full workflow: resolve configuration, wire collaborators,
/// discover and update.
async fn run_update(source: SettingsSource, keys: &KeySource) -> Result<i32> {
    let document = match &source {
        SettingsSource::File(path) => {
            info!("loading settings from {}", path.display());
            SettingsFile::load(path)?
        }
        SettingsSource::EnvOnly => {
            info!("no settings file given, running from environment variables");
            SettingsFile::default()
        }
    };

    let settings = document.resolve(keys)?;
    info!("configuration loaded and validated");

    let discovery = HttpIpDiscovery::new();
    let provider = NoipClient::from_settings(&settings);

    Updater::new(settings).run(&discovery, &provider).await
}

/// Run the --encrypt/--decrypt tooling and print the result to stdout.
fn run_cipher(
    value: &str,
    keys: &KeySource,
    operation: fn(&str, &str) -> Result<String>,
) -> ExitCode {
    let key = match keys.require() {
        Ok(key) => key,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    match operation(value, &key) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(EXIT_CRYPTO)
        }
    }
}

/// Decide where the settings document comes from.
///
/// Without `--settings`, environment-only operation requires the three
/// mandatory variables so a misconfigured cron job fails fast with a usage
/// error instead of a late validation error.
fn settings_source(cli: &Cli) -> Option<SettingsSource> {
    if let Some(path) = &cli.settings {
        return Some(SettingsSource::File(path.clone()));
    }
    let has_required = [ENV_USERNAME, ENV_PASSWORD, ENV_HOSTNAME]
        .iter()
        .all(|name| std::env::var(name).map(|v| !v.is_empty()).unwrap_or(false));
    has_required.then_some(SettingsSource::EnvOnly)
}

/// Map a classified provider status code to a process exit code.
fn status_exit_code(code: i32) -> u8 {
    if code == UNKNOWN_EXIT_CODE {
        return EXIT_UNEXPECTED;
    }
    u8::try_from(code).unwrap_or(EXIT_UNEXPECTED)
}

/// Map a terminal error to its class-specific process exit code.
fn error_exit_code(e: &Error) -> u8 {
    match e {
        Error::Configuration(_) => EXIT_CONFIGURATION,
        Error::InvalidArgument(_) | Error::InvalidInput(_) => EXIT_INVALID_ARGUMENT,
        Error::Discovery(_) => EXIT_DISCOVERY,
        Error::Update(_) => EXIT_UPDATE,
        Error::Decryption(_) | Error::MissingKey(_) => EXIT_CRYPTO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classified_codes_pass_through() {
        assert_eq!(status_exit_code(0), 0);
        assert_eq!(status_exit_code(3), 3);
        assert_eq!(status_exit_code(7), 7);
    }

    #[test]
    fn unknown_sentinel_maps_to_generic_failure() {
        assert_eq!(status_exit_code(UNKNOWN_EXIT_CODE), EXIT_UNEXPECTED);
        assert_eq!(status_exit_code(-42), EXIT_UNEXPECTED);
    }

    #[test]
    fn error_classes_have_distinct_codes() {
        assert_eq!(error_exit_code(&Error::configuration("x")), EXIT_CONFIGURATION);
        assert_eq!(error_exit_code(&Error::invalid_argument("x")), EXIT_INVALID_ARGUMENT);
        assert_eq!(error_exit_code(&Error::discovery("x")), EXIT_DISCOVERY);
        assert_eq!(error_exit_code(&Error::update("x")), EXIT_UPDATE);
        assert_eq!(error_exit_code(&Error::decryption("x")), EXIT_CRYPTO);
        assert_eq!(error_exit_code(&Error::missing_key("x")), EXIT_CRYPTO);
    }
}
