//! CLI configuration: thin wrapper around `vitrine_config` shared types.
//!
//! Adds the resolution steps that respect `GlobalOpts` flag overrides
//! (--api-url, --api-key, --views, --insecure, --timeout).

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use tracing::debug;

use vitrine_api::{ResourceClient, TlsMode, TransportConfig};
use vitrine_config::ViewSet;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use vitrine_config::{
    Config, Defaults, KEYRING_SERVICE, Profile, config_path, load_config_or_default, save_config,
    views_path,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Views file precedence: flag > profile > defaults > platform path.
fn views_file(global: &GlobalOpts, config: &Config) -> PathBuf {
    let profile_views = config
        .profiles
        .get(&active_profile_name(global, config))
        .and_then(|p| p.views.clone());
    global
        .views_file
        .clone()
        .or(profile_views)
        .or_else(|| config.defaults.views.clone())
        .unwrap_or_else(views_path)
}

/// Load built-in views merged with the configured views file.
pub fn resolve_views(global: &GlobalOpts, config: &Config) -> Result<ViewSet, CliError> {
    let path = views_file(global, config);
    if global.views_file.is_some() && !path.exists() {
        return Err(CliError::Validation {
            field: "views".into(),
            reason: format!("file not found: {}", path.display()),
        });
    }
    let views = vitrine_config::load_views(Some(&path))?;
    Ok(match config.defaults.page_size {
        Some(page_size) if page_size > 0 => views.with_page_size(page_size),
        _ => views,
    })
}

/// Build the resource client from the active profile and flag overrides.
///
/// Without a profile, `--api-url` alone is enough (unauthenticated unless
/// `--api-key` is also given).
pub fn resolve_client(global: &GlobalOpts, config: &Config) -> Result<ResourceClient, CliError> {
    let profile_name = active_profile_name(global, config);

    let (api_url, mut transport) = if let Some(profile) = config.profiles.get(&profile_name) {
        let transport =
            vitrine_config::profile_transport(profile, &profile_name, &config.defaults)?;
        (profile.api_url.clone(), transport)
    } else if global.profile.is_some() {
        let mut available: Vec<_> = config.profiles.keys().cloned().collect();
        available.sort();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    } else {
        let url = global.api_url.clone().ok_or_else(|| CliError::NoConfig {
            path: config_path().display().to_string(),
        })?;
        let transport = TransportConfig {
            timeout: Duration::from_secs(config.defaults.timeout),
            tls: if config.defaults.insecure {
                TlsMode::DangerAcceptInvalid
            } else {
                TlsMode::System
            },
            api_key: None,
        };
        (url, transport)
    };

    // Flag overrides
    let api_url = global.api_url.clone().unwrap_or(api_url);
    if let Some(ref key) = global.api_key {
        transport.api_key = Some(SecretString::from(key.clone()));
    }
    if global.insecure {
        transport.tls = TlsMode::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        transport.timeout = Duration::from_secs(secs);
    }

    let url: url::Url = api_url.parse().map_err(|_| CliError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {api_url}"),
    })?;
    debug!(profile = %profile_name, url = %url, "resolved admin API");

    Ok(ResourceClient::new(url.as_str(), &transport)?)
}
