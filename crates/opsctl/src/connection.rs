//! Invoker construction from profile credentials.

use tracing::{debug, info};

use opsctl_core::{Config, HttpInvoker};

use crate::error::Result;

/// User agent string for opsctl HTTP requests
const OPSCTL_USER_AGENT: &str = concat!("opsctl/", env!("CARGO_PKG_VERSION"));

/// Create an authenticated invoker from profile credentials, with
/// environment variable override support.
///
/// When --config-file is explicitly specified, environment variables are
/// ignored so an isolated config really is isolated (explicit wins:
/// CLI args > env vars > defaults).
pub fn create_invoker(
    config: &Config,
    profile_name: Option<&str>,
    explicit_config: bool,
) -> Result<HttpInvoker> {
    let use_env_vars = !explicit_config;
    if !use_env_vars {
        info!("--config-file specified explicitly, ignoring environment variables");
    }

    let env_url = if use_env_vars {
        std::env::var("OPSCTL_URL").ok()
    } else {
        None
    };
    let env_token = if use_env_vars {
        std::env::var("OPSCTL_TOKEN").ok()
    } else {
        None
    };
    let env_insecure = if use_env_vars {
        std::env::var("OPSCTL_INSECURE").ok()
    } else {
        None
    };

    let (url, token, insecure) = if let Some(url) = env_url {
        // A URL from the environment stands on its own; no profile needed.
        info!("using service endpoint from environment variables");
        let insecure = env_insecure
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("true") || s == "1")
            .unwrap_or(false);
        (url, env_token, insecure)
    } else {
        let (name, profile) = config.resolve_profile(profile_name)?;
        info!(profile = %name, url = %profile.url, "using configured profile");

        // Partial environment overrides still apply on top of the profile.
        let token = env_token.or_else(|| profile.token.clone());
        let insecure = env_insecure
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("true") || s == "1")
            .unwrap_or(profile.insecure);
        (profile.url.clone(), token, insecure)
    };

    debug!(
        token = if token.is_some() { "configured" } else { "not set" },
        insecure, "building HTTP invoker"
    );

    let mut builder = HttpInvoker::builder()
        .url(url)
        .user_agent(OPSCTL_USER_AGENT)
        .insecure(insecure);
    if let Some(token) = token {
        builder = builder.token(token);
    }
    Ok(builder.build()?)
}
