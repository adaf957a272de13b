use std::{
    collections::HashMap,
    fs,
    path::Path,
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;
use url::Url;

use crate::{transport::with_trailing_slash, validation::MAX_IMAGE_BYTES};

pub const SETTINGS_FILE: &str = "portal.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PortalSettings {
    pub base_url: String,
    pub static_prefix: String,
    pub default_profile_picture: String,
    pub max_upload_bytes: u64,
    pub redirect_delay_ms: u64,
    pub signup_redirect_delay_ms: u64,
    pub password_form_hide_ms: u64,
    pub reconcile_profile_after_upload: bool,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".into(),
            static_prefix: "/static".into(),
            default_profile_picture: "https://i.imgur.com/6VBx3io.png".into(),
            max_upload_bytes: MAX_IMAGE_BYTES,
            redirect_delay_ms: 2000,
            signup_redirect_delay_ms: 1000,
            password_form_hide_ms: 2000,
            reconcile_profile_after_upload: true,
        }
    }
}

impl PortalSettings {
    pub fn parsed_base_url(&self) -> anyhow::Result<Url> {
        let raw = self.base_url.trim();
        let url = Url::parse(raw).with_context(|| format!("invalid portal base url '{raw}'"))?;
        Ok(with_trailing_slash(url))
    }

    /// Resolves a stored media path (`uploads/a.png`) to the URL it is served from.
    pub fn media_url(&self, path: &str) -> String {
        let relative = format!(
            "{}/{}",
            self.static_prefix.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        match self.parsed_base_url() {
            Ok(base) => base
                .join(relative.trim_start_matches('/'))
                .map(|url| url.to_string())
                .unwrap_or(relative),
            Err(_) => relative,
        }
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }

    pub fn signup_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.signup_redirect_delay_ms)
    }

    pub fn password_form_hide_delay(&self) -> Duration {
        Duration::from_millis(self.password_form_hide_ms)
    }
}

/// Appends a volatile query parameter so a stable path is re-fetched after
/// its content changed.
pub fn cache_busted(url: &str, stamp: i64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}t={stamp}")
}

pub fn load_settings() -> PortalSettings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    file: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> PortalSettings {
    let mut settings = PortalSettings::default();

    if let Ok(raw) = fs::read_to_string(file) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => apply_file_values(&mut settings, &file_cfg),
            Err(err) => tracing::warn!(file = %file.display(), %err, "ignoring malformed settings file"),
        }
    }

    apply_env_overrides(&mut settings, env);
    settings
}

fn apply_file_values(settings: &mut PortalSettings, file_cfg: &HashMap<String, toml::Value>) {
    let text = |key: &str| file_cfg.get(key).and_then(|v| v.as_str()).map(str::to_string);
    let number = |key: &str| {
        file_cfg.get(key).and_then(|v| match v {
            toml::Value::Integer(n) => u64::try_from(*n).ok(),
            toml::Value::String(s) => s.parse().ok(),
            _ => None,
        })
    };

    if let Some(v) = text("base_url") {
        settings.base_url = v;
    }
    if let Some(v) = text("static_prefix") {
        settings.static_prefix = v;
    }
    if let Some(v) = text("default_profile_picture") {
        settings.default_profile_picture = v;
    }
    if let Some(v) = number("max_upload_bytes") {
        settings.max_upload_bytes = v;
    }
    if let Some(v) = number("redirect_delay_ms") {
        settings.redirect_delay_ms = v;
    }
    if let Some(v) = number("signup_redirect_delay_ms") {
        settings.signup_redirect_delay_ms = v;
    }
    if let Some(v) = number("password_form_hide_ms") {
        settings.password_form_hide_ms = v;
    }
    if let Some(v) = file_cfg
        .get("reconcile_profile_after_upload")
        .and_then(|v| v.as_bool())
    {
        settings.reconcile_profile_after_upload = v;
    }
}

fn apply_env_overrides(settings: &mut PortalSettings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("PORTAL_BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = env("APP__BASE_URL") {
        settings.base_url = v;
    }

    if let Some(v) = env("PORTAL_STATIC_PREFIX") {
        settings.static_prefix = v;
    }
    if let Some(v) = env("PORTAL_DEFAULT_PICTURE") {
        settings.default_profile_picture = v;
    }

    if let Some(v) = env("APP__MAX_UPLOAD_BYTES").and_then(|v| v.parse().ok()) {
        settings.max_upload_bytes = v;
    }
    if let Some(v) = env("APP__REDIRECT_DELAY_MS").and_then(|v| v.parse().ok()) {
        settings.redirect_delay_ms = v;
    }
    if let Some(v) = env("APP__SIGNUP_REDIRECT_DELAY_MS").and_then(|v| v.parse().ok()) {
        settings.signup_redirect_delay_ms = v;
    }
    if let Some(v) = env("APP__PASSWORD_FORM_HIDE_MS").and_then(|v| v.parse().ok()) {
        settings.password_form_hide_ms = v;
    }
    if let Some(v) = env("APP__RECONCILE_PROFILE_AFTER_UPLOAD").and_then(|v| v.parse().ok()) {
        settings.reconcile_profile_after_upload = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
