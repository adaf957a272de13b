use super::*;

use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn no_env(_: &str) -> Option<String> {
    None
}

fn temp_settings_file(contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("portal_settings_test_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join(SETTINGS_FILE);
    fs::write(&path, contents).expect("write settings");
    path
}

#[test]
fn missing_file_yields_defaults() {
    let settings = load_settings_from(Path::new("/nonexistent/portal.toml"), no_env);
    assert_eq!(settings, PortalSettings::default());
    assert_eq!(settings.max_upload_bytes, 5 * 1024 * 1024);
}

#[test]
fn file_values_then_env_overrides_apply_in_order() {
    let path = temp_settings_file(
        r#"
base_url = "http://portal.internal:8080"
static_prefix = "/media"
redirect_delay_ms = 50
reconcile_profile_after_upload = false
"#,
    );

    let settings = load_settings_from(&path, |key| match key {
        "APP__BASE_URL" => Some("http://override:9000".to_string()),
        "APP__PASSWORD_FORM_HIDE_MS" => Some("10".to_string()),
        _ => None,
    });

    assert_eq!(settings.base_url, "http://override:9000");
    assert_eq!(settings.static_prefix, "/media");
    assert_eq!(settings.redirect_delay(), Duration::from_millis(50));
    assert_eq!(settings.password_form_hide_delay(), Duration::from_millis(10));
    assert!(!settings.reconcile_profile_after_upload);

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn media_url_joins_static_prefix_onto_base() {
    let settings = PortalSettings::default();
    assert_eq!(
        settings.media_url("uploads/avatar_1.png"),
        "http://127.0.0.1:5000/static/uploads/avatar_1.png"
    );

    let nested = PortalSettings {
        base_url: "https://example.org/portal".into(),
        ..PortalSettings::default()
    };
    assert_eq!(
        nested.media_url("/animations/clip.mp4"),
        "https://example.org/portal/static/animations/clip.mp4"
    );
}

#[test]
fn cache_busting_appends_volatile_parameter() {
    assert_eq!(cache_busted("/static/p.png", 42), "/static/p.png?t=42");
    assert_eq!(cache_busted("/static/p.png?v=1", 42), "/static/p.png?v=1&t=42");
}

#[test]
fn rejects_unparseable_base_url() {
    let settings = PortalSettings {
        base_url: "not a url".into(),
        ..PortalSettings::default()
    };
    assert!(settings.parsed_base_url().is_err());
    assert_eq!(settings.media_url("a.png"), "/static/a.png");
}
