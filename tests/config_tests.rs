use std::collections::HashMap;
use std::path::PathBuf;

use folio::core::config::AppConfig;
use folio::storage::{BackendKind, Domain, StorageTarget};

fn config_with(vars: &[(&str, &str)]) -> AppConfig {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    AppConfig::from_lookup(|key| map.get(key).cloned()).unwrap()
}

const KV_VARS: [(&str, &str); 3] = [
    ("KV_REST_API_URL", "https://kv.example.com"),
    ("KV_REST_API_TOKEN", "kv-token"),
    ("KV_URL", "rediss://default:pw@kv.example.com:6379"),
];

#[test]
fn test_no_configuration_selects_file_for_both_domains() {
    let config = config_with(&[]);

    assert_eq!(config.storage.backend(), BackendKind::File);
    assert_eq!(
        config.storage.select(Domain::Portfolio),
        StorageTarget::File {
            path: PathBuf::from("data/portfolio.json")
        }
    );
    assert_eq!(
        config.storage.select(Domain::Analytics),
        StorageTarget::File {
            path: PathBuf::from("data/analytics.json")
        }
    );
}

#[test]
fn test_complete_kv_triple_selects_kv() {
    let config = config_with(&KV_VARS);

    assert_eq!(config.storage.backend(), BackendKind::KeyValue);
    assert_eq!(
        config.storage.select(Domain::Analytics),
        StorageTarget::KeyValue {
            key: "analytics:data".to_string()
        }
    );
}

#[test]
fn test_partial_kv_configuration_falls_back_to_file() {
    let config = config_with(&KV_VARS[..2]);
    assert_eq!(config.storage.backend(), BackendKind::File);
}

#[test]
fn test_blob_token_takes_precedence() {
    let mut vars = KV_VARS.to_vec();
    vars.push(("BLOB_READ_WRITE_TOKEN", "vercel_blob_rw_x"));
    let config = config_with(&vars);

    assert_eq!(config.storage.backend(), BackendKind::Blob);
    assert_eq!(
        config.storage.select(Domain::Portfolio),
        StorageTarget::Blob {
            pathname: "data/portfolio.json".to_string()
        }
    );
}

#[test]
fn test_blank_values_count_as_absent() {
    let config = config_with(&[("BLOB_READ_WRITE_TOKEN", "   ")]);
    assert_eq!(config.storage.backend(), BackendKind::File);
}

#[test]
fn test_data_dir_override() {
    let config = config_with(&[("DATA_DIR", "/tmp/folio")]);
    assert_eq!(
        config.storage.select(Domain::Portfolio),
        StorageTarget::File {
            path: PathBuf::from("/tmp/folio/portfolio.json")
        }
    );
}

#[test]
fn test_debug_output_never_contains_secrets() {
    let mut vars = KV_VARS.to_vec();
    vars.push(("BLOB_READ_WRITE_TOKEN", "vercel_blob_rw_secret"));
    vars.push(("ADMIN_SESSION_SECRET", "session-secret"));
    let rendered = format!("{:?}", config_with(&vars));

    for secret in ["vercel_blob_rw_secret", "kv-token", "session-secret", "Praveen@14"] {
        assert!(!rendered.contains(secret), "leaked {secret} in {rendered}");
    }
}

#[test]
fn test_admin_passwords_default_and_override() {
    let config = config_with(&[]);
    assert_eq!(config.auth.passwords, vec!["Praveen@14", "Relax!2002"]);
    assert!(!config.auth.secure_cookies);

    let config = config_with(&[("ADMIN_PASSWORDS", " one , two ,"), ("APP_ENV", "production")]);
    assert_eq!(config.auth.passwords, vec!["one", "two"]);
    assert!(config.auth.secure_cookies);
}

#[test]
fn test_empty_password_list_is_a_config_error() {
    let result = AppConfig::from_lookup(|key| (key == "ADMIN_PASSWORDS").then(|| ",,".to_string()));
    assert!(result.is_err());
}
