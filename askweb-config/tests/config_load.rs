use askweb_common::PromptStyle;
use askweb_common::observability::LogFormat;
use askweb_config::PreferencesLoader;
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn test_config_load() {
    let tmp = TempDir::new().unwrap();

    let file_yaml = r#"
serperApiKey: "${TEST_SERPER_KEY}"
ollamaBaseUrl: "http://127.0.0.1:11434/"
prompt_style: cited
logging:
  dir: "/tmp/askweb-logs"
  format: json
  filter: "askweb=debug"
"#;
    let p = write_yaml(&tmp, "askweb.yaml", file_yaml);

    temp_env::with_var("TEST_SERPER_KEY", Some("from-env"), || {
        let prefs = PreferencesLoader::new()
            .with_file(&p)
            .load()
            .expect("load preferences");

        assert_eq!(prefs.serper_api_key, "from-env");
        assert_eq!(prefs.ollama_base_url, "http://127.0.0.1:11434");
        assert_eq!(prefs.ollama_model, "llama3.2:latest");
        assert_eq!(prefs.prompt_style, PromptStyle::Cited);
        assert_eq!(prefs.logging.format, LogFormat::Json);
        assert_eq!(prefs.logging.filter, "askweb=debug");
        assert_eq!(
            prefs.logging.dir.as_deref(),
            Some(std::path::Path::new("/tmp/askweb-logs"))
        );
    });
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(
        &tmp,
        "askweb.yaml",
        "serper_api_key: file-key\nollama_model: file-model\nuse_web_search: true\n",
    );

    temp_env::with_vars(
        [
            ("ASKWEB_OLLAMA_MODEL", Some("env-model")),
            ("ASKWEB_USE_WEB_SEARCH", Some("false")),
        ],
        || {
            let prefs = PreferencesLoader::new().with_file(&p).load().unwrap();
            assert_eq!(prefs.serper_api_key, "file-key");
            assert_eq!(prefs.ollama_model, "env-model");
            assert!(!prefs.use_web_search);
        },
    );
}

#[test]
#[serial]
fn missing_optional_file_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.yaml");

    temp_env::with_var("ASKWEB_SERPER_API_KEY", Some("only-env"), || {
        let prefs = PreferencesLoader::new()
            .with_optional_file(&missing)
            .load()
            .unwrap();
        assert_eq!(prefs.serper_api_key, "only-env");
    });
}

#[test]
#[serial]
fn missing_required_file_fails() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.yaml");

    temp_env::with_var("ASKWEB_SERPER_API_KEY", Some("k"), || {
        assert!(PreferencesLoader::new().with_file(&missing).load().is_err());
    });
}

#[test]
#[serial]
fn env_and_cli_override_camel_case_file_keys() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(
        &tmp,
        "askweb.yaml",
        "serperApiKey: file-key\nollamaModel: file-model\nollamaBaseUrl: http://file-host:11434\n",
    );

    temp_env::with_vars(
        [
            ("ASKWEB_SERPER_API_KEY", Some("env-key")),
            ("ASKWEB_OLLAMA_BASE_URL", Some("http://env-host:11434")),
        ],
        || {
            let prefs = PreferencesLoader::new()
                .with_file(&p)
                .with_override("ollama_model", Some("cli-model"))
                .load()
                .expect("camelCase file with overrides");
            assert_eq!(prefs.serper_api_key, "env-key");
            assert_eq!(prefs.ollama_base_url, "http://env-host:11434");
            assert_eq!(prefs.ollama_model, "cli-model");
        },
    );

    temp_env::with_var("ASKWEB_OLLAMA_MODEL", Some("env-model"), || {
        let prefs = PreferencesLoader::new().with_file(&p).load().unwrap();
        assert_eq!(prefs.serper_api_key, "file-key");
        assert_eq!(prefs.ollama_model, "env-model");
        assert_eq!(prefs.ollama_base_url, "http://file-host:11434");
    });
}
