use pretty_assertions::assert_eq;
use rollout_fs::{ConfigStore, Error, Format, NormalizedPath};
use rstest::rstest;
use serde::Deserialize;
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

#[derive(Debug, Deserialize, PartialEq)]
struct Settings {
    name: String,
    #[serde(default)]
    count: i32,
}

#[rstest]
#[case("settings.toml", "name = \"web\"\ncount = 3")]
#[case("settings.json", r#"{"name": "web", "count": 3}"#)]
#[case("settings.yaml", "name: web\ncount: 3")]
#[case("settings.yml", "name: web\ncount: 3")]
fn test_load_detects_format(#[case] file: &str, #[case] content: &str) {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join(file);
    fs::write(&file_path, content).unwrap();

    let settings: Settings = ConfigStore::new().load(&NormalizedPath::new(&file_path)).unwrap();
    assert_eq!(
        settings,
        Settings {
            name: "web".into(),
            count: 3
        }
    );
}

#[test]
fn test_load_as_ignores_extension() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("web");
    fs::write(&file_path, "port: 80\n").unwrap();

    let value: Value = ConfigStore::new()
        .load_as(&NormalizedPath::new(&file_path), Format::Yaml)
        .unwrap();
    assert_eq!(value, json!({"port": 80}));
}

#[test]
fn test_blank_yaml_is_empty_mapping() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("empty.yml");
    fs::write(&file_path, "\n  \n").unwrap();

    let value: Value = ConfigStore::new().load(&NormalizedPath::new(&file_path)).unwrap();
    assert_eq!(value, json!({}));
}

#[test]
fn test_unsupported_extension() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("settings.ini");
    fs::write(&file_path, "[x]").unwrap();

    let result: Result<Value, _> = ConfigStore::new().load(&NormalizedPath::new(&file_path));
    assert!(matches!(result, Err(Error::UnsupportedFormat { extension }) if extension == "ini"));
}

#[test]
fn test_parse_error_names_path_and_format() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("broken.yml");
    fs::write(&file_path, "key: [unterminated").unwrap();

    let err = ConfigStore::new()
        .load::<Value>(&NormalizedPath::new(&file_path))
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("YAML"), "got: {message}");
    assert!(message.contains("broken.yml"), "got: {message}");
}

#[test]
fn test_load_optional_missing_file() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path()).join("absent.yml");

    let value: Option<Value> = ConfigStore::new().load_optional(&path).unwrap();
    assert!(value.is_none());
}
