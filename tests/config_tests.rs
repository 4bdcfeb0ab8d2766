use hagaki_labels::config::{ConfigError, HagakiConfig, LayoutConfig, TextDirection};

#[test]
fn test_load_without_file_gives_defaults() {
    let config = HagakiConfig::load(None).unwrap();
    assert_eq!(config, HagakiConfig::default());
    assert_eq!(config.layout.page_width_mm, 100.0);
    assert_eq!(config.layout.page_height_mm, 148.0);
    assert_eq!(config.layout.address.direction, TextDirection::Vertical);
}

#[test]
fn test_load_layers_file_over_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hagaki.json");
    std::fs::write(
        &path,
        r#"{
            "layout": { "char_spacing": 1.5, "fonts": ["Noto Serif CJK JP"] },
            "columns": { "address": "送付先住所" },
            "pipeline": { "progress_interval": 25 }
        }"#,
    )
    .unwrap();

    let config = HagakiConfig::load(Some(&path)).unwrap();
    assert_eq!(config.layout.char_spacing, 1.5);
    assert_eq!(config.layout.fonts, vec!["Noto Serif CJK JP".to_string()]);
    assert_eq!(config.layout.name, LayoutConfig::default().name);
    assert_eq!(config.columns.address, "送付先住所");
    assert_eq!(config.columns.name, "氏名");
    assert_eq!(config.pipeline.progress_interval, 25);
    assert_eq!(config.pipeline.jobs, 1);
}

#[test]
fn test_invalid_layout_rejected_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hagaki.json");
    std::fs::write(&path, r#"{ "layout": { "fonts": [] } }"#).unwrap();

    assert!(matches!(
        HagakiConfig::load(Some(&path)),
        Err(ConfigError::InvalidLayout(_))
    ));
}

#[test]
fn test_missing_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = HagakiConfig::load(Some(&dir.path().join("absent.json")));
    assert!(matches!(result, Err(ConfigError::Read { .. })));
}

#[test]
fn test_broken_json_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hagaki.json");
    std::fs::write(&path, "{ layout: ").unwrap();
    assert!(matches!(
        HagakiConfig::load(Some(&path)),
        Err(ConfigError::Parse { .. })
    ));
}
