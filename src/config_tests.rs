use super::*;

fn parse(text: &str) -> RunConfig {
    serde_json::from_str(text).expect("parse config")
}

#[test]
fn stub_round_trips_and_validates() {
    let stub = config_stub().expect("render stub");
    let config = parse(&stub);

    assert_eq!(config, default_config());
    validate_config(&config).expect("stub is valid");
}

#[test]
fn generics_keep_document_order() {
    let config = parse(
        r#"{
            "schema_version": 1,
            "libraries": [{"name": "lib", "sources": []}],
            "testbenches": [{
                "library": "lib",
                "name": "tb_top",
                "configs": [{"name": "wide", "generics": {"width": 32, "enable": true, "alpha": "x"}}]
            }]
        }"#,
    );

    let names: Vec<_> = config.testbenches[0].configs[0]
        .generics
        .pairs()
        .iter()
        .map(|(name, _)| name.as_str())
        .collect();
    assert_eq!(names, vec!["width", "enable", "alpha"]);

    let rendered = serde_json::to_string(&config.testbenches[0].configs[0].generics)
        .expect("serialize generics");
    assert_eq!(rendered, r#"{"width":32,"enable":true,"alpha":"x"}"#);
}

#[test]
fn duplicate_generic_names_fail_to_parse() {
    let err = serde_json::from_str::<RunConfig>(
        r#"{
            "schema_version": 1,
            "testbenches": [{
                "library": "lib",
                "name": "tb",
                "configs": [{"name": "c", "generics": {"width": 1, "width": 2}}]
            }]
        }"#,
    )
    .expect_err("duplicate generic");
    assert!(err.to_string().contains("duplicate generic"), "{err}");
}

#[test]
fn unknown_fields_are_rejected() {
    let err = serde_json::from_str::<RunConfig>(r#"{"schema_version": 1, "libraries": [], "sim_option": {}}"#)
        .expect_err("typo in field name");
    assert!(err.to_string().contains("sim_option"), "{err}");
}

#[test]
fn validate_rejects_schema_mismatch() {
    let mut config = default_config();
    config.schema_version = 99;
    let err = validate_config(&config).expect_err("schema mismatch");
    assert!(err.to_string().contains("schema_version"));
}

#[test]
fn validate_rejects_undeclared_library_reference() {
    let mut config = default_config();
    config.testbenches[0].library = "vendor".to_string();
    let err = validate_config(&config).expect_err("undeclared library");
    assert!(err.to_string().contains("undeclared library"));
}

#[test]
fn validate_rejects_duplicate_libraries_case_insensitively() {
    let mut config = default_config();
    config.libraries.push(LibraryConfig {
        name: "LIB".to_string(),
        sources: Vec::new(),
    });
    let err = validate_config(&config).expect_err("duplicate library");
    assert!(err.to_string().contains("declared twice"));
}

#[test]
fn validate_rejects_dotted_names_and_repeated_tests() {
    let mut dotted = default_config();
    dotted.testbenches[0].configs[0].name = "a.b".to_string();
    assert!(validate_config(&dotted).is_err());

    let mut repeated = default_config();
    let config = repeated.testbenches[0].configs[0].clone();
    repeated.testbenches[0].configs.push(config);
    let err = validate_config(&repeated).expect_err("repeated test");
    assert!(err.to_string().contains("lib.tb_top.default"));
}

#[test]
fn validate_rejects_empty_backend_command() {
    let mut config = default_config();
    config.backend = Some(BackendConfig {
        command: "  ".to_string(),
        env: BTreeMap::new(),
    });
    assert!(validate_config(&config).is_err());
}

#[test]
fn write_and_load_round_trip() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("nested").join(DEFAULT_CONFIG_FILE);

    write_config(&path, &default_config()).expect("write config");
    let loaded = load_config(&path).expect("load config");

    assert_eq!(loaded, default_config());
}
