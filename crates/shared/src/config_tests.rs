use super::*;

#[test]
fn test_defaults_without_sources() {
    temp_env::with_vars_unset(["EXPORTFLOW__LOGGING__FILTER", "RUN_MODE"], || {
        let config = AppConfig::load().unwrap();
        assert_eq!(config.logging.filter, "seeder=info,exportflow_ledger=info");
        assert!(!config.logging.json);
        assert!(config.workflow.table_file.is_none());
        assert!(config.workflow.organizations.is_empty());
        assert_eq!(config.seeder.sample_cases, 3);
    });
}

#[test]
fn test_environment_overrides_filter() {
    temp_env::with_var(
        "EXPORTFLOW__LOGGING__FILTER",
        Some("exportflow_ledger=debug"),
        || {
            let config = AppConfig::load().unwrap();
            assert_eq!(config.logging.filter, "exportflow_ledger=debug");
        },
    );
}

#[derive(Debug, Deserialize)]
struct Sample {
    organizations: Vec<OrganizationConfig>,
}

#[test]
fn test_load_document_reads_toml() {
    let path = std::env::temp_dir().join(format!("exportflow-doc-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        r#"
[[organizations]]
msp_id = "ECTAMSP"
capabilities = ["quality_authority", "registry_admin"]
"#,
    )
    .unwrap();

    let sample: Sample = load_document(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(sample.organizations.len(), 1);
    assert_eq!(sample.organizations[0].msp_id, "ECTAMSP");
    assert_eq!(
        sample.organizations[0].capabilities,
        vec!["quality_authority".to_string(), "registry_admin".to_string()]
    );
}

#[test]
fn test_load_document_missing_file_fails() {
    let result: Result<Sample, _> = load_document(Path::new("/nonexistent/exportflow.toml"));
    assert!(result.is_err());
}
