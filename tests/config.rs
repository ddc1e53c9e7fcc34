#[cfg(test)]
mod tests {
    use sqlevo::libs::config::{Config, TransactionMode};
    use sqlevo::libs::version::Version;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.metadata_table_name, "changelog");
        assert_eq!(config.transaction_mode, TransactionMode::CommitEach);
        assert!(config.enable_cluster_mode);
        assert!(!config.out_of_order);
        assert_eq!(config.sql_migration_prefix, "V");
        assert_eq!(config.sql_repeatable_migration_prefix, "R");
        assert_eq!(config.sql_migration_separator, "__");
        assert_eq!(config.sql_migration_suffix, ".sql");
        assert_eq!(config.placeholder_prefix, "${");
        assert_eq!(config.placeholder_suffix, "}");
    }

    #[test]
    fn test_version_window_defaults_to_sentinels() {
        let config = Config::default();
        assert_eq!(config.start_version().unwrap(), Version::Min);
        assert_eq!(config.target_version().unwrap(), Version::Max);
    }

    #[test]
    fn test_read_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sqlevo.json");
        fs::write(
            &path,
            r#"{
                "database": "app.db",
                "target_version": "2.1",
                "transaction_mode": "rollback_all",
                "placeholders": { "owner": "bob" }
            }"#,
        )
        .unwrap();

        let config = Config::read(Some(&path)).unwrap();
        assert_eq!(config.database.clone().unwrap().to_str().unwrap(), "app.db");
        assert_eq!(config.target_version().unwrap(), Version::parse("2.1").unwrap());
        assert_eq!(config.transaction_mode, TransactionMode::RollbackAll);
        assert_eq!(config.placeholders["owner"], "bob");
        // Unset fields keep their defaults.
        assert_eq!(config.metadata_table_name, "changelog");
    }

    #[test]
    fn test_explicit_config_file_must_exist() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Config::read(Some(&temp_dir.path().join("missing.json"))).is_err());
    }

    #[test]
    fn test_transaction_mode_parsing() {
        assert_eq!("commit-each".parse::<TransactionMode>().unwrap(), TransactionMode::CommitEach);
        assert_eq!("commit_all".parse::<TransactionMode>().unwrap(), TransactionMode::CommitAll);
        assert_eq!("rollback-all".parse::<TransactionMode>().unwrap(), TransactionMode::RollbackAll);
        assert!("both".parse::<TransactionMode>().is_err());
    }

    #[test]
    fn test_unknown_encoding_is_rejected() {
        let config = Config {
            encoding: "klingon-8".to_string(),
            ..Config::default()
        };
        assert!(config.script_encoding().is_err());
        assert!(Config::default().script_encoding().is_ok());
    }
}
