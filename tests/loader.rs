#[cfg(test)]
mod tests {
    use sqlevo::libs::loader::{EmbeddedLoader, FileLoader, MigrationLoader, ScriptNaming};
    use sqlevo::libs::script::ScriptCategory;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct LoaderTestContext {
        temp_dir: TempDir,
    }

    impl TestContext for LoaderTestContext {
        fn setup() -> Self {
            LoaderTestContext {
                temp_dir: tempfile::tempdir().unwrap(),
            }
        }
    }

    impl LoaderTestContext {
        fn scripts_dir(&self) -> PathBuf {
            let dir = self.temp_dir.path().join("migrations");
            fs::create_dir_all(&dir).unwrap();
            dir
        }

        fn write_script(&self, name: &str, body: &str) {
            fs::write(self.scripts_dir().join(name), body).unwrap();
        }

        fn loader(&self) -> FileLoader {
            FileLoader::new(vec![self.scripts_dir()], &ScriptNaming::default(), encoding_rs::UTF_8).unwrap()
        }
    }

    #[test_context(LoaderTestContext)]
    #[test]
    fn test_versioned_scripts_sorted_by_version(ctx: &mut LoaderTestContext) {
        ctx.write_script("V10__ten.sql", "SELECT 10;");
        ctx.write_script("V2__two.sql", "SELECT 2;");
        ctx.write_script("V1.5__one_dot_five.sql", "SELECT 15;");

        let scripts = ctx.loader().versioned_scripts().unwrap();
        let names: Vec<_> = scripts.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["V1.5__one_dot_five.sql", "V2__two.sql", "V10__ten.sql"]);
        assert!(scripts.iter().all(|s| s.category == ScriptCategory::Versioned));
    }

    #[test_context(LoaderTestContext)]
    #[test]
    fn test_description_derived_from_name(ctx: &mut LoaderTestContext) {
        ctx.write_script("V1__create_users_table.sql", "CREATE TABLE users (id INTEGER);");

        let scripts = ctx.loader().versioned_scripts().unwrap();
        assert_eq!(scripts[0].description, "create users table");
        assert_eq!(scripts[0].version.as_ref().unwrap().to_string(), "1");
    }

    #[test_context(LoaderTestContext)]
    #[test]
    fn test_non_matching_files_are_ignored(ctx: &mut LoaderTestContext) {
        ctx.write_script("V1__ok.sql", "SELECT 1;");
        ctx.write_script("README.md", "not a script");
        ctx.write_script("V2_missing_separator.sql", "SELECT 2;");
        ctx.write_script("V__no_version.sql", "SELECT 3;");

        let scripts = ctx.loader().versioned_scripts().unwrap();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].name, "V1__ok.sql");
    }

    #[test_context(LoaderTestContext)]
    #[test]
    fn test_repeatable_scripts_sorted_by_name(ctx: &mut LoaderTestContext) {
        ctx.write_script("R__views.sql", "CREATE VIEW v1 AS SELECT 1;");
        ctx.write_script("R__indexes.sql", "CREATE INDEX i1 ON t(c);");

        let scripts = ctx.loader().repeatable_scripts().unwrap();
        let names: Vec<_> = scripts.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["R__indexes.sql", "R__views.sql"]);
        assert!(scripts.iter().all(|s| s.version.is_none()));
    }

    #[test_context(LoaderTestContext)]
    #[test]
    fn test_repeat_always_marker(ctx: &mut LoaderTestContext) {
        ctx.write_script("R__refresh_stats!.sql", "SELECT 1;");
        ctx.write_script("R__views.sql", "SELECT 2;");

        let scripts = ctx.loader().repeatable_scripts().unwrap();
        let always: Vec<_> = scripts.iter().filter(|s| s.must_repeat_always).collect();
        assert_eq!(always.len(), 1);
        assert_eq!(always[0].name, "R__refresh_stats!.sql");
        // Marker is stripped from the display description.
        assert_eq!(always[0].description, "refresh stats");
    }

    #[test_context(LoaderTestContext)]
    #[test]
    fn test_duplicate_version_is_rejected(ctx: &mut LoaderTestContext) {
        ctx.write_script("V1__first.sql", "SELECT 1;");
        ctx.write_script("V1__second.sql", "SELECT 2;");

        let err = ctx.loader().versioned_scripts().unwrap_err();
        assert!(err.to_string().contains("version 1"), "{}", err);
    }

    #[test_context(LoaderTestContext)]
    #[test]
    fn test_custom_naming_options(ctx: &mut LoaderTestContext) {
        ctx.write_script("M1-init.ddl", "SELECT 1;");
        ctx.write_script("V1__ignored_by_custom_naming.sql", "SELECT 2;");

        let naming = ScriptNaming {
            migration_prefix: "M".to_string(),
            repeatable_prefix: "A".to_string(),
            separator: "-".to_string(),
            suffix: ".ddl".to_string(),
        };
        let loader = FileLoader::new(vec![ctx.scripts_dir()], &naming, encoding_rs::UTF_8).unwrap();
        let scripts = loader.versioned_scripts().unwrap();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].name, "M1-init.ddl");
    }

    #[test_context(LoaderTestContext)]
    #[test]
    fn test_missing_location_is_skipped(ctx: &mut LoaderTestContext) {
        let loader = FileLoader::new(
            vec![ctx.temp_dir.path().join("does-not-exist")],
            &ScriptNaming::default(),
            encoding_rs::UTF_8,
        )
        .unwrap();
        assert!(loader.versioned_scripts().unwrap().is_empty());
    }

    #[test]
    fn test_embedded_loader_parses_and_sorts() {
        let loader = EmbeddedLoader::new(
            vec![
                ("V2__b.sql".to_string(), b"SELECT 2;".to_vec()),
                ("V1__a.sql".to_string(), b"SELECT 1;".to_vec()),
                ("R__views.sql".to_string(), b"SELECT 3;".to_vec()),
            ],
            &ScriptNaming::default(),
            encoding_rs::UTF_8,
        )
        .unwrap();

        let versioned = loader.versioned_scripts().unwrap();
        assert_eq!(versioned.len(), 2);
        assert_eq!(versioned[0].name, "V1__a.sql");
        assert_eq!(loader.repeatable_scripts().unwrap().len(), 1);
    }

    #[test]
    fn test_embedded_loader_rejects_unrecognized_name() {
        let result = EmbeddedLoader::new(
            vec![("setup.sql".to_string(), b"SELECT 1;".to_vec())],
            &ScriptNaming::default(),
            encoding_rs::UTF_8,
        );
        assert!(result.is_err());
    }

    #[test_context(LoaderTestContext)]
    #[test]
    fn test_checksum_is_stable_across_line_endings(ctx: &mut LoaderTestContext) {
        ctx.write_script("V1__a.sql", "SELECT 1;\nSELECT 2;\n");
        ctx.write_script("V2__b.sql", "SELECT 1;\r\nSELECT 2;\r\n");

        let scripts = ctx.loader().versioned_scripts().unwrap();
        assert_eq!(scripts[0].checksum().unwrap(), scripts[1].checksum().unwrap());
    }

    #[test_context(LoaderTestContext)]
    #[test]
    fn test_checksum_changes_with_body(ctx: &mut LoaderTestContext) {
        ctx.write_script("V1__a.sql", "SELECT 1;");
        let before = ctx.loader().versioned_scripts().unwrap()[0].checksum().unwrap();

        ctx.write_script("V1__a.sql", "SELECT 42;");
        let after = ctx.loader().versioned_scripts().unwrap()[0].checksum().unwrap();
        assert_ne!(before, after);
    }
}
