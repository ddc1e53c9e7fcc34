#[cfg(test)]
mod tests {
    use chrono::{Duration, Local};
    use sqlevo::db::metadata::{MetadataEntry, MetadataType};
    use sqlevo::libs::reconciler::reconcile;
    use sqlevo::libs::script::{checksum_of, MigrationScript, ScriptCategory};
    use sqlevo::libs::version::Version;

    fn versioned(label: &str, body: &str) -> MigrationScript {
        let name = format!("V{}__s.sql", label);
        MigrationScript::from_bytes(
            ScriptCategory::Versioned,
            Some(Version::parse(label).unwrap()),
            name,
            "s".to_string(),
            false,
            body.as_bytes().to_vec(),
            encoding_rs::UTF_8,
        )
    }

    fn repeatable(name: &str, body: &str, always: bool) -> MigrationScript {
        MigrationScript::from_bytes(
            ScriptCategory::Repeatable,
            None,
            name.to_string(),
            name.to_string(),
            always,
            body.as_bytes().to_vec(),
            encoding_rs::UTF_8,
        )
    }

    fn applied_entry(id: i64, kind: MetadataType, version: Option<&str>, name: &str, checksum: &str, age_secs: i64) -> MetadataEntry {
        MetadataEntry {
            id,
            kind,
            version: version.map(|v| Version::parse(v).unwrap()),
            name: name.to_string(),
            description: "s".to_string(),
            checksum: Some(checksum.to_string()),
            installed_on: Local::now() - Duration::seconds(age_secs),
            installed_by: "tester".to_string(),
            success: Some(true),
            execution_time_ms: Some(1),
        }
    }

    fn names(scripts: &[MigrationScript]) -> Vec<&str> {
        scripts.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_fresh_database_everything_pending() {
        let scripts = vec![versioned("1", "a"), versioned("2", "b")];
        let recon = reconcile(&scripts, &[], &[], &[], None, &Version::Min, &Version::Max).unwrap();

        assert_eq!(names(&recon.pending_forward), ["V1__s.sql", "V2__s.sql"]);
        assert!(recon.out_of_order_pending.is_empty());
        assert!(recon.off_target.is_empty());
        assert_eq!(recon.last_applied_version, Version::Min);
    }

    #[test]
    fn test_applied_scripts_are_not_pending() {
        let scripts = vec![versioned("1", "a"), versioned("2", "b")];
        let applied = vec![applied_entry(1, MetadataType::Migration, Some("1"), "V1__s.sql", &checksum_of("a"), 10)];
        let recon = reconcile(&scripts, &[], &applied, &[], None, &Version::Min, &Version::Max).unwrap();

        assert_eq!(names(&recon.pending_forward), ["V2__s.sql"]);
        assert_eq!(recon.last_applied_version, Version::parse("1").unwrap());
    }

    #[test]
    fn test_gap_behind_last_applied_is_out_of_order() {
        let scripts = vec![versioned("1", "a"), versioned("2", "b"), versioned("3", "c")];
        let applied = vec![
            applied_entry(1, MetadataType::Migration, Some("1"), "V1__s.sql", &checksum_of("a"), 20),
            applied_entry(2, MetadataType::Migration, Some("3"), "V3__s.sql", &checksum_of("c"), 10),
        ];
        let recon = reconcile(&scripts, &[], &applied, &[], None, &Version::Min, &Version::Max).unwrap();

        assert_eq!(names(&recon.out_of_order_pending), ["V2__s.sql"]);
        assert!(recon.pending_forward.is_empty());
        assert_eq!(recon.last_applied_version, Version::parse("3").unwrap());
    }

    #[test]
    fn test_target_version_bounds_pending() {
        let scripts: Vec<_> = ["1", "2", "3", "4", "5"].iter().map(|l| versioned(l, l)).collect();
        let target = Version::parse("3").unwrap();
        let recon = reconcile(&scripts, &[], &[], &[], None, &Version::Min, &target).unwrap();

        assert_eq!(names(&recon.pending_forward), ["V1__s.sql", "V2__s.sql", "V3__s.sql"]);
        assert_eq!(names(&recon.off_target), ["V4__s.sql", "V5__s.sql"]);
    }

    #[test]
    fn test_start_version_ignores_older_scripts() {
        let scripts = vec![versioned("1", "a"), versioned("2", "b"), versioned("3", "c")];
        let start = Version::parse("2").unwrap();
        let recon = reconcile(&scripts, &[], &[], &[], None, &start, &Version::Max).unwrap();

        assert_eq!(names(&recon.ignored_before_start), ["V1__s.sql"]);
        assert_eq!(names(&recon.pending_forward), ["V2__s.sql", "V3__s.sql"]);
        assert_eq!(recon.effective_start_version, start);
    }

    #[test]
    fn test_persisted_start_version_wins_over_configured() {
        let scripts = vec![versioned("1", "a"), versioned("2", "b")];
        let persisted = Version::parse("2").unwrap();
        let recon = reconcile(&scripts, &[], &[], &[], Some(&persisted), &Version::Min, &Version::Max).unwrap();

        assert_eq!(names(&recon.ignored_before_start), ["V1__s.sql"]);
        assert_eq!(recon.effective_start_version, persisted);
    }

    #[test]
    fn test_repeatable_pending_when_never_applied() {
        let rep = vec![repeatable("R__views.sql", "v1", false)];
        let recon = reconcile(&[], &rep, &[], &[], None, &Version::Min, &Version::Max).unwrap();
        assert_eq!(names(&recon.pending_repeatable), ["R__views.sql"]);
    }

    #[test]
    fn test_repeatable_not_pending_when_checksum_matches() {
        let rep = vec![repeatable("R__views.sql", "v1", false)];
        let applied = vec![applied_entry(
            5,
            MetadataType::RepeatableMigration,
            None,
            "R__views.sql",
            &checksum_of("v1"),
            10,
        )];
        let recon = reconcile(&[], &rep, &[], &applied, None, &Version::Min, &Version::Max).unwrap();
        assert!(recon.pending_repeatable.is_empty());
    }

    #[test]
    fn test_repeatable_pending_when_checksum_drifts() {
        let rep = vec![repeatable("R__views.sql", "v2", false)];
        let applied = vec![applied_entry(
            5,
            MetadataType::RepeatableMigration,
            None,
            "R__views.sql",
            &checksum_of("v1"),
            10,
        )];
        let recon = reconcile(&[], &rep, &[], &applied, None, &Version::Min, &Version::Max).unwrap();
        assert_eq!(names(&recon.pending_repeatable), ["R__views.sql"]);
    }

    #[test]
    fn test_repeatable_latest_entry_decides() {
        // Two history entries: the older one drifts, the newer one matches.
        let rep = vec![repeatable("R__views.sql", "v2", false)];
        let applied = vec![
            applied_entry(5, MetadataType::RepeatableMigration, None, "R__views.sql", &checksum_of("v1"), 100),
            applied_entry(9, MetadataType::RepeatableMigration, None, "R__views.sql", &checksum_of("v2"), 10),
        ];
        let recon = reconcile(&[], &rep, &[], &applied, None, &Version::Min, &Version::Max).unwrap();
        assert!(recon.pending_repeatable.is_empty());
    }

    #[test]
    fn test_repeat_always_is_always_pending() {
        let rep = vec![repeatable("R__stats!.sql", "v1", true)];
        let applied = vec![applied_entry(
            5,
            MetadataType::RepeatableMigration,
            None,
            "R__stats!.sql",
            &checksum_of("v1"),
            10,
        )];
        let recon = reconcile(&[], &rep, &[], &applied, None, &Version::Min, &Version::Max).unwrap();
        assert_eq!(names(&recon.pending_repeatable), ["R__stats!.sql"]);
    }
}
