#[cfg(test)]
mod tests {
    use sqlevo::db::statements::{load_statements, split_statements, Placeholders};
    use std::collections::HashMap;

    fn sqls(body: &str) -> Vec<String> {
        split_statements(body).into_iter().map(|s| s.sql).collect()
    }

    #[test]
    fn test_splits_on_semicolons() {
        let stmts = sqls("CREATE TABLE a (id INTEGER);\nCREATE TABLE b (id INTEGER);\n");
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0], "CREATE TABLE a (id INTEGER)");
    }

    #[test]
    fn test_trailing_statement_without_semicolon() {
        let stmts = sqls("SELECT 1;\nSELECT 2");
        assert_eq!(stmts, ["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_semicolon_inside_string_literal() {
        let stmts = sqls("INSERT INTO t VALUES ('a;b');INSERT INTO t VALUES ('it''s;fine');");
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].contains("'a;b'"));
        assert!(stmts[1].contains("'it''s;fine'"));
    }

    #[test]
    fn test_semicolon_inside_comments() {
        let stmts = sqls("SELECT 1; -- trailing; comment\nSELECT 2;\n/* block; comment */ SELECT 3;");
        assert_eq!(stmts.len(), 3);
    }

    #[test]
    fn test_trigger_body_stays_one_statement() {
        let body = "CREATE TABLE t (id INTEGER);\n\
                    CREATE TRIGGER trg AFTER INSERT ON t BEGIN\n\
                    UPDATE t SET id = id + 1;\n\
                    DELETE FROM t WHERE id = 0;\n\
                    END;\n\
                    CREATE TABLE u (id INTEGER);";
        let stmts = sqls(body);
        assert_eq!(stmts.len(), 3);
        assert!(stmts[1].starts_with("CREATE TRIGGER"));
        assert!(stmts[1].ends_with("END"));
    }

    #[test]
    fn test_vacuum_refuses_transactions() {
        let stmts = split_statements("CREATE TABLE t (id INTEGER);\nVACUUM;\nvacuum;");
        assert!(stmts[0].must_run_in_transaction);
        assert!(!stmts[1].must_run_in_transaction);
        assert!(!stmts[2].must_run_in_transaction);
    }

    #[test]
    fn test_placeholder_substitution() {
        let placeholders = Placeholders::new(
            "${".to_string(),
            "}".to_string(),
            HashMap::from([("prefix".to_string(), "app_".to_string()), ("owner".to_string(), "bob".to_string())]),
        );
        let stmts = load_statements("CREATE TABLE ${prefix}users (owner TEXT DEFAULT '${owner}');", &placeholders);
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].sql, "CREATE TABLE app_users (owner TEXT DEFAULT 'bob')");
    }

    #[test]
    fn test_unknown_placeholders_stay_verbatim() {
        let placeholders = Placeholders::new("${".to_string(), "}".to_string(), HashMap::new());
        let stmts = load_statements("SELECT '${unknown}';", &placeholders);
        assert_eq!(stmts[0].sql, "SELECT '${unknown}'");
    }

    #[test]
    fn test_empty_and_whitespace_statements_are_dropped() {
        let stmts = sqls(";;\n  ;\nSELECT 1;");
        assert_eq!(stmts, ["SELECT 1"]);
    }
}
