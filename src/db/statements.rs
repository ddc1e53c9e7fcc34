//! SQL statement preparation: placeholder substitution and script splitting.
//!
//! Migration scripts arrive as a single text body. Before execution the body
//! goes through two purely textual steps:
//!
//! 1. Every occurrence of `<prefix><key><suffix>` (default `${key}`) is
//!    replaced with the configured value. No escaping is supported.
//! 2. The body is split into individual statements on `;`, with awareness of
//!    string literals, quoted identifiers, line and block comments, and
//!    `CREATE TRIGGER … BEGIN … END` bodies whose inner semicolons must not
//!    terminate the statement.
//!
//! Each produced [`SqlStatement`] carries a flag telling the executor whether
//! it may run inside a transaction. For SQLite, `VACUUM`, `ATTACH` and
//! `DETACH` refuse to run while a transaction is open.

use std::collections::HashMap;

/// One executable statement cut out of a script body.
#[derive(Debug, Clone)]
pub struct SqlStatement {
    pub sql: String,
    /// When false the executor commits any open transaction before running it.
    pub must_run_in_transaction: bool,
}

/// Placeholder substitution settings, applied to the whole script body.
#[derive(Debug, Clone, Default)]
pub struct Placeholders {
    pub prefix: String,
    pub suffix: String,
    pub values: HashMap<String, String>,
}

impl Placeholders {
    pub fn new(prefix: String, suffix: String, values: HashMap<String, String>) -> Self {
        Self { prefix, suffix, values }
    }

    /// Replaces every `<prefix><key><suffix>` occurrence with its value.
    pub fn apply(&self, sql: &str) -> String {
        let mut out = sql.to_string();
        for (key, value) in &self.values {
            let token = format!("{}{}{}", self.prefix, key, self.suffix);
            out = out.replace(&token, value);
        }
        out
    }
}

/// Substitutes placeholders, then splits the body into statements.
pub fn load_statements(body: &str, placeholders: &Placeholders) -> Vec<SqlStatement> {
    split_statements(&placeholders.apply(body))
}

/// Splits a script body into statements at top-level semicolons.
pub fn split_statements(body: &str) -> Vec<SqlStatement> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            // String literal: '' escapes a quote inside it.
            '\'' => {
                current.push(c);
                consume_until_quote(&mut chars, &mut current, '\'');
            }
            // Quoted identifier.
            '"' => {
                current.push(c);
                consume_until_quote(&mut chars, &mut current, '"');
            }
            // Line comment.
            '-' if chars.peek() == Some(&'-') => {
                current.push(c);
                for c in chars.by_ref() {
                    current.push(c);
                    if c == '\n' {
                        break;
                    }
                }
            }
            // Block comment.
            '/' if chars.peek() == Some(&'*') => {
                current.push(c);
                let mut prev = '\0';
                for c in chars.by_ref() {
                    current.push(c);
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            ';' => {
                // Inside a trigger body the statement only ends once the
                // closing END has been seen.
                if is_trigger_statement(&current) && !ends_with_end(&current) {
                    current.push(c);
                    continue;
                }
                push_statement(&mut statements, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_statement(&mut statements, &current);
    statements
}

fn consume_until_quote(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, current: &mut String, quote: char) {
    while let Some(c) = chars.next() {
        current.push(c);
        if c == quote {
            // Doubled quote stays inside the literal.
            if chars.peek() == Some(&quote) {
                current.push(quote);
                chars.next();
                continue;
            }
            break;
        }
    }
}

fn push_statement(statements: &mut Vec<SqlStatement>, raw: &str) {
    let sql = raw.trim();
    if sql.is_empty() {
        return;
    }
    statements.push(SqlStatement {
        must_run_in_transaction: must_run_in_transaction(sql),
        sql: sql.to_string(),
    });
}

/// True when the statement head reads `CREATE [TEMP|TEMPORARY] TRIGGER`.
fn is_trigger_statement(stmt: &str) -> bool {
    let mut tokens = stmt.split_whitespace().map(|t| t.to_ascii_uppercase());
    if tokens.next().as_deref() != Some("CREATE") {
        return false;
    }
    match tokens.next().as_deref() {
        Some("TRIGGER") => true,
        Some("TEMP") | Some("TEMPORARY") => tokens.next().as_deref() == Some("TRIGGER"),
        _ => false,
    }
}

/// True when the last token of the statement is `END`.
fn ends_with_end(stmt: &str) -> bool {
    stmt.split_whitespace()
        .last()
        .map(|t| t.eq_ignore_ascii_case("END"))
        .unwrap_or(false)
}

/// Statements SQLite refuses to run inside a transaction.
fn must_run_in_transaction(sql: &str) -> bool {
    let head = sql.split_whitespace().next().map(|t| t.to_ascii_uppercase()).unwrap_or_default();
    !matches!(head.as_str(), "VACUUM" | "ATTACH" | "DETACH")
}
