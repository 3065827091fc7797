use anyhow::{Context, Result};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::{Path, PathBuf};
use tokio::fs;

pub type OrmConn = DatabaseConnection;

const MIGRATIONS_DIR: &str = "migrations";

pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let conn = Database::connect(database_url)
        .await
        .context("failed to connect to the database")?;
    Ok(conn)
}

/// Applies every `.sql` file under `migrations/` in filename order.
///
/// Migrations use `IF NOT EXISTS` guards, so the whole directory is replayed on startup.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<()> {
    run_migrations_in(conn, Path::new(MIGRATIONS_DIR)).await
}

pub async fn run_migrations_in(conn: &DatabaseConnection, dir: &Path) -> Result<()> {
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("cannot read migrations from {}", dir.display()))?;
    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();

    let backend = conn.get_database_backend();
    for file in files {
        tracing::debug!(migration = %file.display(), "applying migration");
        let sql = fs::read_to_string(&file).await?;
        // Postgres prepared statements hold a single command each.
        for statement in split_statements(&sql) {
            conn.execute(Statement::from_string(backend, statement))
                .await
                .with_context(|| format!("migration {} failed", file.display()))?;
        }
    }

    Ok(())
}

/// Splits a migration file into statements, dropping `--` comment lines.
///
/// Semicolons inside `$$ ... $$` bodies do not end a statement.
fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_body = false;

    for line in sql.lines() {
        if !in_body && line.trim_start().starts_with("--") {
            continue;
        }
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'$') {
                chars.next();
                current.push_str("$$");
                in_body = !in_body;
            } else if c == ';' && !in_body {
                push_statement(&mut statements, &mut current);
            } else {
                current.push(c);
            }
        }
        current.push('\n');
    }
    push_statement(&mut statements, &mut current);

    statements
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let stmt = current.trim();
    if !stmt.is_empty() {
        statements.push(format!("{stmt};"));
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::split_statements;

    #[test]
    fn splits_on_semicolons_and_skips_comments() {
        let sql = "-- users; and carts\nCREATE TABLE a (id INT);\n\n  -- trailing\nCREATE INDEX i ON a (id);\n";
        assert_eq!(
            split_statements(sql),
            vec![
                "CREATE TABLE a (id INT);".to_string(),
                "CREATE INDEX i ON a (id);".to_string(),
            ]
        );
    }

    #[test]
    fn dollar_quoted_body_stays_whole() {
        let sql = "CREATE TABLE a (id INT);\nDO $$\nBEGIN\n    IF true THEN\n        SELECT 1;\n    END IF;\nEND\n$$;\n";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], "CREATE TABLE a (id INT);");
        assert!(statements[1].starts_with("DO $$"));
        assert!(statements[1].contains("SELECT 1;"));
        assert!(statements[1].ends_with("$$;"));
    }

    #[test]
    fn empty_file_has_no_statements() {
        assert!(split_statements("\n-- nothing here\n").is_empty());
    }
}
