use anyhow::{bail, Context, Result};
use rusqlite::Connection;

/// Stamped into `PRAGMA user_version` once the `records` table exists.
pub const SCHEMA_VERSION: i32 = 1;

/// Create the `records` table on a fresh database and refuse files written by
/// a newer build. An up-to-date file is left untouched.
pub fn ensure_schema(conn: &mut Connection) -> Result<()> {
    let found: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")?;

    match found {
        SCHEMA_VERSION => Ok(()),
        0 => {
            let tx = conn.transaction().context("failed to open schema transaction")?;
            tx.execute_batch(include_str!("schemas/schema_v1.sql"))
                .context("failed to create the records table")?;
            tx.pragma_update(None, "user_version", SCHEMA_VERSION)
                .context("failed to stamp user_version pragma")?;
            tx.commit().context("failed to commit schema")
        }
        other => bail!("database schema version {other} is not supported (expected {SCHEMA_VERSION})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_version(conn: &Connection) -> i32 {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn fresh_database_gets_the_records_table_once() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO records (collection, data, created_at, updated_at)
             VALUES ('prices', '{}', 'now', 'now')",
            [],
        )
        .unwrap();

        ensure_schema(&mut conn).unwrap();
        assert_eq!(user_version(&conn), SCHEMA_VERSION);
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn newer_databases_are_refused() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();
        assert!(ensure_schema(&mut conn).is_err());
    }
}
