//! Key-value blob operations.

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Database, DbResult};

impl Database {
    /// Get the raw stored value of a key.
    pub fn get_raw(&self, key: &str) -> DbResult<Option<String>> {
        get_raw(&self.conn, key)
    }

    /// Set the raw value of a key.
    pub fn put_raw(&self, key: &str, value: &str) -> DbResult<()> {
        put_raw(&self.conn, key, value)
    }

    /// Delete a key. Returns whether it existed.
    pub fn delete_key(&self, key: &str) -> DbResult<bool> {
        delete_key(&self.conn, key)
    }

    /// Load a JSON value, falling back to the type's default when the key
    /// is absent or its content does not parse.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> DbResult<T> {
        load_or_default(&self.conn, key)
    }

    /// Serialize and store a JSON value.
    pub fn store_json<T: Serialize>(&self, key: &str, value: &T) -> DbResult<()> {
        store_json(&self.conn, key, value)
    }

    /// List keys starting with a prefix, sorted.
    pub fn keys_with_prefix(&self, prefix: &str) -> DbResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT key FROM kv_store WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
        )?;
        let rows = stmt.query_map([prefix], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

pub(crate) fn get_raw(conn: &Connection, key: &str) -> DbResult<Option<String>> {
    conn.query_row("SELECT value FROM kv_store WHERE key = ?", [key], |row| {
        row.get(0)
    })
    .optional()
    .map_err(Into::into)
}

pub(crate) fn put_raw(conn: &Connection, key: &str, value: &str) -> DbResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?, ?, datetime('now'))",
        params![key, value],
    )?;
    Ok(())
}

pub(crate) fn delete_key(conn: &Connection, key: &str) -> DbResult<bool> {
    let rows_affected = conn.execute("DELETE FROM kv_store WHERE key = ?", [key])?;
    Ok(rows_affected > 0)
}

pub(crate) fn load_or_default<T: DeserializeOwned + Default>(
    conn: &Connection,
    key: &str,
) -> DbResult<T> {
    let Some(raw) = get_raw(conn, key)? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "malformed stored value, using empty default");
            Ok(T::default())
        }
    }
}

pub(crate) fn store_json<T: Serialize>(conn: &Connection, key: &str, value: &T) -> DbResult<()> {
    let json = serde_json::to_string(value)?;
    put_raw(conn, key, &json)
}
