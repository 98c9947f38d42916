//! SQLite schema definition.

/// Complete database schema for dotation storage.
///
/// All application state lives in one key-value table of JSON blobs:
/// - `workflow/<service_id>`: entry, prepared and done records of a service
/// - `consumption_log`: append-only array of consumption events
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Key-Value Store
-- ============================================================================

CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,                         -- JSON document
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_kv_updated ON kv_store(updated_at);
"#;

/// Key of the consumption log blob.
pub const KEY_CONSUMPTION_LOG: &str = "consumption_log";

/// Prefix of per-service workflow keys.
pub const WORKFLOW_KEY_PREFIX: &str = "workflow/";

/// Storage key of a service's workflow record.
pub fn workflow_key(service_id: &str) -> String {
    format!("{}{}", WORKFLOW_KEY_PREFIX, service_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_key_primary() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute("INSERT INTO kv_store (key, value) VALUES ('a', '1')", [])
            .unwrap();
        let duplicate = conn.execute("INSERT INTO kv_store (key, value) VALUES ('a', '2')", []);
        assert!(duplicate.is_err());
    }

    #[test]
    fn test_workflow_key() {
        assert_eq!(workflow_key("urgences"), "workflow/urgences");
    }
}
