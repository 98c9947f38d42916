//! Consumption log storage.

use rusqlite::Connection;
use serde_json::Value;

use super::kv::{delete_key, load_or_default, store_json};
use super::{workflow_key, Database, DbResult, KEY_CONSUMPTION_LOG};
use crate::models::ConsumptionEvent;
use crate::units::{clamp_int, clamp_value, value_to_string};

impl Database {
    /// Load the full consumption log in append order.
    pub fn load_consumption_log(&self) -> DbResult<Vec<ConsumptionEvent>> {
        read_log(&self.conn)
    }

    /// Append events to the log.
    pub fn append_consumption(&self, events: &[ConsumptionEvent]) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        append_log(&tx, events)?;
        tx.commit()?;
        Ok(())
    }

    /// Log a service's closing events and drop its workflow atomically.
    pub fn close_service(&self, service_id: &str, events: &[ConsumptionEvent]) -> DbResult<bool> {
        let tx = self.conn.unchecked_transaction()?;
        if !events.is_empty() {
            append_log(&tx, events)?;
        }
        let cleared = delete_key(&tx, &workflow_key(service_id))?;
        tx.commit()?;
        Ok(cleared)
    }

    /// Wipe the entire log.
    pub fn clear_consumption_log(&self) -> DbResult<()> {
        store_json(&self.conn, KEY_CONSUMPTION_LOG, &Vec::<ConsumptionEvent>::new())
    }
}

fn append_log(conn: &Connection, events: &[ConsumptionEvent]) -> DbResult<()> {
    let mut log = read_log(conn)?;
    log.extend_from_slice(events);
    store_json(conn, KEY_CONSUMPTION_LOG, &log)
}

/// Read the log leniently: each entry is normalized on its own and
/// non-object entries are skipped.
fn read_log(conn: &Connection) -> DbResult<Vec<ConsumptionEvent>> {
    let raw: Vec<Value> = load_or_default(conn, KEY_CONSUMPTION_LOG)?;
    Ok(raw.iter().filter_map(event_from_value).collect())
}

fn event_from_value(value: &Value) -> Option<ConsumptionEvent> {
    let obj = value.as_object()?;
    let ts = match obj.get("ts") {
        Some(Value::Number(n)) => n
            .as_i64()
            .unwrap_or_else(|| n.as_f64().map_or(0, |f| clamp_int(f) as i64)),
        _ => 0,
    };
    Some(ConsumptionEvent {
        ts,
        service_id: obj.get("serviceId").map(value_to_string).unwrap_or_default(),
        code: obj.get("code").map(value_to_string).unwrap_or_default(),
        qty_u: obj.get("qtyU").map_or(0, clamp_value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Remainder, ServiceWorkflow};

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_empty_log() {
        let db = setup_db();
        assert!(db.load_consumption_log().unwrap().is_empty());
    }

    #[test]
    fn test_append_preserves_order() {
        let db = setup_db();
        db.append_consumption(&[ConsumptionEvent::new(1, "s1", "A", 5)])
            .unwrap();
        db.append_consumption(&[
            ConsumptionEvent::new(2, "s2", "B", 7),
            ConsumptionEvent::new(2, "s2", "C", 1),
        ])
        .unwrap();

        let codes: Vec<String> = db
            .load_consumption_log()
            .unwrap()
            .into_iter()
            .map(|e| e.code)
            .collect();
        assert_eq!(codes, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_lenient_entries() {
        let db = setup_db();
        db.put_raw(
            KEY_CONSUMPTION_LOG,
            r#"[{"ts":10,"serviceId":"s1","code":123,"qtyU":"4"},"junk",{"ts":11.5,"serviceId":"s1","code":"B","qtyU":-2}]"#,
        )
        .unwrap();

        let log = db.load_consumption_log().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], ConsumptionEvent::new(10, "s1", "123", 4));
        assert_eq!(log[1], ConsumptionEvent::new(11, "s1", "B", 0));
    }

    #[test]
    fn test_close_service_is_atomic_unit() {
        let db = setup_db();
        let mut wf = ServiceWorkflow::default();
        wf.set_remainder("A", Remainder::Units(1));
        wf.prepared.insert("A".into(), 3);
        db.save_workflow("s1", &wf).unwrap();

        let cleared = db
            .close_service("s1", &[ConsumptionEvent::new(5, "s1", "A", 3)])
            .unwrap();
        assert!(cleared);
        assert!(db.load_workflow("s1").unwrap().is_empty());
        assert_eq!(db.load_consumption_log().unwrap().len(), 1);
    }

    #[test]
    fn test_clear_log() {
        let db = setup_db();
        db.append_consumption(&[ConsumptionEvent::new(1, "s1", "A", 5)])
            .unwrap();
        db.clear_consumption_log().unwrap();
        assert!(db.load_consumption_log().unwrap().is_empty());
    }
}
