//! Per-service workflow records.

use super::kv::{delete_key, load_or_default, store_json};
use super::{workflow_key, Database, DbResult, WORKFLOW_KEY_PREFIX};
use crate::models::ServiceWorkflow;

impl Database {
    /// Load a service's workflow; absent or malformed records read as empty.
    pub fn load_workflow(&self, service_id: &str) -> DbResult<ServiceWorkflow> {
        load_or_default(&self.conn, &workflow_key(service_id))
    }

    /// Persist a service's workflow in a single write. Empty records are removed.
    pub fn save_workflow(&self, service_id: &str, workflow: &ServiceWorkflow) -> DbResult<()> {
        let key = workflow_key(service_id);
        if workflow.is_empty() {
            delete_key(&self.conn, &key)?;
        } else {
            store_json(&self.conn, &key, workflow)?;
        }
        Ok(())
    }

    /// Services that currently hold workflow state.
    pub fn workflow_service_ids(&self) -> DbResult<Vec<String>> {
        Ok(self
            .keys_with_prefix(WORKFLOW_KEY_PREFIX)?
            .into_iter()
            .map(|key| key[WORKFLOW_KEY_PREFIX.len()..].to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Remainder;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_missing_workflow_is_empty() {
        let db = setup_db();
        assert!(db.load_workflow("s1").unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let db = setup_db();
        let mut wf = ServiceWorkflow::default();
        wf.set_remainder("P", Remainder::Packs(3));
        wf.prepared.insert("P".into(), 12);
        db.save_workflow("s1", &wf).unwrap();

        assert_eq!(db.load_workflow("s1").unwrap(), wf);
        assert!(db.load_workflow("s2").unwrap().is_empty());
        assert_eq!(db.workflow_service_ids().unwrap(), vec!["s1"]);
    }

    #[test]
    fn test_saving_empty_removes_record() {
        let db = setup_db();
        let mut wf = ServiceWorkflow::default();
        wf.set_remainder("P", Remainder::Units(1));
        db.save_workflow("s1", &wf).unwrap();

        db.save_workflow("s1", &ServiceWorkflow::default()).unwrap();
        assert!(db.workflow_service_ids().unwrap().is_empty());
        assert_eq!(db.get_raw(&workflow_key("s1")).unwrap(), None);
    }

    #[test]
    fn test_malformed_workflow_resets() {
        let db = setup_db();
        db.put_raw(&workflow_key("s1"), r#"{"entries": 42}"#).unwrap();
        assert!(db.load_workflow("s1").unwrap().is_empty());
    }
}
