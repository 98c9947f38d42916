//! Normalization of raw catalog documents.
//!
//! The documents are hand-edited, so every field is read loosely: ids are
//! stringified and trimmed, numbers may arrive as strings, and a document of
//! the wrong shape reads as empty.

use std::collections::HashMap;

use serde_json::Value;

use crate::models::{DotationTarget, Product, Service, UnitTier};
use crate::units::{clamp_value, value_to_string};

fn field_text(obj: &serde_json::Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .map(value_to_string)
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Products with an empty code or name are dropped.
pub fn parse_products(doc: &Value) -> Vec<Product> {
    let Some(items) = doc.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| Product {
            code: field_text(obj, "code"),
            name: field_text(obj, "name"),
            tier: UnitTier::from_category(obj.get("category").and_then(Value::as_str).unwrap_or("")),
            units_per_carton: obj.get("unitsPerCarton").map_or(0, clamp_value),
            units_per_pack: obj.get("unitsPerPack").map_or(0, clamp_value),
        })
        .filter(|p| !p.code.is_empty() && !p.name.is_empty())
        .collect()
}

/// Services sorted by name; entries with an empty id or name are dropped.
pub fn parse_services(doc: &Value) -> Vec<Service> {
    let Some(items) = doc.as_array() else {
        return Vec::new();
    };
    let mut services: Vec<Service> = items
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| Service::new(field_text(obj, "id"), field_text(obj, "name")))
        .filter(|s| !s.id.is_empty() && !s.name.is_empty())
        .collect();
    services.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
    services
}

/// `{serviceId: {code: target}}`, keeping each service's codes in file order.
pub fn parse_dotations(doc: &Value) -> HashMap<String, Vec<DotationTarget>> {
    let Some(services) = doc.as_object() else {
        return HashMap::new();
    };
    services
        .iter()
        .map(|(service_id, targets)| {
            let targets = targets
                .as_object()
                .map(|map| {
                    map.iter()
                        .map(|(code, target)| DotationTarget {
                            code: code.clone(),
                            target: clamp_value(target),
                        })
                        .collect()
                })
                .unwrap_or_default();
            (service_id.clone(), targets)
        })
        .collect()
}

/// `{serviceId: [code, ...]}`; non-array values read as an empty order.
pub fn parse_ordering(doc: &Value) -> HashMap<String, Vec<String>> {
    let Some(services) = doc.as_object() else {
        return HashMap::new();
    };
    services
        .iter()
        .map(|(service_id, codes)| {
            let codes = codes
                .as_array()
                .map(|list| list.iter().map(value_to_string).collect())
                .unwrap_or_default();
            (service_id.clone(), codes)
        })
        .collect()
}
