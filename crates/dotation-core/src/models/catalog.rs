//! Catalog models: products, services and per-service dotation targets.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Unit-of-measure tier of a product.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UnitTier {
    /// Shipped and counted by the carton
    Carton,
    /// Paper rolls, boxes, packets
    Pack,
    /// Small items counted one by one
    Unit,
}

impl UnitTier {
    /// Map the `category` field of the products file to a tier.
    ///
    /// Unknown categories fall back to [`UnitTier::Unit`].
    pub fn from_category(category: &str) -> Self {
        match category.trim() {
            "Cartons" => UnitTier::Carton,
            "Pack" => UnitTier::Pack,
            _ => UnitTier::Unit,
        }
    }

    /// Human-readable category label.
    pub fn label(&self) -> &'static str {
        match self {
            UnitTier::Carton => "Cartons",
            UnitTier::Pack => "Paquet/Rouleau/Boîte",
            UnitTier::Unit => "Petit produit",
        }
    }
}

/// A product of the supply catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product code
    pub code: String,
    /// Display name
    pub name: String,
    /// Category tier
    pub tier: UnitTier,
    /// Units contained in one carton (0 = not sold by carton)
    pub units_per_carton: u64,
    /// Units contained in one pack (0 = counted in raw units)
    pub units_per_pack: u64,
}

/// Which remainder field a product accepts during entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RemainderField {
    Packs,
    Units,
}

/// Fixed display group of a worklist line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrepGroup {
    Cartons,
    Packs,
    Other,
}

impl Product {
    /// Create a unit-tracked product with no carton or pack sizes.
    pub fn new(code: String, name: String) -> Self {
        Self {
            code,
            name,
            tier: UnitTier::Unit,
            units_per_carton: 0,
            units_per_pack: 0,
        }
    }

    /// Builder-style helper setting both packaging sizes.
    pub fn with_packaging(mut self, units_per_carton: u64, units_per_pack: u64) -> Self {
        self.units_per_carton = units_per_carton;
        self.units_per_pack = units_per_pack;
        self
    }

    /// Whether remainders are declared in packs rather than units.
    pub fn is_pack_tracked(&self) -> bool {
        self.units_per_pack > 0
    }

    /// The only remainder field enabled for this product.
    pub fn entry_field(&self) -> RemainderField {
        if self.is_pack_tracked() {
            RemainderField::Packs
        } else {
            RemainderField::Units
        }
    }

    /// Worklist group, decided by packaging sizes rather than category.
    pub fn prep_group(&self) -> PrepGroup {
        if self.units_per_carton > 0 {
            PrepGroup::Cartons
        } else if self.units_per_pack > 0 {
            PrepGroup::Packs
        } else {
            PrepGroup::Other
        }
    }
}

/// A consuming unit (ward, department).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Service {
    pub id: String,
    pub name: String,
}

impl Service {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Target quantity of one product for one service, in base units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DotationTarget {
    pub code: String,
    pub target: u64,
}

/// In-memory catalog: products, services, targets and declared ordering.
///
/// Replaced wholesale on every successful reload.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    product_index: HashMap<String, usize>,
    services: Vec<Service>,
    /// Targets per service, in file encounter order
    dotations: HashMap<String, Vec<DotationTarget>>,
    /// Declared processing order per service
    ordering: HashMap<String, Vec<String>>,
}

impl Catalog {
    /// Assemble a catalog. The first product with a given code wins the index.
    pub fn new(
        products: Vec<Product>,
        services: Vec<Service>,
        dotations: HashMap<String, Vec<DotationTarget>>,
        ordering: HashMap<String, Vec<String>>,
    ) -> Self {
        let mut product_index = HashMap::with_capacity(products.len());
        for (i, p) in products.iter().enumerate() {
            product_index.entry(p.code.clone()).or_insert(i);
        }
        Self {
            products,
            product_index,
            services,
            dotations,
            ordering,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.services.is_empty()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn product(&self, code: &str) -> Option<&Product> {
        self.product_index.get(code).map(|&i| &self.products[i])
    }

    pub fn service(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    /// Service display name, falling back to the id itself.
    pub fn service_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.service(id).map(|s| s.name.as_str()).unwrap_or(id)
    }

    /// Target for a (service, product) pair; 0 when not in the dotation.
    pub fn target(&self, service_id: &str, code: &str) -> u64 {
        self.dotations
            .get(service_id)
            .and_then(|targets| targets.iter().find(|t| t.code == code))
            .map(|t| t.target)
            .unwrap_or(0)
    }

    /// Whether the service's dotation lists this product code.
    pub fn has_dotation(&self, service_id: &str, code: &str) -> bool {
        self.dotations
            .get(service_id)
            .is_some_and(|targets| targets.iter().any(|t| t.code == code))
    }

    /// Number of products in a service's dotation.
    pub fn dotation_count(&self, service_id: &str) -> usize {
        self.dotations.get(service_id).map_or(0, Vec::len)
    }

    /// Product codes of a service in processing order.
    ///
    /// Declared order first (restricted to codes of the dotation), then the
    /// remaining dotation codes in encounter order.
    pub fn ordered_codes(&self, service_id: &str) -> Vec<String> {
        let Some(targets) = self.dotations.get(service_id) else {
            return Vec::new();
        };

        let mut ordered: Vec<String> = Vec::with_capacity(targets.len());
        if let Some(declared) = self.ordering.get(service_id) {
            for code in declared {
                if targets.iter().any(|t| &t.code == code) && !ordered.contains(code) {
                    ordered.push(code.clone());
                }
            }
        }
        for t in targets {
            if !ordered.contains(&t.code) {
                ordered.push(t.code.clone());
            }
        }
        ordered
    }

    /// Products sorted by category label, then code (numeric-aware).
    pub fn products_for_display(&self) -> Vec<&Product> {
        let mut sorted: Vec<&Product> = self.products.iter().collect();
        sorted.sort_by(|a, b| {
            a.tier
                .label()
                .cmp(b.tier.label())
                .then_with(|| compare_codes(&a.code, &b.code))
        });
        sorted
    }
}

/// Compare product codes, numerically when both are integers.
fn compare_codes(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(pairs: &[(&str, u64)]) -> Vec<DotationTarget> {
        pairs
            .iter()
            .map(|(code, target)| DotationTarget {
                code: code.to_string(),
                target: *target,
            })
            .collect()
    }

    fn make_catalog() -> Catalog {
        let products = vec![
            Product::new("100".into(), "Gants M".into()).with_packaging(1000, 100),
            Product::new("20".into(), "Sacs 50L".into()).with_packaging(0, 25),
            Product::new("3".into(), "Savon".into()),
        ];
        let services = vec![Service::new("s1", "Cardiologie")];
        let mut dotations = HashMap::new();
        dotations.insert("s1".to_string(), targets(&[("3", 4), ("100", 500), ("20", 50)]));
        let mut ordering = HashMap::new();
        ordering.insert("s1".to_string(), vec!["20".to_string(), "999".to_string()]);
        Catalog::new(products, services, dotations, ordering)
    }

    #[test]
    fn test_first_duplicate_code_wins() {
        let catalog = Catalog::new(
            vec![
                Product::new("7".into(), "Compresses".into()),
                Product::new("7".into(), "Compresses stériles".into()),
            ],
            Vec::new(),
            HashMap::new(),
            HashMap::new(),
        );
        assert_eq!(catalog.product("7").map(|p| p.name.as_str()), Some("Compresses"));
    }

    #[test]
    fn test_tier_from_category() {
        assert_eq!(UnitTier::from_category("Cartons"), UnitTier::Carton);
        assert_eq!(UnitTier::from_category("Pack"), UnitTier::Pack);
        assert_eq!(UnitTier::from_category("Petit"), UnitTier::Unit);
        assert_eq!(UnitTier::from_category("whatever"), UnitTier::Unit);
    }

    #[test]
    fn test_entry_field_follows_pack_size() {
        let boxed = Product::new("A".into(), "A".into()).with_packaging(500, 0);
        assert_eq!(boxed.entry_field(), RemainderField::Units);
        assert_eq!(boxed.prep_group(), PrepGroup::Cartons);

        let packed = Product::new("B".into(), "B".into()).with_packaging(0, 10);
        assert_eq!(packed.entry_field(), RemainderField::Packs);
        assert_eq!(packed.prep_group(), PrepGroup::Packs);
    }

    #[test]
    fn test_ordered_codes_appends_undeclared() {
        let catalog = make_catalog();
        // "999" is declared but has no target; "3" and "100" follow in file order
        assert_eq!(catalog.ordered_codes("s1"), vec!["20", "3", "100"]);
        assert!(catalog.ordered_codes("unknown").is_empty());
    }

    #[test]
    fn test_target_lookup() {
        let catalog = make_catalog();
        assert_eq!(catalog.target("s1", "100"), 500);
        assert_eq!(catalog.target("s1", "missing"), 0);
        assert!(catalog.has_dotation("s1", "20"));
        assert!(!catalog.has_dotation("s2", "20"));
        assert_eq!(catalog.dotation_count("s1"), 3);
    }

    #[test]
    fn test_service_name_fallback() {
        let catalog = make_catalog();
        assert_eq!(catalog.service_name("s1"), "Cardiologie");
        assert_eq!(catalog.service_name("ghost"), "ghost");
    }

    #[test]
    fn test_products_for_display_numeric_codes() {
        let mut catalog = make_catalog();
        catalog = Catalog::new(
            catalog
                .products()
                .iter()
                .cloned()
                .map(|mut p| {
                    p.tier = UnitTier::Unit;
                    p
                })
                .collect(),
            Vec::new(),
            HashMap::new(),
            HashMap::new(),
        );
        let codes: Vec<&str> = catalog
            .products_for_display()
            .iter()
            .map(|p| p.code.as_str())
            .collect();
        assert_eq!(codes, vec!["3", "20", "100"]);
    }
}
