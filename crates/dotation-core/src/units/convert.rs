//! Conversions between base units and carton/pack/unit decompositions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{Product, UnitTier};

/// Units on hand from a pack count and a unit count.
///
/// Packs only count for products with a pack size.
pub fn units_from_remainder(product: &Product, pack_count: u64, unit_count: u64) -> u64 {
    let pack_units = if product.units_per_pack > 0 {
        pack_count.saturating_mul(product.units_per_pack)
    } else {
        0
    };
    pack_units.saturating_add(unit_count)
}

/// Whole cartons and packs contained in a quantity; leftover units are dropped.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartonsAndPacks {
    pub cartons: u64,
    pub packs: u64,
}

impl CartonsAndPacks {
    pub fn is_empty(&self) -> bool {
        self.cartons == 0 && self.packs == 0
    }
}

impl fmt::Display for CartonsAndPacks {
    /// Parenthetical hint such as `(2 cartons + 1 pack)`; empty when nothing fits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.cartons > 0 {
            parts.push(format!("{} carton{}", self.cartons, plural(self.cartons)));
        }
        if self.packs > 0 {
            parts.push(format!("{} pack{}", self.packs, plural(self.packs)));
        }
        if parts.is_empty() {
            Ok(())
        } else {
            write!(f, "({})", parts.join(" + "))
        }
    }
}

fn plural(n: u64) -> &'static str {
    if n > 1 {
        "s"
    } else {
        ""
    }
}

/// Greedy carton-then-pack decomposition.
pub fn decompose_to_cartons_and_packs(product: &Product, units: u64) -> CartonsAndPacks {
    let mut remaining = units;
    let mut result = CartonsAndPacks::default();

    if product.units_per_carton > 0 {
        result.cartons = remaining / product.units_per_carton;
        remaining -= result.cartons * product.units_per_carton;
    }
    if product.units_per_pack > 0 {
        result.packs = remaining / product.units_per_pack;
    }
    result
}

/// One labeled component of a display decomposition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplayComponent {
    pub quantity: u64,
    pub tier: UnitTier,
}

impl DisplayComponent {
    /// Base units in one item of this component's tier.
    pub fn tier_size(&self, product: &Product) -> u64 {
        match self.tier {
            UnitTier::Carton => product.units_per_carton,
            UnitTier::Pack => product.units_per_pack,
            UnitTier::Unit => 1,
        }
    }
}

/// Full decomposition of a quantity, residual units included.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BestDisplay(pub Vec<DisplayComponent>);

impl BestDisplay {
    pub fn components(&self) -> &[DisplayComponent] {
        &self.0
    }

    /// Units represented by the decomposition.
    pub fn total_units(&self, product: &Product) -> u64 {
        self.0
            .iter()
            .map(|c| c.quantity.saturating_mul(c.tier_size(product)))
            .sum()
    }
}

impl fmt::Display for BestDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("0 unité");
        }
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|c| match c.tier {
                UnitTier::Carton => format!("{} carton(s)", c.quantity),
                UnitTier::Pack => format!("{} pack(s)", c.quantity),
                UnitTier::Unit => format!("{} unité(s)", c.quantity),
            })
            .collect();
        f.write_str(&parts.join(" + "))
    }
}

/// Greedy carton, pack, unit decomposition keeping the residual.
///
/// Zero-quantity components are omitted.
pub fn decompose_to_best_display(product: &Product, units: u64) -> BestDisplay {
    let mut remaining = units;
    let mut components = Vec::new();

    for (size, tier) in [
        (product.units_per_carton, UnitTier::Carton),
        (product.units_per_pack, UnitTier::Pack),
    ] {
        if size == 0 {
            continue;
        }
        let quantity = remaining / size;
        if quantity > 0 {
            components.push(DisplayComponent { quantity, tier });
            remaining -= quantity * size;
        }
    }
    if remaining > 0 {
        components.push(DisplayComponent {
            quantity: remaining,
            tier: UnitTier::Unit,
        });
    }
    BestDisplay(components)
}
