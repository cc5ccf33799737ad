//! All-or-nothing waypoint renumbering
//!
//! As soon as one waypoint of a document lacks a catalog icon, every waypoint is renumbered
//! from 1 in document order, including the ones that already had a catalog icon. A document
//! whose waypoints all carry catalog icons is left alone, which makes the rule idempotent.

use crate::{IconCatalog, SymbolSlot, WaypointSequence};

/// What [`Relabeler::relabel`] did to a document
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relabel {
    /// Nothing was touched; the file must not be rewritten
    NoChange,
    /// Every waypoint got a fresh numbered symbol
    Relabeled { waypoints: usize },
}

impl Relabel {
    #[inline]
    pub fn is_changed(&self) -> bool {
        matches!(self, Relabel::Relabeled { .. })
    }
}

/// Applies the numbering rule of an [`IconCatalog`]
#[derive(Clone, Debug, Default)]
pub struct Relabeler {
    catalog: IconCatalog,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Relabeler {
    pub fn new(catalog: IconCatalog) -> Self {
        Self { catalog }
    }

    /// True when the symbol is absent or does not contain the catalog marker
    #[inline]
    pub fn is_missing_symbol(&self, symbol: Option<&str>) -> bool {
        symbol.is_none_or(|symbol| !self.catalog.recognizes(symbol))
    }

    /// Renumber all waypoints if any of them is missing a catalog symbol
    pub fn relabel<D>(&self, document: &mut D) -> Relabel
    where
        D: WaypointSequence + ?Sized,
    {
        let needs_relabel = document
            .waypoints()
            .iter()
            .any(|waypoint| self.is_missing_symbol(waypoint.symbol()));

        if !needs_relabel {
            return Relabel::NoChange;
        }

        let waypoints = document.waypoints_mut();
        for (number, waypoint) in (1..).zip(waypoints.iter_mut()) {
            waypoint.set_symbol(self.catalog.reference(number));
        }

        Relabel::Relabeled {
            waypoints: waypoints.len(),
        }
    }
}
