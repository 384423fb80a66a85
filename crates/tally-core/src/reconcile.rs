//! # Reconciliation Calculator
//!
//! Pure, read-only discrepancy math over a count's item lines.
//!
//! ## Where This Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Reconciliation Data Flow                              │
//! │                                                                         │
//! │  tally-engine loads current rows                                       │
//! │       │                                                                 │
//! │       ├── items: Vec<StockCountItem>      (session store)              │
//! │       └── unit values: HashMap<product, Money>  (stock ledger)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  summarize(&items, &unit_values) ← THIS MODULE (no I/O)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CountSummary { statistics, quantities, values }                       │
//! │                                                                         │
//! │  Nothing here is cached or persisted: every call recomputes from the  │
//! │  rows it is handed, so a summary can never go stale.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::StockCountItem;

// =============================================================================
// Summary Types
// =============================================================================

/// Line-count statistics for a stock count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountStatistics {
    pub total_items: usize,
    /// Lines where counted == expected.
    pub items_matched: usize,
    /// Lines where counted != expected.
    pub items_with_discrepancy: usize,
    /// Lines where difference > 0 (more found than recorded).
    pub items_surplus: usize,
    /// Lines where difference < 0 (less found than recorded).
    pub items_deficit: usize,
    /// items_matched / total_items × 100. Zero (not NaN) for an empty count.
    pub match_rate: f64,
}

/// Quantity totals for a stock count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityTotals {
    /// Σ expected_quantity.
    pub total_expected: i64,
    /// Σ counted_quantity.
    pub total_counted: i64,
    /// total_counted − total_expected. Surplus-positive.
    pub net_difference: i64,
}

/// Valuation totals for a stock count, priced from the ledger's catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueTotals {
    pub total_expected_value: Money,
    pub total_counted_value: Money,
    /// total_counted_value − total_expected_value.
    pub value_difference: Money,
}

/// Full reconciliation summary. Computed on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountSummary {
    pub statistics: CountStatistics,
    pub quantities: QuantityTotals,
    pub values: ValueTotals,
}

// =============================================================================
// Calculator
// =============================================================================

/// Computes the full reconciliation summary for a set of item lines.
///
/// `unit_values` maps product_id → unit value; a product missing from the
/// map contributes zero to the valuation totals (quantities are unaffected).
///
/// ## Invariants
/// - `net_difference == total_counted - total_expected`, exactly
/// - `items_matched + items_with_discrepancy == total_items`
/// - `items_surplus + items_deficit == items_with_discrepancy`
/// - `value_difference == total_counted_value - total_expected_value`
pub fn summarize(
    items: &[StockCountItem],
    unit_values: &HashMap<String, Money>,
) -> CountSummary {
    let mut matched = 0usize;
    let mut surplus = 0usize;
    let mut deficit = 0usize;

    let mut total_expected = 0i64;
    let mut total_counted = 0i64;

    let mut expected_value = Money::zero();
    let mut counted_value = Money::zero();

    for item in items {
        match item.difference() {
            0 => matched += 1,
            d if d > 0 => surplus += 1,
            _ => deficit += 1,
        }

        total_expected += item.expected_quantity;
        total_counted += item.counted_quantity;

        let unit_value = unit_values
            .get(&item.product_id)
            .copied()
            .unwrap_or_else(Money::zero);
        expected_value += unit_value.multiply_quantity(item.expected_quantity);
        counted_value += unit_value.multiply_quantity(item.counted_quantity);
    }

    let total = items.len();
    let match_rate = if total == 0 {
        0.0
    } else {
        matched as f64 / total as f64 * 100.0
    };

    CountSummary {
        statistics: CountStatistics {
            total_items: total,
            items_matched: matched,
            items_with_discrepancy: surplus + deficit,
            items_surplus: surplus,
            items_deficit: deficit,
            match_rate,
        },
        quantities: QuantityTotals {
            total_expected,
            total_counted,
            net_difference: total_counted - total_expected,
        },
        values: ValueTotals {
            total_expected_value: expected_value,
            total_counted_value: counted_value,
            value_difference: counted_value - expected_value,
        },
    }
}

/// Returns the lines whose counted quantity disagrees with the expected one.
pub fn discrepancies(items: &[StockCountItem]) -> Vec<&StockCountItem> {
    items.iter().filter(|item| !item.is_match()).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(product_id: &str, expected: i64, counted: i64) -> StockCountItem {
        let now = Utc::now();
        StockCountItem {
            id: format!("item-{product_id}"),
            stock_count_id: "c-1".to_string(),
            product_id: product_id.to_string(),
            sku_snapshot: format!("SKU-{product_id}"),
            name_snapshot: format!("Product {product_id}"),
            expected_quantity: expected,
            counted_quantity: counted,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn values(pairs: &[(&str, i64)]) -> HashMap<String, Money> {
        pairs
            .iter()
            .map(|(id, cents)| (id.to_string(), Money::from_cents(*cents)))
            .collect()
    }

    #[test]
    fn test_scenario_one_match_one_deficit() {
        // items [{expected:10, counted:10}, {expected:5, counted:3}]
        let items = vec![item("a", 10, 10), item("b", 5, 3)];
        let summary = summarize(&items, &HashMap::new());

        assert_eq!(summary.statistics.total_items, 2);
        assert_eq!(summary.statistics.items_matched, 1);
        assert_eq!(summary.statistics.items_with_discrepancy, 1);
        assert_eq!(summary.statistics.items_surplus, 0);
        assert_eq!(summary.statistics.items_deficit, 1);
        assert!((summary.statistics.match_rate - 50.0).abs() < f64::EPSILON);

        assert_eq!(summary.quantities.total_expected, 15);
        assert_eq!(summary.quantities.total_counted, 13);
        assert_eq!(summary.quantities.net_difference, -2);
    }

    #[test]
    fn test_empty_count_has_zero_match_rate() {
        let summary = summarize(&[], &HashMap::new());
        assert_eq!(summary.statistics.total_items, 0);
        assert_eq!(summary.statistics.match_rate, 0.0);
        assert!(!summary.statistics.match_rate.is_nan());
        assert_eq!(summary.quantities.net_difference, 0);
        assert!(summary.values.value_difference.is_zero());
    }

    #[test]
    fn test_all_matched_is_hundred_percent() {
        let items = vec![item("a", 4, 4), item("b", 0, 0), item("c", 9, 9)];
        let summary = summarize(&items, &HashMap::new());
        assert!((summary.statistics.match_rate - 100.0).abs() < f64::EPSILON);
        assert_eq!(summary.statistics.items_with_discrepancy, 0);
    }

    #[test]
    fn test_valuation_totals() {
        // a: $1.00/unit, expected 10 counted 12 → +$2.00
        // b: $0.50/unit, expected 6 counted 1  → -$2.50
        let items = vec![item("a", 10, 12), item("b", 6, 1)];
        let unit_values = values(&[("a", 100), ("b", 50)]);
        let summary = summarize(&items, &unit_values);

        assert_eq!(summary.values.total_expected_value.cents(), 1300);
        assert_eq!(summary.values.total_counted_value.cents(), 1250);
        assert_eq!(summary.values.value_difference.cents(), -50);
        assert_eq!(
            summary.values.value_difference,
            summary.values.total_counted_value - summary.values.total_expected_value
        );
    }

    #[test]
    fn test_value_sign_matches_net_difference_for_uniform_positive_values() {
        let items = vec![item("a", 10, 7), item("b", 5, 6)];
        let unit_values = values(&[("a", 100), ("b", 100)]);
        let summary = summarize(&items, &unit_values);

        assert!(summary.quantities.net_difference < 0);
        assert!(summary.values.value_difference.is_negative());
    }

    #[test]
    fn test_unpriced_product_contributes_zero_value() {
        let items = vec![item("a", 2, 5)];
        let summary = summarize(&items, &HashMap::new());

        assert_eq!(summary.quantities.net_difference, 3);
        assert!(summary.values.total_expected_value.is_zero());
        assert!(summary.values.total_counted_value.is_zero());
    }

    #[test]
    fn test_aggregate_consistency() {
        let items = vec![
            item("a", 10, 10),
            item("b", 5, 3),
            item("c", 0, 4),
            item("d", 7, 7),
            item("e", 2, 0),
        ];
        let summary = summarize(&items, &HashMap::new());
        let s = summary.statistics;

        assert_eq!(s.items_matched + s.items_with_discrepancy, s.total_items);
        assert_eq!(s.items_surplus + s.items_deficit, s.items_with_discrepancy);
        assert_eq!(
            summary.quantities.net_difference,
            summary.quantities.total_counted - summary.quantities.total_expected
        );
    }

    #[test]
    fn test_discrepancies_filters_matches() {
        let items = vec![item("a", 10, 10), item("b", 5, 3), item("c", 1, 2)];
        let discrepant = discrepancies(&items);
        assert_eq!(discrepant.len(), 2);
        assert!(discrepant.iter().all(|i| !i.is_match()));
        assert_eq!(discrepant[0].product_id, "b");
        assert_eq!(discrepant[1].product_id, "c");
    }
}
