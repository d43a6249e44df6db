//! The allocation engine.
//!
//! A pure, total function distributing an inflow across the targets of a
//! split rule. Three passes in ascending priority order:
//!
//! 1. `Fixed` items take their value off the top; a fixed value larger than
//!    what is left is an overflow.
//! 2. `Percent` items each take their percentage of the **same snapshot**,
//!    taken after the fixed pass. Percentages are independent of each other.
//! 3. The single `Remainder` item takes whatever is left, which may be zero
//!    but never negative.
//!
//! The function guarantees that the assigned amounts sum to the input total
//! exactly, or fails.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    split_rules::{SplitKind, SplitRuleItem},
    LedgerError, ResultLedger,
};

/// One target's share of an allocated inflow.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Allocation {
    pub target_bucket_id: Uuid,
    pub amount: Decimal,
}

/// Distributes `total` across `items`.
///
/// Output order is deterministic for identical inputs: fixed items first,
/// then percent items, then the remainder, each group in ascending priority
/// (ties keep input order). Callers are expected to pass the items of a
/// validated [`SplitRule`](crate::SplitRule); targets are therefore distinct.
pub fn allocate(total: Decimal, items: &[SplitRuleItem]) -> ResultLedger<Vec<Allocation>> {
    if total <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(
            "allocation total must be positive".to_string(),
        ));
    }
    if items.is_empty() {
        return Err(LedgerError::InvalidRule(
            "split rule must have at least one item".to_string(),
        ));
    }

    let mut sorted: Vec<&SplitRuleItem> = items.iter().collect();
    sorted.sort_by_key(|item| item.priority);

    let mut allocations: Vec<Allocation> = Vec::with_capacity(sorted.len());
    let mut remaining = total;

    for item in sorted.iter().filter(|item| item.kind == SplitKind::Fixed) {
        if item.value > remaining {
            return Err(LedgerError::AllocationOverflow(format!(
                "FIXED amount {} exceeds remaining {}",
                item.value, remaining
            )));
        }
        allocations.push(Allocation {
            target_bucket_id: item.target_bucket_id,
            amount: item.value,
        });
        remaining -= item.value;
    }

    // Snapshot after the fixed pass; every percentage is computed against it.
    let base_for_percent = remaining;
    for item in sorted.iter().filter(|item| item.kind == SplitKind::Percent) {
        allocations.push(Allocation {
            target_bucket_id: item.target_bucket_id,
            amount: base_for_percent * item.value / Decimal::ONE_HUNDRED,
        });
    }

    let remainder_item = sorted
        .iter()
        .find(|item| item.kind == SplitKind::Remainder)
        .ok_or_else(|| {
            LedgerError::InvalidRule("split rule must have a REMAINDER item".to_string())
        })?;

    let assigned: Decimal = allocations.iter().map(|allocation| allocation.amount).sum();
    let remainder = total - assigned;
    if remainder < Decimal::ZERO {
        return Err(LedgerError::AllocationOverflow(format!(
            "allocations exceed the total by {}",
            -remainder
        )));
    }
    allocations.push(Allocation {
        target_bucket_id: remainder_item.target_bucket_id,
        amount: remainder,
    });

    let allocated: Decimal = allocations.iter().map(|allocation| allocation.amount).sum();
    if allocated != total {
        return Err(LedgerError::AllocationImbalance(format!(
            "allocated {allocated}, expected {total}"
        )));
    }

    Ok(allocations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(kind: SplitKind, value: Decimal, priority: i32) -> SplitRuleItem {
        SplitRuleItem {
            id: Uuid::new_v4(),
            split_rule_id: Uuid::new_v4(),
            target_bucket_id: Uuid::new_v4(),
            kind,
            value,
            priority,
        }
    }

    fn amount_for(allocations: &[Allocation], target: Uuid) -> Decimal {
        allocations
            .iter()
            .find(|allocation| allocation.target_bucket_id == target)
            .map(|allocation| allocation.amount)
            .unwrap()
    }

    #[test]
    fn fixed_then_percent_of_snapshot_then_remainder() {
        // 1000: 50 fixed, 10% of the remaining 950, catch-all takes the rest.
        let coffee = item(SplitKind::Fixed, dec!(50), 1);
        let missions = item(SplitKind::Percent, dec!(10), 2);
        let catch_all = item(SplitKind::Remainder, Decimal::ZERO, 3);
        let targets = (
            coffee.target_bucket_id,
            missions.target_bucket_id,
            catch_all.target_bucket_id,
        );

        let allocations = allocate(dec!(1000), &[coffee, missions, catch_all]).unwrap();

        assert_eq!(amount_for(&allocations, targets.0), dec!(50));
        assert_eq!(amount_for(&allocations, targets.1), dec!(95));
        assert_eq!(amount_for(&allocations, targets.2), dec!(855));

        let total: Decimal = allocations.iter().map(|allocation| allocation.amount).sum();
        assert_eq!(total, dec!(1000));
    }

    #[test]
    fn salary_with_mixed_rules() {
        let vault = item(SplitKind::Fixed, dec!(500), 1);
        let free_cash = item(SplitKind::Percent, dec!(30), 2);
        let emergency = item(SplitKind::Remainder, Decimal::ZERO, 3);
        let targets = (
            vault.target_bucket_id,
            free_cash.target_bucket_id,
            emergency.target_bucket_id,
        );

        let allocations = allocate(dec!(2000), &[vault, free_cash, emergency]).unwrap();

        assert_eq!(amount_for(&allocations, targets.0), dec!(500));
        assert_eq!(amount_for(&allocations, targets.1), dec!(450));
        assert_eq!(amount_for(&allocations, targets.2), dec!(1050));
    }

    #[test]
    fn fixed_items_apply_in_priority_order() {
        // Out-of-order input; the sort decides which FIXED wins the funds.
        let second = item(SplitKind::Fixed, dec!(80), 2);
        let first = item(SplitKind::Fixed, dec!(60), 1);
        let rest = item(SplitKind::Remainder, Decimal::ZERO, 3);

        let err = allocate(dec!(100), &[second.clone(), first.clone(), rest.clone()]).unwrap_err();
        assert_eq!(
            err,
            LedgerError::AllocationOverflow("FIXED amount 80 exceeds remaining 40".to_string())
        );
    }

    #[test]
    fn percentages_share_the_same_base() {
        // Two 50% items each take half of the post-fixed snapshot; neither
        // sees the other's deduction.
        let fixed = item(SplitKind::Fixed, dec!(100), 1);
        let half_a = item(SplitKind::Percent, dec!(50), 2);
        let half_b = item(SplitKind::Percent, dec!(50), 3);
        let rest = item(SplitKind::Remainder, Decimal::ZERO, 4);
        let targets = (half_a.target_bucket_id, half_b.target_bucket_id, rest.target_bucket_id);

        let allocations = allocate(dec!(300), &[fixed, half_a, half_b, rest]).unwrap();

        assert_eq!(amount_for(&allocations, targets.0), dec!(100));
        assert_eq!(amount_for(&allocations, targets.1), dec!(100));
        assert_eq!(amount_for(&allocations, targets.2), Decimal::ZERO);
    }

    #[test]
    fn remainder_may_be_zero_but_not_negative() {
        let all = item(SplitKind::Percent, dec!(100), 1);
        let rest = item(SplitKind::Remainder, Decimal::ZERO, 2);
        let rest_target = rest.target_bucket_id;

        let allocations = allocate(dec!(75), &[all, rest]).unwrap();
        assert_eq!(amount_for(&allocations, rest_target), Decimal::ZERO);

        let over_a = item(SplitKind::Percent, dec!(80), 1);
        let over_b = item(SplitKind::Percent, dec!(30), 2);
        let rest = item(SplitKind::Remainder, Decimal::ZERO, 3);
        let err = allocate(dec!(100), &[over_a, over_b, rest]).unwrap_err();
        assert!(matches!(err, LedgerError::AllocationOverflow(_)));
    }

    #[test]
    fn fixed_larger_than_total_overflows() {
        let fixed = item(SplitKind::Fixed, dec!(150), 1);
        let rest = item(SplitKind::Remainder, Decimal::ZERO, 2);

        let err = allocate(dec!(100), &[fixed, rest]).unwrap_err();
        assert!(matches!(err, LedgerError::AllocationOverflow(_)));
    }

    #[test]
    fn rejects_non_positive_total_and_empty_items() {
        let rest = item(SplitKind::Remainder, Decimal::ZERO, 1);
        assert!(allocate(Decimal::ZERO, &[rest.clone()]).is_err());
        assert!(allocate(dec!(-10), &[rest]).is_err());
        assert!(allocate(dec!(10), &[]).is_err());
    }

    #[test]
    fn identical_inputs_yield_identical_outputs() {
        let items = vec![
            item(SplitKind::Percent, dec!(12.5), 2),
            item(SplitKind::Fixed, dec!(33.33), 1),
            item(SplitKind::Remainder, Decimal::ZERO, 3),
        ];

        let first = allocate(dec!(987.65), &items).unwrap();
        let second = allocate(dec!(987.65), &items).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn fractional_inputs_still_sum_exactly() {
        let fixed = item(SplitKind::Fixed, dec!(0.01), 1);
        let percent = item(SplitKind::Percent, dec!(33), 2);
        let rest = item(SplitKind::Remainder, Decimal::ZERO, 3);

        let allocations = allocate(dec!(10.10), &[fixed, percent, rest]).unwrap();
        let total: Decimal = allocations.iter().map(|allocation| allocation.amount).sum();
        assert_eq!(total, dec!(10.10));
    }
}
