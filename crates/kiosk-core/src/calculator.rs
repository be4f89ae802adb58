// Dynamic price calculator.

use crate::model::Pricing;

/// Amount charged at `occupancy` percent.
///
/// Static prices are returned unchanged. A dynamic ladder is scanned in
/// list order and the first tier whose threshold is at or below the
/// occupancy wins; callers order tiers by descending threshold to get
/// "highest applicable tier". No match (or no tiers) is 0.
pub fn resolve_amount(occupancy: f64, pricing: &Pricing) -> f64 {
    match pricing {
        Pricing::Static(amount) => *amount,
        Pricing::Dynamic(tiers) => tiers
            .iter()
            .find(|tier| tier.percent <= occupancy)
            .map_or(0.0, |tier| tier.pricing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PriceTier;

    fn ladder(tiers: &[(f64, f64)]) -> Pricing {
        Pricing::Dynamic(
            tiers
                .iter()
                .map(|&(percent, pricing)| PriceTier { percent, pricing })
                .collect(),
        )
    }

    #[test]
    fn static_passes_through() {
        assert_eq!(resolve_amount(99.0, &Pricing::Static(12.5)), 12.5);
    }

    #[test]
    fn first_matching_tier_wins() {
        let tiers = ladder(&[(80.0, 10.0), (50.0, 7.0), (0.0, 5.0)]);
        assert_eq!(resolve_amount(60.0, &tiers), 7.0);
        assert_eq!(resolve_amount(80.0, &tiers), 10.0);
        assert_eq!(resolve_amount(0.0, &tiers), 5.0);
    }

    #[test]
    fn list_order_is_not_sorted() {
        // Ascending ladder: the lowest threshold always matches first.
        let tiers = ladder(&[(0.0, 5.0), (50.0, 7.0), (80.0, 10.0)]);
        assert_eq!(resolve_amount(95.0, &tiers), 5.0);
    }

    #[test]
    fn no_match_or_empty_is_zero() {
        assert_eq!(resolve_amount(10.0, &ladder(&[(50.0, 7.0)])), 0.0);
        assert_eq!(resolve_amount(10.0, &ladder(&[])), 0.0);
        assert_eq!(resolve_amount(f64::NAN, &ladder(&[(0.0, 5.0)])), 0.0);
    }
}
