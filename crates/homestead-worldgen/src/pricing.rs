//! Parcel pricing.

/// Default base price of a parcel.
pub const BASE_PRICE: u32 = 500;

/// Inputs to the pricing formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceInputs {
    /// Ring of the parcel being bought
    pub ring: u32,
    /// Parcels registered across the whole world
    pub empire_total_parcels: u64,
    /// Parcels already sold in this ring
    pub ring_sold: u64,
    /// Cells that exist in this ring
    pub ring_total: u64,
    /// Parcels the buyer already owns
    pub owner_parcel_count: u64,
}

/// Individual multipliers, exposed for UI breakdowns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceFactors {
    /// Cheaper further out, floored at 0.6
    pub distance: f64,
    /// +2% per hundred parcels in the world
    pub growth: f64,
    /// Up to +30% as the ring fills
    pub scarcity: f64,
    /// +15% per parcel owned beyond three
    pub hoard: f64,
}

impl PriceFactors {
    /// Computes the multipliers. An empty ring has no scarcity effect.
    #[must_use]
    pub fn compute(inputs: &PriceInputs) -> Self {
        let distance = (1.0 - 0.03 * f64::from(inputs.ring)).max(0.6);
        let growth = 1.0 + 0.02 * (inputs.empire_total_parcels as f64 / 100.0);
        let scarcity = if inputs.ring_total == 0 {
            1.0
        } else {
            1.0 + 0.30 * (inputs.ring_sold as f64 / inputs.ring_total as f64)
        };
        let hoard = 1.0 + 0.15 * inputs.owner_parcel_count.saturating_sub(3) as f64;
        Self {
            distance,
            growth,
            scarcity,
            hoard,
        }
    }

    /// Product of all multipliers.
    #[must_use]
    pub fn product(&self) -> f64 {
        self.distance * self.growth * self.scarcity * self.hoard
    }
}

/// Price of a parcel with the given base price.
#[must_use]
pub fn price_with_base(base_price: u32, inputs: &PriceInputs) -> u64 {
    (f64::from(base_price) * PriceFactors::compute(inputs).product()).round() as u64
}

/// Price of a parcel at [`BASE_PRICE`].
#[must_use]
pub fn price(inputs: &PriceInputs) -> u64 {
    price_with_base(BASE_PRICE, inputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_worked_example() {
        let inputs = PriceInputs {
            ring: 2,
            empire_total_parcels: 150,
            ring_sold: 4,
            ring_total: 16,
            owner_parcel_count: 5,
        };
        let f = PriceFactors::compute(&inputs);
        assert!(close(f.distance, 0.94));
        assert!(close(f.growth, 1.03));
        assert!(close(f.scarcity, 1.075));
        assert!(close(f.hoard, 1.3));
        assert_eq!(price(&inputs), 677);
    }

    #[test]
    fn test_empty_ring_has_no_scarcity() {
        let inputs = PriceInputs {
            ring_sold: 3,
            ring_total: 0,
            ..Default::default()
        };
        assert!(close(PriceFactors::compute(&inputs).scarcity, 1.0));
        assert_eq!(price(&inputs), 500);
    }

    #[test]
    fn test_distance_floor() {
        let inputs = PriceInputs {
            ring: 40,
            ..Default::default()
        };
        assert!(close(PriceFactors::compute(&inputs).distance, 0.6));
        assert_eq!(price(&inputs), 300);
    }

    #[test]
    fn test_hoard_starts_after_three() {
        let three = PriceInputs {
            owner_parcel_count: 3,
            ..Default::default()
        };
        let four = PriceInputs {
            owner_parcel_count: 4,
            ..Default::default()
        };
        assert_eq!(price(&three), 500);
        assert_eq!(price(&four), 575);
    }

    #[test]
    fn test_custom_base() {
        assert_eq!(price_with_base(1000, &PriceInputs::default()), 1000);
    }
}
