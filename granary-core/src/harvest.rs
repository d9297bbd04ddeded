// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure aggregation over a field's weighing records.
//!
//! All functions here are synchronous and free of I/O: identical inputs
//! produce identical outputs and no ordering among records matters.

use crate::Weighing;

/// Totals for one field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HarvestTotals {
    /// Sum of net weights over finalized records, in kg.
    pub total_weight: f64,

    /// Sum of bale counts, missing counts contributing zero.
    pub total_bales: u32,

    /// Yield in quintals per hectare.
    pub yield_quintals: f64,
}

/// Net weight of a single record; `None` until both weights are recorded.
pub fn net_weight(weighing: &Weighing) -> Option<f64> {
    weighing.net_weight()
}

/// Compute totals for a field of `size` hectares.
///
/// Unfinalized records contribute 0 to the total weight. The `/ 100` factor
/// converts kg/ha to quintals/ha; it is a fixed domain convention. A field
/// without a positive size reports a yield of 0.
pub fn totals(size: f64, weighings: &[Weighing]) -> HarvestTotals {
    let total_weight: f64 = weighings.iter().filter_map(Weighing::net_weight).sum();
    let total_bales: u32 = weighings
        .iter()
        .map(|weighing| weighing.bale_count.unwrap_or(0))
        .sum();
    let yield_quintals = if size > 0.0 {
        total_weight / (size * 100.0)
    } else {
        0.0
    };

    HarvestTotals {
        total_weight,
        total_bales,
        yield_quintals,
    }
}

/// Arithmetic means of the optional quality metrics, independently per
/// metric over the records where it is present.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QualityAverages {
    pub humidity: Option<f64>,
    pub protein: Option<f64>,
    pub specific_weight: Option<f64>,
}

impl QualityAverages {
    /// Whether at least one metric was measured on at least one record.
    pub fn has_quality_data(&self) -> bool {
        self.humidity.is_some() || self.protein.is_some() || self.specific_weight.is_some()
    }
}

/// Average the quality metrics over all records carrying them.
pub fn quality_averages(weighings: &[Weighing]) -> QualityAverages {
    QualityAverages {
        humidity: mean(weighings.iter().filter_map(|weighing| weighing.humidity)),
        protein: mean(weighings.iter().filter_map(|weighing| weighing.protein)),
        specific_weight: mean(
            weighings
                .iter()
                .filter_map(|weighing| weighing.specific_weight),
        ),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0u32;
    for value in values {
        sum += value;
        count += 1;
    }
    (count > 0).then(|| sum / f64::from(count))
}

#[cfg(test)]
mod tests {
    use super::{quality_averages, totals};
    use crate::Weighing;

    fn finalized(full: f64, empty: f64) -> Weighing {
        let mut weighing = Weighing::new("trailer", full, 0);
        weighing.empty = Some(empty);
        weighing
    }

    #[test]
    fn totals_over_finalized_records() {
        let weighings = vec![finalized(1000.0, 200.0), finalized(800.0, 100.0)];
        let totals = totals(10.0, &weighings);

        assert_eq!(totals.total_weight, 1500.0);
        assert_eq!(totals.yield_quintals, 1.5);
    }

    #[test]
    fn unfinalized_records_contribute_nothing() {
        let weighings = vec![finalized(1000.0, 200.0), Weighing::new("trailer", 900.0, 0)];
        let totals = totals(10.0, &weighings);

        assert_eq!(totals.total_weight, 800.0);
    }

    #[test]
    fn zero_size_yields_zero() {
        let weighings = vec![finalized(1000.0, 200.0)];
        assert_eq!(totals(0.0, &weighings).yield_quintals, 0.0);
    }

    #[test]
    fn bale_counts_default_to_zero() {
        let mut with_bales = finalized(1000.0, 200.0);
        with_bales.bale_count = Some(12);
        let weighings = vec![with_bales, finalized(800.0, 100.0)];

        assert_eq!(totals(10.0, &weighings).total_bales, 12);
    }

    #[test]
    fn order_independence() {
        let mut forward = vec![finalized(1000.0, 200.0), finalized(800.0, 100.0)];
        let totals_forward = totals(10.0, &forward);
        forward.reverse();
        assert_eq!(totals(10.0, &forward), totals_forward);
    }

    #[test]
    fn quality_means_are_independent_per_metric() {
        let mut first = finalized(1000.0, 200.0);
        first.humidity = Some(14.0);
        first.protein = Some(11.0);
        let mut second = finalized(800.0, 100.0);
        second.humidity = Some(16.0);

        let averages = quality_averages(&[first, second]);
        assert_eq!(averages.humidity, Some(15.0));
        assert_eq!(averages.protein, Some(11.0));
        assert_eq!(averages.specific_weight, None);
        assert!(averages.has_quality_data());
    }

    #[test]
    fn no_quality_data() {
        let averages = quality_averages(&[finalized(1000.0, 200.0)]);
        assert!(!averages.has_quality_data());
    }
}
