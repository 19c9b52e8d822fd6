//! Change detection between consecutive readings

use rust_decimal::Decimal;

use crate::shared::errors::PriceError;
use crate::shared::types::PriceReading;
use crate::shared::utils::calculate_percentage_change;

/// Decides whether a fresh reading differs from the last accepted one
#[derive(Debug, Default, Clone, Copy)]
pub struct ChangeDetector;

impl ChangeDetector {
    pub fn new() -> Self {
        Self
    }

    /// Exact decimal comparison, field by field.
    ///
    /// A missing `previous` is the baseline and never counts as a change.
    /// Readings of different shapes are an integration bug and fail with
    /// [`PriceError::ShapeMismatch`].
    pub fn is_changed(
        &self,
        previous: Option<&PriceReading>,
        current: &PriceReading,
    ) -> Result<bool, PriceError> {
        let Some(previous) = previous else {
            return Ok(false);
        };

        if !previous.same_shape(current) {
            return Err(PriceError::ShapeMismatch {
                previous: previous.field_names(),
                current: current.field_names(),
            });
        }

        Ok(previous
            .fields()
            .zip(current.fields())
            .any(|((_, old), (_, new))| old != new))
    }

    /// Percentage change of one field, `None` when the field is missing or was zero
    pub fn percentage_change(
        &self,
        previous: &PriceReading,
        current: &PriceReading,
        field: &str,
    ) -> Option<Decimal> {
        calculate_percentage_change(previous.get(field)?, current.get(field)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn single(value: Decimal) -> PriceReading {
        PriceReading::single(value).unwrap()
    }

    fn dual(selling: Decimal, purchasing: Decimal) -> PriceReading {
        PriceReading::new([("sellingPrice", selling), ("purchasingPrice", purchasing)]).unwrap()
    }

    #[test]
    fn test_baseline_is_not_a_change() {
        let detector = ChangeDetector::new();
        assert!(!detector.is_changed(None, &single(dec!(100))).unwrap());
        assert!(!detector.is_changed(None, &dual(dec!(1), dec!(2))).unwrap());
    }

    #[test]
    fn test_same_reading_is_not_a_change() {
        let detector = ChangeDetector::new();
        let r = single(dec!(7512.50));
        assert!(!detector.is_changed(Some(&r), &r).unwrap());
        assert!(!detector.is_changed(Some(&r), &single(dec!(7512.5))).unwrap());
    }

    #[test]
    fn test_any_direction_is_a_change() {
        let detector = ChangeDetector::new();
        let base = single(dec!(100));
        assert!(detector.is_changed(Some(&base), &single(dec!(105))).unwrap());
        assert!(detector.is_changed(Some(&base), &single(dec!(99.99))).unwrap());
        assert!(detector.is_changed(Some(&base), &single(dec!(100.01))).unwrap());
    }

    #[test]
    fn test_single_field_difference_in_dual_reading() {
        let detector = ChangeDetector::new();
        let base = dual(dec!(7300), dec!(7100));
        assert!(detector.is_changed(Some(&base), &dual(dec!(7300), dec!(7101))).unwrap());
        assert!(!detector.is_changed(Some(&base), &dual(dec!(7300.00), dec!(7100))).unwrap());
    }

    #[test]
    fn test_shape_mismatch_fails_fast() {
        let detector = ChangeDetector::new();
        let err = detector
            .is_changed(Some(&single(dec!(100))), &dual(dec!(100), dec!(100)))
            .unwrap_err();

        match err {
            PriceError::ShapeMismatch { previous, current } => {
                assert_eq!(previous, vec!["price"]);
                assert_eq!(current, vec!["purchasingPrice", "sellingPrice"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_percentage_change() {
        let detector = ChangeDetector::new();
        let change = detector.percentage_change(&single(dec!(100)), &single(dec!(105)), "price");
        assert_eq!(change, Some(dec!(5)));
        assert_eq!(
            detector.percentage_change(&single(dec!(100)), &single(dec!(105)), "sellingPrice"),
            None
        );
    }
}
