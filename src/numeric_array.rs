//! Numeric-array analyzer (C5): classifies a homogeneous numeric array
//! into the narrowest packed element type, or recommends falling back to
//! the dense encoding. Pure function over a slice of [`crate::value::Value`]
//! — it never touches the buffer (spec §4.4).

use crate::value::Value;

/// Outcome of the numeric-array analysis: either a packed element type, or
/// a recommendation to fall back to `ARR_DENSE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackRecommendation {
    /// Encode as `ARR_PACK_I8`, elements fit in `i8`.
    PackedI8,
    /// Encode as `ARR_PACK_I16`, elements fit in `i16`.
    PackedI16,
    /// Encode as `ARR_PACK_I32`, elements fit in `i32`.
    PackedI32,
    /// Encode as `ARR_PACK_F32`, all elements survive an `f32` round-trip.
    PackedF32,
    /// Encode as `ARR_PACK_F64`, no narrower representation fits.
    PackedF64,
    /// Not eligible for packing; encode as `ARR_DENSE`.
    Dense,
}

/// Sample stride used for the homogeneity pre-check: every
/// `max(1, len/32)`-th index is inspected before committing to a full scan.
fn sample_stride(len: usize) -> usize {
    (len / 32).max(1)
}

/// `true` if `value` is a plain finite-or-not numeric scalar, i.e. the kind
/// of value the packed-array encodings can carry. BigInts, strings, and
/// every heap type are excluded.
fn is_numeric(value: &Value) -> bool {
    matches!(value, Value::Number(_))
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        _ => None,
    }
}

/// Run the full §4.4 procedure over an array's slots. Holes (`None`) are
/// never eligible for packing — callers are expected to have already
/// routed sparse arrays to `ARR_SPARSE` before reaching this analyzer.
pub fn analyze(slots: &[Option<Value>]) -> PackRecommendation {
    let len = slots.len();

    // Step 1: sample the first element's category.
    let Some(Some(first)) = slots.first() else {
        return PackRecommendation::Dense;
    };
    if !is_numeric(first) {
        return PackRecommendation::Dense;
    }

    // Step 2: eligibility gate.
    let is_power_of_two = len != 0 && (len & (len - 1)) == 0;
    if !(len >= 8 && (is_power_of_two || len >= 16)) {
        return PackRecommendation::Dense;
    }

    // Step 3: sampled homogeneity check.
    let stride = sample_stride(len);
    let mut i = 0;
    while i < len {
        match &slots[i] {
            Some(v) if is_numeric(v) => {}
            _ => return PackRecommendation::Dense,
        }
        i += stride;
    }

    // Step 4: full scan.
    let mut all_integer = true;
    let mut all_f32_safe = true;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for slot in slots {
        let Some(value) = slot else {
            return PackRecommendation::Dense;
        };
        let Some(n) = as_f64(value) else {
            return PackRecommendation::Dense;
        };
        if !n.is_finite() || n.fract() != 0.0 {
            all_integer = false;
        }
        if (n as f32) as f64 != n {
            all_f32_safe = false;
        }
        if n < min {
            min = n;
        }
        if n > max {
            max = n;
        }
    }

    // Step 5/6.
    if all_integer {
        let bound = min.abs().max(max.abs());
        if bound <= i8::MAX as f64 {
            PackRecommendation::PackedI8
        } else if bound <= i16::MAX as f64 {
            PackRecommendation::PackedI16
        } else if bound <= i32::MAX as f64 {
            PackRecommendation::PackedI32
        } else {
            PackRecommendation::PackedF64
        }
    } else if all_f32_safe {
        PackRecommendation::PackedF32
    } else {
        PackRecommendation::PackedF64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(values: &[f64]) -> Vec<Option<Value>> {
        values.iter().map(|&v| Some(Value::Number(v))).collect()
    }

    #[test]
    fn below_gate_is_dense() {
        let slots = numbers(&[1.0, 2.0, 3.0]);
        assert_eq!(analyze(&slots), PackRecommendation::Dense);
    }

    #[test]
    fn length_sixteen_small_ints_pack_i8() {
        let values: Vec<f64> = (1..=16).map(|i| i as f64).collect();
        let slots = numbers(&values);
        assert_eq!(analyze(&slots), PackRecommendation::PackedI8);
    }

    #[test]
    fn length_sixteen_with_half_packs_f32() {
        let mut values: Vec<f64> = (1..=15).map(|i| i as f64).collect();
        values.push(0.5);
        let slots = numbers(&values);
        assert_eq!(analyze(&slots), PackRecommendation::PackedF32);
    }

    #[test]
    fn length_sixteen_with_pi_packs_f64() {
        let mut values: Vec<f64> = (1..=15).map(|i| i as f64).collect();
        values.push(std::f64::consts::PI);
        let slots = numbers(&values);
        assert_eq!(analyze(&slots), PackRecommendation::PackedF64);
    }

    #[test]
    fn non_numeric_first_element_is_dense() {
        let slots = vec![Some(Value::string("x")); 16];
        assert_eq!(analyze(&slots), PackRecommendation::Dense);
    }

    #[test]
    fn non_power_of_two_below_sixteen_is_dense() {
        let values: Vec<f64> = (1..=9).map(|i| i as f64).collect();
        let slots = numbers(&values);
        // len 9: not a power of two, and < 16 -> ineligible
        assert_eq!(analyze(&slots), PackRecommendation::Dense);
    }

    #[test]
    fn length_eight_power_of_two_is_eligible() {
        let values: Vec<f64> = (1..=8).map(|i| i as f64).collect();
        let slots = numbers(&values);
        assert_eq!(analyze(&slots), PackRecommendation::PackedI8);
    }

    #[test]
    fn large_magnitude_overflows_to_f64() {
        let mut values: Vec<f64> = (1..=15).map(|i| i as f64).collect();
        values.push(i64::MAX as f64);
        let slots = numbers(&values);
        assert_eq!(analyze(&slots), PackRecommendation::PackedF64);
    }
}
