//! Bucket boundaries for base-2 exponential schemas.
//!
//! Every supported schema `n` places a bucket boundary at 1 and divides each power of two into
//! `2^n` logarithmic buckets, so each boundary is the previous boundary times `2^(2^-n)`. Bucket
//! `i` covers the interval `(boundary(i - 1), boundary(i)]`.

use crate::HistogramError;

/// Smallest supported schema.
pub const MIN_SCHEMA: i32 = -4;

/// Largest supported schema.
pub const MAX_SCHEMA: i32 = 8;

// Exponent range of normal `f64` values.
const MIN_EXP: i32 = -1022;
const MAX_EXP: i32 = 1023;

// Index of the bucket just below the overflow bucket for ±Inf, expressed as a binary exponent.
const LAST_REGULAR_EXP: i64 = 1024;

/// Returns `true` if `schema` is within the supported range.
pub fn is_valid_schema(schema: i32) -> bool {
    (MIN_SCHEMA..=MAX_SCHEMA).contains(&schema)
}

/// Returns the upper boundary of the bucket with the given index.
///
/// The result is monotonically increasing in `index`. The last bucket before the bucket reserved
/// for infinite observations reports `f64::MAX` as its upper boundary, so that infinity stays
/// distinguishable; indexes beyond that saturate to infinity, and indexes below the subnormal
/// range saturate to zero.
///
/// Schemas outside of the supported range are clamped to it.
pub fn boundary(index: i32, schema: i32) -> f64 {
    let schema = schema.clamp(MIN_SCHEMA, MAX_SCHEMA);

    if schema < 0 {
        let exp = i64::from(index) << -schema;
        if exp == LAST_REGULAR_EXP {
            return f64::MAX;
        }
        return ldexp(1.0, exp);
    }

    let frac_idx = index & ((1 << schema) - 1);
    let exp = i64::from(index >> schema) + 1;
    if frac_idx == 0 && exp == LAST_REGULAR_EXP + 1 {
        return f64::MAX;
    }
    ldexp(fraction(frac_idx, schema), exp)
}

/// Maps a bucket index at schema `from` to the index of the bucket containing it at the coarser
/// schema `to`.
///
/// `to` must not be greater than `from`.
pub fn target_index(index: i32, from: i32, to: i32) -> i32 {
    debug_assert!(to <= from, "cannot map schema {} to finer schema {}", from, to);

    // Shifting right only ever moves the index towards zero, so the result fits.
    #[allow(clippy::cast_possible_truncation)]
    {
        (((i64::from(index) - 1) >> (from - to)) + 1) as i32
    }
}

/// Calculates the schema matching the given bucket factor.
///
/// For base-2 bucket schemas where `bucket_factor` = 2^(2^-n), the schema is n. Factors in between
/// are rounded to the nearest schema, and the result is clamped to the supported range.
///
/// Examples:
/// - `bucket_factor` = 2.0 -> schema = 0 (1 bucket per power of 2)
/// - `bucket_factor` = sqrt(2) ≈ 1.414 -> schema = 1 (2 buckets per power of 2)
/// - `bucket_factor` = 2^(1/4) ≈ 1.189 -> schema = 2 (4 buckets per power of 2)
///
/// # Errors
///
/// Returns an error if `bucket_factor` is not greater than 1.0.
pub fn schema_from_bucket_factor(bucket_factor: f64) -> Result<i32, HistogramError> {
    // bucket_factor = 2^(2^-n)  =>  n = -log2(log2(bucket_factor))
    if bucket_factor.is_nan() || bucket_factor <= 1.0 || bucket_factor.is_infinite() {
        return Err(HistogramError::InvalidBucketFactor(bucket_factor));
    }

    let log_bucket_factor = bucket_factor.log2();
    if log_bucket_factor <= 0.0 {
        return Err(HistogramError::InvalidBucketFactor(bucket_factor));
    }

    #[allow(clippy::cast_possible_truncation)]
    let schema = -(log_bucket_factor.log2()).round() as i32;

    Ok(schema.clamp(MIN_SCHEMA, MAX_SCHEMA))
}

/// Mantissa of the boundary at position `frac_idx` within a power of two, in `[0.5, 1)`.
fn fraction(frac_idx: i32, schema: i32) -> f64 {
    if frac_idx == 0 {
        return 0.5;
    }
    (f64::from(frac_idx) / f64::from(1 << schema) - 1.0).exp2()
}

/// Computes `frac * 2^exp`, saturating to zero or infinity outside of the `f64` range.
fn ldexp(frac: f64, exp: i64) -> f64 {
    #[allow(clippy::cast_possible_truncation)]
    let mut exp = exp.clamp(-4 * i64::from(MAX_EXP), 4 * i64::from(MAX_EXP)) as i32;
    let mut value = frac;
    while exp > MAX_EXP {
        value *= pow2(MAX_EXP);
        exp -= MAX_EXP;
    }
    while exp < MIN_EXP {
        value *= pow2(MIN_EXP);
        exp -= MIN_EXP;
    }
    value * pow2(exp)
}

/// Exact power of two for an exponent within the normal range.
fn pow2(exp: i32) -> f64 {
    debug_assert!((MIN_EXP..=MAX_EXP).contains(&exp));

    #[allow(clippy::cast_sign_loss)]
    let biased = (exp + 1023) as u64;
    f64::from_bits(biased << 52)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_boundary_schema_zero() {
        assert_eq!(boundary(0, 0), 1.0);
        assert_eq!(boundary(1, 0), 2.0);
        assert_eq!(boundary(2, 0), 4.0);
        assert_eq!(boundary(-1, 0), 0.5);
        assert_eq!(boundary(-2, 0), 0.25);
    }

    #[test]
    fn test_boundary_positive_schema() {
        assert_eq!(boundary(0, 3), 1.0);
        assert_eq!(boundary(8, 3), 2.0);
        assert_eq!(boundary(-8, 3), 0.5);
        assert_relative_eq!(boundary(1, 1), std::f64::consts::SQRT_2, max_relative = 1e-15);
        assert_relative_eq!(boundary(-1, 1), std::f64::consts::FRAC_1_SQRT_2, max_relative = 1e-15);
        assert_relative_eq!(boundary(3, 2), 2f64.powf(0.75), max_relative = 1e-15);
        assert_relative_eq!(boundary(-3, 2), 2f64.powf(-0.75), max_relative = 1e-15);
    }

    #[test]
    fn test_boundary_negative_schema() {
        assert_eq!(boundary(0, -1), 1.0);
        assert_eq!(boundary(1, -1), 4.0);
        assert_eq!(boundary(-1, -1), 0.25);
        assert_eq!(boundary(1, -4), 65536.0);
        assert_eq!(boundary(-1, -4), 1.0 / 65536.0);
    }

    #[test]
    fn test_boundary_is_monotonic() {
        for schema in MIN_SCHEMA..=MAX_SCHEMA {
            let mut previous = boundary(-60, schema);
            for index in -59..60 {
                let current = boundary(index, schema);
                assert!(current > previous, "schema {} index {}", schema, index);
                previous = current;
            }
        }
    }

    #[test]
    fn test_boundary_extremes() {
        assert_eq!(boundary(1024, 0), f64::MAX);
        assert_eq!(boundary(1025, 0), f64::INFINITY);
        assert_eq!(boundary(64, -4), f64::MAX);
        assert_eq!(boundary(1024 << 8, 8), f64::MAX);
        assert_eq!(boundary(i32::MAX, -4), f64::INFINITY);
        assert_eq!(boundary(i32::MIN, -4), 0.0);
        assert_eq!(boundary(-1074, 0), f64::from_bits(1));
    }

    #[test]
    fn test_boundary_clamps_schema() {
        assert_eq!(boundary(3, 40), boundary(3, MAX_SCHEMA));
        assert_eq!(boundary(-3, -40), boundary(-3, MIN_SCHEMA));
        assert_eq!(boundary(1, i32::MAX), boundary(1, MAX_SCHEMA));
        assert_eq!(boundary(1, i32::MIN), boundary(1, MIN_SCHEMA));
    }

    #[test]
    fn test_target_index() {
        assert_eq!(target_index(5, 2, 2), 5);
        assert_eq!(target_index(1, 1, 0), 1);
        assert_eq!(target_index(2, 1, 0), 1);
        assert_eq!(target_index(3, 1, 0), 2);
        assert_eq!(target_index(0, 1, 0), 0);
        assert_eq!(target_index(-1, 1, 0), 0);
        assert_eq!(target_index(-2, 1, 0), -1);
        assert_eq!(target_index(8, 3, 0), 1);
        assert_eq!(target_index(9, 3, 0), 2);
    }

    #[test]
    fn test_target_index_matches_boundaries() {
        for from in MIN_SCHEMA..=MAX_SCHEMA {
            for to in MIN_SCHEMA..=from {
                for index in -50..50 {
                    let merged = target_index(index, from, to);
                    let upper = boundary(index, from);
                    assert!(upper <= boundary(merged, to), "{} {} {}", from, to, index);
                    assert!(upper > boundary(merged - 1, to), "{} {} {}", from, to, index);
                }
            }
        }
    }

    #[test]
    fn test_schema_from_bucket_factor() {
        assert_eq!(schema_from_bucket_factor(2.0), Ok(0));
        assert_eq!(schema_from_bucket_factor(std::f64::consts::SQRT_2), Ok(1));
        assert_eq!(schema_from_bucket_factor(2f64.powf(0.25)), Ok(2));
        assert_eq!(schema_from_bucket_factor(4.0), Ok(-1));
        assert_eq!(schema_from_bucket_factor(1.0001), Ok(MAX_SCHEMA));
        assert_eq!(schema_from_bucket_factor(1e300), Ok(MIN_SCHEMA));
        assert!(schema_from_bucket_factor(1.0).is_err());
        assert!(schema_from_bucket_factor(0.5).is_err());
        assert!(schema_from_bucket_factor(f64::NAN).is_err());
    }
}
