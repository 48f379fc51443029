/*
 * Q17.14 signed fixed-point arithmetic.
 *
 * No floating point in kernel mode: load averages and recent-CPU estimates
 * are tracked as 17.14 fixed-point values, scale factor 1 << 14.
 */

const FRACTION_BITS: u32 = 14;
const SCALE: i64 = 1 << FRACTION_BITS;

/// A signed 17.14 fixed-point number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Fixed(i32);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);

    /// Converts an integer to fixed-point.
    pub fn from_int(n: i32) -> Fixed {
        Fixed((n as i64 * SCALE) as i32)
    }

    /// Converts to an integer, rounding toward zero.
    pub fn to_int_trunc(self) -> i32 {
        self.0 / SCALE as i32
    }

    /// Converts to an integer, rounding to nearest (ties away from zero).
    pub fn to_int_round(self) -> i32 {
        let x = self.0 as i64;
        let half = SCALE / 2;
        let rounded = if x >= 0 { x + half } else { x - half };
        (rounded / SCALE) as i32
    }

    pub fn add(self, other: Fixed) -> Fixed {
        Fixed(self.0 + other.0)
    }

    pub fn sub(self, other: Fixed) -> Fixed {
        Fixed(self.0 - other.0)
    }

    pub fn add_int(self, n: i32) -> Fixed {
        self.add(Fixed::from_int(n))
    }

    pub fn sub_int(self, n: i32) -> Fixed {
        self.sub(Fixed::from_int(n))
    }

    pub fn mul(self, other: Fixed) -> Fixed {
        let product = (self.0 as i64) * (other.0 as i64) / SCALE;
        Fixed(product as i32)
    }

    pub fn mul_int(self, n: i32) -> Fixed {
        Fixed(self.0 * n)
    }

    pub fn div(self, other: Fixed) -> Fixed {
        let quotient = (self.0 as i64) * SCALE / (other.0 as i64);
        Fixed(quotient as i32)
    }

    pub fn div_int(self, n: i32) -> Fixed {
        Fixed(self.0 / n)
    }

    pub fn raw(self) -> i32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[quickcheck]
    fn quickcheck_int_round_trip_within_range(n: i16) -> bool {
        Fixed::from_int(n as i32).to_int_trunc() == n as i32
    }

    #[quickcheck]
    fn quickcheck_add_then_sub_is_identity(a: i16, b: i16) -> bool {
        let x = Fixed::from_int(a as i32);
        let y = Fixed::from_int(b as i32);
        x.add(y).sub(y) == x
    }

    #[test]
    fn int_round_trip_truncates() {
        assert_eq!(Fixed::from_int(5).to_int_trunc(), 5);
        assert_eq!(Fixed::from_int(-5).to_int_trunc(), -5);
    }

    #[test]
    fn round_to_nearest_matches_reference_semantics() {
        // 59/60 at scale 1<<14 should round the way the textbook example does.
        let f = Fixed::from_int(59).div_int(60);
        assert_eq!(Fixed::ZERO.add(f).to_int_round(), 1);
        assert_eq!(Fixed::ZERO.to_int_round(), 0);
    }

    #[test]
    fn negative_rounding_ties_away_from_zero() {
        let half = Fixed(SCALE as i32 / 2);
        assert_eq!(Fixed::ZERO.sub(half).to_int_round(), -1);
    }

    #[test]
    fn mul_div_are_inverse_for_nonzero() {
        let a = Fixed::from_int(7);
        let b = Fixed::from_int(3);
        let c = a.div(b).mul(b);
        // integer rounding in fixed-point division loses at most one unit
        assert!((c.raw() - a.raw()).abs() <= 1);
    }
}
