use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::errors::*;

pub type IntervalResult = Result<RationalInterval, CalcError>;

/// A closed interval with exact rational endpoints, `lo <= hi` always.
///
/// The two flags are provenance markers, not part of the mathematical
/// value: `explicit` records that the interval was spelled with `:` and
/// `keep` that it came out of a multiplicative power or a transcendental
/// function. Arithmetic ignores both; only the final promotion step reads
/// them, so `PartialEq` compares endpoints alone.
#[derive(Clone)]
pub struct RationalInterval {
    lo: BigRational,
    hi: BigRational,
    pub explicit: bool,
    pub keep: bool,
}

impl fmt::Display for RationalInterval {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.lo, self.hi)
    }
}

impl fmt::Debug for RationalInterval {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{:?}, {:?}]", self.lo, self.hi)
    }
}

impl PartialEq for RationalInterval {
    fn eq(&self, other: &RationalInterval) -> bool {
        self.lo == other.lo && self.hi == other.hi
    }
}

impl RationalInterval {
    /// Builds an interval from two endpoints in either order
    pub fn new(a: BigRational, b: BigRational) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        RationalInterval {
            lo,
            hi,
            explicit: false,
            keep: false,
        }
    }

    /// A zero-width interval around a single rational
    pub fn point(r: BigRational) -> Self {
        RationalInterval {
            lo: r.clone(),
            hi: r,
            explicit: false,
            keep: false,
        }
    }

    pub fn lo(&self) -> &BigRational {
        &self.lo
    }

    pub fn hi(&self) -> &BigRational {
        &self.hi
    }

    pub fn is_point(&self) -> bool {
        self.lo == self.hi
    }

    pub fn contains_zero(&self) -> bool {
        !self.lo.is_positive() && !self.hi.is_negative()
    }

    pub fn width(&self) -> BigRational {
        &self.hi - &self.lo
    }

    pub fn midpoint(&self) -> BigRational {
        (&self.lo + &self.hi) / BigRational::from_integer(BigInt::from(2))
    }

    pub fn negate(&self) -> Self {
        RationalInterval::new(-&self.hi, -&self.lo)
    }

    pub fn add(&self, rhs: &RationalInterval) -> Self {
        RationalInterval::new(&self.lo + &rhs.lo, &self.hi + &rhs.hi)
    }

    pub fn sub(&self, rhs: &RationalInterval) -> Self {
        RationalInterval::new(&self.lo - &rhs.hi, &self.hi - &rhs.lo)
    }

    pub fn mul(&self, rhs: &RationalInterval) -> Self {
        let pp = &self.lo * &rhs.lo;
        let ph = &self.lo * &rhs.hi;
        let hp = &self.hi * &rhs.lo;
        let hh = &self.hi * &rhs.hi;
        let mut lo = pp.clone();
        let mut hi = pp;
        for v in [ph, hp, hh].iter() {
            if *v < lo {
                lo = v.clone();
            }
            if *v > hi {
                hi = v.clone();
            }
        }
        RationalInterval::new(lo, hi)
    }

    pub fn div(&self, rhs: &RationalInterval) -> IntervalResult {
        if rhs.contains_zero() {
            if rhs.is_point() {
                return Err(CalcError::DividedByZero(format!("{}", self)));
            }
            return Err(CalcError::IntervalDividedByZero(format!("{}", self)));
        }
        let inv = RationalInterval::new(
            BigRational::one() / &rhs.hi,
            BigRational::one() / &rhs.lo,
        );
        Ok(self.mul(&inv))
    }

    /// Standard interval power. Even exponents fold the sign: an interval
    /// straddling zero starts at zero. Negative exponents invert first.
    pub fn pow(&self, k: &BigInt) -> IntervalResult {
        if k.is_zero() {
            if self.is_point() && self.lo.is_zero() {
                return Err(CalcError::ZeroToZero);
            }
            return Ok(RationalInterval::point(BigRational::one()));
        }
        if k.is_negative() {
            let inverted = RationalInterval::point(BigRational::one()).div(self)?;
            return inverted.pow(&-k);
        }
        let even = (k % BigInt::from(2)).is_zero();
        let pl = pow_rational(&self.lo, k);
        let ph = pow_rational(&self.hi, k);
        if even {
            if self.contains_zero() {
                let hi = if pl > ph { pl } else { ph };
                return Ok(RationalInterval::new(BigRational::zero(), hi));
            }
            return Ok(RationalInterval::new(pl, ph));
        }
        Ok(RationalInterval::new(pl, ph))
    }

    /// Multiplicative power: endpoint-wise raising that keeps each
    /// endpoint attached to its own power, reordering only when the raw
    /// pair comes out reversed. Zero exponents are rejected.
    pub fn mpow(&self, k: &BigInt) -> IntervalResult {
        if k.is_zero() {
            return Err(CalcError::Domain(
                "**".to_string(),
                "a zero exponent (requires at least one factor)".to_string(),
            ));
        }
        if k.is_negative() {
            if self.lo.is_zero() || self.hi.is_zero() {
                return Err(CalcError::DividedByZero(format!("{}", self)));
            }
            let flipped = RationalInterval::new(
                BigRational::one() / &self.hi,
                BigRational::one() / &self.lo,
            );
            return flipped.mpow(&-k);
        }
        Ok(RationalInterval::new(
            pow_rational(&self.lo, k),
            pow_rational(&self.hi, k),
        ))
    }

    /// Carries the provenance flags of both operands onto this interval
    pub(crate) fn inherit(mut self, a: &RationalInterval, b: &RationalInterval) -> Self {
        self.explicit = a.explicit || b.explicit;
        self.keep = a.keep || b.keep;
        self
    }

    pub(crate) fn marked(mut self, explicit: bool, keep: bool) -> Self {
        self.explicit = explicit;
        self.keep = keep;
        self
    }
}

// k must be non-negative
pub(crate) fn pow_rational(r: &BigRational, k: &BigInt) -> BigRational {
    let mut res = BigRational::one();
    let mut base = r.clone();
    let mut left = k.clone();
    let two = BigInt::from(2);
    while left.is_positive() {
        if (&left % &two).is_zero() {
            left /= &two;
            base = &base * &base;
        } else {
            left -= BigInt::one();
            res *= &base;
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rat(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    fn ival(a: i64, b: i64) -> RationalInterval {
        RationalInterval::new(rat(a, 1), rat(b, 1))
    }

    #[test]
    fn test_ordering() {
        let i = RationalInterval::new(rat(3, 1), rat(1, 1));
        assert_eq!(i.lo(), &rat(1, 1));
        assert_eq!(i.hi(), &rat(3, 1));
        assert!(ival(2, 2).is_point());
        assert!(ival(-1, 1).contains_zero());
        assert!(!ival(1, 2).contains_zero());
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(ival(1, 2).add(&ival(3, 5)), ival(4, 7));
        assert_eq!(ival(1, 2).sub(&ival(3, 5)), ival(-4, -1));
        assert_eq!(ival(-1, 2).mul(&ival(3, 5)), ival(-5, 10));
        assert_eq!(ival(-2, -1).mul(&ival(-3, 4)), ival(-8, 6));
        assert_eq!(ival(4, 8).div(&ival(2, 4)).unwrap(), ival(1, 4));
        assert_eq!(ival(1, 2).negate(), ival(-2, -1));
    }

    #[test]
    fn test_division_by_zero() {
        let e = ival(1, 2).div(&ival(0, 0));
        assert_eq!(e, Err(CalcError::DividedByZero("1:2".to_string())));
        let e = ival(1, 2).div(&ival(-1, 1));
        assert_eq!(e, Err(CalcError::IntervalDividedByZero("1:2".to_string())));
    }

    #[test]
    fn test_pow() {
        assert_eq!(ival(-2, 3).pow(&BigInt::from(2)).unwrap(), ival(0, 9));
        assert_eq!(ival(-2, 3).pow(&BigInt::from(3)).unwrap(), ival(-8, 27));
        assert_eq!(ival(-3, -2).pow(&BigInt::from(2)).unwrap(), ival(4, 9));
        assert_eq!(
            ival(2, 4).pow(&BigInt::from(-1)).unwrap(),
            RationalInterval::new(rat(1, 4), rat(1, 2))
        );
        assert_eq!(ival(2, 3).pow(&BigInt::zero()).unwrap(), ival(1, 1));
        assert_eq!(ival(0, 0).pow(&BigInt::zero()), Err(CalcError::ZeroToZero));
    }

    #[test]
    fn test_mpow() {
        assert_eq!(ival(2, 3).mpow(&BigInt::from(2)).unwrap(), ival(4, 9));
        // endpoint-wise, then reordered
        assert_eq!(ival(-2, 3).mpow(&BigInt::from(2)).unwrap(), ival(4, 9));
        assert_eq!(
            ival(2, 4).mpow(&BigInt::from(-2)).unwrap(),
            RationalInterval::new(rat(1, 16), rat(1, 4))
        );
        assert!(ival(2, 3).mpow(&BigInt::zero()).is_err());
    }
}
