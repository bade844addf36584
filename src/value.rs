use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::errors::*;
use crate::funcs::{self, Precision};
use crate::interval::RationalInterval;

/// Expression calculation result: either value or error
pub type CalcResult = Result<Value, CalcError>;

/// Supported value types. Every operation picks the widest type among its
/// operands: an interval absorbs rationals, a rational absorbs integers.
/// The flag on `Ratio` remembers an explicit `a/b` spelling so `4/1` stays
/// a fraction through promotion.
#[derive(Clone)]
pub enum Value {
    /// Big integer number
    Int(BigInt),
    /// Exact rational, reduced with a positive denominator
    Ratio(BigRational, bool),
    /// Closed rational interval
    Interval(RationalInterval),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            Value::Int(ref i) => write!(f, "{}", i),
            Value::Ratio(ref r, ..) => write!(f, "{}/{}", r.numer(), r.denom()),
            Value::Interval(ref i) => write!(f, "{}", i),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            Value::Int(ref i) => write!(f, "Int({})", i),
            Value::Ratio(ref r, ref e) => write!(f, "Ratio({}/{}, {})", r.numer(), r.denom(), e),
            Value::Interval(ref i) => write!(f, "Interval({:?})", i),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, &other) {
            (Value::Int(ref i1), Value::Int(ref i2)) => i1 == i2,
            (Value::Ratio(ref r1, ..), Value::Ratio(ref r2, ..)) => r1 == r2,
            (Value::Interval(ref v1), Value::Interval(ref v2)) => v1 == v2,
            (_, _) => false,
        }
    }
}

impl Default for Value {
    fn default() -> Value {
        Value::Int(BigInt::zero())
    }
}

// teacher-style repeated squaring; k must be non-negative
fn int_pow(base: &BigInt, k: &BigInt) -> BigInt {
    let mut res = BigInt::one();
    let mut b = base.clone();
    let mut left = k.clone();
    let two = BigInt::from(2);
    while left.is_positive() {
        if (&left % &two).is_zero() {
            left /= &two;
            b = &b * &b;
        } else {
            left -= BigInt::one();
            res *= &b;
        }
    }
    res
}

fn int_factorial(n: &BigInt) -> BigInt {
    let mut res = BigInt::one();
    let mut cnt = BigInt::one();
    while cnt <= *n {
        res *= &cnt;
        cnt += BigInt::one();
    }
    res
}

fn int_double_factorial(n: &BigInt) -> BigInt {
    let mut res = BigInt::one();
    let mut cnt = n.clone();
    while cnt > BigInt::one() {
        res *= &cnt;
        cnt -= BigInt::from(2);
    }
    res
}

macro_rules! basic_op {
    ($id:ident, $ival:ident, $op:tt) => {
        pub fn $id(self, rhs: Value) -> CalcResult {
            match (&self, &rhs) {
                (Value::Interval(..), ..) | (.., Value::Interval(..)) => {
                    let i1 = self.into_interval();
                    let i2 = rhs.into_interval();
                    let res = i1.$ival(&i2).inherit(&i1, &i2);
                    Ok(Value::Interval(res))
                },
                (Value::Ratio(..), ..) | (.., Value::Ratio(..)) => {
                    let r1 = self.into_raw_ratio();
                    let r2 = rhs.into_raw_ratio();
                    Ok(Value::Ratio(r1 $op r2, false))
                },
                _ => {
                    let i1 = self.into_raw_big_int();
                    let i2 = rhs.into_raw_big_int();
                    Ok(Value::Int(i1 $op i2))
                },
            }
        }
    }
}

impl Value {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_ratio(r: BigRational) -> Self {
        Value::Ratio(r, false)
    }

    // --------------------------------

    pub(crate) fn into_interval(self) -> RationalInterval {
        match self {
            Value::Int(i) => RationalInterval::point(BigRational::from_integer(i)),
            Value::Ratio(r, ..) => RationalInterval::point(r),
            Value::Interval(i) => i,
        }
    }

    fn into_raw_ratio(self) -> BigRational {
        match self {
            Value::Int(i) => BigRational::from_integer(i),
            Value::Ratio(r, ..) => r,
            Value::Interval(i) => i.midpoint(), // unreachable in dispatch
        }
    }

    fn into_raw_big_int(self) -> BigInt {
        match self {
            Value::Int(i) => i,
            Value::Ratio(r, ..) => r.to_integer(), // unreachable in dispatch
            Value::Interval(i) => i.midpoint().to_integer(), // unreachable in dispatch
        }
    }

    // --------------------------------

    /// Returns true if the value is zero (for an interval: the zero point)
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Int(ref i) => i.is_zero(),
            Value::Ratio(ref r, ..) => r.is_zero(),
            Value::Interval(ref i) => i.is_point() && i.lo().is_zero(),
        }
    }

    basic_op!(addition, add, +);
    basic_op!(subtract, sub, -);
    basic_op!(multiply, mul, *);

    pub fn divide(self, rhs: Value) -> CalcResult {
        if rhs.is_zero() {
            return Err(CalcError::DividedByZero(format!("{}", self)));
        }
        match (&self, &rhs) {
            (Value::Interval(..), ..) | (.., Value::Interval(..)) => {
                let i1 = self.into_interval();
                let i2 = rhs.into_interval();
                let res = i1.div(&i2)?.inherit(&i1, &i2);
                Ok(Value::Interval(res))
            }
            _ => {
                let r1 = self.into_raw_ratio();
                let r2 = rhs.into_raw_ratio();
                Ok(Value::Ratio(r1 / r2, false))
            }
        }
    }

    /// Inverts the sign of the value
    pub fn negate(self) -> CalcResult {
        match self {
            Value::Int(i) => Ok(Value::Int(-i)),
            Value::Ratio(r, e) => Ok(Value::Ratio(-r, e)),
            Value::Interval(i) => {
                let (e, k) = (i.explicit, i.keep);
                Ok(Value::Interval(i.negate().marked(e, k)))
            }
        }
    }

    /// Standard exponentiation `^`. Integer exponents run repeated
    /// squaring and stay exact; fractional exponents go through the
    /// interval power enclosure and the result refuses later promotion.
    pub fn pow(self, rhs: Value, prec: Precision) -> CalcResult {
        let exp = match rhs {
            Value::Int(k) => Exponent::Whole(k),
            Value::Ratio(r, ..) => {
                if r.is_integer() {
                    Exponent::Whole(r.to_integer())
                } else {
                    Exponent::Broken(r)
                }
            }
            Value::Interval(i) => {
                if !i.is_point() {
                    return Err(CalcError::UnsupportedComposition(
                        "an interval exponent".to_string(),
                    ));
                }
                let r = i.lo().clone();
                if r.is_integer() {
                    Exponent::Whole(r.to_integer())
                } else {
                    Exponent::Broken(r)
                }
            }
        };

        match exp {
            Exponent::Whole(k) => {
                if self.is_zero() {
                    if k.is_zero() {
                        return Err(CalcError::ZeroToZero);
                    }
                    if k.is_negative() {
                        return Err(CalcError::DividedByZero(format!("{}", self)));
                    }
                    return Ok(self);
                }
                if k.is_zero() {
                    return Ok(Value::Int(BigInt::one()));
                }
                match self {
                    Value::Int(i) => {
                        if k.is_negative() {
                            let den = int_pow(&i, &-&k);
                            Ok(Value::Ratio(BigRational::new(BigInt::one(), den), false))
                        } else {
                            Ok(Value::Int(int_pow(&i, &k)))
                        }
                    }
                    Value::Ratio(r, ..) => {
                        let (mut base, mut kk) = (r, k);
                        if kk.is_negative() {
                            base = BigRational::one() / base;
                            kk = -kk;
                        }
                        Ok(Value::Ratio(crate::interval::pow_rational(&base, &kk), false))
                    }
                    Value::Interval(i) => {
                        let (e, keep) = (i.explicit, i.keep);
                        Ok(Value::Interval(i.pow(&k)?.marked(e, keep)))
                    }
                }
            }
            Exponent::Broken(r) => {
                let base = self.into_interval();
                let res = funcs::interval_power(&base, &r, prec)?;
                Ok(Value::Interval(res.marked(false, true)))
            }
        }
    }

    /// Multiplicative exponentiation `**`: endpoint-wise raising. The
    /// result is always an interval and never collapses to a scalar.
    pub fn mpow(self, rhs: Value, prec: Precision) -> CalcResult {
        let exp = match rhs {
            Value::Int(k) => Exponent::Whole(k),
            Value::Ratio(r, ..) => {
                if r.is_integer() {
                    Exponent::Whole(r.to_integer())
                } else {
                    Exponent::Broken(r)
                }
            }
            Value::Interval(i) => {
                if !i.is_point() {
                    return Err(CalcError::UnsupportedComposition(
                        "an interval exponent".to_string(),
                    ));
                }
                let r = i.lo().clone();
                if r.is_integer() {
                    Exponent::Whole(r.to_integer())
                } else {
                    Exponent::Broken(r)
                }
            }
        };

        let base = self.into_interval();
        match exp {
            Exponent::Whole(k) => {
                let explicit = base.explicit;
                Ok(Value::Interval(base.mpow(&k)?.marked(explicit, true)))
            }
            Exponent::Broken(r) => {
                let q = match r.denom().to_u32() {
                    Some(q) if q <= 10 => q,
                    _ => {
                        return Err(CalcError::Domain(
                            "**".to_string(),
                            format!("an exponent with denominator {}", r.denom()),
                        ))
                    }
                };
                let res = funcs::root_power(&base, r.numer(), q, prec)?;
                Ok(Value::Interval(res.marked(false, true)))
            }
        }
    }

    // pulls out a non-negative integer or fails with the factorial error
    fn factorial_operand(&self) -> Result<BigInt, CalcError> {
        let i = match self {
            Value::Int(i) => i.clone(),
            Value::Ratio(r, ..) if r.is_integer() => r.to_integer(),
            Value::Interval(iv) if iv.is_point() && iv.lo().is_integer() => {
                iv.lo().to_integer()
            }
            _ => return Err(CalcError::NegativeFactorial(format!("{}", self))),
        };
        if i.is_negative() {
            return Err(CalcError::NegativeFactorial(format!("{}", self)));
        }
        Ok(i)
    }

    // keeps the operand shape: a point interval stays a point interval
    fn rewrap_integer(&self, i: BigInt) -> Value {
        match self {
            Value::Interval(iv) => {
                let p = RationalInterval::point(BigRational::from_integer(i));
                Value::Interval(p.marked(iv.explicit, iv.keep))
            }
            _ => Value::Int(i),
        }
    }

    /// Returns factorial of a non-negative integer value
    pub fn factorial(self) -> CalcResult {
        let n = self.factorial_operand()?;
        let res = int_factorial(&n);
        Ok(self.rewrap_integer(res))
    }

    /// Returns double factorial `n!! = n * (n-2) * (n-4) * ...`
    pub fn double_factorial(self) -> CalcResult {
        let n = self.factorial_operand()?;
        let res = int_double_factorial(&n);
        Ok(self.rewrap_integer(res))
    }

    /// Coerces any value to a point interval, for compatibility parsing
    pub fn into_point_interval(self) -> Value {
        match self {
            Value::Interval(..) => self,
            other => Value::Interval(other.into_interval()),
        }
    }
}

enum Exponent {
    Whole(BigInt),
    Broken(BigRational),
}

/// Collapses a value to its narrowest faithful form: a point interval
/// becomes a rational, an integer-valued rational becomes an integer.
/// Values whose provenance pins them down (`a:b`, `a/b`, `**`,
/// transcendentals) are left alone.
pub fn promote(v: Value) -> Value {
    match v {
        Value::Interval(i) => {
            if i.is_point() && !i.explicit && !i.keep {
                let r = i.lo().clone();
                if r.is_integer() {
                    Value::Int(r.to_integer())
                } else {
                    Value::Ratio(r, false)
                }
            } else {
                Value::Interval(i)
            }
        }
        Value::Ratio(r, explicit) => {
            if !explicit && r.is_integer() {
                Value::Int(r.to_integer())
            } else {
                Value::Ratio(r, explicit)
            }
        }
        other => other,
    }
}
