use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;

use crate::errors::*;
use crate::parse::{parse, ParseOptions};
use crate::value::{CalcResult, Value};

/// A numerator/denominator pair kept exactly as handed over, never
/// reduced. Callers use it to look at the raw digits of a result.
#[derive(Clone, PartialEq)]
pub struct Fraction {
    pub num: BigInt,
    pub den: BigInt,
}

impl Fraction {
    pub fn new(num: BigInt, den: BigInt) -> Self {
        Fraction { num, den }
    }

    fn from_rational(r: &BigRational) -> Self {
        Fraction {
            num: r.numer().clone(),
            den: r.denom().clone(),
        }
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl fmt::Debug for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct FractionInterval {
    pub lo: Fraction,
    pub hi: Fraction,
}

/// Result domain of [`fraction_calculate`]
#[derive(Clone, PartialEq, Debug)]
pub enum FractionValue {
    Fraction(Fraction),
    FractionInterval(FractionInterval),
}

/// Interleaves text fragments with rendered values into one expression
/// string: `stitch(&["1 + ", " * 2"], &[v])` becomes `"1 + <v> * 2"`
pub fn stitch(fragments: &[&str], values: &[Value]) -> String {
    let mut out = String::new();
    for (i, frag) in fragments.iter().enumerate() {
        out.push_str(frag);
        if let Some(v) = values.get(i) {
            out.push_str(&format!("{}", v));
        }
    }
    out
}

/// Stitches and evaluates type-aware: the result keeps the native
/// Int / Ratio / Interval tags
pub fn calculate(fragments: &[&str], values: &[Value], opts: &ParseOptions) -> CalcResult {
    parse(&stitch(fragments, values), opts)
}

/// Stitches and evaluates in compatibility mode, then hands the result
/// back as plain numerator/denominator pairs
pub fn fraction_calculate(
    fragments: &[&str],
    values: &[Value],
    opts: &ParseOptions,
) -> Result<FractionValue, CalcError> {
    let mut compat = opts.clone();
    compat.type_aware = false;
    let v = parse(&stitch(fragments, values), &compat)?;
    match v {
        Value::Interval(i) => {
            if i.is_point() {
                Ok(FractionValue::Fraction(Fraction::from_rational(i.lo())))
            } else {
                Ok(FractionValue::FractionInterval(FractionInterval {
                    lo: Fraction::from_rational(i.lo()),
                    hi: Fraction::from_rational(i.hi()),
                }))
            }
        }
        Value::Ratio(r, ..) => Ok(FractionValue::Fraction(Fraction::from_rational(&r))),
        Value::Int(z) => Ok(FractionValue::Fraction(Fraction::new(z, BigInt::from(1)))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::RationalInterval;

    fn rat(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    #[test]
    fn test_stitch() {
        let v = Value::Ratio(rat(1, 2), false);
        assert_eq!(stitch(&["1 + ", ""], &[v]), "1 + 1/2");
        let iv = Value::Interval(RationalInterval::new(rat(1, 1), rat(2, 1)));
        assert_eq!(stitch(&["", " * 2"], &[iv]), "1:2 * 2");
    }

    #[test]
    fn test_calculate() {
        let opts = ParseOptions::default();
        let v = Value::Ratio(rat(1, 4), false);
        assert_eq!(
            calculate(&["3/4 + ", ""], &[v], &opts),
            Ok(Value::Int(BigInt::from(1)))
        );
    }

    #[test]
    fn test_fraction_calculate() {
        let opts = ParseOptions::default();
        let r = fraction_calculate(&["1/2 + 1/4"], &[], &opts).unwrap();
        assert_eq!(
            r,
            FractionValue::Fraction(Fraction::new(BigInt::from(3), BigInt::from(4)))
        );

        let r = fraction_calculate(&["1:2 + 1"], &[], &opts).unwrap();
        match r {
            FractionValue::FractionInterval(fi) => {
                assert_eq!(fi.lo, Fraction::new(BigInt::from(2), BigInt::from(1)));
                assert_eq!(fi.hi, Fraction::new(BigInt::from(3), BigInt::from(1)));
            }
            other => panic!("expected an interval, got {:?}", other),
        }
    }
}
