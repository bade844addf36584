//! Enclosures of transcendental values as rational intervals.
//!
//! Every function returns a `RationalInterval` that is guaranteed to
//! contain the true value, with a width governed by the requested
//! [`Precision`]. The enclosures are built from plain Taylor and atanh
//! series over exact rationals, truncated with their standard tail bounds;
//! nothing here ever touches floating point.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::errors::*;
use crate::interval::{pow_rational, IntervalResult, RationalInterval};

/// Target error for an enclosure: `radix ^ exp`. The default used by the
/// parser is one millionth in the ambient input base.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Precision {
    pub radix: u32,
    pub exp: i32,
}

pub const DEFAULT_PRECISION_EXP: i32 = -6;

impl Default for Precision {
    fn default() -> Precision {
        Precision {
            radix: 10,
            exp: DEFAULT_PRECISION_EXP,
        }
    }
}

impl Precision {
    pub fn new(radix: u32, exp: i32) -> Precision {
        Precision { radix, exp }
    }

    /// The error target as an exact rational
    pub fn eps(&self) -> BigRational {
        let r = BigRational::from_integer(BigInt::from(self.radix));
        if self.exp >= 0 {
            pow_rational(&r, &BigInt::from(self.exp))
        } else {
            BigRational::one() / pow_rational(&r, &BigInt::from(-self.exp))
        }
    }
}

fn rat(n: i64, d: i64) -> BigRational {
    BigRational::new(BigInt::from(n), BigInt::from(d))
}

fn big(n: i64) -> BigRational {
    BigRational::from_integer(BigInt::from(n))
}

pub(crate) fn hull(a: &RationalInterval, b: &RationalInterval) -> RationalInterval {
    let lo = if a.lo() < b.lo() { a.lo() } else { b.lo() };
    let hi = if a.hi() > b.hi() { a.hi() } else { b.hi() };
    RationalInterval::new(lo.clone(), hi.clone())
}

// Alternating arctan series for |x| < 1. The truncation error of an
// alternating series with decreasing terms is bounded by the first term
// left out.
fn arctan_series(x: &BigRational, eps: &BigRational) -> RationalInterval {
    let x2 = x * x;
    let mut power = x.clone();
    let mut k: u32 = 0;
    let mut sum = BigRational::zero();
    loop {
        let contrib = &power / big(i64::from(2 * k + 1));
        if contrib.abs() <= *eps {
            let bound = contrib.abs();
            return RationalInterval::new(&sum - &bound, &sum + &bound);
        }
        if k % 2 == 0 {
            sum += contrib;
        } else {
            sum -= contrib;
        }
        power *= &x2;
        k += 1;
    }
}

/// Enclosure of pi by the Machin formula
/// `pi = 16*atan(1/5) - 4*atan(1/239)`
pub fn pi(prec: Precision) -> RationalInterval {
    let eps = prec.eps();
    let a = arctan_series(&rat(1, 5), &(&eps / big(64)));
    let b = arctan_series(&rat(1, 239), &(&eps / big(16)));
    let sixteen = RationalInterval::point(big(16));
    let four = RationalInterval::point(big(4));
    sixteen.mul(&a).sub(&four.mul(&b))
}

// e^r for |r| <= 1/2: the factorial tail after t_k is below 2*t_{k+1}
fn exp_small(r: &BigRational, eps: &BigRational) -> RationalInterval {
    let mut term = BigRational::one();
    let mut sum = BigRational::zero();
    let mut k: i64 = 0;
    loop {
        let bound = term.abs() * big(2);
        if bound <= *eps && k > 1 {
            return RationalInterval::new(&sum - &bound, &sum + &bound);
        }
        sum += &term;
        k += 1;
        term = &term * r / big(k);
    }
}

/// Enclosure of `e^x` for a rational `x`: split `x = n + r` with
/// `|r| <= 1/2`, take the series at `r` and an interval power of the `e`
/// enclosure for the integer part
pub fn exp(x: &BigRational, prec: Precision) -> IntervalResult {
    let eps = prec.eps();
    let n = (x + rat(1, 2)).floor().to_integer();
    let r = x - BigRational::from_integer(n.clone());

    if n.is_zero() {
        return Ok(exp_small(&r, &(&eps / big(2))));
    }

    // 3^|n| dominates both e^n and the sensitivity of the n-th power
    let mag = pow_rational(&big(3), &n.abs());
    let scale = &mag * big(4) * BigRational::from_integer(n.abs() * BigInt::from(2) + BigInt::one());
    let half = exp_small(&rat(1, 2), &(&eps / &scale));
    let int_part = half.mul(&half).pow(&n)?;
    let frac_part = exp_small(&r, &(&eps / (&mag * big(4))));
    Ok(int_part.mul(&frac_part))
}

/// Enclosure of `e` itself
pub fn e(prec: Precision) -> RationalInterval {
    let eps = prec.eps();
    let half = exp_small(&rat(1, 2), &(&eps / big(8)));
    half.mul(&half)
}

// ln 2 through the atanh series at z = 1/3
fn ln2(eps: &BigRational) -> RationalInterval {
    atanh_series(&rat(1, 3), eps)
}

// 2 * sum z^(2j+1)/(2j+1); valid for |z| <= 1/3 where the tail after a
// term is below that term (geometric ratio 1/9, factor 9/8 < 2)
fn atanh_series(z: &BigRational, eps: &BigRational) -> RationalInterval {
    let z2 = z * z;
    let mut power = z.clone();
    let mut j: u32 = 0;
    let mut sum = BigRational::zero();
    loop {
        let contrib = &power / big(i64::from(2 * j + 1)) * big(2);
        if contrib.abs() <= *eps {
            let bound = contrib.abs() * big(2);
            return RationalInterval::new(&sum - &bound, &sum + &bound);
        }
        sum += contrib;
        power *= &z2;
        j += 1;
    }
}

/// Enclosure of the natural logarithm, domain `x > 0`
pub fn ln(x: &BigRational, prec: Precision) -> IntervalResult {
    if !x.is_positive() {
        return Err(CalcError::Domain("ln".to_string(), format!("{}", x)));
    }
    let eps = prec.eps();

    // fold x into [2/3, 3/2] by powers of two
    let mut m = x.clone();
    let mut k: i64 = 0;
    let hi = rat(3, 2);
    let lo = rat(2, 3);
    while m > hi {
        m /= big(2);
        k += 1;
    }
    while m < lo {
        m *= big(2);
        k -= 1;
    }

    // z stays within [-1/5, 1/5] after the reduction
    let z = (&m - BigRational::one()) / (&m + BigRational::one());
    let series = atanh_series(&z, &(&eps / big(4)));
    if k == 0 {
        return Ok(series);
    }
    let l2 = ln2(&(&eps / (big(4) * big(k.abs() + 1))));
    let scaled = RationalInterval::point(big(k)).mul(&l2);
    Ok(series.add(&scaled))
}

/// Enclosure of `log_b(x) = ln x / ln b`; `b` must be positive and not 1
pub fn log(x: &BigRational, b: &BigRational, prec: Precision) -> IntervalResult {
    if !b.is_positive() || b == &BigRational::one() {
        return Err(CalcError::Domain("log".to_string(), format!("base {}", b)));
    }
    let inner = Precision::new(prec.radix, prec.exp - 4);
    let num = ln(x, inner)?;
    let den = ln(b, inner)?;
    num.div(&den)
        .map_err(|_| CalcError::Domain("log".to_string(), format!("base {}", b)))
}

// reduce x by whole turns so |r| stays below 4, returning the residue
// interval (its width accounts for the pi enclosure error)
fn mod_two_pi(x: &BigRational, prec: Precision) -> RationalInterval {
    let pi_i = pi(Precision::new(prec.radix, prec.exp - 4));
    let two_pi = RationalInterval::point(big(2)).mul(&pi_i);
    let turns = (x / two_pi.midpoint()).round().to_integer();
    if turns.is_zero() {
        return RationalInterval::point(x.clone());
    }
    RationalInterval::point(x.clone()).sub(&RationalInterval::point(BigRational::from_integer(turns)).mul(&two_pi))
}

// sin series around a rational point, |r| <= 4; alternating bound is valid
// once (2j)(2j+1) > r^2, which index 4 guarantees
fn sin_series(r: &BigRational, eps: &BigRational) -> RationalInterval {
    let r2 = r * r;
    let mut term = r.clone();
    let mut sum = BigRational::zero();
    let mut j: i64 = 0;
    loop {
        let bound = term.abs();
        if bound <= *eps && j >= 4 {
            return RationalInterval::new(&sum - &bound, &sum + &bound);
        }
        if j % 2 == 0 {
            sum += &term;
        } else {
            sum -= &term;
        }
        j += 1;
        term = &term * &r2 / big(2 * j) / big(2 * j + 1);
    }
}

fn cos_series(r: &BigRational, eps: &BigRational) -> RationalInterval {
    let r2 = r * r;
    let mut term = BigRational::one();
    let mut sum = BigRational::zero();
    let mut j: i64 = 0;
    loop {
        let bound = term.abs();
        if bound <= *eps && j >= 4 {
            return RationalInterval::new(&sum - &bound, &sum + &bound);
        }
        if j % 2 == 0 {
            sum += &term;
        } else {
            sum -= &term;
        }
        j += 1;
        term = &term * &r2 / big(2 * j - 1) / big(2 * j);
    }
}

/// Enclosure of the sine of a rational argument
pub fn sin(x: &BigRational, prec: Precision) -> RationalInterval {
    let eps = prec.eps();
    let r = mod_two_pi(x, prec);
    // the slope of sin is at most 1, so the residue width carries over
    let core = sin_series(&r.midpoint(), &(&eps / big(2)));
    let slack = r.width() / big(2);
    RationalInterval::new(core.lo() - &slack, core.hi() + &slack)
}

/// Enclosure of the cosine of a rational argument
pub fn cos(x: &BigRational, prec: Precision) -> RationalInterval {
    let eps = prec.eps();
    let r = mod_two_pi(x, prec);
    let core = cos_series(&r.midpoint(), &(&eps / big(2)));
    let slack = r.width() / big(2);
    RationalInterval::new(core.lo() - &slack, core.hi() + &slack)
}

/// Enclosure of the tangent; fails near the poles where the cosine
/// enclosure straddles zero
pub fn tan(x: &BigRational, prec: Precision) -> IntervalResult {
    let inner = Precision::new(prec.radix, prec.exp - 2);
    let s = sin(x, inner);
    let c = cos(x, inner);
    s.div(&c).map_err(|_| CalcError::Domain("tan".to_string(), format!("{}", x)))
}

/// Enclosure of the arctangent for any rational argument
pub fn arctan(x: &BigRational, prec: Precision) -> RationalInterval {
    let eps = prec.eps();
    let one = BigRational::one();
    if x.abs() < one {
        return arctan_series(x, &(&eps / big(2)));
    }
    let quarter = pi(Precision::new(prec.radix, prec.exp - 2)).mul(&RationalInterval::point(rat(1, 4)));
    if x.abs() == one {
        return if x.is_positive() { quarter } else { quarter.negate() };
    }
    // atan(x) = sign(x)*pi/2 - atan(1/x)
    let half = quarter.mul(&RationalInterval::point(big(2)));
    let rest = arctan_series(&(one / x), &(&eps / big(2)));
    if x.is_positive() {
        half.sub(&rest)
    } else {
        half.negate().sub(&rest)
    }
}

/// Enclosure of the arcsine, domain `|x| <= 1`
pub fn arcsin(x: &BigRational, prec: Precision) -> IntervalResult {
    let one = BigRational::one();
    if x.abs() > one {
        return Err(CalcError::Domain("arcsin".to_string(), format!("{}", x)));
    }
    let half_pi = pi(Precision::new(prec.radix, prec.exp - 2)).mul(&RationalInterval::point(rat(1, 2)));
    if x.abs() == one {
        return Ok(if x.is_positive() { half_pi } else { half_pi.negate() });
    }
    if x.is_zero() {
        return Ok(RationalInterval::point(BigRational::zero()));
    }
    // asin(x) = atan(x / sqrt(1 - x^2)); the arctan slope never exceeds 1,
    // so the root-enclosure width transfers directly
    let inner = Precision::new(prec.radix, prec.exp - 4);
    let root = nth_root(&(&one - x * x), 2, inner)?;
    let t = RationalInterval::point(x.clone())
        .div(&root)
        .map_err(|_| CalcError::Domain("arcsin".to_string(), format!("{}", x)))?;
    let core = arctan(&t.midpoint(), Precision::new(prec.radix, prec.exp - 1));
    let slack = t.width() / big(2);
    Ok(RationalInterval::new(core.lo() - &slack, core.hi() + &slack))
}

/// Enclosure of the arccosine, domain `|x| <= 1`
pub fn arccos(x: &BigRational, prec: Precision) -> IntervalResult {
    let half_pi = pi(Precision::new(prec.radix, prec.exp - 2)).mul(&RationalInterval::point(rat(1, 2)));
    let s = arcsin(x, prec).map_err(|_| CalcError::Domain("arccos".to_string(), format!("{}", x)))?;
    Ok(half_pi.sub(&s))
}

/// Bisection enclosure of the n-th root of a rational. Odd degrees accept
/// negative arguments; even degrees require `x >= 0`.
pub fn nth_root(x: &BigRational, n: u32, prec: Precision) -> IntervalResult {
    if n == 0 {
        return Err(CalcError::Domain("root".to_string(), "degree 0".to_string()));
    }
    if x.is_negative() && n % 2 == 0 {
        return Err(CalcError::Domain("root".to_string(), format!("{}", x)));
    }
    if x.is_zero() {
        return Ok(RationalInterval::point(BigRational::zero()));
    }
    let neg = x.is_negative();
    let mag = x.abs();
    let eps = prec.eps();
    let deg = BigInt::from(n);

    let mut lo = BigRational::zero();
    let mut hi = if mag > BigRational::one() { mag.clone() } else { BigRational::one() };
    while &hi - &lo > eps {
        let mid = (&lo + &hi) / big(2);
        if pow_rational(&mid, &deg) <= mag {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    if neg {
        return Ok(RationalInterval::new(-hi, -lo));
    }
    Ok(RationalInterval::new(lo, hi))
}

/// Enclosure of `base ^ exponent` for a rational exponent through
/// `exp(exponent * ln base)`, endpoint-wise; the base must stay positive
pub fn interval_power(base: &RationalInterval, exponent: &BigRational, prec: Precision) -> IntervalResult {
    if !base.lo().is_positive() {
        return Err(CalcError::Domain("^".to_string(), format!("{}", base)));
    }
    let inner = Precision::new(prec.radix, prec.exp - 8);
    let mut out: Option<RationalInterval> = None;
    for end in [base.lo().clone(), base.hi().clone()].iter() {
        let l = ln(end, inner)?;
        let scaled = l.mul(&RationalInterval::point(exponent.clone()));
        let e_lo = exp(scaled.lo(), inner)?;
        let e_hi = exp(scaled.hi(), inner)?;
        let part = hull(&e_lo, &e_hi);
        out = Some(match out {
            Some(prev) => hull(&prev, &part),
            None => part,
        });
    }
    Ok(out.unwrap_or_else(|| RationalInterval::point(BigRational::one())))
}

/// Endpoint-wise `base ** (p/q)`: a `q`-th root enclosure raised to `p`.
/// The multiplicative flavor used by the `**` operator.
pub fn root_power(base: &RationalInterval, p: &BigInt, q: u32, prec: Precision) -> IntervalResult {
    let inner = Precision::new(prec.radix, prec.exp - 4);
    let lo_root = nth_root(base.lo(), q, inner)?;
    let hi_root = nth_root(base.hi(), q, inner)?;
    let lo_pow = lo_root.mpow(p)?;
    let hi_pow = hi_root.mpow(p)?;
    Ok(hull(&lo_pow, &hi_pow))
}
