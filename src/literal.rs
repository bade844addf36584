//! Number-literal decoders.
//!
//! One literal can take many shapes: a bare digit run, a fraction `3/4`,
//! a mixed number `2..1/3`, a decimal `1.25`, a repeating decimal `0.#3`,
//! an interval `1:2`, an uncertainty bracket `1.23[+-5]`, a continued
//! fraction `3.~7~15`, any of them with a base prefix `0x` or a scientific
//! suffix `E5` / `_^5`. Every decoder consumes text from an offset and
//! reports the first offset it did not understand, so the expression
//! parser can pick up from there.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::base::{self, BaseSystem};
use crate::errors::*;
use crate::interval::RationalInterval;
use crate::value::Value;

/// Everything a decoder needs to know about the surrounding parse
pub(crate) struct ReadCtx {
    pub base: BaseSystem,
    pub type_aware: bool,
    pub integer_range_append: bool,
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum Kind {
    Whole,
    Decimal,
    Repeating,
    Fraction,
    Mixed,
    Chain,
}

// one decoded scalar plus the raw digit strings the uncertainty
// notation needs for textual appending
struct Scalar {
    val: BigRational,
    kind: Kind,
    neg: bool,
    had_sci: bool,
    sci_scale: BigRational,
    int_str: String,
    frac_str: Option<String>,
}

fn near(chars: &[char], pos: usize) -> String {
    chars.iter().skip(pos).take(12).collect()
}

pub(crate) fn digit_run(chars: &[char], pos: usize, base: &BaseSystem) -> (String, usize) {
    let mut p = pos;
    let mut out = String::new();
    while let Some(c) = chars.get(p) {
        if base.is_digit(*c) {
            out.push(*c);
            p += 1;
        } else {
            break;
        }
    }
    (out, p)
}

fn radix_pow(base: &BaseSystem, k: i64) -> BigRational {
    let r = BigRational::from_integer(base.radix());
    if k >= 0 {
        crate::interval::pow_rational(&r, &BigInt::from(k))
    } else {
        BigRational::one() / crate::interval::pow_rational(&r, &BigInt::from(-k))
    }
}

fn big_pow(base: &BigInt, k: &BigInt) -> BigRational {
    let r = BigRational::from_integer(base.clone());
    if k.is_negative() {
        BigRational::one() / crate::interval::pow_rational(&r, &-k)
    } else {
        crate::interval::pow_rational(&r, k)
    }
}

// a trailing `E<k>` (decimal reading base only) or `_^<k>` (any base);
// returns the scale factor and the next offset
pub(crate) fn try_sci(chars: &[char], pos: usize, base: &BaseSystem) -> Result<Option<(BigRational, usize)>, CalcError> {
    let decimal_e = base.base() == 10 && matches!(chars.get(pos), Some('E') | Some('e'));
    let caret = matches!(chars.get(pos), Some('_')) && matches!(chars.get(pos + 1), Some('^'));
    if !decimal_e && !caret {
        return Ok(None);
    }
    let mut p = if caret { pos + 2 } else { pos + 1 };
    let mut neg = false;
    match chars.get(p) {
        Some('+') => p += 1,
        Some('-') => {
            neg = true;
            p += 1;
        }
        _ => {}
    }
    let (run, p2) = digit_run(chars, p, base);
    if run.is_empty() {
        return Err(CalcError::InvalidNumber(near(chars, pos)));
    }
    let mut k = base.to_integer(&run)?;
    if neg {
        k = -k;
    }
    let radix = if caret { base.radix() } else { BigInt::from(10) };
    Ok(Some((big_pow(&radix, &k), p2)))
}

fn read_scalar(
    chars: &[char],
    pos: usize,
    base: &BaseSystem,
    allow_sign: bool,
) -> Result<(Scalar, usize), CalcError> {
    let mut p = pos;
    let mut neg = false;
    if allow_sign && chars.get(p) == Some(&'-') {
        neg = true;
        p += 1;
    }

    let (int_str, p2) = digit_run(chars, p, base);
    if int_str.is_empty() {
        return Err(CalcError::InvalidNumber(near(chars, pos)));
    }
    p = p2;

    let mut kind = Kind::Whole;
    let mut frac_str: Option<String> = None;
    let mut val;

    match (chars.get(p), chars.get(p + 1)) {
        (Some('.'), Some('.')) => {
            // mixed number: integer part plus a fraction
            p += 2;
            let (n, p3) = digit_run(chars, p, base);
            if n.is_empty() || chars.get(p3) != Some(&'/') {
                return Err(CalcError::InvalidNumber(near(chars, pos)));
            }
            let (d, p4) = digit_run(chars, p3 + 1, base);
            if d.is_empty() {
                return Err(CalcError::InvalidNumber(near(chars, pos)));
            }
            p = p4;
            let den = base.to_integer(&d)?;
            if den.is_zero() {
                return Err(CalcError::DividedByZero(format!("{}..{}/{}", int_str, n, d)));
            }
            let whole = base.to_integer(&int_str)?;
            let num = base.to_integer(&n)?;
            val = BigRational::from_integer(whole) + BigRational::new(num, den);
            kind = Kind::Mixed;
        }
        (Some('.'), Some('~')) => {
            // continued fraction
            p += 2;
            let a0 = base.to_integer(&int_str)?;
            let (cf, p3) = read_chain(chars, p, base, &a0)?;
            p = p3;
            val = cf;
            kind = Kind::Chain;
        }
        (Some('.'), _) => {
            p += 1;
            let (f, p3) = digit_run(chars, p, base);
            p = p3;
            if chars.get(p) == Some(&'#') {
                let (r, p4) = digit_run(chars, p + 1, base);
                if r.is_empty() {
                    return Err(CalcError::InvalidNumber(near(chars, pos)));
                }
                p = p4;
                val = repeating_value(&int_str, &f, &r, base)?;
                kind = Kind::Repeating;
            } else {
                let whole = base.to_integer(&format!("{}{}", int_str, f))?;
                val = BigRational::from_integer(whole) * radix_pow(base, -(f.len() as i64));
                kind = Kind::Decimal;
            }
            frac_str = Some(f);
        }
        (Some('/'), Some(c)) if base.is_digit(*c) => {
            let (d, p3) = digit_run(chars, p + 1, base);
            p = p3;
            let den = base.to_integer(&d)?;
            if den.is_zero() {
                return Err(CalcError::DividedByZero(format!("{}/{}", int_str, d)));
            }
            val = BigRational::new(base.to_integer(&int_str)?, den);
            kind = Kind::Fraction;
        }
        _ => {
            val = BigRational::from_integer(base.to_integer(&int_str)?);
        }
    }

    let mut had_sci = false;
    let mut sci_scale = BigRational::one();
    if let Some((scale, p3)) = try_sci(chars, p, base)? {
        match kind {
            Kind::Whole | Kind::Decimal | Kind::Repeating => {
                val *= &scale;
                sci_scale = scale;
                had_sci = true;
                p = p3;
            }
            _ => {
                return Err(CalcError::UnsupportedComposition(
                    "scientific notation after a fraction or mixed number".to_string(),
                ));
            }
        }
    }

    if neg {
        val = -val;
    }
    Ok((
        Scalar {
            val,
            kind,
            neg,
            had_sci,
            sci_scale,
            int_str,
            frac_str,
        },
        p,
    ))
}

// value of `int.frac#rep`: the difference of the two digit
// concatenations over the matching difference of radix powers
fn repeating_value(
    int_str: &str,
    frac_str: &str,
    rep_str: &str,
    base: &BaseSystem,
) -> Result<BigRational, CalcError> {
    let f = frac_str.len() as i64;
    let r = rep_str.len() as i64;
    let with_rep = base.to_integer(&format!("{}{}{}", int_str, frac_str, rep_str))?;
    let without = base.to_integer(&format!("{}{}", int_str, frac_str))?;
    let radix = BigRational::from_integer(base.radix());
    let den = crate::interval::pow_rational(&radix, &BigInt::from(f + r))
        - crate::interval::pow_rational(&radix, &BigInt::from(f));
    Ok(BigRational::from_integer(with_rep - without) / den)
}

// terms after `.~`, already past the marker; a0 comes from the caller
fn read_chain(
    chars: &[char],
    pos: usize,
    base: &BaseSystem,
    a0: &BigInt,
) -> Result<(BigRational, usize), CalcError> {
    let mut p = pos;
    let mut terms: Vec<BigInt> = Vec::new();
    loop {
        let (run, p2) = digit_run(chars, p, base);
        if run.is_empty() {
            return Err(CalcError::InvalidNumber(near(chars, pos)));
        }
        terms.push(base.to_integer(&run)?);
        p = p2;
        if chars.get(p) == Some(&'~') {
            p += 1;
        } else {
            break;
        }
    }

    // `x.~0` denotes the plain integer x
    if terms.len() == 1 && terms[0].is_zero() {
        return Ok((BigRational::from_integer(a0.clone()), p));
    }
    for t in &terms {
        if !t.is_positive() {
            return Err(CalcError::InvalidNumber(near(chars, pos)));
        }
    }

    let mut p_prev = BigInt::one();
    let mut p_cur = a0.clone();
    let mut q_prev = BigInt::zero();
    let mut q_cur = BigInt::one();
    for a in &terms {
        let p_next = a * &p_cur + &p_prev;
        let q_next = a * &q_cur + &q_prev;
        p_prev = p_cur;
        p_cur = p_next;
        q_prev = q_cur;
        q_cur = q_next;
    }
    Ok((BigRational::new(p_cur, q_cur), p))
}

// one side of a `:` interval: optional sign, optional `0<letter>` prefix
// switch, then a plain scalar in whatever base applies
fn read_endpoint(
    chars: &[char],
    pos: usize,
    base: &BaseSystem,
    ctx: &ReadCtx,
) -> Result<(BigRational, usize), CalcError> {
    let mut p = pos;
    let mut neg = false;
    if chars.get(p) == Some(&'-') {
        neg = true;
        p += 1;
    }
    let end_base = match prefix_at(chars, p, ctx)? {
        Some(b) => {
            p += 2;
            b
        }
        None => base.clone(),
    };
    let (s, p2) = read_scalar(chars, p, &end_base, false)?;
    if chars.get(p2) == Some(&'[') {
        return Err(CalcError::UnsupportedComposition(
            "an uncertainty bracket inside an interval".to_string(),
        ));
    }
    let val = if neg { -s.val } else { s.val };
    Ok((val, p2))
}

// `0<letter>` base-prefix detection; `e` stays scientific, `d` echoes the
// caller's input base, anything unregistered is an error
fn prefix_at(chars: &[char], pos: usize, ctx: &ReadCtx) -> Result<Option<BaseSystem>, CalcError> {
    if chars.get(pos) != Some(&'0') {
        return Ok(None);
    }
    let c = match chars.get(pos + 1) {
        Some(c) if c.is_ascii_alphabetic() => *c,
        _ => return Ok(None),
    };
    if c == 'e' || c == 'E' {
        return Ok(None);
    }
    if c == 'd' || c == 'D' {
        return Ok(Some(ctx.base.clone()));
    }
    match base::prefix_base(c) {
        Some(b) => Ok(Some(b)),
        None => Err(CalcError::InvalidPrefix(c)),
    }
}

// uncertainty bracket attached to a scalar base; pos sits on the `[`
fn read_uncertainty(
    chars: &[char],
    pos: usize,
    s1: &Scalar,
    base: &BaseSystem,
    ctx: &ReadCtx,
) -> Result<(RationalInterval, usize), CalcError> {
    let mut p = pos + 1;
    let d = s1.frac_str.as_ref().map(|f| f.len()).unwrap_or(0) as i64;
    let has_dot = s1.frac_str.is_some();

    let scale_for = |off: &Scalar| -> BigRational {
        let exp = if off.kind == Kind::Repeating { -d } else { -(d + 1) };
        &off.val * radix_pow(base, exp)
    };

    let iv;
    match chars.get(p) {
        Some('+') | Some('-') => {
            let first = *chars.get(p).unwrap_or(&'+');
            let second = chars.get(p + 1).copied();
            if (first == '+' && second == Some('-')) || (first == '-' && second == Some('+')) {
                // symmetric: base +- offset
                p += 2;
                let (off, p2) = read_scalar(chars, p, base, false)?;
                p = p2;
                if chars.get(p) != Some(&']') {
                    return Err(CalcError::InvalidNumber(near(chars, pos)));
                }
                p += 1;
                let s = scale_for(&off);
                iv = RationalInterval::new(&s1.val - &s, &s1.val + &s);
            } else {
                // relative: +x and/or -y in either order
                let mut up: Option<BigRational> = None;
                let mut down: Option<BigRational> = None;
                loop {
                    let sign = match chars.get(p) {
                        Some('+') => '+',
                        Some('-') => '-',
                        _ => return Err(CalcError::InvalidNumber(near(chars, pos))),
                    };
                    p += 1;
                    let (off, p2) = read_scalar(chars, p, base, false)?;
                    p = p2;
                    let s = scale_for(&off);
                    if sign == '+' {
                        if up.is_some() {
                            return Err(CalcError::InvalidNumber(near(chars, pos)));
                        }
                        up = Some(s);
                    } else {
                        if down.is_some() {
                            return Err(CalcError::InvalidNumber(near(chars, pos)));
                        }
                        down = Some(s);
                    }
                    match chars.get(p) {
                        Some(',') => p += 1,
                        Some(']') => {
                            p += 1;
                            break;
                        }
                        _ => return Err(CalcError::InvalidNumber(near(chars, pos))),
                    }
                }
                let up = up.unwrap_or_else(BigRational::zero);
                let down = down.unwrap_or_else(BigRational::zero);
                iv = RationalInterval::new(&s1.val - &down, &s1.val + &up);
            }
        }
        _ => {
            // range: two digit runs appended to the base text
            let (run1, p2) = digit_run(chars, p, base);
            if run1.is_empty() {
                return Err(CalcError::InvalidNumber(near(chars, pos)));
            }
            p = p2;
            match chars.get(p) {
                Some(',') | Some(':') => p += 1,
                Some(']') => {
                    return Err(CalcError::DeprecatedBracketBase(format!(
                        "{}[{}]",
                        s1.int_str, run1
                    )));
                }
                _ => return Err(CalcError::InvalidNumber(near(chars, pos))),
            }
            let (run2, p3) = digit_run(chars, p, base);
            if run2.is_empty() || chars.get(p3) != Some(&']') {
                return Err(CalcError::InvalidNumber(near(chars, pos)));
            }
            p = p3 + 1;
            if !has_dot && !ctx.integer_range_append {
                return Err(CalcError::InvalidNumber(near(chars, pos)));
            }
            let mut e1 = append_endpoint(s1, &run1, base, has_dot)?;
            let mut e2 = append_endpoint(s1, &run2, base, has_dot)?;
            if s1.neg {
                e1 = -e1;
                e2 = -e2;
            }
            iv = RationalInterval::new(e1, e2);
        }
    }

    // a trailing scientific part scales both endpoints
    if let Some((scale, p2)) = try_sci(chars, p, base)? {
        let scaled = iv.mul(&RationalInterval::point(scale));
        return Ok((scaled, p2));
    }
    Ok((iv, p))
}

// endpoint of a range bracket: digits appended textually to the base
fn append_endpoint(
    s1: &Scalar,
    run: &str,
    base: &BaseSystem,
    has_dot: bool,
) -> Result<BigRational, CalcError> {
    let frac = s1.frac_str.as_deref().unwrap_or("");
    let concat = format!("{}{}{}", s1.int_str, frac, run);
    let z = base.to_integer(&concat)?;
    let shift = frac.len() as i64 + if has_dot { run.len() as i64 } else { 0 };
    Ok(BigRational::from_integer(z) * radix_pow(base, -shift))
}

// a full literal in the given base: scalar, interval or uncertainty
fn read_based(
    chars: &[char],
    pos: usize,
    base: &BaseSystem,
    in_prefix: bool,
    allow_sign: bool,
    ctx: &ReadCtx,
) -> Result<(Value, usize), CalcError> {
    let (s1, mut p) = read_scalar(chars, pos, base, allow_sign)?;

    match chars.get(p) {
        Some('[') => {
            if in_prefix {
                return Err(CalcError::UnsupportedComposition(
                    "an uncertainty bracket after a base prefix".to_string(),
                ));
            }
            if s1.had_sci {
                return Err(CalcError::UnsupportedComposition(
                    "scientific notation inside an uncertainty base".to_string(),
                ));
            }
            if !matches!(s1.kind, Kind::Whole | Kind::Decimal) {
                return Err(CalcError::InvalidNumber(near(chars, pos)));
            }
            let (iv, p2) = read_uncertainty(chars, p, &s1, base, ctx)?;
            Ok((Value::Interval(iv), p2))
        }
        Some(':') => {
            let (hi, p2) = read_endpoint(chars, p + 1, base, ctx)?;
            p = p2;
            let iv = RationalInterval::new(s1.val, hi).marked(true, false);
            Ok((Value::Interval(iv), p))
        }
        _ => {
            let v = match s1.kind {
                Kind::Fraction => Value::Ratio(s1.val, true),
                Kind::Mixed | Kind::Chain => Value::Ratio(s1.val, false),
                Kind::Decimal if !ctx.type_aware => {
                    let places = s1.frac_str.as_ref().map(|f| f.len()).unwrap_or(0) as i64;
                    let half = radix_pow(base, -places) / BigRational::from_integer(BigInt::from(2))
                        * &s1.sci_scale;
                    Value::Interval(RationalInterval::new(&s1.val - &half, &s1.val + &half))
                }
                Kind::Decimal | Kind::Repeating => Value::Ratio(s1.val, false),
                Kind::Whole => {
                    if s1.had_sci {
                        Value::Ratio(s1.val, false)
                    } else {
                        Value::Int(s1.val.to_integer())
                    }
                }
            };
            Ok((v, p))
        }
    }
}

/// Reads one complete literal at `pos`. A leading minus is consumed only
/// when the caller says so; it negates a prefixed literal as a whole and
/// signs the first endpoint of everything else, so `-1:2` runs from -1
/// up to 2. The prefix registry decides the digit base.
pub(crate) fn read_literal(
    chars: &[char],
    pos: usize,
    allow_sign: bool,
    ctx: &ReadCtx,
) -> Result<(Value, usize), CalcError> {
    let mut p = pos;
    let mut neg = false;
    if allow_sign && chars.get(p) == Some(&'-') {
        neg = true;
        p += 1;
    }
    if let Some(b) = prefix_at(chars, p, ctx)? {
        let (val, p2) = read_based(chars, p + 2, &b, true, false, ctx)?;
        if neg {
            return Ok((val.negate()?, p2));
        }
        return Ok((val, p2));
    }
    read_based(chars, pos, &ctx.base, false, allow_sign, ctx)
}

/// Parses the standalone textual form of a continued fraction,
/// `a0.~a1~a2~...`, into its term sequence. Terms are decimal; `x.~0`
/// yields the single-element sequence `[x]`.
pub fn parse_continued_fraction(text: &str) -> Result<Vec<BigInt>, CalcError> {
    let chars: Vec<char> = text.trim().chars().collect();
    let base = BaseSystem::decimal();
    let mut p = 0;
    let mut neg = false;
    if chars.first() == Some(&'-') {
        neg = true;
        p += 1;
    }
    let (run, p2) = digit_run(&chars, p, &base);
    if run.is_empty() {
        return Err(CalcError::InvalidNumber(text.to_string()));
    }
    p = p2;
    let mut a0 = base.to_integer(&run)?;
    if neg {
        a0 = -a0;
    }
    if chars.get(p) != Some(&'.') || chars.get(p + 1) != Some(&'~') {
        return Err(CalcError::InvalidNumber(text.to_string()));
    }
    p += 2;

    let mut seq = vec![a0];
    loop {
        let (run, p2) = digit_run(&chars, p, &base);
        if run.is_empty() {
            return Err(CalcError::InvalidNumber(text.to_string()));
        }
        seq.push(base.to_integer(&run)?);
        p = p2;
        match chars.get(p) {
            Some('~') => p += 1,
            None => break,
            _ => return Err(CalcError::InvalidNumber(text.to_string())),
        }
    }

    // a lone zero term marks a plain integer
    if seq.len() == 2 && seq[1].is_zero() {
        seq.pop();
        return Ok(seq);
    }
    for t in seq.iter().skip(1) {
        if !t.is_positive() {
            return Err(CalcError::InvalidNumber(text.to_string()));
        }
    }
    Ok(seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ReadCtx {
        ReadCtx {
            base: BaseSystem::decimal(),
            type_aware: true,
            integer_range_append: true,
        }
    }

    fn read(text: &str) -> Result<(Value, usize), CalcError> {
        let chars: Vec<char> = text.chars().collect();
        read_literal(&chars, 0, true, &ctx())
    }

    fn rat(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    fn expect_ratio(text: &str, n: i64, d: i64) {
        match read(text) {
            Ok((Value::Ratio(r, ..), used)) => {
                assert_eq!(r, rat(n, d), "{}", text);
                assert_eq!(used, text.chars().count(), "{}", text);
            }
            other => panic!("{}: expected a ratio, got {:?}", text, other),
        }
    }

    fn expect_interval(text: &str, lo: (i64, i64), hi: (i64, i64)) {
        match read(text) {
            Ok((Value::Interval(i), used)) => {
                assert_eq!(i.lo(), &rat(lo.0, lo.1), "{}", text);
                assert_eq!(i.hi(), &rat(hi.0, hi.1), "{}", text);
                assert_eq!(used, text.chars().count(), "{}", text);
            }
            other => panic!("{}: expected an interval, got {:?}", text, other),
        }
    }

    #[test]
    fn test_plain_forms() {
        assert_eq!(read("42"), Ok((Value::Int(BigInt::from(42)), 2)));
        assert_eq!(read("-42+1"), Ok((Value::Int(BigInt::from(-42)), 3)));
        expect_ratio("3/4", 3, 4);
        expect_ratio("2..1/3", 7, 3);
        expect_ratio("1.25", 5, 4);
        expect_ratio("-1.25", -5, 4);
        assert!(matches!(read("3/0"), Err(CalcError::DividedByZero(..))));
    }

    #[test]
    fn test_explicit_fraction_flag() {
        match read("4/1") {
            Ok((Value::Ratio(r, explicit), ..)) => {
                assert_eq!(r, rat(4, 1));
                assert!(explicit);
            }
            other => panic!("expected a ratio, got {:?}", other),
        }
    }

    #[test]
    fn test_repeating() {
        expect_ratio("0.#3", 1, 3);
        expect_ratio("0.#6", 2, 3);
        expect_ratio("1.23#45", 679, 550);
        expect_ratio("0.1#0", 1, 10);
        assert!(read("0.#").is_err());
    }

    #[test]
    fn test_scientific() {
        expect_ratio("5E-3", 1, 200);
        expect_ratio("5E3", 5000, 1);
        expect_ratio("1.5E2", 150, 1);
        expect_ratio("2_^3", 2000, 1);
        assert!(matches!(
            read("1/2E3"),
            Err(CalcError::UnsupportedComposition(..))
        ));
        assert!(matches!(
            read("2..1/3E2"),
            Err(CalcError::UnsupportedComposition(..))
        ));
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(read("0xFF"), Ok((Value::Int(BigInt::from(255)), 4)));
        assert_eq!(read("0b101"), Ok((Value::Int(BigInt::from(5)), 5)));
        assert_eq!(read("0o17"), Ok((Value::Int(BigInt::from(15)), 4)));
        assert_eq!(read("0d42"), Ok((Value::Int(BigInt::from(42)), 4)));
        assert_eq!(read("-0xFF"), Ok((Value::Int(BigInt::from(-255)), 5)));
        expect_ratio("0x1.8", 3, 2);
        expect_ratio("0xf/2", 15, 2);
        assert!(matches!(read("0q12"), Err(CalcError::InvalidPrefix('q'))));
        // hex digits in a hex fraction, scientific with the base marker
        expect_ratio("0x2_^2", 512, 1);
    }

    #[test]
    fn test_intervals() {
        expect_interval("1:2", (1, 1), (2, 1));
        expect_interval("2:1", (1, 1), (2, 1));
        expect_interval("-1:2", (-1, 1), (2, 1));
        expect_interval("1:-2", (-2, 1), (1, 1));
        expect_interval("1/2:3/4", (1, 2), (3, 4));
        expect_interval("1:2E3", (1, 1), (2000, 1));
        expect_interval("0x1:0x5", (1, 1), (5, 1));
        match read("1:2") {
            Ok((Value::Interval(i), ..)) => assert!(i.explicit),
            other => panic!("expected an interval, got {:?}", other),
        }
    }

    #[test]
    fn test_continued_fractions() {
        expect_ratio("3.~7~15~1~292", 103993, 33102);
        expect_ratio("3.~7", 22, 7);
        assert_eq!(read("5.~0"), Ok((Value::Ratio(rat(5, 1), false), 4)));
        expect_interval("3.~7:4.~2", (22, 7), (9, 2));
        assert!(read("3.~7~~2").is_err());
        assert!(read("3.~7~").is_err());
        assert!(read("3.~7~0").is_err());
    }

    #[test]
    fn test_uncertainty_range() {
        expect_interval("1.23[56,67]", (3089, 2500), (12367, 10000));
        expect_interval("1.23[67:56]", (3089, 2500), (12367, 10000));
        expect_interval("12[3,7]", (123, 1), (127, 1));
        assert!(matches!(
            read("12[16]"),
            Err(CalcError::DeprecatedBracketBase(..))
        ));
    }

    #[test]
    fn test_uncertainty_symmetric_and_relative() {
        // 1.23 +- 5 at the next decimal place
        expect_interval("1.23[+-5]", (49, 40), (247, 200));
        expect_interval("1.23[-+5]", (49, 40), (247, 200));
        expect_interval("1.23[+5,-6]", (1224, 1000), (1235, 1000));
        expect_interval("1.23[+5]", (123, 100), (247, 200));
        expect_interval("78[+-1]", (779, 10), (781, 10));
        // trailing scientific scales both ends
        expect_interval("1.23[+-5]E2", (245, 2), (247, 2));
    }

    #[test]
    fn test_uncertainty_rejects() {
        assert!(matches!(
            read("1.2E3[+-1]"),
            Err(CalcError::UnsupportedComposition(..))
        ));
        assert!(matches!(
            read("0x12[+-1]"),
            Err(CalcError::UnsupportedComposition(..))
        ));
        assert!(read("1.23[+5,+6]").is_err());
        assert!(read("1.23[56").is_err());
    }

    #[test]
    fn test_compat_decimal_becomes_interval() {
        let chars: Vec<char> = "1.5".chars().collect();
        let compat = ReadCtx {
            base: BaseSystem::decimal(),
            type_aware: false,
            integer_range_append: true,
        };
        match read_literal(&chars, 0, true, &compat) {
            Ok((Value::Interval(i), ..)) => {
                assert_eq!(i.lo(), &rat(29, 20));
                assert_eq!(i.hi(), &rat(31, 20));
            }
            other => panic!("expected an interval, got {:?}", other),
        }
    }

    #[test]
    fn test_other_input_base() {
        let ternary = ReadCtx {
            base: BaseSystem::from_base(3).unwrap(),
            type_aware: true,
            integer_range_append: true,
        };
        let chars: Vec<char> = "12".chars().collect();
        assert_eq!(
            read_literal(&chars, 0, true, &ternary),
            Ok((Value::Int(BigInt::from(5)), 2))
        );
        let chars: Vec<char> = "0x1f".chars().collect();
        assert_eq!(
            read_literal(&chars, 0, true, &ternary),
            Ok((Value::Int(BigInt::from(31)), 4))
        );
    }

    #[test]
    fn test_parse_continued_fraction() {
        let seq = parse_continued_fraction("3.~7~15~1~292").unwrap();
        let expected: Vec<BigInt> = [3, 7, 15, 1, 292].iter().map(|n| BigInt::from(*n)).collect();
        assert_eq!(seq, expected);
        assert_eq!(
            parse_continued_fraction("-3.~7").unwrap(),
            vec![BigInt::from(-3), BigInt::from(7)]
        );
        assert_eq!(parse_continued_fraction("5.~0").unwrap(), vec![BigInt::from(5)]);
        assert!(parse_continued_fraction("5").is_err());
        assert!(parse_continued_fraction("5.~3~0").is_err());
    }
}
