//! Recursive-descent expression parser.
//!
//! The grammar cannot be tokenised up front: the meaning of `E`, `.`,
//! `:`, `/` and the bracket forms depends on the characters around them
//! and on the configured input base, so the parser walks the text
//! directly and hands every literal to the decoders in [`crate::literal`].
//!
//! Two whitespace cues are preserved as sentinel characters before the
//! blanks are stripped: a space before `E` turns it into the
//! multiplicative operator (scaling a whole interval instead of one
//! endpoint), and a space after `/` turns it into division instead of a
//! fraction separator.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive};

use crate::base::BaseSystem;
use crate::errors::*;
use crate::funcs::{self, Precision, DEFAULT_PRECISION_EXP};
use crate::interval::{IntervalResult, RationalInterval};
use crate::literal::{self, ReadCtx};
use crate::value::{promote, CalcResult, Value};

const SPACED_E: char = '\u{1}';
const DIV_OP: char = '\u{2}';
const MAX_DEPTH: usize = 256;

/// Knobs for a single parse call
#[derive(Clone)]
pub struct ParseOptions {
    /// Collapse results to the narrowest faithful variant (on by default);
    /// when off, every result is a rational interval
    pub type_aware: bool,
    /// Base system for digit runs without a `0<letter>` prefix
    pub input_base: BaseSystem,
    /// Precision exponent for transcendentals: error <= base^precision
    pub precision: i32,
    /// Allow `12[3,7]` range brackets on bases without a fractional part
    pub integer_range_append: bool,
}

impl Default for ParseOptions {
    fn default() -> ParseOptions {
        ParseOptions {
            type_aware: true,
            input_base: BaseSystem::decimal(),
            precision: DEFAULT_PRECISION_EXP,
            integer_range_append: true,
        }
    }
}

/// Evaluates an expression under the given options
pub fn parse(expr: &str, opts: &ParseOptions) -> CalcResult {
    let chars = preprocess(expr);
    if chars.is_empty() {
        return Err(CalcError::EmptyInput);
    }
    let mut p = Parser {
        chars,
        pos: 0,
        opts,
        ctx: ReadCtx {
            base: opts.input_base.clone(),
            type_aware: opts.type_aware,
            integer_range_append: opts.integer_range_append,
        },
        depth: 0,
    };
    let v = p.parse_expr()?;
    if p.pos != p.chars.len() {
        return Err(CalcError::Syntax(p.rest()));
    }
    if p.opts.type_aware {
        Ok(promote(v))
    } else {
        Ok(v.into_point_interval())
    }
}

/// Evaluates an expression with the default options
pub fn parse_default(expr: &str) -> CalcResult {
    parse(expr, &ParseOptions::default())
}

fn preprocess(expr: &str) -> Vec<char> {
    expr.replace(" E", &SPACED_E.to_string())
        .replace("/ ", &DIV_OP.to_string())
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

const FUNC_NAMES: [&str; 9] = [
    "ARCSIN", "ARCCOS", "ARCTAN", "SIN", "COS", "TAN", "EXP", "LN", "LOG",
];

struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    opts: &'a ParseOptions,
    ctx: ReadCtx,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, off: usize) -> Option<char> {
        self.chars.get(self.pos + off).copied()
    }

    fn rest(&self) -> String {
        self.chars.iter().skip(self.pos).take(12).collect()
    }

    fn enter(&mut self) -> Result<(), CalcError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CalcError::Syntax("expression too deeply nested".to_string()));
        }
        Ok(())
    }

    fn precision(&self) -> Precision {
        Precision::new(self.opts.input_base.base() as u32, self.opts.precision)
    }

    // promotion runs after every operator step in type-aware mode
    fn step(&self, r: CalcResult) -> CalcResult {
        let v = r?;
        if self.opts.type_aware {
            Ok(promote(v))
        } else {
            Ok(v)
        }
    }

    fn parse_expr(&mut self) -> CalcResult {
        self.enter()?;
        let mut acc = self.parse_term()?;
        loop {
            match self.peek() {
                Some('+') => {
                    self.pos += 1;
                    let rhs = self.parse_term()?;
                    acc = self.step(acc.addition(rhs))?;
                }
                Some('-') => {
                    self.pos += 1;
                    let rhs = self.parse_term()?;
                    acc = self.step(acc.subtract(rhs))?;
                }
                _ => break,
            }
        }
        self.depth -= 1;
        Ok(acc)
    }

    fn parse_term(&mut self) -> CalcResult {
        let mut acc = self.parse_factor()?;
        loop {
            match self.peek() {
                Some('*') if self.peek_at(1) != Some('*') => {
                    self.pos += 1;
                    let rhs = self.parse_factor()?;
                    acc = self.step(acc.multiply(rhs))?;
                }
                Some('/') | Some(DIV_OP) => {
                    self.pos += 1;
                    let rhs = self.parse_factor()?;
                    acc = self.step(acc.divide(rhs))?;
                }
                Some(SPACED_E) => {
                    if self.opts.input_base.base() != 10 {
                        return Err(CalcError::Syntax("E".to_string()));
                    }
                    self.pos += 1;
                    let rhs = self.parse_factor()?;
                    let scale = spaced_e_scale(rhs)?;
                    acc = self.step(acc.multiply(scale))?;
                }
                _ => break,
            }
        }
        Ok(acc)
    }

    fn parse_factor(&mut self) -> CalcResult {
        self.enter()?;
        let v = if self.peek() == Some('-') && !self.minus_starts_literal() {
            self.pos += 1;
            let inner = self.parse_factor()?;
            self.step(inner.negate())?
        } else {
            self.parse_postfixed()?
        };
        self.depth -= 1;
        Ok(v)
    }

    // a minus belongs to the literal when the digits after it run into an
    // interval colon or an uncertainty bracket
    fn minus_starts_literal(&self) -> bool {
        let mut p = self.pos + 1;
        while let Some(c) = self.chars.get(p) {
            if c.is_alphanumeric() || matches!(c, '.' | '#' | '~' | '/') {
                p += 1;
            } else {
                break;
            }
        }
        if p == self.pos + 1 {
            return false;
        }
        matches!(self.chars.get(p), Some(':') | Some('['))
    }

    fn parse_postfixed(&mut self) -> CalcResult {
        let mut v = self.parse_atom()?;
        loop {
            match self.peek() {
                Some('!') => {
                    if self.peek_at(1) == Some('!') {
                        self.pos += 2;
                        v = self.step(v.double_factorial())?;
                    } else {
                        self.pos += 1;
                        v = self.step(v.factorial())?;
                    }
                }
                Some('^') => {
                    self.pos += 1;
                    let e = self.parse_factor()?;
                    v = self.step(v.pow(e, self.precision()))?;
                }
                Some('*') if self.peek_at(1) == Some('*') => {
                    self.pos += 2;
                    let e = self.parse_factor()?;
                    v = self.step(v.mpow(e, self.precision()))?;
                }
                _ => break,
            }
        }
        Ok(v)
    }

    fn parse_atom(&mut self) -> CalcResult {
        match self.peek() {
            None => Err(CalcError::Syntax("end of expression".to_string())),
            Some('(') => {
                self.pos += 1;
                let v = self.parse_expr()?;
                if self.peek() != Some(')') {
                    return Err(CalcError::Syntax(self.rest()));
                }
                self.pos += 1;
                // tight scientific binds to the group before any factorial
                if let Some((scale, p2)) =
                    literal::try_sci(&self.chars, self.pos, &self.opts.input_base)?
                {
                    self.pos = p2;
                    return self.step(v.multiply(Value::Ratio(scale, false)));
                }
                Ok(v)
            }
            Some(c) if c == '-' || c == '.' || self.ctx.base.is_digit(c) || c == '0' => {
                let (v, p2) = literal::read_literal(&self.chars, self.pos, c == '-', &self.ctx)?;
                self.pos = p2;
                Ok(v)
            }
            Some(c) if c.is_ascii_alphabetic() => self.parse_call(),
            Some(..) => Err(CalcError::Syntax(self.rest())),
        }
    }

    // a named constant or function call, never a digit run (those were
    // taken by the literal branch already)
    fn parse_call(&mut self) -> CalcResult {
        let mut p = self.pos;
        let mut name = String::new();
        while let Some(c) = self.chars.get(p) {
            if c.is_ascii_alphabetic() {
                name.push(c.to_ascii_uppercase());
                p += 1;
            } else {
                break;
            }
        }
        self.pos = p;

        let mut prec = self.precision();
        if self.peek() == Some('[') {
            prec = Precision::new(prec.radix, self.parse_precision_bracket()?);
        }

        match name.as_str() {
            "PI" => Ok(Value::Interval(funcs::pi(prec).marked(true, true))),
            "E" => Ok(Value::Interval(funcs::e(prec).marked(true, true))),
            _ if FUNC_NAMES.contains(&name.as_str()) => {
                if self.peek() != Some('(') {
                    return Err(CalcError::Syntax(self.rest()));
                }
                self.pos += 1;
                let arg = self.parse_expr()?;
                let second = if name == "LOG" && self.peek() == Some(',') {
                    self.pos += 1;
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                if self.peek() != Some(')') {
                    return Err(CalcError::Syntax(self.rest()));
                }
                self.pos += 1;
                let res = eval_function(&name, arg, second, prec)?;
                Ok(Value::Interval(res.marked(true, true)))
            }
            _ => Err(CalcError::Syntax(name)),
        }
    }

    // `[k]` or `[-k]` right after a function name overrides the ambient
    // precision exponent
    fn parse_precision_bracket(&mut self) -> Result<i32, CalcError> {
        self.pos += 1;
        let mut neg = false;
        match self.peek() {
            Some('+') => self.pos += 1,
            Some('-') => {
                neg = true;
                self.pos += 1;
            }
            _ => {}
        }
        let (run, p2) = literal::digit_run(&self.chars, self.pos, &self.opts.input_base);
        if run.is_empty() || self.chars.get(p2) != Some(&']') {
            return Err(CalcError::Syntax(self.rest()));
        }
        self.pos = p2 + 1;
        let k = self
            .opts
            .input_base
            .to_integer(&run)?
            .to_i32()
            .ok_or(CalcError::Syntax(run))?;
        Ok(if neg { -k } else { k })
    }
}

// the rhs of a spaced E: an integer exponent scaling by a decimal power
fn spaced_e_scale(rhs: Value) -> Result<Value, CalcError> {
    let k = match &rhs {
        Value::Int(k) => k.clone(),
        Value::Ratio(r, ..) if r.is_integer() => r.to_integer(),
        _ => {
            return Err(CalcError::UnsupportedComposition(
                "a fractional exponent after E".to_string(),
            ))
        }
    };
    let ten = BigRational::from_integer(BigInt::from(10));
    let scale = if k.is_negative() {
        BigRational::from_integer(BigInt::from(1))
            / crate::interval::pow_rational(&ten, &-&k)
    } else {
        crate::interval::pow_rational(&ten, &k)
    };
    Ok(Value::Ratio(scale, false))
}

fn endpointwise<F>(f: F, iv: &RationalInterval) -> IntervalResult
where
    F: Fn(&BigRational) -> IntervalResult,
{
    let lo = f(iv.lo())?;
    if iv.is_point() {
        return Ok(lo);
    }
    let hi = f(iv.hi())?;
    Ok(funcs::hull(&lo, &hi))
}

fn eval_function(
    name: &str,
    arg: Value,
    second: Option<Value>,
    prec: Precision,
) -> IntervalResult {
    let iv = arg.into_interval();
    match name {
        "SIN" => endpointwise(|r| Ok(funcs::sin(r, prec)), &iv),
        "COS" => endpointwise(|r| Ok(funcs::cos(r, prec)), &iv),
        "TAN" => endpointwise(|r| funcs::tan(r, prec), &iv),
        "ARCSIN" => endpointwise(|r| funcs::arcsin(r, prec), &iv),
        "ARCCOS" => endpointwise(|r| funcs::arccos(r, prec), &iv),
        "ARCTAN" => endpointwise(|r| Ok(funcs::arctan(r, prec)), &iv),
        "EXP" => endpointwise(|r| funcs::exp(r, prec), &iv),
        "LN" => endpointwise(|r| funcs::ln(r, prec), &iv),
        "LOG" => {
            let b = match second {
                Some(v) => {
                    let biv = v.into_interval();
                    if !biv.is_point() {
                        return Err(CalcError::Domain(
                            "log".to_string(),
                            "an interval base".to_string(),
                        ));
                    }
                    biv.lo().clone()
                }
                None => BigRational::from_integer(BigInt::from(10)),
            };
            endpointwise(|r| funcs::log(r, &b, prec), &iv)
        }
        _ => Err(CalcError::Syntax(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base;

    fn int(n: i64) -> Value {
        Value::Int(BigInt::from(n))
    }

    fn ratio(n: i64, d: i64) -> Value {
        Value::Ratio(BigRational::new(BigInt::from(n), BigInt::from(d)), false)
    }

    fn rat(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    fn ival(lo: (i64, i64), hi: (i64, i64)) -> Value {
        Value::Interval(RationalInterval::new(rat(lo.0, lo.1), rat(hi.0, hi.1)))
    }

    #[test]
    fn test_expr() {
        let cases: [(&str, Value); 16] = [
            ("2+3", int(5)),
            ("2 + 3 * 4", int(14)),
            ("(2 + 3) * 4", int(20)),
            ("3/4 + 1/4", int(1)),
            ("2..1/3", ratio(7, 3)),
            ("0.#3 + 0.#6", int(1)),
            ("0xFF - 0b101", int(250)),
            ("3.~7~15~1~292", ratio(103993, 33102)),
            ("5E-3", ratio(1, 200)),
            ("10 - 2^3", int(2)),
            ("-2^2", int(-4)),
            ("2^-2", ratio(1, 4)),
            ("2^3^2", int(512)),
            ("5!", int(120)),
            ("3!!*2", int(6)),
            ("2E3^2", int(4000000)),
        ];
        for (expr, expected) in cases.iter() {
            assert_eq!(parse_default(expr).as_ref(), Ok(expected), "{}", expr);
        }
    }

    #[test]
    fn test_intervals() {
        assert_eq!(
            parse_default("1.23[56,67]"),
            Ok(ival((3089, 2500), (12367, 10000)))
        );
        assert_eq!(parse_default("1:2 + 1:2"), Ok(ival((2, 1), (4, 1))));
        assert_eq!(parse_default("-1:2"), Ok(ival((-1, 1), (2, 1))));
        // spaced E scales both endpoints, tight E only the near one
        assert_eq!(parse_default("1:2 E 3"), Ok(ival((1000, 1), (2000, 1))));
        assert_eq!(parse_default("1:2E3"), Ok(ival((1, 1), (2000, 1))));
    }

    #[test]
    fn test_explicit_forms_stay_put() {
        // a point interval written with ':' survives promotion
        match parse_default("2:2") {
            Ok(Value::Interval(i)) => assert!(i.is_point()),
            other => panic!("expected an interval, got {:?}", other),
        }
        match parse_default("4/1") {
            Ok(Value::Ratio(r, explicit)) => {
                assert_eq!(r, rat(4, 1));
                assert!(explicit);
            }
            other => panic!("expected a ratio, got {:?}", other),
        }
        // multiplicative power keeps interval form even for a point
        match parse_default("2**3") {
            Ok(Value::Interval(i)) => {
                assert!(i.is_point());
                assert_eq!(i.lo(), &rat(8, 1));
                assert!(i.keep);
            }
            other => panic!("expected an interval, got {:?}", other),
        }
    }

    #[test]
    fn test_division_forms() {
        // tight slash is a fraction literal, spaced slash is division
        assert_eq!(parse_default("1/2"), Ok(ratio(1, 2)));
        assert_eq!(parse_default("1/ 2"), Ok(ratio(1, 2)));
        assert_eq!(parse_default("6/ 2"), Ok(int(3)));
        match parse_default("6/2") {
            Ok(Value::Ratio(r, explicit)) => {
                assert_eq!(r, rat(3, 1));
                assert!(explicit);
            }
            other => panic!("expected a ratio, got {:?}", other),
        }
        assert_eq!(parse_default("(1+2)/3"), Ok(int(1)));
    }

    #[test]
    fn test_tight_e_after_group() {
        assert_eq!(parse_default("(2)E3"), Ok(int(2000)));
        assert_eq!(parse_default("(1)E1!"), Ok(int(3628800)));
        assert_eq!(parse_default("(3)_^2"), Ok(int(300)));
    }

    #[test]
    fn test_other_base() {
        let opts = ParseOptions {
            input_base: BaseSystem::from_base(3).unwrap(),
            ..ParseOptions::default()
        };
        assert_eq!(parse("12", &opts), Ok(int(5)));
        assert_eq!(parse("12 + 1", &opts), Ok(int(6)));
        assert_eq!(parse("0x10", &opts), Ok(int(16)));

        base::register_prefix('t', BaseSystem::from_base(3).unwrap()).unwrap();
        assert_eq!(parse("0t12", &opts), Ok(int(5)));
        base::unregister_prefix('t');
    }

    #[test]
    fn test_functions() {
        let v = parse_default("PI").unwrap();
        match v {
            Value::Interval(i) => {
                assert!(i.lo() > &rat(314159, 100000));
                assert!(i.hi() < &rat(314160, 100000));
                assert!(i.explicit && i.keep);
            }
            other => panic!("expected an interval, got {:?}", other),
        }

        match parse_default("SIN(0)") {
            Ok(Value::Interval(i)) => {
                assert!(i.lo() <= &rat(0, 1) && &rat(0, 1) <= i.hi());
            }
            other => panic!("expected an interval, got {:?}", other),
        }

        match parse_default("LOG(100)") {
            Ok(Value::Interval(i)) => {
                assert!(i.lo() <= &rat(2, 1) && &rat(2, 1) <= i.hi());
            }
            other => panic!("expected an interval, got {:?}", other),
        }

        match parse_default("LOG[-8](8,2)") {
            Ok(Value::Interval(i)) => {
                assert!(i.lo() <= &rat(3, 1) && &rat(3, 1) <= i.hi());
                assert!(i.width() <= rat(2, 100000000));
            }
            other => panic!("expected an interval, got {:?}", other),
        }

        // case does not matter, and E alone is the constant
        assert!(parse_default("sin(1)").is_ok());
        match parse_default("E") {
            Ok(Value::Interval(i)) => {
                assert!(i.lo() > &rat(2718280, 1000000));
                assert!(i.hi() < &rat(2718283, 1000000));
            }
            other => panic!("expected an interval, got {:?}", other),
        }
    }

    #[test]
    fn test_compat_mode() {
        let opts = ParseOptions {
            type_aware: false,
            ..ParseOptions::default()
        };
        // a plain decimal reads as half-a-unit uncertainty
        assert_eq!(parse("1.5", &opts), Ok(ival((29, 20), (31, 20))));
        // scalars come back as point intervals
        assert_eq!(parse("2+3", &opts), Ok(ival((5, 1), (5, 1))));
        assert_eq!(parse("3/4 + 1/4", &opts), Ok(ival((1, 1), (1, 1))));
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_default(""), Err(CalcError::EmptyInput));
        assert_eq!(parse_default("   "), Err(CalcError::EmptyInput));
        assert!(matches!(parse_default("2+"), Err(CalcError::Syntax(..))));
        assert!(matches!(parse_default("(2"), Err(CalcError::Syntax(..))));
        assert!(matches!(parse_default("2)"), Err(CalcError::Syntax(..))));
        assert_eq!(parse_default("0^0"), Err(CalcError::ZeroToZero));
        assert!(matches!(
            parse_default("(0-3)!"),
            Err(CalcError::NegativeFactorial(..))
        ));
        assert!(matches!(
            parse_default("1/ 0"),
            Err(CalcError::DividedByZero(..))
        ));
        assert!(matches!(
            parse_default("1/(1:1 - 1:1)"),
            Err(CalcError::DividedByZero(..))
        ));
        assert!(matches!(
            parse_default("1/(0:1 - 0:1)"),
            Err(CalcError::IntervalDividedByZero(..))
        ));
        assert!(matches!(
            parse_default("LN(0-1)"),
            Err(CalcError::Domain(..))
        ));
        assert!(matches!(parse_default("2**0"), Err(CalcError::Domain(..))));
        assert!(matches!(
            parse_default("0q12"),
            Err(CalcError::InvalidPrefix('q'))
        ));
    }

    #[test]
    fn test_depth_guard() {
        let mut wild = String::new();
        for _ in 0..400 {
            wild.push('(');
        }
        wild.push('1');
        for _ in 0..400 {
            wild.push(')');
        }
        assert!(matches!(parse_default(&wild), Err(CalcError::Syntax(..))));
    }

    #[test]
    fn test_promotion_agreement() {
        // sums that land on integers collapse, others keep their form
        assert_eq!(parse_default("1/3 + 2/3"), Ok(int(1)));
        assert_eq!(parse_default("1/3 + 1/3"), Ok(ratio(2, 3)));
        assert_eq!(parse_default("1.5 + 0.5"), Ok(int(2)));
        assert_eq!(parse_default("0.5 * 4"), Ok(int(2)));
    }
}
