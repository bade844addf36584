use std::collections::HashMap;
use std::sync::RwLock;

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use lazy_static::lazy_static;

use crate::errors::*;

/// Characters with a meaning in the expression grammar. None of them can
/// ever be a digit, no matter what alphabet a base system declares.
pub const RESERVED_SYMBOLS: [char; 14] =
    ['+', '-', '*', '/', '^', '!', '(', ')', '[', ']', ':', '.', '#', '~'];

const STD_DIGITS: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SANE_BASE_LIMIT: usize = 1000;

/// An immutable positional numeral system: an ordered alphabet of distinct
/// digit characters. The base equals the alphabet length.
///
/// A system knows how to convert a digit run to a big integer and back:
///
/// ```
/// use ratcalc_lib::base::BaseSystem;
/// use num_bigint::BigInt;
///
/// let hex = BaseSystem::hexadecimal();
/// assert_eq!(hex.to_integer("ff"), Ok(BigInt::from(255)));
/// assert_eq!(hex.from_integer(&BigInt::from(255)), "ff");
/// ```
#[derive(Clone)]
pub struct BaseSystem {
    name: String,
    digits: Vec<char>,
    values: HashMap<char, u32>,
    // true when no letter appears in both cases, so lookups may fold case
    single_case: bool,
    warnings: Vec<String>,
}

impl PartialEq for BaseSystem {
    fn eq(&self, other: &BaseSystem) -> bool {
        self.digits == other.digits
    }
}

impl std::fmt::Debug for BaseSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "BaseSystem({}, base {})", self.name, self.digits.len())
    }
}

impl BaseSystem {
    /// Builds a numeral system from an ordered list of digit characters.
    ///
    /// Fails when the alphabet is shorter than two digits, contains
    /// duplicates, or uses any reserved grammar symbol. The error message
    /// lists every offending character at once.
    pub fn new(name: &str, digit_chars: &str) -> Result<BaseSystem, CalcError> {
        let digits: Vec<char> = digit_chars.chars().collect();
        if digits.len() < 2 {
            return Err(CalcError::InvalidBaseSystem(format!(
                "'{}' must have at least 2 digits",
                name
            )));
        }

        let mut offenders = String::new();
        for d in &digits {
            if RESERVED_SYMBOLS.contains(d) {
                offenders.push(*d);
            }
        }
        if !offenders.is_empty() {
            return Err(CalcError::InvalidBaseSystem(format!(
                "'{}' uses reserved symbols '{}'",
                name, offenders
            )));
        }

        let mut values: HashMap<char, u32> = HashMap::new();
        for (i, d) in digits.iter().enumerate() {
            if values.insert(*d, i as u32).is_some() {
                return Err(CalcError::InvalidBaseSystem(format!(
                    "'{}' has duplicate digit '{}'",
                    name, d
                )));
            }
        }

        let single_case = !digits
            .iter()
            .any(|d| d.is_lowercase() && values.contains_key(&d.to_ascii_uppercase()));

        let mut warnings = Vec::new();
        if digits.len() > SANE_BASE_LIMIT {
            warnings.push(format!("base {} is unusually large", digits.len()));
        }
        if char_runs(&digits) > 5 {
            warnings.push(format!("digit set of '{}' is highly non-contiguous", name));
        }

        Ok(BaseSystem {
            name: name.to_string(),
            digits,
            values,
            single_case,
            warnings,
        })
    }

    /// Standard system of the given size over digits `0-9a-zA-Z`
    pub fn from_base(base: usize) -> Result<BaseSystem, CalcError> {
        if base < 2 || base > 62 {
            return Err(CalcError::InvalidBaseSystem(format!(
                "standard alphabet covers bases 2 through 62, not {}",
                base
            )));
        }
        let digits: String = STD_DIGITS.chars().take(base).collect();
        BaseSystem::new(&format!("base {}", base), &digits)
    }

    pub fn binary() -> BaseSystem {
        BaseSystem::new("binary", "01").unwrap()
    }

    pub fn octal() -> BaseSystem {
        BaseSystem::new("octal", "01234567").unwrap()
    }

    pub fn decimal() -> BaseSystem {
        BaseSystem::new("decimal", "0123456789").unwrap()
    }

    pub fn hexadecimal() -> BaseSystem {
        BaseSystem::new("hexadecimal", "0123456789abcdef").unwrap()
    }

    pub fn base36() -> BaseSystem {
        BaseSystem::from_base(36).unwrap()
    }

    pub fn base60() -> BaseSystem {
        BaseSystem::from_base(60).unwrap()
    }

    pub fn base62() -> BaseSystem {
        BaseSystem::from_base(62).unwrap()
    }

    /// Roman numeral letters as a positional base-7 alphabet
    pub fn roman() -> BaseSystem {
        BaseSystem::new("roman", "IVXLCDM").unwrap()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> usize {
        self.digits.len()
    }

    /// The base as a big integer, for digit accumulation
    pub fn radix(&self) -> BigInt {
        BigInt::from(self.digits.len())
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Value of a single digit character. When the alphabet uses only one
    /// letter case, the lookup accepts the other case too, so `0xFF` and
    /// `0xff` read the same.
    pub fn digit_value(&self, c: char) -> Option<u32> {
        if let Some(v) = self.values.get(&c) {
            return Some(*v);
        }
        if self.single_case && c.is_alphabetic() {
            let flipped = if c.is_lowercase() {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            return self.values.get(&flipped).copied();
        }
        None
    }

    pub fn is_digit(&self, c: char) -> bool {
        self.digit_value(c).is_some()
    }

    /// Checks that a string is a well-formed digit run, with an optional
    /// leading minus. Used by the literal decoders to peek ahead.
    pub fn is_valid(&self, s: &str) -> bool {
        let body = s.strip_prefix('-').unwrap_or(s);
        !body.is_empty() && body.chars().all(|c| self.is_digit(c))
    }

    /// Decodes a signed digit run into a big integer
    pub fn to_integer(&self, s: &str) -> Result<BigInt, CalcError> {
        let (neg, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if body.is_empty() {
            return Err(CalcError::InvalidNumber(s.to_string()));
        }
        let mut acc = BigInt::zero();
        for c in body.chars() {
            let d = match self.digit_value(c) {
                Some(d) => d,
                None => return Err(CalcError::InvalidBaseDigit(c, self.name.clone())),
            };
            acc = acc * self.radix() + BigInt::from(d);
        }
        if neg {
            acc = -acc;
        }
        Ok(acc)
    }

    /// Renders a big integer as a digit run in this system
    pub fn from_integer(&self, z: &BigInt) -> String {
        if z.is_zero() {
            return self.digits[0].to_string();
        }
        let neg = z < &BigInt::zero();
        let mut left = if neg { -z } else { z.clone() };
        let mut out = Vec::new();
        while !left.is_zero() {
            let d = (&left % self.radix()).to_usize().unwrap_or(0);
            out.push(self.digits[d]);
            left /= self.radix();
        }
        if neg {
            out.push('-');
        }
        out.iter().rev().collect()
    }

    /// Shrinks the alphabet to one case per letter, keeping the first
    /// occurrence: an alphabet listing `0-9a-fA-F` becomes plain
    /// hexadecimal. Digit values of the kept characters are renumbered in
    /// order.
    pub fn case_insensitive(&self) -> Result<BaseSystem, CalcError> {
        let mut kept = String::new();
        for d in &self.digits {
            if d.is_alphabetic() {
                let flipped = if d.is_lowercase() {
                    d.to_ascii_uppercase()
                } else {
                    d.to_ascii_lowercase()
                };
                if kept.contains(flipped) {
                    continue;
                }
            }
            kept.push(*d);
        }
        BaseSystem::new(&format!("{} (case-insensitive)", self.name), &kept)
    }
}

// number of contiguous codepoint runs in the alphabet
fn char_runs(digits: &[char]) -> usize {
    let mut runs = 0usize;
    let mut prev: Option<u32> = None;
    for d in digits {
        let cp = *d as u32;
        match prev {
            Some(p) if cp == p + 1 => {}
            _ => runs += 1,
        }
        prev = Some(cp);
    }
    runs
}

lazy_static! {
    static ref PREFIXES: RwLock<HashMap<char, BaseSystem>> = {
        let mut m = HashMap::new();
        m.insert('x', BaseSystem::hexadecimal());
        m.insert('b', BaseSystem::binary());
        m.insert('o', BaseSystem::octal());
        RwLock::new(m)
    };
}

/// Binds a single-letter literal prefix (as in `0x1f`) to a base system.
/// `e` is reserved for scientific notation and `d` means "the caller's
/// input base"; neither can be rebound.
pub fn register_prefix(letter: char, base: BaseSystem) -> Result<(), CalcError> {
    let letter = letter.to_ascii_lowercase();
    if !letter.is_ascii_alphabetic() {
        return Err(CalcError::InvalidBaseSystem(format!(
            "prefix '{}' must be a Latin letter",
            letter
        )));
    }
    if letter == 'e' {
        return Err(CalcError::InvalidBaseSystem(
            "prefix 'e' is reserved for scientific notation".to_string(),
        ));
    }
    if letter == 'd' {
        return Err(CalcError::InvalidBaseSystem(
            "prefix 'd' always means the current input base".to_string(),
        ));
    }
    let mut map = PREFIXES.write().unwrap_or_else(|p| p.into_inner());
    map.insert(letter, base);
    Ok(())
}

/// Removes a previously registered prefix letter
pub fn unregister_prefix(letter: char) {
    let mut map = PREFIXES.write().unwrap_or_else(|p| p.into_inner());
    map.remove(&letter.to_ascii_lowercase());
}

/// Looks up the base bound to a prefix letter
pub fn prefix_base(letter: char) -> Option<BaseSystem> {
    let map = PREFIXES.read().unwrap_or_else(|p| p.into_inner());
    map.get(&letter.to_ascii_lowercase()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct() {
        let b = BaseSystem::new("test", "0123").unwrap();
        assert_eq!(b.base(), 4);
        assert_eq!(b.name(), "test");

        let e = BaseSystem::new("bad", "01+2-");
        assert_eq!(
            e,
            Err(CalcError::InvalidBaseSystem("'bad' uses reserved symbols '+-'".to_string()))
        );
        let e = BaseSystem::new("dup", "011");
        assert_eq!(
            e,
            Err(CalcError::InvalidBaseSystem("'dup' has duplicate digit '1'".to_string()))
        );
        let e = BaseSystem::new("short", "0");
        assert!(e.is_err());
    }

    #[test]
    fn test_round_trip() {
        let cases: [(BaseSystem, i64); 5] = [
            (BaseSystem::binary(), 1066),
            (BaseSystem::octal(), -255),
            (BaseSystem::decimal(), 1234567890),
            (BaseSystem::hexadecimal(), 48879),
            (BaseSystem::base62(), 916132832),
        ];
        for (b, n) in cases.iter() {
            let z = BigInt::from(*n);
            assert_eq!(b.to_integer(&b.from_integer(&z)), Ok(z.clone()), "{}", b.name());
        }
        assert_eq!(BaseSystem::decimal().from_integer(&BigInt::zero()), "0");
    }

    #[test]
    fn test_digit_values() {
        let hex = BaseSystem::hexadecimal();
        assert_eq!(hex.to_integer("ff"), Ok(BigInt::from(255)));
        // single-case alphabet folds the other case
        assert_eq!(hex.to_integer("FF"), Ok(BigInt::from(255)));
        assert_eq!(hex.to_integer("-a0"), Ok(BigInt::from(-160)));
        assert_eq!(
            hex.to_integer("fg"),
            Err(CalcError::InvalidBaseDigit('g', "hexadecimal".to_string()))
        );
        assert_eq!(hex.to_integer(""), Err(CalcError::InvalidNumber("".to_string())));

        // base 62 distinguishes cases, no folding
        let b62 = BaseSystem::base62();
        assert_eq!(b62.to_integer("A"), Ok(BigInt::from(36)));
        assert_eq!(b62.to_integer("a"), Ok(BigInt::from(10)));
    }

    #[test]
    fn test_is_valid() {
        let dec = BaseSystem::decimal();
        assert!(dec.is_valid("042"));
        assert!(dec.is_valid("-7"));
        assert!(!dec.is_valid(""));
        assert!(!dec.is_valid("-"));
        assert!(!dec.is_valid("1f"));
    }

    #[test]
    fn test_case_insensitive_view() {
        let wide = BaseSystem::new("hexish", "0123456789abcdefABCDEF").unwrap();
        let folded = wide.case_insensitive().unwrap();
        assert_eq!(folded.base(), 16);
        assert_eq!(folded.to_integer("ff"), Ok(BigInt::from(255)));
        // both cases already distinct digits: the shrink halves the base
        assert_eq!(BaseSystem::base62().case_insensitive().unwrap().base(), 36);
    }

    #[test]
    fn test_presets() {
        assert_eq!(BaseSystem::roman().base(), 7);
        assert_eq!(BaseSystem::base60().base(), 60);
        assert_eq!(BaseSystem::from_base(36).unwrap().to_integer("z"), Ok(BigInt::from(35)));
        assert!(BaseSystem::from_base(1).is_err());
        assert!(BaseSystem::from_base(63).is_err());
    }

    #[test]
    fn test_prefix_registry() {
        assert_eq!(prefix_base('x'), Some(BaseSystem::hexadecimal()));
        assert_eq!(prefix_base('X'), Some(BaseSystem::hexadecimal()));
        assert_eq!(prefix_base('q'), None);

        assert!(register_prefix('e', BaseSystem::decimal()).is_err());
        assert!(register_prefix('d', BaseSystem::decimal()).is_err());
        assert!(register_prefix('1', BaseSystem::decimal()).is_err());

        register_prefix('v', BaseSystem::roman()).unwrap();
        assert_eq!(prefix_base('v'), Some(BaseSystem::roman()));
        unregister_prefix('v');
        assert_eq!(prefix_base('v'), None);
    }

    #[test]
    fn test_warnings() {
        let scattered = BaseSystem::new("scattered", "02468acegikmoqsuwy").unwrap();
        assert!(!scattered.warnings().is_empty());
        assert!(BaseSystem::hexadecimal().warnings().is_empty());
    }
}
