// Numeric coefficients for symbolic expressions
// Exact rationals, floats for decimal literals, and a tracked approximation for exact
// values that left the i64 range.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

pub(crate) fn gcd(mut a: i64, mut b: i64) -> i64 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

pub(crate) fn lcm(a: i64, b: i64) -> Option<i64> {
    if a == 0 || b == 0 {
        return Some(0);
    }
    (a / gcd(a, b)).checked_mul(b).map(i64::abs)
}

/// Split `n` into `(outside, inside)` with `n == outside^2 * inside` and `inside` square-free.
pub(crate) fn split_square(n: i64) -> (i64, i64) {
    let mut inside = n;
    let mut outside = 1i64;
    let mut f = 2i64;
    while f.saturating_mul(f) <= inside && f < 1_000_000 {
        let sq = f * f;
        while inside % sq == 0 {
            inside /= sq;
            outside *= f;
        }
        f += 1;
    }
    (outside, inside)
}

/// Exact integer q-th root, if one exists.
pub(crate) fn exact_root(n: i64, q: u32) -> Option<i64> {
    if n < 0 {
        if q % 2 == 0 {
            return None;
        }
        return exact_root(-n, q).map(|r| -r);
    }
    let guess = (n as f64).powf(1.0 / q as f64).round() as i64;
    for candidate in guess.saturating_sub(1)..=guess.saturating_add(1) {
        if candidate >= 0 && candidate.checked_pow(q) == Some(n) {
            return Some(candidate);
        }
    }
    None
}

/// Positive divisors of `n`, ascending. Gives up above 10^12.
pub(crate) fn divisors(n: i64) -> Option<Vec<i64>> {
    let n = n.checked_abs()?;
    if n == 0 || n > 1_000_000_000_000 {
        return None;
    }
    let mut small = Vec::new();
    let mut large = Vec::new();
    let mut d = 1i64;
    while d * d <= n {
        if n % d == 0 {
            small.push(d);
            if d != n / d {
                large.push(n / d);
            }
        }
        d += 1;
    }
    large.reverse();
    small.extend(large);
    Some(small)
}

/// A numeric coefficient.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    /// Exact rational (numerator, denominator).
    /// Invariant: denominator > 0, gcd(num, den) == 1
    Rational(i64, i64),
    /// Floating-point value (decimal literals and results computed from them)
    Float(f64),
    /// Approximation of an exact value that no longer fits in i64. Arithmetic with an
    /// overflowed operand stays overflowed, so the loss is visible in the final result.
    Overflow(f64),
}

impl Number {
    pub fn int(n: i64) -> Self {
        Number::Rational(n, 1)
    }

    /// Reduced rational. A zero denominator has no rational value and yields `None`.
    pub fn rational(num: i64, den: i64) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let (num, den) = if den < 0 {
            (num.checked_neg()?, den.checked_neg()?)
        } else {
            (num, den)
        };
        let g = gcd(num, den).max(1);
        Some(Number::Rational(num / g, den / g))
    }

    pub fn float(f: f64) -> Self {
        Number::Float(f)
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Rational(n, _) => *n == 0,
            Number::Float(f) => *f == 0.0,
            Number::Overflow(_) => false,
        }
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Number::Rational(1, 1))
    }

    pub fn is_neg_one(&self) -> bool {
        matches!(self, Number::Rational(-1, 1))
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Number::Rational(n, _) => *n < 0,
            Number::Float(f) | Number::Overflow(f) => *f < 0.0,
        }
    }

    pub fn is_positive(&self) -> bool {
        match self {
            Number::Rational(n, _) => *n > 0,
            Number::Float(f) | Number::Overflow(f) => *f > 0.0,
        }
    }

    /// True for any inexact value, overflowed ones included.
    pub fn is_float(&self) -> bool {
        matches!(self, Number::Float(_) | Number::Overflow(_))
    }

    pub fn is_overflow(&self) -> bool {
        matches!(self, Number::Overflow(_))
    }

    /// Inexact value `v` computed from `self` and `other`: overflowed if either was.
    pub(crate) fn approx_with(&self, other: &Number, v: f64) -> Number {
        if self.is_overflow() || other.is_overflow() {
            Number::Overflow(v)
        } else {
            Number::Float(v)
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Number::Rational(_, 1))
    }

    /// Integer value of an exact integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Number::Rational(n, 1) => Some(*n),
            _ => None,
        }
    }

    pub fn numer(&self) -> Option<i64> {
        match self {
            Number::Rational(n, _) => Some(*n),
            Number::Float(_) | Number::Overflow(_) => None,
        }
    }

    pub fn denom(&self) -> Option<i64> {
        match self {
            Number::Rational(_, d) => Some(*d),
            Number::Float(_) | Number::Overflow(_) => None,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Number::Rational(n, d) => *n as f64 / *d as f64,
            Number::Float(f) | Number::Overflow(f) => *f,
        }
    }

    pub fn abs(&self) -> Self {
        match self {
            Number::Rational(n, d) => match n.checked_abs() {
                Some(a) => Number::Rational(a, *d),
                None => Number::Overflow(self.to_f64().abs()),
            },
            Number::Float(f) => Number::Float(f.abs()),
            Number::Overflow(f) => Number::Overflow(f.abs()),
        }
    }

    /// Multiplicative inverse; `None` for zero.
    pub fn recip(&self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }
        match self {
            Number::Rational(n, d) => Number::rational(*d, *n).or(Some(Number::Overflow(*d as f64 / *n as f64))),
            Number::Float(f) => Some(Number::Float(1.0 / f)),
            Number::Overflow(f) => Some(Number::Overflow(1.0 / f)),
        }
    }

    /// Quotient; `None` when dividing by zero.
    pub fn checked_div(&self, rhs: &Number) -> Option<Self> {
        rhs.recip().map(|r| *self * r)
    }

    /// Integer power; `None` for zero raised to a negative power.
    pub fn pow_int(&self, exp: i64) -> Option<Self> {
        if exp == 0 {
            return Some(Number::int(1));
        }
        if exp < 0 {
            return self.pow_int(exp.checked_neg()?)?.recip();
        }
        match self {
            Number::Rational(n, d) => {
                let e = u32::try_from(exp).ok();
                match e.and_then(|e| Some((n.checked_pow(e)?, d.checked_pow(e)?))) {
                    Some((nn, dd)) => Some(Number::Rational(nn, dd)),
                    None => Some(Number::Overflow(self.to_f64().powf(exp as f64))),
                }
            }
            Number::Float(f) => Some(Number::Float(f.powf(exp as f64))),
            Number::Overflow(f) => Some(Number::Overflow(f.powf(exp as f64))),
        }
    }

    /// Lift an integral float back to an exact integer.
    pub fn from_f64(f: f64) -> Self {
        if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
            Number::int(f as i64)
        } else {
            Number::Float(f)
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Rational(n1, d1), Number::Rational(n2, d2)) => n1 == n2 && d1 == d2,
            (Number::Float(a), Number::Float(b)) | (Number::Overflow(a), Number::Overflow(b)) => {
                a == b || (a.is_nan() && b.is_nan())
            }
            _ => false,
        }
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Number::Rational(n1, d1), Number::Rational(n2, d2)) => {
                (*n1 as i128 * *d2 as i128).cmp(&(*n2 as i128 * *d1 as i128))
            }
            _ => self
                .to_f64()
                .total_cmp(&other.to_f64())
                .then_with(|| self.rank().cmp(&other.rank())),
        }
    }
}

impl Number {
    fn rank(&self) -> u8 {
        match self {
            Number::Rational(..) => 0,
            Number::Float(_) => 1,
            Number::Overflow(_) => 2,
        }
    }
}

impl std::hash::Hash for Number {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Number::Rational(n, d) => {
                state.write_u8(0);
                n.hash(state);
                d.hash(state);
            }
            Number::Float(f) => {
                state.write_u8(1);
                f.to_bits().hash(state);
            }
            Number::Overflow(f) => {
                state.write_u8(2);
                f.to_bits().hash(state);
            }
        }
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::int(n)
    }
}

impl Neg for Number {
    type Output = Number;

    fn neg(self) -> Number {
        match self {
            Number::Rational(n, d) => match n.checked_neg() {
                Some(m) => Number::Rational(m, d),
                None => Number::Overflow(-(n as f64) / d as f64),
            },
            Number::Float(f) => Number::Float(-f),
            Number::Overflow(f) => Number::Overflow(-f),
        }
    }
}

impl Add for Number {
    type Output = Number;

    fn add(self, rhs: Number) -> Number {
        if let (Number::Rational(n1, d1), Number::Rational(n2, d2)) = (self, rhs) {
            let exact = (|| {
                let num = n1.checked_mul(d2)?.checked_add(n2.checked_mul(d1)?)?;
                Number::rational(num, d1.checked_mul(d2)?)
            })();
            return exact.unwrap_or(Number::Overflow(self.to_f64() + rhs.to_f64()));
        }
        self.approx_with(&rhs, self.to_f64() + rhs.to_f64())
    }
}

impl Sub for Number {
    type Output = Number;

    fn sub(self, rhs: Number) -> Number {
        self + (-rhs)
    }
}

impl Mul for Number {
    type Output = Number;

    fn mul(self, rhs: Number) -> Number {
        if let (Number::Rational(n1, d1), Number::Rational(n2, d2)) = (self, rhs) {
            // Cross-reduce first to keep the intermediates small
            let g1 = gcd(n1, d2).max(1);
            let g2 = gcd(n2, d1).max(1);
            let exact = (|| {
                let num = (n1 / g1).checked_mul(n2 / g2)?;
                let den = (d1 / g2).checked_mul(d2 / g1)?;
                Number::rational(num, den)
            })();
            return exact.unwrap_or(Number::Overflow(self.to_f64() * rhs.to_f64()));
        }
        self.approx_with(&rhs, self.to_f64() * rhs.to_f64())
    }
}

/// Render a float with at most 15 significant digits, always showing a decimal point.
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    let rounded: f64 = format!("{:.14e}", f).parse().unwrap_or(f);
    let s = format!("{}", rounded);
    if s.contains('.') || s.contains('e') {
        s
    } else {
        format!("{}.0", s)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Rational(n, 1) => write!(f, "{}", n),
            Number::Rational(n, d) => write!(f, "{}/{}", n, d),
            Number::Float(v) | Number::Overflow(v) => write!(f, "{}", format_float(*v)),
        }
    }
}
