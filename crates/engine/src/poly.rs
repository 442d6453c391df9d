// Univariate polynomials with exact rational coefficients
// Used by factor, cancel and solve. Coefficients are stored low degree first
// and trailing zeros are always trimmed.

use std::cmp::Ordering;

use crate::error::{SymbolicError, SymbolicResult};
use crate::expr::Expr;
use crate::number::{divisors, gcd, lcm, Number};

/// Integer points, nearest to zero first, sampled when searching for a factor.
const SAMPLE_RADIUS: i64 = 16;

/// Candidate factors tried before factoring one polynomial is given up.
const MAX_FACTOR_CANDIDATES: u64 = 1_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct Poly {
    coeffs: Vec<Number>,
}

/// `content * prod(factor^multiplicity)`; every factor is a primitive integer
/// polynomial with positive leading coefficient.
#[derive(Debug, Clone, PartialEq)]
pub struct Factorization {
    pub content: Number,
    pub factors: Vec<(Poly, usize)>,
}

impl Poly {
    pub fn new(mut coeffs: Vec<Number>) -> Self {
        while coeffs.last().map(|c| c.is_zero()).unwrap_or(false) {
            coeffs.pop();
        }
        Poly { coeffs }
    }

    pub fn zero() -> Self {
        Poly { coeffs: Vec::new() }
    }

    pub fn constant(c: Number) -> Self {
        Poly::new(vec![c])
    }

    /// The polynomial `x`.
    pub fn x() -> Self {
        Poly::new(vec![Number::int(0), Number::int(1)])
    }

    pub fn from_ints(coeffs: &[i64]) -> Self {
        Poly::new(coeffs.iter().map(|&c| Number::int(c)).collect())
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Degree; the zero polynomial reports 0.
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    pub fn coeff(&self, k: usize) -> Number {
        self.coeffs.get(k).copied().unwrap_or(Number::int(0))
    }

    pub fn coeffs(&self) -> &[Number] {
        &self.coeffs
    }

    pub fn leading(&self) -> Number {
        self.coeffs.last().copied().unwrap_or(Number::int(0))
    }

    pub fn has_float(&self) -> bool {
        self.coeffs.iter().any(Number::is_float)
    }

    pub fn add(&self, other: &Poly) -> Poly {
        let n = self.coeffs.len().max(other.coeffs.len());
        Poly::new((0..n).map(|k| self.coeff(k) + other.coeff(k)).collect())
    }

    pub fn sub(&self, other: &Poly) -> Poly {
        self.add(&other.scale(Number::int(-1)))
    }

    pub fn scale(&self, c: Number) -> Poly {
        Poly::new(self.coeffs.iter().map(|&a| a * c).collect())
    }

    pub fn mul(&self, other: &Poly) -> Poly {
        if self.is_zero() || other.is_zero() {
            return Poly::zero();
        }
        let mut out = vec![Number::int(0); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            for (j, &b) in other.coeffs.iter().enumerate() {
                out[i + j] = out[i + j] + a * b;
            }
        }
        Poly::new(out)
    }

    pub fn pow(&self, mut k: u32) -> Poly {
        let mut acc = Poly::constant(Number::int(1));
        let mut base = self.clone();
        while k > 0 {
            if k & 1 == 1 {
                acc = acc.mul(&base);
            }
            k >>= 1;
            if k > 0 {
                base = base.mul(&base);
            }
        }
        acc
    }

    /// Order by degree, then by coefficients from the leading one down.
    pub fn graded_cmp(&self, other: &Poly) -> Ordering {
        self.degree()
            .cmp(&other.degree())
            .then_with(|| self.coeffs.iter().rev().cmp(other.coeffs.iter().rev()))
    }

    fn is_integral(&self) -> bool {
        self.coeffs.iter().all(Number::is_integer)
    }

    /// Long division over the rationals. `None` when dividing by zero.
    pub fn div_rem(&self, divisor: &Poly) -> Option<(Poly, Poly)> {
        if divisor.is_zero() {
            return None;
        }
        if self.coeffs.len() < divisor.coeffs.len() {
            return Some((Poly::zero(), self.clone()));
        }
        let dd = divisor.degree();
        let lead = divisor.leading();
        let mut rem = self.coeffs.clone();
        let mut quot = vec![Number::int(0); self.coeffs.len() - dd];

        for i in (0..quot.len()).rev() {
            let c = rem[i + dd].checked_div(&lead)?;
            if c.is_zero() {
                continue;
            }
            quot[i] = c;
            for (j, &d) in divisor.coeffs.iter().enumerate() {
                rem[i + j] = rem[i + j] - c * d;
            }
            // exact cancellation of the leading slot even when floats are involved
            rem[i + dd] = Number::int(0);
        }

        Some((Poly::new(quot), Poly::new(rem)))
    }

    /// Monic greatest common divisor. Inexact coefficients give `1`.
    pub fn gcd(&self, other: &Poly) -> Poly {
        if self.has_float() || other.has_float() {
            return Poly::constant(Number::int(1));
        }
        let mut a = self.clone();
        let mut b = other.clone();
        while !b.is_zero() {
            let r = match a.div_rem(&b) {
                Some((_, r)) => r,
                None => return Poly::constant(Number::int(1)),
            };
            a = b;
            b = r;
        }
        if a.is_zero() {
            return a;
        }
        match a.leading().recip() {
            Some(inv) => a.scale(inv),
            None => Poly::constant(Number::int(1)),
        }
    }

    pub fn derivative(&self) -> Poly {
        Poly::new(
            self.coeffs
                .iter()
                .enumerate()
                .skip(1)
                .map(|(k, &c)| c * Number::int(k as i64))
                .collect(),
        )
    }

    /// Horner evaluation.
    pub fn eval(&self, x: Number) -> Number {
        self.coeffs.iter().rev().fold(Number::int(0), |acc, &c| acc * x + c)
    }

    /// Split into `(content, primitive)` where the primitive part has coprime integer
    /// coefficients and a positive leading coefficient. `None` on float coefficients
    /// or overflow.
    pub fn primitive(&self) -> Option<(Number, Poly)> {
        if self.is_zero() || self.has_float() {
            return None;
        }
        let mut den = 1i64;
        for c in &self.coeffs {
            den = lcm(den, c.denom()?)?;
        }
        let mut ints = Vec::with_capacity(self.coeffs.len());
        for c in &self.coeffs {
            let scaled = *c * Number::int(den);
            ints.push(scaled.as_integer()?);
        }
        let mut g = ints.iter().fold(0i64, |acc, &v| gcd(acc, v));
        if g == 0 {
            return None;
        }
        if ints.last().copied().unwrap_or(0) < 0 {
            g = -g;
        }
        let prim = Poly::new(ints.iter().map(|&v| Number::int(v / g)).collect());
        let content = Number::rational(g, den)?;
        Some((content, prim))
    }

    /// Distinct rational roots, ascending. Empty for float or oversized coefficients.
    pub fn rational_roots(&self) -> Vec<Number> {
        let (_, prim) = match self.primitive() {
            Some(p) => p,
            None => return Vec::new(),
        };
        if prim.degree() == 0 {
            return Vec::new();
        }

        let mut roots = Vec::new();
        let mut p = prim;
        if p.coeff(0).is_zero() {
            roots.push(Number::int(0));
            let shift = p.coeffs.iter().take_while(|c| c.is_zero()).count();
            p = Poly::new(p.coeffs[shift..].to_vec());
        }
        if p.degree() == 0 {
            return roots;
        }

        let a0 = p.coeff(0).as_integer().unwrap_or(0);
        let an = p.leading().as_integer().unwrap_or(0);
        let (nums, dens) = match (divisors(a0), divisors(an)) {
            (Some(n), Some(d)) => (n, d),
            _ => return roots,
        };

        for &num in &nums {
            for &den in &dens {
                for sign in [1, -1] {
                    let candidate = match Number::rational(sign * num, den) {
                        Some(c) => c,
                        None => continue,
                    };
                    if !roots.contains(&candidate) && p.eval(candidate).is_zero() && !candidate.is_float() {
                        roots.push(candidate);
                    }
                }
            }
        }
        roots.sort();
        roots
    }

    /// Factor over the rationals into irreducible integer polynomials with
    /// multiplicity. Linear factors come from the rational roots; what remains is
    /// split by Kronecker's method. Fails when a coefficient overflows or the
    /// factor search grows past its budget.
    pub fn factor_rational(&self) -> SymbolicResult<Factorization> {
        if self.is_zero() {
            return Ok(Factorization { content: Number::int(0), factors: Vec::new() });
        }
        if self.has_float() {
            return Err(SymbolicError::Unsupported("factoring needs exact coefficients".to_string()));
        }
        let (content, mut rest) = self.primitive().ok_or(SymbolicError::Overflow)?;
        let mut factors: Vec<(Poly, usize)> = Vec::new();

        let shift = rest.coeffs.iter().take_while(|c| c.is_zero()).count();
        if shift > 0 {
            factors.push((Poly::x(), shift));
            rest = Poly::new(rest.coeffs[shift..].to_vec());
        }

        for root in rest.rational_roots() {
            let (num, den) = root.numer().zip(root.denom()).ok_or(SymbolicError::Overflow)?;
            let linear = Poly::new(vec![Number::int(-num), Number::int(den)]);
            let mut multiplicity = 0;
            while let Some((quot, rem)) = rest.div_rem(&linear) {
                if !rem.is_zero() {
                    break;
                }
                rest = quot;
                multiplicity += 1;
            }
            if multiplicity > 0 {
                factors.push((linear, multiplicity));
            }
        }

        if rest.degree() >= 1 {
            for f in split_irreducible(&rest)? {
                match factors.iter_mut().find(|(g, _)| *g == f) {
                    Some(entry) => entry.1 += 1,
                    None => factors.push((f, 1)),
                }
            }
        }

        factors.sort_by(|a, b| a.0.graded_cmp(&b.0));
        Ok(Factorization { content, factors })
    }

    /// Polynomial view of `e` in `var`. `None` if `e` is not polynomial in `var`
    /// or has non-numeric coefficients.
    pub fn from_expr(e: &Expr, var: &str) -> Option<Poly> {
        match e {
            Expr::Num(n) => Some(Poly::constant(*n)),
            Expr::Sym(s) if s == var => Some(Poly::x()),
            Expr::Add(ts) => {
                let mut acc = Poly::zero();
                for t in ts {
                    acc = acc.add(&Poly::from_expr(t, var)?);
                }
                Some(acc)
            }
            Expr::Mul(fs) => {
                let mut acc = Poly::constant(Number::int(1));
                for f in fs {
                    acc = acc.mul(&Poly::from_expr(f, var)?);
                }
                Some(acc)
            }
            Expr::Pow(b, exp) => {
                let k = exp.as_number()?.as_integer()?;
                if !(0..=64).contains(&k) {
                    return None;
                }
                Some(Poly::from_expr(b, var)?.pow(k as u32))
            }
            _ => None,
        }
    }

    pub fn to_expr(&self, var: &str) -> Expr {
        let x = Expr::sym(var);
        Expr::add(
            self.coeffs
                .iter()
                .enumerate()
                .filter(|(_, c)| !c.is_zero())
                .map(|(k, &c)| Expr::mul(vec![Expr::Num(c), Expr::pow(x.clone(), Expr::int(k as i64))]))
                .collect(),
        )
    }
}

/// Irreducible factors, repeats included, of a primitive polynomial with positive
/// leading coefficient and no rational roots.
fn split_irreducible(p: &Poly) -> SymbolicResult<Vec<Poly>> {
    let mut pending = vec![p.clone()];
    let mut out = Vec::new();
    while let Some(f) = pending.pop() {
        match find_factor(&f)? {
            Some(g) => {
                let quot = match f.div_rem(&g) {
                    Some((q, r)) if r.is_zero() => q,
                    _ => return Err(SymbolicError::Unsupported("inexact polynomial division".to_string())),
                };
                let (_, quot) = quot.primitive().ok_or(SymbolicError::Overflow)?;
                pending.push(quot);
                pending.push(g);
            }
            None => out.push(f),
        }
    }
    Ok(out)
}

/// A proper factor of `f`, or `None` when `f` is irreducible.
///
/// Kronecker's method: a factor `g` of degree `d` is fixed by its values at `d + 1`
/// integer points, and each value must divide the value of `f` there. Points are
/// chosen where `f` has the fewest divisors, and the sign of `g` is fixed by taking
/// its first value positive. `f` has no rational roots, so linear factors never occur
/// and degrees 2 and 3 are already irreducible.
fn find_factor(f: &Poly) -> SymbolicResult<Option<Poly>> {
    let n = f.degree();
    if n < 4 {
        return Ok(None);
    }
    let lead = f.leading().as_integer().ok_or(SymbolicError::Overflow)?;

    let points = std::iter::once(0).chain((1..=SAMPLE_RADIUS).flat_map(|m| [m, -m]));
    let mut samples: Vec<(Number, Vec<i64>)> = Vec::new();
    for a in points {
        let value = match f.eval(Number::int(a)).as_integer() {
            Some(v) if v != 0 => v,
            _ => continue,
        };
        if let Some(divs) = divisors(value) {
            samples.push((Number::int(a), divs));
        }
    }
    samples.sort_by_key(|(_, divs)| divs.len());

    let max_degree = n / 2;
    if samples.len() < max_degree + 1 {
        return Err(SymbolicError::Unsupported("polynomial too large to factor".to_string()));
    }
    let mut budget = 0u64;
    for d in 2..=max_degree {
        budget = budget.saturating_add(candidate_count(&samples[..=d]));
    }
    if budget > MAX_FACTOR_CANDIDATES {
        log::debug!("factor search of degree {} needs {} candidates", n, budget);
        return Err(SymbolicError::Unsupported("polynomial too large to factor".to_string()));
    }

    for d in 2..=max_degree {
        if let Some(g) = factor_of_degree(f, lead, &samples[..=d]) {
            return Ok(Some(g));
        }
    }
    Ok(None)
}

fn candidate_count(samples: &[(Number, Vec<i64>)]) -> u64 {
    samples.iter().enumerate().fold(1u64, |acc, (i, (_, divs))| {
        let choices = if i == 0 { divs.len() } else { 2 * divs.len() };
        acc.saturating_mul(choices as u64)
    })
}

/// Try every assignment of divisor values at the sample points.
fn factor_of_degree(f: &Poly, lead: i64, samples: &[(Number, Vec<i64>)]) -> Option<Poly> {
    let d = samples.len() - 1;
    let xs: Vec<Number> = samples.iter().map(|(a, _)| *a).collect();
    let choices: Vec<Vec<i64>> = samples
        .iter()
        .enumerate()
        .map(|(i, (_, divs))| {
            if i == 0 {
                divs.clone()
            } else {
                divs.iter().flat_map(|&v| [v, -v]).collect()
            }
        })
        .collect();

    let mut idx = vec![0usize; samples.len()];
    loop {
        let ys: Vec<Number> = idx.iter().zip(&choices).map(|(&i, c)| Number::int(c[i])).collect();
        if let Some(g) = interpolate(&xs, &ys, lead) {
            if g.degree() == d && g.is_integral() {
                if let Some((quot, rem)) = f.div_rem(&g) {
                    if rem.is_zero() && quot.is_integral() {
                        return g.primitive().map(|(_, g)| g);
                    }
                }
            }
        }

        // advance the odometer
        let mut k = 0;
        loop {
            if k == idx.len() {
                return None;
            }
            idx[k] += 1;
            if idx[k] < choices[k].len() {
                break;
            }
            idx[k] = 0;
            k += 1;
        }
    }
}

/// Newton interpolation through `(xs[i], ys[i])`. Gives up early when the leading
/// coefficient is not an integer dividing `lead`.
fn interpolate(xs: &[Number], ys: &[Number], lead: i64) -> Option<Poly> {
    let n = xs.len();
    let mut coef = ys.to_vec();
    for j in 1..n {
        for i in (j..n).rev() {
            coef[i] = (coef[i] - coef[i - 1]).checked_div(&(xs[i] - xs[i - j]))?;
        }
    }
    let top = coef[n - 1].as_integer()?;
    if top == 0 || lead % top != 0 {
        return None;
    }

    let mut p = Poly::constant(coef[n - 1]);
    for i in (0..n - 1).rev() {
        p = p.mul(&Poly::new(vec![-xs[i], Number::int(1)])).add(&Poly::constant(coef[i]));
    }
    Some(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn poly(text: &str) -> Poly {
        Poly::from_expr(&parse(text).unwrap(), "x").unwrap()
    }

    #[test]
    fn test_from_expr_expands_products() {
        let p = poly("(x+1)^2");
        assert_eq!(p, Poly::from_ints(&[1, 2, 1]));
        assert!(Poly::from_expr(&parse("sin(x)").unwrap(), "x").is_none());
        assert!(Poly::from_expr(&parse("x*y").unwrap(), "x").is_none());
    }

    #[test]
    fn test_div_rem() {
        let (q, r) = poly("x^2 - 1").div_rem(&poly("x - 1")).unwrap();
        assert_eq!(q, poly("x + 1"));
        assert!(r.is_zero());
        let (_, r) = poly("x^2 + 1").div_rem(&poly("x")).unwrap();
        assert_eq!(r, Poly::from_ints(&[1]));
    }

    #[test]
    fn test_gcd_is_monic() {
        let g = poly("2*x^2 - 2").gcd(&poly("3*x - 3"));
        assert_eq!(g, poly("x - 1"));
    }

    #[test]
    fn test_primitive() {
        let (c, p) = poly("x^2/2 - 1/2").primitive().unwrap();
        assert_eq!(c, Number::Rational(1, 2));
        assert_eq!(p, Poly::from_ints(&[-1, 0, 1]));
        let (c, p) = poly("-2*x + 4").primitive().unwrap();
        assert_eq!(c, Number::int(-2));
        assert_eq!(p, Poly::from_ints(&[-2, 1]));
    }

    #[test]
    fn test_rational_roots() {
        let roots = poly("2*x^3 - 3*x^2 - 3*x + 2").rational_roots();
        assert_eq!(roots, vec![Number::int(-1), Number::Rational(1, 2), Number::int(2)]);
        assert!(poly("x^2 + 1").rational_roots().is_empty());
    }

    #[test]
    fn test_factor_with_multiplicity() {
        let f = poly("x^3 - 2*x^2 + x").factor_rational().unwrap();
        assert_eq!(f.content, Number::int(1));
        assert_eq!(f.factors, vec![(Poly::from_ints(&[-1, 1]), 2), (Poly::x(), 1)]);
    }

    #[test]
    fn test_factor_biquadratic() {
        let f = poly("x^4 - 5*x^2 + 6").factor_rational().unwrap();
        assert_eq!(
            f.factors,
            vec![(Poly::from_ints(&[-3, 0, 1]), 1), (Poly::from_ints(&[-2, 0, 1]), 1)]
        );
    }

    #[test]
    fn test_factor_products_of_quadratics() {
        let f = poly("x^4 + 4").factor_rational().unwrap();
        assert_eq!(
            f.factors,
            vec![(Poly::from_ints(&[2, -2, 1]), 1), (Poly::from_ints(&[2, 2, 1]), 1)]
        );

        let f = poly("x^6 - 1").factor_rational().unwrap();
        assert_eq!(
            f.factors,
            vec![
                (Poly::from_ints(&[-1, 1]), 1),
                (Poly::from_ints(&[1, 1]), 1),
                (Poly::from_ints(&[1, -1, 1]), 1),
                (Poly::from_ints(&[1, 1, 1]), 1),
            ]
        );

        let f = poly("x^5 + x + 1").factor_rational().unwrap();
        assert_eq!(
            f.factors,
            vec![(Poly::from_ints(&[1, 1, 1]), 1), (Poly::from_ints(&[1, 0, -1, 1]), 1)]
        );
    }

    #[test]
    fn test_factor_repeated_quadratic() {
        let f = poly("(x^2 + 1)^3").factor_rational().unwrap();
        assert_eq!(f.factors, vec![(Poly::from_ints(&[1, 0, 1]), 3)]);
    }

    #[test]
    fn test_factor_irreducible_quartic() {
        let f = poly("x^4 + x + 1").factor_rational().unwrap();
        assert_eq!(f.factors, vec![(Poly::from_ints(&[1, 1, 0, 0, 1]), 1)]);
    }

    #[test]
    fn test_factor_order_ignores_variable_name() {
        let f = poly("x^2 - 1").factor_rational().unwrap();
        let in_t: Vec<Expr> = f.factors.iter().map(|(p, _)| p.to_expr("t")).collect();
        assert_eq!(in_t, vec![parse("t - 1").unwrap(), parse("t + 1").unwrap()]);
    }

    #[test]
    fn test_pow_by_squaring() {
        assert_eq!(poly("x + 1").pow(5), poly("(x + 1)^5"));
        assert_eq!(poly("x + 1").pow(0), Poly::constant(Number::int(1)));
    }

    #[test]
    fn test_derivative_and_eval() {
        let p = poly("x^3 + 2*x");
        assert_eq!(p.derivative(), poly("3*x^2 + 2"));
        assert_eq!(p.eval(Number::int(2)), Number::int(12));
    }
}
