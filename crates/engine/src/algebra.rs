// Algebraic rewrites: expand, numerator/denominator split, cancel, factor, simplify

use std::collections::BTreeSet;

use crate::error::{SymbolicError, SymbolicResult};
use crate::expr::{Expr, Func};
use crate::number::Number;
use crate::poly::{Factorization, Poly};

/// Largest integer power expanded term by term.
const MAX_EXPAND_POWER: i64 = 32;

/// Largest degree a univariate power is expanded to through polynomial arithmetic.
const MAX_EXPAND_DEGREE: usize = 4096;

pub fn free_symbols(e: &Expr) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect_symbols(e, &mut out);
    out
}

fn collect_symbols(e: &Expr, out: &mut BTreeSet<String>) {
    match e {
        Expr::Sym(s) => {
            out.insert(s.clone());
        }
        Expr::Num(_) | Expr::Const(_) => {}
        Expr::Add(xs) | Expr::Mul(xs) => xs.iter().for_each(|x| collect_symbols(x, out)),
        Expr::Pow(b, e) => {
            collect_symbols(b, out);
            collect_symbols(e, out);
        }
        Expr::Func(_, a) => collect_symbols(a, out),
    }
}

fn terms(e: &Expr) -> Vec<Expr> {
    match e {
        Expr::Add(ts) => ts.clone(),
        other => vec![other.clone()],
    }
}

/// Product of two expanded expressions, distributed.
fn distribute(a: &Expr, b: &Expr) -> Expr {
    let ta = terms(a);
    let tb = terms(b);
    let mut out = Vec::with_capacity(ta.len() * tb.len());
    for x in &ta {
        for y in &tb {
            out.push(Expr::mul(vec![x.clone(), y.clone()]));
        }
    }
    Expr::add(out)
}

/// Fully distribute products and positive integer powers of sums.
pub fn expand(e: &Expr) -> Expr {
    match e {
        Expr::Num(_) | Expr::Const(_) | Expr::Sym(_) => e.clone(),
        Expr::Add(ts) => Expr::add(ts.iter().map(expand).collect()),
        Expr::Mul(fs) => fs.iter().map(expand).fold(Expr::one(), |acc, f| distribute(&acc, &f)),
        Expr::Pow(b, exp) => {
            let base = expand(b);
            let exp = expand(exp);
            let k = exp.as_number().and_then(Number::as_integer);
            match (k, &base) {
                (Some(k), Expr::Add(_)) if (2..=MAX_EXPAND_POWER).contains(&k) => {
                    let mut acc = base.clone();
                    for _ in 1..k {
                        acc = distribute(&acc, &base);
                    }
                    acc
                }
                (Some(k), Expr::Add(_)) if k > MAX_EXPAND_POWER => {
                    polynomial_power(&base, k).unwrap_or_else(|| Expr::pow(base, exp))
                }
                (Some(k), Expr::Add(_)) if k <= -2 => match k.checked_neg() {
                    Some(positive) => Expr::pow(expand(&Expr::pow(base.clone(), Expr::int(positive))), Expr::int(-1)),
                    None => Expr::pow(base, exp),
                },
                _ => Expr::pow(base, exp),
            }
        }
        Expr::Func(f, a) => Expr::func(*f, expand(a)),
    }
}

/// `base^k` of a univariate polynomial base, multiplied out as a polynomial.
fn polynomial_power(base: &Expr, k: i64) -> Option<Expr> {
    let var = sole_symbol(base)?;
    let p = Poly::from_expr(base, &var)?;
    let k = u32::try_from(k).ok()?;
    if p.degree().checked_mul(k as usize)? > MAX_EXPAND_DEGREE {
        return None;
    }
    Some(p.pow(k).to_expr(&var))
}

fn is_unexpanded_power(e: &Expr) -> bool {
    match e {
        Expr::Pow(b, exp) => {
            let k = exp.as_number().and_then(Number::as_integer);
            (matches!(**b, Expr::Add(_)) && matches!(k, Some(k) if k >= 2 || k <= -2))
                || is_unexpanded_power(b)
                || is_unexpanded_power(exp)
        }
        Expr::Add(xs) | Expr::Mul(xs) => xs.iter().any(is_unexpanded_power),
        Expr::Func(_, a) => is_unexpanded_power(a),
        Expr::Num(_) | Expr::Const(_) | Expr::Sym(_) => false,
    }
}

/// [`expand`], failing instead of returning a power of a sum it could not multiply out.
pub fn expand_fully(e: &Expr) -> SymbolicResult<Expr> {
    let out = expand(e);
    if is_unexpanded_power(&out) {
        return Err(SymbolicError::Unsupported("power too large to expand".to_string()));
    }
    Ok(out)
}

/// Split into numerator and denominator, combining sums over a common denominator.
pub fn as_numer_denom(e: &Expr) -> (Expr, Expr) {
    match e {
        Expr::Num(Number::Rational(p, q)) => (Expr::int(*p), Expr::int(*q)),
        Expr::Mul(fs) => {
            let mut nums = Vec::with_capacity(fs.len());
            let mut dens = Vec::new();
            for f in fs {
                let (n, d) = as_numer_denom(f);
                nums.push(n);
                dens.push(d);
            }
            (Expr::mul(nums), Expr::mul(dens))
        }
        Expr::Add(ts) => {
            let mut acc: Option<(Expr, Expr)> = None;
            for t in ts {
                let (n, d) = as_numer_denom(t);
                acc = Some(match acc {
                    None => (n, d),
                    Some((an, ad)) if ad == d => (Expr::add(vec![an, n]), ad),
                    Some((an, ad)) => (
                        Expr::add(vec![Expr::mul(vec![an, d.clone()]), Expr::mul(vec![n, ad.clone()])]),
                        Expr::mul(vec![ad, d]),
                    ),
                });
            }
            acc.unwrap_or_else(|| (Expr::zero(), Expr::one()))
        }
        Expr::Pow(b, exp) => match exp.as_number() {
            Some(k) if k.is_negative() => {
                let positive = Expr::Num(-*k);
                if k.is_integer() {
                    let (n, d) = as_numer_denom(b);
                    (Expr::pow(d, positive.clone()), Expr::pow(n, positive))
                } else {
                    (Expr::one(), Expr::pow((**b).clone(), positive))
                }
            }
            _ => (e.clone(), Expr::one()),
        },
        _ => (e.clone(), Expr::one()),
    }
}

/// The single free symbol of `e`, or `None` for constants and multivariate input.
fn sole_symbol(e: &Expr) -> Option<String> {
    let syms = free_symbols(e);
    if syms.len() == 1 {
        syms.into_iter().next()
    } else {
        None
    }
}

/// Put over a common denominator and divide out the polynomial gcd.
pub fn cancel(e: &Expr) -> Expr {
    let (n, d) = as_numer_denom(e);
    let n = expand(&n);
    let d = expand(&d);
    if d.is_one() {
        return n;
    }
    if n == d {
        return Expr::one();
    }

    let var = match sole_symbol(&Expr::add(vec![n.clone(), d.clone()])) {
        Some(v) => v,
        None => return Expr::div(n, d),
    };
    let (pn, pd) = match (Poly::from_expr(&n, &var), Poly::from_expr(&d, &var)) {
        (Some(pn), Some(pd)) => (pn, pd),
        _ => return Expr::div(n, d),
    };

    let g = pn.gcd(&pd);
    let (mut pn, mut pd) = match (pn.div_rem(&g), pd.div_rem(&g)) {
        (Some((qn, _)), Some((qd, _))) if !g.is_zero() => (qn, qd),
        _ => (pn, pd),
    };
    // Denominator with coprime integer coefficients and positive leading term
    if let Some((content, prim)) = pd.primitive() {
        if let Some(inv) = content.recip() {
            pn = pn.scale(inv);
            pd = prim;
        }
    }
    Expr::div(pn.to_expr(&var), pd.to_expr(&var))
}

fn factorization_to_expr(f: &Factorization, var: &str, sign: i64) -> Vec<Expr> {
    f.factors
        .iter()
        .map(|(p, m)| Expr::pow(p.to_expr(var), Expr::int(sign * *m as i64)))
        .collect()
}

/// Factor a univariate rational function over the rationals into irreducible
/// factors. Input that is not a rational function of a single symbol, or that has
/// decimal coefficients, is returned unchanged.
pub fn factor(e: &Expr) -> SymbolicResult<Expr> {
    let var = match sole_symbol(e) {
        Some(v) => v,
        None => return Ok(e.clone()),
    };
    let c = cancel(e);
    let (n, d) = as_numer_denom(&c);
    let (pn, pd) = match (Poly::from_expr(&n, &var), Poly::from_expr(&d, &var)) {
        (Some(pn), Some(pd)) => (pn, pd),
        _ => return Ok(e.clone()),
    };
    if pn.is_zero() {
        return Ok(Expr::zero());
    }
    if pn.has_float() || pd.has_float() {
        return Ok(e.clone());
    }
    let fn_ = pn.factor_rational()?;
    let fd = pd.factor_rational()?;

    let content = fn_.content.checked_div(&fd.content).unwrap_or(fn_.content);
    let mut parts = factorization_to_expr(&fn_, &var, 1);
    parts.extend(factorization_to_expr(&fd, &var, -1));

    if parts.len() == 1 && matches!(parts[0], Expr::Add(_)) {
        return Ok(Expr::mul_keep_coeff(content, parts.remove(0)));
    }
    parts.insert(0, Expr::Num(content));
    Ok(Expr::mul(parts))
}

fn is_square_of(e: &Expr, func: Func) -> Option<&Expr> {
    match e {
        Expr::Pow(b, exp) if exp.as_number() == Some(&Number::int(2)) => match &**b {
            Expr::Func(f, a) if *f == func => Some(a),
            _ => None,
        },
        _ => None,
    }
}

fn factors(e: &Expr) -> Vec<Expr> {
    match e {
        Expr::Mul(fs) => fs.clone(),
        other => vec![other.clone()],
    }
}

/// Collapse `k*sin(a)^2 + k*cos(a)^2` into `k` wherever both terms appear in one sum.
pub fn trig_simplify(e: &Expr) -> Expr {
    let e = e.map_children(&trig_simplify);
    let mut ts = match e {
        Expr::Add(ts) => ts,
        other => return other,
    };

    'search: loop {
        for i in 0..ts.len() {
            for f in factors(&ts[i]) {
                let arg = match is_square_of(&f, Func::Sin) {
                    Some(a) => a.clone(),
                    None => continue,
                };
                let rest = Expr::div(ts[i].clone(), f.clone());
                let partner = Expr::mul(vec![
                    rest.clone(),
                    Expr::pow(Expr::func(Func::Cos, arg), Expr::int(2)),
                ]);
                if let Some(j) = ts.iter().position(|t| *t == partner) {
                    let (hi, lo) = if i > j { (i, j) } else { (j, i) };
                    ts.remove(hi);
                    ts.remove(lo);
                    ts.push(rest);
                    continue 'search;
                }
            }
        }
        break;
    }
    Expr::add(ts)
}

/// Smallest of several equivalent rewrites; ties keep the input.
pub fn simplify(e: &Expr) -> Expr {
    let expanded = expand(e);
    let candidates = [cancel(e), trig_simplify(&expanded), trig_simplify(&cancel(&expanded)), expanded];
    let mut best = e.clone();
    for c in candidates {
        if c.node_count() < best.node_count() {
            best = c;
        }
    }
    best
}
