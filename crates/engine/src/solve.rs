// Equation solving: roots of expr = 0 in one variable

use std::cmp::Ordering;

use crate::algebra::{as_numer_denom, expand};
use crate::error::{SymbolicError, SymbolicResult};
use crate::expr::{Constant, Expr, Func};
use crate::number::Number;
use crate::poly::Poly;

/// Solutions of `e = 0` for `var`, ascending by real then imaginary part, without
/// duplicates. Values that make a denominator vanish are excluded. An identity or a
/// contradiction both give an empty list.
pub fn solve(e: &Expr, var: &str) -> SymbolicResult<Vec<Expr>> {
    let (numer, denom) = as_numer_denom(e);
    let mut roots = solve_zero(&numer, var)?;

    roots.retain(|r| !denom.subs(var, r).is_zero());

    let mut keyed: Vec<(Option<(f64, f64)>, Expr)> = roots.into_iter().map(|r| (r.eval_complex(), r)).collect();
    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some((ar, ai)), Some((br, bi))) => ar
            .partial_cmp(br)
            .unwrap_or(Ordering::Equal)
            .then(ai.partial_cmp(bi).unwrap_or(Ordering::Equal)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    let mut out: Vec<Expr> = Vec::with_capacity(keyed.len());
    for (_, r) in keyed {
        if !out.contains(&r) {
            out.push(r);
        }
    }
    Ok(out)
}

fn solve_zero(e: &Expr, var: &str) -> SymbolicResult<Vec<Expr>> {
    if !e.has(var) {
        return Ok(Vec::new());
    }

    let expanded = expand(e);
    if let Some(p) = Poly::from_expr(&expanded, var) {
        return solve_poly(&p, var);
    }

    match e {
        Expr::Mul(fs) => {
            let mut out = Vec::new();
            for f in fs.iter().filter(|f| f.has(var)) {
                out.extend(solve_zero(f, var)?);
            }
            return Ok(out);
        }
        Expr::Pow(b, exp) if !exp.has(var) && exp.as_number().map(Number::is_positive).unwrap_or(false) => {
            return solve_zero(b, var);
        }
        Expr::Pow(b, _) if matches!(**b, Expr::Const(Constant::E)) => return Ok(Vec::new()),
        Expr::Func(f, u) => {
            if let Some(found) = solve_function(*f, u, var) {
                return Ok(found);
            }
        }
        _ => {}
    }

    if let Some(coeffs) = symbolic_coeffs(&expanded, var) {
        return solve_by_formula(&coeffs);
    }
    Err(SymbolicError::Unsupported(format!("cannot solve {:?} = 0", e)))
}

fn solve_poly(p: &Poly, var: &str) -> SymbolicResult<Vec<Expr>> {
    if p.degree() == 0 {
        return Ok(Vec::new());
    }

    if p.has_float() {
        // inexact coefficients go straight to the closed forms
        let coeffs: Vec<Expr> = p.coeffs().iter().map(|&c| Expr::Num(c)).collect();
        return solve_by_formula(&coeffs);
    }
    let factorization = p.factor_rational()?;

    let mut out = Vec::new();
    for (factor, _) in &factorization.factors {
        if factor.degree() > 2 {
            log::debug!("irreducible factor of degree {} in {}", factor.degree(), var);
            return Err(SymbolicError::UnsolvableDegree(factor.degree()));
        }
        let coeffs: Vec<Expr> = factor.coeffs().iter().map(|&c| Expr::Num(c)).collect();
        out.extend(solve_by_formula(&coeffs)?);
    }
    Ok(out)
}

/// Linear and quadratic closed forms over coefficients listed low degree first.
fn solve_by_formula(coeffs: &[Expr]) -> SymbolicResult<Vec<Expr>> {
    let mut coeffs = coeffs.to_vec();
    while coeffs.last().map(Expr::is_zero).unwrap_or(false) {
        coeffs.pop();
    }
    match coeffs.len() {
        0 | 1 => Ok(Vec::new()),
        2 => Ok(vec![Expr::neg(Expr::div(coeffs[0].clone(), coeffs[1].clone()))]),
        3 => {
            let (c, b, a) = (coeffs[0].clone(), coeffs[1].clone(), coeffs[2].clone());
            let disc = expand(&Expr::sub(
                Expr::pow(b.clone(), Expr::int(2)),
                Expr::mul(vec![Expr::int(4), a.clone(), c]),
            ));
            let root = Expr::sqrt(disc);
            let two_a = Expr::mul(vec![Expr::int(2), a]);
            let minus_b = Expr::neg(b);
            Ok(vec![
                Expr::div(Expr::sub(minus_b.clone(), root.clone()), two_a.clone()),
                Expr::div(Expr::add(vec![minus_b, root]), two_a),
            ])
        }
        n => Err(SymbolicError::UnsolvableDegree(n - 1)),
    }
}

/// Coefficients of a polynomial in `var` whose coefficients may be other symbols.
fn symbolic_coeffs(e: &Expr, var: &str) -> Option<Vec<Expr>> {
    let terms = match e {
        Expr::Add(ts) => ts.clone(),
        other => vec![other.clone()],
    };
    let mut coeffs: Vec<Vec<Expr>> = Vec::new();
    for t in &terms {
        let (k, c) = term_degree(t, var)?;
        if coeffs.len() <= k {
            coeffs.resize(k + 1, Vec::new());
        }
        coeffs[k].push(c);
    }
    Some(coeffs.into_iter().map(Expr::add).collect())
}

fn term_degree(t: &Expr, var: &str) -> Option<(usize, Expr)> {
    if !t.has(var) {
        return Some((0, t.clone()));
    }
    let factors = match t {
        Expr::Mul(fs) => fs.clone(),
        other => vec![other.clone()],
    };
    let mut degree = 0usize;
    let mut coeff = Vec::new();
    for f in factors {
        match &f {
            Expr::Sym(s) if s == var => degree += 1,
            Expr::Pow(b, exp) if matches!(&**b, Expr::Sym(s) if s == var) => {
                let k = exp.as_number()?.as_integer()?;
                degree += usize::try_from(k).ok()?;
            }
            other if !other.has(var) => coeff.push(f.clone()),
            _ => return None,
        }
    }
    Some((degree, Expr::mul(coeff)))
}

/// Zeros of `f(a*x + b)` for elementary `f`, restricted to the principal branch.
fn solve_function(f: Func, u: &Expr, var: &str) -> Option<Vec<Expr>> {
    let p = Poly::from_expr(u, var)?;
    if p.degree() != 1 {
        return None;
    }
    let (a, b) = (Expr::Num(p.coeff(1)), Expr::Num(p.coeff(0)));
    let pi = Expr::Const(Constant::Pi);
    let targets = match f {
        Func::Sin => vec![Expr::zero(), pi],
        Func::Cos => vec![
            Expr::mul(vec![Expr::rational(1, 2), pi.clone()]),
            Expr::mul(vec![Expr::rational(3, 2), pi]),
        ],
        Func::Tan | Func::Asin | Func::Atan | Func::Sinh | Func::Tanh => vec![Expr::zero()],
        Func::Log | Func::Acos => vec![Expr::one()],
        Func::Cosh => Vec::new(),
        Func::Abs => vec![Expr::zero()],
    };
    Some(
        targets
            .into_iter()
            .map(|t| Expr::div(Expr::sub(t, b.clone()), a.clone()))
            .collect(),
    )
}
