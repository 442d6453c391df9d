// Differentiation, indefinite integration and one-sided limits at zero

use crate::algebra::{as_numer_denom, expand};
use crate::error::{SymbolicError, SymbolicResult};
use crate::expr::{Constant, Expr, Func};
use crate::number::Number;
use crate::poly::Poly;

/// Maximum rounds of L'Hopital's rule before falling back to numeric probing.
const MAX_LHOPITAL_STEPS: usize = 8;

// =============================================================================
// Derivatives
// =============================================================================

pub fn diff(e: &Expr, var: &str) -> Expr {
    if !e.has(var) {
        return Expr::zero();
    }
    match e {
        Expr::Sym(_) => Expr::one(),
        Expr::Num(_) | Expr::Const(_) => Expr::zero(),
        Expr::Add(ts) => Expr::add(ts.iter().map(|t| diff(t, var)).collect()),
        Expr::Mul(fs) => {
            let mut terms = Vec::with_capacity(fs.len());
            for i in 0..fs.len() {
                if !fs[i].has(var) {
                    continue;
                }
                let mut factors = fs.clone();
                factors[i] = diff(&fs[i], var);
                terms.push(Expr::mul(factors));
            }
            Expr::add(terms)
        }
        Expr::Pow(b, exp) => {
            let (b, exp) = (&**b, &**exp);
            if !exp.has(var) {
                // d(b^n) = n*b^(n-1)*db
                let lowered = Expr::pow(b.clone(), Expr::sub(exp.clone(), Expr::one()));
                Expr::mul(vec![exp.clone(), lowered, diff(b, var)])
            } else if !b.has(var) {
                // d(c^u) = c^u*log(c)*du
                Expr::mul(vec![e.clone(), Expr::log(b.clone()), diff(exp, var)])
            } else {
                let inner = Expr::add(vec![
                    Expr::mul(vec![diff(exp, var), Expr::log(b.clone())]),
                    Expr::mul(vec![exp.clone(), diff(b, var), Expr::pow(b.clone(), Expr::int(-1))]),
                ]);
                Expr::mul(vec![e.clone(), inner])
            }
        }
        Expr::Func(f, a) => {
            let a = &**a;
            let outer = match f {
                Func::Sin => Expr::func(Func::Cos, a.clone()),
                Func::Cos => Expr::neg(Expr::func(Func::Sin, a.clone())),
                Func::Tan => Expr::add(vec![Expr::pow(e.clone(), Expr::int(2)), Expr::one()]),
                Func::Asin => Expr::pow(one_minus_square(a), Expr::rational(-1, 2)),
                Func::Acos => Expr::neg(Expr::pow(one_minus_square(a), Expr::rational(-1, 2))),
                Func::Atan => Expr::pow(
                    Expr::add(vec![Expr::pow(a.clone(), Expr::int(2)), Expr::one()]),
                    Expr::int(-1),
                ),
                Func::Sinh => Expr::func(Func::Cosh, a.clone()),
                Func::Cosh => Expr::func(Func::Sinh, a.clone()),
                Func::Tanh => Expr::sub(Expr::one(), Expr::pow(e.clone(), Expr::int(2))),
                Func::Log => Expr::pow(a.clone(), Expr::int(-1)),
                Func::Abs => Expr::div(a.clone(), e.clone()),
            };
            Expr::mul(vec![outer, diff(a, var)])
        }
    }
}

fn one_minus_square(a: &Expr) -> Expr {
    Expr::sub(Expr::one(), Expr::pow(a.clone(), Expr::int(2)))
}

// =============================================================================
// Integrals
// =============================================================================

/// `(a, b)` with `u == a*var + b`, both numeric, `a != 0`.
fn linear_coeffs(u: &Expr, var: &str) -> Option<(Number, Number)> {
    let p = Poly::from_expr(u, var)?;
    if p.degree() != 1 || p.is_zero() {
        return None;
    }
    Some((p.coeff(1), p.coeff(0)))
}

fn unsupported(e: &Expr) -> SymbolicError {
    SymbolicError::Unsupported(format!("no closed-form antiderivative for {:?}", e))
}

/// Indefinite integral without a constant of integration.
pub fn integrate(e: &Expr, var: &str) -> SymbolicResult<Expr> {
    if !e.has(var) {
        return Ok(Expr::mul(vec![e.clone(), Expr::sym(var)]));
    }

    if let Some(p) = Poly::from_expr(e, var) {
        return Ok(integrate_poly(&p).to_expr(var));
    }

    match e {
        Expr::Add(ts) => {
            let mut out = Vec::with_capacity(ts.len());
            for t in ts {
                out.push(integrate(t, var)?);
            }
            return Ok(Expr::add(out));
        }
        Expr::Mul(fs) => {
            let (consts, rest): (Vec<Expr>, Vec<Expr>) = fs.iter().cloned().partition(|f| !f.has(var));
            if !consts.is_empty() {
                let body = integrate(&Expr::mul(rest), var)?;
                return Ok(Expr::mul(vec![Expr::mul(consts), body]));
            }
        }
        _ => {}
    }

    if let Some(found) = integrate_elementary(e, var) {
        return Ok(found);
    }
    if let Some(found) = integrate_rational(e, var) {
        return Ok(found);
    }
    if let Some(found) = integrate_by_parts(e, var)? {
        return Ok(found);
    }

    let expanded = expand(e);
    if expanded != *e {
        return integrate(&expanded, var);
    }
    Err(unsupported(e))
}

fn integrate_poly(p: &Poly) -> Poly {
    let mut coeffs = vec![Number::int(0)];
    for (k, &c) in p.coeffs().iter().enumerate() {
        let n = Number::int(k as i64 + 1);
        coeffs.push(c.checked_div(&n).unwrap_or(c));
    }
    Poly::new(coeffs)
}

/// Table integrals of single factors with a linear inner argument.
fn integrate_elementary(e: &Expr, var: &str) -> Option<Expr> {
    let x = Expr::sym(var);
    match e {
        Expr::Pow(b, exp) if exp.as_number() == Some(&Number::int(2)) => match &**b {
            Expr::Func(f @ (Func::Sin | Func::Cos), arg) if **arg == x => {
                // sin^2 = x/2 - sin*cos/2, cos^2 = x/2 + sin*cos/2
                let sc = Expr::mul(vec![
                    Expr::rational(1, 2),
                    Expr::func(Func::Sin, x.clone()),
                    Expr::func(Func::Cos, x.clone()),
                ]);
                let half_x = Expr::mul(vec![Expr::rational(1, 2), x]);
                Some(if *f == Func::Sin { Expr::sub(half_x, sc) } else { Expr::add(vec![half_x, sc]) })
            }
            _ => None,
        },
        Expr::Pow(b, exp) if !exp.has(var) => {
            let (a, _) = linear_coeffs(b, var)?;
            if exp.as_number().map(Number::is_neg_one).unwrap_or(false) {
                return Some(Expr::div(Expr::log((**b).clone()), Expr::Num(a)));
            }
            let raised = Expr::add(vec![(**exp).clone(), Expr::one()]);
            let denom = Expr::mul(vec![raised.clone(), Expr::Num(a)]);
            Some(Expr::div(Expr::pow((**b).clone(), raised), denom))
        }
        Expr::Pow(b, exp) if !b.has(var) => {
            let (a, _) = linear_coeffs(exp, var)?;
            Some(Expr::div(e.clone(), Expr::mul(vec![Expr::Num(a), Expr::log((**b).clone())])))
        }
        Expr::Func(f, u) => {
            let u = &**u;
            if *u == x {
                match f {
                    Func::Asin => {
                        return Some(Expr::add(vec![
                            Expr::mul(vec![x.clone(), e.clone()]),
                            Expr::sqrt(one_minus_square(&x)),
                        ]))
                    }
                    Func::Acos => {
                        return Some(Expr::sub(
                            Expr::mul(vec![x.clone(), e.clone()]),
                            Expr::sqrt(one_minus_square(&x)),
                        ))
                    }
                    Func::Atan => {
                        let log_term = Expr::log(Expr::add(vec![Expr::pow(x.clone(), Expr::int(2)), Expr::one()]));
                        return Some(Expr::sub(
                            Expr::mul(vec![x, e.clone()]),
                            Expr::mul(vec![Expr::rational(1, 2), log_term]),
                        ));
                    }
                    _ => {}
                }
            }

            let (a, _) = linear_coeffs(u, var)?;
            let anti = match f {
                Func::Sin => Expr::neg(Expr::func(Func::Cos, u.clone())),
                Func::Cos => Expr::func(Func::Sin, u.clone()),
                Func::Tan => Expr::neg(Expr::log(Expr::func(Func::Cos, u.clone()))),
                Func::Sinh => Expr::func(Func::Cosh, u.clone()),
                Func::Cosh => Expr::func(Func::Sinh, u.clone()),
                Func::Tanh => Expr::sub(
                    u.clone(),
                    Expr::log(Expr::add(vec![Expr::func(Func::Tanh, u.clone()), Expr::one()])),
                ),
                Func::Log => Expr::sub(Expr::mul(vec![u.clone(), e.clone()]), u.clone()),
                Func::Asin | Func::Acos | Func::Atan | Func::Abs => return None,
            };
            Some(Expr::div(anti, Expr::Num(a)))
        }
        _ => None,
    }
}

/// Rational functions whose denominator splits into distinct rational linear
/// factors, or is `a*x^2 + c` with `a, c > 0`.
fn integrate_rational(e: &Expr, var: &str) -> Option<Expr> {
    let (n, d) = as_numer_denom(e);
    let pn = Poly::from_expr(&n, var)?;
    let pd = Poly::from_expr(&d, var)?;
    if pd.degree() == 0 || pn.has_float() || pd.has_float() {
        return None;
    }

    let (quot, rem) = pn.div_rem(&pd)?;
    let mut parts = vec![integrate_poly(&quot).to_expr(var)];
    if rem.is_zero() {
        return Some(Expr::add(parts));
    }
    let x = Expr::sym(var);

    let roots = pd.rational_roots();
    if roots.len() == pd.degree() {
        // Simple poles only: residue at r is rem(r)/pd'(r)
        let dpd = pd.derivative();
        for r in roots {
            let residue = rem.eval(r).checked_div(&dpd.eval(r))?;
            let log_term = Expr::log(Expr::sub(x.clone(), Expr::Num(r)));
            parts.push(Expr::mul(vec![Expr::Num(residue), log_term]));
        }
        return Some(Expr::add(parts));
    }

    if pd.degree() == 2 && pd.coeff(1).is_zero() && rem.degree() == 0 {
        let (a, c) = (pd.coeff(2), pd.coeff(0));
        if a.is_positive() && c.is_positive() {
            // k/(a*x^2 + c) = k/sqrt(a*c) * atan(sqrt(a/c)*x)
            let k = rem.coeff(0);
            let scale = Expr::sqrt(Expr::Num(a.checked_div(&c)?));
            let atan = Expr::func(Func::Atan, Expr::mul(vec![scale, x]));
            let norm = Expr::pow(Expr::Num(a * c), Expr::rational(-1, 2));
            parts.push(Expr::mul(vec![Expr::Num(k), norm, atan]));
            return Some(Expr::add(parts));
        }
    }
    None
}

/// `P(x) * g(x)` with `P` polynomial and `g` one of exp/sin/cos of a linear argument
/// or `log(x)` against a monomial.
fn integrate_by_parts(e: &Expr, var: &str) -> SymbolicResult<Option<Expr>> {
    let fs = match e {
        Expr::Mul(fs) => fs,
        _ => return Ok(None),
    };
    let (poly_part, other): (Vec<Expr>, Vec<Expr>) =
        fs.iter().cloned().partition(|f| Poly::from_expr(f, var).is_some());
    if other.len() != 1 || poly_part.is_empty() {
        return Ok(None);
    }
    let p = match Poly::from_expr(&Expr::mul(poly_part), var) {
        Some(p) => p,
        None => return Ok(None),
    };
    let g = &other[0];
    let x = Expr::sym(var);

    if let Expr::Func(Func::Log, arg) = g {
        if **arg == x && p.coeffs().iter().filter(|c| !c.is_zero()).count() == 1 {
            // x^n*log(x) = x^(n+1)*log(x)/(n+1) - x^(n+1)/(n+1)^2
            let n1 = Number::int(p.degree() as i64 + 1);
            let c = p.leading();
            let raised = Expr::pow(x, Expr::Num(n1));
            let first = Expr::mul(vec![raised.clone(), g.clone()]);
            let a = c.checked_div(&n1).unwrap_or(c);
            let b = c.checked_div(&(n1 * n1)).unwrap_or(c);
            return Ok(Some(Expr::add(vec![
                Expr::mul(vec![Expr::Num(a), first]),
                Expr::mul(vec![Expr::Num(-b), raised]),
            ])));
        }
        return Ok(None);
    }

    let cyclic = match g {
        Expr::Pow(b, exp) => matches!(**b, Expr::Const(Constant::E)) && linear_coeffs(exp, var).is_some(),
        Expr::Func(Func::Sin | Func::Cos, arg) => linear_coeffs(arg, var).is_some(),
        _ => false,
    };
    if !cyclic {
        return Ok(None);
    }

    // Tabular integration: sum (-1)^k P^(k) G_(k+1)
    let mut terms = Vec::new();
    let mut deriv = p;
    let mut anti = integrate(g, var)?;
    let mut sign = 1i64;
    while !deriv.is_zero() {
        terms.push(Expr::mul(vec![Expr::int(sign), deriv.to_expr(var), anti.clone()]));
        deriv = deriv.derivative();
        anti = integrate(&anti, var)?;
        sign = -sign;
    }
    Ok(Some(Expr::add(terms)))
}

// =============================================================================
// Limits
// =============================================================================

/// Limit of `e` as `var -> 0` from the positive side.
pub fn limit(e: &Expr, var: &str) -> SymbolicResult<Expr> {
    let zero = Expr::zero();
    let direct = e.subs(var, &zero);
    if direct.is_finite() {
        return Ok(direct);
    }

    let (mut n, mut d) = as_numer_denom(e);
    for _ in 0..MAX_LHOPITAL_STEPS {
        let n0 = n.subs(var, &zero);
        let d0 = d.subs(var, &zero);
        let n_finite = n0.is_finite();
        let d_finite = d0.is_finite();

        if n_finite && d_finite && !d0.is_zero() {
            return Ok(Expr::div(n0, d0));
        }
        if n0.is_zero() && d0.is_zero() {
            n = diff(&n, var);
            d = diff(&d, var);
            continue;
        }
        let blows_up = (n_finite && !n0.is_zero() && d0.is_zero())
            || (is_infinite(&n0) && d_finite && !d0.is_zero());
        if blows_up {
            return signed_infinity(e, var);
        }
        break;
    }

    numeric_limit(e, var)
}

fn is_infinite(e: &Expr) -> bool {
    matches!(e, Expr::Const(Constant::Infinity | Constant::ComplexInfinity)) || (!e.is_finite() && *e != Expr::nan())
}

fn signed_infinity(e: &Expr, var: &str) -> SymbolicResult<Expr> {
    match e.eval_real(var, 1e-9) {
        Some(v) if v > 0.0 => Ok(Expr::Const(Constant::Infinity)),
        Some(v) if v < 0.0 => Ok(Expr::neg(Expr::Const(Constant::Infinity))),
        _ => Err(SymbolicError::Undefined(format!("limit of {:?} at 0", e))),
    }
}

/// Sample points approaching zero and recognize a converged value or a divergence.
fn numeric_limit(e: &Expr, var: &str) -> SymbolicResult<Expr> {
    let undefined = || SymbolicError::Undefined(format!("limit of {:?} at 0", e));
    let samples: Vec<f64> = [1e-6, 1e-8, 1e-10]
        .iter()
        .map(|&h| e.eval_real(var, h))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(undefined)?;
    let (prev, last) = (samples[1], samples[2]);

    if last.abs() > 1e6 && last.abs() > prev.abs() && prev.signum() == last.signum() {
        let inf = Expr::Const(Constant::Infinity);
        return Ok(if last > 0.0 { inf } else { Expr::neg(inf) });
    }
    if (last - prev).abs() > 1e-4 * last.abs().max(1.0) {
        return Err(undefined());
    }
    Ok(recognize(last))
}

/// Snap a float to a nearby small rational or well-known constant.
fn recognize(v: f64) -> Expr {
    const TOL: f64 = 1e-5;
    if v.abs() < TOL {
        return Expr::zero();
    }
    for den in 1..=12i64 {
        let num = (v * den as f64).round();
        if (num / den as f64 - v).abs() < TOL {
            return Expr::rational(num as i64, den);
        }
    }
    for (c, value) in [(Constant::E, std::f64::consts::E), (Constant::Pi, std::f64::consts::PI)] {
        if (v - value).abs() < TOL {
            return Expr::Const(c);
        }
    }
    Expr::Num(Number::float(v))
}
