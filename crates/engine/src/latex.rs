// LaTeX typesetting for expressions and solution lists
//
// Layout follows common CAS conventions: polynomial terms by descending degree,
// negative powers as fractions, function arguments wrapped in \left( \right).

use crate::expr::{Constant, Expr, Func};
use crate::number::{format_float, Number};

const GREEK: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa", "lambda", "mu", "nu",
    "xi", "rho", "sigma", "tau", "upsilon", "phi", "chi", "psi", "omega",
];

pub fn to_latex(e: &Expr) -> String {
    match e {
        Expr::Num(n) => number_latex(n),
        Expr::Const(c) => constant_latex(*c).to_string(),
        Expr::Sym(s) => symbol_latex(s),
        Expr::Add(ts) => add_latex(ts),
        Expr::Mul(_) => mul_latex(e),
        Expr::Pow(b, exp) => pow_latex(b, exp),
        Expr::Func(f, a) => func_latex(*f, &to_latex(a), None),
    }
}

/// `\left[ a, \  b\right]`, the usual typeset form of a solution list.
pub fn list_to_latex(items: &[Expr]) -> String {
    if items.is_empty() {
        return "\\left[ \\right]".to_string();
    }
    let inner: Vec<String> = items.iter().map(to_latex).collect();
    format!("\\left[ {}\\right]", inner.join(", \\  "))
}

fn number_latex(n: &Number) -> String {
    match n {
        Number::Rational(p, 1) => p.to_string(),
        Number::Rational(p, q) if *p < 0 => format!("- \\frac{{{}}}{{{}}}", p.unsigned_abs(), q),
        Number::Rational(p, q) => format!("\\frac{{{}}}{{{}}}", p, q),
        Number::Float(f) | Number::Overflow(f) => format_float(*f),
    }
}

fn constant_latex(c: Constant) -> &'static str {
    match c {
        Constant::Pi => "\\pi",
        Constant::E => "e",
        Constant::I => "i",
        Constant::Infinity => "\\infty",
        Constant::ComplexInfinity => "\\tilde{\\infty}",
        Constant::NaN => "\\text{NaN}",
    }
}

fn symbol_latex(name: &str) -> String {
    let (head, sub) = match name.split_once('_') {
        Some((h, s)) if !h.is_empty() && !s.is_empty() => (h, Some(s)),
        _ => (name, None),
    };
    let head = if GREEK.contains(&head) { format!("\\{}", head) } else { head.to_string() };
    match sub {
        Some(s) => format!("{}_{{{}}}", head, s),
        None => head,
    }
}

/// Total degree of a term in its symbols, for display ordering only.
fn display_degree(e: &Expr) -> f64 {
    match e {
        Expr::Sym(_) => 1.0,
        Expr::Pow(b, exp) if matches!(**b, Expr::Sym(_)) => exp.as_number().map(Number::to_f64).unwrap_or(0.0),
        Expr::Mul(fs) => fs.iter().map(display_degree).sum(),
        _ => 0.0,
    }
}

fn add_latex(terms: &[Expr]) -> String {
    let mut ordered: Vec<&Expr> = terms.iter().collect();
    if ordered.iter().any(|t| t.has_symbols()) {
        ordered.sort_by(|a, b| {
            b.has_symbols()
                .cmp(&a.has_symbols())
                .then_with(|| display_degree(b).partial_cmp(&display_degree(a)).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| a.cmp(b))
        });
    }

    let mut out = String::new();
    for (i, t) in ordered.iter().enumerate() {
        if i == 0 {
            out.push_str(&to_latex(t));
        } else if t.is_negative_term() {
            out.push_str(" - ");
            out.push_str(&to_latex(&Expr::neg((*t).clone())));
        } else {
            out.push_str(" + ");
            out.push_str(&to_latex(t));
        }
    }
    out
}

fn wrap_if_sum(e: &Expr) -> String {
    match e {
        Expr::Add(_) => format!("\\left({}\\right)", to_latex(e)),
        _ => to_latex(e),
    }
}

fn join_factors(coeff: Option<String>, factors: &[Expr], bare: bool) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(factors.len() + 1);
    if let Some(c) = coeff {
        parts.push(c);
    }
    if bare && parts.is_empty() && factors.len() == 1 {
        // a lone factor in a numerator or denominator needs no parentheses
        return to_latex(&factors[0]);
    }
    parts.extend(factors.iter().map(wrap_if_sum));
    parts.join(" ")
}

fn mul_latex(e: &Expr) -> String {
    let fs = match e {
        Expr::Mul(fs) => fs,
        other => return to_latex(other),
    };
    let (coeff, rest) = match fs[0].as_number() {
        Some(n) => (*n, &fs[1..]),
        None => (Number::int(1), &fs[..]),
    };

    let mut numer = Vec::new();
    let mut denom = Vec::new();
    for f in rest {
        match f {
            Expr::Pow(b, exp) if exp.as_number().map(Number::is_negative).unwrap_or(false) => {
                let flipped = exp.as_number().map(|n| -*n).unwrap_or(Number::int(1));
                denom.push(Expr::pow((**b).clone(), Expr::Num(flipped)));
            }
            other => numer.push(other.clone()),
        }
    }

    let sign = if coeff.is_negative() { "- " } else { "" };
    let magnitude = coeff.abs();
    let (num_coeff, den_coeff) = match magnitude {
        Number::Rational(p, q) => (
            if p == 1 { None } else { Some(p.to_string()) },
            if q == 1 { None } else { Some(q.to_string()) },
        ),
        Number::Float(f) | Number::Overflow(f) => (Some(format_float(f)), None),
    };

    if denom.is_empty() && den_coeff.is_none() {
        let body = if numer.is_empty() {
            num_coeff.unwrap_or_else(|| "1".to_string())
        } else {
            join_factors(num_coeff, &numer, sign.is_empty())
        };
        return format!("{}{}", sign, body);
    }

    let top = if numer.is_empty() {
        num_coeff.unwrap_or_else(|| "1".to_string())
    } else {
        join_factors(num_coeff, &numer, true)
    };
    let bottom = if denom.is_empty() {
        den_coeff.unwrap_or_else(|| "1".to_string())
    } else {
        join_factors(den_coeff, &denom, true)
    };
    format!("{}\\frac{{{}}}{{{}}}", sign, top, bottom)
}

fn needs_base_parens(b: &Expr) -> bool {
    match b {
        Expr::Add(_) | Expr::Mul(_) | Expr::Pow(..) => true,
        Expr::Num(n) => n.is_negative() || !n.is_integer(),
        _ => false,
    }
}

fn pow_latex(b: &Expr, exp: &Expr) -> String {
    if let Some(n) = exp.as_number() {
        if n.is_negative() {
            let flipped = Expr::pow(b.clone(), Expr::Num(-*n));
            return format!("\\frac{{1}}{{{}}}", to_latex(&flipped));
        }
        if let Number::Rational(1, q) = n {
            return if *q == 2 {
                format!("\\sqrt{{{}}}", to_latex(b))
            } else {
                format!("\\sqrt[{}]{{{}}}", q, to_latex(b))
            };
        }
    }
    if let Expr::Const(Constant::E) = b {
        return format!("e^{{{}}}", to_latex(exp));
    }
    if let (Expr::Func(f, a), Some(n)) = (b, exp.as_number()) {
        if n.is_integer() && *f != Func::Abs {
            return func_latex(*f, &to_latex(a), Some(&to_latex(exp)));
        }
    }
    let base = if needs_base_parens(b) { format!("\\left({}\\right)", to_latex(b)) } else { to_latex(b) };
    format!("{}^{{{}}}", base, to_latex(exp))
}

fn func_latex(f: Func, arg: &str, power: Option<&str>) -> String {
    let head = match f {
        Func::Abs => {
            let body = format!("\\left|{{{}}}\\right|", arg);
            return match power {
                Some(p) => format!("{}^{{{}}}", body, p),
                None => body,
            };
        }
        Func::Asin | Func::Acos | Func::Atan => format!("\\operatorname{{{}}}", f.name()),
        _ => format!("\\{}", f.name()),
    };
    match power {
        Some(p) => format!("{}^{{{}}}{{\\left({} \\right)}}", head, p, arg),
        None => format!("{}{{\\left({} \\right)}}", head, arg),
    }
}
