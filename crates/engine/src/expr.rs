// Symbolic expression tree
//
// Every constructor canonicalizes: sums and products are flattened, numbers folded,
// like terms collected and like bases merged, so two equal expressions built by
// different routes compare structurally equal.

use std::cmp::Ordering;

use crate::number::{exact_root, split_square, Number};

/// Named constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Constant {
    Pi,
    E,
    /// Imaginary unit
    I,
    Infinity,
    /// Unsigned infinity, the result of dividing by zero
    ComplexInfinity,
    NaN,
}

/// Elementary functions of one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Log,
    Abs,
}

impl Func {
    pub fn name(&self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Asin => "asin",
            Func::Acos => "acos",
            Func::Atan => "atan",
            Func::Sinh => "sinh",
            Func::Cosh => "cosh",
            Func::Tanh => "tanh",
            Func::Log => "log",
            Func::Abs => "Abs",
        }
    }

    fn eval_f64(&self, v: f64) -> f64 {
        match self {
            Func::Sin => v.sin(),
            Func::Cos => v.cos(),
            Func::Tan => v.tan(),
            Func::Asin => v.asin(),
            Func::Acos => v.acos(),
            Func::Atan => v.atan(),
            Func::Sinh => v.sinh(),
            Func::Cosh => v.cosh(),
            Func::Tanh => v.tanh(),
            Func::Log => v.ln(),
            Func::Abs => v.abs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Num(Number),
    Const(Constant),
    Sym(String),
    /// Sum of at least two terms, sorted, at most one numeric term
    Add(Vec<Expr>),
    /// Product of at least two factors, sorted, numeric coefficient first
    Mul(Vec<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Func(Func, Box<Expr>),
}

// =============================================================================
// Leaf constructors and predicates
// =============================================================================

impl Expr {
    pub fn int(n: i64) -> Expr {
        Expr::Num(Number::int(n))
    }

    pub fn zero() -> Expr {
        Expr::int(0)
    }

    pub fn one() -> Expr {
        Expr::int(1)
    }

    pub fn sym(name: &str) -> Expr {
        Expr::Sym(name.to_string())
    }

    /// Exact rational `num/den`; a zero denominator gives complex infinity.
    pub fn rational(num: i64, den: i64) -> Expr {
        match Number::rational(num, den) {
            Some(n) => Expr::Num(n),
            None => Expr::Const(Constant::ComplexInfinity),
        }
    }

    pub fn nan() -> Expr {
        Expr::Const(Constant::NaN)
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Expr::Num(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Num(n) if n.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Num(n) if n.is_one())
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Expr::Num(_))
    }

    fn is_const(&self, c: Constant) -> bool {
        matches!(self, Expr::Const(k) if *k == c)
    }

    /// True for `oo` and `-oo`.
    fn infinity_sign(&self) -> Option<bool> {
        match self {
            Expr::Const(Constant::Infinity) => Some(true),
            Expr::Mul(fs) if fs.len() == 2 && fs[1].is_const(Constant::Infinity) => {
                fs[0].as_number().map(|n| n.is_positive())
            }
            _ => None,
        }
    }

    /// True if the expression mentions the symbol `var`.
    pub fn has(&self, var: &str) -> bool {
        match self {
            Expr::Sym(s) => s == var,
            Expr::Num(_) | Expr::Const(_) => false,
            Expr::Add(xs) | Expr::Mul(xs) => xs.iter().any(|x| x.has(var)),
            Expr::Pow(b, e) => b.has(var) || e.has(var),
            Expr::Func(_, a) => a.has(var),
        }
    }

    /// True if any symbol appears at all.
    pub fn has_symbols(&self) -> bool {
        match self {
            Expr::Sym(_) => true,
            Expr::Num(_) | Expr::Const(_) => false,
            Expr::Add(xs) | Expr::Mul(xs) => xs.iter().any(Expr::has_symbols),
            Expr::Pow(b, e) => b.has_symbols() || e.has_symbols(),
            Expr::Func(_, a) => a.has_symbols(),
        }
    }

    /// True if an exact coefficient anywhere in the tree left the i64 range.
    pub fn has_overflow(&self) -> bool {
        match self {
            Expr::Num(n) => n.is_overflow(),
            Expr::Const(_) | Expr::Sym(_) => false,
            Expr::Add(xs) | Expr::Mul(xs) => xs.iter().any(Expr::has_overflow),
            Expr::Pow(b, e) => b.has_overflow() || e.has_overflow(),
            Expr::Func(_, a) => a.has_overflow(),
        }
    }

    /// False if the expression contains an infinity or NaN anywhere.
    pub fn is_finite(&self) -> bool {
        match self {
            Expr::Const(Constant::Infinity | Constant::ComplexInfinity | Constant::NaN) => false,
            Expr::Num(n) => n.to_f64().is_finite(),
            Expr::Sym(_) | Expr::Const(_) => true,
            Expr::Add(xs) | Expr::Mul(xs) => xs.iter().all(Expr::is_finite),
            Expr::Pow(b, e) => b.is_finite() && e.is_finite(),
            Expr::Func(_, a) => a.is_finite(),
        }
    }

    pub fn node_count(&self) -> usize {
        match self {
            Expr::Num(_) | Expr::Const(_) | Expr::Sym(_) => 1,
            Expr::Add(xs) | Expr::Mul(xs) => 1 + xs.iter().map(Expr::node_count).sum::<usize>(),
            Expr::Pow(b, e) => 1 + b.node_count() + e.node_count(),
            Expr::Func(_, a) => 1 + a.node_count(),
        }
    }

    /// Split into numeric coefficient and the remaining product.
    pub fn split_coeff(&self) -> (Number, Expr) {
        match self {
            Expr::Num(n) => (*n, Expr::one()),
            Expr::Mul(fs) => match fs[0].as_number() {
                Some(n) if fs.len() == 2 => (*n, fs[1].clone()),
                Some(n) => (*n, Expr::Mul(fs[1..].to_vec())),
                None => (Number::int(1), self.clone()),
            },
            _ => (Number::int(1), self.clone()),
        }
    }

    /// `(base, exponent)` view used when merging like bases.
    pub fn as_base_exp(&self) -> (Expr, Expr) {
        match self {
            Expr::Pow(b, e) => ((**b).clone(), (**e).clone()),
            other => (other.clone(), Expr::one()),
        }
    }

    /// True if the printed form starts with a minus sign.
    pub fn is_negative_term(&self) -> bool {
        match self {
            Expr::Num(n) => n.is_negative(),
            Expr::Mul(fs) => fs[0].as_number().map(|n| n.is_negative()).unwrap_or(false),
            _ => false,
        }
    }
}

// =============================================================================
// Canonical constructors
// =============================================================================

impl Expr {
    pub fn add(terms: Vec<Expr>) -> Expr {
        let mut flat = Vec::with_capacity(terms.len());
        for t in terms {
            match t {
                Expr::Add(ts) => flat.extend(ts),
                other => flat.push(other),
            }
        }

        if flat.iter().any(|t| t.is_const(Constant::NaN)) {
            return Expr::nan();
        }
        let pos_inf = flat.iter().any(|t| t.infinity_sign() == Some(true));
        let neg_inf = flat.iter().any(|t| t.infinity_sign() == Some(false));
        let zoo = flat.iter().any(|t| t.is_const(Constant::ComplexInfinity));
        if (pos_inf && neg_inf) || (zoo && (pos_inf || neg_inf)) {
            return Expr::nan();
        }
        if zoo {
            return Expr::Const(Constant::ComplexInfinity);
        }
        if pos_inf {
            return Expr::Const(Constant::Infinity);
        }
        if neg_inf {
            return Expr::neg(Expr::Const(Constant::Infinity));
        }

        let mut constant = Number::int(0);
        let mut groups: Vec<(Expr, Number)> = Vec::new();
        for t in flat {
            if let Expr::Num(n) = t {
                constant = constant + n;
                continue;
            }
            let (c, rest) = t.split_coeff();
            match groups.iter_mut().find(|(r, _)| *r == rest) {
                Some((_, acc)) => *acc = *acc + c,
                None => groups.push((rest, c)),
            }
        }

        let mut out = Vec::with_capacity(groups.len() + 1);
        if !constant.is_zero() {
            out.push(Expr::Num(constant));
        }
        for (rest, c) in groups {
            if c.is_zero() {
                continue;
            }
            out.push(Expr::with_coeff(c, rest));
        }

        match out.len() {
            0 => Expr::zero(),
            1 => out.remove(0),
            _ => {
                out.sort();
                Expr::Add(out)
            }
        }
    }

    /// `c * rest` where `rest` is already a coefficient-free canonical product.
    fn with_coeff(c: Number, rest: Expr) -> Expr {
        if c.is_one() {
            return rest;
        }
        match rest {
            Expr::Mul(mut fs) => {
                fs.insert(0, Expr::Num(c));
                Expr::Mul(fs)
            }
            Expr::Add(_) => Expr::mul(vec![Expr::Num(c), rest]),
            other => Expr::Mul(vec![Expr::Num(c), other]),
        }
    }

    pub fn mul(factors: Vec<Expr>) -> Expr {
        let mut flat = Vec::with_capacity(factors.len());
        for f in factors {
            match f {
                Expr::Mul(fs) => flat.extend(fs),
                other => flat.push(other),
            }
        }

        if flat.iter().any(|f| f.is_const(Constant::NaN)) {
            return Expr::nan();
        }
        let has_zero = flat.iter().any(Expr::is_zero);
        let zoo = flat.iter().any(|f| f.is_const(Constant::ComplexInfinity));
        let inf = flat.iter().any(|f| f.is_const(Constant::Infinity));
        if has_zero && (zoo || inf) {
            return Expr::nan();
        }
        if has_zero {
            return Expr::zero();
        }
        if zoo {
            return Expr::Const(Constant::ComplexInfinity);
        }

        let mut coeff = Number::int(1);
        let mut groups: Vec<(Expr, Vec<Expr>)> = Vec::new();
        for f in flat {
            if let Expr::Num(n) = f {
                coeff = coeff * n;
                continue;
            }
            let (base, exp) = f.as_base_exp();
            match groups.iter_mut().find(|(b, _)| *b == base) {
                Some((_, exps)) => exps.push(exp),
                None => groups.push((base, vec![exp])),
            }
        }

        let mut others = Vec::with_capacity(groups.len());
        let mut needs_pass = false;
        for (base, exps) in groups {
            let merged = exps.len() > 1;
            let exp = Expr::add(exps);
            let p = if merged { Expr::pow(base, exp) } else { Expr::pow_raw_or(base, exp) };
            match p {
                Expr::Num(n) => coeff = coeff * n,
                Expr::Mul(_) => {
                    needs_pass = true;
                    others.push(p);
                }
                other => {
                    if !other.is_one() {
                        others.push(other);
                    }
                }
            }
        }

        if needs_pass {
            others.insert(0, Expr::Num(coeff));
            return Expr::mul(others);
        }
        if coeff.is_zero() {
            return Expr::zero();
        }
        if inf {
            // oo absorbs the magnitude of the coefficient, only its sign survives
            coeff = if coeff.is_negative() { Number::int(-1) } else { Number::int(1) };
        }

        others.sort();
        if others.is_empty() {
            return Expr::Num(coeff);
        }
        if coeff.is_one() {
            if others.len() == 1 {
                return others.remove(0);
            }
            return Expr::Mul(others);
        }
        if others.len() == 1 {
            if let Expr::Add(terms) = &others[0] {
                // A bare number distributes over a single sum: 2*(x + 1) -> 2*x + 2
                let terms = terms.clone();
                return Expr::add(terms.into_iter().map(|t| Expr::mul(vec![Expr::Num(coeff), t])).collect());
            }
        }
        others.insert(0, Expr::Num(coeff));
        Expr::Mul(others)
    }

    /// Product that keeps a numeric coefficient in front of a sum instead of distributing it.
    pub fn mul_keep_coeff(coeff: Number, body: Expr) -> Expr {
        if coeff.is_one() {
            return body;
        }
        match body {
            Expr::Add(_) => Expr::Mul(vec![Expr::Num(coeff), body]),
            Expr::Mul(mut fs) if !fs[0].is_number() && fs.iter().any(|f| matches!(f, Expr::Add(_))) => {
                fs.insert(0, Expr::Num(coeff));
                Expr::Mul(fs)
            }
            other => Expr::mul(vec![Expr::Num(coeff), other]),
        }
    }

    // An unmerged factor only needs the cheap identities; a full pow() would
    // re-run numeric root extraction on already reduced surds.
    fn pow_raw_or(base: Expr, exp: Expr) -> Expr {
        if exp.is_one() {
            return base;
        }
        if let (Expr::Num(_), Expr::Num(_)) = (&base, &exp) {
            return Expr::pow(base, exp);
        }
        Expr::Pow(Box::new(base), Box::new(exp))
    }

    pub fn pow(base: Expr, exp: Expr) -> Expr {
        if base.is_const(Constant::NaN) || exp.is_const(Constant::NaN) {
            return Expr::nan();
        }
        if exp.is_zero() {
            return Expr::one();
        }
        if exp.is_one() {
            return base;
        }
        if base.is_one() {
            return Expr::one();
        }

        match (&base, &exp) {
            (Expr::Num(b), Expr::Num(e)) => return Expr::pow_number(*b, *e),
            (Expr::Const(Constant::I), Expr::Num(e)) if e.is_integer() => {
                let k = e.as_integer().unwrap_or(0).rem_euclid(4);
                return match k {
                    0 => Expr::one(),
                    1 => Expr::Const(Constant::I),
                    2 => Expr::int(-1),
                    _ => Expr::neg(Expr::Const(Constant::I)),
                };
            }
            (Expr::Const(Constant::E), Expr::Func(Func::Log, a)) => return (**a).clone(),
            (Expr::Const(Constant::Infinity), Expr::Num(e)) => {
                return if e.is_positive() { base } else { Expr::zero() };
            }
            (Expr::Pow(b, e1), Expr::Num(e)) if e.is_integer() => {
                return Expr::pow((**b).clone(), Expr::mul(vec![(**e1).clone(), exp.clone()]));
            }
            (Expr::Mul(fs), Expr::Num(e)) if e.is_integer() => {
                return Expr::mul(fs.iter().map(|f| Expr::pow(f.clone(), exp.clone())).collect());
            }
            _ => {}
        }

        Expr::Pow(Box::new(base), Box::new(exp))
    }

    fn pow_number(b: Number, e: Number) -> Expr {
        if let Some(k) = e.as_integer() {
            return match b.pow_int(k) {
                Some(n) => Expr::Num(n),
                None => Expr::Const(Constant::ComplexInfinity),
            };
        }
        if b.is_zero() {
            return if e.is_positive() { Expr::zero() } else { Expr::Const(Constant::ComplexInfinity) };
        }
        if b.is_float() || e.is_float() {
            let (bf, ef) = (b.to_f64(), e.to_f64());
            if bf >= 0.0 {
                return Expr::Num(b.approx_with(&e, bf.powf(ef)));
            }
            if e == Number::Rational(1, 2) || (ef - 0.5).abs() < f64::EPSILON {
                return Expr::mul(vec![Expr::Const(Constant::I), Expr::Num(b.approx_with(&e, (-bf).sqrt()))]);
            }
            return Expr::Pow(Box::new(Expr::Num(b)), Box::new(Expr::Num(e)));
        }

        let (p, q) = match (e.numer(), e.denom()) {
            (Some(p), Some(q)) => (p, q),
            _ => return Expr::Pow(Box::new(Expr::Num(b)), Box::new(Expr::Num(e))),
        };
        let (bn, bd) = match (b.numer(), b.denom()) {
            (Some(n), Some(d)) => (n, d),
            _ => return Expr::Pow(Box::new(Expr::Num(b)), Box::new(Expr::Num(e))),
        };

        if q == 2 {
            // b^(p/2) = b^k * sqrt(b) with p = 2k + 1
            let k = p.div_euclid(2);
            let whole = match b.pow_int(k) {
                Some(n) => n,
                None => return Expr::Const(Constant::ComplexInfinity),
            };
            // sqrt(n/d) = sqrt(n*d)/d
            let m = match bn.checked_mul(bd) {
                Some(m) => m,
                None => return Expr::Pow(Box::new(Expr::Num(b)), Box::new(Expr::Num(e))),
            };
            let negative = m < 0;
            let (outside, inside) = split_square(m.abs());
            let scale = Number::rational(outside, bd).unwrap_or(Number::int(1));

            let mut factors = vec![Expr::Num(whole * scale)];
            if inside != 1 {
                factors.push(Expr::Pow(Box::new(Expr::int(inside)), Box::new(Expr::rational(1, 2))));
            }
            if negative {
                factors.push(Expr::Const(Constant::I));
            }
            if k == 0 && bd == 1 && outside == 1 && !negative {
                return Expr::Pow(Box::new(Expr::int(inside)), Box::new(Expr::rational(1, 2)));
            }
            return Expr::mul(factors);
        }

        if let Ok(qu) = u32::try_from(q) {
            if let (Some(rn), Some(rd)) = (exact_root(bn, qu), exact_root(bd, qu)) {
                if let Some(root) = Number::rational(rn, rd) {
                    if let Some(v) = root.pow_int(p) {
                        return Expr::Num(v);
                    }
                }
            }
        }
        Expr::Pow(Box::new(Expr::Num(b)), Box::new(Expr::Num(e)))
    }

    pub fn func(f: Func, arg: Expr) -> Expr {
        if arg.is_const(Constant::NaN) {
            return Expr::nan();
        }
        if let Expr::Num(Number::Float(v)) = arg {
            let out = f.eval_f64(v);
            if out.is_finite() {
                return Expr::Num(Number::float(out));
            }
        }

        let is_pi = arg.is_const(Constant::Pi);
        let minus = arg.is_negative_term();
        match f {
            Func::Sin | Func::Tan | Func::Asin | Func::Atan | Func::Sinh | Func::Tanh => {
                if arg.is_zero() || (is_pi && matches!(f, Func::Sin | Func::Tan)) {
                    return Expr::zero();
                }
                if arg.is_one() && f == Func::Asin {
                    return Expr::mul(vec![Expr::rational(1, 2), Expr::Const(Constant::Pi)]);
                }
                if arg.is_one() && f == Func::Atan {
                    return Expr::mul(vec![Expr::rational(1, 4), Expr::Const(Constant::Pi)]);
                }
                if minus {
                    // odd functions
                    return Expr::neg(Expr::func(f, Expr::neg(arg)));
                }
            }
            Func::Cos | Func::Cosh => {
                if arg.is_zero() {
                    return Expr::one();
                }
                if is_pi && f == Func::Cos {
                    return Expr::int(-1);
                }
                if minus {
                    return Expr::func(f, Expr::neg(arg));
                }
            }
            Func::Acos => {
                if arg.is_one() {
                    return Expr::zero();
                }
                if arg.is_zero() {
                    return Expr::mul(vec![Expr::rational(1, 2), Expr::Const(Constant::Pi)]);
                }
            }
            Func::Log => {
                if arg.is_one() {
                    return Expr::zero();
                }
                if arg.is_const(Constant::E) {
                    return Expr::one();
                }
                if arg.is_zero() {
                    return Expr::Const(Constant::ComplexInfinity);
                }
                if arg.is_const(Constant::Infinity) {
                    return arg;
                }
            }
            Func::Abs => {
                if let Expr::Num(n) = &arg {
                    return Expr::Num(n.abs());
                }
                if minus {
                    return Expr::func(f, Expr::neg(arg));
                }
            }
        }
        Expr::Func(f, Box::new(arg))
    }

    pub fn neg(e: Expr) -> Expr {
        Expr::mul(vec![Expr::int(-1), e])
    }

    pub fn sub(a: Expr, b: Expr) -> Expr {
        Expr::add(vec![a, Expr::neg(b)])
    }

    pub fn div(a: Expr, b: Expr) -> Expr {
        Expr::mul(vec![a, Expr::pow(b, Expr::int(-1))])
    }

    pub fn exp(arg: Expr) -> Expr {
        Expr::pow(Expr::Const(Constant::E), arg)
    }

    pub fn sqrt(arg: Expr) -> Expr {
        Expr::pow(arg, Expr::rational(1, 2))
    }

    pub fn log(arg: Expr) -> Expr {
        Expr::func(Func::Log, arg)
    }
}

// =============================================================================
// Substitution and numeric evaluation
// =============================================================================

impl Expr {
    /// Replace every occurrence of the symbol `var` by `value`, re-canonicalizing bottom-up.
    pub fn subs(&self, var: &str, value: &Expr) -> Expr {
        match self {
            Expr::Sym(s) if s == var => value.clone(),
            Expr::Num(_) | Expr::Const(_) | Expr::Sym(_) => self.clone(),
            Expr::Add(ts) => Expr::add(ts.iter().map(|t| t.subs(var, value)).collect()),
            Expr::Mul(fs) => Expr::mul(fs.iter().map(|f| f.subs(var, value)).collect()),
            Expr::Pow(b, e) => Expr::pow(b.subs(var, value), e.subs(var, value)),
            Expr::Func(f, a) => Expr::func(*f, a.subs(var, value)),
        }
    }

    /// Rebuild with `f` applied to each direct child.
    pub fn map_children(&self, f: &dyn Fn(&Expr) -> Expr) -> Expr {
        match self {
            Expr::Num(_) | Expr::Const(_) | Expr::Sym(_) => self.clone(),
            Expr::Add(ts) => Expr::add(ts.iter().map(f).collect()),
            Expr::Mul(fs) => Expr::mul(fs.iter().map(f).collect()),
            Expr::Pow(b, e) => Expr::pow(f(b), f(e)),
            Expr::Func(func, a) => Expr::func(*func, f(a)),
        }
    }

    /// Real value with `var` bound to `x`. `None` when a symbol is unbound or the value is complex.
    pub fn eval_real(&self, var: &str, x: f64) -> Option<f64> {
        let v = match self {
            Expr::Num(n) => n.to_f64(),
            Expr::Const(Constant::Pi) => std::f64::consts::PI,
            Expr::Const(Constant::E) => std::f64::consts::E,
            Expr::Const(_) => return None,
            Expr::Sym(s) if s == var => x,
            Expr::Sym(_) => return None,
            Expr::Add(ts) => {
                let mut acc = 0.0;
                for t in ts {
                    acc += t.eval_real(var, x)?;
                }
                acc
            }
            Expr::Mul(fs) => {
                let mut acc = 1.0;
                for f in fs {
                    acc *= f.eval_real(var, x)?;
                }
                acc
            }
            Expr::Pow(b, e) => b.eval_real(var, x)?.powf(e.eval_real(var, x)?),
            Expr::Func(f, a) => f.eval_f64(a.eval_real(var, x)?),
        };
        if v.is_nan() {
            None
        } else {
            Some(v)
        }
    }

    /// Complex value of a closed-form constant expression, as `(re, im)`.
    pub fn eval_complex(&self) -> Option<(f64, f64)> {
        match self {
            Expr::Num(n) => Some((n.to_f64(), 0.0)),
            Expr::Const(Constant::Pi) => Some((std::f64::consts::PI, 0.0)),
            Expr::Const(Constant::E) => Some((std::f64::consts::E, 0.0)),
            Expr::Const(Constant::I) => Some((0.0, 1.0)),
            Expr::Const(_) | Expr::Sym(_) => None,
            Expr::Add(ts) => {
                let mut acc = (0.0, 0.0);
                for t in ts {
                    let (re, im) = t.eval_complex()?;
                    acc = (acc.0 + re, acc.1 + im);
                }
                Some(acc)
            }
            Expr::Mul(fs) => {
                let mut acc = (1.0, 0.0);
                for f in fs {
                    let (re, im) = f.eval_complex()?;
                    acc = (acc.0 * re - acc.1 * im, acc.0 * im + acc.1 * re);
                }
                Some(acc)
            }
            Expr::Pow(b, e) => {
                let (bre, bim) = b.eval_complex()?;
                let (ere, eim) = e.eval_complex()?;
                if eim != 0.0 {
                    return None;
                }
                let r = (bre * bre + bim * bim).sqrt().powf(ere);
                let theta = bim.atan2(bre) * ere;
                Some((r * theta.cos(), r * theta.sin()))
            }
            Expr::Func(f, a) => {
                let (re, im) = a.eval_complex()?;
                if im != 0.0 {
                    return None;
                }
                Some((f.eval_f64(re), 0.0))
            }
        }
    }
}

// =============================================================================
// Canonical ordering
// =============================================================================

impl Expr {
    fn class(&self) -> u8 {
        match self {
            Expr::Num(_) => 0,
            Expr::Const(_) => 1,
            Expr::Sym(_) => 2,
            Expr::Add(_) => 3,
            Expr::Mul(_) => 4,
            Expr::Func(..) => 5,
            Expr::Pow(..) => 6,
        }
    }

    /// Powers sort next to their base, except exponentials which sort last.
    fn power_view(&self) -> Option<(&Expr, &Expr)> {
        match self {
            Expr::Pow(b, e) if !b.is_const(Constant::E) => Some((b, e)),
            _ => None,
        }
    }

    fn cmp_atoms(&self, other: &Expr) -> Ordering {
        self.class().cmp(&other.class()).then_with(|| match (self, other) {
            (Expr::Num(a), Expr::Num(b)) => a.cmp(b),
            (Expr::Const(a), Expr::Const(b)) => a.cmp(b),
            (Expr::Sym(a), Expr::Sym(b)) => a.cmp(b),
            (Expr::Add(a), Expr::Add(b)) | (Expr::Mul(a), Expr::Mul(b)) => a.cmp(b),
            (Expr::Func(fa, a), Expr::Func(fb, b)) => fa.cmp(fb).then_with(|| a.cmp(b)),
            (Expr::Pow(ba, ea), Expr::Pow(bb, eb)) => ba.cmp(bb).then_with(|| ea.cmp(eb)),
            _ => Ordering::Equal,
        })
    }
}

impl Ord for Expr {
    fn cmp(&self, other: &Expr) -> Ordering {
        match (self.power_view(), other.power_view()) {
            (None, None) => self.cmp_atoms(other),
            (Some((b1, e1)), Some((b2, e2))) => b1.cmp(b2).then_with(|| e1.cmp(e2)),
            (Some((b1, e1)), None) => b1.cmp(other).then_with(|| e1.cmp(&Expr::one())),
            (None, Some((b2, e2))) => self.cmp(b2).then_with(|| Expr::one().cmp(e2)),
        }
    }
}

impl PartialOrd for Expr {
    fn partial_cmp(&self, other: &Expr) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
