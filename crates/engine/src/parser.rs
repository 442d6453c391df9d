// Expression parser - converts math text into a canonical Expr
// Supports: integers, decimals, symbols, + - * / ^ (and ** as ^), parentheses,
// the constants pi, E, I, oo and single-argument elementary functions.
// Precedence follows the usual calculator rules: unary minus binds looser than ^,
// so -x^2 is -(x^2), and ^ is right-associative.

use crate::error::{SymbolicError, SymbolicResult};
use crate::expr::{Constant, Expr, Func};
use crate::number::Number;

/// Deepest nesting of parentheses, function arguments and exponents accepted.
const MAX_DEPTH: usize = 64;

const FUNCTION_NAMES: [&str; 15] = [
    "sin", "cos", "tan", "asin", "acos", "atan", "sinh", "cosh", "tanh", "log", "ln", "Abs", "abs", "exp", "sqrt",
];

/// Parse an expression string. Rejects empty input, unknown functions, unbalanced
/// parentheses, bare function names, nesting deeper than 64 levels and juxtaposed
/// operands (`2x`); never returns a partial expression.
pub fn parse(input: &str) -> SymbolicResult<Expr> {
    let tokens = tokenize(input).map_err(SymbolicError::Parse)?;
    if tokens.is_empty() {
        return Err(SymbolicError::Parse("Empty expression".to_string()));
    }
    let (expr, pos) = parse_sum(&tokens, 0, 0).map_err(SymbolicError::Parse)?;
    if pos < tokens.len() {
        return Err(SymbolicError::Parse(format!("Unexpected token {:?}", tokens[pos])));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Integer(i64),
    /// Integer literal past i64, kept as an approximation.
    Oversized(f64),
    Decimal(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '+' => {
                tokens.push(Token::Plus);
                chars.next();
            }
            '-' => {
                tokens.push(Token::Minus);
                chars.next();
            }
            '*' => {
                chars.next();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::Caret);
                } else {
                    tokens.push(Token::Star);
                }
            }
            '/' => {
                tokens.push(Token::Slash);
                chars.next();
            }
            '^' => {
                tokens.push(Token::Caret);
                chars.next();
            }
            '(' => {
                tokens.push(Token::LParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RParen);
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut text = String::new();
                let mut is_decimal = false;
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        chars.next();
                    } else if c == '.' && !is_decimal {
                        is_decimal = true;
                        text.push(c);
                        chars.next();
                    } else if (c == 'e' || c == 'E') && !text.is_empty() {
                        // Exponent only when followed by a digit or a signed digit
                        let mut lookahead = chars.clone();
                        lookahead.next();
                        let next = lookahead.peek().copied();
                        let signed = matches!(next, Some('+') | Some('-'));
                        if signed {
                            lookahead.next();
                        }
                        if !matches!(lookahead.peek(), Some(d) if d.is_ascii_digit()) {
                            break;
                        }
                        is_decimal = true;
                        text.push('e');
                        chars.next();
                        if signed {
                            if let Some(s) = chars.next() {
                                text.push(s);
                            }
                        }
                    } else {
                        break;
                    }
                }
                if text == "." {
                    return Err("Invalid number '.'".to_string());
                }
                if is_decimal {
                    let v: f64 = text.parse().map_err(|_| format!("Invalid number: {}", text))?;
                    tokens.push(Token::Decimal(v));
                } else {
                    match text.parse::<i64>() {
                        Ok(n) => tokens.push(Token::Integer(n)),
                        Err(_) => {
                            let v: f64 = text.parse().map_err(|_| format!("Invalid number: {}", text))?;
                            tokens.push(Token::Oversized(v));
                        }
                    }
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            _ => return Err(format!("Unexpected character: {}", c)),
        }
    }

    Ok(tokens)
}

fn parse_sum(tokens: &[Token], pos: usize, depth: usize) -> Result<(Expr, usize), String> {
    let (mut left, mut pos) = parse_product(tokens, pos, depth)?;

    while pos < tokens.len() {
        match tokens[pos] {
            Token::Plus => {
                let (right, next) = parse_product(tokens, pos + 1, depth)?;
                left = Expr::add(vec![left, right]);
                pos = next;
            }
            Token::Minus => {
                let (right, next) = parse_product(tokens, pos + 1, depth)?;
                left = Expr::sub(left, right);
                pos = next;
            }
            _ => break,
        }
    }

    Ok((left, pos))
}

fn parse_product(tokens: &[Token], pos: usize, depth: usize) -> Result<(Expr, usize), String> {
    let (mut left, mut pos) = parse_unary(tokens, pos, depth)?;

    while pos < tokens.len() {
        match tokens[pos] {
            Token::Star => {
                let (right, next) = parse_unary(tokens, pos + 1, depth)?;
                left = Expr::mul(vec![left, right]);
                pos = next;
            }
            Token::Slash => {
                let (right, next) = parse_unary(tokens, pos + 1, depth)?;
                left = Expr::div(left, right);
                pos = next;
            }
            _ => break,
        }
    }

    Ok((left, pos))
}

fn parse_unary(tokens: &[Token], mut pos: usize, depth: usize) -> Result<(Expr, usize), String> {
    // A run of signs collapses to one optional negation
    let mut negate = false;
    loop {
        match tokens.get(pos) {
            Some(Token::Minus) => negate = !negate,
            Some(Token::Plus) => {}
            _ => break,
        }
        pos += 1;
    }

    let (inner, next) = parse_power(tokens, pos, depth)?;
    Ok((if negate { Expr::neg(inner) } else { inner }, next))
}

fn parse_power(tokens: &[Token], pos: usize, depth: usize) -> Result<(Expr, usize), String> {
    let (base, pos) = parse_primary(tokens, pos, depth)?;

    if let Some(Token::Caret) = tokens.get(pos) {
        // Right-associative, and the exponent may carry its own sign: 2^-1
        let (exp, next) = parse_unary(tokens, pos + 1, descend(depth)?)?;
        return Ok((Expr::pow(base, exp), next));
    }

    Ok((base, pos))
}

fn parse_primary(tokens: &[Token], pos: usize, depth: usize) -> Result<(Expr, usize), String> {
    let token = tokens.get(pos).ok_or_else(|| "Unexpected end of expression".to_string())?;

    match token {
        Token::Integer(n) => Ok((Expr::int(*n), pos + 1)),
        Token::Oversized(v) => Ok((Expr::Num(Number::Overflow(*v)), pos + 1)),
        Token::Decimal(v) => Ok((Expr::Num(Number::float(*v)), pos + 1)),
        Token::LParen => {
            let (inner, next) = parse_sum(tokens, pos + 1, descend(depth)?)?;
            match tokens.get(next) {
                Some(Token::RParen) => Ok((inner, next + 1)),
                _ => Err("Missing closing parenthesis".to_string()),
            }
        }
        Token::Ident(name) => {
            if let Some(Token::LParen) = tokens.get(pos + 1) {
                let (arg, next) = parse_sum(tokens, pos + 2, descend(depth)?)?;
                match tokens.get(next) {
                    Some(Token::RParen) => {}
                    _ => return Err(format!("Missing closing parenthesis after {}(", name)),
                }
                let applied = apply_function(name, arg)?;
                return Ok((applied, next + 1));
            }
            if FUNCTION_NAMES.contains(&name.as_str()) {
                return Err(format!("Function {} used without an argument", name));
            }
            Ok((ident_to_expr(name), pos + 1))
        }
        other => Err(format!("Unexpected token {:?}", other)),
    }
}

/// One level deeper into parentheses, a function argument or an exponent.
fn descend(depth: usize) -> Result<usize, String> {
    if depth >= MAX_DEPTH {
        return Err("Expression nested too deeply".to_string());
    }
    Ok(depth + 1)
}

fn ident_to_expr(name: &str) -> Expr {
    match name {
        "pi" => Expr::Const(Constant::Pi),
        "E" => Expr::Const(Constant::E),
        "I" => Expr::Const(Constant::I),
        "oo" => Expr::Const(Constant::Infinity),
        "zoo" => Expr::Const(Constant::ComplexInfinity),
        "nan" => Expr::nan(),
        _ => Expr::Sym(name.to_string()),
    }
}

fn apply_function(name: &str, arg: Expr) -> Result<Expr, String> {
    let func = match name {
        "sin" => Func::Sin,
        "cos" => Func::Cos,
        "tan" => Func::Tan,
        "asin" => Func::Asin,
        "acos" => Func::Acos,
        "atan" => Func::Atan,
        "sinh" => Func::Sinh,
        "cosh" => Func::Cosh,
        "tanh" => Func::Tanh,
        "log" | "ln" => Func::Log,
        "Abs" | "abs" => Func::Abs,
        "exp" => return Ok(Expr::exp(arg)),
        "sqrt" => return Ok(Expr::sqrt(arg)),
        _ => return Err(format!("Unknown function: {}", name)),
    };
    Ok(Expr::func(func, arg))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::sym("x")
    }

    #[test]
    fn test_parse_polynomial() {
        let e = parse("x^2 + 2*x + 1").unwrap();
        let expected = Expr::add(vec![
            Expr::pow(x(), Expr::int(2)),
            Expr::mul(vec![Expr::int(2), x()]),
            Expr::one(),
        ]);
        assert_eq!(e, expected);
    }

    #[test]
    fn test_double_star_is_power() {
        assert_eq!(parse("x**3").unwrap(), parse("x^3").unwrap());
    }

    #[test]
    fn test_unary_minus_binds_looser_than_power() {
        assert_eq!(parse("-x^2").unwrap(), Expr::neg(Expr::pow(x(), Expr::int(2))));
        assert_eq!(parse("2^-1").unwrap(), Expr::rational(1, 2));
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(parse("2^3^2").unwrap(), Expr::int(512));
    }

    #[test]
    fn test_functions_and_constants() {
        assert_eq!(parse("sin(pi)").unwrap(), Expr::zero());
        assert_eq!(parse("exp(x)").unwrap(), Expr::exp(x()));
        assert_eq!(parse("ln(x)").unwrap(), parse("log(x)").unwrap());
        assert_eq!(parse("sqrt(9)").unwrap(), Expr::int(3));
    }

    #[test]
    fn test_decimal_is_float() {
        assert_eq!(parse("0.5").unwrap(), Expr::Num(Number::float(0.5)));
        assert_eq!(parse("1e3").unwrap(), Expr::Num(Number::float(1000.0)));
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(parse("x+").is_err());
        assert!(parse("").is_err());
        assert!(parse("   ").is_err());
        assert!(parse("(x+1").is_err());
        assert!(parse("x+1)").is_err());
        assert!(parse("2x").is_err());
        assert!(parse("foo(x)").is_err());
        assert!(parse("x $ 1").is_err());
    }

    #[test]
    fn test_bare_function_name_rejected() {
        assert!(parse("sin").is_err());
        assert!(parse("x + exp").is_err());
        assert!(parse("sin(x)").is_ok());
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let n = 10_000;
        let text = format!("{}x{}", "(".repeat(n), ")".repeat(n));
        match parse(&text) {
            Err(SymbolicError::Parse(msg)) => assert!(msg.contains("nested too deeply")),
            other => panic!("expected a parse error, got {:?}", other),
        }

        let shallow = format!("{}x{}", "(".repeat(60), ")".repeat(60));
        assert_eq!(parse(&shallow).unwrap(), x());

        let calls = format!("{}x{}", "sin(".repeat(200), ")".repeat(200));
        assert!(parse(&calls).is_err());

        let tower = vec!["x"; 500].join("^");
        assert!(parse(&tower).is_err());
    }

    #[test]
    fn test_long_sign_runs_do_not_recurse() {
        let text = format!("{}x", "-".repeat(200_000));
        assert_eq!(parse(&text).unwrap(), x());
        let text = format!("{}x", "-".repeat(200_001));
        assert_eq!(parse(&text).unwrap(), Expr::neg(x()));
        assert_eq!(parse("+-+x").unwrap(), Expr::neg(x()));
    }

    #[test]
    fn test_oversized_integer_literal() {
        let e = parse("9223372036854775808").unwrap();
        assert!(e.has_overflow());
        assert!(!parse("9223372036854775807").unwrap().has_overflow());
    }
}
