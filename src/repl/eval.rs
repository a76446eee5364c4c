//! The operator command evaluator.
//!
//! Deliberately narrow: assignments (`name = expr`) and expressions over
//! integer, string and boolean values, evaluated against the live call
//! stack's bindings. Operator precedence, low to high: comparisons, shifts,
//! additive, multiplicative, unary minus.

use thiserror::Error;

use crate::bytecode::value::apply_binop;
use crate::bytecode::{BinOp, OpFault, Value};
use crate::vm::CallStack;

/// A failure while evaluating an operator command. Always recovered inside
/// the interactive loop; never propagates to the host program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("name '{name}' is not defined")]
    UnknownName { name: String },

    #[error("bad operand type for unary -: {type_name}")]
    UnaryType { type_name: &'static str },

    #[error(transparent)]
    Op(#[from] OpFault),
}

/// Evaluate one command against the live context.
///
/// Assignments mutate the context in place and yield nothing; a bare
/// expression yields its value for the caller to echo.
pub fn eval_command(input: &str, stack: &mut CallStack) -> Result<Option<Value>, EvalError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(tokens);

    // `name = expr` is an assignment; `name == expr` is a comparison.
    if let Some(name) = parser.peek_assignment_target() {
        parser.bump(); // name
        parser.bump(); // '='
        let expr = parser.parse_expr()?;
        parser.expect_end()?;
        let value = eval_expr(&expr, stack)?;
        stack.assign(&name, value);
        return Ok(None);
    }

    let expr = parser.parse_expr()?;
    parser.expect_end()?;
    Ok(Some(eval_expr(&expr, stack)?))
}

// ── Lexer ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Int(i64),
    Str(String),
    Ident(String),
    True,
    False,
    Op(BinOp),
    Assign,
    Minus,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Tok>, EvalError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(at, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' => {
                let mut end = at;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_digit() {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let text = &input[at..end];
                let n = text
                    .parse::<i64>()
                    .map_err(|_| EvalError::Syntax(format!("integer literal '{}' out of range", text)))?;
                tokens.push(Tok::Int(n));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = at;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(match &input[at..end] {
                    "true" => Tok::True,
                    "false" => Tok::False,
                    ident => Tok::Ident(ident.to_string()),
                });
            }
            quote @ ('"' | '\'') => {
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                for (_, d) in chars.by_ref() {
                    if d == quote {
                        closed = true;
                        break;
                    }
                    text.push(d);
                }
                if !closed {
                    return Err(EvalError::Syntax("unterminated string literal".into()));
                }
                tokens.push(Tok::Str(text));
            }
            '(' => {
                chars.next();
                tokens.push(Tok::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Tok::RParen);
            }
            '+' => {
                chars.next();
                tokens.push(Tok::Op(BinOp::Add));
            }
            '-' => {
                chars.next();
                tokens.push(Tok::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Tok::Op(BinOp::Mul));
            }
            '/' => {
                chars.next();
                tokens.push(Tok::Op(BinOp::Div));
            }
            '%' => {
                chars.next();
                tokens.push(Tok::Op(BinOp::Mod));
            }
            '<' | '>' | '=' | '!' => {
                chars.next();
                let followed_eq = matches!(chars.peek(), Some(&(_, '=')));
                let doubled = matches!(chars.peek(), Some(&(_, d)) if d == c);
                let tok = match (c, followed_eq, doubled) {
                    ('<', true, _) => Tok::Op(BinOp::Le),
                    ('>', true, _) => Tok::Op(BinOp::Ge),
                    ('=', true, _) => Tok::Op(BinOp::Eq),
                    ('!', true, _) => Tok::Op(BinOp::Ne),
                    ('<', _, true) => Tok::Op(BinOp::Shl),
                    ('>', _, true) => Tok::Op(BinOp::Shr),
                    ('<', false, false) => Tok::Op(BinOp::Lt),
                    ('>', false, false) => Tok::Op(BinOp::Gt),
                    ('=', false, false) => Tok::Assign,
                    _ => return Err(EvalError::Syntax(format!("unexpected character '{}'", c))),
                };
                if followed_eq || doubled {
                    chars.next();
                }
                tokens.push(tok);
            }
            other => {
                return Err(EvalError::Syntax(format!("unexpected character '{}'", other)));
            }
        }
    }

    Ok(tokens)
}

// ── Parser ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Name(String),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

struct Parser {
    tokens: Vec<Tok>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Tok>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    /// `Some(name)` iff the input starts `name =` (assignment, not `==`).
    fn peek_assignment_target(&self) -> Option<String> {
        match (self.tokens.first(), self.tokens.get(1)) {
            (Some(Tok::Ident(name)), Some(Tok::Assign)) => Some(name.clone()),
            _ => None,
        }
    }

    fn expect_end(&self) -> Result<(), EvalError> {
        match self.peek() {
            None => Ok(()),
            Some(tok) => Err(EvalError::Syntax(format!("unexpected trailing {:?}", tok))),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, EvalError> {
        self.parse_binary(0)
    }

    // Precedence tiers, low to high.
    fn tier(op: BinOp) -> usize {
        match op {
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => 0,
            BinOp::Shl | BinOp::Shr => 1,
            BinOp::Add | BinOp::Sub => 2,
            BinOp::Mul | BinOp::Div | BinOp::Mod => 3,
        }
    }

    fn parse_binary(&mut self, min_tier: usize) -> Result<Expr, EvalError> {
        if min_tier > 3 {
            return self.parse_unary();
        }
        let mut lhs = self.parse_binary(min_tier + 1)?;
        loop {
            let op = match self.peek() {
                Some(&Tok::Op(op)) if Self::tier(op) == min_tier => op,
                // '-' lexes as Minus so unary negation stays unambiguous.
                Some(Tok::Minus) if Self::tier(BinOp::Sub) == min_tier => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.bump();
            let rhs = self.parse_binary(min_tier + 1)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        if matches!(self.peek(), Some(Tok::Minus)) {
            self.bump();
            return Ok(Expr::Neg(Box::new(self.parse_unary()?)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Expr, EvalError> {
        match self.bump() {
            Some(Tok::Int(n)) => Ok(Expr::Literal(Value::Int(n))),
            Some(Tok::Str(s)) => Ok(Expr::Literal(Value::Str(s))),
            Some(Tok::True) => Ok(Expr::Literal(Value::Bool(true))),
            Some(Tok::False) => Ok(Expr::Literal(Value::Bool(false))),
            Some(Tok::Ident(name)) => Ok(Expr::Name(name)),
            Some(Tok::LParen) => {
                let expr = self.parse_expr()?;
                match self.bump() {
                    Some(Tok::RParen) => Ok(expr),
                    _ => Err(EvalError::Syntax("expected ')'".into())),
                }
            }
            Some(tok) => Err(EvalError::Syntax(format!("unexpected {:?}", tok))),
            None => Err(EvalError::Syntax("unexpected end of input".into())),
        }
    }
}

fn eval_expr(expr: &Expr, stack: &CallStack) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Name(name) => stack
            .lookup(name)
            .ok_or_else(|| EvalError::UnknownName { name: name.clone() }),
        Expr::Neg(inner) => match eval_expr(inner, stack)? {
            Value::Int(n) => Ok(Value::Int(n.checked_neg().ok_or(OpFault::Overflow {
                op: BinOp::Sub,
            })?)),
            other => Err(EvalError::UnaryType {
                type_name: other.type_name(),
            }),
        },
        Expr::Binary(op, lhs, rhs) => {
            let lhs = eval_expr(lhs, stack)?;
            let rhs = eval_expr(rhs, stack)?;
            Ok(apply_binop(*op, &lhs, &rhs)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_with(names: &[(&str, Value)]) -> CallStack {
        let mut stack = CallStack::new();
        for (name, value) in names {
            stack.globals_mut().insert(name.to_string(), value.clone());
        }
        stack
    }

    fn eval(input: &str, stack: &mut CallStack) -> Result<Option<Value>, EvalError> {
        eval_command(input, stack)
    }

    #[test]
    fn arithmetic_and_precedence() {
        let mut s = stack_with(&[]);
        assert_eq!(eval("1 + 2 * 3", &mut s), Ok(Some(Value::Int(7))));
        assert_eq!(eval("(1 + 2) * 3", &mut s), Ok(Some(Value::Int(9))));
        assert_eq!(eval("1 << 2 + 1", &mut s), Ok(Some(Value::Int(8))));
        assert_eq!(eval("1 + 2 == 3", &mut s), Ok(Some(Value::Bool(true))));
        assert_eq!(eval("-2 * 3", &mut s), Ok(Some(Value::Int(-6))));
        assert_eq!(eval("5 - - 3", &mut s), Ok(Some(Value::Int(8))));
    }

    #[test]
    fn name_lookup_and_assignment() {
        let mut s = stack_with(&[("a", Value::Int(42))]);
        assert_eq!(eval("a << 1", &mut s), Ok(Some(Value::Int(84))));
        assert_eq!(eval("b = a + 1", &mut s), Ok(None));
        assert_eq!(eval("b", &mut s), Ok(Some(Value::Int(43))));
    }

    #[test]
    fn unknown_name_is_reported() {
        let mut s = stack_with(&[]);
        assert_eq!(
            eval("missing + 1", &mut s),
            Err(EvalError::UnknownName { name: "missing".into() })
        );
    }

    #[test]
    fn strings_and_bools() {
        let mut s = stack_with(&[]);
        assert_eq!(
            eval("'ab' + \"cd\"", &mut s),
            Ok(Some(Value::Str("abcd".into())))
        );
        assert_eq!(eval("true != false", &mut s), Ok(Some(Value::Bool(true))));
    }

    #[test]
    fn faults_are_eval_errors() {
        let mut s = stack_with(&[]);
        assert_eq!(eval("1 / 0", &mut s), Err(EvalError::Op(OpFault::DivisionByZero)));
        assert!(matches!(eval("1 +", &mut s), Err(EvalError::Syntax(_))));
        assert!(matches!(eval("1 ) 2", &mut s), Err(EvalError::Syntax(_))));
        assert!(matches!(eval("@", &mut s), Err(EvalError::Syntax(_))));
    }

    #[test]
    fn assignment_is_not_equality() {
        let mut s = stack_with(&[("a", Value::Int(1))]);
        assert_eq!(eval("a == 1", &mut s), Ok(Some(Value::Bool(true))));
        assert_eq!(eval("a = 2", &mut s), Ok(None));
        assert_eq!(eval("a", &mut s), Ok(Some(Value::Int(2))));
    }
}
