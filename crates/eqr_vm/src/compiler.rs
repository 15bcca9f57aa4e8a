//! Infix expression / equation compiler (shunting-yard).
//!
//! Tokenizing is lenient: unknown characters, unparsable numbers and
//! non-ASCII identifiers are dropped rather than rejected, since the input
//! is substituted template text. The only compile error is an equation
//! with more than one `=`.

use crate::instruction::Instruction;
use crate::program::{Program, ProgramMeta};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("malformed equation (more than one '='): {0}")]
    MalformedEquation(String),
}

pub type Result<T> = std::result::Result<T, CompileError>;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
}

/// Binary operator characters.
const OPERATORS: &str = "+-*/^";

fn precedence(op: char) -> u8 {
    match op {
        '+' | '-' => 1,
        '*' | '/' => 2,
        '^' => 3,
        _ => 0,
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Stateless; one instance can compile any number of sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compiler;

impl Compiler {
    pub fn new() -> Self {
        Self
    }

    pub fn compile(&self, source: &str) -> Result<Program> {
        let is_equation = source.contains('=');
        let mut instructions = Vec::new();

        if is_equation {
            let sides: Vec<&str> = source.split('=').map(str::trim).collect();
            if sides.len() != 2 {
                return Err(CompileError::MalformedEquation(source.to_string()));
            }
            emit(&to_postfix(tokenize(sides[0])), &mut instructions);
            emit(&to_postfix(tokenize(sides[1])), &mut instructions);
            instructions.push(Instruction::Equal);
        } else {
            emit(&to_postfix(tokenize(source)), &mut instructions);
        }
        instructions.push(Instruction::Halt);

        debug!(source, is_equation, len = instructions.len(), "compiled");
        Ok(Program {
            instructions,
            meta: ProgramMeta {
                is_equation,
                source: source.to_string(),
            },
        })
    }
}

/// Shorthand for `Compiler::new().compile(source)`.
pub fn compile(source: &str) -> Result<Program> {
    Compiler::new().compile(source)
}

fn tokenize(src: &str) -> Vec<Token> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    // Last non-whitespace char seen; decides unary vs binary '-'.
    let mut prev: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            push_number(&chars[start..i], &mut tokens);
        } else if c.is_alphabetic() {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            if is_identifier(&word) {
                tokens.push(Token::Ident(word));
            } else {
                debug!(%word, "dropping non-ascii identifier");
            }
        } else if c == '-' && prev.map_or(true, |p| "+-*/^(".contains(p)) {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            if i - start == 1 {
                // '-' not followed by a literal, e.g. "-x" or "-(": stays an operator
                tokens.push(Token::Op('-'));
            } else {
                push_number(&chars[start..i], &mut tokens);
            }
        } else {
            match c {
                '(' => tokens.push(Token::LParen),
                ')' => tokens.push(Token::RParen),
                _ if OPERATORS.contains(c) => tokens.push(Token::Op(c)),
                _ => {}
            }
            i += 1;
        }
        prev = Some(chars[i - 1]);
    }
    tokens
}

fn push_number(text: &[char], tokens: &mut Vec<Token>) {
    let s: String = text.iter().collect();
    match s.parse::<f64>() {
        Ok(v) => tokens.push(Token::Number(v)),
        Err(_) => debug!(literal = %s, "dropping unparsable number"),
    }
}

fn to_postfix(tokens: Vec<Token>) -> Vec<Token> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut ops: Vec<Token> = Vec::new();

    for tok in tokens {
        match tok {
            Token::Number(_) | Token::Ident(_) => output.push(tok),
            Token::LParen => ops.push(tok),
            Token::RParen => {
                while let Some(top) = ops.pop() {
                    if top == Token::LParen {
                        break;
                    }
                    output.push(top);
                }
            }
            Token::Op(op) => {
                while let Some(Token::Op(top)) = ops.last() {
                    if precedence(*top) < precedence(op) {
                        break;
                    }
                    if let Some(t) = ops.pop() {
                        output.push(t);
                    }
                }
                ops.push(Token::Op(op));
            }
        }
    }
    while let Some(t) = ops.pop() {
        output.push(t);
    }
    output
}

fn emit(postfix: &[Token], out: &mut Vec<Instruction>) {
    for tok in postfix {
        match tok {
            Token::Number(v) => out.push(Instruction::Push(*v)),
            Token::Ident(name) => out.push(Instruction::LoadVar(name.clone())),
            Token::Op('+') => out.push(Instruction::Add),
            Token::Op('-') => out.push(Instruction::Sub),
            Token::Op('*') => out.push(Instruction::Mul),
            Token::Op('/') => out.push(Instruction::Div),
            Token::Op('^') => out.push(Instruction::Pow),
            // unmatched '(' left on the operator stack
            Token::Op(_) | Token::LParen | Token::RParen => {}
        }
    }
}
