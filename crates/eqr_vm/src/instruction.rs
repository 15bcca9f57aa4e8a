use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    // stack
    Push(f64),
    Pop,
    Dup,
    Swap,

    // arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Neg,

    // comparison, results are 1.0 / 0.0
    Equal,
    NotEqual,
    Greater,
    Less,

    // variables
    LoadVar(String),
    StoreVar(String),

    /// Absolute instruction address.
    Jump(usize),
    /// Pops the condition; jumps when it is 0.0.
    JumpIfFalse(usize),
    /// Pops the condition; jumps when it is not 0.0.
    JumpIfTrue(usize),

    Halt,
    Nop,
}

impl Instruction {
    /// Disassembly mnemonic without operands.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Push(_) => "PUSH",
            Instruction::Pop => "POP",
            Instruction::Dup => "DUP",
            Instruction::Swap => "SWAP",
            Instruction::Add => "ADD",
            Instruction::Sub => "SUB",
            Instruction::Mul => "MUL",
            Instruction::Div => "DIV",
            Instruction::Pow => "POW",
            Instruction::Neg => "NEG",
            Instruction::Equal => "EQ",
            Instruction::NotEqual => "NEQ",
            Instruction::Greater => "GT",
            Instruction::Less => "LT",
            Instruction::LoadVar(_) => "LOAD",
            Instruction::StoreVar(_) => "STORE",
            Instruction::Jump(_) => "JMP",
            Instruction::JumpIfFalse(_) => "JF",
            Instruction::JumpIfTrue(_) => "JT",
            Instruction::Halt => "HALT",
            Instruction::Nop => "NOP",
        }
    }

    /// Operands this instruction needs on the stack before it runs.
    pub fn min_stack(&self) -> usize {
        match self {
            Instruction::Push(_)
            | Instruction::LoadVar(_)
            | Instruction::Jump(_)
            | Instruction::Halt
            | Instruction::Nop => 0,
            Instruction::Pop
            | Instruction::Dup
            | Instruction::Neg
            | Instruction::StoreVar(_)
            | Instruction::JumpIfFalse(_)
            | Instruction::JumpIfTrue(_) => 1,
            Instruction::Swap
            | Instruction::Add
            | Instruction::Sub
            | Instruction::Mul
            | Instruction::Div
            | Instruction::Pow
            | Instruction::Equal
            | Instruction::NotEqual
            | Instruction::Greater
            | Instruction::Less => 2,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.mnemonic();
        match self {
            Instruction::Push(v) => write!(f, "{m} {v}"),
            Instruction::LoadVar(name) | Instruction::StoreVar(name) => write!(f, "{m} {name}"),
            Instruction::Jump(a) | Instruction::JumpIfFalse(a) | Instruction::JumpIfTrue(a) => {
                write!(f, "{m} {a}")
            }
            _ => f.write_str(m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_operands() {
        assert_eq!(Instruction::Push(2.5).to_string(), "PUSH 2.5");
        assert_eq!(Instruction::Push(-3.0).to_string(), "PUSH -3");
        assert_eq!(Instruction::LoadVar("x".into()).to_string(), "LOAD x");
        assert_eq!(Instruction::JumpIfFalse(7).to_string(), "JF 7");
        assert_eq!(Instruction::NotEqual.to_string(), "NEQ");
    }

    #[test]
    fn arity_table() {
        assert_eq!(Instruction::Push(1.0).min_stack(), 0);
        assert_eq!(Instruction::Neg.min_stack(), 1);
        assert_eq!(Instruction::Swap.min_stack(), 2);
        assert_eq!(Instruction::Less.min_stack(), 2);
    }
}
