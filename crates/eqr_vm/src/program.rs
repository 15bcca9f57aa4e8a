use crate::instruction::Instruction;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramMeta {
    /// Ends in an equality comparison of two sides.
    pub is_equation: bool,
    /// Text the program was compiled from.
    pub source: String,
}

/// Compiled, immutable, re-executable instruction sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    pub meta: ProgramMeta,
}

impl Program {
    /// Hand-assembled expression program (not an equation).
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self {
            instructions,
            meta: ProgramMeta {
                is_equation: false,
                source: String::new(),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn disassemble(&self) -> String {
        self.instructions
            .iter()
            .enumerate()
            .map(|(i, ins)| format!("{i:>3}: {ins}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disassembly_is_indexed() {
        let p = Program::new(vec![
            Instruction::Push(3.0),
            Instruction::LoadVar("a".into()),
            Instruction::Add,
            Instruction::Halt,
        ]);
        assert_eq!(p.disassemble(), "  0: PUSH 3\n  1: LOAD a\n  2: ADD\n  3: HALT");
        assert_eq!(p.len(), 4);
        assert!(!p.meta.is_equation);
    }
}
