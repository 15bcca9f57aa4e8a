//! eQR VM - compiles arithmetic expressions and equations to a small stack
//! VM and executes them under a step ceiling.
//!
//! - Closed instruction set (`Instruction`), exhaustively matched by the executor
//! - Shunting-yard compiler with `+ -` < `* /` < `^` precedence
//! - VM failures come back as values, never panics

pub mod compiler;
pub mod exec;
pub mod instruction;
pub mod program;

pub use compiler::{compile, CompileError, Compiler};
pub use exec::{Bindings, Evaluation, ExecError, ExecutionResult, Vm, VmConfig};
pub use instruction::Instruction;
pub use program::{Program, ProgramMeta};
