use eqr_codec::DecodeError;
use eqr_vm::CompileError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("decode: {0}")]
    Decode(#[from] DecodeError),
    #[error("compile: {0}")]
    Compile(#[from] CompileError),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("serde-json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
