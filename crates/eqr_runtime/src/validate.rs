use crate::error::{Result, RuntimeError};
use eqr_codec::{Decoder, DecoderConfig, IntermediateRepresentation};
use tracing::warn;

/// Shorter buffers cannot hold the header and the three phase markers.
pub const MIN_PAYLOAD_LEN: usize = 4;

/// Decodes `bytes` and rejects anything a session could not use.
pub fn validate_payload(bytes: &[u8], cfg: &DecoderConfig) -> Result<IntermediateRepresentation> {
    if bytes.len() < MIN_PAYLOAD_LEN {
        return Err(RuntimeError::InvalidPayload(format!(
            "too short: {} bytes",
            bytes.len()
        )));
    }
    let ir = Decoder::new(bytes, *cfg).decode().map_err(|e| {
        warn!(error = %e, "payload rejected");
        RuntimeError::InvalidPayload(format!("not a valid payload: {e}"))
    })?;
    if ir.is_empty() {
        return Err(RuntimeError::InvalidPayload("no content recovered".into()));
    }
    Ok(ir)
}
