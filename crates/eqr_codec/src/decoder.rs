//! Three-phase payload decoder: header, solutions, exercises.
//!
//! Only header errors reach the caller. Solution errors end the solution
//! phase; exercise errors skip one bit and retry while data remains.

use crate::bits::BitReader;
use crate::elias;
use crate::error::{DecodeError, Result};
use crate::ir::{Exercise, IntermediateRepresentation, RandRange, Solution, Tag};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Opaque format header skipped before the first marker.
    pub header_offset_bits: usize,
    /// Expression text longer than this stops decoding of that expression.
    pub expression_char_cap: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            header_offset_bits: 22,
            expression_char_cap: 500,
        }
    }
}

/// Decodes `bytes` with the default configuration.
pub fn decode(bytes: &[u8]) -> Result<IntermediateRepresentation> {
    Decoder::new(bytes, DecoderConfig::default()).decode()
}

/// How an expression stream stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExprEnd {
    Marker,
    Cap,
    /// Ran out of bits before the end marker.
    Exhausted,
    Error,
}

enum ExerciseStep {
    Parsed(Exercise),
    /// `00` end marker consumed.
    End,
    /// Anything that is not an exercise marker, an empty expression, or data
    /// ending before the tag terminator.
    Stop,
}

/// One-shot decoder; construct a new one per payload.
pub struct Decoder<'a> {
    reader: BitReader<'a>,
    cfg: DecoderConfig,
    ir: IntermediateRepresentation,
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8], cfg: DecoderConfig) -> Self {
        Self {
            reader: BitReader::with_offset(bytes, cfg.header_offset_bits),
            cfg,
            ir: IntermediateRepresentation::default(),
        }
    }

    pub fn decode(mut self) -> Result<IntermediateRepresentation> {
        self.decode_header()?;
        self.decode_solutions();
        self.decode_exercises();
        debug!(
            labels = self.ir.labels.len(),
            generators = self.ir.rand_generators.len(),
            solutions = self.ir.solutions.len(),
            exercises = self.ir.exercises.len(),
            "payload decoded"
        );
        Ok(self.ir)
    }

    // ── header ──────────────────────────────────────────────────────

    fn decode_header(&mut self) -> Result<()> {
        loop {
            match self.reader.read_bits(2)? {
                0b01 => self.decode_label()?,
                0b10 => {
                    let sub_type = self.reader.read_bits(4)?;
                    if sub_type == 0b0000 {
                        self.decode_rand_int()?;
                    } else {
                        debug!(sub_type, "reserved header entry skipped");
                    }
                }
                0b00 => return Ok(()),
                other => return Err(DecodeError::MalformedHeader(other)),
            }
        }
    }

    fn decode_label(&mut self) -> Result<()> {
        let bits = self.reader.read_bits(2)?;
        let text = self.decode_string()?;
        // every 2-bit value maps to a kind
        if let Some(kind) = Tag::from_label_bits(bits) {
            self.ir.labels.insert(kind, text);
        }
        Ok(())
    }

    fn decode_rand_int(&mut self) -> Result<()> {
        let name = self.decode_string()?;
        let min = elias::decode_signed(&mut self.reader)?;
        let max = elias::decode_signed(&mut self.reader)?;
        self.ir.rand_generators.insert(name, RandRange { min, max });
        Ok(())
    }

    // ── solutions ───────────────────────────────────────────────────

    fn decode_solutions(&mut self) {
        while self.reader.has_remaining() && self.reader.next_is(2, 0b01) {
            match self.decode_solution() {
                Ok(Some(solution)) => self.ir.solutions.push(solution),
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, at = self.reader.position(), "solution phase aborted");
                    break;
                }
            }
        }
        if self.reader.has_remaining() && self.reader.next_is(2, 0b00) {
            let _ = self.reader.skip_bits(2);
        }
    }

    fn decode_solution(&mut self) -> Result<Option<Solution>> {
        // solution marker, question prefix, encoding selector
        self.reader.skip_bits(6)?;
        let question = self.decode_ascii()?;
        if !self.reader.has_remaining() {
            return Ok(None);
        }
        // steps prefix, encoding selector
        self.reader.skip_bits(4)?;
        let steps = self.decode_ascii()?;
        let Some(tags) = self.decode_tags()? else {
            return Ok(None);
        };
        self.skip_zero_marker(3)?;
        Ok(Some(Solution {
            question,
            steps,
            tags,
        }))
    }

    // ── exercises ───────────────────────────────────────────────────

    fn decode_exercises(&mut self) {
        while self.reader.has_remaining() {
            match self.decode_exercise() {
                Ok(ExerciseStep::Parsed(exercise)) => self.ir.exercises.push(exercise),
                Ok(ExerciseStep::End) | Ok(ExerciseStep::Stop) => break,
                Err(e) => {
                    if !self.reader.has_remaining() {
                        debug!(error = %e, "exercise phase ended with the buffer");
                        break;
                    }
                    warn!(error = %e, at = self.reader.position(), "resynchronizing exercise stream");
                    if self.reader.skip_bits(1).is_err() {
                        break;
                    }
                }
            }
        }
    }

    fn decode_exercise(&mut self) -> Result<ExerciseStep> {
        match self.reader.peek_bits(2)? {
            0b00 => {
                self.reader.skip_bits(2)?;
                return Ok(ExerciseStep::End);
            }
            0b01 => self.reader.skip_bits(2)?,
            _ => return Ok(ExerciseStep::Stop),
        }

        let prefix = if self.reader.read_bit()? == 1 {
            Some(self.decode_string()?)
        } else {
            None
        };

        let (expr, end) = self.decode_expression();
        if end == ExprEnd::Exhausted {
            debug!(partial = %expr, "exercise truncated by end of data");
            return Ok(ExerciseStep::Stop);
        }
        if expr.trim().is_empty() {
            return Ok(ExerciseStep::Stop);
        }

        let Some(tags) = self.decode_tags()? else {
            return Ok(ExerciseStep::Stop);
        };
        self.skip_zero_marker(3)?;

        let expression = match prefix {
            Some(p) if !p.is_empty() => format!("{p}: {expr}"),
            _ => expr,
        };
        Ok(ExerciseStep::Parsed(Exercise { expression, tags }))
    }

    // ── expressions ─────────────────────────────────────────────────

    fn decode_expression(&mut self) -> (String, ExprEnd) {
        let mut expr = String::new();
        let end = loop {
            if !self.reader.has_remaining() {
                break ExprEnd::Exhausted;
            }
            match self.decode_expr_token(&mut expr) {
                Ok(true) => break ExprEnd::Marker,
                Ok(false) => {}
                Err(e) if e.is_end_of_data() => break ExprEnd::Exhausted,
                Err(e) => {
                    debug!(error = %e, "expression stopped early");
                    break ExprEnd::Error;
                }
            }
            if expr.chars().count() > self.cfg.expression_char_cap {
                break ExprEnd::Cap;
            }
        };
        (expr.trim().to_string(), end)
    }

    /// Appends one token; `Ok(true)` on the end-of-expression marker.
    fn decode_expr_token(&mut self, expr: &mut String) -> Result<bool> {
        let is_operator = self.reader.read_bit()? == 1;
        if is_operator {
            let code = self.reader.read_bits(3)?;
            match code {
                0b110 => return Ok(true),
                0b111 => {
                    let ext = self.reader.read_bits(4)?;
                    match ext {
                        0b1010 => expr.push_str(" ( "),
                        0b1011 => expr.push_str(" ) "),
                        _ => expr.push_str(&format!(" ?ext{ext}? ")),
                    }
                }
                0b000 => expr.push_str(" + "),
                0b001 => expr.push_str(" - "),
                0b010 => expr.push_str(" * "),
                0b011 => expr.push_str(" / "),
                0b100 => expr.push_str(" ^ "),
                0b101 => expr.push_str(" = "),
                _ => expr.push_str(&format!(" ?{code}? ")),
            }
            return Ok(false);
        }

        match self.reader.read_bits(2)? {
            0b00 => {
                let name = self.decode_string()?;
                expr.push_str(&name);
            }
            0b01 => match self.reader.read_bits(2)? {
                0b00 => {
                    let negative = self.reader.read_bit()? == 1;
                    let magnitude = elias::decode_unsigned(&mut self.reader)?;
                    if negative {
                        expr.push('-');
                    }
                    expr.push_str(&magnitude.to_string());
                }
                // boolean and other constant kinds carry no token yet
                _ => {}
            },
            // reserved operand kinds
            _ => {}
        }
        Ok(false)
    }

    // ── tags & strings ──────────────────────────────────────────────

    /// Reads 3-bit codes until the `000` terminator, which is left unread.
    /// Unknown codes are dropped.
    /// Reads tags up to the `000` terminator; `None` when the data ends first.
    fn decode_tags(&mut self) -> Result<Option<Vec<Tag>>> {
        let mut tags = Vec::new();
        loop {
            if !self.reader.has_remaining() {
                debug!(partial = tags.len(), "tag list truncated by end of data");
                return Ok(None);
            }
            if self.reader.peek_bits(3)? == 0b000 {
                return Ok(Some(tags));
            }
            let code = self.reader.read_bits(3)?;
            if let Some(tag) = Tag::from_tag_bits(code) {
                tags.push(tag);
            }
        }
    }

    fn skip_zero_marker(&mut self, n: u32) -> Result<()> {
        if self.reader.has_remaining() && self.reader.next_is(n, 0) {
            self.reader.skip_bits(n)?;
        }
        Ok(())
    }

    fn decode_string(&mut self) -> Result<String> {
        match self.reader.read_bits(2)? {
            0b00 => self.decode_ascii(),
            0b01 => self.decode_utf8(),
            other => Err(DecodeError::MalformedEncoding(other)),
        }
    }

    fn decode_ascii(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            let c = self.reader.read_bits(7)?;
            if c == crate::encode::STRING_END {
                return Ok(out);
            }
            // 7-bit values are always valid scalar values
            out.push(char::from(c as u8));
        }
    }

    fn decode_utf8(&mut self) -> Result<String> {
        let mut bytes = Vec::new();
        loop {
            let b = self.reader.read_bits(8)?;
            if b == crate::encode::STRING_END {
                return Ok(String::from_utf8_lossy(&bytes).into_owned());
            }
            bytes.push(b as u8);
        }
    }
}
