//! Intermediate representation produced by one decode call.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation category. Used both as a label key and as an exercise/solution tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tag {
    Minus,
    Plus,
    Star,
    MoreOperands,
}

/// Labels are keyed by the same four categories as tags.
pub type LabelKind = Tag;

impl Tag {
    pub const ALL: [Tag; 4] = [Tag::Minus, Tag::Plus, Tag::Star, Tag::MoreOperands];

    /// 2-bit label selector: 00/01/10/11.
    pub fn from_label_bits(bits: u32) -> Option<Tag> {
        match bits {
            0b00 => Some(Tag::Minus),
            0b01 => Some(Tag::Plus),
            0b10 => Some(Tag::Star),
            0b11 => Some(Tag::MoreOperands),
            _ => None,
        }
    }

    pub fn label_bits(self) -> u32 {
        match self {
            Tag::Minus => 0b00,
            Tag::Plus => 0b01,
            Tag::Star => 0b10,
            Tag::MoreOperands => 0b11,
        }
    }

    /// 3-bit tag code: 001..100. `000` is the list terminator.
    pub fn from_tag_bits(bits: u32) -> Option<Tag> {
        match bits {
            0b001 => Some(Tag::Minus),
            0b010 => Some(Tag::Plus),
            0b011 => Some(Tag::Star),
            0b100 => Some(Tag::MoreOperands),
            _ => None,
        }
    }

    pub fn tag_bits(self) -> u32 {
        match self {
            Tag::Minus => 0b001,
            Tag::Plus => 0b010,
            Tag::Star => 0b011,
            Tag::MoreOperands => 0b100,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Minus => "MINUS",
            Tag::Plus => "PLUS",
            Tag::Star => "STAR",
            Tag::MoreOperands => "MORE_OPERANDS",
        }
    }

    /// Lowercase token standing in for this label inside exercise templates.
    pub fn placeholder(self) -> &'static str {
        match self {
            Tag::Minus => "minus",
            Tag::Plus => "plus",
            Tag::Star => "star",
            Tag::MoreOperands => "more_operands",
        }
    }

    pub fn parse(s: &str) -> Option<Tag> {
        Tag::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive integer range for a random variable. `min <= max` is not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandRange {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub question: String,
    pub steps: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    /// Template text, optionally `"<prefix>: <expr>"`.
    pub expression: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntermediateRepresentation {
    /// Payload order is kept: label substitution walks labels in this order.
    pub labels: IndexMap<LabelKind, String>,
    /// Payload order is kept: variable substitution walks generators in this order.
    pub rand_generators: IndexMap<String, RandRange>,
    pub solutions: Vec<Solution>,
    pub exercises: Vec<Exercise>,
}

impl IntermediateRepresentation {
    /// True when nothing at all was recovered from the payload.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
            && self.rand_generators.is_empty()
            && self.solutions.is_empty()
            && self.exercises.is_empty()
    }
}
