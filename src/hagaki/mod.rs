//! Hagaki module - the postcard layout core.
//!
//! - `validation` - field checks and placeholder substitution
//! - `shaper` - vertical text shaping into glyph placements
//! - `composer` - placement of the three blocks on the card
//! - `common` - unit conversion and formatting helpers

pub mod common;
pub mod composer;
pub mod shaper;
pub mod validation;

pub use composer::{compose, HONORIFIC_GAP, POSTAL_MARK};
pub use shaper::{shape, GlyphPlacement, VerticalShaper};
pub use validation::{
    validate, DefectKind, FieldDefect, FieldDefects, FieldKind, NormalizedRecord, HONORIFIC,
};

use thiserror::Error;

use crate::render::WriterError;

/// Errors that can occur while composing one card.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("{field} contains unsupported control character U+{code:04X}")]
    UnsupportedCharacter { field: FieldKind, code: u32 },
    #[error("writer rejected a draw call: {0}")]
    Writer(#[from] WriterError),
}
