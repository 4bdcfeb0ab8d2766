//! Postcard page composition.
//!
//! Draws the three blocks of one card: postal code, address, and name with
//! its honorific. Block positions come straight from `LayoutConfig`; nothing
//! is moved to make room for long content, so a very long address can reach
//! the name column.

use super::shaper::shape;
use super::validation::{FieldKind, NormalizedRecord, HONORIFIC};
use super::ComposeError;
use crate::config::{BlockLayout, LayoutConfig, TextDirection};
use crate::render::{DrawText, Orientation, PageSink};

/// Printed in front of the postal code.
pub const POSTAL_MARK: char = '〒';
/// Empty slots between the name and the honorific.
pub const HONORIFIC_GAP: usize = 1;

/// Compose one card onto `sink` and finish the page.
///
/// The record is checked before anything is drawn, so a failure never
/// leaves a partial page behind.
pub fn compose<S>(record: &NormalizedRecord, layout: &LayoutConfig, sink: &mut S) -> Result<(), ComposeError>
where
    S: PageSink + ?Sized,
{
    ensure_renderable(record)?;

    let postal = format!("{} {}", POSTAL_MARK, record.postal_code);
    draw_block(&postal, None, &layout.postal_code, layout, record.position, "postal code", sink)?;
    draw_block(
        &record.display_address(),
        None,
        &layout.address,
        layout,
        record.position,
        "address",
        sink,
    )?;
    draw_block(
        &record.name,
        Some(HONORIFIC),
        &layout.name,
        layout,
        record.position,
        "name",
        sink,
    )?;

    sink.new_page()?;
    Ok(())
}

fn ensure_renderable(record: &NormalizedRecord) -> Result<(), ComposeError> {
    let fields = [
        (FieldKind::Name, &record.name),
        (FieldKind::PostalCode, &record.postal_code),
        (FieldKind::Prefecture, &record.prefecture),
        (FieldKind::Address, &record.address),
    ];
    for (field, value) in fields {
        if let Some(c) = value
            .chars()
            .find(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
        {
            return Err(ComposeError::UnsupportedCharacter {
                field,
                code: c as u32,
            });
        }
    }
    Ok(())
}

fn draw_block<S>(
    text: &str,
    suffix: Option<char>,
    block: &BlockLayout,
    layout: &LayoutConfig,
    position: usize,
    label: &str,
    sink: &mut S,
) -> Result<(), ComposeError>
where
    S: PageSink + ?Sized,
{
    match block.direction {
        TextDirection::Horizontal => {
            let line = match suffix {
                Some(suffix) => format!("{} {}", text, suffix),
                None => text.to_string(),
            };
            sink.draw_text(&DrawText {
                x_mm: block.anchor_x_mm,
                y_mm: block.anchor_y_mm,
                text: line,
                size_pt: block.font_size_pt,
                cell_mm: 0.0,
                orientation: Orientation::Horizontal,
            })?;
        }
        TextDirection::Vertical => {
            let slot_mm = layout.slot_pitch_mm(block);
            let mut shaper = shape(text, block.max_column_height, block.column_capacity);
            if let Some(suffix) = suffix {
                shaper = shaper.with_suffix(suffix, HONORIFIC_GAP);
            }

            for placement in shaper.by_ref() {
                if placement.is_blank() {
                    continue;
                }
                sink.draw_text(&DrawText {
                    x_mm: block.anchor_x_mm - placement.column as f64 * block.column_pitch_mm,
                    y_mm: block.anchor_y_mm + placement.row as f64 * slot_mm,
                    text: placement.glyph,
                    size_pt: block.font_size_pt,
                    cell_mm: slot_mm,
                    orientation: if placement.upright {
                        Orientation::Upright
                    } else {
                        Orientation::Vertical
                    },
                })?;
            }

            if shaper.is_overflowing() {
                log::warn!(
                    "Row {}: {} needs {} columns but the layout has room for {}",
                    position,
                    label,
                    shaper.columns_used(),
                    block.column_capacity
                );
            }
        }
    }
    Ok(())
}
