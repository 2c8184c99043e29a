//! ANSI color utilities for reconciliation marks.
//!
//! Marks reuse the colors the IDE tooling shows them in:
//! - Same: green, the copy carries the value
//! - TypeNotMatch: yellow, the value is skipped or converted
//! - Ignored: grey, excluded on purpose
//! - Diff: red, no counterpart at all

use owo_colors::{OwoColorize, Style};

use crate::types::{FieldDescriptor, Mark};

impl Mark {
    /// Terminal style matching `Mark::color`.
    pub fn style(&self) -> Style {
        match self {
            Mark::Same => Style::new().green(),
            Mark::TypeNotMatch => Style::new().yellow(),
            Mark::Ignored => Style::new().bright_black().dimmed(),
            Mark::Diff => Style::new().red().bold(),
        }
    }

    /// `[label]` in the mark's color.
    pub fn render(&self) -> String {
        format!("[{}]", self.label().style(self.style()))
    }

    /// Colorize arbitrary text with this mark's style.
    pub fn paint(&self, s: &str) -> String {
        s.style(self.style()).to_string()
    }
}

/// Colorize pieces of a field line.
pub struct Colorizer;

impl Colorizer {
    /// Type text (cyan)
    pub fn type_name(s: &str) -> String {
        s.cyan().to_string()
    }

    /// Field names (default color)
    pub fn field_name(s: &str) -> String {
        s.to_string()
    }

    pub fn dim(s: &str) -> String {
        s.dimmed().to_string()
    }
}

/// `✅ String name` with the glyph and name in the mark's color.
/// Unmarked fields render without a glyph.
pub fn render_field(field: &FieldDescriptor) -> String {
    let ty = Colorizer::type_name(&field.ty.short_text());
    match field.mark {
        Some(mark) => format!(
            "{}{} {}",
            mark.glyph(),
            ty,
            mark.paint(&Colorizer::field_name(&field.name))
        ),
        None => format!("{} {}", ty, Colorizer::dim(&field.name)),
    }
}
