//! Terminal presentation of reconciliation results.
//!
//! The engine itself is presentation-free; this is the small piece that
//! lets a terminal consumer show marks the same way the editor does.

mod colors;

pub use colors::{render_field, Colorizer};
