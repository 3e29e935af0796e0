//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, status bar and overlays
//! - `input`: keyboard event handling
//! - `styles`: color palette and text styling
//! - `garage` / `detail`: content of the two views

pub mod detail;
pub mod garage;
pub mod input;
pub mod render;
pub mod styles;
