//! UI module - text rendering of dashboard screens.
//!
//! Rendering is split the same way a screen is built:
//! - `layout.rs`: column width negotiation
//! - `table.rs`: cells, sorting and table rendering
//! - `component.rs`: labels, banners, spacers and tables as one enum
//! - `pipeline.rs`: width clamping and ordered rendering of a screen
//! - `screens.rs`: domain data to components
//! - `terminal.rs` / `keys.rs`: the terminal itself

mod component;
mod layout;
mod pipeline;
mod table;

pub mod keys;
pub mod screens;
pub mod terminal;

pub use component::{Banner, BannerStyle, Component, Label, LabelBuilder, RenderError};
pub use layout::{LayoutError, TableLayout, CELLS_GAP};
pub use pipeline::{plain_text, RenderPipeline};
pub use table::{format_uptime, CellValue, SortState, SortableDataGrid, Table};
pub use terminal::{Painter, TerminalPainter};
