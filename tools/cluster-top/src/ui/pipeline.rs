//! Renders a screen's components into terminal lines.

use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};
use tracing::warn;

use super::component::{Component, RenderError};
use super::layout::truncate;
use super::table::SortState;

/// The UI state the poll loop owns: current components, the sort choice
/// shared by every table, and the width of the last render.
#[derive(Debug, Clone, Default)]
pub struct RenderPipeline {
    components: Vec<Component>,
    sort: SortState,
    last_width: Option<usize>,
}

impl RenderPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the components. Sort state is kept.
    pub fn set_components(&mut self, components: Vec<Component>) {
        self.components = components;
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    /// Sort by `column`; the current column again flips direction.
    pub fn select_sort_column(&mut self, column: isize) {
        self.sort.select(column);
    }

    /// Width every component is rendered at.
    pub fn clamp_width(&self, terminal_width: usize) -> usize {
        self.components
            .iter()
            .filter_map(Component::content_width)
            .max()
            .map_or(terminal_width, |widest| widest.min(terminal_width))
    }

    /// Width used by the last [`render`](Self::render).
    pub fn last_width(&self) -> Option<usize> {
        self.last_width
    }

    /// Render all components in order at the clamped width.
    ///
    /// Tables take the shared sort state when it fits them. A component that
    /// fails to render is replaced by a single red diagnostic line.
    pub fn render(&mut self, terminal_width: usize) -> Vec<Line<'static>> {
        let width = self.clamp_width(terminal_width);
        let (column, ascending) = (self.sort.column(), self.sort.ascending());

        let mut lines = Vec::new();
        for component in &mut self.components {
            if let Component::Table(grid) = component {
                grid.set_sorting(isize::try_from(column).unwrap_or(isize::MAX), ascending);
            }

            match component.render(width) {
                Ok(rendered) => lines.extend(rendered),
                Err(e) => {
                    warn!(error = %e, "component render failed");
                    lines.push(diagnostic(&e, width));
                }
            }
        }

        self.last_width = Some(width);
        lines
    }
}

fn diagnostic(error: &RenderError, width: usize) -> Line<'static> {
    let text = format!("Render error: {}", error);
    Line::from(Span::styled(
        truncate(&text, width).to_string(),
        Style::default().fg(Color::Red),
    ))
}

/// Text of a line without styles.
pub fn plain_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|span| span.content.as_ref()).collect()
}
