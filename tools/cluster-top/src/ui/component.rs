//! Renderable screen components.

use std::fmt::Display;

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use thiserror::Error;

use super::layout::{text_width, truncate};
use super::table::SortableDataGrid;

/// Errors raised while rendering a single component.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// Cluster-provided text that would corrupt the terminal.
    #[error("{component} contains control character {ch:?}")]
    ControlCharacter { component: &'static str, ch: char },
}

fn ensure_printable(component: &'static str, text: &str) -> Result<(), RenderError> {
    match text.chars().find(|ch| ch.is_control()) {
        Some(ch) => Err(RenderError::ControlCharacter { component, ch }),
        None => Ok(()),
    }
}

/// One piece of a screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Label(Label),
    /// Blank lines.
    Spacer(usize),
    Banner(Banner),
    Table(SortableDataGrid),
}

impl Component {
    /// Width the component would like to occupy. Spacers have none.
    pub fn content_width(&self) -> Option<usize> {
        match self {
            Component::Label(label) => Some(label.width()),
            Component::Spacer(_) => None,
            Component::Banner(banner) => Some(banner.content_width()),
            Component::Table(grid) => Some(grid.table().content_width()),
        }
    }

    /// Render at `width`. No returned line is wider than `width`.
    pub fn render(&self, width: usize) -> Result<Vec<Line<'static>>, RenderError> {
        match self {
            Component::Label(label) => Ok(vec![label.render(width)?]),
            Component::Spacer(lines) => Ok(vec![Line::default(); *lines]),
            Component::Banner(banner) => Ok(vec![banner.render(width)?]),
            Component::Table(grid) => {
                let table = grid.table();
                for header in table.header() {
                    ensure_printable("table header", header)?;
                }
                for cell in table.rows().iter().flatten() {
                    ensure_printable("table cell", &cell.display())?;
                }
                Ok(grid.render(width))
            }
        }
    }
}

impl From<Label> for Component {
    fn from(label: Label) -> Self {
        Component::Label(label)
    }
}

impl From<Banner> for Component {
    fn from(banner: Banner) -> Self {
        Component::Banner(banner)
    }
}

impl From<SortableDataGrid> for Component {
    fn from(grid: SortableDataGrid) -> Self {
        Component::Table(grid)
    }
}

/// A single line of styled phrases.
///
/// Phrases added through the builder are separated by one space, except
/// around explicit [`spaces`](LabelBuilder::spaces).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Label {
    spans: Vec<Span<'static>>,
}

impl Label {
    /// Unstyled label.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            spans: vec![Span::raw(text.into())],
        }
    }

    pub fn normal(value: impl Display) -> LabelBuilder {
        LabelBuilder::default().normal(value)
    }

    pub fn bold(value: impl Display) -> LabelBuilder {
        LabelBuilder::default().bold(value)
    }

    pub fn underline(value: impl Display) -> LabelBuilder {
        LabelBuilder::default().underline(value)
    }

    pub fn color(color: Color) -> LabelBuilder {
        LabelBuilder::default().color(color)
    }

    pub fn width(&self) -> usize {
        self.spans.iter().map(|span| text_width(&span.content)).sum()
    }

    pub fn spans(&self) -> &[Span<'static>] {
        &self.spans
    }

    fn render(&self, width: usize) -> Result<Line<'static>, RenderError> {
        let mut left = width;
        let mut spans = Vec::with_capacity(self.spans.len());

        for span in &self.spans {
            ensure_printable("label", &span.content)?;
            if left == 0 {
                break;
            }
            let text = truncate(&span.content, left);
            left -= text_width(text);
            spans.push(Span::styled(text.to_string(), span.style));
        }

        Ok(Line::from(spans))
    }
}

/// Builds a [`Label`] phrase by phrase.
#[derive(Debug, Clone, Default)]
pub struct LabelBuilder {
    spans: Vec<Span<'static>>,
    color: Option<Color>,
    need_space: bool,
}

impl LabelBuilder {
    fn phrase(mut self, value: impl Display, style: Style) -> Self {
        if self.need_space {
            self.spans.push(Span::raw(" "));
        }

        // A color applies to the next phrase only
        let style = match self.color.take() {
            Some(color) => style.fg(color),
            None => style,
        };

        self.spans.push(Span::styled(value.to_string(), style));
        self.need_space = true;
        self
    }

    pub fn normal(self, value: impl Display) -> Self {
        self.phrase(value, Style::default())
    }

    pub fn bold(self, value: impl Display) -> Self {
        self.phrase(value, Style::default().add_modifier(Modifier::BOLD))
    }

    pub fn underline(self, value: impl Display) -> Self {
        self.phrase(value, Style::default().add_modifier(Modifier::UNDERLINED))
    }

    pub fn spaces(mut self, count: usize) -> Self {
        self.spans.push(Span::raw(" ".repeat(count)));
        self.need_space = false;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn build(self) -> Label {
        Label { spans: self.spans }
    }
}

impl From<LabelBuilder> for Component {
    fn from(builder: LabelBuilder) -> Self {
        Component::Label(builder.build())
    }
}

/// Look of a [`Banner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerStyle {
    /// Screen title: `<text>` on a full-width green bar.
    Title,
    /// Section heading: `|text|` centered on blanks.
    Section,
}

impl BannerStyle {
    fn brackets(&self) -> (&'static str, &'static str) {
        match self {
            BannerStyle::Title => ("<", ">"),
            BannerStyle::Section => ("|", "|"),
        }
    }

    fn fill(&self) -> char {
        match self {
            BannerStyle::Title => '─',
            BannerStyle::Section => ' ',
        }
    }

    fn style(&self) -> Style {
        match self {
            BannerStyle::Title => Style::default().fg(Color::Black).bg(Color::Green),
            BannerStyle::Section => Style::default().fg(Color::White),
        }
    }
}

/// Bracketed text centered in the available width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    text: String,
    style: BannerStyle,
}

impl Banner {
    pub fn new(text: impl Into<String>, style: BannerStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn title(text: impl Into<String>) -> Self {
        Self::new(text, BannerStyle::Title)
    }

    pub fn section(text: impl Into<String>) -> Self {
        Self::new(text, BannerStyle::Section)
    }

    /// Text width including brackets.
    pub fn content_width(&self) -> usize {
        let (open, close) = self.style.brackets();
        text_width(open) + text_width(&self.text) + text_width(close)
    }

    fn render(&self, width: usize) -> Result<Line<'static>, RenderError> {
        ensure_printable("banner", &self.text)?;

        let (open, close) = self.style.brackets();
        let bracketed = format!("{}{}{}", open, self.text, close);
        let slack = width.saturating_sub(text_width(&bracketed));
        let left = slack / 2;
        let right = slack - left;

        let style = self.style.style();
        let fill = self.style.fill();

        Ok(Line::from(vec![
            Span::styled(fill.to_string().repeat(left), style),
            Span::styled(
                truncate(&bracketed, width).to_string(),
                style.add_modifier(Modifier::BOLD),
            ),
            Span::styled(fill.to_string().repeat(right), style),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::plain_text;
    use crate::ui::table::{CellValue, Table};

    fn render_one(component: &Component, width: usize) -> String {
        let lines = component.render(width).unwrap();
        assert_eq!(lines.len(), 1);
        plain_text(&lines[0])
    }

    // =========================================================================
    // Label
    // =========================================================================

    #[test]
    fn test_label_builder_separates_phrases() {
        let label = Label::normal("State:")
            .color(Color::Green)
            .bold("ACTIVE")
            .spaces(2)
            .normal("Rebalanced:")
            .bold(true)
            .build();

        assert_eq!(
            render_one(&label.clone().into(), 100),
            "State: ACTIVE  Rebalanced: true"
        );
        assert_eq!(label.width(), 31);
        assert_eq!(label.spans()[2].style.fg, Some(Color::Green));
        assert_eq!(label.spans()[6].style.fg, None);
    }

    #[test]
    fn test_label_truncated_to_width() {
        let label: Component = Label::plain("0123456789").into();

        assert_eq!(render_one(&label, 8), "01234567");
        assert_eq!(render_one(&label, 0), "");
    }

    #[test]
    fn test_label_with_control_character_fails() {
        let label: Component = Label::plain("bad\nname").into();

        assert_eq!(
            label.render(80),
            Err(RenderError::ControlCharacter {
                component: "label",
                ch: '\n'
            })
        );
    }

    // =========================================================================
    // Banner
    // =========================================================================

    #[test]
    fn test_title_centered_with_fill() {
        let title: Component = Banner::title("Topology").into();

        assert_eq!(title.content_width(), Some(10));
        assert_eq!(render_one(&title, 16), "───<Topology>───");
        assert_eq!(render_one(&title, 15), "──<Topology>───");
    }

    #[test]
    fn test_section_centered_with_blanks() {
        let section: Component = Banner::section("Clients").into();

        assert_eq!(render_one(&section, 13), "  |Clients|  ");
    }

    #[test]
    fn test_banner_truncated_when_narrow() {
        let title: Component = Banner::title("Topology").into();

        assert_eq!(render_one(&title, 10), "<Topology>");
        assert_eq!(render_one(&title, 5), "<Topo");
    }

    // =========================================================================
    // Spacer and table
    // =========================================================================

    #[test]
    fn test_spacer_has_no_content_width() {
        let spacer = Component::Spacer(2);

        assert_eq!(spacer.content_width(), None);
        assert_eq!(spacer.render(10).unwrap().len(), 2);
    }

    #[test]
    fn test_table_with_control_character_fails() {
        let table = Table::new(["Host"], vec![vec![CellValue::from("evil\u{1b}[2J")]]).unwrap();
        let component: Component = SortableDataGrid::new(table).into();

        assert!(matches!(
            component.render(40),
            Err(RenderError::ControlCharacter { .. })
        ));
    }

    #[test]
    fn test_table_content_width() {
        let table = Table::new(["Host"], vec![vec![CellValue::from("node-1")]]).unwrap();
        let component: Component = SortableDataGrid::new(table).into();

        assert_eq!(component.content_width(), Some(8));
    }
}
