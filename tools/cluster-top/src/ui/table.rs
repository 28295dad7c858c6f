//! Sortable text tables.

use std::cmp::Ordering;
use std::time::Duration;

use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};

use super::layout::{fit, truncate, LayoutError, TableLayout, CELLS_GAP};

/// Marker appended to the header of a column sorted ascending.
pub const ASC_MARKER: char = '△';

/// Marker appended to the header of a column sorted descending.
pub const DESC_MARKER: char = '▽';

/// A table cell as data. Sorting uses the value, layout the formatted text.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    /// Rendered with one fractional digit.
    Decimal(f64),
    Flag(bool),
    Uptime(Duration),
    Missing,
}

impl CellValue {
    /// Text shown in the table.
    pub fn display(&self) -> String {
        match self {
            CellValue::Text(text) => text.clone(),
            CellValue::Integer(value) => value.to_string(),
            CellValue::Decimal(value) => format!("{:.1}", value),
            CellValue::Flag(value) => value.to_string(),
            CellValue::Uptime(uptime) => format_uptime(*uptime),
            CellValue::Missing => String::new(),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(value) => Some(*value as f64),
            CellValue::Decimal(value) => Some(*value),
            _ => None,
        }
    }

    /// Ordering of values of mutually comparable kinds.
    fn natural_cmp(&self, other: &Self) -> Option<Ordering> {
        use CellValue::*;

        match (self, other) {
            (Integer(a), Integer(b)) => Some(a.cmp(b)),
            (Integer(_) | Decimal(_), Integer(_) | Decimal(_)) => {
                Some(self.as_f64()?.total_cmp(&other.as_f64()?))
            }
            (Flag(a), Flag(b)) => Some(a.cmp(b)),
            (Uptime(a), Uptime(b)) => Some(a.cmp(b)),
            (Text(a), Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Natural ordering where there is one, display text otherwise.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.natural_cmp(other)
            .unwrap_or_else(|| self.display().cmp(&other.display()))
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<u64> for CellValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(CellValue::Text(value.to_string()), CellValue::Integer)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Decimal(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Flag(value)
    }
}

impl From<Duration> for CellValue {
    fn from(value: Duration) -> Self {
        CellValue::Uptime(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Missing, Into::into)
    }
}

/// `Nd Nh Nm Ns`, whole seconds.
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();

    format!(
        "{}d {}h {}m {}s",
        total / 86_400,
        (total / 3_600) % 24,
        (total / 60) % 60,
        total % 60
    )
}

/// Header plus rows of equal length, with cells formatted once up front.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<CellValue>>,
    cells: Vec<Vec<String>>,
    layout: TableLayout,
}

impl Table {
    /// Fails on an empty header or a row whose length differs from it.
    pub fn new<I, S>(header: I, rows: Vec<Vec<CellValue>>) -> Result<Self, LayoutError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let header: Vec<String> = header.into_iter().map(Into::into).collect();
        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(CellValue::display).collect())
            .collect();
        let layout = TableLayout::measure(&header, &cells)?;

        Ok(Self {
            header,
            rows,
            cells,
            layout,
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    /// Sum of natural column widths.
    pub fn content_width(&self) -> usize {
        self.layout.content_width()
    }
}

/// Which column tables are sorted by, and in which direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    column: usize,
    ascending: bool,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: 0,
            ascending: true,
        }
    }
}

impl SortState {
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn ascending(&self) -> bool {
        self.ascending
    }

    /// Select `column` for sorting. Selecting the current column again flips
    /// the direction. Negative columns are ignored.
    pub fn select(&mut self, column: isize) {
        let Ok(column) = usize::try_from(column) else {
            return;
        };

        if column == self.column {
            self.ascending = !self.ascending;
        } else {
            self.column = column;
        }
    }
}

/// A [`Table`] with its own sort state.
#[derive(Debug, Clone, PartialEq)]
pub struct SortableDataGrid {
    table: Table,
    sort: SortState,
}

impl From<Table> for SortableDataGrid {
    fn from(table: Table) -> Self {
        Self::new(table)
    }
}

impl SortableDataGrid {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            sort: SortState::default(),
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    /// Sort by `column`. A column outside the table, negative included,
    /// leaves the current sorting untouched.
    pub fn set_sorting(&mut self, column: isize, ascending: bool) {
        match usize::try_from(column) {
            Ok(column) if column < self.table.column_count() => {
                self.sort = SortState { column, ascending };
            }
            _ => {}
        }
    }

    /// Row indices in display order. The sort is stable in both directions.
    fn order(&self) -> Vec<usize> {
        let SortState { column, ascending } = self.sort;
        let rows = &self.table.rows;

        let mut order: Vec<usize> = (0..rows.len()).collect();
        order.sort_by(|&a, &b| {
            let ordering = rows[a][column].compare(&rows[b][column]);
            if ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
        order
    }

    /// Rows in display order.
    pub fn sorted_rows(&self) -> Vec<&[CellValue]> {
        self.order()
            .into_iter()
            .map(|idx| self.table.rows[idx].as_slice())
            .collect()
    }

    /// Header line, one line per row and a total line, none wider than
    /// `width`.
    pub fn render(&self, width: usize) -> Vec<Line<'static>> {
        let widths = self.table.layout.column_widths(width);
        let mut lines = Vec::with_capacity(self.table.row_count() + 2);

        lines.push(self.header_line(&widths));

        for idx in self.order() {
            let text: String = self.table.cells[idx]
                .iter()
                .zip(&widths)
                .map(|(cell, w)| fit(truncate(cell, w.saturating_sub(CELLS_GAP)), *w))
                .collect();
            lines.push(Line::from(text));
        }

        let total = format!("Total items: {}", self.table.row_count());
        lines.push(Line::from(truncate(&total, width).to_string()));

        lines
    }

    fn header_line(&self, widths: &[usize]) -> Line<'static> {
        let plain = Style::default().fg(Color::Black).bg(Color::Green);
        let sorted = Style::default().fg(Color::Black).bg(Color::Blue);

        let spans: Vec<Span<'static>> = self
            .table
            .header
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(idx, (header, w))| {
                let visible = truncate(header, w.saturating_sub(CELLS_GAP));
                if idx == self.sort.column {
                    let marker = if self.sort.ascending {
                        ASC_MARKER
                    } else {
                        DESC_MARKER
                    };
                    Span::styled(fit(&format!("{}{}", visible, marker), *w), sorted)
                } else {
                    Span::styled(fit(visible, *w), plain)
                }
            })
            .collect();

        Line::from(spans)
    }
}
