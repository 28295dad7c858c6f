//! Column width negotiation for text tables.
//!
//! Each column has a natural width: its widest cell (header included) plus
//! [`CELLS_GAP`]. When the target width differs from the sum of natural
//! widths, the difference is spread over the columns proportionally to their
//! natural width and whatever rounding leaves over goes to the last column.
//! While the target can hold every header, no column is shrunk below its
//! header during the proportional pass; only the last column may give way.

use thiserror::Error;

/// Blank columns kept to the right of every cell.
pub const CELLS_GAP: usize = 2;

/// Malformed table input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("Table columns headers list must not be empty")]
    EmptyHeader,
    #[error("Row {row} has {actual} cells, header has {expected}")]
    RowLength {
        row: usize,
        actual: usize,
        expected: usize,
    },
}

/// Display width of a cell.
pub fn text_width(text: &str) -> usize {
    text.chars().count()
}

/// First `width` characters of `text`.
pub fn truncate(text: &str, width: usize) -> &str {
    match text.char_indices().nth(width) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// `text` cut or right-padded with spaces to exactly `width` characters.
pub fn fit(text: &str, width: usize) -> String {
    let text = truncate(text, width);
    let mut fitted = String::with_capacity(width);
    fitted.push_str(text);
    fitted.extend(std::iter::repeat(' ').take(width - text_width(text)));
    fitted
}

/// Measured widths of a table. Stateless: every call to
/// [`column_widths`](Self::column_widths) starts from the natural widths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    header_widths: Vec<usize>,
    natural: Vec<usize>,
}

impl TableLayout {
    /// Measure pre-formatted header and row cells.
    pub fn measure(header: &[String], rows: &[Vec<String>]) -> Result<Self, LayoutError> {
        if header.is_empty() {
            return Err(LayoutError::EmptyHeader);
        }

        let header_widths: Vec<usize> = header.iter().map(|h| text_width(h)).collect();
        let mut natural = header_widths.clone();

        for (idx, row) in rows.iter().enumerate() {
            if row.len() != header.len() {
                return Err(LayoutError::RowLength {
                    row: idx,
                    actual: row.len(),
                    expected: header.len(),
                });
            }

            for (width, cell) in natural.iter_mut().zip(row) {
                *width = (*width).max(text_width(cell));
            }
        }

        for width in &mut natural {
            *width += CELLS_GAP;
        }

        Ok(Self {
            header_widths,
            natural,
        })
    }

    pub fn column_count(&self) -> usize {
        self.natural.len()
    }

    /// Natural column widths, gaps included.
    pub fn natural_widths(&self) -> &[usize] {
        &self.natural
    }

    /// Sum of natural widths.
    pub fn content_width(&self) -> usize {
        self.natural.iter().sum()
    }

    /// Column widths, gaps included, for a table rendered at `width`.
    ///
    /// The result sums to `width` exactly (or to 0 when `width` is 0).
    pub fn column_widths(&self, width: usize) -> Vec<usize> {
        if width == 0 {
            return vec![0; self.natural.len()];
        }

        let content = self.content_width() as i64;
        let target = width as i64;
        let delta = content - target;
        if delta == 0 {
            return self.natural.clone();
        }

        let keep_headers = self.header_widths.iter().sum::<usize>() <= width;
        let mut remaining = delta;
        let mut widths: Vec<i64> = Vec::with_capacity(self.natural.len());

        for (natural, header) in self.natural.iter().zip(&self.header_widths) {
            let natural = *natural as i64;

            let mut column_delta = delta * natural / content;
            if column_delta == 0 {
                column_delta = delta.signum();
            }

            let mut new = (natural - column_delta).max(0);
            let floor = (*header + CELLS_GAP) as i64;
            if keep_headers && new < floor {
                new = floor;
            }

            remaining -= natural - new;
            widths.push(new);
        }

        if remaining != 0 {
            if let Some(last) = widths.last_mut() {
                *last = (*last - remaining).max(0);
            }
        }

        // Header floors and zero clamps may overshoot
        let mut excess = widths.iter().sum::<i64>() - target;
        for w in widths.iter_mut().rev() {
            if excess <= 0 {
                break;
            }
            let cut = excess.min(*w);
            *w -= cut;
            excess -= cut;
        }

        widths.into_iter().map(|w| w as usize).collect()
    }

    /// Visible text width of every column at `width`: column width minus gap.
    pub fn resolved_widths(&self, width: usize) -> Vec<usize> {
        self.column_widths(width)
            .into_iter()
            .map(|w| w.saturating_sub(CELLS_GAP))
            .collect()
    }
}
