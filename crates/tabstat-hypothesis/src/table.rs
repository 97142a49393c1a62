//! Plain-text tables for test summaries

use std::fmt;

/// Format a number with fixed decimals, `NaN` for undefined values
pub fn fmt_num(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{value:.decimals$}")
    }
}

/// Table layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStyle {
    /// Row labels on the left, no rules (data frame style)
    Indexed,
    /// Title above `=` and `-` rules, every cell right aligned
    Ruled,
}

/// A small right-aligned text table
#[derive(Debug, Clone, PartialEq)]
pub struct TextTable {
    style: TableStyle,
    title: Vec<String>,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new<S: Into<String>>(style: TableStyle, headers: Vec<S>) -> Self {
        Self {
            style,
            title: Vec::new(),
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Add a title line, printed above the table
    pub fn with_title(mut self, line: impl Into<String>) -> Self {
        self.title.push(line.into());
        self
    }

    /// Append a row; for [`TableStyle::Indexed`] the first cell is the row label
    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    fn widths(&self) -> Vec<usize> {
        let n = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len() + self.label_offset()))
            .max()
            .unwrap_or(0);
        let mut widths = vec![0; n];
        let header_cells = std::iter::repeat("")
            .take(self.label_offset())
            .chain(self.headers.iter().map(String::as_str));
        for (w, h) in widths.iter_mut().zip(header_cells) {
            *w = (*w).max(h.chars().count());
        }
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }
        widths
    }

    fn render_line<'a>(&self, widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
        cells
            .zip(widths)
            .enumerate()
            .map(|(j, (cell, &w))| {
                if j == 0 && self.style == TableStyle::Indexed {
                    pad_right(cell, w)
                } else {
                    pad_left(cell, w)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn label_offset(&self) -> usize {
        match self.style {
            TableStyle::Indexed => 1,
            TableStyle::Ruled => 0,
        }
    }
}

fn pad_right(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.chars().count());
    format!("{s}{}", " ".repeat(fill))
}

fn pad_left(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.chars().count());
    format!("{}{s}", " ".repeat(fill))
}

impl fmt::Display for TextTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();
        let header = self.render_line(
            &widths,
            std::iter::repeat("")
                .take(self.label_offset())
                .chain(self.headers.iter().map(String::as_str)),
        );
        let body: Vec<String> = self
            .rows
            .iter()
            .map(|row| self.render_line(&widths, row.iter().map(String::as_str)))
            .collect();

        match self.style {
            TableStyle::Indexed => {
                for title in &self.title {
                    writeln!(f, "{title}")?;
                }
                write!(f, "{header}")?;
                for row in &body {
                    write!(f, "\n{row}")?;
                }
            }
            TableStyle::Ruled => {
                let total = header
                    .chars()
                    .count()
                    .max(body.iter().map(|r| r.chars().count()).max().unwrap_or(0));
                for title in &self.title {
                    writeln!(f, "{title}")?;
                }
                writeln!(f, "{}", "=".repeat(total))?;
                writeln!(f, "{header}")?;
                writeln!(f, "{}", "-".repeat(total))?;
                for row in &body {
                    writeln!(f, "{row}")?;
                }
                write!(f, "{}", "=".repeat(total))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_layout() {
        let mut table = TextTable::new(TableStyle::Indexed, vec!["sum_sq", "df"]);
        table.push_row(vec!["C(group)".into(), "12.5".into(), "2".into()]);
        table.push_row(vec!["Residual".into(), "3.0".into(), "9".into()]);
        let text = table.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("sum_sq df"));
        assert!(lines[1].starts_with("C(group)"));
        assert!(lines[2].ends_with("3.0  9"));
    }

    #[test]
    fn test_ruled_layout() {
        let mut table = TextTable::new(TableStyle::Ruled, vec!["group1", "group2"]).with_title("Title");
        table.push_row(vec!["A".into(), "B".into()]);
        let text = table.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Title");
        assert!(lines[1].chars().all(|c| c == '='));
        assert!(lines[3].chars().all(|c| c == '-'));
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(1.23456, 4), "1.2346");
        assert_eq!(fmt_num(f64::NAN, 4), "NaN");
    }
}
