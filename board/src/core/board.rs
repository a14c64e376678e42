use anyhow::Context;
use racedisplay::interfaces::display_interface::{Column, DisplayPort};
use std::fmt::Write as FmtWrite;
use std::io::Write;
use tracing::trace;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const COLUMN_GAP: usize = 2;

#[derive(Debug, Clone)]
struct BoardRow {
    id: u32,
    cells: Vec<String>,
}

/// Board renders the race title, the status line and the standings as a fixed-width text table.
/// Changes are collected and written out on `flush`.
#[derive(Debug)]
pub struct Board<W: Write> {
    out: W,
    clear_screen: bool,
    title: String,
    status: Option<String>,
    headers: Vec<(Column, String)>,
    rows: Vec<BoardRow>,
    visible: bool,
    dirty: bool,
}

impl<W: Write> Board<W> {
    pub fn new(out: W, clear_screen: bool) -> Board<W> {
        Board {
            out,
            clear_screen,
            title: String::new(),
            status: None,
            headers: Vec::new(),
            rows: Vec::new(),
            visible: false,
            dirty: false,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn header(&self, column: Column) -> Option<&str> {
        self.headers
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, label)| label.as_str())
    }

    /// cell returns the text of one cell, `None` for unknown rows or columns.
    pub fn cell(&self, id: u32, column: Column) -> Option<&str> {
        let idx = self.column_idx(column)?;
        self.rows
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.cells[idx].as_str())
    }

    fn column_idx(&self, column: Column) -> Option<usize> {
        self.headers.iter().position(|(c, _)| *c == column)
    }

    /// render returns the complete board as text.
    pub fn render(&self) -> String {
        let mut text = String::new();
        writeln!(&mut text, "{}", self.title).unwrap();
        writeln!(&mut text, "{}", self.status.as_deref().unwrap_or("")).unwrap();

        if !self.visible || self.headers.is_empty() {
            return text;
        }

        // column widths from the widest cell
        let mut widths: Vec<usize> = self
            .headers
            .iter()
            .map(|(_, label)| label.chars().count())
            .collect();
        for row in self.rows.iter() {
            for (width, cell) in widths.iter_mut().zip(row.cells.iter()) {
                *width = (*width).max(cell.chars().count());
            }
        }

        text.push('\n');
        let labels: Vec<&str> = self.headers.iter().map(|(_, label)| label.as_str()).collect();
        write_line(&mut text, &labels, &widths);
        for row in self.rows.iter() {
            let cells: Vec<&str> = row.cells.iter().map(String::as_str).collect();
            write_line(&mut text, &cells, &widths);
        }

        text
    }
}

fn write_line(text: &mut String, cells: &[&str], widths: &[usize]) {
    let mut line = String::new();
    for (i, (cell, width)) in cells.iter().zip(widths.iter()).enumerate() {
        if i > 0 {
            line.push_str(&" ".repeat(COLUMN_GAP));
        }
        write!(&mut line, "{:<width$}", cell, width = width).unwrap();
    }
    text.push_str(line.trim_end());
    text.push('\n');
}

impl<W: Write> DisplayPort for Board<W> {
    fn set_title(&mut self, text: &str) {
        self.title = text.to_owned();
        self.dirty = true;
    }

    fn set_status(&mut self, text: Option<&str>) {
        self.status = text.map(str::to_owned);
        self.dirty = true;
    }

    fn reset_standings(&mut self, headers: &[(Column, String)]) {
        self.headers = headers.to_vec();
        self.rows.clear();
        self.dirty = true;
    }

    fn append_row(&mut self, id: u32, cells: &[(Column, String)]) {
        let mut row = BoardRow {
            id,
            cells: vec![String::new(); self.headers.len()],
        };
        for (column, value) in cells.iter() {
            if let Some(idx) = self.column_idx(*column) {
                row.cells[idx] = value.to_owned();
            }
        }
        self.rows.push(row);
        self.dirty = true;
    }

    fn update_cell(&mut self, id: u32, column: Column, value: &str) {
        let idx = match self.column_idx(column) {
            Some(idx) => idx,
            None => return,
        };
        match self.rows.iter_mut().find(|row| row.id == id) {
            Some(row) => {
                row.cells[idx] = value.to_owned();
                self.dirty = true;
            }
            None => trace!(id, "No board row for competitor"),
        }
    }

    fn relabel_column(&mut self, column: Column, label: &str) {
        if let Some(idx) = self.column_idx(column) {
            self.headers[idx].1 = label.to_owned();
            self.dirty = true;
        }
    }

    fn show_standings(&mut self, visible: bool) {
        self.visible = visible;
        self.dirty = true;
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let mut frame = String::new();
        if self.clear_screen {
            frame.push_str(CLEAR_SCREEN);
        }
        frame.push_str(&self.render());

        self.out
            .write_all(frame.as_bytes())
            .context("Failed to write board to output!")?;
        self.out.flush().context("Failed to flush board output!")?;
        self.dirty = false;
        Ok(())
    }
}
