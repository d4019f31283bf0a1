//! A minimal ANSI/VT100 screen emulator.
//!
//! Feeds a byte buffer through [`vte::Parser`] into a fixed-size character
//! grid and returns the rstripped, non-empty visible rows joined by `\n`.
//! Only glyphs are retained; SGR attributes are parsed (so malformed or
//! "private marker" variants don't break the stream) but never stored,
//! since the history views only ever need text.

use vte::{Params, Perform};

/// Render `bytes` onto a `columns`×`lines` virtual screen and return the
/// non-empty, right-trimmed visible lines joined by `\n`.
///
/// Deterministic and O(bytes): a single pass through a [`vte::Parser`],
/// no quadratic re-scans regardless of input size.
pub fn render(bytes: &[u8], columns: u16, lines: u16) -> String {
    let columns = columns.max(1) as usize;
    let lines = lines.max(1) as usize;

    let mut grid = Grid::new(columns, lines);
    let mut parser = vte::Parser::new();
    for &byte in bytes {
        parser.advance(&mut grid, byte);
    }

    grid.rows
        .iter()
        .map(|row| {
            let line: String = row.iter().collect();
            line.trim_end().to_string()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A fixed `columns`×`lines` character grid with a single cursor.
struct Grid {
    columns: usize,
    lines: usize,
    rows: Vec<Vec<char>>,
    cursor_row: usize,
    cursor_col: usize,
}

impl Grid {
    fn new(columns: usize, lines: usize) -> Self {
        Self {
            columns,
            lines,
            rows: vec![vec![' '; columns]; lines],
            cursor_row: 0,
            cursor_col: 0,
        }
    }

    fn clamp_cursor(&mut self) {
        self.cursor_row = self.cursor_row.min(self.lines.saturating_sub(1));
        self.cursor_col = self.cursor_col.min(self.columns.saturating_sub(1));
    }

    fn newline(&mut self) {
        if self.cursor_row + 1 >= self.lines {
            self.rows.remove(0);
            self.rows.push(vec![' '; self.columns]);
        } else {
            self.cursor_row += 1;
        }
    }

    fn put_char(&mut self, c: char) {
        if self.cursor_col >= self.columns {
            self.cursor_col = 0;
            self.newline();
        }
        self.rows[self.cursor_row][self.cursor_col] = c;
        self.cursor_col += 1;
    }

    fn erase_line(&mut self, mode: u16) {
        let row = &mut self.rows[self.cursor_row];
        match mode {
            0 => row[self.cursor_col..].fill(' '),
            1 => row[..=self.cursor_col.min(row.len().saturating_sub(1))].fill(' '),
            2 => row.fill(' '),
            _ => {}
        }
    }

    fn erase_display(&mut self, mode: u16) {
        match mode {
            0 => {
                self.erase_line(0);
                for row in self.rows.iter_mut().skip(self.cursor_row + 1) {
                    row.fill(' ');
                }
            }
            1 => {
                self.erase_line(1);
                for row in self.rows.iter_mut().take(self.cursor_row) {
                    row.fill(' ');
                }
            }
            2 | 3 => {
                for row in self.rows.iter_mut() {
                    row.fill(' ');
                }
            }
            _ => {}
        }
    }

    fn param(params: &Params, index: usize, default: u16) -> u16 {
        params
            .iter()
            .nth(index)
            .and_then(|sub| sub.first().copied())
            .filter(|&v| v != 0)
            .unwrap_or(default)
    }

    fn param_allow_zero(params: &Params, index: usize, default: u16) -> u16 {
        params
            .iter()
            .nth(index)
            .and_then(|sub| sub.first().copied())
            .unwrap_or(default)
    }
}

impl Perform for Grid {
    fn print(&mut self, c: char) {
        self.put_char(c);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            b'\n' => self.newline(),
            b'\r' => self.cursor_col = 0,
            0x08 => self.cursor_col = self.cursor_col.saturating_sub(1),
            b'\t' => {
                let next_stop = (self.cursor_col / 8 + 1) * 8;
                self.cursor_col = next_stop.min(self.columns.saturating_sub(1));
            }
            _ => {}
        }
    }

    fn hook(&mut self, _params: &Params, _intermediates: &[u8], _ignore: bool, _action: char) {}

    fn put(&mut self, _byte: u8) {}

    fn unhook(&mut self) {}

    fn osc_dispatch(&mut self, _params: &[&[u8]], _bell_terminated: bool) {}

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], _ignore: bool, action: char) {
        // SGR's "private marker" variant (an unexpected leading intermediate
        // such as `?`) is tolerated by simply not special-casing it: since
        // this renderer never retains color/attributes, any `m` dispatch is
        // already a no-op regardless of its intermediates.
        match action {
            'A' => {
                let n = Self::param(params, 0, 1) as usize;
                self.cursor_row = self.cursor_row.saturating_sub(n);
            }
            'B' => {
                let n = Self::param(params, 0, 1) as usize;
                self.cursor_row = (self.cursor_row + n).min(self.lines.saturating_sub(1));
            }
            'C' => {
                let n = Self::param(params, 0, 1) as usize;
                self.cursor_col = (self.cursor_col + n).min(self.columns.saturating_sub(1));
            }
            'D' => {
                let n = Self::param(params, 0, 1) as usize;
                self.cursor_col = self.cursor_col.saturating_sub(n);
            }
            'G' => {
                let col = Self::param(params, 0, 1) as usize;
                self.cursor_col = col.saturating_sub(1);
                self.clamp_cursor();
            }
            'd' => {
                let row = Self::param(params, 0, 1) as usize;
                self.cursor_row = row.saturating_sub(1);
                self.clamp_cursor();
            }
            'H' | 'f' => {
                let row = Self::param(params, 0, 1) as usize;
                let col = Self::param(params, 1, 1) as usize;
                self.cursor_row = row.saturating_sub(1);
                self.cursor_col = col.saturating_sub(1);
                self.clamp_cursor();
            }
            'J' => self.erase_display(Self::param_allow_zero(params, 0, 0)),
            'K' => self.erase_line(Self::param_allow_zero(params, 0, 0)),
            '@' => {
                let n = Self::param(params, 0, 1) as usize;
                let row = &mut self.rows[self.cursor_row];
                for _ in 0..n {
                    if self.cursor_col < row.len() {
                        row.insert(self.cursor_col, ' ');
                        row.pop();
                    }
                }
            }
            'P' => {
                let n = Self::param(params, 0, 1) as usize;
                let row = &mut self.rows[self.cursor_row];
                for _ in 0..n {
                    if self.cursor_col < row.len() {
                        row.remove(self.cursor_col);
                        row.push(' ');
                    }
                }
            }
            'm' => {
                // SGR: intentionally ignored beyond "don't panic on the
                // intermediates" — see the comment above.
                let _ = intermediates;
            }
            _ => {}
        }
    }

    fn esc_dispatch(&mut self, _intermediates: &[u8], _ignore: bool, _byte: u8) {}
}
