//! Main TUI application state and logic

use crate::sampler::{CoordinateMode, PlotResult, Sampler};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

const TAB_WIDTH: usize = 4;

/// The main application state
pub struct App {
    /// Handle to the background sampling worker
    sampler: Sampler,

    /// Current coordinate mode (mirrors what the sampler was last told)
    mode: CoordinateMode,

    /// Editor buffer, one entry per line
    lines: Vec<String>,

    /// Cursor position as (row, column)
    cursor: (usize, usize),

    /// Editor scroll offset
    editor_scroll: usize,

    /// Whether the help overlay is visible
    show_help: bool,

    /// Whether the app should quit
    should_quit: bool,

    /// Last result polled from the sampler
    latest: PlotResult,
}

impl App {
    pub fn new(sampler: Sampler) -> Self {
        let mode = CoordinateMode::default();
        let lines = split_lines(mode.default_source());
        App {
            sampler,
            mode,
            lines,
            cursor: (0, 0),
            editor_scroll: 0,
            show_help: false,
            should_quit: false,
            latest: PlotResult::default(),
        }
    }

    /// Run the TUI event loop until quit, then stop the worker
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.latest = self.sampler.published();
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            // Poll with a timeout so in-flight progress keeps animating
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        self.sampler.shutdown();
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(2)])
            .split(frame.area());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(main_chunks[0]);

        super::panes::render_editor_pane(
            frame,
            columns[0],
            &self.lines,
            self.cursor,
            &mut self.editor_scroll,
            !self.show_help,
        );
        super::panes::render_plot_pane(frame, columns[1], &self.latest);
        super::panes::render_status_bar(frame, main_chunks[1], &self.latest);

        if self.show_help {
            super::panes::render_help_overlay(frame, frame.area());
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::F(1)) {
                self.show_help = false;
            }
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::F(1) => self.show_help = true,
            KeyCode::F(2) => self.cycle_mode(),
            KeyCode::F(3) => self.sampler.set_domain(Default::default()),
            KeyCode::PageUp => self.sampler.zoom(0.5),
            KeyCode::PageDown => self.sampler.zoom(2.0),

            KeyCode::Left if ctrl => self.sampler.pan(-0.1, 0.0),
            KeyCode::Right if ctrl => self.sampler.pan(0.1, 0.0),
            KeyCode::Up if ctrl => self.sampler.pan(0.0, 0.1),
            KeyCode::Down if ctrl => self.sampler.pan(0.0, -0.1),

            KeyCode::Left => self.move_cursor(0, -1),
            KeyCode::Right => self.move_cursor(0, 1),
            KeyCode::Up => self.move_cursor(-1, 0),
            KeyCode::Down => self.move_cursor(1, 0),
            KeyCode::Home => self.cursor.1 = 0,
            KeyCode::End => self.cursor.1 = self.current_line_len(),

            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Tab => {
                for _ in 0..TAB_WIDTH {
                    self.insert_char(' ');
                }
            }
            KeyCode::Enter => self.insert_newline(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            _ => {}
        }
    }

    /// Switch to the next coordinate mode and load its starter program
    fn cycle_mode(&mut self) {
        self.mode = self.mode.next();
        self.lines = split_lines(self.mode.default_source());
        self.cursor = (0, 0);
        self.editor_scroll = 0;
        self.sampler.set_mode(self.mode);
        self.push_source();
    }

    /// Send the editor buffer to the sampler; called after every edit
    fn push_source(&self) {
        self.sampler.set_source(&self.lines.join("\n"));
    }

    fn current_line_len(&self) -> usize {
        self.lines.get(self.cursor.0).map_or(0, |l| l.chars().count())
    }

    fn move_cursor(&mut self, drow: isize, dcol: isize) {
        if drow != 0 {
            let row = self.cursor.0 as isize + drow;
            self.cursor.0 = row.clamp(0, self.lines.len() as isize - 1) as usize;
            self.cursor.1 = self.cursor.1.min(self.current_line_len());
        } else if dcol < 0 {
            if self.cursor.1 > 0 {
                self.cursor.1 -= 1;
            } else if self.cursor.0 > 0 {
                self.cursor.0 -= 1;
                self.cursor.1 = self.current_line_len();
            }
        } else if dcol > 0 {
            if self.cursor.1 < self.current_line_len() {
                self.cursor.1 += 1;
            } else if self.cursor.0 + 1 < self.lines.len() {
                self.cursor.0 += 1;
                self.cursor.1 = 0;
            }
        }
    }

    fn insert_char(&mut self, c: char) {
        let (row, col) = self.cursor;
        if let Some(line) = self.lines.get_mut(row) {
            let byte = byte_index(line, col);
            line.insert(byte, c);
            self.cursor.1 += 1;
            self.push_source();
        }
    }

    fn insert_newline(&mut self) {
        let (row, col) = self.cursor;
        if let Some(line) = self.lines.get_mut(row) {
            let byte = byte_index(line, col);
            let rest = line.split_off(byte);
            self.lines.insert(row + 1, rest);
            self.cursor = (row + 1, 0);
            self.push_source();
        }
    }

    fn backspace(&mut self) {
        let (row, col) = self.cursor;
        if col > 0 {
            if let Some(line) = self.lines.get_mut(row) {
                let byte = byte_index(line, col - 1);
                line.remove(byte);
                self.cursor.1 -= 1;
                self.push_source();
            }
        } else if row > 0 {
            let removed = self.lines.remove(row);
            let prev_len = self.lines[row - 1].chars().count();
            self.lines[row - 1].push_str(&removed);
            self.cursor = (row - 1, prev_len);
            self.push_source();
        }
    }

    fn delete(&mut self) {
        let (row, col) = self.cursor;
        if col < self.current_line_len() {
            if let Some(line) = self.lines.get_mut(row) {
                let byte = byte_index(line, col);
                line.remove(byte);
                self.push_source();
            }
        } else if row + 1 < self.lines.len() {
            let next = self.lines.remove(row + 1);
            self.lines[row].push_str(&next);
            self.push_source();
        }
    }
}

fn split_lines(source: &str) -> Vec<String> {
    let mut lines: Vec<String> = source.lines().map(String::from).collect();
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Byte offset of the `col`-th character of `line`
fn byte_index(line: &str, col: usize) -> usize {
    line.char_indices().nth(col).map_or(line.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editing_updates_buffer_and_cursor() {
        let mut app = App::new(Sampler::spawn());
        app.lines = vec!["ab".to_string()];
        app.cursor = (0, 1);

        app.insert_char('x');
        assert_eq!(app.lines[0], "axb");
        assert_eq!(app.cursor, (0, 2));

        app.insert_newline();
        assert_eq!(app.lines, vec!["ax".to_string(), "b".to_string()]);
        assert_eq!(app.cursor, (1, 0));

        app.backspace();
        assert_eq!(app.lines, vec!["axb".to_string()]);
        assert_eq!(app.cursor, (0, 2));
    }

    #[test]
    fn cursor_clamps_to_line_ends() {
        let mut app = App::new(Sampler::spawn());
        app.lines = vec!["long line".to_string(), "x".to_string()];
        app.cursor = (0, 9);

        app.move_cursor(1, 0);
        assert_eq!(app.cursor, (1, 1));

        app.move_cursor(0, 1);
        assert_eq!(app.cursor, (1, 1));
    }

    #[test]
    fn mode_cycle_loads_the_starter_program() {
        let mut app = App::new(Sampler::spawn());
        app.cycle_mode();
        assert_eq!(app.mode, CoordinateMode::Polar);
        app.cycle_mode();
        assert_eq!(app.mode, CoordinateMode::Surface);
        assert!(app.lines.join("\n").contains("double y"));
    }
}
