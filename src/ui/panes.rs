//! Rendering logic for each TUI pane

use crate::interpreter::builtins;
use crate::sampler::{CoordinateMode, PlotResult, PointSet};
use crate::ui::theme::DEFAULT_THEME;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Clear, Dataset, Gauge, GraphType, Paragraph},
    Frame,
};

const KEYWORDS: &[&str] = &[
    "int", "double", "float", "void", "if", "else", "while", "for", "return", "break",
    "continue",
];

/// Simple syntax highlighting for one line of C source
fn highlight_source_line(line: &str) -> Line<'_> {
    let mut spans = Vec::new();
    let mut word = String::new();

    let flush = |word: &mut String, spans: &mut Vec<Span<'static>>, next: Option<char>| {
        if word.is_empty() {
            return;
        }
        let style = if KEYWORDS.contains(&word.as_str()) {
            Style::default().fg(DEFAULT_THEME.keyword)
        } else if word.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            Style::default().fg(DEFAULT_THEME.number)
        } else if next == Some('(') {
            Style::default().fg(DEFAULT_THEME.secondary)
        } else {
            Style::default().fg(DEFAULT_THEME.fg)
        };
        spans.push(Span::styled(std::mem::take(word), style));
    };

    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '/' && chars.get(i + 1) == Some(&'/') {
            flush(&mut word, &mut spans, None);
            spans.push(Span::styled(
                chars[i..].iter().collect::<String>(),
                Style::default().fg(DEFAULT_THEME.comment),
            ));
            return Line::from(spans);
        }
        if c.is_alphanumeric() || c == '_' || c == '.' {
            word.push(c);
        } else {
            flush(&mut word, &mut spans, Some(c));
            spans.push(Span::raw(c.to_string()));
        }
        i += 1;
    }
    flush(&mut word, &mut spans, None);
    Line::from(spans)
}

/// A line with the cursor cell rendered reversed
fn line_with_cursor(line: &str, col: usize) -> Line<'static> {
    let chars: Vec<char> = line.chars().collect();
    let col = col.min(chars.len());
    let before: String = chars[..col].iter().collect();
    let at: String = chars.get(col).map(|c| c.to_string()).unwrap_or_else(|| " ".to_string());
    let after: String = chars.get(col + 1..).map(|s| s.iter().collect()).unwrap_or_default();
    Line::from(vec![
        Span::raw(before),
        Span::styled(at, Style::default().add_modifier(Modifier::REVERSED)),
        Span::raw(after),
    ])
}

pub fn render_editor_pane(
    frame: &mut Frame,
    area: Rect,
    lines: &[String],
    cursor: (usize, usize),
    scroll: &mut usize,
    focused: bool,
) {
    let border = if focused {
        DEFAULT_THEME.border_focused
    } else {
        DEFAULT_THEME.border_normal
    };
    let block = Block::default()
        .title(" source ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let inner_height = area.height.saturating_sub(2) as usize;
    // Keep the cursor row on screen
    if cursor.0 < *scroll {
        *scroll = cursor.0;
    } else if inner_height > 0 && cursor.0 >= *scroll + inner_height {
        *scroll = cursor.0 + 1 - inner_height;
    }

    let rendered: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(*scroll)
        .take(inner_height)
        .map(|(row, line)| {
            if focused && row == cursor.0 {
                line_with_cursor(line, cursor.1)
            } else {
                highlight_source_line(line)
            }
        })
        .collect();

    frame.render_widget(Paragraph::new(rendered).block(block), area);
}

pub fn render_plot_pane(frame: &mut Frame, area: Rect, result: &PlotResult) {
    let title = format!(" plot [{}] ", result.mode.label());
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(DEFAULT_THEME.border_normal));

    match &result.points {
        Some(PointSet::Planar(points)) => {
            // Polar samples are (theta, r); lay them out on the plane.
            let data: Vec<(f64, f64)> = match result.mode {
                CoordinateMode::Polar => points
                    .iter()
                    .map(|&(theta, r)| (r * theta.cos(), r * theta.sin()))
                    .collect(),
                _ => points.clone(),
            };
            render_curve(frame, area, block, result, &data);
        }
        Some(PointSet::Surface { points, rows, cols }) => {
            render_surface(frame, area, block, points, *rows, *cols);
        }
        None => {
            frame.render_widget(block, area);
        }
    }
}

fn render_curve(
    frame: &mut Frame,
    area: Rect,
    block: Block,
    result: &PlotResult,
    data: &[(f64, f64)],
) {
    let (x_min, x_max) = result.domain.x_range();
    let (y_min, y_max) = result.domain.y_range();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(DEFAULT_THEME.curve))
        .data(data);

    let axis_style = Style::default().fg(DEFAULT_THEME.axis);
    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .style(axis_style)
                .bounds([x_min, x_max])
                .labels(vec![
                    Span::raw(format!("{:.1}", x_min)),
                    Span::raw(format!("{:.1}", (x_min + x_max) / 2.0)),
                    Span::raw(format!("{:.1}", x_max)),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(axis_style)
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{:.1}", y_min)),
                    Span::raw(format!("{:.1}", (y_min + y_max) / 2.0)),
                    Span::raw(format!("{:.1}", y_max)),
                ]),
        );
    frame.render_widget(chart, area);
}

/// Height-field shading ramp, darkest to brightest
const SHADES: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

fn render_surface(
    frame: &mut Frame,
    area: Rect,
    block: Block,
    points: &[(f64, f64, f64)],
    rows: usize,
    cols: usize,
) {
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 || points.is_empty() {
        return;
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &(_, _, z) in points {
        min = min.min(z);
        max = max.max(z);
    }
    let span = if max > min { max - min } else { 1.0 };

    let mut lines = Vec::with_capacity(inner.height as usize);
    for screen_row in 0..inner.height as usize {
        // Row 0 of the grid is the bottom of the domain; flip for display.
        let grid_row = (inner.height as usize - 1 - screen_row) * rows / inner.height as usize;
        let mut text = String::with_capacity(inner.width as usize);
        for screen_col in 0..inner.width as usize {
            let grid_col = screen_col * cols / inner.width as usize;
            match points.get(grid_row * cols + grid_col) {
                Some(&(_, _, z)) => {
                    let t = (z - min) / span;
                    let idx = ((t * (SHADES.len() - 1) as f64).round() as usize)
                        .min(SHADES.len() - 1);
                    text.push(SHADES[idx]);
                }
                None => text.push(' '),
            }
        }
        lines.push(Line::from(Span::styled(
            text,
            Style::default().fg(DEFAULT_THEME.curve),
        )));
    }
    frame.render_widget(Paragraph::new(lines), inner);
}

pub fn render_status_bar(frame: &mut Frame, area: Rect, result: &PlotResult) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    let message = match &result.diagnostic {
        Some(diag) => Line::from(Span::styled(
            diag.to_string(),
            Style::default().fg(DEFAULT_THEME.error),
        )),
        None => Line::from(Span::styled(
            "F1 help | F2 mode | F3 reset view | PgUp/PgDn zoom | Ctrl+arrows pan | Esc quit",
            Style::default().fg(DEFAULT_THEME.comment),
        )),
    };
    frame.render_widget(Paragraph::new(message), rows[0]);

    if result.progress < 1.0 {
        let gauge = Gauge::default()
            .ratio(result.progress.clamp(0.0, 1.0))
            .gauge_style(Style::default().fg(DEFAULT_THEME.primary))
            .label(format!("sampling {:.0}%", result.progress * 100.0));
        frame.render_widget(gauge, rows[1]);
    } else {
        let (x_min, x_max) = result.domain.x_range();
        let (y_min, y_max) = result.domain.y_range();
        let info = format!(
            "{} | x [{:.2}, {:.2}] y [{:.2}, {:.2}]",
            result.mode.label(),
            x_min,
            x_max,
            y_min,
            y_max
        );
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                info,
                Style::default().fg(DEFAULT_THEME.success),
            ))),
            rows[1],
        );
    }
}

pub fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let entries = builtins::catalog();
    let height = (entries.len() as u16 + 6).min(area.height);
    let width = 46.min(area.width);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    let mut lines = vec![
        Line::from(Span::styled(
            "Available library functions",
            Style::default().fg(DEFAULT_THEME.secondary),
        )),
        Line::raw(""),
    ];
    lines.extend(entries.iter().map(|(name, sig)| {
        Line::from(vec![
            Span::styled(
                format!("{:<7}", name),
                Style::default().fg(DEFAULT_THEME.secondary),
            ),
            Span::raw(sig.clone()),
        ])
    }));
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "press Esc to close",
        Style::default().fg(DEFAULT_THEME.comment),
    )));

    let block = Block::default()
        .title(" help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(DEFAULT_THEME.border_focused));

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Left).block(block),
        popup,
    );
}
