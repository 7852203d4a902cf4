//! Layout and drawing: HUD, grid, scanline, idle and game-over overlays.

use crate::grid::CellPos;
use crate::layout::GridGeometry;
use crate::session::{MAX_HEALTH, Session, State};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

const HUD_HEIGHT: u16 = 4;
/// Below this width the HUD drops the high score box.
const HUD_COMPACT_WIDTH: u16 = 48;
/// Fade of a consumed column back to the unlit colour; one tick long.
const FLASH_MS: u32 = 150;

/// A consumed column fading out (TachyonFX), created when a tick scores hits.
pub struct ColumnFlash {
    column: usize,
    effect: Option<Effect>,
    last_process: Option<Instant>,
}

impl ColumnFlash {
    pub fn new(column: usize) -> Self {
        Self {
            column,
            effect: None,
            last_process: None,
        }
    }

    pub fn done(&self) -> bool {
        self.effect.as_ref().is_some_and(Effect::done)
    }
}

/// Draw one frame. Returns where the grid landed, for pointer hit-testing.
pub fn draw(
    frame: &mut Frame,
    session: &Session,
    best: u32,
    theme: &Theme,
    flash: &mut Option<ColumnFlash>,
    drawing: bool,
    now: Instant,
) -> GridGeometry {
    let area = frame.area();
    Block::default()
        .style(Style::default().bg(theme.bg))
        .render(area, frame.buffer_mut());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HUD_HEIGHT),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .split(area);

    draw_hud(frame, session, best, theme, chunks[0]);
    let geometry = draw_board(frame, session, theme, flash.as_ref(), chunks[1]);
    if let Some(f) = flash {
        apply_column_flash(frame, &geometry, theme, f, now);
    }
    draw_footer(frame, session, theme, drawing, chunks[2]);

    match session.state() {
        State::Idle => draw_idle(frame, theme, chunks[1]),
        State::GameOver => draw_game_over(frame, session, theme, chunks[1]),
        State::Playing => {}
    }
    geometry
}

fn draw_hud(frame: &mut Frame, session: &Session, best: u32, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let compact = inner.width < HUD_COMPACT_WIDTH;
    let constraints = if compact {
        vec![Constraint::Fill(1); 2]
    } else {
        vec![Constraint::Fill(1); 3]
    };
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .horizontal_margin(1)
        .split(inner);

    let label = Style::default().fg(theme.inactive_fg);

    // --- System integrity: label above, health bar below ---
    let health_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(cols[0]);
    Paragraph::new(Line::from(Span::styled("SYSTEM INTEGRITY", label)))
        .render(health_rows[0], frame.buffer_mut());
    let health = session.health();
    let bar_width = health_rows[1].width.min(24);
    let bar = Rect {
        width: bar_width,
        ..health_rows[1]
    };
    Gauge::default()
        .ratio((health / MAX_HEALTH).clamp(0.0, 1.0))
        .label(health_label(health))
        .gauge_style(Style::default().fg(theme.health_color(health)).bg(theme.cell))
        .render(bar, frame.buffer_mut());

    // --- Current score ---
    let score_lines = vec![
        Line::from(Span::styled("CURRENT SCORE", label)),
        Line::from(Span::styled(
            format!("{:06}", session.score()),
            Style::default()
                .fg(theme.main_fg)
                .add_modifier(Modifier::BOLD),
        )),
    ];
    Paragraph::new(score_lines)
        .alignment(Alignment::Center)
        .render(cols[1], frame.buffer_mut());

    // --- High score (wide terminals only) ---
    if !compact {
        let best_lines = vec![
            Line::from(Span::styled("HIGH SCORE", label)),
            Line::from(Span::styled(
                format!("{best:06}"),
                Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
            )),
        ];
        Paragraph::new(best_lines)
            .alignment(Alignment::Right)
            .render(cols[2], frame.buffer_mut());
    }
}

/// Health is a multiple of 0.5, so one decimal shows it exactly.
fn health_label(health: f64) -> String {
    format!("{health:.1}%")
}

/// Grid cells; the scanline is drawn as a bar on the left edge of each cell in the scan column.
fn draw_board(
    frame: &mut Frame,
    session: &Session,
    theme: &Theme,
    flash: Option<&ColumnFlash>,
    area: Rect,
) -> GridGeometry {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" feed the matrix ", theme.title));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let grid = session.grid();
    let geometry = GridGeometry::fit(
        inner.x,
        inner.y,
        inner.width,
        inner.height,
        grid.columns(),
        grid.rows(),
    );
    let playing = session.state() == State::Playing;
    let flash_column = flash.map(|f| f.column).filter(|_| playing);
    let buf = frame.buffer_mut();

    for row in 0..grid.rows() {
        for col in 0..grid.columns() {
            let active = grid.is_active(row, col);
            let on_scan = playing && col == session.scan_column();
            let bg = if flash_column == Some(col) || (active && on_scan) {
                theme.scan
            } else if active {
                theme.active
            } else {
                theme.cell
            };
            let (x0, y0) = geometry.cell_origin(CellPos { row, col });
            for y in y0..y0 + geometry.cell_h {
                for x in x0..x0 + geometry.cell_w {
                    if x >= inner.right() || y >= inner.bottom() {
                        continue;
                    }
                    let (symbol, fg) = if on_scan && x == x0 && !active {
                        ("▏", theme.active)
                    } else {
                        (" ", theme.main_fg)
                    };
                    buf[(x, y)]
                        .set_symbol(symbol)
                        .set_style(Style::default().fg(fg).bg(bg));
                }
            }
        }
    }
    geometry
}

/// Buffer positions covered by one grid column.
fn column_positions(geometry: &GridGeometry, column: usize) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for row in 0..geometry.rows as usize {
        let (x0, y0) = geometry.cell_origin(CellPos { row, col: column });
        for y in y0..y0 + geometry.cell_h {
            for x in x0..x0 + geometry.cell_w {
                set.insert((x, y));
            }
        }
    }
    set
}

/// Create or update the column fade and process it.
fn apply_column_flash(
    frame: &mut Frame,
    geometry: &GridGeometry,
    theme: &Theme,
    flash: &mut ColumnFlash,
    now: Instant,
) {
    if flash.column >= geometry.columns as usize {
        return;
    }
    let delta = flash
        .last_process
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
    flash.last_process = Some(now);

    let (x0, y0) = geometry.cell_origin(CellPos { row: 0, col: flash.column });
    let column_rect = Rect {
        x: x0,
        y: y0,
        width: geometry.cell_w,
        height: geometry.rows * (geometry.cell_h + geometry.gap_y),
    }
    .intersection(frame.area());

    if flash.effect.is_none() {
        let positions = column_positions(geometry, flash.column);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            positions.contains(&(pos.x, pos.y))
        }));
        let effect = fx::fade_to(theme.cell, theme.cell, (FLASH_MS, Interpolation::QuadOut))
            .with_filter(filter)
            .with_area(column_rect);
        flash.effect = Some(effect);
    }

    if let Some(effect) = &mut flash.effect {
        frame.render_effect(effect, column_rect, TfxDuration::from_millis(delta_ms));
    }
}

fn draw_footer(frame: &mut Frame, session: &Session, theme: &Theme, drawing: bool, area: Rect) {
    let hint = match session.state() {
        State::Playing if drawing => " feeding…  release to stop ",
        State::Playing => " drag to feed  ·  R restart  ·  Q quit ",
        State::Idle => " Enter initialize  ·  Q quit ",
        State::GameOver => " Enter reboot  ·  Q quit ",
    };
    let line = Line::from(vec![
        Span::styled(hint, Style::default().fg(theme.inactive_fg)),
        Span::styled(
            format!(" {}×{} ", session.columns(), session.rows()),
            Style::default().fg(theme.div_line),
        ),
    ]);
    Paragraph::new(line)
        .alignment(Alignment::Center)
        .render(area, frame.buffer_mut());
}

/// Centred popup of at most `w` x `h`, with the background cleared.
fn popup_area(frame: &mut Frame, area: Rect, w: u16, h: u16) -> Rect {
    let popup = Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    };
    Clear.render(popup, frame.buffer_mut());
    popup
}

fn draw_idle(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = popup_area(frame, area, 36, 8);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " System Offline ",
            Style::default()
                .fg(theme.main_fg)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "FEED THE MATRIX TO SURVIVE",
            Style::default().fg(theme.inactive_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " ▶ INITIALIZE (Enter) ",
            Style::default().fg(Color::Black).bg(theme.active),
        )),
    ];
    Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line))
            .style(Style::default().bg(theme.bg)),
    )
    .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, session: &Session, theme: &Theme, area: Rect) {
    let popup = popup_area(frame, area, 36, 11);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " System Failure ",
            Style::default()
                .fg(Color::White)
                .bg(theme.danger)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("FINAL SCORE", Style::default().fg(theme.inactive_fg))),
        Line::from(Span::styled(
            session.score().to_string(),
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )),
    ];
    if session.new_record() {
        lines.push(Line::from(Span::styled(
            "★ NEW RECORD",
            Style::default().fg(theme.good).add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " ↻ REBOOT (Enter)    Q Quit ",
        Style::default().fg(theme.main_fg),
    )));
    Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.danger))
            .style(Style::default().bg(theme.bg)),
    )
    .render(popup, frame.buffer_mut());
}
