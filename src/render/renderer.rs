use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
};

use crate::coach::{AiTip, TipKind};
use crate::game::{Direction, Phase, Position, Snapshot};

/// Everything around the board that the HUD shows
#[derive(Debug, Clone, Copy)]
pub struct Hud<'a> {
    pub phase: Phase,
    pub grid_size: usize,
    pub score: u32,
    pub high_score: u32,
    pub speed_ms: u64,
    pub muted: bool,
    pub elapsed: &'a str,
    pub games_played: u32,
    pub tip: Option<&'a AiTip>,
    pub tip_loading: bool,
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, board: Snapshot<'_>, hud: &Hud<'_>) {
        let chunks = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([
                Constraint::Length(3), // Scoreboard
                Constraint::Min(0),    // Board + coach
                Constraint::Length(1), // Controls
            ])
            .split(frame.area());

        frame.render_widget(self.render_scoreboard(hud), chunks[0]);

        let board_width = hud.grid_size.saturating_mul(2).saturating_add(2);
        let board_width = u16::try_from(board_width).unwrap_or(u16::MAX);
        let columns = Layout::default()
            .direction(LayoutDirection::Horizontal)
            .constraints([
                Constraint::Length(board_width),
                Constraint::Min(24),
            ])
            .split(chunks[1]);

        let board_widget = match hud.phase {
            Phase::NotStarted => self.render_start_screen(hud),
            Phase::GameOver => self.render_game_over(hud),
            Phase::Running | Phase::Paused => self.render_grid(board, hud),
        };
        frame.render_widget(board_widget, columns[0]);
        frame.render_widget(self.render_coach(hud), columns[1]);

        frame.render_widget(self.render_controls(), chunks[2]);
    }

    fn render_grid(&self, board: Snapshot<'_>, hud: &Hud<'_>) -> Paragraph<'_> {
        let head = board.snake.first().copied();
        let mut lines = Vec::with_capacity(hud.grid_size);

        for y in 0..hud.grid_size {
            let mut spans = Vec::with_capacity(hud.grid_size);

            for x in 0..hud.grid_size {
                let pos = Position::new(x as i32, y as i32);

                let cell = if Some(pos) == head {
                    Span::styled(
                        head_glyph(board.direction),
                        Style::default()
                            .fg(Color::LightGreen)
                            .add_modifier(Modifier::BOLD),
                    )
                } else if board.snake.contains(&pos) {
                    Span::styled("■ ", Style::default().fg(Color::Green))
                } else if pos == board.food {
                    Span::styled(
                        "● ",
                        Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::styled("· ", Style::default().fg(Color::DarkGray))
                };

                spans.push(cell);
            }

            lines.push(Line::from(spans));
        }

        let title = if hud.phase == Phase::Paused {
            " Snake (paused) "
        } else {
            " Snake "
        };

        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        )
    }

    fn render_scoreboard(&self, hud: &Hud<'_>) -> Paragraph<'_> {
        let label = Style::default().fg(Color::Gray);
        let sound = if hud.muted { "muted" } else { "sound on" };

        let text = vec![Line::from(vec![
            Span::styled("Score ", label),
            Span::styled(
                format!("{:04}", hud.score),
                Style::default()
                    .fg(Color::LightGreen)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("    "),
            Span::styled("Best ", label),
            Span::styled(
                format!("{:04}", hud.high_score),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("    "),
            Span::styled("Tick ", label),
            Span::styled(format!("{}ms", hud.speed_ms), Style::default().fg(Color::White)),
            Span::raw("    "),
            Span::styled("Time ", label),
            Span::styled(hud.elapsed.to_string(), Style::default().fg(Color::White)),
            Span::raw("    "),
            Span::styled(sound, Style::default().fg(Color::Cyan)),
        ])];

        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::BOTTOM))
    }

    fn render_start_screen(&self, hud: &Hud<'_>) -> Paragraph<'_> {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "SNAKE",
                Style::default()
                    .fg(Color::LightGreen)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "SPACE",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to start", Style::default().fg(Color::Gray)),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                format!("Best record: {:04}", hud.high_score),
                Style::default().fg(Color::Yellow),
            )),
        ];

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        )
    }

    fn render_game_over(&self, hud: &Hud<'_>) -> Paragraph<'_> {
        let mut text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "GAME OVER",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Final Score: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    hud.score.to_string(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
        ];

        if hud.score > 0 && hud.score == hud.high_score {
            text.push(Line::from(Span::styled(
                "New record!",
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )));
        }

        text.extend([
            Line::from(format!("Games played: {}", hud.games_played)),
            Line::from(""),
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "SPACE",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to play again or ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "Q",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to quit", Style::default().fg(Color::Gray)),
            ]),
        ]);

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
    }

    fn render_coach(&self, hud: &Hud<'_>) -> Paragraph<'_> {
        let body = if hud.tip_loading {
            Line::from(Span::styled(
                "thinking...",
                Style::default().fg(Color::LightGreen),
            ))
        } else if let Some(tip) = hud.tip {
            Line::from(Span::styled(
                format!("\"{}\"", tip.text),
                Style::default()
                    .fg(tip_color(tip.kind))
                    .add_modifier(Modifier::ITALIC),
            ))
        } else {
            Line::from(Span::styled(
                "Awaiting movement data...",
                Style::default().fg(Color::DarkGray),
            ))
        };

        Paragraph::new(vec![Line::from(""), body])
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Green))
                    .title(" Strategy Coach "),
            )
    }

    fn render_controls(&self) -> Paragraph<'_> {
        let text = vec![Line::from(vec![
            Span::styled("↑↓←→", Style::default().fg(Color::Cyan)),
            Span::raw(" or "),
            Span::styled("WASD", Style::default().fg(Color::Cyan)),
            Span::raw(" to move | "),
            Span::styled("SPACE", Style::default().fg(Color::Cyan)),
            Span::raw(" pause | "),
            Span::styled("M", Style::default().fg(Color::Cyan)),
            Span::raw(" mute | "),
            Span::styled("R", Style::default().fg(Color::Cyan)),
            Span::raw(" restart | "),
            Span::styled("Q", Style::default().fg(Color::Red)),
            Span::raw(" to quit"),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn head_glyph(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "▲ ",
        Direction::Down => "▼ ",
        Direction::Left => "◀ ",
        Direction::Right => "▶ ",
    }
}

fn tip_color(kind: TipKind) -> Color {
    match kind {
        TipKind::Strategy => Color::White,
        TipKind::Commentary => Color::Gray,
        TipKind::Congrats => Color::LightYellow,
    }
}
