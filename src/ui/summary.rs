use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget, Wrap},
};
use spelldrill::{
    session::SessionSummary,
    util::{format_time, percentage},
    validation::ValidationResult,
};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

fn score_line(summary: &SessionSummary) -> String {
    let mut line = format!(
        "Score {} / {}",
        summary.score, summary.total_words_presented
    );
    if let Some(pct) = percentage(summary.score, summary.total_words_presented) {
        line.push_str(&format!(" ({pct}%)"));
    }
    line
}

fn verdict_table(result: &ValidationResult) -> Table<'_> {
    let header = Row::new(["word", "", "written"])
        .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));

    let rows = result.results.iter().map(|verdict| {
        let (mark, color) = if verdict.is_correct {
            ("✓", Color::Green)
        } else {
            ("✗", Color::Red)
        };
        Row::new([
            Cell::from(verdict.word.as_str()),
            Cell::from(Span::styled(mark, Style::default().fg(color))),
            Cell::from(verdict.written_form.as_str()),
        ])
    });

    Table::new(
        rows,
        [
            Constraint::Percentage(45),
            Constraint::Length(3),
            Constraint::Percentage(45),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::TOP).title("answer sheet"))
}

/// Final screen: score, time and the per-word verdicts of a paper session
pub fn render_summary(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(summary) = app.controller.summary() else {
        return;
    };
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // title
            Constraint::Length(1),
            Constraint::Length(1), // score
            Constraint::Length(1), // time / mode
            Constraint::Length(2), // validation error
            Constraint::Min(1),    // verdicts
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled(
        "Session complete",
        bold_style.fg(Color::Magenta),
    ))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    Paragraph::new(Span::styled(score_line(summary), bold_style))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    let details = Line::from(vec![
        Span::raw(format!("Time {}", format_time(summary.elapsed))),
        Span::raw("   "),
        Span::raw(format!("Mode {}", summary.input_mode)),
        Span::raw("   "),
        Span::styled(
            format!("Started {}", summary.started_at.format("%Y-%m-%d %H:%M")),
            italic_style,
        ),
    ]);
    Paragraph::new(details)
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    if let Some(error) = &summary.validation_error {
        Paragraph::new(Span::styled(
            error.user_message(),
            Style::default().fg(Color::Red),
        ))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[4], buf);
    }

    if let Some(result) = &summary.validation {
        verdict_table(result).render(chunks[5], buf);
    }

    Paragraph::new(Span::styled("(r)estart / (q)uit", italic_style)).render(chunks[6], buf);
}
