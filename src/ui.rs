pub mod screen;
pub mod summary;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use spelldrill::{events::Feedback, session::InputMode, util::format_time};
use unicode_width::UnicodeWidthStr;

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const MIN_INPUT_WIDTH: u16 = 20;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn feedback_style(feedback: &Feedback) -> Style {
    let color = match feedback {
        Feedback::Correct => Color::Green,
        Feedback::Incorrect { .. } | Feedback::TimeExpired { .. } => Color::Red,
        Feedback::Hint { .. } | Feedback::NoMoreHints => Color::Yellow,
        Feedback::Skipped { .. } | Feedback::Revealed { .. } => Color::Cyan,
    };
    bold().fg(color)
}

/// A horizontally centered strip of `width` columns inside `area`
fn centered(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    }
}

/// Bordered one-line input box sized to its content
fn render_input(label: &str, value: &str, area: Rect, buf: &mut Buffer) {
    let content = format!("{value}_");
    let width = (content.width() as u16 + 4).max(MIN_INPUT_WIDTH);
    Paragraph::new(Span::styled(content, bold()))
        .block(Block::default().borders(Borders::ALL).title(label))
        .render(centered(area, width), buf);
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.controller.phase().is_awaiting_validation() {
            render_awaiting_validation(self, area, buf);
        } else {
            render_presenting(self, area, buf);
        }
    }
}

fn render_presenting(app: &App, area: Rect, buf: &mut Buffer) {
    let controller = &app.controller;
    let Some(mode) = controller.input_mode() else {
        Paragraph::new(Span::styled("Getting ready...", italic()))
            .alignment(Alignment::Center)
            .render(area, buf);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // progress / score / clock
            Constraint::Min(1),
            Constraint::Length(1), // countdown
            Constraint::Length(1), // prompt
            Constraint::Length(1),
            Constraint::Length(3), // answer input
            Constraint::Length(2), // feedback
            Constraint::Min(1),
            Constraint::Length(1), // status
            Constraint::Length(1), // legend
        ])
        .split(area);

    let header = format!(
        "Word {} of {}   Score {}   {}",
        (controller.current_index() + 1).min(controller.total_words()),
        controller.total_words(),
        controller.score(),
        format_time(controller.elapsed()),
    );
    Paragraph::new(Span::styled(header, bold()))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    if let Some(countdown) = controller.countdown() {
        let style = if countdown.is_warning() {
            bold().fg(Color::Red)
        } else {
            dim_bold()
        };
        Paragraph::new(Span::styled(format!("{}s", countdown.remaining()), style))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
    }

    let prompt = match mode {
        InputMode::Typed => "Listen, then type the word",
        InputMode::Paper => "Listen, then write the word on your paper",
    };
    Paragraph::new(Span::styled(prompt, italic()))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    if mode == InputMode::Typed {
        render_input("answer", &app.answer_input, chunks[5], buf);
    }

    if let Some(feedback) = controller.feedback() {
        Paragraph::new(Span::styled(feedback.to_string(), feedback_style(feedback)))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[6], buf);
    }

    if let Some(status) = &app.status {
        Paragraph::new(Span::styled(status.as_str(), italic().fg(Color::Gray)))
            .alignment(Alignment::Center)
            .render(chunks[8], buf);
    }

    let legend = match mode {
        InputMode::Typed => {
            "(enter) submit / (tab) hint / (ctrl+s) skip / (ctrl+p) replay / (esc) end"
        }
        InputMode::Paper => "(enter) next / (ctrl+r) reveal / (ctrl+p) replay / (esc) end",
    };
    Paragraph::new(Span::styled(legend, italic())).render(chunks[9], buf);
}

fn render_awaiting_validation(app: &App, area: Rect, buf: &mut Buffer) {
    let controller = &app.controller;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1), // title
            Constraint::Length(2), // words
            Constraint::Length(3), // photo path
            Constraint::Length(2), // status
            Constraint::Min(1),
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled("Photograph your answer sheet", bold()))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let words = controller.presented_words();
    Paragraph::new(Line::from(vec![
        Span::styled(format!("{} words: ", words.len()), dim_bold()),
        Span::raw(words.join(", ")),
    ]))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(chunks[2], buf);

    let in_flight = controller.is_validation_in_flight();
    if !in_flight {
        render_input("photo path", &app.photo_input, chunks[3], buf);
    }

    let status = if in_flight {
        Some("Checking your answers...")
    } else {
        app.status.as_deref()
    };
    if let Some(status) = status {
        Paragraph::new(Span::styled(status, italic().fg(Color::Yellow)))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[4], buf);
    }

    if !in_flight {
        Paragraph::new(Span::styled("(enter) check / (esc) skip check", italic()))
            .render(chunks[6], buf);
    }
}
