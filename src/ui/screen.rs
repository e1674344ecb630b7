use ratatui::Frame;
use spelldrill::session::Phase;

use crate::{ui::summary::render_summary, App};

/// A UI Screen boundary: responsible for rendering one phase of the session
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Presenting screen - the word countdown, answer box and feedback
pub struct PresentingScreen;

impl Screen for PresentingScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Photo prompt while paper answers wait for validation
pub struct ValidationScreen;

impl Screen for ValidationScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Summary screen - uses dedicated renderer
pub struct SummaryScreen;

impl Screen for SummaryScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_summary(app, f.area(), f.buffer_mut());
    }
}

/// Helper to construct the appropriate screen for the current phase
pub fn current_screen(phase: Phase) -> Box<dyn Screen> {
    match phase {
        Phase::Finished => Box::new(SummaryScreen),
        phase if phase.is_awaiting_validation() => Box::new(ValidationScreen),
        _ => Box::new(PresentingScreen),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::tests::create_test_app;
    use ratatui::{backend::TestBackend, Terminal};
    use spelldrill::session::{InputMode, RunningPhase};

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal
            .draw(|f| current_screen(app.controller.phase()).render(app, f))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_screen_for_each_phase_renders() {
        for phase in [
            Phase::Idle,
            Phase::Running(RunningPhase::Presenting),
            Phase::Running(RunningPhase::AwaitingValidation),
            Phase::Finished,
        ] {
            let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
            let app = create_test_app("cat", InputMode::Typed);
            terminal
                .draw(|f| current_screen(phase).render(&app, f))
                .unwrap();
        }
    }

    #[test]
    fn test_finished_session_draws_summary() {
        let mut app = create_test_app("cat, dog", InputMode::Typed);
        app.controller.end_early().unwrap();
        let rendered = draw(&app);
        assert!(rendered.contains("Score 0 / 0"));
    }

    #[test]
    fn test_running_session_draws_word_screen() {
        let app = create_test_app("cat, dog", InputMode::Typed);
        assert!(draw(&app).contains("Word 1 of 2"));
    }
}
