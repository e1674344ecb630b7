pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use itertools::Itertools;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use spelldrill::{
    app_dirs::AppDirs,
    collaborators::{
        BellCuePlayer, CommandSpeaker, CuePlayer, SilentCuePlayer, SilentSpeaker, Speaker,
    },
    config::{
        read_word_source, Config, ConfigError, ConfigStore, FileConfigStore, VALIDATOR_TOKEN_ENV,
    },
    controller::{SessionController, SessionError},
    events::SessionEvent,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    session::{InputMode, Phase, SessionSettings},
    validation::ValidationError,
    validator::{HttpValidator, ImagePayload, UnconfiguredValidator, Validator},
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::{mpsc::Sender, Arc, Mutex},
    thread,
    time::Duration,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt::time::ChronoLocal, EnvFilter};

const TICK_RATE_MS: u64 = 100;

/// spelling practice with spoken words, countdowns and hints
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Spelling practice in the terminal. Each word is read aloud and you type it, or write it on paper and have a photo of the sheet checked at the end."
)]
pub struct Cli {
    /// words to practise, separated by commas or newlines
    #[clap(short = 'w', long, conflicts_with = "word_file")]
    words: Option<String>,

    /// read the words to practise from a file
    #[clap(short = 'f', long)]
    word_file: Option<PathBuf>,

    /// seconds allowed per word
    #[clap(short = 't', long, value_parser = clap::value_parser!(u32).range(1..))]
    time_limit: Option<u32>,

    /// number of words drawn from the built-in list when no words are given
    #[clap(short = 'n', long, value_parser = clap::value_parser!(u32).range(1..))]
    count: Option<u32>,

    /// present the words in random order
    #[clap(long, conflicts_with = "ordered")]
    random: bool,

    /// present the words in list order, overriding a saved --random
    #[clap(long)]
    ordered: bool,

    /// write answers on paper and validate a photo of the sheet at the end
    #[clap(long, conflicts_with = "typed")]
    paper: bool,

    /// type answers, overriding a saved --paper
    #[clap(long)]
    typed: bool,

    /// endpoint that checks photographed answer sheets
    #[clap(long)]
    validator_url: Option<String>,

    /// bearer token for the validation endpoint
    #[clap(long, env = VALIDATOR_TOKEN_ENV, hide_env_values = true)]
    validator_token: Option<String>,

    /// do not speak words or ring the bell
    #[clap(long, conflicts_with = "sound")]
    silent: bool,

    /// speak words and ring the bell, overriding a saved --silent
    #[clap(long)]
    sound: bool,

    /// store the resulting settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Layer the flags that were given over the stored config
    fn merge_into(&self, mut config: Config) -> Result<Config, ConfigError> {
        if let Some(path) = &self.word_file {
            config.word_source = Some(read_word_source(path)?);
        } else if let Some(words) = &self.words {
            config.word_source = Some(words.clone());
        }
        if let Some(secs) = self.time_limit {
            config.time_limit_secs = secs;
        }
        if let Some(count) = self.count {
            config.word_count = count as usize;
        }
        if self.random {
            config.random_order = true;
        } else if self.ordered {
            config.random_order = false;
        }
        if self.paper {
            config.input_mode = InputMode::Paper;
        } else if self.typed {
            config.input_mode = InputMode::Typed;
        }
        if let Some(url) = &self.validator_url {
            config.validator_url = Some(url.clone());
        }
        if self.silent {
            config.silent = true;
        } else if self.sound {
            config.silent = false;
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitType {
    Restart,
    Quit,
}

pub struct App {
    pub controller: SessionController,
    pub settings: SessionSettings,
    pub answer_input: String,
    pub photo_input: String,
    pub status: Option<String>,
    speaker: Box<dyn Speaker>,
    cues: Box<dyn CuePlayer>,
    validator: Arc<dyn Validator>,
    events_tx: Sender<AppEvent>,
}

impl App {
    pub fn new(
        config: &Config,
        validator: Arc<dyn Validator>,
        events_tx: Sender<AppEvent>,
    ) -> Self {
        let (speaker, cues): (Box<dyn Speaker>, Box<dyn CuePlayer>) = if config.silent {
            (Box::new(SilentSpeaker), Box::new(SilentCuePlayer))
        } else {
            (Box::new(CommandSpeaker::new()), Box::new(BellCuePlayer))
        };
        Self::with_parts(
            SessionController::new(),
            SessionSettings::from(config),
            speaker,
            cues,
            validator,
            events_tx,
        )
    }

    pub fn with_parts(
        controller: SessionController,
        settings: SessionSettings,
        speaker: Box<dyn Speaker>,
        cues: Box<dyn CuePlayer>,
        validator: Arc<dyn Validator>,
        events_tx: Sender<AppEvent>,
    ) -> Self {
        Self {
            controller,
            settings,
            answer_input: String::new(),
            photo_input: String::new(),
            status: None,
            speaker,
            cues,
            validator,
            events_tx,
        }
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        self.answer_input.clear();
        self.photo_input.clear();
        self.status = None;
        let started = self.controller.start_session(&self.settings);
        self.pump_events();
        started
    }

    pub fn restart(&mut self) -> Result<(), SessionError> {
        self.controller.reset();
        self.start()
    }

    pub fn on_tick(&mut self) {
        self.controller.tick();
        self.pump_events();
    }

    pub fn on_validation(&mut self, ticket: u64, outcome: Result<String, ValidationError>) {
        if let Err(e) = self.controller.complete_validation(ticket, outcome) {
            debug!(ticket, "dropping validation outcome: {e}");
        }
        self.pump_events();
    }

    /// Route queued session events to speech, sound and the status line
    fn pump_events(&mut self) {
        for event in self.controller.drain_events() {
            match event {
                SessionEvent::Speak(word) => self.speaker.speak(&word),
                SessionEvent::Cue(cue) => self.cues.play(cue),
                SessionEvent::WordPresented { .. } => self.answer_input.clear(),
                SessionEvent::UploadReady => {
                    self.status = Some("Last word: get your answer sheet ready".to_string());
                }
                SessionEvent::PhotoRequested { words } => {
                    debug!(words = %words.iter().join(", "), "photo requested");
                    self.status = Some(format!(
                        "Take a photo of your {} written words and enter its path",
                        words.len()
                    ));
                }
                SessionEvent::ValidationStarted { .. } => {
                    self.status = Some("Checking your answers...".to_string());
                }
                SessionEvent::Finished => self.status = None,
                _ => {}
            }
        }
    }

    fn apply(&mut self, result: Result<(), SessionError>) {
        if let Err(e) = result {
            debug!("key ignored: {e}");
        }
        self.pump_events();
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<ExitType> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            return Some(ExitType::Quit);
        }

        match self.controller.phase() {
            Phase::Idle | Phase::Finished => match key.code {
                KeyCode::Char('r') => return Some(ExitType::Restart),
                KeyCode::Char('q') | KeyCode::Esc => return Some(ExitType::Quit),
                _ => {}
            },
            phase if phase.is_awaiting_validation() => self.handle_photo_key(key),
            _ => match self.controller.input_mode() {
                Some(InputMode::Paper) => self.handle_paper_key(key, ctrl),
                _ => self.handle_typed_key(key, ctrl),
            },
        }
        None
    }

    fn handle_typed_key(&mut self, key: KeyEvent, ctrl: bool) {
        match key.code {
            KeyCode::Esc => {
                let result = self.controller.end_early();
                self.apply(result);
            }
            KeyCode::Enter => {
                if self.answer_input.trim().is_empty() {
                    return;
                }
                let answer = std::mem::take(&mut self.answer_input);
                let result = self.controller.submit_answer(&answer).map(|_| ());
                self.apply(result);
            }
            KeyCode::Tab => {
                let result = self.controller.request_hint().map(|_| ());
                self.apply(result);
            }
            KeyCode::Backspace => {
                self.answer_input.pop();
            }
            KeyCode::Char('s') if ctrl => {
                let result = self.controller.skip_word();
                self.apply(result);
            }
            KeyCode::Char('p') if ctrl => {
                let result = self.controller.replay_word();
                self.apply(result);
            }
            KeyCode::Char(c) if !ctrl && (c.is_alphabetic() || c == '\'' || c == '-') => {
                if !self.controller.is_word_resolved() {
                    self.answer_input.push(c);
                }
            }
            _ => {}
        }
    }

    fn handle_paper_key(&mut self, key: KeyEvent, ctrl: bool) {
        let result = match key.code {
            KeyCode::Esc => self.controller.end_early(),
            KeyCode::Enter | KeyCode::Right => self.controller.advance_manually(),
            KeyCode::Char('r') if ctrl => self.controller.reveal_answer(),
            KeyCode::Char('p') if ctrl => self.controller.replay_word(),
            _ => return,
        };
        self.apply(result);
    }

    fn handle_photo_key(&mut self, key: KeyEvent) {
        if self.controller.is_validation_in_flight() {
            return;
        }
        match key.code {
            KeyCode::Enter => self.submit_photo(),
            KeyCode::Esc => {
                let result = self.controller.fail_validation(ValidationError::Unavailable(
                    "answer check skipped".to_string(),
                ));
                self.apply(result);
            }
            KeyCode::Backspace => {
                self.photo_input.pop();
            }
            KeyCode::Char(c) => self.photo_input.push(c),
            _ => {}
        }
    }

    /// Encode the photo and hand the request to a worker thread
    fn submit_photo(&mut self) {
        let path = self.photo_input.trim().to_string();
        if path.is_empty() {
            self.status = Some("Enter the path to a photo of your answers".to_string());
            return;
        }
        let payload = match ImagePayload::from_file(&path) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("photo rejected: {e}");
                self.status = Some(format!("{e}"));
                return;
            }
        };

        let request = match self.controller.begin_validation(vec![payload.into_inner()]) {
            Ok(request) => request,
            Err(e) => {
                self.apply(Err(e));
                return;
            }
        };
        self.pump_events();

        let validator = Arc::clone(&self.validator);
        let tx = self.events_tx.clone();
        thread::spawn(move || {
            let outcome = validator.validate(&request);
            // the loop may have quit already
            let _ = tx.send(AppEvent::Validation {
                ticket: request.ticket,
                outcome,
            });
        });
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_env("SPELLDRILL_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::rfc_3339())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
}

fn build_validator(cli: &Cli, config: &Config) -> Result<Arc<dyn Validator>, ValidationError> {
    Ok(match config.resolved_validator_url() {
        Some(url) => {
            info!(endpoint = %url, "answer sheets will be validated remotely");
            Arc::new(HttpValidator::new(url, cli.validator_token.clone())?)
        }
        None => Arc::new(UnconfiguredValidator),
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();

    let store = FileConfigStore::new();
    let config = cli.merge_into(store.load())?;
    if cli.save_config {
        store.save(&config)?;
        info!(path = %store.path().display(), "settings saved");
    }
    let validator = build_validator(&cli, &config)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let mut app = App::new(&config, validator, runner.sender());
    app.start()?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<CrosstermEventSource, FixedTicker>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui(app, f))?;

    loop {
        match runner.step() {
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                match app.handle_key(key) {
                    Some(ExitType::Quit) => break,
                    Some(ExitType::Restart) => app.restart()?,
                    None => {}
                }
            }
            AppEvent::Validation { ticket, outcome } => app.on_validation(ticket, outcome),
        }
        terminal.draw(|f| ui(app, f))?;
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    ui::screen::current_screen(app.controller.phase()).render(app, f);
}
