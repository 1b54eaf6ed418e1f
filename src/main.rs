use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};

use mnemo::{
    app::{App, Command},
    app_dirs::AppDirs,
    coach::LinkMethodAdvisor,
    config::{Config, ConfigStore, FileConfigStore, Locale},
    discipline::Discipline,
    generator::ContentGenerator,
    history::{self, HistoryStore, MemoryHistoryStore, SqliteHistoryStore},
    logging,
    runtime::{CrosstermEventSource, FixedTicker, Jobs, Runner},
    session::Session,
};

const TICK_RATE_MS: u64 = 100;

/// memory sports drills in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Timed memory drills for numbers, binaries, cards, words, names, images and colors, with scored recall, run history and mnemonic coaching."
)]
pub struct Cli {
    /// drill to preselect
    #[clap(short = 'd', long, value_enum)]
    discipline: Option<Discipline>,

    /// number of items to memorize
    #[clap(short = 'n', long)]
    quantity: Option<usize>,

    /// seconds allowed for memorizing
    #[clap(short = 't', long = "time-limit")]
    time_limit: Option<u32>,

    /// items per minute to auto-advance at, 0 for manual
    #[clap(short = 'p', long)]
    pace: Option<u32>,

    /// digits or bits shown together (numbers and binaries)
    #[clap(short = 'g', long)]
    grouping: Option<usize>,

    /// language for word and name lists
    #[clap(short = 'l', long, value_enum)]
    locale: Option<Locale>,

    /// write run history as CSV to this path and exit
    #[clap(long, value_name = "PATH")]
    export_history: Option<PathBuf>,

    /// delete all run history and exit
    #[clap(long)]
    clear_history: bool,
}

impl Cli {
    /// Command-line flags win over remembered preferences.
    fn apply(&self, config: &mut Config) {
        if let Some(d) = self.discipline {
            config.discipline = d;
        }
        if let Some(q) = self.quantity {
            config.quantity = q;
        }
        if let Some(t) = self.time_limit {
            config.time_limit_secs = t;
        }
        if let Some(p) = self.pace {
            config.pace_items_per_minute = p;
        }
        if let Some(g) = self.grouping {
            config.grouping = g;
        }
        if let Some(l) = self.locale {
            config.locale = l;
        }
    }
}

fn open_history() -> Box<dyn HistoryStore> {
    match SqliteHistoryStore::open_default() {
        Ok(store) => Box::new(store),
        Err(err) => {
            tracing::warn!(%err, "history database unavailable, keeping runs in memory");
            Box::new(MemoryHistoryStore::new())
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let _log_guard = logging::init_tracing(AppDirs::log_dir().as_deref());

    let store = FileConfigStore::new();
    let mut config = store.load();
    cli.apply(&mut config);
    let settings = match config.session_config() {
        Ok(settings) => settings,
        Err(err) => Cli::command().error(ErrorKind::ValueValidation, err).exit(),
    };

    let mut history = open_history();
    if let Some(path) = &cli.export_history {
        let entries = history.read_all()?;
        let written = history::export_csv(&entries, path)?;
        println!("exported {written} runs to {}", path.display());
        return Ok(());
    }
    if cli.clear_history {
        history.clear_all()?;
        println!("history cleared");
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    tracing::info!(discipline = %config.discipline, ?settings, locale = %config.locale, "starting");
    let session = Session::new(history).with_settings(config.discipline, settings, config.locale);
    let mut app = App::new(session, config, Box::new(store));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let events = CrosstermEventSource::new();
    let jobs = Jobs::new(
        events.sender(),
        Arc::new(ContentGenerator::bundled()),
        Arc::new(LinkMethodAdvisor),
    );
    let runner = Runner::new(events, FixedTicker::new(Duration::from_millis(TICK_RATE_MS)));

    loop {
        terminal.draw(|f| ui(app, f))?;
        match app.on_event(runner.step(), Instant::now()) {
            Some(Command::Quit) => break,
            Some(Command::Generate(req)) => jobs.generate(req),
            Some(Command::Advise(req)) => jobs.advise(req),
            None => {}
        }
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
