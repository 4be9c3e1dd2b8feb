use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use undercover::app::AppCoordinator;
use undercover::config::{self, Settings};
use undercover::tui::{self, Tui};

/// How often the event loop wakes up to check for a guess verdict
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Log to a file. Stdout belongs to the game screen.
fn init_logging() -> Option<PathBuf> {
    let dir = config::log_dir()?;
    std::fs::create_dir_all(&dir).ok()?;
    let path = dir.join("undercover.log");
    let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;
    let filter = EnvFilter::try_from_env("UNDERCOVER_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Some(path)
}

fn main() -> io::Result<()> {
    let log_path = init_logging();
    tracing::info!(log = ?log_path, "Undercover starting");

    let settings = Settings::load();
    let warnings = settings.validate();
    let mut app = AppCoordinator::new(&settings);
    app.show_warnings(&warnings);

    tui::install_panic_hook();
    let mut terminal = Tui::new()?;
    terminal.enter()?;

    let tick_rate = Duration::from_secs(1);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|frame| tui::render(frame, &app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO)
            .min(POLL_INTERVAL);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (not release)
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            app.quit();
                        }
                        KeyCode::Esc => app.on_escape(),
                        KeyCode::Enter => app.on_enter(),
                        KeyCode::Backspace => app.on_backspace(),
                        KeyCode::Tab => app.on_tab(),
                        KeyCode::Up => app.on_up(),
                        KeyCode::Down => app.on_down(),
                        KeyCode::F(2) => app.draw_words(),
                        KeyCode::Char(c) => app.on_char(c),
                        _ => {}
                    }
                }
            }
        }

        app.poll();

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }

    tracing::info!("Undercover exiting");
    // Terminal cleanup happens automatically via Tui::drop
    Ok(())
}
