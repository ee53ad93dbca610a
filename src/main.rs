use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use crossterm::event::KeyEventKind;
use ratatui::prelude::*;

mod app;
mod classify;
mod collector;
mod config;
mod db;
mod error;
mod keywords;
mod models;
mod tui;

use app::App;
use config::Config;
use error::Result;
use tui::{draw, handle_key_event};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Load configuration
    let config = Config::load()?;

    // Check for --import-keywords flag
    let import_path = if args.len() >= 3 && args[1] == "--import-keywords" {
        Some(PathBuf::from(&args[2]))
    } else {
        None
    };

    // Check for headless collection flags
    let headless_collect = args.len() >= 2 && args[1] == "--collect";
    let watch = args.len() >= 2 && args[1] == "--watch";

    // Initialize app
    let mut app = App::new(&config).await?;

    // If an import path was provided, import keywords and exit
    if let Some(path) = import_path {
        let added = app.import_keywords_from(&path).await?;
        println!("Added {} keywords from {:?} (duplicates ignored)", added, path);
        return Ok(());
    }

    // If headless collect, run one cycle and exit
    if headless_collect {
        let report = app.collect_blocking().await?;
        println!("Collected: {report}");
        return Ok(());
    }

    // If watching, collect on an interval forever
    if watch {
        let interval = Duration::from_secs(u64::from(config.collect_interval_minutes) * 60);
        loop {
            match app.collect_blocking().await {
                Ok(report) => println!("Collected: {report}"),
                Err(e) => eprintln!("Collection cycle failed: {e}"),
            }
            tracing::info!("Sleeping {}s...", interval.as_secs());
            tokio::time::sleep(interval).await;
        }
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        // Poll for a completed background collection run
        app.poll_collect_result().await?;

        // Poll for events with timeout to allow async operations
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = handle_key_event(
                        key,
                        app.keyword_input_active,
                        app.import_input_active,
                        app.show_help,
                    ) {
                        let should_quit = app.handle_action(action).await?;
                        if should_quit {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
