use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{fs, io, sync::Arc};
use taskboard::{
    config::{Cli, Command, Config},
    ui::{run_app, App},
    BoardStore, FileGateway, MemoryGateway, NoticeLog, PersistenceGateway, SharedTheme,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log to a file in the data directory; the terminal belongs to the board.
fn init_tracing(config: &Config) -> io::Result<()> {
    fs::create_dir_all(&config.data_dir)?;
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())?;

    let filter = if config.debug {
        EnvFilter::new(config.default_filter())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.default_filter()))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(std::sync::Mutex::new(file)),
        )
        .with(filter)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::from(&cli);
    init_tracing(&config)?;
    tracing::debug!("taskboard starting with {:?}", config);

    let runtime = tokio::runtime::Runtime::new()?;
    let gateway: Arc<dyn PersistenceGateway> = if config.in_memory {
        Arc::new(MemoryGateway::new())
    } else {
        Arc::new(FileGateway::new(&config.data_dir))
    };

    let theme = SharedTheme::default();
    let notices = Arc::new(NoticeLog::default());
    let store = Arc::new(
        BoardStore::new(gateway)
            .with_sink(notices.clone())
            .with_appearance(Arc::new(theme.clone())),
    );

    if let Some(Command::Reset) = cli.command {
        runtime.block_on(store.reset())?;
        println!("Board cleared in {}", config.data_dir.display());
        return Ok(());
    }

    runtime.block_on(store.initialize());

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store, theme, notices);
    let result = run_app(&mut terminal, &mut app, &runtime);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!("board loop failed: {}", err);
        eprintln!("{:?}", err);
    }
    Ok(())
}
