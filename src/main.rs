use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::EnvFilter;

use barline::{
    build_scheduler, events, run_alongside, slot_table, ui, App, BarConfig, JsonSink, Palette,
    TextSink, Theme,
};
use barline_sdk::{shutdown_channel, Aggregator, Output, Scheduler, Shutdown, ShutdownTrigger};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputMode {
    /// One line of text per update on stdout
    Text,
    /// One JSON snapshot per line on stdout
    Json,
    /// Interactive terminal preview
    Preview,
}

#[derive(Parser, Debug)]
#[command(name = "barline")]
#[command(about = "Status bar daemon: polls system providers and publishes colored segments")]
struct Args {
    /// Path to the configuration file
    /// [default: $XDG_CONFIG_HOME/barline/config.toml]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How to publish the bar
    #[arg(short, long, value_enum, default_value_t = OutputMode::Text)]
    output: OutputMode,

    /// Validate the configuration, print the slot table and exit
    #[arg(long)]
    check: bool,

    /// Disable ANSI colors in text output
    #[arg(long)]
    no_color: bool,

    /// Also write each snapshot as JSON to this file
    #[arg(long)]
    json_file: Option<PathBuf>,

    /// Also stream snapshots as JSON lines to this TCP endpoint (host:port)
    #[arg(long)]
    tcp: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("barline=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let path = match args.config {
        Some(ref path) => path.clone(),
        None => BarConfig::default_path()?,
    };
    let bar = BarConfig::load(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;

    if args.check {
        build_scheduler(&bar, Scheduler::builder())?;
        print!("{}", slot_table(&bar));
        return Ok(());
    }

    let palette = Palette::from_config(&bar.theme)?;

    let mut builder = Scheduler::builder();
    if let Some(ref file) = args.json_file {
        builder = builder.sink(Box::new(Output::file(file)));
    }
    if let Some(ref addr) = args.tcp {
        builder = builder.sink(Box::new(Output::tcp(addr)));
    }
    builder = match args.output {
        OutputMode::Text => {
            let sink = TextSink::new(tokio::io::stdout(), bar.separator.clone());
            let sink = if args.no_color { sink } else { sink.colored(palette) };
            builder.sink(Box::new(sink))
        }
        OutputMode::Json => builder.sink(Box::new(JsonSink::new(tokio::io::stdout()))),
        OutputMode::Preview => builder,
    };

    let scheduler = build_scheduler(&bar, builder)?;
    tracing::info!(slots = scheduler.slots().len(), config = %path.display(), "starting");

    let (trigger, shutdown) = shutdown_channel();
    let trigger = Arc::new(trigger);
    tokio::spawn(shutdown_on_signal(trigger.clone()));

    if args.output == OutputMode::Preview {
        let aggregator = scheduler.aggregator();
        let theme = Theme::auto_detect(palette);
        let separator = bar.separator.clone();
        run_alongside(scheduler, trigger, shutdown, move |listener| {
            run_preview(aggregator, separator, theme, listener)
        })
        .await?;
    } else {
        scheduler.run(shutdown).await?;
    }

    tracing::info!("stopped");
    Ok(())
}

/// Fire the shutdown trigger on Ctrl-C or SIGTERM.
async fn shutdown_on_signal(trigger: Arc<ShutdownTrigger>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    let _ = tokio::signal::ctrl_c().await;

    tracing::info!("shutdown requested");
    trigger.trigger();
}

/// Run the preview until the user quits or shutdown is signalled.
fn run_preview(
    aggregator: Arc<Aggregator>,
    separator: String,
    theme: Theme,
    shutdown: Shutdown,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Restore the terminal if anything panics while it is in raw mode
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let mut app = App::new(aggregator, separator, theme);
    let result = preview_loop(&mut terminal, &mut app, &shutdown);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn preview_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    shutdown: &Shutdown,
) -> Result<()> {
    while app.running && !shutdown.is_triggered() {
        app.refresh();
        terminal.draw(|frame| ui::draw(frame, app))?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                _ => {}
            }
        }
    }
    Ok(())
}
