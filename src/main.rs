use std::fs::File;
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{LevelFilter, error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, WriteLogger};

use signboard::deck::RichText;
use signboard::deck::edit::{self, Direction};
use signboard::event_source::KeyboardEventSource;
use signboard::main_app::{App, TerminalViewport, run_app_with_event_source};
use signboard::motd;
use signboard::panic_handler::initialize_panic_handler;
use signboard::playback::{
    Collaborators, DocumentDecoder, Locator, LocatorFetcher, PlayerConfig, parse_hex_color,
};
use signboard::settings::{self, DeckSourceConfig, DocumentSourceConfig, Settings};
use signboard::sources::{
    DeckSource, DocumentSource, FileDeckStore, HttpDeckSource, HttpDocumentSource,
    LocalDocumentSource,
};

#[derive(Parser)]
#[command(name = "signboard", version)]
#[command(about = "Terminal signage player: a PDF on autoplay, alternating with an announcement board")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Show this document instead of asking the document source
    #[arg(long, global = true)]
    document: Option<String>,

    /// Start in TV mode
    #[arg(long, global = true)]
    tv: bool,

    /// Autoplay interval in milliseconds (snapped to 5000/8000/10000/15000/20000)
    #[arg(long, global = true)]
    interval: Option<u64>,

    /// Settings file to use instead of the one in the config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "signboard.log")]
    log_file: PathBuf,

    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the player (default)
    Play,
    /// Publish a PDF and make it the active document
    Upload { file: PathBuf },
    /// Unpublish the active document
    Clear,
    /// Edit the announcement board
    Deck {
        #[command(subcommand)]
        command: DeckCommand,
    },
    /// Print the message of the day
    Message {
        /// Pick for this date (YYYY-MM-DD) instead of today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Print the full pick as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum DeckCommand {
    /// List every slide with its visibility
    List,
    /// Append an empty slide
    Add,
    Remove { id: String },
    Show { id: String },
    Hide { id: String },
    Move {
        id: String,
        #[arg(value_enum)]
        direction: MoveDirection,
    },
    Rename { id: String, title: String },
    /// Flip a slide between shown and hidden
    Toggle { id: String },
    /// Replace the heading and body shown on a slide
    Edit {
        id: String,
        #[arg(long)]
        heading: Option<String>,
        /// Body text, one paragraph per line
        #[arg(long)]
        body: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MoveDirection {
    Up,
    Down,
}

impl From<MoveDirection> for Direction {
    fn from(d: MoveDirection) -> Self {
        match d {
            MoveDirection::Up => Direction::Up,
            MoveDirection::Down => Direction::Down,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    WriteLogger::init(
        cli.log_level,
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("cannot create log file {}", cli.log_file.display()))?,
    )?;

    if let Some(path) = &cli.config {
        settings::set_config_path(path.clone());
    }
    settings::load_settings();
    let settings = settings::get_settings();

    match cli.command {
        None | Some(Commands::Play) => play(&cli, &settings),
        Some(Commands::Upload { ref file }) => upload(&settings, file),
        Some(Commands::Clear) => clear(&settings),
        Some(Commands::Deck { ref command }) => deck(&settings, command),
        Some(Commands::Message { date, json }) => message_of_day(&settings, date, json),
    }
}

fn fetch_timeout(settings: &Settings) -> Duration {
    Duration::from_secs(settings.fetch_timeout_secs)
}

fn document_source(settings: &Settings) -> Result<Box<dyn DocumentSource>> {
    Ok(match &settings.document_source {
        DocumentSourceConfig::Local { data_dir } => Box::new(LocalDocumentSource::new(data_dir)),
        DocumentSourceConfig::Http { base_url } => {
            Box::new(HttpDocumentSource::new(base_url, fetch_timeout(settings))?)
        }
    })
}

fn deck_source(settings: &Settings) -> Result<Box<dyn DeckSource>> {
    Ok(match &settings.deck_source {
        DeckSourceConfig::Local { path } => Box::new(FileDeckStore::new(path)),
        DeckSourceConfig::Http { base_url } => {
            Box::new(HttpDeckSource::new(base_url, fetch_timeout(settings))?)
        }
    })
}

#[cfg(feature = "pdf")]
fn decoder() -> Result<Box<dyn DocumentDecoder>> {
    Ok(Box::new(signboard::playback::PdfDecoder))
}

#[cfg(not(feature = "pdf"))]
fn decoder() -> Result<Box<dyn DocumentDecoder>> {
    bail!("this build has no PDF support; rebuild with the `pdf` feature")
}

fn player_config(cli: &Cli, settings: &Settings) -> PlayerConfig {
    let background = parse_hex_color(&settings.background).unwrap_or_else(|| {
        error!("Invalid background colour {:?}, using white", settings.background);
        PlayerConfig::default().background
    });
    PlayerConfig {
        autoplay_interval_ms: cli.interval.unwrap_or(settings::get_autoplay_interval_ms()),
        board_interval: Duration::from_millis(settings.board_interval_ms),
        board_enabled: settings.board_enabled,
        idle_hide: Duration::from_millis(settings.idle_hide_ms),
        fullscreen_grace: Duration::from_millis(settings.fullscreen_grace_ms),
        background,
        last_good: settings::get_last_good_locator()
            .as_deref()
            .and_then(Locator::parse),
    }
}

fn play(cli: &Cli, settings: &Settings) -> Result<()> {
    info!("Starting signboard");
    initialize_panic_handler();

    let collaborators = Collaborators {
        fetcher: Box::new(LocatorFetcher::new(fetch_timeout(settings))?),
        decoder: decoder()?,
        documents: document_source(settings)?,
        deck: deck_source(settings)?,
    };
    let document = match &cli.document {
        Some(raw) => Some(Locator::parse(raw).with_context(|| format!("invalid locator {raw:?}"))?),
        None => None,
    };

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let size = terminal.size()?;

    let mut app = App::new(
        player_config(cli, settings),
        TerminalViewport::new(size.width, size.height),
        collaborators,
    )
    .with_settings_persistence();
    app.start(document, cli.tv || settings::is_tv_mode(), Instant::now());

    let res = run_app_with_event_source(&mut terminal, &mut app, &mut KeyboardEventSource);
    app.player.shutdown();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!("Application error: {err:?}");
    }
    info!("Shutting down signboard");
    res
}

fn upload(settings: &Settings, file: &Path) -> Result<()> {
    let source = document_source(settings)?;
    let locator = source
        .upload(file)
        .with_context(|| format!("upload of {} failed", file.display()))?;
    info!("Uploaded {} as {locator}", file.display());
    println!("{locator}");
    Ok(())
}

fn clear(settings: &Settings) -> Result<()> {
    let source = document_source(settings)?;
    let Some(active) = source.active_locator()? else {
        println!("No active document");
        return Ok(());
    };
    if source.clear(&active)? {
        println!("Removed {active}");
    } else {
        println!("{active} was not removed");
    }
    Ok(())
}

fn deck(settings: &Settings, command: &DeckCommand) -> Result<()> {
    let store = deck_source(settings)?;
    let mut slides = store.fetch_slides().context("cannot read the deck")?;

    match command {
        DeckCommand::List => {
            for (i, slide) in slides.iter().enumerate() {
                let mark = if slide.is_visible { ' ' } else { 'h' };
                println!("{:>3} {mark} {:<9} {}", i + 1, slide.id, slide.title);
            }
            return Ok(());
        }
        DeckCommand::Add => {
            let slide = edit::add_slide(&mut slides);
            println!("{}", slide.id);
        }
        DeckCommand::Remove { id } => edit::remove_slide(&mut slides, id)?,
        DeckCommand::Show { id } => edit::set_visibility(&mut slides, id, true)?,
        DeckCommand::Hide { id } => edit::set_visibility(&mut slides, id, false)?,
        DeckCommand::Move { id, direction } => edit::move_slide(&mut slides, id, (*direction).into())?,
        DeckCommand::Rename { id, title } => {
            if title.trim().is_empty() {
                bail!("slide title cannot be empty");
            }
            edit::rename_slide(&mut slides, id, title)?;
        }
        DeckCommand::Toggle { id } => {
            let visible = edit::toggle_visibility(&mut slides, id)?;
            println!("{id} {}", if visible { "shown" } else { "hidden" });
        }
        DeckCommand::Edit { id, heading, body } => {
            let mut content = slides
                .iter()
                .find(|s| &s.id == id)
                .map(|s| s.content.clone())
                .unwrap_or_default();
            if let Some(heading) = heading {
                content.title = Some(RichText::paragraph(heading));
            }
            if let Some(body) = body {
                content.body = RichText::from_lines(body);
            }
            edit::set_content(&mut slides, id, content)?;
        }
    }

    store.replace(&slides).context("cannot save the deck")?;
    Ok(())
}

fn message_of_day(settings: &Settings, date: Option<NaiveDate>, json: bool) -> Result<()> {
    let today = match date {
        Some(date) => date,
        None => {
            let offset = motd::utc_offset(settings.message_utc_offset_minutes).with_context(|| {
                format!(
                    "invalid message_utc_offset_minutes {}",
                    settings.message_utc_offset_minutes
                )
            })?;
            motd::local_date(Utc::now(), offset)
        }
    };
    let messages = motd::load_messages(&settings.message_file);
    let Some(pick) = motd::resolve(&messages, today) else {
        bail!("no message available");
    };
    info!("Message {} of {} for {today}", pick.message_index + 1, pick.total_messages);

    if json {
        println!("{}", serde_json::to_string_pretty(&pick)?);
    } else {
        println!("{} ({})", pick.week_day, pick.business_date);
        println!("{}", pick.message.text);
        println!("  {}", pick.message.reference);
    }
    Ok(())
}
