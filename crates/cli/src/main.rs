use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use peditor_agent::{GenerationStatus, MISSING_KEY_MESSAGE, Orchestrator, SlotState, SubmitOutcome};
use peditor_core::logging::{self, LoggingConfig};
use peditor_core::{
    Config, HistoryKind, HistoryStore, MemoryKeyValueStore, SettingsContext, SharedStore,
    settings::{find_model, format_temperature}, template, templates,
};
use peditor_providers::ProviderFactory;
use peditor_store::SqliteKeyValueStore;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// PEditor - a terminal text editor with streaming LLM rewrite actions
#[derive(Parser, Debug)]
#[command(name = "peditor")]
#[command(about = "Rewrite, summarize and translate text with an LLM from the terminal", long_about = None)]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to config.toml (default: ~/.peditor/config.toml)
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// SQLite file for settings and histories (overrides the config)
    #[arg(long, value_name = "PATH", global = true, conflicts_with = "ephemeral")]
    store: Option<PathBuf>,

    /// Keep settings and histories in memory only
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the interactive TUI (default)
    Start,
    /// Run one template over some text and stream the result to stdout
    Run {
        /// Template title, e.g. "Summarize" or "Translate"
        #[arg(short, long, value_name = "TITLE")]
        template: String,

        /// Option value for group templates, e.g. "French"
        #[arg(short, long, value_name = "VALUE")]
        option: Option<String>,

        /// Text to work on (default: read stdin)
        #[arg(value_name = "TEXT")]
        text: Option<String>,
    },
    /// List history entries, marking the selected one
    History {
        #[arg(value_enum)]
        kind: Option<HistoryArg>,
    },
    /// Clear one or both histories
    Clear {
        #[arg(value_enum)]
        target: ClearTarget,
    },
    /// List templates and their options
    Templates,
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
    /// Show current status
    Status,
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    /// Print the current settings
    Show,
    /// Store the API key
    SetKey { key: String },
    /// Select the model
    SetModel { model: String },
    /// Set the sampling temperature (0.0 - 1.0)
    SetTemperature { temperature: f32 },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum HistoryArg {
    Input,
    Output,
}

impl From<HistoryArg> for HistoryKind {
    fn from(arg: HistoryArg) -> Self {
        match arg {
            HistoryArg::Input => HistoryKind::Input,
            HistoryArg::Output => HistoryKind::Output,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ClearTarget {
    Input,
    Output,
    All,
}

impl ClearTarget {
    fn kinds(&self) -> &'static [HistoryKind] {
        match self {
            ClearTarget::Input => &[HistoryKind::Input],
            ClearTarget::Output => &[HistoryKind::Output],
            ClearTarget::All => HistoryKind::VALUES,
        }
    }
}

/// Everything a command needs: configuration plus the persistent stores
struct Session {
    config: Config,
    config_path: PathBuf,
    store_label: String,
    histories: Arc<HistoryStore>,
    settings: Arc<SettingsContext>,
}

impl Session {
    fn open(config: Config, config_path: PathBuf, store: Option<PathBuf>, ephemeral: bool) -> Result<Self> {
        let (shared, store_label): (SharedStore, String) = if ephemeral {
            (MemoryKeyValueStore::shared(), "(in memory)".to_string())
        } else {
            let path = match store {
                Some(path) => path,
                None => config.store_path().context("Failed to resolve store path")?,
            };
            let sqlite: SharedStore = Arc::new(
                SqliteKeyValueStore::open(&path)
                    .with_context(|| format!("Failed to open store at {}", path.display()))?,
            );
            tracing::info!(store = %logging::sanitize_path(&path), "Opened store");
            (sqlite, path.display().to_string())
        };

        let histories = HistoryStore::load(Arc::clone(&shared)).context("Failed to load histories")?;
        let settings = SettingsContext::load(shared, &config.generation).context("Failed to load settings")?;

        Ok(Self { config, config_path, store_label, histories: Arc::new(histories), settings: Arc::new(settings) })
    }

    fn orchestrator(&self) -> Result<Orchestrator> {
        let provider = ProviderFactory::create_from_config(&self.config.provider).context("Failed to create provider")?;
        let privacy = LoggingConfig::from(&self.config).privacy;
        Ok(Orchestrator::new(provider, Arc::clone(&self.histories), Arc::clone(&self.settings))
            .with_timeout(self.config.generation.timeout())
            .with_privacy(privacy))
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Start);

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path().context("Failed to resolve config path")?,
    };
    let config = load_or_create_config(&config_path)?;

    let _guard = init_logging(&config, matches!(command, Commands::Start), cli.verbose)?;

    if cli.verbose {
        eprintln!("{} Using config: {}", "Info:".blue().bold(), config_path.display());
    }

    let session = Session::open(config, config_path, cli.store, cli.ephemeral)?;

    match command {
        Commands::Start => cmd_start(&session).await,
        Commands::Run { template, option, text } => {
            let text = match text {
                Some(text) => text,
                None => read_stdin()?,
            };
            let mut stdout = std::io::stdout();
            cmd_run(&session, &template, option.as_deref(), &text, &mut stdout).await
        }
        Commands::History { kind } => cmd_history(&session, kind.map(HistoryKind::from)),
        Commands::Clear { target } => cmd_clear(&session, target),
        Commands::Templates => cmd_templates(&session),
        Commands::Settings { action } => cmd_settings(&session, action),
        Commands::Status => cmd_status(&session),
    }
}

/// Load config from file, writing the example config first when none exists
fn load_or_create_config(path: &Path) -> Result<Config> {
    if path.exists() {
        return Config::from_file(path).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e));
    }

    eprintln!("{} Config not found at {}", "Warning:".yellow().bold(), path.display());
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }
    std::fs::write(path, Config::example()).context("Failed to create config")?;
    eprintln!("{} Created config at {}", "Success:".green().bold(), path.display());

    Config::from_toml_str(Config::example()).map_err(|e| anyhow::anyhow!("Failed to load example config: {}", e))
}

/// The TUI owns the terminal, so it only ever logs to file.
fn init_logging(config: &Config, tui: bool, verbose: bool) -> Result<Option<logging::WorkerGuard>> {
    let mut logging_config = LoggingConfig::from(config).with_stderr(!tui);
    if verbose {
        logging_config = logging_config.with_level("debug");
    }
    logging::init_logging(Some(logging_config)).map_err(|e| anyhow::anyhow!("{}", e))
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text).context("Failed to read stdin")?;
    Ok(text)
}

/// Start the interactive TUI
async fn cmd_start(session: &Session) -> Result<()> {
    let orchestrator = Arc::new(session.orchestrator()?);
    tracing::info!(
        provider = orchestrator.provider_name(),
        config = %logging::sanitize_path(&session.config_path),
        "Starting TUI"
    );

    let mut app = peditor_ui::App::new(orchestrator, Box::new(peditor_ui::SystemClipboard::new()));
    peditor_ui::run(&mut app).await.context("Terminal UI failed")
}

/// Run one template over `text`, writing fragments to `out` as they arrive
async fn cmd_run(session: &Session, title: &str, option: Option<&str>, text: &str, out: &mut impl Write) -> Result<()> {
    let text = text.trim_end_matches(['\r', '\n']);
    if text.trim().is_empty() {
        anyhow::bail!("No input text given");
    }

    let template = template::find(title).with_context(|| {
        let titles: Vec<_> = templates().iter().map(|t| t.title()).collect();
        format!("Unknown template '{}'. Available: {}", title, titles.join(", "))
    })?;
    if let Some(value) = option
        && template.find_option(value).is_none()
    {
        let values: Vec<_> = template.options().iter().map(|o| o.value).collect();
        anyhow::bail!("'{}' is not an option of '{}'. Available: {}", value, title, values.join(", "));
    }

    if session.histories.current_value(HistoryKind::Input) != text {
        session.histories.append(HistoryKind::Input, text);
    }

    let orchestrator = session.orchestrator()?;
    let (id, slot) = match orchestrator.submit(template, option) {
        SubmitOutcome::Started(id) => match orchestrator.status() {
            GenerationStatus::Streaming { slot, .. } => (id, slot),
            GenerationStatus::Idle => {
                tracing::debug!(%id, "Generation finished before streaming began");
                (id, orchestrator.last_slot().map(|s| s.index).unwrap_or_default())
            }
        },
        SubmitOutcome::MissingCredential => {
            writeln!(out, "{}", MISSING_KEY_MESSAGE)?;
            anyhow::bail!("No API key configured. Set one with `peditor settings set-key <KEY>`");
        }
        outcome => {
            let message = outcome.notice().map(|n| n.message).unwrap_or_default();
            anyhow::bail!("{}", message);
        }
    };

    // A failed slot holds the diagnostic, which is reported through the error instead
    let failed = || orchestrator.last_slot().is_some_and(|s| s.id == id && s.state == SlotState::Failed);

    let mut rx = session.histories.subscribe();
    let mut printed = String::new();
    let idle = orchestrator.wait_idle();
    tokio::pin!(idle);

    let finished = loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                orchestrator.cancel();
            }
            finished = &mut idle => {
                if !failed() {
                    write_new_text(&session.histories, slot, &mut printed, out)?;
                }
                break finished;
            }
            Ok(()) = rx.changed() => {
                if !failed() {
                    write_new_text(&session.histories, slot, &mut printed, out)?;
                }
            }
        }
    };

    if !printed.is_empty() {
        writeln!(out)?;
    }
    out.flush()?;

    match finished {
        Some(slot) if slot.state == SlotState::Failed => {
            let message = session.histories.history(HistoryKind::Output).get(slot.index).unwrap_or_default().to_string();
            anyhow::bail!("{}", message)
        }
        Some(slot) if slot.state == SlotState::Cancelled => anyhow::bail!("Generation cancelled"),
        _ => Ok(()),
    }
}

/// Write whatever the slot gained since the last call. A slot whose content was replaced
/// (a failure diagnostic) is left for the caller to report.
fn write_new_text(histories: &HistoryStore, slot: usize, printed: &mut String, out: &mut impl Write) -> Result<()> {
    let output = histories.history(HistoryKind::Output);
    let current = output.get(slot).unwrap_or_default();
    if let Some(delta) = current.strip_prefix(printed.as_str())
        && !delta.is_empty()
    {
        write!(out, "{}", delta)?;
        out.flush()?;
        printed.push_str(delta);
    }
    Ok(())
}

/// Print a history with its selected entry marked
fn cmd_history(session: &Session, kind: Option<HistoryKind>) -> Result<()> {
    let kinds = match kind {
        Some(kind) => vec![kind],
        None => HistoryKind::VALUES.to_vec(),
    };

    for kind in kinds {
        let history = session.histories.history(kind);
        let position = history.position_label().unwrap_or_else(|| "-".to_string());
        println!("{} {}", kind.label().green().bold(), format!("({})", position).dimmed());

        if history.is_empty() {
            println!("  {}", "(empty)".dimmed());
        }
        for (i, entry) in history.entries().iter().enumerate() {
            let marker = if history.cursor() == Some(i) { "▶" } else { " " };
            println!("{} {:>3}  {}", marker.cyan(), i + 1, preview(entry, 72));
        }
    }
    Ok(())
}

/// First line of `text`, shortened to `max` chars
fn preview(text: &str, max: usize) -> String {
    let first = text.lines().next().unwrap_or_default();
    let more = text.lines().nth(1).is_some();
    if first.chars().count() > max {
        format!("{}…", first.chars().take(max).collect::<String>())
    } else if more {
        format!("{} …", first)
    } else {
        first.to_string()
    }
}

fn cmd_clear(session: &Session, target: ClearTarget) -> Result<()> {
    for kind in target.kinds() {
        session.histories.clear(*kind);
        println!("{} Cleared {} history", "Success:".green().bold(), kind.as_str());
    }
    Ok(())
}

fn cmd_templates(session: &Session) -> Result<()> {
    for template in templates() {
        println!("{}", template.title().cyan().bold());
        let selected = session.settings.selected_option(template);
        for option in template.options() {
            let marker = if selected == Some(option.value) { "*" } else { " " };
            println!("  {} {} {}", marker.green(), option.title, format!("({})", option.value).dimmed());
        }
    }
    Ok(())
}

fn cmd_settings(session: &Session, action: SettingsCommand) -> Result<()> {
    let settings = &session.settings;
    match action {
        SettingsCommand::Show => {
            let current = settings.current();
            println!("{}", "Settings".green().bold().underline());
            println!("  API key:     {}", current.masked_credential().cyan());
            println!("  Model:       {} {}", current.model_label().cyan(), format!("({})", current.model).dimmed());
            println!("  Temperature: {}", format_temperature(current.temperature).cyan());
        }
        SettingsCommand::SetKey { key } => {
            settings.set_credential(key).context("Failed to store API key")?;
            println!("{} API key saved ({})", "Success:".green().bold(), settings.current().masked_credential());
        }
        SettingsCommand::SetModel { model } => {
            if find_model(&model).is_none() {
                eprintln!("{} '{}' is not one of the known models", "Warning:".yellow().bold(), model);
            }
            settings.set_model(&model).context("Failed to store model")?;
            println!("{} Model set to {}", "Success:".green().bold(), model.cyan());
        }
        SettingsCommand::SetTemperature { temperature } => {
            settings.set_temperature(temperature).context("Failed to store temperature")?;
            println!(
                "{} Temperature set to {}",
                "Success:".green().bold(),
                format_temperature(settings.current().temperature)
            );
        }
    }
    Ok(())
}

/// Show current status
fn cmd_status(session: &Session) -> Result<()> {
    let current = session.settings.current();
    let histories = session.histories.snapshot();

    println!("{}", "PEditor Status".green().bold().underline());
    println!();
    println!("{} Configuration", "Info:".blue().bold());
    println!("  Config:      {}", session.config_path.display().cyan());
    println!("  Provider:    {}", session.config.provider.name().cyan());
    println!("  Store:       {}", session.store_label.cyan());
    match session.config.generation.timeout_secs {
        Some(secs) => println!("  Timeout:     {}s", secs),
        None => println!("  Timeout:     {}", "none".dimmed()),
    }
    println!();
    println!("{} Settings", "Info:".blue().bold());
    println!("  Model:       {}", current.model_label().cyan());
    println!("  Temperature: {}", format_temperature(current.temperature));
    if current.has_credential() {
        println!("  API key:     {}", current.masked_credential().cyan());
    } else {
        println!("  API key:     {}", "not set".yellow());
    }
    println!();
    println!("{} Histories", "Info:".blue().bold());
    println!("  Inputs:      {}", histories.input.len());
    println!("  Outputs:     {}", histories.output.len());
    Ok(())
}
