use std::{
    path::PathBuf,
    process::ExitCode,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};
use precis_core::{
    Command, HttpBackend, Notifier, Outcome, SettingsStore, SummarizerPlugin, TextBuffer,
    settings::API_KEY_FIELD,
};
use tokio::fs;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

#[derive(Parser)]
#[command(name = "precis")]
#[command(about = "Summarize the webpage or YouTube video linked in a markdown note")]
struct Cli {
    /// Settings file [default: <config dir>/precis/data.json]
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Log more (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Summarize the webpage whose URL is on the given line
    SummarizeWebpage(NoteArgs),

    /// Summarize the YouTube video whose URL is on the given line
    SummarizeYoutubeVideo(NoteArgs),

    /// Set or show the OpenAI API key
    Settings {
        /// New API key; prompts for it when omitted
        #[arg(long)]
        api_key: Option<String>,

        /// Print the stored settings instead of editing them
        #[arg(long, conflicts_with = "api_key")]
        show: bool,
    },

    /// List the available commands
    Commands,
}

#[derive(Args)]
struct NoteArgs {
    /// Markdown note holding the URL
    file: PathBuf,

    /// Line of the URL, starting at 1
    #[arg(short, long)]
    line: usize,

    /// Print the summary without touching the note
    #[arg(long)]
    dry_run: bool,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Prints notices to stderr without tearing the spinner.
struct ConsoleNotifier {
    spinner: ProgressBar,
}

impl Notifier for ConsoleNotifier {
    fn notice(&self, message: &str) {
        self.spinner
            .suspend(|| eprintln!("{} {}", style("!").yellow().bold(), message));
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.trim().chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

async fn summarize_note(
    plugin: &SummarizerPlugin,
    command: Command,
    args: NoteArgs,
) -> Result<ExitCode> {
    let content = fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let mut note = TextBuffer::new(content);
    let line = args.line.checked_sub(1).context("Line numbers start at 1")?;
    if !note.select_line(line) {
        bail!(
            "{} has only {} lines",
            args.file.display(),
            note.line_count()
        );
    }

    println!(
        "\n{}  {}\n",
        style("precis").cyan().bold(),
        style(command.name()).dim()
    );

    let started = Instant::now();
    let spinner = create_spinner(&format!("{}...", command.name()));
    let notifier = ConsoleNotifier {
        spinner: spinner.clone(),
    };

    let outcome = plugin.run(command, &mut note, &notifier).await;
    spinner.finish_and_clear();

    let (summary, at) = match outcome? {
        Outcome::Inserted { summary, at, .. } => (summary, at),
        Outcome::Aborted { notice } => {
            debug!(notice, "Command aborted");
            return Ok(ExitCode::FAILURE);
        }
    };

    if args.dry_run {
        println!(
            "{} Summarized {}",
            style("✓").green().bold(),
            style(format!("[{}]", format_duration(started.elapsed()))).dim()
        );
    } else {
        fs::write(&args.file, note.content())
            .await
            .with_context(|| format!("Failed to write {}", args.file.display()))?;
        println!(
            "{} Inserted at {}:{} {}",
            style("✓").green().bold(),
            style(args.file.display()).cyan(),
            at.line + 1,
            style(format!("[{}]", format_duration(started.elapsed()))).dim()
        );
    }

    println!("{}", style("─".repeat(60)).dim());
    println!("{}", summary);

    Ok(ExitCode::SUCCESS)
}

async fn edit_settings(
    plugin: &mut SummarizerPlugin,
    store_path: PathBuf,
    api_key: Option<String>,
    show: bool,
) -> Result<()> {
    let mut panel = plugin.settings_panel();

    if show {
        println!("{} {}", style("Settings:").dim(), style(store_path.display()).cyan());
        for field in panel.fields() {
            println!("  {}: {}", field.name, mask_key(panel.value()));
        }
        return Ok(());
    }

    let value = match api_key {
        Some(value) => value,
        None => {
            let term = Term::stderr();
            term.write_line(&format!(
                "{} {}",
                style(API_KEY_FIELD.name).bold(),
                style(API_KEY_FIELD.description).dim()
            ))?;
            term.write_str(&format!("{} ", style(format!("[{}]", API_KEY_FIELD.placeholder)).dim()))?;
            term.read_line()?
        }
    };

    panel.on_change(value.trim()).await?;
    println!(
        "{} Saved to {}",
        style("✓").green().bold(),
        style(store_path.display()).cyan()
    );
    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let store = cli.data.map(SettingsStore::new).unwrap_or_default();
    let store_path = store.path().to_path_buf();
    debug!(path = %store_path.display(), "Using settings file");

    let mut plugin = SummarizerPlugin::on_load(store, HttpBackend::new()).await?;

    let result = match cli.command {
        CliCommand::SummarizeWebpage(args) => {
            summarize_note(&plugin, Command::SummarizeWebpage, args).await
        }
        CliCommand::SummarizeYoutubeVideo(args) => {
            summarize_note(&plugin, Command::SummarizeYoutubeVideo, args).await
        }
        CliCommand::Settings { api_key, show } => {
            edit_settings(&mut plugin, store_path, api_key, show)
                .await
                .map(|()| ExitCode::SUCCESS)
        }
        CliCommand::Commands => {
            for command in plugin.commands() {
                println!(
                    "{:<26} {}",
                    style(command.id()).cyan(),
                    command.name()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    };

    plugin.on_unload();
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
