use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use roundtable::io::{default_csv_file_name, write_text};
use roundtable::render::PlainTranscript;
use roundtable::{
    CommandTrigger, DialogueClient, ExportConfig, ExportPaths, ParsedTranscript, PrintConfig,
    ServiceConfig, SessionController, SessionSettings, SessionState, execute_export,
    execute_print, load_session_settings, parse_participants_file, parse_participants_string,
    parse_transcript,
};

#[derive(Parser)]
#[command(name = "roundtable")]
#[command(author, version, about = "Focus-group dialogue transcripts: stream, parse, export", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a new session against the dialogue service and export the result
    Run {
        #[command(flatten)]
        settings: SettingsArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Dialogue service endpoint (defaults to $ROUNDTABLE_ENDPOINT)
        #[arg(long)]
        endpoint: Option<String>,

        /// Save the raw streamed text
        #[arg(long)]
        raw: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Parse an existing raw transcript file and export it
    Parse {
        /// Raw transcript text file
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Also print the transcript to stdout
        #[arg(long)]
        show: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Render a raw transcript as a printable document and send it to print
    Print {
        /// Raw transcript text file
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Program that opens the rendered document for printing
        #[arg(long)]
        command: Option<String>,

        /// Delay before print is triggered, in milliseconds
        #[arg(long, default_value = "800")]
        load_delay_ms: u64,

        /// Delay before the rendered document is removed, in milliseconds
        #[arg(long, default_value = "5000")]
        cleanup_delay_ms: u64,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Args)]
struct SettingsArgs {
    /// Session settings JSON (participants, topic, subTopics, rounds)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Participants JSON file
    #[arg(long, conflicts_with = "participants")]
    participants_file: Option<PathBuf>,

    /// Comma-separated participants as name[:role]
    #[arg(long)]
    participants: Option<String>,

    /// Discussion topic
    #[arg(long)]
    topic: Option<String>,

    /// Sub-topic to discuss (repeatable)
    #[arg(long = "sub-topic")]
    sub_topics: Vec<String>,

    /// Target number of rounds
    #[arg(long)]
    rounds: Option<u32>,
}

#[derive(Args)]
struct OutputArgs {
    /// CSV output file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// JSON output file
    #[arg(long)]
    json: Option<PathBuf>,

    /// Printable HTML document output file
    #[arg(long)]
    document: Option<PathBuf>,

    /// Plain-text transcript output file
    #[arg(long)]
    text: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            settings,
            output,
            endpoint,
            raw,
            verbose,
        } => {
            setup_logging(verbose);
            run_session(build_settings(settings)?, output, endpoint, raw).await
        }
        Commands::Parse {
            input,
            settings,
            output,
            show,
            verbose,
        } => {
            setup_logging(verbose);
            parse_file(input, build_settings(settings)?, output, show)
        }
        Commands::Print {
            input,
            settings,
            command,
            load_delay_ms,
            cleanup_delay_ms,
            verbose,
        } => {
            setup_logging(verbose);
            let mut config = PrintConfig {
                load_delay: Duration::from_millis(load_delay_ms),
                cleanup_delay: Duration::from_millis(cleanup_delay_ms),
                ..Default::default()
            };
            if let Some(command) = command {
                config.command = command;
                config.args.clear();
            }
            print_file(input, build_settings(settings)?, config).await
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn build_settings(args: SettingsArgs) -> Result<SessionSettings> {
    let mut settings = match &args.settings {
        Some(path) => load_session_settings(path).context("Failed to load session settings")?,
        None => SessionSettings::new("", Vec::new()),
    };

    if let Some(path) = &args.participants_file {
        settings.participants =
            parse_participants_file(path).context("Failed to load participants")?;
    } else if let Some(list) = &args.participants {
        settings.participants = parse_participants_string(list);
    }
    if let Some(topic) = args.topic {
        settings.topic = topic;
    }
    if !args.sub_topics.is_empty() {
        settings.sub_topics = args
            .sub_topics
            .into_iter()
            .map(roundtable::SubTopic::new)
            .collect();
    }
    if let Some(rounds) = args.rounds {
        settings.rounds = rounds;
    }

    Ok(settings)
}

fn export_paths(output: OutputArgs) -> ExportPaths {
    let nothing_requested = output.csv.is_none()
        && output.json.is_none()
        && output.document.is_none()
        && output.text.is_none();

    ExportPaths {
        csv: if nothing_requested {
            Some(default_csv_file_name(Utc::now()))
        } else {
            output.csv
        },
        json: output.json,
        document: output.document,
        text: output.text,
    }
}

fn export(transcript: &ParsedTranscript, settings: &SessionSettings, output: OutputArgs) -> Result<()> {
    let paths = export_paths(output);
    let config = ExportConfig {
        generate_text: paths.text.is_some(),
        ..Default::default()
    };

    // An empty transcript only logs a notice
    let result = execute_export(transcript, settings, &paths, &config, Local::now().naive_local())?;
    for path in result.written() {
        info!("Output written to {:?}", path);
    }
    Ok(())
}

async fn run_session(
    settings: SessionSettings,
    output: OutputArgs,
    endpoint: Option<String>,
    raw: Option<PathBuf>,
) -> Result<()> {
    let config = match endpoint {
        Some(endpoint) => ServiceConfig::new(endpoint),
        None => ServiceConfig::from_env(),
    };
    let client = DialogueClient::new(config)?;
    let mut session = SessionController::new(settings);

    // Partial turns stay available after a failure, so export before reporting
    let outcome = session.run(&client).await.map(|t| t.len());

    if let Some(path) = &raw {
        write_text(session.current_text(), path)?;
        info!("Raw stream saved to {:?}", path);
    }
    export(session.transcript(), session.settings(), output)?;

    match (outcome, session.state()) {
        (Ok(turns), _) => {
            info!(
                "Complete: {} turn(s), round {} / {}",
                turns,
                session.transcript().current_round(),
                session.settings().rounds
            );
            Ok(())
        }
        (Err(_), SessionState::Failed(message)) => anyhow::bail!("{}", message),
        (Err(e), _) => Err(e.into()),
    }
}

fn parse_file(
    input: PathBuf,
    settings: SessionSettings,
    output: OutputArgs,
    show: bool,
) -> Result<()> {
    info!("Loading transcript from {:?}", input);
    let text = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read file: {:?}", input))?;
    let transcript = parse_transcript(&text, &settings.participants, Utc::now());

    info!(
        "Parsed {} turn(s), {} skipped line(s), round {} / {}",
        transcript.len(),
        transcript.skipped.len(),
        transcript.current_round(),
        settings.rounds
    );

    if show {
        print!(
            "{}",
            PlainTranscript::new(&transcript.turns, &settings.participants).format()
        );
    }

    export(&transcript, &settings, output)
}

async fn print_file(input: PathBuf, settings: SessionSettings, config: PrintConfig) -> Result<()> {
    let text = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read file: {:?}", input))?;
    let transcript = parse_transcript(&text, &settings.participants, Utc::now());
    let trigger = CommandTrigger::from_config(&config);

    execute_print(
        &transcript,
        &settings,
        &trigger,
        &config,
        Local::now().naive_local(),
    )
    .await?;
    Ok(())
}
