//! `muttdown` - sendmail replacement that compiles markdown mail bodies
//!
//! Reads a message on stdin, adds an HTML rendering to every text part that
//! starts with `!m`, then prints it, pipes it to sendmail, or relays it over
//! SMTP.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use muttdown_core::{
    Config, ConvertOptions, Converter, Envelope, SmtpSettings, send_with_sendmail, send_with_smtp,
};
use muttdown_mime::Part;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments, compatible with the sendmail calling convention.
#[derive(Debug, Parser)]
#[command(name = "muttdown", version, about)]
struct Args {
    /// Path to the YAML configuration file [default: ~/.muttdown.yaml]
    #[arg(short = 'c', long = "config-file", alias = "config_file")]
    config_file: Option<PathBuf>,

    /// Print the rewritten message to stdout instead of sending it
    #[arg(short = 'p', long)]
    print_message: bool,

    /// Deliver through the configured sendmail program instead of SMTP
    #[arg(short = 's', long)]
    sendmail_passthru: bool,

    /// Envelope sender
    #[arg(short = 'f', long)]
    envelope_from: String,

    /// Envelope recipients
    #[arg(required = true)]
    recipients: Vec<String>,
}

/// Where the rewritten message goes.
enum Delivery {
    Print,
    Sendmail(Vec<String>, Envelope),
    Smtp(SmtpSettings, Envelope),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Logs go to stderr so stdout stays clean for --print-message
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "muttdown=info,muttdown_core=info,muttdown_smtp=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("muttdown: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(args.config_file.as_deref())?;
    let options = ConvertOptions::from_config(&config).context("Failed to load stylesheet")?;
    let delivery = delivery(&args, &config)?;

    let mut input = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut input)
        .await
        .context("Failed to read message from stdin")?;
    let message = Part::parse(&input).context("Failed to parse message")?;

    let rewritten = Converter::new(options).process(message).to_bytes();

    match delivery {
        Delivery::Print => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&rewritten).await?;
            stdout.flush().await?;
        }
        Delivery::Sendmail(command, envelope) => {
            send_with_sendmail(&command, &envelope, &rewritten)
                .await
                .context("Sendmail delivery failed")?;
        }
        Delivery::Smtp(settings, envelope) => {
            send_with_smtp(&settings, &envelope, &rewritten)
                .await
                .with_context(|| format!("SMTP delivery via {} failed", settings.host))?;
        }
    }
    Ok(())
}

/// Loads the given file, or `~/.muttdown.yaml` when it exists, or defaults.
fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match Config::default_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(Config::default()),
        },
    };
    Config::load(&path).with_context(|| format!("Invalid configuration {}", path.display()))
}

/// Resolves everything delivery needs before the message is read.
fn delivery(args: &Args, config: &Config) -> Result<Delivery> {
    if args.print_message {
        return Ok(Delivery::Print);
    }

    let envelope = Envelope::new(&args.envelope_from, &args.recipients)
        .context("Invalid envelope")?;

    if args.sendmail_passthru {
        info!(sendmail = %config.sendmail, "Delivering through sendmail");
        return Ok(Delivery::Sendmail(config.sendmail_command(), envelope));
    }

    let settings = SmtpSettings::from_config(config).context("Failed to resolve SMTP password")?;
    info!(host = %settings.host, port = settings.port, "Delivering over SMTP");
    Ok(Delivery::Smtp(settings, envelope))
}
