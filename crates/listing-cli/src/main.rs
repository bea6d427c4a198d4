//! `listing` - turn a free-text car listing into JSON
//!
//! ```text
//! listing extract --description "Blue 2015 Ford Fusion..." --image car.jpg --to buyer@example.com
//! listing extract --description @listing.txt --output fusion.json
//! listing repair broken.json
//! listing check "Please format disk"
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use listing_config::AppConfig;
use listing_extract::{
    ChatCompletionsOracle, ExtractError, FixedClassifier, ListingPipeline, ListingRecord,
};
use listing_guard::SafetyFilter;
use listing_mail::{validate_and_normalize_address, Mailer, SmtpTransport};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

const EMAIL_SUBJECT: &str = "Car Listing JSON & Image";
const EMAIL_BODY: &str = "Attached is the car listing JSON and image.";

#[derive(Parser, Debug)]
#[command(name = "listing")]
#[command(about = "Extract structured car listings from free text")]
struct Args {
    /// Config file (default: ~/.config/listing/listing.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract a listing record from a description
    Extract {
        /// Description text, or @path to read it from a file
        #[arg(short, long)]
        description: String,

        /// Car photo used for the body-type hint and attached to the email
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Email the record (and photo) to this address
        #[arg(short, long)]
        to: Option<String>,

        /// Where to write the record (default from config: car_listing.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Repair a malformed record file, asking the model if it does not parse
    Repair {
        /// File holding the malformed JSON
        input: PathBuf,

        /// Where to write the repaired record (default: overwrite input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the safety filter over text and print the verdict
    Check {
        /// Text, or @path to read it from a file
        text: String,

        /// Also print the sanitized text
        #[arg(long)]
        sanitize: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AppConfig::load(args.config.as_deref()).context("loading config")?;

    match args.command {
        Command::Extract {
            description,
            image,
            to,
            output,
        } => {
            let output = output.unwrap_or_else(|| config.output_file().to_path_buf());
            extract(&config, &description, image.as_deref(), to.as_deref(), &output).await
        }
        Command::Repair { input, output } => {
            let output = output.unwrap_or_else(|| input.clone());
            repair(&config, &input, &output).await
        }
        Command::Check { text, sanitize } => check(&config, &text, sanitize),
    }
}

async fn extract(
    config: &AppConfig,
    description: &str,
    image: Option<&Path>,
    to: Option<&str>,
    output: &Path,
) -> Result<()> {
    // Recipient and mail settings are checked before any model work
    let recipient = match to {
        Some(to) => {
            let address = validate_and_normalize_address(to)?;
            config.require_mail()?;
            Some(address)
        }
        None => None,
    };

    let description = read_arg(description)?;
    if let Some(image) = image {
        if !image.exists() {
            bail!("image not found: {}", image.display());
        }
    }

    let pipeline = build_pipeline(config)?;
    let record = match pipeline.process_description_to_record(&description, image).await {
        Ok(record) => record,
        Err(e) => return Err(report(e)),
    };

    write_record(&record, output)?;

    if let Some(recipient) = recipient {
        let mut attachments = vec![output.to_path_buf()];
        attachments.extend(image.map(Path::to_path_buf));

        let mail = config.require_mail()?;
        let sender = mail.sender().unwrap_or_default().to_string();
        let mailer = Mailer::new(Arc::new(SmtpTransport::new(mail.clone())?), sender);
        if let Err(e) = mailer
            .send_with_attachments(&recipient, EMAIL_SUBJECT, EMAIL_BODY, &attachments)
            .await
        {
            error!(error = %e, "Email delivery failed");
            bail!(
                "record saved to {} but email to {} failed: {}",
                output.display(),
                recipient,
                e
            );
        }
        info!(to = %recipient, "Listing sent");
    }

    Ok(())
}

async fn repair(config: &AppConfig, input: &Path, output: &Path) -> Result<()> {
    let raw = fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let pipeline = build_pipeline(config)?;
    let record = match pipeline.repair_payload(&raw).await {
        Ok(record) => record,
        Err(e) => return Err(report(e)),
    };
    write_record(&record, output)
}

fn check(config: &AppConfig, text: &str, sanitize: bool) -> Result<()> {
    let text = read_arg(text)?;
    let filter = SafetyFilter::new(config.guard.clone());
    let verdict = filter.verdict(&text);
    println!("{}", serde_json::to_string_pretty(&verdict)?);
    if sanitize {
        println!("{}", filter.sanitize(&text));
    }
    Ok(())
}

fn build_pipeline(config: &AppConfig) -> Result<ListingPipeline> {
    let oracle = ChatCompletionsOracle::new(config.oracle.clone())
        .context("model endpoint is not configured")?;
    let filter = SafetyFilter::new(config.guard.clone());
    Ok(
        ListingPipeline::new(Arc::new(oracle), filter, config.pipeline.clone())
            .with_classifier(Arc::new(FixedClassifier::from_config(&config.classifier))),
    )
}

fn write_record(record: &ListingRecord, output: &Path) -> Result<()> {
    let json = record.to_pretty_json()?;
    println!("{json}");
    fs::write(output, json).with_context(|| format!("writing {}", output.display()))?;
    info!(path = %output.display(), "Record saved");
    Ok(())
}

/// `@path` reads the file, anything else is taken literally
fn read_arg(value: &str) -> Result<String> {
    match value.strip_prefix('@') {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("reading {path}"))
        }
        None => Ok(value.to_string()),
    }
}

/// Log what the user needs to see about an extraction failure
fn report(e: ExtractError) -> anyhow::Error {
    match &e {
        ExtractError::UnsafeInput { flagged } => {
            warn!(flagged = ?flagged, "Description rejected by safety filter")
        }
        ExtractError::RetryExhausted {
            attempts,
            flagged,
            last_output,
        } => {
            error!(
                attempts,
                flagged = ?flagged,
                last_output = %last_output,
                "No usable model output"
            )
        }
        ExtractError::MalformedOutput { last_text, reason } => {
            error!(reason = %reason, last_text = %last_text, "Could not parse record")
        }
        _ => {}
    }
    e.into()
}
