//! AWS imaging command-line tool
//!
//! Detects labels, uploads images and extracts document text, printing each
//! result as JSON.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use aws_imaging::aws::{AwsClients, UploadAcl};
use aws_imaging::payload::encode_base64;
use aws_imaging::settings::Settings;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "aws-imaging", version, about = "Rekognition, S3 and Textract helpers")]
struct Cli {
    /// AWS region (defaults to the stored setting)
    #[arg(long, global = true)]
    region: Option<String>,

    /// AWS profile for the default credential chain
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Explicit access key id, requires --secret-access-key
    #[arg(long, global = true, requires = "secret_access_key")]
    access_key_id: Option<String>,

    /// Explicit secret access key, requires --access-key-id
    #[arg(long, global = true, requires = "access_key_id")]
    secret_access_key: Option<String>,

    /// Custom endpoint URL (S3-compatible stores)
    #[arg(long, global = true)]
    endpoint_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect labels in an image file
    Labels {
        file: PathBuf,

        /// Minimum confidence in percent
        #[arg(long)]
        min_confidence: Option<f32>,

        /// Maximum number of labels
        #[arg(long)]
        max_labels: Option<i32>,
    },
    /// Upload an image file to a bucket
    Upload {
        file: PathBuf,

        #[arg(long)]
        bucket: String,

        #[arg(long)]
        key: String,

        /// public-read, private or bucket-default
        #[arg(long)]
        acl: Option<UploadAcl>,
    },
    /// Extract the text lines of a document image
    Text { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let settings = Settings::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load settings, using defaults: {}", e);
        Settings::default()
    });

    let mut session_config = settings.session_config(cli.region.as_deref())?;
    if let Some(profile) = cli.profile {
        session_config = session_config.with_profile(profile);
    }
    if let (Some(id), Some(secret)) = (cli.access_key_id, cli.secret_access_key) {
        session_config = session_config.with_credentials(id, secret);
    }
    if let Some(endpoint) = cli.endpoint_url {
        session_config = session_config.with_endpoint(endpoint);
    }

    let clients = AwsClients::connect(&session_config)
        .await
        .context("Failed to create AWS clients")?;

    match cli.command {
        Command::Labels {
            file,
            min_confidence,
            max_labels,
        } => {
            let policy = settings.label_policy(min_confidence, max_labels)?;
            let result = clients
                .label_detector(policy)
                .detect_labels_in_file(&file)
                .await
                .context("Failed to detect labels")?;
            print_json(&result)
        }
        Command::Upload {
            file,
            bucket,
            key,
            acl,
        } => {
            let image = read_base64(&file).await?;
            let result = clients
                .uploader(settings.upload_options(acl))
                .upload(&image, &bucket, &key)
                .await
                .context("Failed to upload image to S3")?;
            print_json(&result)
        }
        Command::Text { file } => {
            let image = read_base64(&file).await?;
            let result = clients
                .text_extractor()
                .extract_text(&image)
                .await
                .context("Failed to extract text from image")?;
            print_json(&result)
        }
    }
}

async fn read_base64(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;
    Ok(encode_base64(&bytes))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to encode result as JSON")?;
    println!("{}", json);
    Ok(())
}
