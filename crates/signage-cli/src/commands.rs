use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use signage_server::{ServerConfig, SignageServer};
use signage_sync::{BranchConfig, BranchNode};
use signage_types::{endpoints, ErrorResponse, MessageResponse, SlideListing, UploadResponse};
use tracing::info;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli { command, format, .. } = cli;
    match command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Branch(args) => cmd_branch(args).await,
        Command::Upload(args) => cmd_upload(args, &format).await,
        Command::Reload(args) => cmd_reload(args, &format).await,
        Command::Slides(args) => cmd_slides(args, &format).await,
    }
}

fn server_config(args: ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if !args.branches.is_empty() {
        config.branches = args.branches;
    }
    if args.archive {
        config.archive_decks = true;
    }
    Ok(config)
}

fn branch_config(args: BranchArgs) -> anyhow::Result<BranchConfig> {
    let mut config = match &args.config {
        Some(path) => BranchConfig::load(path)?,
        None => BranchConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(server) = args.server {
        config.server_url = server;
    }
    if let Some(dir) = args.cache_dir {
        config.cache_dir = dir;
    }
    if let Some(secs) = args.interval {
        config.rotation_interval_secs = secs;
    }
    Ok(config)
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = server_config(args)?;
    info!(branches = config.branches.len(), "starting distribution service");
    SignageServer::new(config).serve().await?;
    Ok(())
}

async fn cmd_branch(args: BranchArgs) -> anyhow::Result<()> {
    let config = branch_config(args)?;
    info!(server = %config.server_url, "starting branch terminal");
    BranchNode::new(config).serve().await?;
    Ok(())
}

async fn cmd_upload(args: UploadArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let client = AdminClient::new(&args.remote.server)?;
    let response = client.upload(&args.file).await?;
    match format {
        OutputFormat::Json => print_json(&response),
        OutputFormat::Text => {
            println!("{} {}", "✓".green().bold(), response.message);
            println!("  Slides: {}", response.slides.to_string().bold());
            println!("  Version: {}", response.version.to_string().yellow());
            Ok(())
        }
    }
}

async fn cmd_reload(args: RemoteArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let response = AdminClient::new(&args.server)?.reload().await?;
    match format {
        OutputFormat::Json => print_json(&response),
        OutputFormat::Text => {
            println!("{} {}", "✓".green().bold(), response.message);
            Ok(())
        }
    }
}

async fn cmd_slides(args: RemoteArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let listing = AdminClient::new(&args.server)?.slides().await?;
    match format {
        OutputFormat::Json => print_json(&listing),
        OutputFormat::Text => {
            if listing.slides.is_empty() {
                println!("No slides published.");
            } else {
                println!("Inventory version {}", listing.version.to_string().yellow());
                for id in &listing.slides {
                    println!("  {}", id.file_name().cyan());
                }
            }
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Thin HTTP caller of the distribution service.
struct AdminClient {
    http: reqwest::Client,
    base: Url,
}

impl AdminClient {
    fn new(server: &str) -> anyhow::Result<Self> {
        let base = Url::parse(server).with_context(|| format!("invalid server address {server:?}"))?;
        if !matches!(base.scheme(), "http" | "https") {
            bail!("server address must be http or https: {server}");
        }
        Ok(Self { http: reqwest::Client::new(), base })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        Ok(self.base.join(path)?)
    }

    async fn upload(&self, file: &Path) -> anyhow::Result<UploadResponse> {
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("not a file name: {}", file.display()))?
            .to_string();
        let data = tokio::fs::read(file)
            .await
            .with_context(|| format!("reading {}", file.display()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(data).file_name(name));
        let response = self
            .http
            .post(self.url(endpoints::UPLOAD)?)
            .multipart(form)
            .send()
            .await?;
        decode(response).await
    }

    async fn reload(&self) -> anyhow::Result<MessageResponse> {
        decode(self.http.get(self.url(endpoints::RELOAD)?).send().await?).await
    }

    async fn slides(&self) -> anyhow::Result<SlideListing> {
        decode(self.http.get(self.url(endpoints::SLIDES)?).send().await?).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> anyhow::Result<T> {
    let status = response.status();
    let body = response.bytes().await?;
    if status.is_success() {
        return Ok(serde_json::from_slice(&body)?);
    }
    match serde_json::from_slice::<ErrorResponse>(&body) {
        Ok(ErrorResponse { error, stage: Some(stage) }) => bail!("{status}: {error} (stage: {stage})"),
        Ok(ErrorResponse { error, stage: None }) => bail!("{status}: {error}"),
        Err(_) => bail!("{status}: {}", String::from_utf8_lossy(&body)),
    }
}
