use crate::config::{load_config, Config};
use crate::pipeline::Pipeline;
use crate::resolve::RawRequest;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "phrs", version, about = "Placeholder image server (SVG, PNG, WebP, JPEG, AVIF)")]
pub struct Args {
    /// Config JSON file
    #[arg(short = 'c', long = "configFile", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Bind port
        #[arg(short, long)]
        port: Option<u16>,

        /// Maximum simultaneous raster encodes
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Render a single image without starting the server
    Render {
        /// Size token, e.g. 600x400, 400, 300@2x, 600x400.png
        size: String,

        /// Up to three positional tokens (background, text color, format)
        #[arg(num_args = 0..=3)]
        tokens: Vec<String>,

        /// Label text ('\n' for newlines)
        #[arg(short, long)]
        text: Option<String>,

        /// Font identifier
        #[arg(short, long)]
        font: Option<String>,

        /// Output file. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Serve {
            host,
            port,
            concurrency,
        } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(concurrency) = concurrency {
                config.concurrency = concurrency;
            }
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(crate::server::serve(config))
        }
        Command::Render {
            size,
            tokens,
            text,
            font,
            output,
        } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(render_once(config, size, tokens, text, font, output))
        }
    }
}

async fn render_once(
    config: Config,
    size: String,
    tokens: Vec<String>,
    text: Option<String>,
    font: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let pipeline = Pipeline::new(config);
    let raw = RawRequest {
        size: size.clone(),
        positional: tokens.clone(),
        text,
        font,
    };
    let signature = std::iter::once(size).chain(tokens).collect::<Vec<_>>().join("/");

    let rendered = pipeline.handle(&signature, raw).await?;
    match output {
        Some(path) => {
            std::fs::write(&path, &rendered.body)?;
            eprintln!("wrote {} ({})", path.display(), rendered.content_type);
        }
        None => {
            std::io::stdout().write_all(&rendered.body)?;
        }
    }
    Ok(())
}
