//! asygeo MCP Server Binary
//!
//! Runs the asygeo MCP server on stdio transport, allowing AI agents to
//! render geometric figures from Asymptote code. Requires `asy` on `PATH`
//! (or `--asy-bin`).
//!
//! ## Usage
//!
//! Run directly:
//! ```bash
//! asygeo-mcp
//! asygeo-mcp --check          # verify the Asymptote installation and exit
//! ```
//!
//! Or add to Claude Desktop's MCP configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "asygeo": {
//!       "command": "asygeo-mcp",
//!       "env": { "ASYGEO_TIMEOUT_SECS": "30" }
//!     }
//!   }
//! }
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use asygeo_mcp::GeoMcpService;
use asygeo_render::{DEFAULT_PROGRAM, Renderer, RendererConfig};
use clap::Parser;
use rmcp::ServiceExt;
use rmcp::transport::io::stdio;
use tracing::{error, info};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "asygeo-mcp")]
#[command(about = "MCP server that renders Asymptote geometry code to images", long_about = None)]
#[command(version)]
struct Cli {
    /// Asymptote executable
    #[arg(long, env = "ASYGEO_ASY_BIN", default_value = DEFAULT_PROGRAM)]
    asy_bin: PathBuf,

    /// Directory for per-request scratch files (defaults to the OS temp dir)
    #[arg(long, env = "ASYGEO_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Seconds before a render is killed; 0 disables the limit
    #[arg(long, env = "ASYGEO_TIMEOUT_SECS", default_value = "60")]
    timeout_secs: u64,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "ASYGEO_LOG", default_value = "info")]
    log_level: String,

    /// Check that Asymptote is installed, print its version and exit
    #[arg(long)]
    check: bool,
}

impl Cli {
    /// Renderer settings from the parsed flags
    ///
    /// `asy` runs inside a scratch directory, so a relative program path such
    /// as `./bin/asy` is anchored to our working directory first. Bare names
    /// are left for `PATH` lookup.
    fn renderer_config(&self) -> Result<RendererConfig> {
        let program = if self.asy_bin.components().count() > 1 {
            std::path::absolute(&self.asy_bin).with_context(|| {
                format!("Failed to resolve --asy-bin {}", self.asy_bin.display())
            })?
        } else {
            self.asy_bin.clone()
        };

        Ok(RendererConfig {
            program,
            temp_root: self.temp_dir.clone(),
            timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
        })
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // CRITICAL: Log to stderr only - stdout is reserved for MCP JSON-RPC
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(filter)
        .init();

    let renderer = Renderer::new(cli.renderer_config()?);

    if cli.check {
        return Ok(match renderer.check_installation().await {
            Ok(version) => {
                println!("{version}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                report_missing_asymptote(&renderer, &e);
                ExitCode::FAILURE
            }
        });
    }

    eprintln!("asygeo MCP server v{}", env!("CARGO_PKG_VERSION"));

    // A missing asy is reported but not fatal; each render will fail with the same cause
    match renderer.check_installation().await {
        Ok(version) => info!(%version, "Found Asymptote"),
        Err(e) => report_missing_asymptote(&renderer, &e),
    }

    eprintln!("Ready. Listening on stdio...");

    // Create service and serve on stdio transport
    let service = GeoMcpService::new(renderer);
    let server = service.serve(stdio()).await?;

    // Dropping the running service on a signal cancels it
    tokio::select! {
        quit = server.waiting() => {
            quit?;
            info!("Client disconnected. Shutting down.");
        }
        signal = shutdown_signal() => {
            info!(signal, "Received signal, shutting down server...");
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn report_missing_asymptote(renderer: &Renderer, err: &asygeo_render::RenderError) {
    error!(
        program = %renderer.config().program.display(),
        error = %err,
        "Asymptote command (asy) not found or not executable. \
         Please ensure Asymptote is installed and in your system PATH. \
         Visit https://asymptote.sourceforge.io/ for installation instructions."
    );
}

/// Resolves with the name of the first termination signal received
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => "SIGINT",
        () = terminate => "SIGTERM",
    }
}
