//! neuralchat-proxy e2e runner
//!
//! Starts a mock inference upstream, writes a proxy config that points every
//! candidate at it, spawns the proxy binary and runs the scenarios.
//!
//!   cargo run                                  # spawn the built proxy, run everything
//!   cargo run -- --filter fallback             # only scenarios matching "fallback"
//!   cargo run -- --proxy-addr 127.0.0.1:3000   # use a proxy that is already running
//!   cargo run -- print-config                  # config such a proxy needs
//!   cargo run -- list

mod client;
mod config;
mod runner;
mod tests;
mod types;
mod upstream;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

use config::{E2E_TOKEN, TOKEN_ENV};
use runner::{list_tests, run_tests, RunReport, TestContext};
use tests::all_tests;

/// Proxy binaries tried in order when `--proxy-bin` is not given
const DEFAULT_PROXY_BINS: &[&str] = &[
    "../target/release/neuralchat-proxy",
    "../target/debug/neuralchat-proxy",
];

#[derive(Parser)]
#[command(name = "e2e", about = "End-to-end tests for neuralchat-proxy")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    target: Target,
}

#[derive(Args)]
struct Target {
    /// Only run scenarios whose name contains this string
    #[arg(long, short)]
    filter: Option<String>,

    /// Port for the mock upstream
    #[arg(long, default_value_t = 18080)]
    upstream_port: u16,

    /// Port the spawned proxy listens on
    #[arg(long, default_value_t = 18066)]
    proxy_port: u16,

    /// Proxy binary to spawn (default: release build, then debug)
    #[arg(long)]
    proxy_bin: Option<PathBuf>,

    /// Test a proxy that is already running instead of spawning one.
    /// It must use the output of `print-config` and HF_API_TOKEN=e2e-token.
    #[arg(long, conflicts_with = "proxy_bin")]
    proxy_addr: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// List all scenarios
    List,
    /// Print the proxy config for the chosen ports
    PrintConfig,
}

/// The proxy the scenarios talk to
enum ProxyUnderTest {
    Spawned {
        addr: String,
        process: tokio::process::Child,
        // Held so the config file outlives the process
        _config: NamedTempFile,
    },
    External {
        addr: String,
    },
}

impl ProxyUnderTest {
    fn spawn(bin: &Path, upstream_port: u16, proxy_port: u16) -> anyhow::Result<Self> {
        let config = config::write_proxy_config(upstream_port, proxy_port)?;
        println!(
            "Spawning proxy: {} run --config {}",
            bin.display(),
            config.path().display()
        );

        let process = tokio::process::Command::new(bin)
            .arg("run")
            .arg("--config")
            .arg(config.path())
            .env(TOKEN_ENV, E2E_TOKEN)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| anyhow::anyhow!("Failed to spawn '{}': {}", bin.display(), e))?;

        Ok(Self::Spawned {
            addr: format!("127.0.0.1:{proxy_port}"),
            process,
            _config: config,
        })
    }

    fn addr(&self) -> &str {
        match self {
            Self::Spawned { addr, .. } | Self::External { addr } => addr,
        }
    }

    /// Poll `/health` until the proxy answers; a spawned proxy that exits fails fast
    async fn wait_ready(&mut self, client: &reqwest::Client) -> anyhow::Result<()> {
        let health_url = format!("http://{}/health", self.addr());

        for attempt in 0..30u64 {
            if let Self::Spawned { process, .. } = self {
                if let Some(status) = process.try_wait()? {
                    anyhow::bail!("Proxy exited before becoming ready ({status})");
                }
            }
            let ready = client
                .get(&health_url)
                .send()
                .await
                .is_ok_and(|r| r.status().is_success());
            if ready {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(100 + attempt * 50)).await;
        }

        anyhow::bail!("Proxy at {} did not become ready", self.addr())
    }

    async fn shutdown(self) {
        if let Self::Spawned { mut process, .. } = self {
            process.kill().await.ok();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::List) => list_tests(&all_tests()),
        Some(Command::PrintConfig) => {
            let config = config::proxy_config(cli.target.upstream_port, cli.target.proxy_port);
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        None => {
            let report = run(cli.target).await?;
            if report.failed() > 0 {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn run(target: Target) -> anyhow::Result<RunReport> {
    let upstream_state = upstream::start(target.upstream_port).await?;
    println!("Mock upstream on 127.0.0.1:{}", target.upstream_port);

    let mut proxy = match target.proxy_addr {
        Some(addr) => ProxyUnderTest::External { addr },
        None => {
            let bin = match target.proxy_bin {
                Some(bin) => bin,
                None => find_proxy_bin()?,
            };
            ProxyUnderTest::spawn(&bin, target.upstream_port, target.proxy_port)?
        }
    };

    let http_client = client::build_client();
    proxy.wait_ready(&http_client).await?;

    let ctx = TestContext {
        proxy_addr: proxy.addr().to_string(),
        upstream_state,
        http_client,
    };
    let report = run_tests(all_tests(), ctx, target.filter.as_deref()).await;

    proxy.shutdown().await;
    Ok(report)
}

fn find_proxy_bin() -> anyhow::Result<PathBuf> {
    let found = DEFAULT_PROXY_BINS
        .iter()
        .map(Path::new)
        .find(|path| path.exists())
        .map(Path::to_path_buf);

    match found {
        Some(path) => {
            println!("Using proxy binary: {}", path.display().to_string().bright_cyan());
            Ok(path)
        }
        None => Err(anyhow::anyhow!(
            "No proxy binary found. Tried: {}\nBuild with: cd .. && cargo build --release",
            DEFAULT_PROXY_BINS.join(", ")
        )),
    }
}
