// src/main.rs
//
// -----------------------------------------------------------------------------
// kube-churn: create a batch of labeled Secrets, then update them forever
// -----------------------------------------------------------------------------

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;
use tokio::runtime::Builder as RtBuilder;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use kube_churn::constants::KUBECONFIG_ENV;
use kube_churn::kubeconfig::{load_client, resolve_kubeconfig_path};
use kube_churn::run::run;
use kube_churn::{ChurnConfig, InMemoryStore, KubeSecretStore, ResourceStore, ThreadRngSource};

// -----------------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------------
#[derive(Parser)]
#[command(name = "kube-churn", version, about = "Create labeled Secrets, then churn them with concurrent updates")]
struct Cli {
    /// Absolute path to the kubeconfig file (ignored when KUBECONFIG is set;
    /// defaults to ~/.kube/config)
    #[arg(long, value_name = "PATH")]
    kubeconfig: Option<PathBuf>,

    /// Run against an in-process store instead of a cluster
    #[arg(long)]
    in_memory: bool,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

// -----------------------------------------------------------------------------
// main
// -----------------------------------------------------------------------------
fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::new(format!("kube_churn={}", level));
    fmt().with_env_filter(filter).init();

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn execute(cli: &Cli) -> Result<()> {
    let config = ChurnConfig::default();
    let rt = RtBuilder::new_multi_thread().enable_all().build()?;

    rt.block_on(async {
        let store = build_store(cli, &config).await?;
        let cancel = CancellationToken::new();

        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping updates");
                on_signal.cancel();
            }
        });

        let objects = run(store, &config, Arc::new(ThreadRngSource), cancel).await?;
        info!("Stopped with {} objects", objects.len());
        Ok::<(), anyhow::Error>(())
    })
}

async fn build_store(cli: &Cli, config: &ChurnConfig) -> Result<Arc<dyn ResourceStore>> {
    if cli.in_memory {
        info!("Using in-memory store");
        return Ok(Arc::new(InMemoryStore::new(config.namespace.clone())));
    }

    let path = resolve_kubeconfig_path(std::env::var_os(KUBECONFIG_ENV), cli.kubeconfig.clone(), dirs::home_dir())
        .ok_or_else(|| anyhow!("No kubeconfig found: set {} or pass --kubeconfig", KUBECONFIG_ENV))?;
    info!("Loading kubeconfig {}", path.display());

    let client = load_client(&path).await?;
    Ok(Arc::new(KubeSecretStore::new(client, config.namespace.clone())))
}
