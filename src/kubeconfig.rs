// src/kubeconfig.rs
//
// Kubeconfig discovery, then client construction through kube's loader.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

use crate::constants::{KUBECONFIG_HOME_RELATIVE, STORE_REQUEST_TIMEOUT_SECS};

/// Pick the kubeconfig path
///
/// `KUBECONFIG` wins (first entry of the path list), then the `--kubeconfig`
/// flag, then `~/.kube/config`.
pub fn resolve_kubeconfig_path(
    env: Option<OsString>,
    flag: Option<PathBuf>,
    home: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(value) = env.filter(|v| !v.is_empty()) {
        if let Some(first) = std::env::split_paths(&value).find(|p| !p.as_os_str().is_empty()) {
            return Some(first);
        }
    }
    flag.or_else(|| home.map(|h| h.join(KUBECONFIG_HOME_RELATIVE)))
}

/// Load the current context of the kubeconfig at `path` as a client config
///
/// Credential plugins (`exec`, `auth-provider`) and every other kubeconfig
/// feature are handled by kube's loader. Store calls get a read timeout so a
/// stalled API server surfaces as a backend error instead of hanging a task.
pub async fn load_client_config(path: &Path) -> Result<Config> {
    let kubeconfig = Kubeconfig::read_from(path)
        .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;

    let mut config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .with_context(|| format!("Invalid kubeconfig {}", path.display()))?;
    config.read_timeout = Some(Duration::from_secs(STORE_REQUEST_TIMEOUT_SECS));

    debug!("Using API server {}", config.cluster_url);
    Ok(config)
}

/// Build an API client from the kubeconfig at `path`
pub async fn load_client(path: &Path) -> Result<Client> {
    let config = load_client_config(path).await?;
    Client::try_from(config).context("Failed to create Kubernetes client")
}
