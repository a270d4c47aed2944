use crate::{Node, NodeApi, NodeApiFactory, RpcError, RpcResult, TimeoutProfile};

use pc_config::{AdminPort, AdminPortFile, Config, DEFAULT_API_PATH};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

/// Error body a node returns with a non-2xx response.
#[derive(Debug, Deserialize)]
struct FaultBody {
    fault: String,
}

/// Health RPC over HTTP(S) against the node's local admin endpoint.
///
/// The endpoint is resolved from the node's admin port file on every call,
/// so a node that restarts on a new ephemeral port is found without
/// rebuilding the client.
pub struct HttpNodeApi {
    client: reqwest::Client,
    node_name: String,
    home: PathBuf,
    port_file: String,
    fallback_endpoint: String,
    scheme: &'static str,
}

impl HttpNodeApi {
    pub fn new(client: reqwest::Client, node: &Node, scheme: &'static str) -> Self {
        Self {
            client,
            node_name: node.name.clone(),
            home: node.home.clone(),
            port_file: node.port_file.clone(),
            fallback_endpoint: node.fallback_endpoint.clone(),
            scheme,
        }
    }

    /// Current endpoint for the node, or `AdminDisabled` when the node has
    /// published an empty port file.
    pub fn endpoint(&self) -> RpcResult<String> {
        match AdminPortFile::read_in(&self.home, &self.port_file) {
            Ok(AdminPort::Port(port)) => {
                Ok(format!("{}://127.0.0.1:{port}{DEFAULT_API_PATH}", self.scheme))
            }
            Ok(AdminPort::Disabled) => Err(RpcError::admin_disabled()),
            Ok(AdminPort::Missing) => Ok(self.fallback_endpoint.clone()),
            Err(e) => Err(RpcError::unexpected(e.to_string())),
        }
    }

    async fn call(&self, operation: &str) -> RpcResult<()> {
        let endpoint = self.endpoint()?;
        let url = format!("{endpoint}/{operation}");
        debug!("{} {} -> {}", self.node_name, operation, url);

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| RpcError::from_reqwest(&endpoint, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<FaultBody>(&body) {
            Ok(fault) => Err(RpcError::fault(fault.fault)),
            Err(_) => Err(RpcError::unexpected(format!("HTTP {status} from {url}"))),
        }
    }
}

#[async_trait]
impl NodeApi for HttpNodeApi {
    async fn ping(&self) -> RpcResult<()> {
        self.call("ping").await
    }

    async fn shutdown(&self) -> RpcResult<()> {
        self.call("shutdown").await
    }
}

/// Builds `HttpNodeApi` clients that present the controller certificate.
#[derive(Debug, Clone)]
pub struct HttpNodeApiFactory {
    scheme: &'static str,
    identity: Option<(PathBuf, PathBuf)>,
    trust_any_server_certificate: bool,
}

impl HttpNodeApiFactory {
    /// Plain HTTP, no client identity.
    pub fn plain() -> Self {
        Self {
            scheme: "http",
            identity: None,
            trust_any_server_certificate: false,
        }
    }

    /// HTTPS presenting the PEM certificate and key as client identity.
    pub fn with_identity(
        certificate: impl AsRef<Path>,
        key: impl AsRef<Path>,
        trust_any_server_certificate: bool,
    ) -> Self {
        Self {
            scheme: "https",
            identity: Some((certificate.as_ref().to_path_buf(), key.as_ref().to_path_buf())),
            trust_any_server_certificate,
        }
    }

    pub fn from_config(config: &Config, config_dir: &Path) -> Self {
        if config.tls.enabled {
            Self::with_identity(
                config.tls.certificate_file(config_dir),
                config.tls.key_file(config_dir),
                config.tls.trust_any_server_certificate,
            )
        } else {
            Self::plain()
        }
    }

    fn load_identity(&self) -> RpcResult<Option<reqwest::Identity>> {
        let Some((certificate, key)) = &self.identity else {
            return Ok(None);
        };

        let mut pem = std::fs::read(certificate).map_err(|e| {
            RpcError::unavailable(format!(
                "Failed to read certificate {}: {e}",
                certificate.display()
            ))
        })?;
        pem.push(b'\n');
        pem.extend(std::fs::read(key).map_err(|e| {
            RpcError::unavailable(format!("Failed to read key {}: {e}", key.display()))
        })?);

        reqwest::Identity::from_pem(&pem)
            .map(Some)
            .map_err(|e| RpcError::unavailable(format!("Invalid client identity: {e}")))
    }
}

impl NodeApiFactory for HttpNodeApiFactory {
    fn create(&self, node: &Node, profile: TimeoutProfile) -> RpcResult<Arc<dyn NodeApi>> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(profile.connect_timeout())
            .read_timeout(profile.receive_timeout())
            .pool_max_idle_per_host(1);

        if let Some(identity) = self.load_identity()? {
            builder = builder
                .identity(identity)
                .danger_accept_invalid_certs(self.trust_any_server_certificate);
        }

        let client = builder
            .build()
            .map_err(|e| RpcError::unavailable(format!("Failed to build HTTP client: {e}")))?;

        debug!("Created {profile} node API client for {}", node.name);
        Ok(Arc::new(HttpNodeApi::new(client, node, self.scheme)))
    }
}
