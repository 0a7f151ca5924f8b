//! PredictionService stub abstraction
//!
//! [`PredictionStub`] is the seam between the inference client and the
//! transport. [`GrpcPredictionStub`] is the production implementation on top
//! of a lazily connected tonic channel; tests inject their own stubs.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

use crate::generated::tensorflow::serving::prediction_service_client::PredictionServiceClient;
use crate::generated::tensorflow::serving::{PredictRequest, PredictResponse};
use crate::{Error, Result};

/// Issues a single unary Predict call
#[async_trait]
pub trait PredictionStub: Send + Sync {
    /// Send `request`, asking the server to finish within `timeout`
    async fn predict(&self, request: PredictRequest, timeout: Duration) -> Result<PredictResponse>;
}

#[async_trait]
impl<T: PredictionStub + ?Sized> PredictionStub for Arc<T> {
    async fn predict(&self, request: PredictRequest, timeout: Duration) -> Result<PredictResponse> {
        (**self).predict(request, timeout).await
    }
}

#[async_trait]
impl<T: PredictionStub + ?Sized> PredictionStub for Box<T> {
    async fn predict(&self, request: PredictRequest, timeout: Duration) -> Result<PredictResponse> {
        (**self).predict(request, timeout).await
    }
}

/// tonic-backed PredictionService stub
#[derive(Debug, Clone)]
pub struct GrpcPredictionStub {
    client: PredictionServiceClient<Channel>,
}

impl GrpcPredictionStub {
    /// Wrap an existing channel
    pub fn new(channel: Channel) -> Self {
        Self {
            client: PredictionServiceClient::new(channel),
        }
    }

    /// Create a stub whose channel connects on first use
    ///
    /// With `port` unset (`None` or `Some(0)`), `host` is a Unix domain
    /// socket path, optionally prefixed with `unix:` or `unix://`.
    /// Otherwise the stub targets `host:port` over plaintext HTTP/2 unless
    /// `host` already carries a scheme.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect_lazy(host: &str, port: Option<u16>) -> Result<Self> {
        let channel = match port.filter(|&p| p != 0) {
            Some(port) => tcp_channel(host, port)?,
            None => unix_channel(host)?,
        };
        Ok(Self::new(channel))
    }
}

#[async_trait]
impl PredictionStub for GrpcPredictionStub {
    async fn predict(&self, request: PredictRequest, timeout: Duration) -> Result<PredictResponse> {
        // Clients are cheap handles over the shared channel
        let mut client = self.client.clone();

        let mut request = tonic::Request::new(request);
        request.set_timeout(timeout);

        let response = client.predict(request).await?;
        Ok(response.into_inner())
    }
}

fn tcp_channel(host: &str, port: u16) -> Result<Channel> {
    if host.is_empty() {
        return Err(Error::ConfigError(
            "gRPC host cannot be empty".to_string(),
        ));
    }

    let uri = if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}:{}", host, port)
    } else {
        format!("http://{}:{}", host, port)
    };

    let endpoint = Endpoint::from_shared(uri.clone())
        .map_err(|e| Error::ConfigError(format!("Invalid gRPC endpoint '{}': {}", uri, e)))?;

    debug!("Created lazy gRPC channel to {}", uri);
    Ok(endpoint.connect_lazy())
}

fn socket_path(host: &str) -> &str {
    host.strip_prefix("unix://")
        .or_else(|| host.strip_prefix("unix:"))
        .unwrap_or(host)
}

#[cfg(unix)]
fn unix_channel(host: &str) -> Result<Channel> {
    use hyper_util::rt::TokioIo;
    use std::path::PathBuf;
    use tokio::net::UnixStream;
    use tonic::transport::Uri;
    use tower::service_fn;

    let path = PathBuf::from(socket_path(host));
    if path.as_os_str().is_empty() {
        return Err(Error::ConfigError(
            "Unix socket path cannot be empty".to_string(),
        ));
    }

    debug!("Created lazy gRPC channel to unix socket {}", path.display());

    // The connector ignores the URI; it only has to be syntactically valid
    let channel = Endpoint::from_static("http://[::]:50051").connect_with_connector_lazy(
        service_fn(move |_: Uri| {
            let path = path.clone();
            async move { Ok::<_, std::io::Error>(TokioIo::new(UnixStream::connect(path).await?)) }
        }),
    );
    Ok(channel)
}

#[cfg(not(unix))]
fn unix_channel(host: &str) -> Result<Channel> {
    Err(Error::ConfigError(format!(
        "Unix domain sockets are not supported on this platform: '{}'",
        host
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_path_prefixes() {
        assert_eq!(socket_path("unix:///tmp/serving.sock"), "/tmp/serving.sock");
        assert_eq!(socket_path("unix:/tmp/serving.sock"), "/tmp/serving.sock");
        assert_eq!(socket_path("/tmp/serving.sock"), "/tmp/serving.sock");
    }

    #[tokio::test]
    async fn test_connect_lazy_tcp() {
        let stub = GrpcPredictionStub::connect_lazy("localhost", Some(8500));
        assert!(stub.is_ok());
    }

    #[tokio::test]
    async fn test_connect_lazy_with_scheme() {
        let stub = GrpcPredictionStub::connect_lazy("http://127.0.0.1", Some(8500));
        assert!(stub.is_ok());
    }

    #[tokio::test]
    async fn test_empty_host_error() {
        let stub = GrpcPredictionStub::connect_lazy("", Some(8500));
        assert!(matches!(stub, Err(Error::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_invalid_host_error() {
        let stub = GrpcPredictionStub::connect_lazy("bad host name", Some(8500));
        assert!(matches!(stub, Err(Error::ConfigError(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_connect_lazy_unix_socket() {
        let stub = GrpcPredictionStub::connect_lazy("unix:///tmp/does-not-exist.sock", None);
        assert!(stub.is_ok());

        // Port 0 means "unset" as well
        let stub = GrpcPredictionStub::connect_lazy("/tmp/does-not-exist.sock", Some(0));
        assert!(stub.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreachable_unix_socket_fails_on_call() {
        let stub = GrpcPredictionStub::connect_lazy("/tmp/does-not-exist.sock", None).unwrap();
        let result = stub
            .predict(PredictRequest::default(), Duration::from_millis(500))
            .await;
        assert!(result.is_err());
    }
}
