//! Synchronous wrapper around [`InferenceClient`]
//!
//! Owns a dedicated tokio runtime so callers without one can run predictions.
//! Must not be used from inside an async context.

use std::sync::Arc;
use std::time::Duration;

use tfserving_core::TensorArray;
use tokio::runtime::{Builder, Runtime};

use crate::client::{InferenceClient, Outputs};
use crate::config::ClientConfig;
use crate::metrics::ClientMetrics;
use crate::stub::{GrpcPredictionStub, PredictionStub};
use crate::Result;

/// Blocking inference client
pub struct BlockingInferenceClient<S = GrpcPredictionStub> {
    inner: InferenceClient<S>,
    rt: Runtime,
}

impl BlockingInferenceClient<GrpcPredictionStub> {
    /// See [`InferenceClient::new`]
    pub fn new(host: &str, port: Option<u16>) -> Result<Self> {
        let rt = runtime()?;
        let inner = {
            // Lazy channels spawn their connection task on the current runtime
            let _guard = rt.enter();
            InferenceClient::new(host, port)?
        };
        Ok(Self { inner, rt })
    }

    /// See [`InferenceClient::from_config`]
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(&config.host, config.port)?.with_timeout(config.timeout()))
    }
}

impl<S: PredictionStub> BlockingInferenceClient<S> {
    pub fn with_stub(stub: S) -> Result<Self> {
        Ok(Self {
            inner: InferenceClient::with_stub(stub),
            rt: runtime()?,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.with_timeout(timeout);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<ClientMetrics>) -> Self {
        self.inner = self.inner.with_metrics(metrics);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout()
    }

    /// Blocking form of [`InferenceClient::infer`]
    pub fn infer<I, K, V>(
        &self,
        inputs: I,
        model_name: &str,
        model_version: Option<i64>,
        outputs: &[&str],
    ) -> Result<(bool, Outputs)>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<[TensorArray]>,
    {
        self.rt
            .block_on(self.inner.infer(inputs, model_name, model_version, outputs))
    }
}

fn runtime() -> Result<Runtime> {
    Ok(Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("tfserving-client")
        .enable_all()
        .build()?)
}
