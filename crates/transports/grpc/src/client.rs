//! Inference client for TensorFlow Serving
//!
//! Builds a `PredictRequest` from named input batches, issues exactly one
//! Predict call bounded by a timeout, and decodes the response tensors.
//!
//! # Usage
//!
//! ```no_run
//! use tfserving_grpc::InferenceClient;
//! use tfserving_core::TensorArray;
//!
//! # async fn run() -> tfserving_grpc::Result<()> {
//! let client = InferenceClient::new("localhost", Some(8500))?;
//! let image = TensorArray::from(vec![0u8; 224 * 224 * 3]);
//!
//! let (success, outputs) = client
//!     .infer([("images", vec![image])], "mobilenet", None, &[])
//!     .await?;
//! if success {
//!     println!("outputs: {:?}", outputs.keys());
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tfserving_core::TensorArray;
use tracing::{info, warn};

use crate::codec::{make_ndarray, make_tensor_proto};
use crate::config::ClientConfig;
use crate::generated::tensorflow::serving::{ModelSpec, PredictRequest, PredictResponse};
use crate::metrics::ClientMetrics;
use crate::stub::{GrpcPredictionStub, PredictionStub};
use crate::{Error, Result};

/// Default deadline for one Predict call
pub const RPC_TIMEOUT: Duration = Duration::from_secs(3);

/// Decoded output tensors keyed by output name
pub type Outputs = HashMap<String, TensorArray>;

/// Client for the TensorFlow Serving Predict API
///
/// Holds one stub for its whole lifetime and keeps no other state between
/// calls.
pub struct InferenceClient<S = GrpcPredictionStub> {
    stub: S,
    timeout: Duration,
    metrics: Option<Arc<ClientMetrics>>,
}

impl InferenceClient<GrpcPredictionStub> {
    /// Create a client for `host:port`, or for the Unix socket at `host`
    /// when `port` is `None`
    ///
    /// The channel connects lazily, so no RPC is issued here. Must be called
    /// from within a tokio runtime.
    pub fn new(host: &str, port: Option<u16>) -> Result<Self> {
        Ok(Self::with_stub(GrpcPredictionStub::connect_lazy(host, port)?))
    }

    /// Create a client from configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(&config.host, config.port)?.with_timeout(config.timeout()))
    }
}

impl<S: PredictionStub> InferenceClient<S> {
    /// Create a client on top of any stub
    pub fn with_stub(stub: S) -> Self {
        Self {
            stub,
            timeout: RPC_TIMEOUT,
            metrics: None,
        }
    }

    /// Override the per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Record call outcomes and latency
    pub fn with_metrics(mut self, metrics: Arc<ClientMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one prediction
    ///
    /// Every input is a batch of samples sharing element type and shape; the
    /// samples are stacked along a new leading axis. `model_version` selects
    /// an explicit version, `None` lets the server pick its default.
    ///
    /// Returns `(false, {})` when the call itself fails (unreachable server,
    /// non-OK status, timeout). With an empty `outputs` every response tensor
    /// is decoded, otherwise exactly the named ones; a name missing from the
    /// response is an [`Error::OutputNotFound`]. Encoding and decoding errors
    /// are returned as errors as well.
    pub async fn infer<I, K, V>(
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
        let request = build_request(inputs, model_name, model_version)?;

        let start = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.stub.predict(request, self.timeout))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::RemoteTimeout {
                timeout_ms: self.timeout.as_millis() as u64,
                context: format!("Predict on model '{}'", model_name),
            }),
        };
        let elapsed = start.elapsed();

        let response = match result {
            Ok(response) => {
                info!(
                    "Time for call to inference-server: {:.0} ms",
                    elapsed.as_secs_f64() * 1000.0
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_success(elapsed);
                }
                response
            }
            Err(e) => {
                warn!("Predict call for model '{}' failed: {}", model_name, e);
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure(elapsed);
                }
                return Ok((false, HashMap::new()));
            }
        };

        let decoded = decode_outputs(&response, outputs)?;
        Ok((true, decoded))
    }
}

fn build_request<I, K, V>(
    inputs: I,
    model_name: &str,
    model_version: Option<i64>,
) -> Result<PredictRequest>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<[TensorArray]>,
{
    let mut request = PredictRequest {
        model_spec: Some(ModelSpec {
            name: model_name.to_string(),
            version: model_version,
            ..Default::default()
        }),
        ..Default::default()
    };

    for (name, samples) in inputs {
        let batch = TensorArray::stack(samples.as_ref())?;
        request.inputs.insert(name.into(), make_tensor_proto(batch));
    }

    Ok(request)
}

fn decode_outputs(response: &PredictResponse, outputs: &[&str]) -> Result<Outputs> {
    if outputs.is_empty() {
        return response
            .outputs
            .iter()
            .map(|(name, tensor)| Ok((name.clone(), make_ndarray(tensor)?)))
            .collect();
    }

    outputs
        .iter()
        .map(|&name| {
            let tensor = response
                .outputs
                .get(name)
                .ok_or_else(|| Error::OutputNotFound(name.to_string()))?;
            Ok((name.to_string(), make_ndarray(tensor)?))
        })
        .collect()
}
