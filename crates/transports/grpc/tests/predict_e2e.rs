//! End-to-end Predict tests against an in-process PredictionService
//!
//! The test server echoes every input back as an output of the same name and
//! adds a constant `extra` output. Model names trigger special behavior:
//! `slow` sleeps past any client timeout, `missing` answers NOT_FOUND.

use std::sync::Arc;
use std::time::Duration;

use tfserving_core::ndarray::arr2;
use tfserving_core::TensorArray;
use tfserving_grpc::generated::tensorflow::serving::prediction_service_server::{
    PredictionService, PredictionServiceServer,
};
use tfserving_grpc::{
    make_tensor_proto, ClientConfig, ClientMetrics, InferenceClient, PredictRequest,
    PredictResponse,
};
use tokio::sync::Mutex;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

#[derive(Default)]
struct EchoService {
    last_request: Arc<Mutex<Option<PredictRequest>>>,
}

#[tonic::async_trait]
impl PredictionService for EchoService {
    async fn predict(
        &self,
        request: Request<PredictRequest>,
    ) -> Result<Response<PredictResponse>, Status> {
        let request = request.into_inner();
        *self.last_request.lock().await = Some(request.clone());

        let model_name = request
            .model_spec
            .as_ref()
            .map(|spec| spec.name.clone())
            .unwrap_or_default();

        match model_name.as_str() {
            "slow" => tokio::time::sleep(Duration::from_secs(10)).await,
            "missing" => return Err(Status::not_found("Servable not found")),
            _ => {}
        }

        let mut response = PredictResponse {
            model_spec: request.model_spec.clone(),
            ..Default::default()
        };
        response.outputs = request.inputs;
        response
            .outputs
            .insert("extra".to_string(), make_tensor_proto(vec![42i64]));

        Ok(Response::new(response))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("tfserving_grpc=debug")
        .with_test_writer()
        .try_init();
}

/// Start the echo server on an ephemeral TCP port
async fn start_tcp_server() -> (u16, Arc<Mutex<Option<PredictRequest>>>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let service = EchoService::default();
    let last_request = service.last_request.clone();

    tokio::spawn(async move {
        Server::builder()
            .add_service(PredictionServiceServer::new(service))
            .serve_with_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    (port, last_request)
}

fn images() -> Vec<TensorArray> {
    vec![
        TensorArray::from(arr2(&[[0u8, 1], [2, 3]])),
        TensorArray::from(arr2(&[[4u8, 5], [6, 7]])),
    ]
}

#[tokio::test]
async fn test_predict_returns_requested_outputs() {
    init_tracing();
    let (port, last_request) = start_tcp_server().await;

    let client = InferenceClient::new("127.0.0.1", Some(port)).unwrap();
    let (success, outputs) = client
        .infer([("images", images())], "mobilenet", Some(3), &["images"])
        .await
        .unwrap();

    assert!(success);
    assert_eq!(outputs.len(), 1, "only the requested output is decoded");

    let expected = TensorArray::stack(&images()).unwrap();
    assert_eq!(outputs["images"], expected);
    assert_eq!(outputs["images"].shape(), &[2, 2, 2]);

    let request = last_request.lock().await.take().unwrap();
    let spec = request.model_spec.unwrap();
    assert_eq!(spec.name, "mobilenet");
    assert_eq!(spec.version, Some(3));
}

#[tokio::test]
async fn test_predict_returns_all_outputs_by_default() {
    init_tracing();
    let (port, last_request) = start_tcp_server().await;

    let client = InferenceClient::new("127.0.0.1", Some(port)).unwrap();
    let (success, outputs) = client
        .infer(
            [
                ("images", images()),
                ("scale", vec![TensorArray::scalar(0.5f64)]),
            ],
            "mobilenet",
            None,
            &[],
        )
        .await
        .unwrap();

    assert!(success);
    assert_eq!(outputs.len(), 3);
    assert_eq!(outputs["extra"], TensorArray::from(vec![42i64]));
    // f64 inputs travel as f32
    assert_eq!(outputs["scale"], TensorArray::from(vec![0.5f32]));

    let request = last_request.lock().await.take().unwrap();
    assert_eq!(request.model_spec.unwrap().version, None);
}

#[tokio::test]
async fn test_predict_error_status_returns_false() {
    init_tracing();
    let (port, _) = start_tcp_server().await;

    let metrics = Arc::new(ClientMetrics::with_default_registry().unwrap());
    let client = InferenceClient::new("127.0.0.1", Some(port))
        .unwrap()
        .with_metrics(metrics.clone());

    let (success, outputs) = client
        .infer([("images", images())], "missing", None, &[])
        .await
        .unwrap();

    assert!(!success);
    assert!(outputs.is_empty());
    assert_eq!(
        metrics.requests_total.with_label_values(&["failure"]).get(),
        1
    );
}

#[tokio::test]
async fn test_predict_timeout_returns_false() {
    init_tracing();
    let (port, _) = start_tcp_server().await;

    let config = ClientConfig {
        host: "127.0.0.1".to_string(),
        port: Some(port),
        timeout_ms: 200,
    };
    let client = InferenceClient::from_config(&config).unwrap();

    let start = std::time::Instant::now();
    let (success, outputs) = client
        .infer([("images", images())], "slow", None, &[])
        .await
        .unwrap();

    assert!(!success);
    assert!(outputs.is_empty());
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_predict_unreachable_server_returns_false() {
    init_tracing();

    // Bind and drop to get a port nobody listens on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let client = InferenceClient::new("127.0.0.1", Some(port))
        .unwrap()
        .with_timeout(Duration::from_secs(1));

    let (success, outputs) = client
        .infer([("images", images())], "mobilenet", None, &[])
        .await
        .unwrap();

    assert!(!success);
    assert!(outputs.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_predict_over_unix_socket() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("serving.sock");
    let listener = tokio::net::UnixListener::bind(&socket).unwrap();

    tokio::spawn(async move {
        Server::builder()
            .add_service(PredictionServiceServer::new(EchoService::default()))
            .serve_with_incoming(tokio_stream::wrappers::UnixListenerStream::new(listener))
            .await
            .unwrap();
    });

    let host = format!("unix://{}", socket.display());
    let client = InferenceClient::new(&host, None).unwrap();

    let (success, outputs) = client
        .infer([("images", images())], "mobilenet", None, &["extra"])
        .await
        .unwrap();

    assert!(success);
    assert_eq!(outputs["extra"], TensorArray::from(vec![42i64]));
}
