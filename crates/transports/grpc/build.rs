// Generates the TensorFlow Serving protobuf types and PredictionService stubs

const PROTO_ROOT: &str = "../../../proto/";

const PROTOS: &[&str] = &[
    "tensorflow/core/framework/types.proto",
    "tensorflow/core/framework/tensor_shape.proto",
    "tensorflow/core/framework/tensor.proto",
    "tensorflow/core/protobuf/meta_graph.proto",
    "tensorflow_serving/apis/model.proto",
    "tensorflow_serving/apis/predict.proto",
    "tensorflow_serving/apis/prediction_service.proto",
];

fn main() {
    // Vendored protoc, no system install required
    std::env::set_var("PROTOC", protobuf_src::protoc());

    // Server traits back in-process test servers and mocks; opt out with
    // `default-features = false`
    let build_server = std::env::var_os("CARGO_FEATURE_SERVER").is_some();

    let protos: Vec<String> = PROTOS
        .iter()
        .map(|proto| format!("{}{}", PROTO_ROOT, proto))
        .collect();

    tonic_prost_build::configure()
        .build_client(true)
        .build_server(build_server)
        .compile_protos(&protos, &[PROTO_ROOT])
        .unwrap_or_else(|e| panic!("Failed to compile TensorFlow Serving protos: {}", e));

    println!("cargo:rerun-if-changed=build.rs");
    for proto in &protos {
        println!("cargo:rerun-if-changed={}", proto);
    }
    println!("cargo:rerun-if-changed={}google/protobuf/wrappers.proto", PROTO_ROOT);
}
