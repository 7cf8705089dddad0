//! Hand-written prost messages for the subset of the KServe v2 gRPC
//! inference protocol the harness speaks (`ServerReady`, `ModelReady`,
//! `ModelInfer`). Field tags follow `grpc_predict_v2.proto`; fields the
//! harness never touches (parameter maps, typed tensor contents) are
//! omitted and skipped by prost on decode.

use bytes::Bytes;

pub const SERVER_READY_PATH: &str = "/inference.GRPCInferenceService/ServerReady";
pub const MODEL_READY_PATH: &str = "/inference.GRPCInferenceService/ModelReady";
pub const MODEL_INFER_PATH: &str = "/inference.GRPCInferenceService/ModelInfer";

#[derive(Clone, PartialEq, prost::Message)]
pub struct ServerReadyRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ServerReadyResponse {
    #[prost(bool, tag = "1")]
    pub ready: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ModelReadyRequest {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub version: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ModelReadyResponse {
    #[prost(bool, tag = "1")]
    pub ready: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct InferInputTensor {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub datatype: String,
    #[prost(int64, repeated, tag = "3")]
    pub shape: Vec<i64>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct InferRequestedOutputTensor {
    #[prost(string, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ModelInferRequest {
    #[prost(string, tag = "1")]
    pub model_name: String,
    #[prost(string, tag = "2")]
    pub model_version: String,
    #[prost(string, tag = "3")]
    pub id: String,
    #[prost(message, repeated, tag = "5")]
    pub inputs: Vec<InferInputTensor>,
    #[prost(message, repeated, tag = "6")]
    pub outputs: Vec<InferRequestedOutputTensor>,
    /// Tensor data as little-endian raw bytes, one entry per input.
    #[prost(bytes = "bytes", repeated, tag = "7")]
    pub raw_input_contents: Vec<Bytes>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct InferOutputTensor {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub datatype: String,
    #[prost(int64, repeated, tag = "3")]
    pub shape: Vec<i64>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ModelInferResponse {
    #[prost(string, tag = "1")]
    pub model_name: String,
    #[prost(string, tag = "2")]
    pub model_version: String,
    #[prost(string, tag = "3")]
    pub id: String,
    #[prost(message, repeated, tag = "5")]
    pub outputs: Vec<InferOutputTensor>,
    #[prost(bytes = "bytes", repeated, tag = "6")]
    pub raw_output_contents: Vec<Bytes>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn infer_request_round_trips() {
        let request = ModelInferRequest {
            model_name: "yolov8s".to_string(),
            model_version: "1".to_string(),
            id: String::new(),
            inputs: vec![InferInputTensor {
                name: "images".to_string(),
                datatype: "FP32".to_string(),
                shape: vec![1, 3, 640, 640],
            }],
            outputs: vec![InferRequestedOutputTensor {
                name: "output0".to_string(),
            }],
            raw_input_contents: vec![Bytes::from_static(&[0u8; 16])],
        };

        let encoded = request.encode_to_vec();
        let decoded = ModelInferRequest::decode(encoded.as_slice()).unwrap();
        assert_eq!(decoded, request);
    }
}
