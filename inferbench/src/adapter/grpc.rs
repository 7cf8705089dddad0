use super::proto::{
    InferInputTensor, InferRequestedOutputTensor, ModelInferRequest, ModelInferResponse,
    ModelReadyRequest, ModelReadyResponse, ServerReadyRequest, ServerReadyResponse,
    MODEL_INFER_PATH, MODEL_READY_PATH, SERVER_READY_PATH,
};
use super::{Payload, RequestError};
use http::uri::PathAndQuery;
use inferbench_core::{BenchConfig, PROBE_TIMEOUT};
use std::time::{Duration, Instant};
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::transport::{Channel, Endpoint};
use tonic::Request;
#[allow(unused)]
use tracing::{debug, trace};

/// KServe v2 gRPC client over a plain tonic channel; unary calls go
/// through `ProstCodec` against hand-written message types, so no protoc
/// step is needed.
pub struct GrpcAdapter {
    grpc: Grpc<Channel>,
    model_name: String,
    model_version: String,
    timeout: Duration,
}

impl GrpcAdapter {
    pub async fn connect(config: &BenchConfig) -> Result<Self, RequestError> {
        let channel = Endpoint::from_shared(format!("http://{}", config.grpc_url))
            .map_err(RequestError::Transport)?
            .connect_timeout(PROBE_TIMEOUT)
            .connect()
            .await?;

        Ok(Self {
            grpc: Grpc::new(channel),
            model_name: config.model_name.clone(),
            model_version: config.model_version.clone(),
            timeout: config.request_timeout(),
        })
    }

    pub async fn probe_ready(&mut self) -> bool {
        let probe = async {
            self.grpc.ready().await.map_err(RequestError::Transport)?;
            let codec: ProstCodec<ServerReadyRequest, ServerReadyResponse> = ProstCodec::default();
            let response = self
                .grpc
                .unary(
                    Request::new(ServerReadyRequest {}),
                    PathAndQuery::from_static(SERVER_READY_PATH),
                    codec,
                )
                .await?;
            if !response.get_ref().ready {
                return Ok(false);
            }

            let codec: ProstCodec<ModelReadyRequest, ModelReadyResponse> = ProstCodec::default();
            let response = self
                .grpc
                .unary(
                    Request::new(ModelReadyRequest {
                        name: self.model_name.clone(),
                        version: self.model_version.clone(),
                    }),
                    PathAndQuery::from_static(MODEL_READY_PATH),
                    codec,
                )
                .await?;
            Ok::<_, RequestError>(response.get_ref().ready)
        };

        match tokio::time::timeout(PROBE_TIMEOUT, probe).await {
            Ok(Ok(ready)) => ready,
            Ok(Err(err)) => {
                debug!(%err, "grpc readiness probe failed");
                false
            }
            Err(_) => {
                debug!("grpc readiness probe timed out");
                false
            }
        }
    }

    pub async fn send_one(&mut self, payload: &Payload) -> Result<f64, RequestError> {
        // Request assembly is cheap (the tensor bytes are refcounted) and
        // excluded from the measured window regardless.
        let request = ModelInferRequest {
            model_name: self.model_name.clone(),
            model_version: self.model_version.clone(),
            id: String::new(),
            inputs: vec![InferInputTensor {
                name: "images".to_string(),
                datatype: "FP32".to_string(),
                shape: payload.shape.clone(),
            }],
            outputs: vec![InferRequestedOutputTensor {
                name: "output0".to_string(),
            }],
            raw_input_contents: vec![payload.raw_tensor.clone()],
        };

        self.grpc.ready().await.map_err(RequestError::Transport)?;
        let codec: ProstCodec<ModelInferRequest, ModelInferResponse> = ProstCodec::default();

        let start = Instant::now();
        let call = self.grpc.unary(
            Request::new(request),
            PathAndQuery::from_static(MODEL_INFER_PATH),
            codec,
        );
        let response = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result?,
            Err(_) => return Err(RequestError::Timeout(self.timeout)),
        };
        let latency_ms = start.elapsed().as_secs_f64() * 1_000.;

        if response.get_ref().outputs.is_empty()
            && response.get_ref().raw_output_contents.is_empty()
        {
            return Err(RequestError::Decode(
                "infer response carried no output tensors".to_string(),
            ));
        }

        Ok(latency_ms)
    }
}
