pub mod backend;
pub mod config;
pub mod decoding;
pub mod error;
pub mod logging;
pub mod payload;
pub mod postprocessing;
pub mod preprocessing;
pub mod rcnn;
pub mod yolo;
pub mod zoo;

use ndarray::ArrayD;
use std::path::Path;

pub use backend::{DetectionBackend, ExecutionProvider, OrtBackend, OutputLayout, RawDetections};
pub use config::HandlerConfig;
pub use error::HandlerError;
pub use payload::Prediction;
pub use rcnn::FasterRcnnHandler;
pub use yolo::YoloHandler;

/// Lifecycle hooks consumed by the serving host, invoked in a strictly
/// linear order per request: `decode` -> `predict` -> `encode`, with `load`
/// called once at process start.
pub trait InferenceHandler: Sized {
    /// Resolve pretrained weights and return a ready-to-infer handler.
    fn load(model_dir: Option<&Path>) -> anyhow::Result<Self>;

    /// Deserialize a raw request payload into a model-ready tensor.
    fn decode(&self, payload: &[u8], content_type: &str) -> anyhow::Result<ArrayD<f32>>;

    /// Run a single forward pass and extract the detection set.
    fn predict(&mut self, input: ArrayD<f32>) -> anyhow::Result<Prediction>;

    /// Serialize the prediction for the requested accept type.
    fn encode(&self, prediction: &Prediction, accept: &str) -> anyhow::Result<String>;
}
