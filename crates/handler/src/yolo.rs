use crate::InferenceHandler;
use crate::backend::{DetectionBackend, OrtBackend};
use crate::config::HandlerConfig;
use crate::decoding::decode_request;
use crate::error::HandlerError;
use crate::payload::{APPLICATION_JSON, Prediction};
use crate::postprocessing::collect_detections;
use crate::preprocessing::{PreProcessor, Transform};
use crate::zoo::{self, PretrainedModel};
use ndarray::ArrayD;
use std::path::Path;
use std::time::Instant;

/// Long-side cap applied by the short-side resize, matching the upstream
/// transform default.
const MAX_LONG_SIDE: u32 = 1024;

/// Handler set for the YOLO-family zoo model (`yolo3_darknet53_coco`):
/// short-side resize with ImageNet normalization, then a single forward
/// pass whose raw output passes through unfiltered.
pub struct YoloHandler<B = OrtBackend> {
    backend: B,
    short_size: u32,
}

impl<B: DetectionBackend> YoloHandler<B> {
    /// Build a handler around an already-loaded backend.
    pub fn with_backend(backend: B, short_size: u32) -> Self {
        Self {
            backend,
            short_size,
        }
    }
}

impl<B: DetectionBackend> InferenceHandler for YoloHandler<B> {
    fn load(model_dir: Option<&Path>) -> anyhow::Result<Self> {
        let config = HandlerConfig::from_env()?;
        let model = PretrainedModel::Yolo3Darknet53Coco;

        let weights = zoo::fetch(model, model_dir)?;
        let backend = B::load_model(&weights, model.output_layout(), config.execution_provider)?;

        tracing::info!(model = model.name(), "Pretrained model ready");
        Ok(Self::with_backend(backend, config.short_size))
    }

    fn decode(&self, payload: &[u8], content_type: &str) -> anyhow::Result<ArrayD<f32>> {
        let decoded = decode_request(payload, content_type)?;
        let transform = Transform::ShortSideResize {
            short: decoded.short_hint.unwrap_or(self.short_size),
            max_size: MAX_LONG_SIDE,
        };
        PreProcessor::new(transform).process(&decoded.image)
    }

    fn predict(&mut self, input: ArrayD<f32>) -> anyhow::Result<Prediction> {
        let shape = input.shape().to_vec();

        let start = Instant::now();
        let raw = self.backend.infer(&input)?;
        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Forward pass complete"
        );

        collect_detections(&raw, &shape)
    }

    fn encode(&self, prediction: &Prediction, accept: &str) -> anyhow::Result<String> {
        if accept != APPLICATION_JSON {
            return Err(HandlerError::UnsupportedContentType {
                content_type: accept.to_string(),
            }
            .into());
        }
        Ok(serde_json::to_string(prediction)?)
    }
}
