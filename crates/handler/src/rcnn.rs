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

/// Handler set for the R-CNN-family zoo model (`fasterrcnn_resnet50_fpn`):
/// plain to-tensor scaling at native resolution (the network normalizes
/// internally), then a single forward pass whose raw output passes through
/// unfiltered. Any `short` hint in the request is ignored; this family has
/// no resize step.
pub struct FasterRcnnHandler<B = OrtBackend> {
    backend: B,
}

impl<B: DetectionBackend> FasterRcnnHandler<B> {
    /// Build a handler around an already-loaded backend.
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }
}

impl<B: DetectionBackend> InferenceHandler for FasterRcnnHandler<B> {
    fn load(model_dir: Option<&Path>) -> anyhow::Result<Self> {
        let config = HandlerConfig::from_env()?;
        let model = PretrainedModel::FasterRcnnResnet50Fpn;

        let weights = zoo::fetch(model, model_dir)?;
        let backend = B::load_model(&weights, model.output_layout(), config.execution_provider)?;

        tracing::info!(model = model.name(), "Pretrained model ready");
        Ok(Self::with_backend(backend))
    }

    fn decode(&self, payload: &[u8], content_type: &str) -> anyhow::Result<ArrayD<f32>> {
        let decoded = decode_request(payload, content_type)?;
        PreProcessor::new(Transform::ToTensor).process(&decoded.image)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ExecutionProvider, OutputLayout, RawDetections};
    use crate::decoding::{RAW_BUFFER_HEIGHT, RAW_BUFFER_WIDTH};
    use crate::payload::APPLICATION_X_NPY;
    use ndarray::{Array, IxDyn};

    struct NullBackend;

    impl DetectionBackend for NullBackend {
        fn load_model(
            _path: &Path,
            _layout: OutputLayout,
            _provider: ExecutionProvider,
        ) -> anyhow::Result<Self> {
            Ok(NullBackend)
        }

        fn infer(&mut self, _input: &ArrayD<f32>) -> anyhow::Result<RawDetections> {
            // Torchvision-style flat outputs, no batch axis
            Ok(RawDetections {
                cid: Array::from_shape_vec(IxDyn(&[2]), vec![1.0, 17.0]).unwrap(),
                score: Array::from_shape_vec(IxDyn(&[2]), vec![0.95, 0.6]).unwrap(),
                bbox: Array::from_shape_vec(IxDyn(&[2, 4]), (0..8).map(|i| i as f32).collect())
                    .unwrap(),
            })
        }
    }

    #[test]
    fn test_raw_buffer_decodes_at_native_resolution() {
        let handler = FasterRcnnHandler::with_backend(NullBackend);
        let payload = vec![0u8; (RAW_BUFFER_WIDTH * RAW_BUFFER_HEIGHT) as usize];

        let input = handler.decode(&payload, APPLICATION_X_NPY).unwrap();
        assert_eq!(
            input.shape(),
            &[1, 3, RAW_BUFFER_HEIGHT as usize, RAW_BUFFER_WIDTH as usize],
            "ToTensor should preserve the fixed buffer dimensions"
        );
    }

    #[test]
    fn test_predict_flattens_torchvision_outputs() {
        let mut handler = FasterRcnnHandler::with_backend(NullBackend);

        let prediction = handler.predict(Array::zeros(IxDyn(&[1, 3, 137, 236]))).unwrap();
        assert_eq!(prediction.shape, vec![3, 137, 236]);
        assert_eq!(prediction.cid, vec![1.0, 17.0]);
        assert_eq!(prediction.bbox[1], [4.0, 5.0, 6.0, 7.0]);
    }
}
