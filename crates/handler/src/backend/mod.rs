use ndarray::ArrayD;
use std::path::Path;

pub mod ort;

pub use ort::OrtBackend;

/// Fixed compute target the model is bound to at load time.
#[derive(Debug, Clone, Copy)]
pub enum ExecutionProvider {
    Cpu,
    Cuda,
}

/// Positional mapping from a model's raw output tensors to the detection
/// fields. The YOLO-family export emits (class ids, scores, boxes); the
/// R-CNN family emits (boxes, labels, scores).
#[derive(Debug, Clone, Copy)]
pub struct OutputLayout {
    pub cid: usize,
    pub score: usize,
    pub bbox: usize,
}

/// Raw per-detection tensors straight from the network, before flattening.
pub struct RawDetections {
    pub cid: ArrayD<f32>,
    pub score: ArrayD<f32>,
    pub bbox: ArrayD<f32>,
}

/// Seam between the handlers and the inference runtime; tests substitute a
/// mock implementation.
pub trait DetectionBackend: Sized {
    /// Load model weights and bind them to the given execution provider.
    fn load_model(
        path: &Path,
        layout: OutputLayout,
        provider: ExecutionProvider,
    ) -> anyhow::Result<Self>;

    /// Run a single forward pass on a `[1, 3, H, W]` input tensor.
    fn infer(&mut self, input: &ArrayD<f32>) -> anyhow::Result<RawDetections>;
}
