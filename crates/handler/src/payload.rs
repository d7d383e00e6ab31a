use serde::{Deserialize, Serialize};

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_X_IMAGE: &str = "application/x-image";
pub const APPLICATION_X_NPY: &str = "application/x-npy";

/// JSON request body: a base64-encoded image plus an optional short-side
/// resize hint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRequest {
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<u32>,
}

/// Detection set produced by a single forward pass, in the model's own
/// ranking order. `cid`, `score` and `bbox` have one entry per detection;
/// `shape` is the `[C, H, W]` shape of the model input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub shape: Vec<usize>,
    pub cid: Vec<f32>,
    pub score: Vec<f32>,
    pub bbox: Vec<[f32; 4]>,
}
