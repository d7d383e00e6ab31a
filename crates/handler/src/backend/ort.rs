use super::{DetectionBackend, ExecutionProvider, OutputLayout, RawDetections};
use ndarray::ArrayD;
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};
use std::path::Path;

pub struct OrtBackend {
    session: Session,
    layout: OutputLayout,
    input_name: String,
    output_names: Vec<String>,
}

impl DetectionBackend for OrtBackend {
    fn load_model(
        path: &Path,
        layout: OutputLayout,
        provider: ExecutionProvider,
    ) -> anyhow::Result<Self> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        let builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?;

        let builder = match provider {
            ExecutionProvider::Cuda => {
                #[cfg(feature = "cuda")]
                {
                    tracing::info!("Initializing ONNX Runtime with CUDA execution provider");
                    builder.with_execution_providers([
                        ort::execution_providers::CUDAExecutionProvider::default()
                            .with_device_id(0)
                            .build()
                            .error_on_failure(),
                    ])?
                }
                #[cfg(not(feature = "cuda"))]
                {
                    anyhow::bail!(
                        "Execution provider `cuda` requires building with the `cuda` feature"
                    )
                }
            }
            ExecutionProvider::Cpu => {
                tracing::info!("Initializing ONNX Runtime with CPU execution provider");
                builder
            }
        };

        let session = builder.commit_from_file(path)?;
        check_graph_bindings(session.inputs().len(), session.outputs().len(), &layout)?;

        let input_name = session.inputs()[0].name().to_string();
        let output_names: Vec<String> =
            session.outputs().iter().map(|o| o.name().to_string()).collect();

        tracing::info!(
            path = %path.display(),
            input = %input_name,
            outputs = ?output_names,
            "Model loaded"
        );
        Ok(Self {
            session,
            layout,
            input_name,
            output_names,
        })
    }

    fn infer(&mut self, input: &ArrayD<f32>) -> anyhow::Result<RawDetections> {
        let cid_name = self.output_names[self.layout.cid].clone();
        let score_name = self.output_names[self.layout.score].clone();
        let bbox_name = self.output_names[self.layout.bbox].clone();

        let outputs = self.session.run(ort::inputs![
            self.input_name.as_str() => TensorRef::from_array_view(input.view())?
        ])?;

        Ok(RawDetections {
            cid: extract_f32(&outputs[cid_name.as_str()])?,
            score: extract_f32(&outputs[score_name.as_str()])?,
            bbox: extract_f32(&outputs[bbox_name.as_str()])?,
        })
    }
}

/// Reject exports whose graph does not match the expected signature: one
/// image input, and enough output tensors to satisfy the model's output
/// layout. Catches e.g. exports carrying an extra `image_shape` input or
/// NMS-index outputs, which would otherwise run into opaque session errors
/// or bind semantically wrong tensors.
fn check_graph_bindings(
    input_count: usize,
    output_count: usize,
    layout: &OutputLayout,
) -> anyhow::Result<()> {
    if input_count != 1 {
        anyhow::bail!(
            "Model declares {} inputs, expected a single [1, 3, H, W] image tensor; \
             this export does not match the supported graph signature",
            input_count
        );
    }

    let needed = layout.cid.max(layout.score).max(layout.bbox);
    if output_count <= needed {
        anyhow::bail!(
            "Model exposes {} outputs, the output layout expects at least {}",
            output_count,
            needed + 1
        );
    }

    Ok(())
}

/// Detection exports disagree on dtypes: class ids arrive as f32 in the
/// YOLO-family graph and as int64 labels in the R-CNN family. Widen
/// everything to f32.
fn extract_f32(value: &ort::value::DynValue) -> anyhow::Result<ArrayD<f32>> {
    if let Ok(view) = value.try_extract_array::<f32>() {
        return Ok(view.into_owned());
    }
    let view = value.try_extract_array::<i64>()?;
    Ok(view.mapv(|v| v as f32))
}
