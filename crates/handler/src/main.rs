use handler::logging::setup_logging;
use handler::payload::APPLICATION_JSON;
use handler::{FasterRcnnHandler, HandlerConfig, InferenceHandler, YoloHandler};
use std::env;
use std::path::Path;

/// One-shot runner: reads a payload file, drives the configured handler
/// through decode -> predict -> encode and prints the response. The serving
/// host owns everything else.
fn main() -> anyhow::Result<()> {
    let config = HandlerConfig::from_env()?;
    setup_logging(&config);

    tracing::info!(
        config = ?config,
        "Loaded configuration"
    );

    let payload_path = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Usage: handler <payload-file>"))?;
    let payload = std::fs::read(&payload_path)?;

    let content_type = env::var("CONTENT_TYPE").unwrap_or_else(|_| APPLICATION_JSON.to_string());
    let accept = env::var("ACCEPT").unwrap_or_else(|_| APPLICATION_JSON.to_string());
    let model_name = env::var("MODEL_NAME").unwrap_or_else(|_| "yolo3_darknet53_coco".to_string());

    tracing::info!(model = %model_name, content_type = %content_type, "Handling request");

    let model_dir = config.model_dir.as_deref();
    let response = match model_name.as_str() {
        "yolo3_darknet53_coco" => run::<YoloHandler>(&payload, &content_type, &accept, model_dir)?,
        "fasterrcnn_resnet50_fpn" => {
            run::<FasterRcnnHandler>(&payload, &content_type, &accept, model_dir)?
        }
        other => anyhow::bail!("Unknown model name: {other}"),
    };

    println!("{response}");
    Ok(())
}

fn run<H: InferenceHandler>(
    payload: &[u8],
    content_type: &str,
    accept: &str,
    model_dir: Option<&Path>,
) -> anyhow::Result<String> {
    let mut handler = H::load(model_dir)?;
    let input = handler.decode(payload, content_type)?;
    let prediction = handler.predict(input)?;
    handler.encode(&prediction, accept)
}
