use crate::backend::OutputLayout;
use std::env;
use std::path::{Path, PathBuf};

/// Pretrained detection networks retrievable by name.
///
/// Weights are ONNX exports of the framework-zoo models, exported with their
/// preprocessing conventions intact: a single `[1, 3, H, W]` f32 image input
/// and per-detection output tensors in the order given by `output_layout`.
/// Exports with a different graph signature (extra inputs such as an
/// `image_shape` tensor, or NMS-index outputs) are rejected at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PretrainedModel {
    Yolo3Darknet53Coco,
    FasterRcnnResnet50Fpn,
}

impl PretrainedModel {
    pub fn name(&self) -> &'static str {
        match self {
            PretrainedModel::Yolo3Darknet53Coco => "yolo3_darknet53_coco",
            PretrainedModel::FasterRcnnResnet50Fpn => "fasterrcnn_resnet50_fpn",
        }
    }

    /// Download URL under the configured artifact host.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.file_name())
    }

    /// Positional output bindings of the exported graphs.
    pub fn output_layout(&self) -> OutputLayout {
        match self {
            // (class ids, scores, boxes)
            PretrainedModel::Yolo3Darknet53Coco => OutputLayout {
                cid: 0,
                score: 1,
                bbox: 2,
            },
            // (boxes, labels, scores)
            PretrainedModel::FasterRcnnResnet50Fpn => OutputLayout {
                cid: 1,
                score: 2,
                bbox: 0,
            },
        }
    }

    fn file_name(&self) -> String {
        format!("{}.onnx", self.name())
    }
}

/// Resolve the weights file for a pretrained model.
///
/// Resolution order: `MODEL_PATH` env override, the given storage location,
/// the local cache, then a one-time download from the artifact host named by
/// `MODEL_ZOO_URL`.
pub fn fetch(model: PretrainedModel, model_dir: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Ok(path) = env::var("MODEL_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            tracing::info!(path = %path.display(), "Using MODEL_PATH override");
            return Ok(path);
        }
        tracing::warn!(
            path = %path.display(),
            "MODEL_PATH is set but does not exist, falling back to the zoo"
        );
    }

    let zoo_url = env::var("MODEL_ZOO_URL").ok();
    fetch_from(model, model_dir, &cache_dir()?, zoo_url.as_deref())
}

fn fetch_from(
    model: PretrainedModel,
    model_dir: Option<&Path>,
    cache: &Path,
    zoo_url: Option<&str>,
) -> anyhow::Result<PathBuf> {
    if let Some(dir) = model_dir {
        let candidate = dir.join(model.file_name());
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    let target = cache.join(model.file_name());
    if target.exists() {
        return Ok(target);
    }

    let Some(base_url) = zoo_url else {
        anyhow::bail!(
            "No weights found for `{}`: set MODEL_ZOO_URL to the artifact host, \
             or provide the file via MODEL_PATH or MODEL_DIR",
            model.name()
        );
    };

    std::fs::create_dir_all(cache)?;
    download(&model.url(base_url), &target)?;
    Ok(target)
}

fn cache_dir() -> anyhow::Result<PathBuf> {
    let base = dirs::cache_dir()
        .ok_or_else(|| anyhow::anyhow!("No cache directory available on this platform"))?;
    Ok(base.join("detection-endpoint"))
}

fn download(url: &str, target: &Path) -> anyhow::Result<()> {
    tracing::info!(url, target = %target.display(), "Downloading pretrained weights");

    let response = ureq::get(url).call()?;
    let mut reader = response.into_reader();

    // Write to a partial file first so an interrupted download never leaves
    // a truncated .onnx in the cache.
    let partial = target.with_extension("onnx.partial");
    let mut file = std::fs::File::create(&partial)?;
    std::io::copy(&mut reader, &mut file)?;
    std::fs::rename(&partial, target)?;

    tracing::info!(target = %target.display(), "Weights cached");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoo_names() {
        assert_eq!(
            PretrainedModel::Yolo3Darknet53Coco.name(),
            "yolo3_darknet53_coco"
        );
        assert_eq!(
            PretrainedModel::FasterRcnnResnet50Fpn.name(),
            "fasterrcnn_resnet50_fpn"
        );
    }

    #[test]
    fn test_output_layouts_differ_per_family() {
        let yolo = PretrainedModel::Yolo3Darknet53Coco.output_layout();
        assert_eq!((yolo.cid, yolo.score, yolo.bbox), (0, 1, 2));

        let rcnn = PretrainedModel::FasterRcnnResnet50Fpn.output_layout();
        assert_eq!((rcnn.cid, rcnn.score, rcnn.bbox), (1, 2, 0));
    }

    #[test]
    fn test_url_joins_base_without_double_slash() {
        let url = PretrainedModel::Yolo3Darknet53Coco.url("https://models.example.com/zoo/");
        assert_eq!(
            url,
            "https://models.example.com/zoo/yolo3_darknet53_coco.onnx"
        );
    }

    #[test]
    fn test_fetch_prefers_existing_file_in_model_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        let weights = dir.path().join("yolo3_darknet53_coco.onnx");
        std::fs::write(&weights, b"not a real model").unwrap();

        let resolved = fetch_from(
            PretrainedModel::Yolo3Darknet53Coco,
            Some(dir.path()),
            cache.path(),
            None,
        )
        .unwrap();
        assert_eq!(
            resolved, weights,
            "Weights already present in the storage location should be used without a download"
        );
    }

    #[test]
    fn test_fetch_prefers_cached_weights() {
        let cache = tempfile::tempdir().unwrap();
        let cached = cache.path().join("fasterrcnn_resnet50_fpn.onnx");
        std::fs::write(&cached, b"not a real model").unwrap();

        let resolved = fetch_from(
            PretrainedModel::FasterRcnnResnet50Fpn,
            None,
            cache.path(),
            None,
        )
        .unwrap();
        assert_eq!(resolved, cached, "Cached weights should short-circuit the download");
    }

    #[test]
    fn test_fetch_without_any_source_names_the_remedy() {
        let cache = tempfile::tempdir().unwrap();

        let err = fetch_from(PretrainedModel::Yolo3Darknet53Coco, None, cache.path(), None)
            .unwrap_err();
        let message = err.to_string();
        assert!(
            message.contains("MODEL_ZOO_URL"),
            "Error should tell the operator how to supply weights: {}",
            message
        );
        assert!(
            message.contains("yolo3_darknet53_coco"),
            "Error should name the model: {}",
            message
        );
    }
}
