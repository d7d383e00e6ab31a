use crate::backend::RawDetections;
use crate::payload::Prediction;

/// Flatten raw model outputs into the detection set. Raw output passes
/// through unfiltered: no thresholding, no suppression, the model's own
/// ranking order is preserved.
pub fn collect_detections(raw: &RawDetections, input_shape: &[usize]) -> anyhow::Result<Prediction> {
    let cid: Vec<f32> = raw.cid.iter().copied().collect();
    let score: Vec<f32> = raw.score.iter().copied().collect();

    let flat_boxes: Vec<f32> = raw.bbox.iter().copied().collect();
    if !flat_boxes.len().is_multiple_of(4) {
        anyhow::bail!(
            "Box tensor of length {} is not a sequence of 4-coordinate boxes",
            flat_boxes.len()
        );
    }
    let bbox: Vec<[f32; 4]> = flat_boxes
        .chunks_exact(4)
        .map(|c| [c[0], c[1], c[2], c[3]])
        .collect();

    if cid.len() != score.len() || cid.len() != bbox.len() {
        anyhow::bail!(
            "Detection arrays disagree: {} class ids, {} scores, {} boxes",
            cid.len(),
            score.len(),
            bbox.len()
        );
    }

    // Batch dimension is dropped from the reported input shape.
    let shape = if input_shape.len() == 4 && input_shape[0] == 1 {
        input_shape[1..].to_vec()
    } else {
        input_shape.to_vec()
    };

    Ok(Prediction {
        shape,
        cid,
        score,
        bbox,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn};

    fn raw(n: usize) -> RawDetections {
        let cid = Array::from_shape_vec(IxDyn(&[1, n, 1]), (0..n).map(|i| i as f32).collect())
            .unwrap();
        let score =
            Array::from_shape_vec(IxDyn(&[1, n, 1]), vec![0.9; n]).unwrap();
        let bbox = Array::from_shape_vec(
            IxDyn(&[1, n, 4]),
            (0..n * 4).map(|i| i as f32).collect(),
        )
        .unwrap();
        RawDetections { cid, score, bbox }
    }

    #[test]
    fn test_detection_arrays_have_equal_length() {
        let prediction = collect_detections(&raw(5), &[1, 3, 416, 416]).unwrap();

        assert_eq!(prediction.cid.len(), 5);
        assert_eq!(
            prediction.cid.len(),
            prediction.score.len(),
            "cid and score must have one entry per detection"
        );
        assert_eq!(
            prediction.cid.len(),
            prediction.bbox.len(),
            "cid and bbox must have one entry per detection"
        );
    }

    #[test]
    fn test_boxes_chunked_in_model_order() {
        let prediction = collect_detections(&raw(2), &[1, 3, 100, 100]).unwrap();

        assert_eq!(prediction.bbox[0], [0.0, 1.0, 2.0, 3.0]);
        assert_eq!(prediction.bbox[1], [4.0, 5.0, 6.0, 7.0]);
        assert_eq!(
            prediction.cid,
            vec![0.0, 1.0],
            "Model ranking order must be preserved"
        );
    }

    #[test]
    fn test_batch_dimension_dropped_from_shape() {
        let prediction = collect_detections(&raw(1), &[1, 3, 416, 624]).unwrap();
        assert_eq!(
            prediction.shape,
            vec![3, 416, 624],
            "Reported shape should be 3-element [C, H, W]"
        );
    }

    #[test]
    fn test_flat_rcnn_style_outputs() {
        // Torchvision-style outputs come without a batch axis: labels [N],
        // scores [N], boxes [N, 4].
        let raw = RawDetections {
            cid: Array::from_shape_vec(IxDyn(&[3]), vec![1.0, 17.0, 3.0]).unwrap(),
            score: Array::from_shape_vec(IxDyn(&[3]), vec![0.99, 0.8, 0.6]).unwrap(),
            bbox: Array::from_shape_vec(IxDyn(&[3, 4]), (0..12).map(|i| i as f32).collect())
                .unwrap(),
        };

        let prediction = collect_detections(&raw, &[1, 3, 137, 236]).unwrap();
        assert_eq!(prediction.cid, vec![1.0, 17.0, 3.0]);
        assert_eq!(prediction.bbox.len(), 3);
    }

    #[test]
    fn test_misshapen_boxes_rejected() {
        let raw = RawDetections {
            cid: Array::from_shape_vec(IxDyn(&[1]), vec![0.0]).unwrap(),
            score: Array::from_shape_vec(IxDyn(&[1]), vec![0.5]).unwrap(),
            bbox: Array::from_shape_vec(IxDyn(&[3]), vec![1.0, 2.0, 3.0]).unwrap(),
        };

        let result = collect_detections(&raw, &[1, 3, 10, 10]);
        assert!(result.is_err(), "Non-multiple-of-4 box tensor should fail");
    }

    #[test]
    fn test_count_mismatch_rejected() {
        let raw = RawDetections {
            cid: Array::from_shape_vec(IxDyn(&[2]), vec![0.0, 1.0]).unwrap(),
            score: Array::from_shape_vec(IxDyn(&[1]), vec![0.5]).unwrap(),
            bbox: Array::from_shape_vec(IxDyn(&[2, 4]), vec![0.0; 8]).unwrap(),
        };

        let result = collect_detections(&raw, &[1, 3, 10, 10]);
        assert!(
            result.is_err(),
            "Disagreeing detection array lengths should fail"
        );
    }
}
