use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::RgbImage;
use ndarray::{Array, ArrayD, IxDyn};

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Fixed preprocessing transform applied between decoding and inference.
#[derive(Debug, Clone, Copy)]
pub enum Transform {
    /// Resize the shorter side to `short` (long side capped at `max_size`),
    /// then apply ImageNet normalization. Used by the YOLO-family handler.
    ShortSideResize { short: u32, max_size: u32 },
    /// Scale pixels into [0, 1] at native resolution; the R-CNN family
    /// normalizes inside the network.
    ToTensor,
}

pub struct PreProcessor {
    transform: Transform,
}

impl PreProcessor {
    pub fn new(transform: Transform) -> Self {
        Self { transform }
    }

    /// Produce the model-ready `[1, 3, H, W]` tensor for a decoded image.
    pub fn process(&self, image: &RgbImage) -> anyhow::Result<ArrayD<f32>> {
        match self.transform {
            Transform::ShortSideResize { short, max_size } => {
                let (new_width, new_height) = short_side_dimensions(
                    image.width(),
                    image.height(),
                    short,
                    max_size,
                );
                let resized = resize(image, new_width, new_height)?;
                normalize_imagenet(resized.buffer(), new_width as usize, new_height as usize)
            }
            Transform::ToTensor => scale_to_unit(
                image.as_raw(),
                image.width() as usize,
                image.height() as usize,
            ),
        }
    }
}

fn short_side_dimensions(width: u32, height: u32, short: u32, max_size: u32) -> (u32, u32) {
    let mut scale = short as f32 / width.min(height) as f32;
    if (scale * width.max(height) as f32).round() > max_size as f32 {
        scale = max_size as f32 / width.max(height) as f32;
    }

    let new_width = ((width as f32 * scale).round() as u32).max(1);
    let new_height = ((height as f32 * scale).round() as u32).max(1);
    (new_width, new_height)
}

fn resize(image: &RgbImage, new_width: u32, new_height: u32) -> anyhow::Result<Image<'static>> {
    let mut src_buffer = image.as_raw().clone();
    let src = Image::from_slice_u8(image.width(), image.height(), &mut src_buffer, PixelType::U8x3)?;

    let mut resized = Image::new(new_width, new_height, PixelType::U8x3);

    Resizer::new().resize(
        &src,
        &mut resized,
        &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
    )?;

    Ok(resized)
}

fn normalize_imagenet(buf: &[u8], width: usize, height: usize) -> anyhow::Result<ArrayD<f32>> {
    let spatial = width * height;
    let mut output = vec![0.0f32; 3 * spatial];

    for (i, px) in buf.chunks_exact(3).enumerate() {
        let r = px[0] as f32 / 255.0;
        let g = px[1] as f32 / 255.0;
        let b = px[2] as f32 / 255.0;

        output[i] = (r - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        output[i + spatial] = (g - IMAGENET_MEAN[1]) / IMAGENET_STD[1];
        output[i + 2 * spatial] = (b - IMAGENET_MEAN[2]) / IMAGENET_STD[2];
    }

    Ok(Array::from_shape_vec(
        IxDyn(&[1, 3, height, width]),
        output,
    )?)
}

fn scale_to_unit(buf: &[u8], width: usize, height: usize) -> anyhow::Result<ArrayD<f32>> {
    let spatial = width * height;
    let mut output = vec![0.0f32; 3 * spatial];

    for (i, px) in buf.chunks_exact(3).enumerate() {
        output[i] = px[0] as f32 / 255.0;
        output[i + spatial] = px[1] as f32 / 255.0;
        output[i + 2 * spatial] = px[2] as f32 / 255.0;
    }

    Ok(Array::from_shape_vec(
        IxDyn(&[1, 3, height, width]),
        output,
    )?)
}
