use anyhow::{anyhow, Result};
use image::{imageops::FilterType, Rgb, RgbImage};
use ndarray::{s, Array4, ArrayView2, ArrayViewD, Axis, Ix2, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Value;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

use crate::application::ports::DetectorPort;
use crate::domain::detection::{non_max_suppression, Detection};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::YoloParams;

/// Gray the detection library pads letterboxed inputs with.
const PAD_VALUE: u8 = 114;

pub struct OnnxYoloEngine {
    session: Mutex<Session>,
    class_names: Vec<String>,
}

/// Resized-and-padded model input plus the mapping back to source pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
}

impl Letterbox {
    pub fn fit(src_w: u32, src_h: u32, size: u32) -> Self {
        let scale = (size as f32 / src_w as f32).min(size as f32 / src_h as f32);
        let new_w = (src_w as f32 * scale).round();
        let new_h = (src_h as f32 * scale).round();
        Self { scale, pad_x: ((size as f32 - new_w) / 2.0).floor(), pad_y: ((size as f32 - new_h) / 2.0).floor() }
    }

    pub fn to_source(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

pub fn letterbox(rgb: &RgbImage, size: u32) -> (RgbImage, Letterbox) {
    let lb = Letterbox::fit(rgb.width(), rgb.height(), size);
    let new_w = ((rgb.width() as f32 * lb.scale).round() as u32).clamp(1, size);
    let new_h = ((rgb.height() as f32 * lb.scale).round() as u32).clamp(1, size);
    let resized = image::imageops::resize(rgb, new_w, new_h, FilterType::Triangle);

    let mut canvas = RgbImage::from_pixel(size, size, Rgb([PAD_VALUE; 3]));
    image::imageops::replace(&mut canvas, &resized, lb.pad_x as i64, lb.pad_y as i64);
    (canvas, lb)
}

impl OnnxYoloEngine {
    pub fn load(path: &Path, class_names: Vec<String>) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(4)?;

        // CUDA is optional: registered when available, CPU otherwise.
        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let model_bytes = fs::read(path)?;
        let session = builder.commit_from_memory(&model_bytes)?;
        info!("Loaded detector {} ({} classes)", path.display(), class_names.len());

        Ok(Self { session: Mutex::new(session), class_names })
    }

    pub fn infer(&self, rgb: &RgbImage, params: &YoloParams) -> Result<Vec<Detection>> {
        let imgsz = params.input_size as usize;
        let (input_img, lb) = letterbox(rgb, params.input_size);

        let mut input = Array4::<f32>::zeros((1, 3, imgsz, imgsz));
        for (x, y, pixel) in input_img.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        let input_shape = vec![1, 3, imgsz as i64, imgsz as i64];
        let input_tensor = Value::from_array((input_shape, input.into_raw_vec_and_offset().0))?;

        let mut session = self.session.lock().map_err(|_| anyhow!("detector session lock poisoned"))?;
        let outputs = session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape_out.iter().map(|&x| x as usize).collect();
        if dims.len() != 3 || dims[1] < 5 {
            return Err(anyhow!("unexpected detector output shape {:?}", dims));
        }
        let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;
        // [4 + nc, candidates]
        let view = array_view.index_axis(Axis(0), 0).into_dimensionality::<Ix2>()?;

        Ok(decode(view, &lb, rgb.dimensions(), params, &self.class_names))
    }
}

fn label_for(names: &[String], class_id: usize) -> String {
    names.get(class_id).cloned().unwrap_or_else(|| format!("class{class_id}"))
}

/// Turns one `[4 + nc, N]` output slice into source-pixel detections:
/// best class per candidate, strict confidence cut, NMS, then the cap.
pub fn decode(
    view: ArrayView2<f32>,
    lb: &Letterbox,
    src: (u32, u32),
    params: &YoloParams,
    names: &[String],
) -> Vec<Detection> {
    let (src_w, src_h) = (src.0 as f32, src.1 as f32);

    let mut detections = Vec::new();
    for i in 0..view.shape()[1] {
        let scores = view.slice(s![4.., i]);
        let Some((class_id, &max_score)) = scores
            .indexed_iter()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
        else {
            continue;
        };

        if max_score > params.conf_threshold {
            let cx = view[[0, i]];
            let cy = view[[1, i]];
            let w = view[[2, i]];
            let h = view[[3, i]];

            let (x1, y1) = lb.to_source(cx - w / 2.0, cy - h / 2.0);
            let (x2, y2) = lb.to_source(cx + w / 2.0, cy + h / 2.0);
            detections.push(Detection {
                x1: x1.clamp(0.0, src_w),
                y1: y1.clamp(0.0, src_h),
                x2: x2.clamp(0.0, src_w),
                y2: y2.clamp(0.0, src_h),
                score: max_score,
                class_id,
                label: label_for(names, class_id),
            });
        }
    }

    detections.sort_unstable_by(|a, b| b.score.total_cmp(&a.score));
    let kept = non_max_suppression(detections, params.iou_threshold);
    kept.into_iter().take(params.max_detections).collect()
}

impl DetectorPort for OnnxYoloEngine {
    fn detect(&self, image: &RgbImage, params: &YoloParams) -> DomainResult<Vec<Detection>> {
        self.infer(image, params)
            .map_err(|e| DomainError::InferenceFailed(e.to_string()))
    }
}
