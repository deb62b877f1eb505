use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::info;

use crate::application::ports::{AnnotatorPort, ChannelOrder};
use crate::domain::detection::Detection;

const LABEL_FONT_SIZE: f32 = 20.0;
const LABEL_PADDING: u32 = 2;
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// First entries of the detection library's plotting palette, RGB.
const PALETTE: [[u8; 3]; 8] = [
    [255, 56, 56],
    [255, 157, 151],
    [255, 112, 31],
    [255, 178, 29],
    [207, 210, 49],
    [72, 249, 10],
    [146, 204, 23],
    [61, 219, 134],
];

/// Draws boxes (and labels when a font is configured) in RGB order.
pub struct BoxAnnotator {
    font: Option<FontVec>,
    line_width: u32,
}

impl BoxAnnotator {
    pub fn new(font: Option<FontVec>) -> Self {
        Self { font, line_width: 3 }
    }

    pub fn with_font_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
        let font = FontVec::try_from_vec(bytes).context("invalid font file")?;
        info!("Label font loaded from {}", path.display());
        Ok(Self::new(Some(font)))
    }

    fn color(class_id: usize) -> Rgb<u8> {
        Rgb(PALETTE[class_id % PALETTE.len()])
    }

    fn draw_one(&self, image: &mut RgbImage, det: &Detection) {
        let (w, h) = (image.width() as i32, image.height() as i32);
        let x1 = (det.x1.floor() as i32).clamp(0, w - 1);
        let y1 = (det.y1.floor() as i32).clamp(0, h - 1);
        let x2 = (det.x2.ceil() as i32).clamp(0, w - 1);
        let y2 = (det.y2.ceil() as i32).clamp(0, h - 1);
        if x1 >= x2 || y1 >= y2 {
            return;
        }

        let color = Self::color(det.class_id);
        for t in 0..self.line_width as i32 {
            let bw = x2 - x1 - 2 * t;
            let bh = y2 - y1 - 2 * t;
            if bw <= 0 || bh <= 0 {
                break;
            }
            draw_hollow_rect_mut(image, Rect::at(x1 + t, y1 + t).of_size(bw as u32, bh as u32), color);
        }

        let Some(font) = self.font.as_ref() else { return };
        let label = format!("{} {:.2}", det.label, det.score);
        let scale = PxScale::from(LABEL_FONT_SIZE);
        let (tw, th) = text_size(scale, font, &label);
        let box_w = tw + 2 * LABEL_PADDING;
        let box_h = th + 2 * LABEL_PADDING;

        // Above the box when there is room, inside it otherwise.
        let ly = if y1 >= box_h as i32 { y1 - box_h as i32 } else { y1 };
        let bw = box_w.min((w - x1) as u32);
        if bw == 0 {
            return;
        }
        draw_filled_rect_mut(image, Rect::at(x1, ly).of_size(bw, box_h), color);
        draw_text_mut(
            image,
            TEXT_COLOR,
            x1 + LABEL_PADDING as i32,
            ly + LABEL_PADDING as i32,
            scale,
            font,
            &label,
        );
    }
}

impl AnnotatorPort for BoxAnnotator {
    fn channel_order(&self) -> ChannelOrder {
        ChannelOrder::Rgb
    }

    fn annotate(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage {
        let mut out = image.clone();
        for det in detections {
            self.draw_one(&mut out, det);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x1: f32, y1: f32, x2: f32, y2: f32) -> Detection {
        Detection { x1, y1, x2, y2, score: 0.9, class_id: 0, label: "Bidens".into() }
    }

    #[test]
    fn no_detections_leaves_image_identical() {
        let img = RgbImage::from_pixel(32, 24, Rgb([12, 34, 56]));
        let out = BoxAnnotator::new(None).annotate(&img, &[]);
        assert_eq!(out, img);
    }

    #[test]
    fn box_edges_are_painted_and_dimensions_kept() {
        let img = RgbImage::from_pixel(40, 40, Rgb([0, 0, 0]));
        let out = BoxAnnotator::new(None).annotate(&img, &[det(5.0, 5.0, 30.0, 30.0)]);
        assert_eq!(out.dimensions(), (40, 40));
        assert_eq!(out.get_pixel(5, 10), &Rgb(PALETTE[0]));
        assert_eq!(out.get_pixel(20, 20), &Rgb([0, 0, 0]));
    }

    #[test]
    fn degenerate_box_is_skipped() {
        let img = RgbImage::from_pixel(10, 10, Rgb([1, 2, 3]));
        let out = BoxAnnotator::new(None).annotate(&img, &[det(5.0, 5.0, 5.0, 9.0)]);
        assert_eq!(out, img);
    }
}
