use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::{prelude::BASE64_STANDARD, Engine};
use http_body_util::BodyExt;
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

use flower_lens::adapters::http::{router, state::HttpState};
use flower_lens::adapters::render::annotator::BoxAnnotator;
use flower_lens::application::ports::DetectorPort;
use flower_lens::application::services::{InferenceService, MODEL_MISSING_MESSAGE};
use flower_lens::domain::{
    detection::Detection,
    errors::{DomainError, DomainResult},
    labels::LabelTable,
    model::YoloParams,
    report::NOTHING_DETECTED_WARNING,
};

const BOUNDARY: &str = "flowerlensboundary";

/// Returns canned detections; fails the first `fail_first` calls.
struct FakeDetector {
    detections: Vec<Detection>,
    calls: AtomicUsize,
    fail_first: usize,
}

impl FakeDetector {
    fn new(detections: Vec<Detection>) -> Self {
        Self { detections, calls: AtomicUsize::new(0), fail_first: 0 }
    }
}

impl DetectorPort for FakeDetector {
    fn detect(&self, _image: &RgbImage, _params: &YoloParams) -> DomainResult<Vec<Detection>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_first {
            return Err(DomainError::InferenceFailed("tensor shape mismatch".into()));
        }
        Ok(self.detections.clone())
    }
}

fn shared(d: &Arc<FakeDetector>) -> Option<Arc<dyn DetectorPort>> {
    Some(d.clone())
}

fn det(label: &str, class_id: usize, score: f32) -> Detection {
    Detection { x1: 4.0, y1: 4.0, x2: 20.0, y2: 18.0, score, class_id, label: label.into() }
}

fn app(detector: Option<Arc<dyn DetectorPort>>) -> Router {
    let inference = InferenceService::new(
        detector,
        Arc::new(BoxAnnotator::new(None)),
        LabelTable::taiwan_flowers(),
        YoloParams::default(),
    );
    router(HttpState::new(Arc::new(inference), None))
}

fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

fn upload_request(bytes: &[u8], filename: &str) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

fn analyze_request() -> Request<Body> {
    Request::builder().method("POST").uri("/api/analyze").body(Body::empty()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn decode_data_url(url: &str) -> RgbImage {
    let b64 = url.strip_prefix("data:image/png;base64,").expect("png data url");
    let bytes = BASE64_STANDARD.decode(b64).unwrap();
    image::load_from_memory(&bytes).unwrap().to_rgb8()
}

fn sample_image() -> RgbImage {
    RgbImage::from_fn(37, 23, |x, y| Rgb([(x * 6) as u8, (y * 10) as u8, 90]))
}

#[tokio::test]
async fn upload_preserves_dimensions_for_jpeg_and_png() {
    let app = app(None);
    let img = sample_image();
    for (format, name) in [(ImageFormat::Jpeg, "a.jpg"), (ImageFormat::Png, "a.png")] {
        let (status, body) = send(&app, upload_request(&encode(&img, format), name)).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["width"], 37);
        assert_eq!(body["height"], 23);
        assert_eq!(body["phase"], "image_received");
        let preview = decode_data_url(body["preview"].as_str().unwrap());
        assert_eq!(preview.dimensions(), (37, 23));
    }
}

#[tokio::test]
async fn unsupported_upload_is_rejected() {
    let app = app(None);
    let (status, body) = send(&app, upload_request(b"GIF89a\x01\x00\x01\x00", "x.gif")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("發生錯誤"));
}

#[tokio::test]
async fn missing_model_never_runs_detection() {
    let app = app(None);
    let (_, status) = send(&app, Request::get("/api/status").body(Body::empty()).unwrap()).await;
    assert_eq!(status["model_loaded"], false);
    assert_eq!(status["model_error"], MODEL_MISSING_MESSAGE);

    send(&app, upload_request(&encode(&sample_image(), ImageFormat::Png), "a.png")).await;
    let (code, body) = send(&app, analyze_request()).await;
    assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
    let obj = body.as_object().unwrap();
    assert_eq!(obj.len(), 1);
    assert!(obj["error"].as_str().unwrap().contains(MODEL_MISSING_MESSAGE));

    // The page still shows the uploaded image, nothing was analyzed.
    let (_, status) = send(&app, Request::get("/api/status").body(Body::empty()).unwrap()).await;
    assert_eq!(status["phase"], "image_received");
}

#[tokio::test]
async fn analyze_before_upload_is_a_conflict() {
    let detector = Arc::new(FakeDetector::new(vec![]));
    let app = app(shared(&detector));
    let (code, _) = send(&app, analyze_request()).await;
    assert_eq!(code, StatusCode::CONFLICT);
    assert_eq!(detector.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn bidens_detection_is_reported_with_translated_name() {
    let detector = Arc::new(FakeDetector::new(vec![det("Bidens", 0, 0.83), det("Lantana", 3, 0.31)]));
    let app = app(shared(&detector));

    send(&app, upload_request(&encode(&sample_image(), ImageFormat::Png), "bidens.png")).await;
    let (code, body) = send(&app, analyze_request()).await;
    assert_eq!(code, StatusCode::OK, "{body}");

    let report = &body["report"];
    assert_eq!(report["kind"], "detected");
    let lines = report["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 1, "below-threshold detection must be dropped");
    let text = lines[0]["text"].as_str().unwrap();
    assert!(text.contains("鬼針草(大花咸豐草)"));
    assert!(text.contains("(Bidens)"));
    assert!(text.contains("0.83"));
    assert_eq!(lines[0]["confidence"], "0.83");

    let annotated = decode_data_url(body["annotated"].as_str().unwrap());
    assert_eq!(annotated.dimensions(), (37, 23));
    assert_ne!(annotated, sample_image());
    assert_eq!(detector.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn every_detection_gets_a_two_decimal_line() {
    let detector = Arc::new(FakeDetector::new(vec![
        det("Periwinkle", 2, 0.51),
        det("Hibiscus", 7, 0.999),
        det("Lantana", 3, 0.5),
        det("Frangipani", 1, 0.777),
    ]));
    let app = app(shared(&detector));
    send(&app, upload_request(&encode(&sample_image(), ImageFormat::Png), "a.png")).await;
    let (_, body) = send(&app, analyze_request()).await;

    let lines = body["report"]["lines"].as_array().unwrap();
    // a score sitting exactly on the threshold is not reported
    assert_eq!(lines.len(), 3);
    let confs: Vec<&str> = lines.iter().map(|l| l["confidence"].as_str().unwrap()).collect();
    assert_eq!(confs, vec!["1.00", "0.78", "0.51"]);
    for c in confs {
        let (_, frac) = c.split_once('.').unwrap();
        assert_eq!(frac.len(), 2);
        let v: f32 = c.parse().unwrap();
        assert!((0.0..=1.0).contains(&v));
    }
    // unknown label shown untouched
    assert_eq!(lines[0]["display_name"], "Hibiscus");
}

#[tokio::test]
async fn blank_image_yields_single_warning_and_untouched_picture() {
    let app = app(shared(&Arc::new(FakeDetector::new(vec![]))));
    let blank = RgbImage::from_pixel(30, 20, Rgb([255, 255, 255]));
    send(&app, upload_request(&encode(&blank, ImageFormat::Png), "blank.png")).await;
    let (code, body) = send(&app, analyze_request()).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["report"]["kind"], "nothing_detected");
    assert_eq!(body["report"]["warning"], NOTHING_DETECTED_WARNING);
    assert!(body["report"].get("lines").is_none());
    assert_eq!(decode_data_url(body["annotated"].as_str().unwrap()), blank);
}

#[tokio::test]
async fn detector_failure_is_reported_and_service_recovers() {
    let detector = Arc::new(FakeDetector {
        detections: vec![det("Bidens", 0, 0.9)],
        calls: AtomicUsize::new(0),
        fail_first: 1,
    });
    let app = app(shared(&detector));
    send(&app, upload_request(&encode(&sample_image(), ImageFormat::Png), "a.png")).await;

    let (code, body) = send(&app, analyze_request()).await;
    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("tensor shape mismatch"));
    let (_, status) = send(&app, Request::get("/api/status").body(Body::empty()).unwrap()).await;
    assert_eq!(status["phase"], "errored");

    let (code, body) = send(&app, analyze_request()).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["report"]["lines"].as_array().unwrap().len(), 1);
    let (_, status) = send(&app, Request::get("/api/status").body(Body::empty()).unwrap()).await;
    assert_eq!(status["phase"], "report_rendered");
}
