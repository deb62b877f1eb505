//! Roadside flower detector: a training runner that drives the Ultralytics
//! CLI and a web page that runs the exported ONNX model on uploaded photos.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
