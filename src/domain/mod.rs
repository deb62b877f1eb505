pub mod dataset;
pub mod detection;
pub mod errors;
pub mod labels;
pub mod model;
pub mod report;
pub mod session;
pub mod training;
