mod models;
mod tracker;

pub use models::{Download, DownloadMap, DownloadState};
pub use tracker::{DownloadStateSource, DownloadTracker};
