pub mod cache;
pub mod planner;
pub mod segmenter;
pub mod types;
