pub mod config;
pub mod error;
pub mod excursion;
pub mod report;
pub mod sample;
pub mod shape_metric;
