pub mod alignment;
pub mod duration;
pub mod insulin;
pub mod similarity;
pub mod stats;
pub mod trend;
