pub mod absolute;
pub mod relative;
