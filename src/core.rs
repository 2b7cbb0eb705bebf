pub mod dataset;
pub mod merge;
pub mod quality;
pub mod record;
