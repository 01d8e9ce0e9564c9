pub mod challenge;
pub mod engine;
pub mod stats;
