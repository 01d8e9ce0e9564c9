pub mod blink;
pub mod capture;
pub mod ear;
pub mod error;
pub mod gate;
pub mod landmarks;
