pub mod score;
pub mod story;
