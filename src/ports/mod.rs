pub mod slack;
pub mod spotify;
