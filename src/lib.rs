pub mod audio;
pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod recognize;
pub mod upload;
