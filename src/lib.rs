#![forbid(unsafe_code)]

pub mod api;
pub mod app;
pub mod cli;
pub mod error;
pub mod export;
pub mod formats;
pub mod gemini;
pub mod generate;
pub mod logging;
pub mod research;
pub mod saved;
pub mod seo;
pub mod settings;
pub mod thumbnail;
