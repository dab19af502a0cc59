//! epd-cli library
//!
//! Talks to an epdiy display running the HTTP server demo.

pub mod client;
pub mod draw;
pub mod error;

pub use client::{DisplayClient, DisplayInfo, DrawRequest};
pub use draw::{Frame, prepare_frame};
pub use error::ClientError;
