#![forbid(unsafe_code)]

pub mod curriculum;
pub mod error;
pub mod model;
pub mod progress;
pub mod registry;
pub mod scoring;
pub mod session;
pub mod settings;
pub mod time;

pub use error::Error;
pub use time::Clock;
