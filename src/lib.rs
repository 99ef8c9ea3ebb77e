//! Stock screener tables: rendering to HTML, in-place header-click sorting,
//! category filtering, column hiding and alert acknowledgment.

pub mod alerts;
pub mod config;
pub mod error;
pub mod fileio;
pub mod format;
pub mod html;
pub mod table;

pub use error::Error;
