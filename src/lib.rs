//! tzsort - organize photos and videos into date-based folders
//!
//! This library derives one canonical, timezone-attached timestamp per
//! media file from:
//! - EXIF metadata for images, with GPS-based timezone lookup
//! - FFprobe container metadata for videos
//! - File system modification time as the fallback
//!
//! and places each file at `<year>/<year>_<month>[/raw]/YYYYMMDD-HHMMSS[-NN].<ext>`
//! as a relative symlink or a timestamp-preserving copy, deduplicating
//! destination collisions by content comparison.

pub mod cli;
pub mod compare;
pub mod config;
pub mod dest;
pub mod error;
pub mod geo;
pub mod place;
pub mod process;
pub mod time;
pub mod tz;

pub use cli::Cli;
pub use config::{CmpMode, Config, MediaKind, PlaceMode};
pub use error::{Error, Result};
pub use process::{Processor, RunStats};
pub use tz::{TzMode, TzResolver};
