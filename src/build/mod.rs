// src/build/mod.rs

//! Build adapters and composite project recipes.
//!
//! - [`cmake`]: configure + compile + install in a fresh build directory,
//!   recording the source commit in a marker file.
//! - [`make`]: in-tree compile + install.
//! - [`recipe`]: per-project recipes composing the above with git.

pub mod cmake;
pub mod make;
pub mod recipe;

use chrono::{DateTime, TimeZone};

pub use cmake::{CMakeBuild, COMMIT_MARKER};
pub use make::MakeBuild;
pub use recipe::{Project, VendoredLib, THIRD_PARTY_DIR};

/// Build directory name for a cycle starting at `now`,
/// e.g. `build2024-05-01-13:07:42`.
pub fn build_dir_name<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("build{}", now.format("%Y-%m-%d-%H:%M:%S"))
}
