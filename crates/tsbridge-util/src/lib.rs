#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod fs;

pub use fs::{find_declaration_files, read_to_string_lossy};
