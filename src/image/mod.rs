//! Image upload module.

mod types;

pub use types::{ImageFormat, ImageUpload};
