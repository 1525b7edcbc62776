//! Error type for everything outside the per-frame core
//!
//! The rasterizer itself never fails: bad triangles are filtered and
//! allocation failure aborts. Errors only come from loading and saving.

pub type Result<T> = std::result::Result<T, SoftpipeError>;

#[derive(thiserror::Error, Debug)]
pub enum SoftpipeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("serialize error: {0}")]
    Serialize(#[from] ron::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid config: {0}")]
    Config(String),
}

impl SoftpipeError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
