//! Error type.
//!
//! This is the shared error type for the whole crate. Only swapchain
//! staleness is recoverable: the pacer surfaces it as a negative status and
//! the caller resizes. Everything else is either a build-time programmer
//! error (bad pass declaration) or a wrapped startup failure.

use ash::vk;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The swapchain no longer matches the surface; recreate it through
    /// `FramePacer::on_resize` before the next frame.
    #[error("swapchain is out of date")]
    SwapchainOutOfDate,

    /// The same image, or the same buffer range, was imported into one
    /// frame twice.
    #[error("resource already imported into this frame")]
    DuplicateImport,

    /// A render pass was declared without an execute callback.
    #[error("render pass `{0}` has no execute callback")]
    MissingExecute(String),

    /// A render pass references a resource it may not, or in a way it
    /// may not.
    #[error("render pass `{pass}`: {reason}")]
    InvalidAccess { pass: String, reason: String },

    #[error("vulkan call failed: {0}")]
    Vulkan(#[from] vk::Result),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
