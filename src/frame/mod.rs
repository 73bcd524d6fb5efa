//! Per-frame graph construction and frame pacing.
//!
//! Higher layers declare render passes against a [`Builder`] each frame;
//! [`Builder::build`] synthesizes the barriers those declarations imply and
//! yields a [`FrameGraph`] that records the whole frame into one command
//! buffer. The [`FramePacer`] drives this against the swapchain with a
//! bounded number of frames in flight.

mod graph;
mod pacer;
mod pass;
mod resource;

pub use self::graph::{Builder, FrameGraph};
pub use self::pacer::{CurrentFrame, FramePacer, PacerSettings};
pub use self::pass::{Attachment, RenderPass};
pub use self::resource::{BufferAccess, BufferId, ImageAccess, ImageId};
