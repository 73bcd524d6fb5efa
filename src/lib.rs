//! kiln, a small real-time rendering engine on Vulkan.
//!
//! The interesting part lives in [`frame`]: a per-frame graph that takes a
//! list of render passes declared by higher layers, computes the image and
//! buffer memory barriers required for correctness, and sequences execution
//! against the swapchain with a bounded number of frames in flight.
//!
//! A frame looks like this:
//!
//! ```no_run
//! # use kiln::{Attachment, Context, FramePacer};
//! # fn demo(pacer: &mut FramePacer<Context>) {
//! if let Some(mut frame) = pacer.begin() {
//!     frame
//!         .builder
//!         .add_render_pass("clear")
//!         .set_color_attachment(Attachment::clear_color(
//!             frame.swapchain_image,
//!             [0.0, 0.0, 0.0, 1.0],
//!         ))
//!         .execute(|_cmd| {});
//!     let graph = frame.builder.build().expect("invalid frame graph");
//!     if !pacer.end(graph) {
//!         // swapchain went stale; resize and try again next frame
//!     }
//! }
//! # }
//! ```
//!
//! Passes execute in declared order on a single graphics queue. The graph
//! does not own any of the images or buffers imported into it; it only
//! records the state they must be in.

pub mod barrier;
pub mod cmd;
pub mod context;
pub mod error;
pub mod frame;
pub mod gpu;
pub mod settings;
pub mod sync;

pub use crate::barrier::BarrierMerger;
pub use crate::context::Context;
pub use crate::error::{Error, Result};
pub use crate::frame::{
    Attachment, Builder, BufferAccess, BufferId, CurrentFrame, FrameGraph, FramePacer,
    ImageAccess, ImageId, PacerSettings, RenderPass,
};
pub use crate::gpu::{AcquiredImage, CommandEncoder, FrameSubmission, GpuContext};
pub use crate::settings::{ContextSettings, Settings};
