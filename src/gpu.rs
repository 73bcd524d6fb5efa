//! The GPU context surface the frame core depends on.
//!
//! The pacer and the frame graph never talk to `ash` directly; they go
//! through these two traits. [`Context`](crate::context::Context) implements
//! both against a real device, and the test suites implement them against
//! plain counters, so every pacing and barrier decision is observable
//! without a GPU.
//!
//! All queues are assumed to come from one family; submission happens on the
//! graphics queue only.

use ash::vk;

use crate::error::Result;

/// Outcome of a successful swapchain acquire.
#[derive(Copy, Clone, Debug)]
pub struct AcquiredImage {
    pub index: u32,
    /// The swapchain still works but no longer matches the surface
    /// perfectly. Treated as success.
    pub suboptimal: bool,
}

/// One frame's submission on the graphics queue.
#[derive(Copy, Clone, Debug)]
pub struct FrameSubmission {
    pub command_buffer: vk::CommandBuffer,
    pub wait_semaphore: vk::Semaphore,
    pub wait_stage: vk::PipelineStageFlags2,
    pub signal_semaphore: vk::Semaphore,
    pub signal_stage: vk::PipelineStageFlags2,
    pub fence: vk::Fence,
}

/// Command recording operations used by
/// [`FrameGraph::execute`](crate::frame::FrameGraph::execute):
/// synchronization2 barriers and dynamic rendering.
pub trait CommandEncoder {
    fn pipeline_barrier(&self, command_buffer: vk::CommandBuffer, dependency: &vk::DependencyInfo);
    fn begin_rendering(&self, command_buffer: vk::CommandBuffer, rendering_info: &vk::RenderingInfo);
    fn end_rendering(&self, command_buffer: vk::CommandBuffer);
}

/// Everything the frame pacer needs from the GPU: sync objects, command
/// recording plumbing, the swapchain, and queue submission.
///
/// Fallible operations are split by recoverability. `acquire_next_image`
/// and `present` return `Err(Error::SwapchainOutOfDate)` when the swapchain
/// went stale; implementations treat every other device error as fatal.
pub trait GpuContext: CommandEncoder {
    fn create_semaphore(&self) -> vk::Semaphore;
    fn destroy_semaphore(&self, semaphore: vk::Semaphore);
    fn create_signaled_fence(&self) -> vk::Fence;
    fn destroy_fence(&self, fence: vk::Fence);
    /// Blocks until the fence is signalled. Unbounded.
    fn wait_for_fence(&self, fence: vk::Fence);
    fn reset_fence(&self, fence: vk::Fence);

    /// Command pool allowing per-buffer reset, on the graphics family.
    fn create_command_pool(&self) -> vk::CommandPool;
    fn destroy_command_pool(&self, pool: vk::CommandPool);
    fn allocate_primary_command_buffer(&self, pool: vk::CommandPool) -> vk::CommandBuffer;
    fn reset_command_buffer(&self, command_buffer: vk::CommandBuffer);
    fn begin_one_time_submit(&self, command_buffer: vk::CommandBuffer);
    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer);

    fn swapchain_image_count(&self) -> u32;
    fn swapchain_extent(&self) -> vk::Extent2D;
    fn swapchain_format(&self) -> vk::Format;
    fn swapchain_image(&self, index: u32) -> vk::Image;
    fn swapchain_image_view(&self, index: u32) -> vk::ImageView;

    fn acquire_next_image(&mut self, signal: vk::Semaphore) -> Result<AcquiredImage>;
    /// Recreates the swapchain for the new extent. The caller is
    /// responsible for idling the device first.
    fn recreate_swapchain(&mut self, width: u32, height: u32);

    fn submit_frame(&self, submission: &FrameSubmission);
    fn present(&self, wait: vk::Semaphore, image_index: u32) -> Result<()>;

    fn wait_idle(&self);
}
