//! Frame pacing.
//!
//! The [`FramePacer`] drives the frame graph across frames with bounded
//! pipelining: `frames_in_flight` ring-buffered slots, each with its own
//! command pool, acquire semaphore and fence, plus one present semaphore
//! per swapchain image. One thread owns the pacer; submissions reach the
//! graphics queue in frame order.

use ash::vk;
use log::{debug, info, trace};

use super::graph::{Builder, FrameGraph};
use super::resource::ImageId;
use crate::error::Error;
use crate::gpu::{FrameSubmission, GpuContext};

/// Pacer configuration.
#[derive(Copy, Clone, Debug)]
pub struct PacerSettings {
    /// How many frames the CPU may queue to the GPU before waiting.
    pub frames_in_flight: u32,
}

impl Default for PacerSettings {
    fn default() -> PacerSettings {
        PacerSettings { frames_in_flight: 3 }
    }
}

/// What [`FramePacer::begin`] hands to the caller: a fresh builder with the
/// acquired swapchain image already imported, and enough information to
/// declare passes against it.
pub struct CurrentFrame {
    pub builder: Builder,
    pub swapchain_image: ImageId,
    pub extent: vk::Extent2D,
    pub format: vk::Format,
}

/// One in-flight slot. The fence guards reuse of the command buffer; the
/// semaphore links acquire to the frame's submission.
struct FrameSlot {
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    acquire_semaphore: vk::Semaphore,
    in_flight_fence: vk::Fence,
    swapchain_image_index: u32,
}

pub struct FramePacer<C: GpuContext> {
    context: C,
    slots: Vec<FrameSlot>,
    /// Indexed by swapchain image, not by slot: an acquire semaphore must
    /// not be reused for presentation while another frame using the same
    /// image may still be in flight.
    present_semaphores: Vec<vk::Semaphore>,
    frame_index: usize,
}

impl<C: GpuContext> FramePacer<C> {
    pub fn new(context: C, settings: &PacerSettings) -> FramePacer<C> {
        assert!(settings.frames_in_flight >= 1, "need at least one frame in flight");

        let slots = (0..settings.frames_in_flight)
            .map(|_| {
                let command_pool = context.create_command_pool();
                FrameSlot {
                    command_pool,
                    command_buffer: context.allocate_primary_command_buffer(command_pool),
                    acquire_semaphore: context.create_semaphore(),
                    in_flight_fence: context.create_signaled_fence(),
                    swapchain_image_index: 0,
                }
            })
            .collect::<Vec<_>>();

        let present_semaphores = (0..context.swapchain_image_count())
            .map(|_| context.create_semaphore())
            .collect::<Vec<_>>();

        info!(
            "frame pacer: {} frames in flight, {} swapchain images",
            slots.len(),
            present_semaphores.len()
        );

        FramePacer {
            context,
            slots,
            present_semaphores,
            frame_index: 0,
        }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn frames_in_flight(&self) -> u32 {
        self.slots.len() as u32
    }

    /// The ring slot the next `begin` will use.
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Starts a frame: waits for the slot's previous submission to retire,
    /// acquires a swapchain image, and returns a fresh builder with that
    /// image imported. The import declares `UNDEFINED` as the current
    /// layout, since swapchain contents are not preserved across presents,
    /// and `PRESENT_SRC_KHR` as the final layout.
    ///
    /// Returns `None` when the swapchain is out of date; call
    /// [`on_resize`](Self::on_resize) before the next frame. The slot's
    /// fence is only reset after a successful acquire, so a failed frame
    /// can be retried without deadlocking on its own fence.
    pub fn begin(&mut self) -> Option<CurrentFrame> {
        let fence = self.slots[self.frame_index].in_flight_fence;
        let acquire_semaphore = self.slots[self.frame_index].acquire_semaphore;

        self.context.wait_for_fence(fence);

        let acquired = match self.context.acquire_next_image(acquire_semaphore) {
            Ok(acquired) => acquired,
            Err(Error::SwapchainOutOfDate) => return None,
            Err(err) => unreachable!("acquire reported a non-swapchain error: {}", err),
        };
        if acquired.suboptimal {
            trace!("swapchain is suboptimal, continuing");
        }

        self.context.reset_fence(fence);
        self.slots[self.frame_index].swapchain_image_index = acquired.index;

        let mut builder = Builder::new();
        let swapchain_image = builder
            .import_image(
                self.context.swapchain_image(acquired.index),
                self.context.swapchain_image_view(acquired.index),
                self.context.swapchain_extent(),
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::PRESENT_SRC_KHR,
            )
            .expect("fresh builder rejected the swapchain image import");

        Some(CurrentFrame {
            builder,
            swapchain_image,
            extent: self.context.swapchain_extent(),
            format: self.context.swapchain_format(),
        })
    }

    /// Finishes a frame: records the graph into the slot's command buffer,
    /// submits it (waiting on the acquire semaphore at color-attachment
    /// output, signalling the image's present semaphore and the slot's
    /// fence), and presents.
    ///
    /// Returns `false` when presentation found the swapchain out of date;
    /// the frame index does not advance and the caller must resize.
    pub fn end(&mut self, graph: FrameGraph) -> bool {
        let slot = &self.slots[self.frame_index];
        let command_buffer = slot.command_buffer;
        let acquire_semaphore = slot.acquire_semaphore;
        let in_flight_fence = slot.in_flight_fence;
        let image_index = slot.swapchain_image_index;
        let present_semaphore = self.present_semaphores[image_index as usize];

        self.context.reset_command_buffer(command_buffer);
        self.context.begin_one_time_submit(command_buffer);
        graph.execute(&self.context, command_buffer);
        self.context.end_command_buffer(command_buffer);

        self.context.submit_frame(&FrameSubmission {
            command_buffer,
            wait_semaphore: acquire_semaphore,
            wait_stage: vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
            signal_semaphore: present_semaphore,
            signal_stage: vk::PipelineStageFlags2::ALL_COMMANDS,
            fence: in_flight_fence,
        });

        match self.context.present(present_semaphore, image_index) {
            Ok(()) => {}
            Err(_) => return false,
        }

        self.frame_index = (self.frame_index + 1) % self.slots.len();
        true
    }

    /// Recreates the swapchain for a new surface extent and reallocates the
    /// present semaphores to match the new image count. Blocks on device
    /// idle. The frame index is preserved.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        debug!("resizing swapchain to {}x{}", width, height);
        self.context.wait_idle();
        self.context.recreate_swapchain(width, height);

        for semaphore in self.present_semaphores.drain(..) {
            self.context.destroy_semaphore(semaphore);
        }
        self.present_semaphores = (0..self.context.swapchain_image_count())
            .map(|_| self.context.create_semaphore())
            .collect();
    }
}

impl<C: GpuContext> Drop for FramePacer<C> {
    fn drop(&mut self) {
        self.context.wait_idle();
        for semaphore in self.present_semaphores.drain(..) {
            self.context.destroy_semaphore(semaphore);
        }
        for slot in self.slots.drain(..) {
            self.context.destroy_fence(slot.in_flight_fence);
            self.context.destroy_semaphore(slot.acquire_semaphore);
            self.context.destroy_command_pool(slot.command_pool);
        }
    }
}
