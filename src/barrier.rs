//! Barrier accumulation.
//!
//! A [`BarrierMerger`] collects image and buffer state transitions and
//! flushes them to a command buffer as a single `vkCmdPipelineBarrier2`
//! call. Consecutive image transitions that agree on every field collapse
//! into one record; no other reordering is attempted.

use ash::vk;
use smallvec::SmallVec;

use crate::gpu::CommandEncoder;

/// Image aspect to use for a transition into `layout`.
///
/// Color for color-attachment layouts, depth|stencil for combined
/// depth-stencil layouts, depth or stencil alone for the single-aspect
/// layouts, none for `UNDEFINED`, color otherwise.
pub fn aspect_mask_for_layout(layout: vk::ImageLayout) -> vk::ImageAspectFlags {
    match layout {
        vk::ImageLayout::UNDEFINED => vk::ImageAspectFlags::NONE,
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL => vk::ImageAspectFlags::COLOR,
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
        | vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL
        | vk::ImageLayout::DEPTH_READ_ONLY_STENCIL_ATTACHMENT_OPTIMAL
        | vk::ImageLayout::DEPTH_ATTACHMENT_STENCIL_READ_ONLY_OPTIMAL => {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        }
        vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL | vk::ImageLayout::DEPTH_READ_ONLY_OPTIMAL => {
            vk::ImageAspectFlags::DEPTH
        }
        vk::ImageLayout::STENCIL_ATTACHMENT_OPTIMAL
        | vk::ImageLayout::STENCIL_READ_ONLY_OPTIMAL => vk::ImageAspectFlags::STENCIL,
        _ => vk::ImageAspectFlags::COLOR,
    }
}

/// Accumulates image and buffer barriers, emits them as one pipeline
/// barrier.
///
/// Pure accumulator: it does not check that the transitions it is handed
/// make sense. Feeding it a `new_layout` of `UNDEFINED` is the caller's
/// bug.
#[derive(Default)]
pub struct BarrierMerger {
    image_barriers: SmallVec<[vk::ImageMemoryBarrier2; 4]>,
    buffer_barriers: SmallVec<[vk::BufferMemoryBarrier2; 4]>,
}

impl BarrierMerger {
    pub fn new() -> BarrierMerger {
        BarrierMerger::default()
    }

    pub fn is_empty(&self) -> bool {
        self.image_barriers.is_empty() && self.buffer_barriers.is_empty()
    }

    pub fn image_barriers(&self) -> &[vk::ImageMemoryBarrier2] {
        &self.image_barriers
    }

    pub fn buffer_barriers(&self) -> &[vk::BufferMemoryBarrier2] {
        &self.buffer_barriers
    }

    pub fn clear(&mut self) {
        self.image_barriers.clear();
        self.buffer_barriers.clear();
    }

    /// Appends an image layout transition. The aspect mask is inferred from
    /// `new_layout`; the transition covers all mip levels and all layers.
    pub fn transition_image(
        &mut self,
        image: vk::Image,
        old_layout: vk::ImageLayout,
        new_layout: vk::ImageLayout,
        src_stage: vk::PipelineStageFlags2,
        src_access: vk::AccessFlags2,
        dst_stage: vk::PipelineStageFlags2,
        dst_access: vk::AccessFlags2,
    ) {
        let barrier = vk::ImageMemoryBarrier2::builder()
            .image(image)
            .old_layout(old_layout)
            .new_layout(new_layout)
            .src_stage_mask(src_stage)
            .src_access_mask(src_access)
            .dst_stage_mask(dst_stage)
            .dst_access_mask(dst_access)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect_mask_for_layout(new_layout),
                base_mip_level: 0,
                level_count: vk::REMAINING_MIP_LEVELS,
                base_array_layer: 0,
                layer_count: vk::REMAINING_ARRAY_LAYERS,
            })
            .build();

        if let Some(last) = self.image_barriers.last() {
            if same_transition(last, &barrier) {
                return;
            }
        }
        self.image_barriers.push(barrier);
    }

    /// Appends a buffer barrier over `[offset, offset + size)`.
    pub fn buffer_barrier(
        &mut self,
        buffer: vk::Buffer,
        offset: u64,
        size: u64,
        src_stage: vk::PipelineStageFlags2,
        src_access: vk::AccessFlags2,
        dst_stage: vk::PipelineStageFlags2,
        dst_access: vk::AccessFlags2,
    ) {
        self.buffer_barriers.push(
            vk::BufferMemoryBarrier2::builder()
                .buffer(buffer)
                .offset(offset)
                .size(size)
                .src_stage_mask(src_stage)
                .src_access_mask(src_access)
                .dst_stage_mask(dst_stage)
                .dst_access_mask(dst_access)
                .build(),
        );
    }

    /// Emits everything accumulated so far as one pipeline barrier, then
    /// clears. A merger with no records flushes to nothing.
    pub fn flush(&mut self, encoder: &impl CommandEncoder, command_buffer: vk::CommandBuffer) {
        if self.is_empty() {
            return;
        }
        let dependency = vk::DependencyInfo::builder()
            .image_memory_barriers(&self.image_barriers)
            .buffer_memory_barriers(&self.buffer_barriers);
        encoder.pipeline_barrier(command_buffer, &dependency);
        self.clear();
    }
}

fn same_transition(a: &vk::ImageMemoryBarrier2, b: &vk::ImageMemoryBarrier2) -> bool {
    a.image == b.image
        && a.old_layout == b.old_layout
        && a.new_layout == b.new_layout
        && a.src_stage_mask == b.src_stage_mask
        && a.src_access_mask == b.src_access_mask
        && a.dst_stage_mask == b.dst_stage_mask
        && a.dst_access_mask == b.dst_access_mask
}

#[cfg(test)]
mod tests {
    use ash::vk::{self, Handle};

    use super::*;
    use crate::gpu::testing::RecordingEncoder;

    fn image(raw: u64) -> vk::Image {
        vk::Image::from_raw(raw)
    }

    #[test]
    fn aspect_follows_destination_layout() {
        assert_eq!(
            aspect_mask_for_layout(vk::ImageLayout::UNDEFINED),
            vk::ImageAspectFlags::NONE
        );
        assert_eq!(
            aspect_mask_for_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL),
            vk::ImageAspectFlags::COLOR
        );
        assert_eq!(
            aspect_mask_for_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        );
        assert_eq!(
            aspect_mask_for_layout(vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL),
            vk::ImageAspectFlags::DEPTH
        );
        assert_eq!(
            aspect_mask_for_layout(vk::ImageLayout::STENCIL_ATTACHMENT_OPTIMAL),
            vk::ImageAspectFlags::STENCIL
        );
        assert_eq!(
            aspect_mask_for_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL),
            vk::ImageAspectFlags::COLOR
        );
        assert_eq!(
            aspect_mask_for_layout(vk::ImageLayout::PRESENT_SRC_KHR),
            vk::ImageAspectFlags::COLOR
        );
    }

    #[test]
    fn identical_consecutive_transitions_coalesce() {
        let mut merger = BarrierMerger::new();
        for _ in 0..2 {
            merger.transition_image(
                image(1),
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
                vk::PipelineStageFlags2::TOP_OF_PIPE,
                vk::AccessFlags2::NONE,
                vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
                vk::AccessFlags2::COLOR_ATTACHMENT_WRITE,
            );
        }
        assert_eq!(merger.image_barriers().len(), 1);
    }

    #[test]
    fn distinct_transitions_keep_insertion_order() {
        let mut merger = BarrierMerger::new();
        merger.transition_image(
            image(1),
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::PipelineStageFlags2::TOP_OF_PIPE,
            vk::AccessFlags2::NONE,
            vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
            vk::AccessFlags2::COLOR_ATTACHMENT_WRITE,
        );
        merger.transition_image(
            image(2),
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::PipelineStageFlags2::TOP_OF_PIPE,
            vk::AccessFlags2::NONE,
            vk::PipelineStageFlags2::FRAGMENT_SHADER,
            vk::AccessFlags2::SHADER_READ,
        );
        let barriers = merger.image_barriers();
        assert_eq!(barriers.len(), 2);
        assert_eq!(barriers[0].image, image(1));
        assert_eq!(barriers[1].image, image(2));
    }

    #[test]
    fn flush_emits_once_and_clears() {
        let mut merger = BarrierMerger::new();
        merger.transition_image(
            image(1),
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::GENERAL,
            vk::PipelineStageFlags2::TOP_OF_PIPE,
            vk::AccessFlags2::NONE,
            vk::PipelineStageFlags2::COMPUTE_SHADER,
            vk::AccessFlags2::SHADER_WRITE,
        );
        merger.buffer_barrier(
            vk::Buffer::from_raw(7),
            0,
            64,
            vk::PipelineStageFlags2::TOP_OF_PIPE,
            vk::AccessFlags2::NONE,
            vk::PipelineStageFlags2::COMPUTE_SHADER,
            vk::AccessFlags2::SHADER_READ,
        );

        let encoder = RecordingEncoder::default();
        merger.flush(&encoder, vk::CommandBuffer::null());
        assert!(merger.is_empty());
        assert_eq!(encoder.image_barriers.borrow().len(), 1);
        assert_eq!(encoder.image_barriers.borrow()[0].len(), 1);
        assert_eq!(encoder.buffer_barriers.borrow()[0].len(), 1);

        // empty merger flushes to nothing
        merger.flush(&encoder, vk::CommandBuffer::null());
        assert_eq!(encoder.image_barriers.borrow().len(), 1);
    }
}
