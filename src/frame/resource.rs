//! Resource handles and per-frame tracked state.
//!
//! Handles are minted by the [`Builder`](super::Builder) that imported the
//! resource and are meaningless outside it; the next frame's builder hands
//! out fresh ones.

use ash::vk;

/// Identifies an image imported into one frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageId(pub(crate) u32);

/// Identifies a buffer range imported into one frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub(crate) u32);

impl ImageId {
    pub const INVALID: ImageId = ImageId(u32::MAX);

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl BufferId {
    pub const INVALID: BufferId = BufferId(u32::MAX);

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Declares that a pass reads or writes an image at the given stages.
/// Which of the two it is comes from the list the record is put in.
#[derive(Copy, Clone, Debug)]
pub struct ImageAccess {
    pub image: ImageId,
    pub stage: vk::PipelineStageFlags2,
}

impl ImageAccess {
    pub fn new(image: ImageId, stage: vk::PipelineStageFlags2) -> ImageAccess {
        ImageAccess { image, stage }
    }

    /// Sampled in the fragment shader, the common case.
    pub fn sampled(image: ImageId) -> ImageAccess {
        ImageAccess::new(image, vk::PipelineStageFlags2::FRAGMENT_SHADER)
    }
}

/// Declares that a pass reads or writes an imported buffer range at the
/// given stages.
#[derive(Copy, Clone, Debug)]
pub struct BufferAccess {
    pub buffer: BufferId,
    pub stage: vk::PipelineStageFlags2,
}

impl BufferAccess {
    pub fn new(buffer: BufferId, stage: vk::PipelineStageFlags2) -> BufferAccess {
        BufferAccess { buffer, stage }
    }
}

/// State the builder tracks for an imported image while it walks the pass
/// list. `layout`/`last_stage`/`last_access` always describe the image as
/// the most recently processed pass leaves it.
pub(crate) struct ImageEntry {
    pub image: vk::Image,
    pub view: vk::ImageView,
    pub extent: vk::Extent2D,
    pub layout: vk::ImageLayout,
    pub last_stage: vk::PipelineStageFlags2,
    pub last_access: vk::AccessFlags2,
    pub final_layout: vk::ImageLayout,
}

pub(crate) struct BufferEntry {
    pub buffer: vk::Buffer,
    pub offset: u64,
    pub size: u64,
    pub last_stage: vk::PipelineStageFlags2,
    pub last_access: vk::AccessFlags2,
}

pub(crate) fn is_write_access(access: vk::AccessFlags2) -> bool {
    access.intersects(
        vk::AccessFlags2::SHADER_WRITE
            | vk::AccessFlags2::SHADER_STORAGE_WRITE
            | vk::AccessFlags2::COLOR_ATTACHMENT_WRITE
            | vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE
            | vk::AccessFlags2::TRANSFER_WRITE
            | vk::AccessFlags2::HOST_WRITE
            | vk::AccessFlags2::MEMORY_WRITE,
    )
}

pub(crate) fn is_transfer_stage(stage: vk::PipelineStageFlags2) -> bool {
    stage.intersects(
        vk::PipelineStageFlags2::TRANSFER
            | vk::PipelineStageFlags2::COPY
            | vk::PipelineStageFlags2::BLIT
            | vk::PipelineStageFlags2::RESOLVE
            | vk::PipelineStageFlags2::CLEAR,
    )
}

/// Layout and access a read access lands the image in: sampled reads go to
/// `SHADER_READ_ONLY_OPTIMAL`, transfer-stage reads to
/// `TRANSFER_SRC_OPTIMAL`.
pub(crate) fn image_read_target(
    stage: vk::PipelineStageFlags2,
) -> (vk::ImageLayout, vk::AccessFlags2) {
    if is_transfer_stage(stage) {
        (vk::ImageLayout::TRANSFER_SRC_OPTIMAL, vk::AccessFlags2::TRANSFER_READ)
    } else {
        (vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL, vk::AccessFlags2::SHADER_READ)
    }
}

/// Layout and access a write access lands the image in: storage writes go
/// to `GENERAL`, transfer-stage writes to `TRANSFER_DST_OPTIMAL`.
pub(crate) fn image_write_target(
    stage: vk::PipelineStageFlags2,
) -> (vk::ImageLayout, vk::AccessFlags2) {
    if is_transfer_stage(stage) {
        (vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::AccessFlags2::TRANSFER_WRITE)
    } else {
        (vk::ImageLayout::GENERAL, vk::AccessFlags2::SHADER_WRITE)
    }
}

pub(crate) fn buffer_read_access(stage: vk::PipelineStageFlags2) -> vk::AccessFlags2 {
    if is_transfer_stage(stage) {
        vk::AccessFlags2::TRANSFER_READ
    } else {
        vk::AccessFlags2::SHADER_READ
    }
}

pub(crate) fn buffer_write_access(stage: vk::PipelineStageFlags2) -> vk::AccessFlags2 {
    if is_transfer_stage(stage) {
        vk::AccessFlags2::TRANSFER_WRITE
    } else {
        vk::AccessFlags2::SHADER_WRITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_classification() {
        assert_eq!(
            image_read_target(vk::PipelineStageFlags2::FRAGMENT_SHADER),
            (vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL, vk::AccessFlags2::SHADER_READ)
        );
        assert_eq!(
            image_read_target(vk::PipelineStageFlags2::TRANSFER),
            (vk::ImageLayout::TRANSFER_SRC_OPTIMAL, vk::AccessFlags2::TRANSFER_READ)
        );
        assert_eq!(
            image_write_target(vk::PipelineStageFlags2::COMPUTE_SHADER),
            (vk::ImageLayout::GENERAL, vk::AccessFlags2::SHADER_WRITE)
        );
        assert_eq!(
            image_write_target(vk::PipelineStageFlags2::COPY),
            (vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::AccessFlags2::TRANSFER_WRITE)
        );
    }

    #[test]
    fn write_detection_covers_attachment_and_transfer_writes() {
        assert!(is_write_access(vk::AccessFlags2::COLOR_ATTACHMENT_WRITE));
        assert!(is_write_access(
            vk::AccessFlags2::COLOR_ATTACHMENT_READ | vk::AccessFlags2::COLOR_ATTACHMENT_WRITE
        ));
        assert!(is_write_access(vk::AccessFlags2::TRANSFER_WRITE));
        assert!(!is_write_access(vk::AccessFlags2::SHADER_READ));
        assert!(!is_write_access(vk::AccessFlags2::NONE));
    }
}
