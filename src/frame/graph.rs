//! Frame graph construction and execution.
//!
//! The [`Builder`] collects imported resources and pass declarations and
//! tracks, per image, the `(layout, stage, access)` it would be left in by
//! the passes processed so far. [`Builder::build`] turns every state
//! mismatch into a barrier in the owning pass's prefix merger and emits a
//! terminal merger that drives each image to its declared final layout.
//!
//! The resulting [`FrameGraph`] is executed once against the frame's
//! command buffer and then dropped; nothing survives into the next frame.

use ash::vk;
use fxhash::{FxHashMap, FxHashSet};
use log::trace;

use super::pass::{Attachment, ExecuteFn, RenderPass};
use super::resource::{
    buffer_read_access, buffer_write_access, image_read_target, image_write_target,
    is_write_access, BufferEntry, BufferId, ImageEntry, ImageId,
};
use crate::barrier::BarrierMerger;
use crate::error::{Error, Result};
use crate::gpu::CommandEncoder;

/// Collects one frame's passes and imported resources.
///
/// A fresh builder is constructed every frame; handles it returns are not
/// valid anywhere else.
#[derive(Default)]
pub struct Builder {
    passes: Vec<RenderPass>,
    images: Vec<ImageEntry>,
    buffers: Vec<BufferEntry>,
    imported_images: FxHashMap<vk::Image, ImageId>,
    imported_buffers: FxHashMap<(vk::Buffer, u64, u64), BufferId>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Declares an externally owned image. `current_layout` is the layout
    /// the image is in when the frame starts; `final_layout` is the layout
    /// the frame must leave it in. Importing the same image twice in one
    /// frame fails.
    pub fn import_image(
        &mut self,
        image: vk::Image,
        view: vk::ImageView,
        extent: vk::Extent2D,
        current_layout: vk::ImageLayout,
        final_layout: vk::ImageLayout,
    ) -> Result<ImageId> {
        if self.imported_images.contains_key(&image) {
            return Err(Error::DuplicateImport);
        }
        let id = ImageId(self.images.len() as u32);
        self.imported_images.insert(image, id);
        self.images.push(ImageEntry {
            image,
            view,
            extent,
            layout: current_layout,
            last_stage: vk::PipelineStageFlags2::TOP_OF_PIPE,
            last_access: vk::AccessFlags2::NONE,
            final_layout,
        });
        Ok(id)
    }

    /// Declares an externally owned buffer range. Distinct ranges of one
    /// buffer are distinct resources; re-importing the same range fails.
    pub fn import_buffer(&mut self, buffer: vk::Buffer, offset: u64, size: u64) -> Result<BufferId> {
        if self.imported_buffers.contains_key(&(buffer, offset, size)) {
            return Err(Error::DuplicateImport);
        }
        let id = BufferId(self.buffers.len() as u32);
        self.imported_buffers.insert((buffer, offset, size), id);
        self.buffers.push(BufferEntry {
            buffer,
            offset,
            size,
            last_stage: vk::PipelineStageFlags2::TOP_OF_PIPE,
            last_access: vk::AccessFlags2::NONE,
        });
        Ok(id)
    }

    /// Appends a pass and returns it for chained declaration. Passes
    /// execute in the order they were added.
    pub fn add_render_pass(&mut self, name: &str) -> &mut RenderPass {
        let index = self.passes.len();
        self.passes.push(RenderPass::new(name));
        &mut self.passes[index]
    }

    /// Consumes the builder, synthesizing every barrier the declarations
    /// imply.
    pub fn build(mut self) -> Result<FrameGraph> {
        let declared = std::mem::take(&mut self.passes);
        let mut passes = Vec::with_capacity(declared.len());
        for pass in declared {
            passes.push(self.compile_pass(pass)?);
        }

        // Drive every image to its declared final layout and flush pending
        // buffer writes against the end of the frame.
        let mut final_barriers = BarrierMerger::new();
        for entry in &self.images {
            if entry.layout != entry.final_layout {
                final_barriers.transition_image(
                    entry.image,
                    entry.layout,
                    entry.final_layout,
                    entry.last_stage,
                    entry.last_access,
                    vk::PipelineStageFlags2::BOTTOM_OF_PIPE,
                    vk::AccessFlags2::NONE,
                );
            }
        }
        for entry in &self.buffers {
            if entry.last_stage != vk::PipelineStageFlags2::TOP_OF_PIPE
                || entry.last_access != vk::AccessFlags2::NONE
            {
                final_barriers.buffer_barrier(
                    entry.buffer,
                    entry.offset,
                    entry.size,
                    entry.last_stage,
                    entry.last_access,
                    vk::PipelineStageFlags2::BOTTOM_OF_PIPE,
                    vk::AccessFlags2::NONE,
                );
            }
        }

        trace!(
            "frame graph: {} passes, {} images, {} buffers",
            passes.len(),
            self.images.len(),
            self.buffers.len()
        );
        Ok(FrameGraph { passes, final_barriers })
    }

    fn compile_pass(&mut self, pass: RenderPass) -> Result<Pass> {
        let RenderPass {
            name,
            read_images,
            write_images,
            read_buffers,
            write_buffers,
            color_attachment,
            depth_attachment,
            execute_fn,
        } = pass;

        let execute_fn = execute_fn.ok_or_else(|| Error::MissingExecute(name.clone()))?;

        self.check_image_lists(
            &name,
            &read_images.iter().map(|a| a.image).collect::<Vec<_>>(),
            &write_images.iter().map(|a| a.image).collect::<Vec<_>>(),
            color_attachment.as_ref(),
            depth_attachment.as_ref(),
        )?;
        self.check_buffer_lists(
            &name,
            &read_buffers.iter().map(|a| a.buffer).collect::<Vec<_>>(),
            &write_buffers.iter().map(|a| a.buffer).collect::<Vec<_>>(),
        )?;

        let mut barriers = BarrierMerger::new();

        if let Some(att) = &color_attachment {
            let mut access = vk::AccessFlags2::COLOR_ATTACHMENT_WRITE;
            if att.load_op == vk::AttachmentLoadOp::LOAD {
                access |= vk::AccessFlags2::COLOR_ATTACHMENT_READ;
            }
            apply_image_access(
                &mut self.images[att.image.index()],
                &mut barriers,
                vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
                vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
                access,
            );
        }
        if let Some(att) = &depth_attachment {
            let mut access = vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE;
            if att.load_op == vk::AttachmentLoadOp::LOAD {
                access |= vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_READ;
            }
            apply_image_access(
                &mut self.images[att.image.index()],
                &mut barriers,
                vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL,
                vk::PipelineStageFlags2::EARLY_FRAGMENT_TESTS
                    | vk::PipelineStageFlags2::LATE_FRAGMENT_TESTS,
                access,
            );
        }

        // writes, folding a same-pass read of the same image into a
        // read-modify-write in GENERAL layout
        for write in &write_images {
            let entry = &mut self.images[write.image.index()];
            match read_images.iter().find(|r| r.image == write.image) {
                Some(read) => {
                    let (_, read_access) = image_read_target(read.stage);
                    let (_, write_access) = image_write_target(write.stage);
                    apply_image_access(
                        entry,
                        &mut barriers,
                        vk::ImageLayout::GENERAL,
                        read.stage | write.stage,
                        read_access | write_access,
                    );
                }
                None => {
                    let (layout, access) = image_write_target(write.stage);
                    apply_image_access(entry, &mut barriers, layout, write.stage, access);
                }
            }
        }
        for read in &read_images {
            if write_images.iter().any(|w| w.image == read.image) {
                continue;
            }
            let (layout, access) = image_read_target(read.stage);
            apply_image_access(
                &mut self.images[read.image.index()],
                &mut barriers,
                layout,
                read.stage,
                access,
            );
        }

        for write in &write_buffers {
            let entry = &mut self.buffers[write.buffer.index()];
            let mut stage = write.stage;
            let mut access = buffer_write_access(write.stage);
            if let Some(read) = read_buffers.iter().find(|r| r.buffer == write.buffer) {
                stage |= read.stage;
                access |= buffer_read_access(read.stage);
            }
            apply_buffer_access(entry, &mut barriers, stage, access);
        }
        for read in &read_buffers {
            if write_buffers.iter().any(|w| w.buffer == read.buffer) {
                continue;
            }
            apply_buffer_access(
                &mut self.buffers[read.buffer.index()],
                &mut barriers,
                read.stage,
                buffer_read_access(read.stage),
            );
        }

        let color = color_attachment
            .as_ref()
            .map(|att| self.resolve_attachment(att, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL));
        let depth = depth_attachment
            .as_ref()
            .map(|att| self.resolve_attachment(att, vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL));

        // render area comes from the color attachment; depth is the
        // fallback, and a disagreement is a declaration error
        let render_area = match (&color, &depth) {
            (Some(c), Some(d)) if c.extent != d.extent => {
                return Err(Error::InvalidAccess {
                    pass: name,
                    reason: "color and depth attachment extents differ".to_owned(),
                });
            }
            (Some(c), _) => Some(full_rect(c.extent)),
            (None, Some(d)) => Some(full_rect(d.extent)),
            (None, None) => None,
        };

        Ok(Pass {
            name,
            barriers,
            render_area,
            color_attachment: color,
            depth_attachment: depth,
            execute_fn,
        })
    }

    fn check_image_lists(
        &self,
        pass: &str,
        reads: &[ImageId],
        writes: &[ImageId],
        color: Option<&Attachment>,
        depth: Option<&Attachment>,
    ) -> Result<()> {
        let invalid = |reason: String| Error::InvalidAccess {
            pass: pass.to_owned(),
            reason,
        };

        let mut attachments = FxHashSet::default();
        for att in color.iter().chain(depth.iter()) {
            self.check_image_id(pass, att.image)?;
            if !attachments.insert(att.image) {
                return Err(invalid(format!(
                    "image {:?} used as both color and depth attachment",
                    att.image
                )));
            }
        }

        for (list, ids) in [("read", reads), ("write", writes)] {
            let mut seen = FxHashSet::default();
            for &id in ids {
                self.check_image_id(pass, id)?;
                if attachments.contains(&id) {
                    return Err(invalid(format!(
                        "image {:?} is an attachment and must not also be listed as a {} access",
                        id, list
                    )));
                }
                if !seen.insert(id) {
                    return Err(invalid(format!(
                        "image {:?} listed twice in the {} list",
                        id, list
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_buffer_lists(&self, pass: &str, reads: &[BufferId], writes: &[BufferId]) -> Result<()> {
        for (list, ids) in [("read", reads), ("write", writes)] {
            let mut seen = FxHashSet::default();
            for &id in ids {
                if id.index() >= self.buffers.len() {
                    return Err(Error::InvalidAccess {
                        pass: pass.to_owned(),
                        reason: format!("buffer {:?} was not imported into this frame", id),
                    });
                }
                if !seen.insert(id) {
                    return Err(Error::InvalidAccess {
                        pass: pass.to_owned(),
                        reason: format!("buffer {:?} listed twice in the {} list", id, list),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_image_id(&self, pass: &str, id: ImageId) -> Result<()> {
        if id.index() >= self.images.len() {
            return Err(Error::InvalidAccess {
                pass: pass.to_owned(),
                reason: format!("image {:?} was not imported into this frame", id),
            });
        }
        Ok(())
    }

    fn resolve_attachment(&self, att: &Attachment, layout: vk::ImageLayout) -> PassAttachment {
        let entry = &self.images[att.image.index()];
        PassAttachment {
            view: entry.view,
            extent: entry.extent,
            layout,
            load_op: att.load_op,
            store_op: att.store_op,
            clear_value: att.clear_value,
        }
    }
}

/// Records the transition `entry` needs to satisfy the target state, or
/// merges the reader into the tracked state when no barrier is required.
fn apply_image_access(
    entry: &mut ImageEntry,
    barriers: &mut BarrierMerger,
    layout: vk::ImageLayout,
    stage: vk::PipelineStageFlags2,
    access: vk::AccessFlags2,
) {
    // Read-after-read in the same layout: no barrier, but widen the tracked
    // stage/access so a later writer synchronizes against every reader. The
    // first access replaces the import pseudo-stage instead of widening it.
    if entry.layout == layout && !is_write_access(access) && !is_write_access(entry.last_access) {
        if entry.last_access == vk::AccessFlags2::NONE {
            entry.last_stage = stage;
        } else {
            entry.last_stage |= stage;
        }
        entry.last_access |= access;
        return;
    }
    barriers.transition_image(
        entry.image,
        entry.layout,
        layout,
        entry.last_stage,
        entry.last_access,
        stage,
        access,
    );
    entry.layout = layout;
    entry.last_stage = stage;
    entry.last_access = access;
}

fn apply_buffer_access(
    entry: &mut BufferEntry,
    barriers: &mut BarrierMerger,
    stage: vk::PipelineStageFlags2,
    access: vk::AccessFlags2,
) {
    if !is_write_access(access) && !is_write_access(entry.last_access) {
        if entry.last_access == vk::AccessFlags2::NONE {
            entry.last_stage = stage;
        } else {
            entry.last_stage |= stage;
        }
        entry.last_access |= access;
        return;
    }
    barriers.buffer_barrier(
        entry.buffer,
        entry.offset,
        entry.size,
        entry.last_stage,
        entry.last_access,
        stage,
        access,
    );
    entry.last_stage = stage;
    entry.last_access = access;
}

fn full_rect(extent: vk::Extent2D) -> vk::Rect2D {
    vk::Rect2D {
        offset: vk::Offset2D { x: 0, y: 0 },
        extent,
    }
}

pub(crate) struct PassAttachment {
    pub view: vk::ImageView,
    pub extent: vk::Extent2D,
    pub layout: vk::ImageLayout,
    pub load_op: vk::AttachmentLoadOp,
    pub store_op: vk::AttachmentStoreOp,
    pub clear_value: vk::ClearValue,
}

pub(crate) struct Pass {
    pub name: String,
    pub barriers: BarrierMerger,
    pub render_area: Option<vk::Rect2D>,
    pub color_attachment: Option<PassAttachment>,
    pub depth_attachment: Option<PassAttachment>,
    pub execute_fn: ExecuteFn,
}

/// The executable form of one frame: passes in declared order, each with
/// its prefix barriers, plus the terminal barriers. Produced by
/// [`Builder::build`], consumed by [`FrameGraph::execute`].
pub struct FrameGraph {
    pub(crate) passes: Vec<Pass>,
    pub(crate) final_barriers: BarrierMerger,
}

impl FrameGraph {
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Records the frame: for each pass, flush its prefix barriers, begin
    /// dynamic rendering when it has attachments, run its callback, end
    /// rendering; then flush the terminal barriers.
    ///
    /// The command buffer must be in the recording state.
    pub fn execute(self, encoder: &impl CommandEncoder, command_buffer: vk::CommandBuffer) {
        let FrameGraph {
            passes,
            mut final_barriers,
        } = self;

        for pass in passes {
            let Pass {
                name,
                mut barriers,
                render_area,
                color_attachment,
                depth_attachment,
                execute_fn,
            } = pass;
            trace!("recording pass `{}`", name);

            barriers.flush(encoder, command_buffer);

            let rendering = render_area.is_some();
            if let Some(area) = render_area {
                let color_info = color_attachment.as_ref().map(rendering_attachment_info);
                let depth_info = depth_attachment.as_ref().map(rendering_attachment_info);
                let mut info = vk::RenderingInfo::builder()
                    .render_area(area)
                    .layer_count(1)
                    .view_mask(0);
                if let Some(color_info) = &color_info {
                    info = info.color_attachments(std::slice::from_ref(color_info));
                }
                if let Some(depth_info) = &depth_info {
                    info = info.depth_attachment(depth_info);
                }
                encoder.begin_rendering(command_buffer, &info);
            }

            execute_fn(command_buffer);

            if rendering {
                encoder.end_rendering(command_buffer);
            }
        }

        final_barriers.flush(encoder, command_buffer);
    }
}

fn rendering_attachment_info(att: &PassAttachment) -> vk::RenderingAttachmentInfo {
    vk::RenderingAttachmentInfo::builder()
        .image_view(att.view)
        .image_layout(att.layout)
        .load_op(att.load_op)
        .store_op(att.store_op)
        .resolve_mode(vk::ResolveModeFlags::NONE)
        .clear_value(att.clear_value)
        .build()
}

#[cfg(test)]
mod tests {
    use ash::vk::{self, Handle};

    use super::*;
    use crate::frame::{Attachment, ImageAccess};

    const EXTENT: vk::Extent2D = vk::Extent2D {
        width: 64,
        height: 64,
    };

    fn import(
        builder: &mut Builder,
        raw: u64,
        current: vk::ImageLayout,
        final_layout: vk::ImageLayout,
    ) -> ImageId {
        builder
            .import_image(
                vk::Image::from_raw(raw),
                vk::ImageView::from_raw(raw + 100),
                EXTENT,
                current,
                final_layout,
            )
            .unwrap()
    }

    #[test]
    fn duplicate_image_import_fails() {
        let mut builder = Builder::new();
        import(
            &mut builder,
            1,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::PRESENT_SRC_KHR,
        );
        let err = builder.import_image(
            vk::Image::from_raw(1),
            vk::ImageView::from_raw(101),
            EXTENT,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::PRESENT_SRC_KHR,
        );
        assert!(matches!(err, Err(Error::DuplicateImport)));
    }

    #[test]
    fn duplicate_buffer_range_fails_but_distinct_ranges_do_not() {
        let mut builder = Builder::new();
        let buffer = vk::Buffer::from_raw(9);
        builder.import_buffer(buffer, 0, 256).unwrap();
        assert!(matches!(
            builder.import_buffer(buffer, 0, 256),
            Err(Error::DuplicateImport)
        ));
        assert!(builder.import_buffer(buffer, 256, 256).is_ok());
    }

    #[test]
    fn missing_execute_fails_build() {
        let mut builder = Builder::new();
        let image = import(
            &mut builder,
            1,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::PRESENT_SRC_KHR,
        );
        builder
            .add_render_pass("no-callback")
            .set_color_attachment(Attachment::clear_color(image, [0.0; 4]));
        assert!(matches!(builder.build(), Err(Error::MissingExecute(name)) if name == "no-callback"));
    }

    #[test]
    fn attachment_repeated_in_read_list_fails_build() {
        let mut builder = Builder::new();
        let image = import(
            &mut builder,
            1,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::PRESENT_SRC_KHR,
        );
        builder
            .add_render_pass("bad")
            .set_color_attachment(Attachment::clear_color(image, [0.0; 4]))
            .read_images([ImageAccess::sampled(image)])
            .execute(|_| {});
        assert!(matches!(builder.build(), Err(Error::InvalidAccess { .. })));
    }

    #[test]
    fn unknown_image_id_fails_build() {
        let mut builder = Builder::new();
        builder
            .add_render_pass("bad")
            .read_images([ImageAccess::sampled(ImageId(42))])
            .execute(|_| {});
        assert!(matches!(builder.build(), Err(Error::InvalidAccess { .. })));
    }

    #[test]
    fn mismatched_attachment_extents_fail_build() {
        let mut builder = Builder::new();
        let color = import(
            &mut builder,
            1,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        );
        let depth = builder
            .import_image(
                vk::Image::from_raw(2),
                vk::ImageView::from_raw(102),
                vk::Extent2D {
                    width: 32,
                    height: 32,
                },
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL,
            )
            .unwrap();
        builder
            .add_render_pass("geometry")
            .set_color_attachment(Attachment::clear_color(color, [0.0; 4]))
            .set_depth_attachment(Attachment::clear_depth(depth, 1.0))
            .execute(|_| {});
        assert!(matches!(builder.build(), Err(Error::InvalidAccess { .. })));
    }

    #[test]
    fn read_after_read_widens_the_tracked_stages_for_the_next_writer() {
        let mut builder = Builder::new();
        let image = import(
            &mut builder,
            1,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        );
        builder
            .add_render_pass("read-fragment")
            .read_images([ImageAccess::new(
                image,
                vk::PipelineStageFlags2::FRAGMENT_SHADER,
            )])
            .execute(|_| {});
        builder
            .add_render_pass("read-vertex")
            .read_images([ImageAccess::new(
                image,
                vk::PipelineStageFlags2::VERTEX_SHADER,
            )])
            .execute(|_| {});
        builder
            .add_render_pass("write")
            .set_color_attachment(Attachment::clear_color(image, [0.0; 4]))
            .execute(|_| {});

        let graph = builder.build().unwrap();
        assert!(graph.passes[0].barriers.is_empty());
        assert!(graph.passes[1].barriers.is_empty());

        let barriers = graph.passes[2].barriers.image_barriers();
        assert_eq!(barriers.len(), 1);
        assert_eq!(
            barriers[0].src_stage_mask,
            vk::PipelineStageFlags2::FRAGMENT_SHADER | vk::PipelineStageFlags2::VERTEX_SHADER
        );
        assert_eq!(barriers[0].src_access_mask, vk::AccessFlags2::SHADER_READ);
    }

    #[test]
    fn read_write_in_one_pass_lands_in_general_with_union_masks() {
        let mut builder = Builder::new();
        let image = import(
            &mut builder,
            1,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        );
        builder
            .add_render_pass("rmw")
            .read_images([ImageAccess::new(
                image,
                vk::PipelineStageFlags2::COMPUTE_SHADER,
            )])
            .write_images([ImageAccess::new(
                image,
                vk::PipelineStageFlags2::COMPUTE_SHADER,
            )])
            .execute(|_| {});

        let graph = builder.build().unwrap();
        let barriers = graph.passes[0].barriers.image_barriers();
        assert_eq!(barriers.len(), 1);
        assert_eq!(barriers[0].new_layout, vk::ImageLayout::GENERAL);
        assert_eq!(
            barriers[0].dst_access_mask,
            vk::AccessFlags2::SHADER_READ | vk::AccessFlags2::SHADER_WRITE
        );
        assert_eq!(
            barriers[0].dst_stage_mask,
            vk::PipelineStageFlags2::COMPUTE_SHADER
        );
    }

    #[test]
    fn terminal_barriers_restore_final_layouts_and_flush_buffers() {
        let mut builder = Builder::new();
        let image = import(
            &mut builder,
            1,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        );
        let buffer = builder
            .import_buffer(vk::Buffer::from_raw(9), 0, 128)
            .unwrap();
        builder
            .add_render_pass("write")
            .set_color_attachment(Attachment::clear_color(image, [0.0; 4]))
            .write_buffers([crate::frame::BufferAccess::new(
                buffer,
                vk::PipelineStageFlags2::COMPUTE_SHADER,
            )])
            .execute(|_| {});

        let graph = builder.build().unwrap();
        let images = graph.final_barriers.image_barriers();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].old_layout, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
        assert_eq!(images[0].new_layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
        assert_eq!(
            images[0].dst_stage_mask,
            vk::PipelineStageFlags2::BOTTOM_OF_PIPE
        );
        assert_eq!(images[0].dst_access_mask, vk::AccessFlags2::NONE);

        let buffers = graph.final_barriers.buffer_barriers();
        assert_eq!(buffers.len(), 1);
        assert_eq!(buffers[0].src_access_mask, vk::AccessFlags2::SHADER_WRITE);
    }

    #[test]
    fn untouched_image_in_final_layout_emits_no_terminal_barrier() {
        let mut builder = Builder::new();
        import(
            &mut builder,
            1,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        );
        let graph = builder.build().unwrap();
        assert!(graph.final_barriers.is_empty());
    }
}
