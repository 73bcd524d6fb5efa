//! Render pass declarations.

use std::fmt;

use ash::vk;

use super::resource::{BufferAccess, ImageAccess, ImageId};

/// A color or depth attachment of a pass.
#[derive(Copy, Clone)]
pub struct Attachment {
    pub image: ImageId,
    pub clear_value: vk::ClearValue,
    pub load_op: vk::AttachmentLoadOp,
    pub store_op: vk::AttachmentStoreOp,
}

impl Attachment {
    /// Load the previous contents, store the result.
    pub fn load(image: ImageId) -> Attachment {
        Attachment {
            image,
            clear_value: vk::ClearValue::default(),
            load_op: vk::AttachmentLoadOp::LOAD,
            store_op: vk::AttachmentStoreOp::STORE,
        }
    }

    pub fn clear_color(image: ImageId, color: [f32; 4]) -> Attachment {
        Attachment {
            image,
            clear_value: vk::ClearValue {
                color: vk::ClearColorValue { float32: color },
            },
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::STORE,
        }
    }

    pub fn clear_depth(image: ImageId, depth: f32) -> Attachment {
        Attachment {
            image,
            clear_value: vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue { depth, stencil: 0 },
            },
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::STORE,
        }
    }

    pub fn store_op(mut self, store_op: vk::AttachmentStoreOp) -> Attachment {
        self.store_op = store_op;
        self
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ClearValue is a union; don't try to print it
        f.debug_struct("Attachment")
            .field("image", &self.image)
            .field("load_op", &self.load_op)
            .field("store_op", &self.store_op)
            .finish()
    }
}

pub(crate) type ExecuteFn = Box<dyn FnOnce(vk::CommandBuffer)>;

/// One node of the frame graph: what the pass touches and the callback that
/// records its commands. Obtained from
/// [`Builder::add_render_pass`](super::Builder::add_render_pass); every
/// setter chains.
pub struct RenderPass {
    pub(crate) name: String,
    pub(crate) read_images: Vec<ImageAccess>,
    pub(crate) write_images: Vec<ImageAccess>,
    pub(crate) read_buffers: Vec<BufferAccess>,
    pub(crate) write_buffers: Vec<BufferAccess>,
    pub(crate) color_attachment: Option<Attachment>,
    pub(crate) depth_attachment: Option<Attachment>,
    pub(crate) execute_fn: Option<ExecuteFn>,
}

impl RenderPass {
    pub(crate) fn new(name: &str) -> RenderPass {
        RenderPass {
            name: name.to_owned(),
            read_images: Vec::new(),
            write_images: Vec::new(),
            read_buffers: Vec::new(),
            write_buffers: Vec::new(),
            color_attachment: None,
            depth_attachment: None,
            execute_fn: None,
        }
    }

    /// Images the pass samples or reads. Attachments are implied and must
    /// not be repeated here.
    pub fn read_images(
        &mut self,
        accesses: impl IntoIterator<Item = ImageAccess>,
    ) -> &mut RenderPass {
        self.read_images.extend(accesses);
        self
    }

    /// Images the pass writes as storage or transfer destinations.
    pub fn write_images(
        &mut self,
        accesses: impl IntoIterator<Item = ImageAccess>,
    ) -> &mut RenderPass {
        self.write_images.extend(accesses);
        self
    }

    pub fn read_buffers(
        &mut self,
        accesses: impl IntoIterator<Item = BufferAccess>,
    ) -> &mut RenderPass {
        self.read_buffers.extend(accesses);
        self
    }

    pub fn write_buffers(
        &mut self,
        accesses: impl IntoIterator<Item = BufferAccess>,
    ) -> &mut RenderPass {
        self.write_buffers.extend(accesses);
        self
    }

    pub fn set_color_attachment(&mut self, attachment: Attachment) -> &mut RenderPass {
        self.color_attachment = Some(attachment);
        self
    }

    pub fn set_depth_attachment(&mut self, attachment: Attachment) -> &mut RenderPass {
        self.depth_attachment = Some(attachment);
        self
    }

    /// The callback that records the pass's draws and dispatches. Consumed
    /// at build time; a pass without one fails
    /// [`Builder::build`](super::Builder::build).
    pub fn execute(&mut self, f: impl FnOnce(vk::CommandBuffer) + 'static) -> &mut RenderPass {
        self.execute_fn = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for RenderPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderPass")
            .field("name", &self.name)
            .field("read_images", &self.read_images)
            .field("write_images", &self.write_images)
            .field("read_buffers", &self.read_buffers)
            .field("write_buffers", &self.write_buffers)
            .field("color_attachment", &self.color_attachment)
            .field("depth_attachment", &self.depth_attachment)
            .field("has_execute", &self.execute_fn.is_some())
            .finish()
    }
}
