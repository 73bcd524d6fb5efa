//! Context creation.
//!
//! A [`Context`] wraps the vulkan instance, device, queues and swapchain,
//! and implements the [`GpuContext`]/[`CommandEncoder`] surface the frame
//! core runs against. Graphics, present and compute are served by one queue
//! family; the device is created with synchronization2 and dynamic
//! rendering enabled, which is all the frame graph assumes of it.
//!
//! Context creation failures are fatal: there is nothing sensible to do
//! without a device. Only swapchain staleness is surfaced as a recoverable
//! error at runtime.

use std::ffi::{c_char, c_void, CStr, CString};

use ash::extensions::{ext, khr};
use ash::vk;
use log::{debug, error, info, trace, warn};
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle};

use crate::cmd;
use crate::error::{Error, Result};
use crate::gpu::{AcquiredImage, CommandEncoder, FrameSubmission, GpuContext};
use crate::settings::ContextSettings;
use crate::sync;

const VALIDATION_LAYER: &[u8] = b"VK_LAYER_KHRONOS_validation\0";

/// Debug callback for the debug-utils extension; routes validation output
/// into the crate's log.
unsafe extern "system" fn debug_utils_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut c_void,
) -> vk::Bool32 {
    let message = CStr::from_ptr((*p_callback_data).p_message).to_string_lossy();
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        error!("vulkan: {}", message);
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        warn!("vulkan: {}", message);
    } else {
        debug!("vulkan: {}", message);
    }
    vk::FALSE
}

/// Selected physical device and the queue family serving it.
struct DeviceSelection {
    physical_device: vk::PhysicalDevice,
    queue_family_index: u32,
}

/// Everything tied to the lifetime of one swapchain.
struct SwapchainBundle {
    swapchain: vk::SwapchainKHR,
    format: vk::SurfaceFormatKHR,
    present_mode: vk::PresentModeKHR,
    extent: vk::Extent2D,
    images: Vec<vk::Image>,
    views: Vec<vk::ImageView>,
}

pub struct Context {
    _entry: ash::Entry,
    instance: ash::Instance,
    debug_utils: Option<(ext::DebugUtils, vk::DebugUtilsMessengerEXT)>,
    surface_loader: khr::Surface,
    surface: vk::SurfaceKHR,
    physical_device: vk::PhysicalDevice,
    device: ash::Device,
    queue_family_index: u32,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
    compute_queue: vk::Queue,
    swapchain_loader: khr::Swapchain,
    swapchain: SwapchainBundle,
    settings: ContextSettings,
}

impl Context {
    /// Creates the instance, device and swapchain for a window surface.
    /// `width`/`height` seed the swapchain extent where the surface does
    /// not dictate one.
    pub fn new(
        window: &(impl HasRawWindowHandle + HasRawDisplayHandle),
        width: u32,
        height: u32,
        settings: ContextSettings,
    ) -> Context {
        let entry = unsafe { ash::Entry::load() }.expect("failed to load the vulkan library");

        let app_name = CStr::from_bytes_with_nul(b"kiln\0").expect("static app name");
        let app_info = vk::ApplicationInfo::builder()
            .application_name(app_name)
            .engine_name(app_name)
            .api_version(vk::API_VERSION_1_3);

        let display_handle = window.raw_display_handle();
        let mut extension_names = ash_window::enumerate_required_extensions(display_handle)
            .expect("unsupported window system")
            .to_vec();
        let mut layer_names: Vec<CString> = Vec::new();
        if settings.validation {
            extension_names.push(ext::DebugUtils::name().as_ptr());
            layer_names.push(
                CString::from_vec_with_nul(VALIDATION_LAYER.to_vec()).expect("static layer name"),
            );
        }
        let layer_name_ptrs: Vec<*const c_char> =
            layer_names.iter().map(|name| name.as_ptr()).collect();

        let instance_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_layer_names(&layer_name_ptrs)
            .enabled_extension_names(&extension_names);
        let instance = unsafe { entry.create_instance(&instance_info, None) }
            .expect("failed to create vulkan instance");

        let debug_utils = if settings.validation {
            let loader = ext::DebugUtils::new(&entry, &instance);
            let messenger_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
                .message_severity(
                    vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                        | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                        | vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
                )
                .message_type(
                    vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                        | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                        | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
                )
                .pfn_user_callback(Some(debug_utils_callback));
            let messenger = unsafe { loader.create_debug_utils_messenger(&messenger_info, None) }
                .expect("failed to create debug messenger");
            Some((loader, messenger))
        } else {
            None
        };

        let surface = unsafe {
            ash_window::create_surface(
                &entry,
                &instance,
                display_handle,
                window.raw_window_handle(),
                None,
            )
        }
        .expect("failed to create window surface");
        let surface_loader = khr::Surface::new(&entry, &instance);

        let selection = select_device_and_queue_family(&instance, &surface_loader, surface);
        let device = create_device(&instance, &selection);
        let queue = unsafe { device.get_device_queue(selection.queue_family_index, 0) };

        let swapchain_loader = khr::Swapchain::new(&instance, &device);
        let swapchain = create_swapchain(
            &surface_loader,
            &swapchain_loader,
            &device,
            selection.physical_device,
            surface,
            &settings,
            width,
            height,
            vk::SwapchainKHR::null(),
        );

        info!(
            "swapchain: {} images, {:?}, {:?}, {}x{}",
            swapchain.images.len(),
            swapchain.format.format,
            swapchain.present_mode,
            swapchain.extent.width,
            swapchain.extent.height
        );

        Context {
            _entry: entry,
            instance,
            debug_utils,
            surface_loader,
            surface,
            physical_device: selection.physical_device,
            device,
            queue_family_index: selection.queue_family_index,
            graphics_queue: queue,
            present_queue: queue,
            compute_queue: queue,
            swapchain_loader,
            swapchain,
            settings,
        }
    }

    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub fn queue_family_index(&self) -> u32 {
        self.queue_family_index
    }

    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    pub fn compute_queue(&self) -> vk::Queue {
        self.compute_queue
    }

    fn destroy_swapchain_views(&mut self) {
        unsafe {
            for view in self.swapchain.views.drain(..) {
                self.device.destroy_image_view(view, None);
            }
        }
        self.swapchain.images.clear();
    }
}

fn select_device_and_queue_family(
    instance: &ash::Instance,
    surface_loader: &khr::Surface,
    surface: vk::SurfaceKHR,
) -> DeviceSelection {
    let physical_devices =
        unsafe { instance.enumerate_physical_devices() }.expect("no vulkan physical devices");

    for physical_device in physical_devices {
        let properties = unsafe { instance.get_physical_device_properties(physical_device) };
        let name = unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }.to_string_lossy();
        info!("physical device: {}", name);

        let queue_families =
            unsafe { instance.get_physical_device_queue_family_properties(physical_device) };
        for (index, family) in queue_families.iter().enumerate() {
            let supports_graphics = family.queue_flags.contains(vk::QueueFlags::GRAPHICS);
            let supports_surface = unsafe {
                surface_loader.get_physical_device_surface_support(
                    physical_device,
                    index as u32,
                    surface,
                )
            }
            .unwrap_or(false);
            if supports_graphics && supports_surface {
                info!("using queue family #{} on {}", index, name);
                return DeviceSelection {
                    physical_device,
                    queue_family_index: index as u32,
                };
            }
        }
    }
    panic!("no queue family supports both graphics and the window surface");
}

fn create_device(instance: &ash::Instance, selection: &DeviceSelection) -> ash::Device {
    let priorities = [1.0];
    let queue_info = vk::DeviceQueueCreateInfo::builder()
        .queue_family_index(selection.queue_family_index)
        .queue_priorities(&priorities);

    let extension_names = [khr::Swapchain::name().as_ptr()];

    // the whole frame core is written against these two
    let mut vulkan13 = vk::PhysicalDeviceVulkan13Features::builder()
        .synchronization2(true)
        .dynamic_rendering(true);

    let device_info = vk::DeviceCreateInfo::builder()
        .queue_create_infos(std::slice::from_ref(&queue_info))
        .enabled_extension_names(&extension_names)
        .push_next(&mut vulkan13);

    unsafe { instance.create_device(selection.physical_device, &device_info, None) }
        .expect("failed to create vulkan device")
}

#[allow(clippy::too_many_arguments)]
fn create_swapchain(
    surface_loader: &khr::Surface,
    swapchain_loader: &khr::Swapchain,
    device: &ash::Device,
    physical_device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    settings: &ContextSettings,
    width: u32,
    height: u32,
    old_swapchain: vk::SwapchainKHR,
) -> SwapchainBundle {
    let formats =
        unsafe { surface_loader.get_physical_device_surface_formats(physical_device, surface) }
            .expect("failed to query surface formats");
    let format = settings
        .preferred_formats
        .iter()
        .find_map(|&preferred| formats.iter().find(|f| f.format == preferred))
        .or_else(|| formats.first())
        .copied()
        .expect("surface reports no formats");

    let present_modes = unsafe {
        surface_loader.get_physical_device_surface_present_modes(physical_device, surface)
    }
    .expect("failed to query present modes");
    let present_mode = settings
        .preferred_present_modes
        .iter()
        .copied()
        .find(|mode| present_modes.contains(mode))
        .unwrap_or(vk::PresentModeKHR::FIFO);

    let caps = unsafe {
        surface_loader.get_physical_device_surface_capabilities(physical_device, surface)
    }
    .expect("failed to query surface capabilities");

    let mut image_count = settings.preferred_image_count.max(caps.min_image_count);
    if caps.max_image_count > 0 {
        image_count = image_count.min(caps.max_image_count);
    }

    let extent = if caps.current_extent.width != u32::MAX {
        caps.current_extent
    } else {
        vk::Extent2D {
            width: width.clamp(caps.min_image_extent.width, caps.max_image_extent.width),
            height: height.clamp(caps.min_image_extent.height, caps.max_image_extent.height),
        }
    };

    let pre_transform = if caps
        .supported_transforms
        .contains(vk::SurfaceTransformFlagsKHR::IDENTITY)
    {
        vk::SurfaceTransformFlagsKHR::IDENTITY
    } else {
        caps.current_transform
    };

    let swapchain_info = vk::SwapchainCreateInfoKHR::builder()
        .surface(surface)
        .min_image_count(image_count)
        .image_format(format.format)
        .image_color_space(format.color_space)
        .image_extent(extent)
        .image_array_layers(1)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
        .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        .pre_transform(pre_transform)
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(present_mode)
        .clipped(true)
        .old_swapchain(old_swapchain);
    let swapchain = unsafe { swapchain_loader.create_swapchain(&swapchain_info, None) }
        .expect("failed to create swapchain");

    let images = unsafe { swapchain_loader.get_swapchain_images(swapchain) }
        .expect("failed to get swapchain images");
    let views = images
        .iter()
        .map(|&image| {
            let view_info = vk::ImageViewCreateInfo::builder()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format.format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });
            unsafe { device.create_image_view(&view_info, None) }
                .expect("failed to create swapchain image view")
        })
        .collect();

    SwapchainBundle {
        swapchain,
        format,
        present_mode,
        extent,
        images,
        views,
    }
}

impl CommandEncoder for Context {
    fn pipeline_barrier(&self, command_buffer: vk::CommandBuffer, dependency: &vk::DependencyInfo) {
        unsafe { self.device.cmd_pipeline_barrier2(command_buffer, dependency) }
    }

    fn begin_rendering(&self, command_buffer: vk::CommandBuffer, rendering_info: &vk::RenderingInfo) {
        unsafe { self.device.cmd_begin_rendering(command_buffer, rendering_info) }
    }

    fn end_rendering(&self, command_buffer: vk::CommandBuffer) {
        unsafe { self.device.cmd_end_rendering(command_buffer) }
    }
}

impl GpuContext for Context {
    fn create_semaphore(&self) -> vk::Semaphore {
        sync::create_semaphore(&self.device)
    }

    fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        unsafe { self.device.destroy_semaphore(semaphore, None) }
    }

    fn create_signaled_fence(&self) -> vk::Fence {
        sync::create_signaled_fence(&self.device)
    }

    fn destroy_fence(&self, fence: vk::Fence) {
        unsafe { self.device.destroy_fence(fence, None) }
    }

    fn wait_for_fence(&self, fence: vk::Fence) {
        unsafe { self.device.wait_for_fences(&[fence], true, u64::MAX) }
            .expect("failed to wait for frame fence");
    }

    fn reset_fence(&self, fence: vk::Fence) {
        unsafe { self.device.reset_fences(&[fence]) }.expect("failed to reset frame fence");
    }

    fn create_command_pool(&self) -> vk::CommandPool {
        cmd::create_reset_command_pool(&self.device, self.queue_family_index)
    }

    fn destroy_command_pool(&self, pool: vk::CommandPool) {
        unsafe { self.device.destroy_command_pool(pool, None) }
    }

    fn allocate_primary_command_buffer(&self, pool: vk::CommandPool) -> vk::CommandBuffer {
        cmd::allocate_primary_command_buffer(&self.device, pool)
    }

    fn reset_command_buffer(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            self.device
                .reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())
        }
        .expect("failed to reset command buffer");
    }

    fn begin_one_time_submit(&self, command_buffer: vk::CommandBuffer) {
        cmd::begin_one_time_submit(&self.device, command_buffer);
    }

    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) {
        cmd::end(&self.device, command_buffer);
    }

    fn swapchain_image_count(&self) -> u32 {
        self.swapchain.images.len() as u32
    }

    fn swapchain_extent(&self) -> vk::Extent2D {
        self.swapchain.extent
    }

    fn swapchain_format(&self) -> vk::Format {
        self.swapchain.format.format
    }

    fn swapchain_image(&self, index: u32) -> vk::Image {
        self.swapchain.images[index as usize]
    }

    fn swapchain_image_view(&self, index: u32) -> vk::ImageView {
        self.swapchain.views[index as usize]
    }

    fn acquire_next_image(&mut self, signal: vk::Semaphore) -> Result<AcquiredImage> {
        match unsafe {
            self.swapchain_loader.acquire_next_image(
                self.swapchain.swapchain,
                u64::MAX,
                signal,
                vk::Fence::null(),
            )
        } {
            Ok((index, suboptimal)) => Ok(AcquiredImage { index, suboptimal }),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(Error::SwapchainOutOfDate),
            Err(err) => panic!("vkAcquireNextImageKHR failed: {}", err),
        }
    }

    fn recreate_swapchain(&mut self, width: u32, height: u32) {
        self.destroy_swapchain_views();
        let old = self.swapchain.swapchain;
        self.swapchain = create_swapchain(
            &self.surface_loader,
            &self.swapchain_loader,
            &self.device,
            self.physical_device,
            self.surface,
            &self.settings,
            width,
            height,
            old,
        );
        unsafe { self.swapchain_loader.destroy_swapchain(old, None) };
        debug!(
            "recreated swapchain: {} images, {}x{}",
            self.swapchain.images.len(),
            self.swapchain.extent.width,
            self.swapchain.extent.height
        );
    }

    fn submit_frame(&self, submission: &FrameSubmission) {
        let wait_info = sync::semaphore_submit_info(submission.wait_stage, submission.wait_semaphore);
        let signal_info =
            sync::semaphore_submit_info(submission.signal_stage, submission.signal_semaphore);
        let command_buffer_info = cmd::command_buffer_submit_info(submission.command_buffer);

        let submit = vk::SubmitInfo2::builder()
            .command_buffer_infos(std::slice::from_ref(&command_buffer_info))
            .wait_semaphore_infos(std::slice::from_ref(&wait_info))
            .signal_semaphore_infos(std::slice::from_ref(&signal_info))
            .build();
        unsafe {
            self.device
                .queue_submit2(self.graphics_queue, &[submit], submission.fence)
        }
        .expect("vkQueueSubmit2 failed");
    }

    fn present(&self, wait: vk::Semaphore, image_index: u32) -> Result<()> {
        let wait_semaphores = [wait];
        let swapchains = [self.swapchain.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);
        match unsafe {
            self.swapchain_loader
                .queue_present(self.present_queue, &present_info)
        } {
            Ok(suboptimal) => {
                if suboptimal {
                    trace!("present reported a suboptimal swapchain");
                }
                Ok(())
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(Error::SwapchainOutOfDate),
            Err(err) => panic!("vkQueuePresentKHR failed: {}", err),
        }
    }

    fn wait_idle(&self) {
        unsafe { self.device.device_wait_idle() }.expect("vkDeviceWaitIdle failed");
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.destroy_swapchain_views();
            self.swapchain_loader
                .destroy_swapchain(self.swapchain.swapchain, None);
            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);
            if let Some((loader, messenger)) = self.debug_utils.take() {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}
