//! Command pool and command buffer helpers.

use ash::vk;

/// Pool whose buffers can be reset individually; one per frame slot.
pub fn create_reset_command_pool(device: &ash::Device, queue_family_index: u32) -> vk::CommandPool {
    let info = vk::CommandPoolCreateInfo::builder()
        .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
        .queue_family_index(queue_family_index);
    unsafe { device.create_command_pool(&info, None) }.expect("failed to create command pool")
}

pub fn allocate_primary_command_buffer(
    device: &ash::Device,
    pool: vk::CommandPool,
) -> vk::CommandBuffer {
    let info = vk::CommandBufferAllocateInfo::builder()
        .command_pool(pool)
        .level(vk::CommandBufferLevel::PRIMARY)
        .command_buffer_count(1);
    let buffers =
        unsafe { device.allocate_command_buffers(&info) }.expect("failed to allocate command buffer");
    buffers[0]
}

pub fn begin_one_time_submit(device: &ash::Device, command_buffer: vk::CommandBuffer) {
    let info =
        vk::CommandBufferBeginInfo::builder().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
    unsafe { device.begin_command_buffer(command_buffer, &info) }
        .expect("failed to begin command buffer");
}

pub fn end(device: &ash::Device, command_buffer: vk::CommandBuffer) {
    unsafe { device.end_command_buffer(command_buffer) }.expect("failed to end command buffer");
}

pub fn command_buffer_submit_info(command_buffer: vk::CommandBuffer) -> vk::CommandBufferSubmitInfo {
    vk::CommandBufferSubmitInfo::builder()
        .command_buffer(command_buffer)
        .build()
}
