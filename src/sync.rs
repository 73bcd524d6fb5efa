//! Semaphore and fence helpers.

use ash::vk;

pub fn create_semaphore(device: &ash::Device) -> vk::Semaphore {
    unsafe { device.create_semaphore(&vk::SemaphoreCreateInfo::default(), None) }
        .expect("failed to create semaphore")
}

/// Fences guarding frame slots start signalled so the first wait on each
/// slot passes immediately.
pub fn create_signaled_fence(device: &ash::Device) -> vk::Fence {
    let info = vk::FenceCreateInfo::builder().flags(vk::FenceCreateFlags::SIGNALED);
    unsafe { device.create_fence(&info, None) }.expect("failed to create fence")
}

pub fn semaphore_submit_info(
    stage_mask: vk::PipelineStageFlags2,
    semaphore: vk::Semaphore,
) -> vk::SemaphoreSubmitInfo {
    vk::SemaphoreSubmitInfo::builder()
        .semaphore(semaphore)
        .stage_mask(stage_mask)
        .build()
}
