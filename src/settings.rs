//! Engine settings.
//!
//! Loaded from an optional `kiln.toml` next to the working directory plus
//! `KILN_*` environment overrides, with coded defaults for everything.

use ash::vk;
use config::Config;

use crate::error::Result;
use crate::frame::PacerSettings;

/// Context creation preferences. The preferred lists are tried in order and
/// fall back to whatever the surface actually offers.
#[derive(Clone, Debug)]
pub struct ContextSettings {
    pub preferred_formats: Vec<vk::Format>,
    pub preferred_present_modes: Vec<vk::PresentModeKHR>,
    pub preferred_image_count: u32,
    pub validation: bool,
}

impl Default for ContextSettings {
    fn default() -> ContextSettings {
        ContextSettings {
            preferred_formats: vec![vk::Format::B8G8R8A8_UNORM, vk::Format::B8G8R8A8_SRGB],
            preferred_present_modes: vec![
                vk::PresentModeKHR::MAILBOX,
                vk::PresentModeKHR::FIFO_RELAXED,
            ],
            preferred_image_count: 3,
            validation: cfg!(debug_assertions),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Settings {
    pub context: ContextSettings,
    pub pacer: PacerSettings,
}

impl Settings {
    pub fn load() -> Result<Settings> {
        let defaults = ContextSettings::default();
        let cfg = Config::builder()
            .set_default("frame.frames_in_flight", 3_i64)?
            .set_default("vulkan.preferred_image_count", defaults.preferred_image_count as i64)?
            .set_default("vulkan.validation", defaults.validation)?
            .add_source(config::File::with_name("kiln").required(false))
            .add_source(config::Environment::with_prefix("KILN").separator("__"))
            .build()?;

        Ok(Settings {
            context: ContextSettings {
                preferred_image_count: cfg.get::<u32>("vulkan.preferred_image_count")?,
                validation: cfg.get::<bool>("vulkan.validation")?,
                ..defaults
            },
            pacer: PacerSettings {
                frames_in_flight: cfg.get::<u32>("frame.frames_in_flight")?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_a_config_file() {
        let settings = Settings::load().unwrap();
        assert_eq!(settings.pacer.frames_in_flight, 3);
        assert_eq!(settings.context.preferred_image_count, 3);
    }
}
