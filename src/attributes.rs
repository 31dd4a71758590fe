//! Attributes requested for the contexts and drawables created by a driver.
//!
//! The values are read when a context is created, changing them later has no
//! effect on the existing contexts.

use bitflags::bitflags;

use crate::error::{ErrorKind, Result};

bitflags! {
    /// Flags for the created context.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ContextFlags: u32 {
        /// Debug context.
        const DEBUG              = 0b0000_0001;
        /// Forward compatible context, deprecated functionality is removed.
        const FORWARD_COMPATIBLE = 0b0000_0010;
        /// Robust buffer access.
        const ROBUST_ACCESS      = 0b0000_0100;
        /// Resets of other contexts don't affect this one.
        const RESET_ISOLATION    = 0b0000_1000;
    }
}

/// The OpenGL profile to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlProfile {
    /// Core profile.
    Core,
    /// Compatibility profile.
    Compatibility,
    /// OpenGL ES.
    Es,
}

impl GlProfile {
    fn from_raw(raw: i32) -> Option<Option<Self>> {
        match raw {
            0 => Some(None),
            0x1 => Some(Some(Self::Core)),
            0x2 => Some(Some(Self::Compatibility)),
            0x4 => Some(Some(Self::Es)),
            _ => None,
        }
    }

    fn to_raw(profile: Option<Self>) -> i32 {
        match profile {
            None => 0,
            Some(Self::Core) => 0x1,
            Some(Self::Compatibility) => 0x2,
            Some(Self::Es) => 0x4,
        }
    }
}

/// What happens to pending commands when a context stops being current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReleaseBehavior {
    /// Nothing, the pipeline is left as is.
    None,

    /// Commands are flushed.
    #[default]
    Flush,
}

/// How the context reports a graphics reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResetNotification {
    /// Resets are not reported.
    #[default]
    NoNotification,

    /// The context is lost on a reset.
    LoseContext,
}

/// Keys for the individual [`GlAttributes`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlAttr {
    RedSize,
    GreenSize,
    BlueSize,
    AlphaSize,
    BufferSize,
    DoubleBuffer,
    DepthSize,
    StencilSize,
    AccumRedSize,
    AccumGreenSize,
    AccumBlueSize,
    AccumAlphaSize,
    Stereo,
    MultisampleBuffers,
    MultisampleSamples,
    AcceleratedVisual,
    RetainedBacking,
    ContextMajorVersion,
    ContextMinorVersion,
    ContextFlags,
    ContextProfileMask,
    ShareWithCurrentContext,
    FramebufferSrgbCapable,
    ContextReleaseBehavior,
    ContextResetNotification,
    ContextNoError,
    FloatBuffers,
}

/// The attributes for the contexts and drawables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlAttributes {
    pub red_size: u8,
    pub green_size: u8,
    pub blue_size: u8,
    pub alpha_size: u8,
    pub buffer_size: u8,
    pub double_buffer: bool,
    pub depth_size: u8,
    pub stencil_size: u8,
    pub accum_red_size: u8,
    pub accum_green_size: u8,
    pub accum_blue_size: u8,
    pub accum_alpha_size: u8,
    pub stereo: bool,
    pub multisample_buffers: u8,
    pub multisample_samples: u8,
    /// `None` accepts both hardware and software visuals.
    pub accelerated_visual: Option<bool>,
    pub retained_backing: bool,
    pub major_version: u8,
    pub minor_version: u8,
    pub flags: ContextFlags,
    /// `None` lets the platform pick.
    pub profile: Option<GlProfile>,
    /// Join the share group of the calling thread's current context.
    pub share_with_current_context: bool,
    pub framebuffer_srgb_capable: bool,
    pub release_behavior: ReleaseBehavior,
    pub reset_notification: ResetNotification,
    pub no_error: bool,
    pub float_buffers: bool,
}

impl Default for GlAttributes {
    fn default() -> Self {
        #[cfg(any(target_os = "android", target_os = "ios"))]
        let (major_version, minor_version, profile) = (2, 0, Some(GlProfile::Es));
        #[cfg(not(any(target_os = "android", target_os = "ios")))]
        let (major_version, minor_version, profile) = (2, 1, None);

        Self {
            red_size: 8,
            green_size: 8,
            blue_size: 8,
            alpha_size: 0,
            buffer_size: 0,
            double_buffer: true,
            depth_size: 16,
            stencil_size: 0,
            accum_red_size: 0,
            accum_green_size: 0,
            accum_blue_size: 0,
            accum_alpha_size: 0,
            stereo: false,
            multisample_buffers: 0,
            multisample_samples: 0,
            accelerated_visual: None,
            retained_backing: true,
            major_version,
            minor_version,
            flags: ContextFlags::empty(),
            profile,
            share_with_current_context: false,
            framebuffer_srgb_capable: false,
            release_behavior: ReleaseBehavior::Flush,
            reset_notification: ResetNotification::NoNotification,
            no_error: false,
            float_buffers: false,
        }
    }
}

impl GlAttributes {
    /// Whether the requested api is OpenGL ES.
    pub fn is_gles(&self) -> bool {
        self.profile == Some(GlProfile::Es)
    }

    /// Set a single attribute from its raw integer value.
    pub fn set(&mut self, attr: GlAttr, value: i32) -> Result<()> {
        use GlAttr::*;
        match attr {
            RedSize => self.red_size = size(value)?,
            GreenSize => self.green_size = size(value)?,
            BlueSize => self.blue_size = size(value)?,
            AlphaSize => self.alpha_size = size(value)?,
            BufferSize => self.buffer_size = size(value)?,
            DoubleBuffer => self.double_buffer = value != 0,
            DepthSize => self.depth_size = size(value)?,
            StencilSize => self.stencil_size = size(value)?,
            AccumRedSize => self.accum_red_size = size(value)?,
            AccumGreenSize => self.accum_green_size = size(value)?,
            AccumBlueSize => self.accum_blue_size = size(value)?,
            AccumAlphaSize => self.accum_alpha_size = size(value)?,
            Stereo => self.stereo = value != 0,
            MultisampleBuffers => self.multisample_buffers = size(value)?,
            MultisampleSamples => self.multisample_samples = size(value)?,
            AcceleratedVisual => {
                self.accelerated_visual = match value {
                    -1 => None,
                    0 => Some(false),
                    1 => Some(true),
                    _ => return Err(ErrorKind::BadAttribute.into()),
                }
            },
            RetainedBacking => self.retained_backing = value != 0,
            ContextMajorVersion => self.major_version = size(value)?,
            ContextMinorVersion => self.minor_version = size(value)?,
            ContextFlags => {
                self.flags = u32::try_from(value)
                    .ok()
                    .and_then(self::ContextFlags::from_bits)
                    .ok_or(ErrorKind::BadAttribute)?
            },
            ContextProfileMask => {
                self.profile = GlProfile::from_raw(value).ok_or(ErrorKind::BadAttribute)?
            },
            ShareWithCurrentContext => self.share_with_current_context = value != 0,
            FramebufferSrgbCapable => self.framebuffer_srgb_capable = value != 0,
            ContextReleaseBehavior => {
                self.release_behavior = match value {
                    0 => ReleaseBehavior::None,
                    1 => ReleaseBehavior::Flush,
                    _ => return Err(ErrorKind::BadAttribute.into()),
                }
            },
            ContextResetNotification => {
                self.reset_notification = match value {
                    0 => ResetNotification::NoNotification,
                    1 => ResetNotification::LoseContext,
                    _ => return Err(ErrorKind::BadAttribute.into()),
                }
            },
            ContextNoError => self.no_error = value != 0,
            FloatBuffers => self.float_buffers = value != 0,
        }

        Ok(())
    }

    /// Get a single attribute as its raw integer value.
    pub fn get(&self, attr: GlAttr) -> i32 {
        use GlAttr::*;
        match attr {
            RedSize => self.red_size.into(),
            GreenSize => self.green_size.into(),
            BlueSize => self.blue_size.into(),
            AlphaSize => self.alpha_size.into(),
            BufferSize => self.buffer_size.into(),
            DoubleBuffer => self.double_buffer.into(),
            DepthSize => self.depth_size.into(),
            StencilSize => self.stencil_size.into(),
            AccumRedSize => self.accum_red_size.into(),
            AccumGreenSize => self.accum_green_size.into(),
            AccumBlueSize => self.accum_blue_size.into(),
            AccumAlphaSize => self.accum_alpha_size.into(),
            Stereo => self.stereo.into(),
            MultisampleBuffers => self.multisample_buffers.into(),
            MultisampleSamples => self.multisample_samples.into(),
            AcceleratedVisual => self.accelerated_visual.map_or(-1, i32::from),
            RetainedBacking => self.retained_backing.into(),
            ContextMajorVersion => self.major_version.into(),
            ContextMinorVersion => self.minor_version.into(),
            ContextFlags => self.flags.bits() as i32,
            ContextProfileMask => GlProfile::to_raw(self.profile),
            ShareWithCurrentContext => self.share_with_current_context.into(),
            FramebufferSrgbCapable => self.framebuffer_srgb_capable.into(),
            ContextReleaseBehavior => match self.release_behavior {
                ReleaseBehavior::None => 0,
                ReleaseBehavior::Flush => 1,
            },
            ContextResetNotification => match self.reset_notification {
                ResetNotification::NoNotification => 0,
                ResetNotification::LoseContext => 1,
            },
            ContextNoError => self.no_error.into(),
            FloatBuffers => self.float_buffers.into(),
        }
    }
}

fn size(value: i32) -> Result<u8> {
    u8::try_from(value).map_err(|_| ErrorKind::BadAttribute.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_keeps_raw_value() {
        let mut attributes = GlAttributes::default();
        attributes.set(GlAttr::DepthSize, 24).unwrap();
        attributes.set(GlAttr::ContextProfileMask, 0x1).unwrap();
        attributes.set(GlAttr::ContextFlags, 0x1 | 0x4).unwrap();
        attributes.set(GlAttr::AcceleratedVisual, 1).unwrap();

        assert_eq!(attributes.depth_size, 24);
        assert_eq!(attributes.profile, Some(GlProfile::Core));
        assert_eq!(attributes.flags, ContextFlags::DEBUG | ContextFlags::ROBUST_ACCESS);
        assert_eq!(attributes.get(GlAttr::ContextFlags), 0x5);
        assert_eq!(attributes.get(GlAttr::AcceleratedVisual), 1);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut attributes = GlAttributes::default();
        let before = attributes.clone();

        for (attr, value) in [
            (GlAttr::RedSize, -1),
            (GlAttr::StencilSize, 256),
            (GlAttr::ContextProfileMask, 0x3),
            (GlAttr::ContextFlags, 0x10),
            (GlAttr::ContextFlags, -1),
            (GlAttr::AcceleratedVisual, 2),
            (GlAttr::ContextReleaseBehavior, 7),
        ] {
            let err = attributes.set(attr, value).unwrap_err();
            assert_eq!(err.error_kind(), ErrorKind::BadAttribute, "{attr:?} = {value}");
        }

        assert_eq!(attributes, before);
    }

    #[test]
    fn defaults_request_double_buffering() {
        let attributes = GlAttributes::default();
        assert!(attributes.double_buffer);
        assert_eq!(attributes.get(GlAttr::AcceleratedVisual), -1);
        assert_eq!(attributes.release_behavior, ReleaseBehavior::Flush);
    }
}
