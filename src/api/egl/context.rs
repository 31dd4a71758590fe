//! `EGLContext` creation.

use crate::attributes::{ContextFlags, GlAttributes, GlProfile, ReleaseBehavior, ResetNotification};
use crate::context::RawContext;
use crate::error::{ErrorKind, Result};

use super::ffi::egl;
use super::ffi::egl::types::{EGLConfig, EGLint};
use super::{last_error, EglDisplayInner};

pub(super) fn create_context(
    egl: &egl::Egl,
    display: &EglDisplayInner,
    config: EGLConfig,
    attributes: &GlAttributes,
    share: Option<RawContext>,
) -> Result<RawContext> {
    let api = if attributes.is_gles() { egl::OPENGL_ES_API } else { egl::OPENGL_API };
    let mut attrs = Vec::<EGLint>::new();

    let is_one_five = display.version >= (1, 5);
    if is_one_five || display.has_extension("EGL_KHR_create_context") {
        let mut flags = 0;

        attrs.push(egl::CONTEXT_MAJOR_VERSION as EGLint);
        attrs.push(attributes.major_version as EGLint);
        attrs.push(egl::CONTEXT_MINOR_VERSION as EGLint);
        attrs.push(attributes.minor_version as EGLint);

        // Add profile for the OpenGL Api.
        if api == egl::OPENGL_API {
            let profile = match attributes.profile {
                Some(GlProfile::Core) => Some(egl::CONTEXT_OPENGL_CORE_PROFILE_BIT),
                Some(GlProfile::Compatibility) => {
                    Some(egl::CONTEXT_OPENGL_COMPATIBILITY_PROFILE_BIT)
                },
                _ => None,
            };
            if let Some(profile) = profile {
                attrs.push(egl::CONTEXT_OPENGL_PROFILE_MASK as EGLint);
                attrs.push(profile as EGLint);
            }

            if attributes.flags.contains(ContextFlags::FORWARD_COMPATIBLE) {
                flags |= egl::CONTEXT_OPENGL_FORWARD_COMPATIBLE_BIT_KHR;
            }
        }

        let has_robustness =
            is_one_five || display.has_extension("EGL_EXT_create_context_robustness");
        let robust = attributes.flags.contains(ContextFlags::ROBUST_ACCESS)
            || attributes.reset_notification == ResetNotification::LoseContext;
        if robust && !has_robustness {
            return Err(ErrorKind::NotSupported("context robustness is not supported").into());
        } else if robust {
            let strategy = match attributes.reset_notification {
                ResetNotification::LoseContext => egl::LOSE_CONTEXT_ON_RESET,
                ResetNotification::NoNotification => egl::NO_RESET_NOTIFICATION,
            };
            attrs.push(egl::CONTEXT_OPENGL_RESET_NOTIFICATION_STRATEGY as EGLint);
            attrs.push(strategy as EGLint);
            flags |= egl::CONTEXT_OPENGL_ROBUST_ACCESS_BIT_KHR;
        }

        if attributes.no_error {
            if !display.has_extension("EGL_KHR_create_context_no_error") {
                return Err(ErrorKind::NotSupported("no error contexts are not supported").into());
            }
            attrs.push(egl::CONTEXT_OPENGL_NO_ERROR_KHR as EGLint);
            attrs.push(egl::TRUE as EGLint);
        } else if attributes.flags.contains(ContextFlags::DEBUG) {
            flags |= egl::CONTEXT_OPENGL_DEBUG_BIT_KHR;
        }

        if flags != 0 {
            attrs.push(egl::CONTEXT_FLAGS_KHR as EGLint);
            attrs.push(flags as EGLint);
        }
    } else if api == egl::OPENGL_ES_API {
        // EGL 1.3 uses that to indicate client version instead of major/minor.
        attrs.push(egl::CONTEXT_CLIENT_VERSION as EGLint);
        attrs.push(attributes.major_version as EGLint);
    }

    if attributes.release_behavior == ReleaseBehavior::None
        || attributes.flags.contains(ContextFlags::RESET_ISOLATION)
    {
        log::debug!("EGL ignores the release behavior and reset isolation");
    }

    // Push `egl::NONE` to terminate the list.
    attrs.push(egl::NONE as EGLint);

    let share = share.map_or(egl::NO_CONTEXT, RawContext::as_ptr);
    unsafe {
        if egl.BindAPI(api) == egl::FALSE {
            return Err(last_error(egl));
        }

        let context = egl.CreateContext(display.raw, config, share, attrs.as_ptr());
        if context == egl::NO_CONTEXT {
            return Err(last_error(egl));
        }

        Ok(RawContext::new(context))
    }
}
