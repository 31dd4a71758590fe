//! Window backed `EGLSurface`s.

use std::ffi::c_void;

use raw_window_handle::RawWindowHandle;

use crate::attributes::GlAttributes;
use crate::error::{ErrorKind, Result};
use crate::surface::RawSurface;
use crate::window::Window;

use super::ffi::egl;
use super::ffi::egl::types::{EGLConfig, EGLint};
use super::{last_error, EglDisplayInner};

pub(super) fn create_window_surface(
    egl: &egl::Egl,
    display: &EglDisplayInner,
    config: EGLConfig,
    window: &Window,
    attributes: &GlAttributes,
) -> Result<RawSurface> {
    let native_window = match window.raw_window_handle() {
        #[cfg(x11_platform)]
        RawWindowHandle::Xlib(handle) => handle.window as *const c_void,
        #[cfg(android_platform)]
        RawWindowHandle::AndroidNdk(handle) => handle.a_native_window.as_ptr() as *const c_void,
        #[cfg(windows)]
        RawWindowHandle::Win32(handle) => handle.hwnd.get() as *const c_void,
        _ => {
            return Err(ErrorKind::NotSupported("provided window handle is not supported").into())
        },
    };

    let mut attrs = Vec::<EGLint>::with_capacity(5);

    attrs.push(egl::RENDER_BUFFER as EGLint);
    if attributes.double_buffer {
        attrs.push(egl::BACK_BUFFER as EGLint);
    } else {
        attrs.push(egl::SINGLE_BUFFER as EGLint);
    }

    if attributes.framebuffer_srgb_capable {
        if display.version < (1, 5) && !display.has_extension("EGL_KHR_gl_colorspace") {
            return Err(ErrorKind::NotSupported("sRGB framebuffers are not supported").into());
        }
        attrs.push(egl::GL_COLORSPACE as EGLint);
        attrs.push(egl::GL_COLORSPACE_SRGB as EGLint);
    }

    // Push `egl::NONE` to terminate the list.
    attrs.push(egl::NONE as EGLint);

    let surface =
        unsafe { egl.CreateWindowSurface(display.raw, config, native_window, attrs.as_ptr()) };
    if surface == egl::NO_SURFACE {
        return Err(last_error(egl));
    }

    Ok(RawSurface::new(surface))
}
