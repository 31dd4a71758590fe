//! `EGLDisplay` initialization and config selection.

use std::ffi::{c_void, CStr};
use std::ptr;

use raw_window_handle::RawDisplayHandle;

use crate::attributes::GlAttributes;
use crate::error::{ErrorKind, Result};

use super::ffi::egl;
use super::ffi::egl::types::{EGLConfig, EGLint};
use super::{last_error, EglDisplayInner};

/// Get and initialize the display of `handle`.
pub(super) fn initialize(egl: &egl::Egl, handle: RawDisplayHandle) -> Result<EglDisplayInner> {
    let native = match handle {
        #[cfg(x11_platform)]
        RawDisplayHandle::Xlib(handle) => {
            handle.display.map_or(egl::DEFAULT_DISPLAY, |display| display.as_ptr() as *const c_void)
        },
        RawDisplayHandle::Android(_) | RawDisplayHandle::Windows(_) => egl::DEFAULT_DISPLAY,
        _ => {
            return Err(ErrorKind::NotSupported("provided display handle is not supported").into())
        },
    };

    unsafe {
        let raw = egl.GetDisplay(native);
        if raw == egl::NO_DISPLAY {
            return Err(last_error(egl));
        }

        let (mut major, mut minor) = (0, 0);
        if egl.Initialize(raw, &mut major, &mut minor) == egl::FALSE {
            return Err(last_error(egl));
        }

        let extensions = egl.QueryString(raw, egl::EXTENSIONS as EGLint);
        let extensions = if extensions.is_null() {
            String::new()
        } else {
            CStr::from_ptr(extensions).to_string_lossy().into_owned()
        };

        log::debug!("initialized EGL {major}.{minor}");
        Ok(EglDisplayInner { raw, version: (major, minor), extensions })
    }
}

/// Pick the best config for window drawables with `attributes`.
pub(super) fn choose_config(
    egl: &egl::Egl,
    display: &EglDisplayInner,
    attributes: &GlAttributes,
) -> Result<EGLConfig> {
    let mut config_attributes = Vec::<EGLint>::new();

    config_attributes.push(egl::SURFACE_TYPE as EGLint);
    config_attributes.push(egl::WINDOW_BIT as EGLint);

    let renderable = if attributes.is_gles() {
        match attributes.major_version {
            3.. => egl::OPENGL_ES3_BIT,
            2 => egl::OPENGL_ES2_BIT,
            _ => egl::OPENGL_ES_BIT,
        }
    } else {
        egl::OPENGL_BIT
    };
    config_attributes.push(egl::RENDERABLE_TYPE as EGLint);
    config_attributes.push(renderable as EGLint);

    // Color.
    config_attributes.push(egl::RED_SIZE as EGLint);
    config_attributes.push(attributes.red_size as EGLint);
    config_attributes.push(egl::GREEN_SIZE as EGLint);
    config_attributes.push(attributes.green_size as EGLint);
    config_attributes.push(egl::BLUE_SIZE as EGLint);
    config_attributes.push(attributes.blue_size as EGLint);
    config_attributes.push(egl::ALPHA_SIZE as EGLint);
    config_attributes.push(attributes.alpha_size as EGLint);

    if attributes.buffer_size > 0 {
        config_attributes.push(egl::BUFFER_SIZE as EGLint);
        config_attributes.push(attributes.buffer_size as EGLint);
    }

    config_attributes.push(egl::DEPTH_SIZE as EGLint);
    config_attributes.push(attributes.depth_size as EGLint);
    config_attributes.push(egl::STENCIL_SIZE as EGLint);
    config_attributes.push(attributes.stencil_size as EGLint);

    if attributes.multisample_buffers > 0 {
        config_attributes.push(egl::SAMPLE_BUFFERS as EGLint);
        config_attributes.push(attributes.multisample_buffers as EGLint);
        config_attributes.push(egl::SAMPLES as EGLint);
        config_attributes.push(attributes.multisample_samples as EGLint);
    }

    if let Some(accelerated) = attributes.accelerated_visual {
        config_attributes.push(egl::CONFIG_CAVEAT as EGLint);
        if accelerated {
            config_attributes.push(egl::NONE as EGLint);
        } else {
            config_attributes.push(egl::SLOW_CONFIG as EGLint);
        }
    }

    if attributes.float_buffers {
        return Err(ErrorKind::NotSupported("float pixels are not supported").into());
    }

    // Push `egl::NONE` to terminate the list.
    config_attributes.push(egl::NONE as EGLint);

    let mut config: EGLConfig = ptr::null();
    let mut found = 0;
    unsafe {
        if egl.ChooseConfig(display.raw, config_attributes.as_ptr(), &mut config, 1, &mut found)
            == egl::FALSE
        {
            return Err(last_error(egl));
        }
    }

    if found == 0 {
        return Err(ErrorKind::NotSupported("no config matches the attributes").into());
    }

    Ok(config)
}
