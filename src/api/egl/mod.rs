//! EGL backend, loaded from `libEGL` at runtime.

use std::collections::HashMap;
use std::ffi::{c_void, CStr, CString};
use std::fmt;
use std::os::raw::c_char;
use std::ptr::NonNull;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use libloading::Library;

use crate::attributes::GlAttributes;
use crate::context::RawContext;
use crate::error::{Error, ErrorKind, Result};
use crate::surface::{RawSurface, SwapInterval};
use crate::window::Window;

use super::NativeApi;

mod context;
mod display;
mod surface;

#[allow(non_camel_case_types, dead_code)]
#[allow(clippy::missing_safety_doc)]
#[allow(clippy::manual_non_exhaustive)]
#[allow(clippy::unnecessary_cast)]
pub(crate) mod ffi {
    pub mod egl {
        pub type khronos_utime_nanoseconds_t = super::khronos_utime_nanoseconds_t;
        pub type khronos_uint64_t = super::khronos_uint64_t;
        pub type khronos_ssize_t = super::khronos_ssize_t;
        pub type EGLNativeDisplayType = super::EGLNativeDisplayType;
        pub type EGLNativePixmapType = super::EGLNativePixmapType;
        pub type EGLNativeWindowType = super::EGLNativeWindowType;
        pub type EGLint = super::EGLint;
        pub type NativeDisplayType = super::EGLNativeDisplayType;
        pub type NativePixmapType = super::EGLNativePixmapType;
        pub type NativeWindowType = super::EGLNativeWindowType;

        include!(concat!(env!("OUT_DIR"), "/egl_bindings.rs"));
    }

    use std::os::raw;

    pub type khronos_utime_nanoseconds_t = khronos_uint64_t;
    pub type khronos_uint64_t = u64;
    pub type khronos_ssize_t = raw::c_long;
    pub type EGLint = i32;
    pub type EGLenum = raw::c_uint;
    pub type EGLNativeDisplayType = *const raw::c_void;
    pub type EGLNativePixmapType = *const raw::c_void;
    pub type EGLNativeWindowType = *const raw::c_void;
}

use ffi::egl;
use ffi::egl::types::{EGLConfig, EGLDisplay};

#[cfg(windows)]
const EGL_LIBRARIES: &[&str] = &["libEGL.dll", "atioglxx.dll"];
#[cfg(not(windows))]
const EGL_LIBRARIES: &[&str] = &["libEGL.so.1", "libEGL.so"];

/// The EGL native api.
///
/// The display is initialized from the first window a drawable is created
/// for.
#[derive(Debug, Default)]
pub struct Egl {
    inner: RwLock<Option<EglInner>>,
}

impl Egl {
    pub fn new() -> Self {
        Default::default()
    }

    /// The EGL version of the initialized display.
    pub fn version(&self) -> Option<(i32, i32)> {
        self.read().as_ref().and_then(|inner| inner.display.as_ref()).map(|d| d.version)
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<EglInner>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<EglInner>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_display<T>(&self, f: impl FnOnce(&egl::Egl, &EglDisplayInner) -> Result<T>) -> Result<T> {
        let inner = self.read();
        let inner = inner.as_ref().ok_or(ErrorKind::LoadLibrary)?;
        let display = inner
            .display
            .as_ref()
            .ok_or(ErrorKind::NotSupported("no EGL display was initialized"))?;
        f(&inner.egl, display)
    }
}

struct EglInner {
    egl: egl::Egl,
    display: Option<EglDisplayInner>,
    /// Configs the drawables were created with.
    configs: HashMap<RawSurface, EGLConfig>,
    _library: Arc<Library>,
}

// EGL handles can be used from any thread.
unsafe impl Send for EglInner {}
unsafe impl Sync for EglInner {}

impl fmt::Debug for EglInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EglInner")
            .field("display", &self.display)
            .field("surfaces", &self.configs.len())
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct EglDisplayInner {
    raw: EGLDisplay,
    version: (i32, i32),
    extensions: String,
}

impl EglDisplayInner {
    fn has_extension(&self, name: &str) -> bool {
        self.extensions.split_ascii_whitespace().any(|ext| ext == name)
    }
}

fn load_symbols(library: &Library) -> egl::Egl {
    let get_proc_address = unsafe {
        library
            .get::<unsafe extern "C" fn(*const c_char) -> *const c_void>(b"eglGetProcAddress\0")
            .ok()
            .map(|symbol| *symbol)
    };

    egl::Egl::load_with(|name| {
        let Ok(name) = CString::new(name) else {
            return std::ptr::null();
        };

        if let Ok(symbol) = unsafe { library.get::<*const c_void>(name.as_bytes_with_nul()) } {
            return *symbol;
        }

        // Before EGL 1.5 `eglGetProcAddress` only resolves extensions.
        match get_proc_address {
            Some(get_proc_address) => unsafe { get_proc_address(name.as_ptr()) },
            None => std::ptr::null(),
        }
    })
}

/// Turn the last EGL error into an [`Error`].
pub(crate) fn check_error(egl: &egl::Egl) -> Result<()> {
    let raw_code = unsafe { egl.GetError() } as egl::types::EGLenum;
    let message = match raw_code {
        egl::SUCCESS => return Ok(()),
        egl::NOT_INITIALIZED => "EGL_NOT_INITIALIZED",
        egl::BAD_ACCESS => "EGL_BAD_ACCESS",
        egl::BAD_ALLOC => "EGL_BAD_ALLOC",
        egl::BAD_ATTRIBUTE => "EGL_BAD_ATTRIBUTE",
        egl::BAD_CONTEXT => "EGL_BAD_CONTEXT",
        egl::BAD_CONFIG => "EGL_BAD_CONFIG",
        egl::BAD_CURRENT_SURFACE => "EGL_BAD_CURRENT_SURFACE",
        egl::BAD_DISPLAY => "EGL_BAD_DISPLAY",
        egl::BAD_SURFACE => "EGL_BAD_SURFACE",
        egl::BAD_MATCH => "EGL_BAD_MATCH",
        egl::BAD_PARAMETER => "EGL_BAD_PARAMETER",
        egl::BAD_NATIVE_PIXMAP => "EGL_BAD_NATIVE_PIXMAP",
        egl::BAD_NATIVE_WINDOW => "EGL_BAD_NATIVE_WINDOW",
        egl::CONTEXT_LOST => "EGL_CONTEXT_LOST",
        _ => "unknown EGL error",
    };

    Err(Error::native(Some(raw_code as i64), message))
}

/// The error of a failed call, even when EGL didn't record one.
fn last_error(egl: &egl::Egl) -> Error {
    match check_error(egl) {
        Err(err) => err,
        Ok(()) => Error::native(None, "EGL call failed without an error"),
    }
}

impl NativeApi for Egl {
    fn default_library_names(&self) -> &'static [&'static str] {
        EGL_LIBRARIES
    }

    fn library_loaded(&self, library: Option<Arc<Library>>) -> Result<()> {
        let library = library.ok_or_else(|| {
            Error::new(None, Some("EGL is loaded from a library".into()), ErrorKind::LoadLibrary)
        })?;

        let egl = load_symbols(&library);
        if !egl.GetDisplay.is_loaded() || !egl.MakeCurrent.is_loaded() {
            return Err(Error::new(
                None,
                Some("the library doesn't export EGL".into()),
                ErrorKind::LoadLibrary,
            ));
        }

        *self.write() =
            Some(EglInner { egl, display: None, configs: HashMap::new(), _library: library });
        Ok(())
    }

    fn library_unloaded(&self) {
        if let Some(inner) = self.write().take() {
            if let Some(display) = inner.display {
                unsafe { inner.egl.Terminate(display.raw) };
            }
        }
    }

    fn get_proc_address(&self, name: &CStr) -> Option<NonNull<c_void>> {
        let inner = self.read();
        let egl = &inner.as_ref()?.egl;
        let address = unsafe { egl.GetProcAddress(name.as_ptr()) };
        NonNull::new(address as *mut c_void)
    }

    fn create_surface(&self, window: &Window, attributes: &GlAttributes) -> Result<RawSurface> {
        let mut inner = self.write();
        let inner = inner.as_mut().ok_or(ErrorKind::LoadLibrary)?;

        if inner.display.is_none() {
            inner.display = Some(display::initialize(&inner.egl, window.raw_display_handle())?);
        }
        let display = inner.display.as_ref().ok_or(ErrorKind::Native)?;

        let config = display::choose_config(&inner.egl, display, attributes)?;
        let surface = surface::create_window_surface(&inner.egl, display, config, window, attributes)?;
        inner.configs.insert(surface, config);
        Ok(surface)
    }

    fn destroy_surface(&self, surface: RawSurface) {
        let mut inner = self.write();
        let Some(inner) = inner.as_mut() else {
            return;
        };

        inner.configs.remove(&surface);
        if let Some(display) = inner.display.as_ref() {
            unsafe { inner.egl.DestroySurface(display.raw, surface.as_ptr()) };
        }
    }

    fn create_context(
        &self,
        surface: RawSurface,
        attributes: &GlAttributes,
        share: Option<RawContext>,
    ) -> Result<RawContext> {
        let inner = self.read();
        let inner = inner.as_ref().ok_or(ErrorKind::LoadLibrary)?;
        let display = inner.display.as_ref().ok_or(ErrorKind::BadContext)?;
        let config = *inner
            .configs
            .get(&surface)
            .ok_or(ErrorKind::NotSupported("the drawable wasn't created by this display"))?;

        context::create_context(&inner.egl, display, config, attributes, share)
    }

    fn destroy_context(&self, context: RawContext) {
        let result = self.with_display(|egl, display| unsafe {
            if egl.DestroyContext(display.raw, context.as_ptr()) == egl::FALSE {
                Err(last_error(egl))
            } else {
                Ok(())
            }
        });

        if let Err(err) = result {
            log::warn!("failed to destroy EGL context {:?}: {err}", context.as_ptr());
        }
    }

    fn make_current(&self, surface: Option<RawSurface>, context: Option<RawContext>) -> Result<()> {
        let inner = self.read();
        let Some(inner) = inner.as_ref() else {
            return match context {
                Some(_) => Err(ErrorKind::LoadLibrary.into()),
                None => Ok(()),
            };
        };
        let Some(display) = inner.display.as_ref() else {
            return match context {
                Some(_) => Err(ErrorKind::BadContext.into()),
                None => Ok(()),
            };
        };

        let surface = surface.map_or(egl::NO_SURFACE, RawSurface::as_ptr);
        let context = context.map_or(egl::NO_CONTEXT, RawContext::as_ptr);
        unsafe {
            if inner.egl.MakeCurrent(display.raw, surface, surface, context) == egl::FALSE {
                return Err(last_error(&inner.egl));
            }
        }
        Ok(())
    }

    fn current_context(&self) -> Option<RawContext> {
        let inner = self.read();
        let context = unsafe { inner.as_ref()?.egl.GetCurrentContext() };
        (context != egl::NO_CONTEXT).then(|| RawContext::new(context))
    }

    fn swap_buffers(&self, surface: RawSurface, _context: RawContext) -> Result<()> {
        self.with_display(|egl, display| unsafe {
            if egl.SwapBuffers(display.raw, surface.as_ptr()) == egl::FALSE {
                Err(last_error(egl))
            } else {
                Ok(())
            }
        })
    }

    fn set_swap_interval(&self, _surface: RawSurface, interval: SwapInterval) -> Result<()> {
        if interval == SwapInterval::Adaptive {
            return Err(ErrorKind::NotSupported("EGL has no adaptive swap interval").into());
        }

        self.with_display(|egl, display| unsafe {
            if egl.SwapInterval(display.raw, interval.as_raw()) == egl::FALSE {
                Err(last_error(egl))
            } else {
                Ok(())
            }
        })
    }
}
