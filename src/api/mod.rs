//! The underlying native graphics Api.
//!
//! The driver doesn't talk to a platform directly, it goes through the
//! [`NativeApi`] implemented by each backend.

use std::ffi::{c_void, CStr};
use std::fmt;
use std::num::NonZeroU32;
use std::ptr::NonNull;
use std::sync::Arc;

use libloading::Library;

use crate::attributes::GlAttributes;
use crate::context::RawContext;
use crate::error::Result;
use crate::surface::{RawSurface, SwapInterval};
use crate::window::Window;

#[cfg(egl_backend)]
pub mod egl;

/// The native context api wrapped by a [`Driver`].
///
/// Errors returned by the backend are expected to be
/// [`ErrorKind::Native`] with the native diagnostics attached, the driver
/// translates them to the failing operation.
///
/// [`Driver`]: crate::driver::Driver
/// [`ErrorKind::Native`]: crate::error::ErrorKind::Native
pub trait NativeApi: fmt::Debug + Send + Sync {
    /// Libraries tried in order when no explicit path is given.
    ///
    /// An empty list means GL is linked into the process.
    fn default_library_names(&self) -> &'static [&'static str];

    /// Whether the GL entry points are linked statically, so the process
    /// symbols can be searched when the library doesn't have them.
    fn links_statically(&self) -> bool {
        false
    }

    /// Whether every context must live in a single shared namespace.
    fn requires_shared_namespace(&self) -> bool {
        false
    }

    /// The GL library was loaded, `None` when the implicit one is used.
    fn library_loaded(&self, library: Option<Arc<Library>>) -> Result<()>;

    /// The GL library is about to be released.
    fn library_unloaded(&self);

    /// Api specific entry point lookup, like `eglGetProcAddress`.
    fn get_proc_address(&self, name: &CStr) -> Option<NonNull<c_void>>;

    /// Create the drawable backing `window`.
    fn create_surface(&self, window: &Window, attributes: &GlAttributes) -> Result<RawSurface>;

    fn destroy_surface(&self, surface: RawSurface);

    /// The window backing the surface was resized.
    fn resize_surface(&self, _surface: RawSurface, _width: NonZeroU32, _height: NonZeroU32) {}

    /// Create a context compatible with `surface`, sharing objects with
    /// `share` when present.
    fn create_context(
        &self,
        surface: RawSurface,
        attributes: &GlAttributes,
        share: Option<RawContext>,
    ) -> Result<RawContext>;

    fn destroy_context(&self, context: RawContext);

    /// Bind `context` and `surface` to the calling thread.
    ///
    /// `None` for both releases the calling thread's context, a context
    /// without a surface is bound surfaceless.
    fn make_current(&self, surface: Option<RawSurface>, context: Option<RawContext>)
        -> Result<()>;

    /// The context the native api has current on the calling thread.
    fn current_context(&self) -> Option<RawContext>;

    /// Present the back buffer of `surface`, `context` being current.
    fn swap_buffers(&self, surface: RawSurface, context: RawContext) -> Result<()>;

    /// Set the swap interval of the calling thread's current context.
    fn set_swap_interval(&self, surface: RawSurface, interval: SwapInterval) -> Result<()>;
}
