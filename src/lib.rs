//! The purpose of this library is to manage the OpenGL and OpenGL ES
//! contexts of a video driver: creating them for the driver's windows,
//! binding them to rendering threads, resolving GL entry points and
//! presenting frames.
//!
//! Everything goes through a [`Driver`], which wraps a [`NativeApi`]. Start
//! with [`Driver::load_library`], or let [`Driver::create_context`] load the
//! default library, then make the returned [`GraphicsContext`] current with
//! [`Driver::make_current`] on the thread rendering with it. A context is
//! current on at most one thread at a time.
//!
//! On platforms suspending applications in the background, forward the
//! lifecycle notifications to [`Driver::handle_app_event`] and call
//! [`Driver::restore_current_context`] from every rendering thread before
//! drawing again.
//!
//! [`Driver`]: crate::driver::Driver
//! [`Driver::load_library`]: crate::driver::Driver::load_library
//! [`Driver::create_context`]: crate::driver::Driver::create_context
//! [`Driver::make_current`]: crate::driver::Driver::make_current
//! [`Driver::handle_app_event`]: crate::driver::Driver::handle_app_event
//! [`Driver::restore_current_context`]: crate::driver::Driver::restore_current_context
//! [`NativeApi`]: crate::api::NativeApi
//! [`GraphicsContext`]: crate::context::GraphicsContext

#![deny(rust_2018_idioms)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(clippy::all)]
#![deny(missing_debug_implementations)]
#![cfg_attr(clippy, deny(warnings))]

pub mod api;
pub mod attributes;
pub mod context;
pub mod driver;
pub mod error;
pub mod interruption;
pub mod surface;
pub mod window;

mod current;
mod extensions;
mod lib_loading;

pub use driver::{Driver, DriverBuilder, LIBRARY_ENV_VAR};
pub use error::{Error, ErrorKind, Result};

pub mod prelude {
    //! The glctx prelude.
    //!
    //! The purpose of this module is to bring the types needed by every
    //! driver user into scope.
    //!
    //! ```no_run
    //! # #![allow(unused_imports)]
    //! use glctx::prelude::*;
    //! ```

    pub use crate::api::NativeApi;
    pub use crate::attributes::{GlAttr, GlAttributes};
    pub use crate::context::{ContextState, GraphicsContext};
    pub use crate::driver::{Driver, DriverBuilder};
    pub use crate::interruption::AppEvent;
    pub use crate::surface::SwapInterval;
    pub use crate::window::{Window, WindowId};
}
