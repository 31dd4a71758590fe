//! Drawable surfaces backing the windows.

use std::ffi::c_void;
use std::num::NonZeroU32;

use crate::window::WindowId;

/// Opaque native surface handle, e.g. an `EGLSurface`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawSurface(*const c_void);

// The handle is only an identifier, thread affinity is enforced by the tracker.
unsafe impl Send for RawSurface {}
unsafe impl Sync for RawSurface {}

impl RawSurface {
    pub const fn new(raw: *const c_void) -> Self {
        Self(raw)
    }

    pub const fn as_ptr(self) -> *const c_void {
        self.0
    }
}

/// The swap interval of the presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SwapInterval {
    /// Present without waiting for the vertical blank.
    #[default]
    DontWait,

    /// Wait for the given amount of vertical blanks before presenting.
    Wait(NonZeroU32),

    /// Wait for the vertical blank, unless the frame missed it already.
    ///
    /// Late frames are presented immediately and may tear. Backends without
    /// late swap tearing reject it with [`ErrorKind::NotSupported`].
    ///
    /// [`ErrorKind::NotSupported`]: crate::error::ErrorKind::NotSupported
    Adaptive,
}

impl SwapInterval {
    /// Synchronized with every display refresh.
    pub const VSYNC: Self = Self::Wait(match NonZeroU32::new(1) {
        Some(one) => one,
        None => unreachable!(),
    });

    /// The raw interval the native apis take.
    pub fn as_raw(self) -> i32 {
        match self {
            Self::Adaptive => -1,
            Self::DontWait => 0,
            Self::Wait(interval) => interval.get().min(i32::MAX as u32) as i32,
        }
    }
}

/// The window-backed target a context presents into.
#[derive(Debug)]
pub(crate) struct DrawableSurface {
    pub(crate) window: WindowId,
    pub(crate) raw: RawSurface,
    pub(crate) width: NonZeroU32,
    pub(crate) height: NonZeroU32,
}

impl DrawableSurface {
    pub(crate) fn new(window: WindowId, raw: RawSurface, size: (NonZeroU32, NonZeroU32)) -> Self {
        Self { window, raw, width: size.0, height: size.1 }
    }
}
