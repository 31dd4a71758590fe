//! The driver's view of a window owned by the window-management component.

use std::num::NonZeroU32;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};

use crate::error::{Error, ErrorKind, Result};

/// Identity of a window, assigned by the window-management component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(u64);

impl WindowId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A window a drawable surface can be created for.
///
/// The native handles are only read while the driver creates the drawable,
/// the window itself stays owned by its creator.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    id: WindowId,
    raw_window: RawWindowHandle,
    raw_display: RawDisplayHandle,
    width: NonZeroU32,
    height: NonZeroU32,
}

impl Window {
    /// Describe a window from its raw handles.
    pub fn from_raw(
        id: WindowId,
        raw_window: RawWindowHandle,
        raw_display: RawDisplayHandle,
        width: NonZeroU32,
        height: NonZeroU32,
    ) -> Self {
        Self { id, raw_window, raw_display, width, height }
    }

    /// Describe a window from anything providing window and display handles.
    pub fn new<W: HasWindowHandle + HasDisplayHandle>(
        id: WindowId,
        window: &W,
        width: NonZeroU32,
        height: NonZeroU32,
    ) -> Result<Self> {
        let raw_window = window.window_handle().map_err(handle_error)?.as_raw();
        let raw_display = window.display_handle().map_err(handle_error)?.as_raw();
        Ok(Self::from_raw(id, raw_window, raw_display, width, height))
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn raw_window_handle(&self) -> RawWindowHandle {
        self.raw_window
    }

    pub fn raw_display_handle(&self) -> RawDisplayHandle {
        self.raw_display
    }

    /// Size of the window in physical pixels.
    pub fn size(&self) -> (NonZeroU32, NonZeroU32) {
        (self.width, self.height)
    }
}

fn handle_error(err: raw_window_handle::HandleError) -> Error {
    Error::new(None, Some(err.to_string()), ErrorKind::NotSupported("window handle is unavailable"))
}
