//! A native api recording what the driver asks of it.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::ffi::{c_void, CStr};
use std::num::NonZeroU32;
use std::ptr::NonNull;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use glctx::api::NativeApi;
use glctx::attributes::GlAttributes;
use glctx::context::RawContext;
use glctx::error::{Error, ErrorKind, Result};
use glctx::surface::{RawSurface, SwapInterval};
use glctx::window::{Window, WindowId};
use libloading::Library;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle, WebDisplayHandle, WebWindowHandle};

/// Handle of a context installed by code outside the driver.
pub const FOREIGN_CONTEXT: usize = 0xdead;

/// Describe the test window `id`.
pub fn window(id: u64) -> Window {
    sized_window(id, 640, 480)
}

pub fn sized_window(id: u64, width: u32, height: u32) -> Window {
    Window::from_raw(
        WindowId::new(id),
        RawWindowHandle::Web(WebWindowHandle::new(id as u32)),
        RawDisplayHandle::Web(WebDisplayHandle::new()),
        NonZeroU32::new(width).unwrap(),
        NonZeroU32::new(height).unwrap(),
    )
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Clones share their state, so a test can keep looking after the driver
/// owning the api is gone.
#[derive(Debug, Default, Clone)]
pub struct MockGl {
    shared_namespace: bool,
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    next_handle: usize,
    surfaces: HashMap<usize, (u32, u32)>,
    contexts: HashMap<usize, Option<usize>>,
    destroyed_contexts: HashSet<usize>,
    /// Native binding of each thread, surface and context.
    current: HashMap<ThreadId, (Option<usize>, usize)>,
    make_current_calls: usize,
    failing_make_current: usize,
    reject_contexts: bool,
    adaptive_vsync: bool,
    swaps: Vec<usize>,
    swap_intervals: Vec<i32>,
    library_loads: usize,
    library_unloads: usize,
}

impl MockGl {
    pub fn new() -> Self {
        Default::default()
    }

    /// A platform where every context lives in a single shared namespace.
    pub fn with_shared_namespace() -> Self {
        Self { shared_namespace: true, ..Default::default() }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Drop every native binding, like the OS does in the background.
    pub fn invalidate_all(&self) {
        self.state().current.clear();
    }

    /// Make a context of someone else current on the calling thread.
    pub fn clobber_current(&self) {
        self.state().current.insert(thread::current().id(), (None, FOREIGN_CONTEXT));
    }

    /// The context the native api has current on the calling thread.
    pub fn native_current(&self) -> Option<usize> {
        self.state().current.get(&thread::current().id()).map(|(_, context)| *context)
    }

    /// Fail the next `count` binds of a context.
    pub fn fail_make_current(&self, count: usize) {
        self.state().failing_make_current = count;
    }

    pub fn reject_contexts(&self, reject: bool) {
        self.state().reject_contexts = reject;
    }

    /// Accept [`SwapInterval::Adaptive`], rejected by default.
    pub fn support_adaptive_vsync(&self, support: bool) {
        self.state().adaptive_vsync = support;
    }

    pub fn share_of(&self, context: usize) -> Option<usize> {
        self.state().contexts.get(&context).copied().flatten()
    }

    pub fn live_contexts(&self) -> usize {
        self.state().contexts.len()
    }

    pub fn live_surfaces(&self) -> usize {
        self.state().surfaces.len()
    }

    pub fn surface_size(&self, surface: usize) -> Option<(u32, u32)> {
        self.state().surfaces.get(&surface).copied()
    }

    pub fn was_destroyed(&self, context: usize) -> bool {
        self.state().destroyed_contexts.contains(&context)
    }

    pub fn make_current_calls(&self) -> usize {
        self.state().make_current_calls
    }

    pub fn swaps(&self) -> Vec<usize> {
        self.state().swaps.clone()
    }

    pub fn swap_intervals(&self) -> Vec<i32> {
        self.state().swap_intervals.clone()
    }

    pub fn library_loads(&self) -> usize {
        self.state().library_loads
    }

    pub fn library_unloads(&self) -> usize {
        self.state().library_unloads
    }
}

unsafe extern "system" fn get_string(name: u32) -> *const u8 {
    match name {
        0x1F02 => b"2.1 Mock\0".as_ptr(),
        0x1F03 => b"GL_MOCK_texture GL_MOCK_fence\0".as_ptr(),
        _ => std::ptr::null(),
    }
}

impl NativeApi for MockGl {
    fn default_library_names(&self) -> &'static [&'static str] {
        &[]
    }

    fn links_statically(&self) -> bool {
        true
    }

    fn requires_shared_namespace(&self) -> bool {
        self.shared_namespace
    }

    fn library_loaded(&self, _library: Option<Arc<Library>>) -> Result<()> {
        self.state().library_loads += 1;
        Ok(())
    }

    fn library_unloaded(&self) {
        self.state().library_unloads += 1;
    }

    fn get_proc_address(&self, name: &CStr) -> Option<NonNull<c_void>> {
        match name.to_bytes() {
            b"glGetString" => NonNull::new(get_string as *mut c_void),
            b"glMockEXT" => NonNull::new(0x1000 as *mut c_void),
            _ => None,
        }
    }

    fn create_surface(&self, window: &Window, _attributes: &GlAttributes) -> Result<RawSurface> {
        let mut state = self.state();
        state.next_handle += 1;
        let handle = state.next_handle;
        let (width, height) = window.size();
        state.surfaces.insert(handle, (width.get(), height.get()));
        Ok(RawSurface::new(handle as *const c_void))
    }

    fn destroy_surface(&self, surface: RawSurface) {
        self.state().surfaces.remove(&(surface.as_ptr() as usize));
    }

    fn resize_surface(&self, surface: RawSurface, width: NonZeroU32, height: NonZeroU32) {
        if let Some(size) = self.state().surfaces.get_mut(&(surface.as_ptr() as usize)) {
            *size = (width.get(), height.get());
        }
    }

    fn create_context(
        &self,
        _surface: RawSurface,
        _attributes: &GlAttributes,
        share: Option<RawContext>,
    ) -> Result<RawContext> {
        let mut state = self.state();
        if state.reject_contexts {
            return Err(Error::native(Some(0x3009), "EGL_BAD_MATCH"));
        }

        state.next_handle += 1;
        let handle = state.next_handle;
        state.contexts.insert(handle, share.map(|share| share.as_ptr() as usize));
        Ok(RawContext::new(handle as *const c_void))
    }

    fn destroy_context(&self, context: RawContext) {
        let mut state = self.state();
        let context = context.as_ptr() as usize;
        state.contexts.remove(&context);
        state.destroyed_contexts.insert(context);
    }

    fn make_current(&self, surface: Option<RawSurface>, context: Option<RawContext>) -> Result<()> {
        let mut state = self.state();
        state.make_current_calls += 1;

        let thread = thread::current().id();
        match context {
            None => {
                state.current.remove(&thread);
            },
            Some(_) if state.failing_make_current > 0 => {
                state.failing_make_current -= 1;
                return Err(Error::native(Some(0x300E), "EGL_CONTEXT_LOST"));
            },
            Some(context) => {
                let surface = surface.map(|surface| surface.as_ptr() as usize);
                state.current.insert(thread, (surface, context.as_ptr() as usize));
            },
        }
        Ok(())
    }

    fn current_context(&self) -> Option<RawContext> {
        self.native_current().map(|context| RawContext::new(context as *const c_void))
    }

    fn swap_buffers(&self, surface: RawSurface, _context: RawContext) -> Result<()> {
        self.state().swaps.push(surface.as_ptr() as usize);
        Ok(())
    }

    fn set_swap_interval(&self, _surface: RawSurface, interval: SwapInterval) -> Result<()> {
        let mut state = self.state();
        if interval == SwapInterval::Adaptive && !state.adaptive_vsync {
            return Err(ErrorKind::NotSupported("no late swap tearing").into());
        }
        state.swap_intervals.push(interval.as_raw());
        Ok(())
    }
}
