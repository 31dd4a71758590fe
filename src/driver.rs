//! The driver instance every context operation goes through.
//!
//! A [`Driver`] owns the contexts it creates, the drawables of the windows
//! they render into and the loaded GL library. Threads borrow contexts by
//! making them current, the driver keeps an explicit table of those
//! bindings so a context is never current on two threads at once.

use std::collections::HashMap;
use std::env;
use std::ffi::c_void;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use log::{debug, trace, warn};

use crate::api::NativeApi;
use crate::attributes::{GlAttr, GlAttributes};
use crate::context::{ContextRegistry, ContextState, GraphicsContext, ShareGroup};
use crate::current::{Binding, CurrentBindings};
use crate::error::{Error, ErrorKind, Result};
use crate::extensions;
use crate::interruption::{AppEvent, InterruptionMonitor, Transition};
use crate::lib_loading::{LoadOutcome, SymbolResolver};
use crate::surface::{DrawableSurface, RawSurface, SwapInterval};
use crate::window::{Window, WindowId};

/// Environment variable naming the GL library to load when none is given.
pub const LIBRARY_ENV_VAR: &str = "GLCTX_GL_DRIVER";

/// Builder for a [`Driver`].
#[derive(Debug, Clone, Default)]
pub struct DriverBuilder {
    attributes: GlAttributes,
    swap_interval: SwapInterval,
    library_from_env: bool,
}

impl DriverBuilder {
    /// Create new driver builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// The attributes the contexts are created with.
    ///
    /// They can be changed later with [`Driver::set_attribute`].
    pub fn with_attributes(mut self, attributes: GlAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// The swap interval applied to every new context.
    ///
    /// By default the presentation doesn't wait for the display refresh.
    pub fn with_swap_interval(mut self, swap_interval: SwapInterval) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Consult [`LIBRARY_ENV_VAR`] when [`Driver::load_library`] is called
    /// without a path.
    pub fn with_library_from_env(mut self, library_from_env: bool) -> Self {
        self.library_from_env = library_from_env;
        self
    }

    /// Create the driver on top of `api`.
    pub fn build<A: NativeApi>(self, api: A) -> Driver<A> {
        Driver {
            api,
            state: Mutex::new(DriverState::default()),
            symbols: Mutex::new(SymbolResolver::default()),
            attributes: Mutex::new(self.attributes),
            monitor: InterruptionMonitor::default(),
            swap_interval: self.swap_interval,
            library_from_env: self.library_from_env,
        }
    }
}

#[derive(Debug, Default)]
struct DriverState {
    registry: ContextRegistry,
    bindings: CurrentBindings,
    surfaces: HashMap<WindowId, DrawableSurface>,
}

/// The owner of the GL contexts of a video driver.
///
/// Every operation takes the driver explicitly. It's `Sync`, so rendering
/// threads can share it behind an `Arc`.
#[derive(Debug)]
pub struct Driver<A: NativeApi> {
    api: A,
    // Registry, bindings and drawables change together, under one lock.
    state: Mutex<DriverState>,
    symbols: Mutex<SymbolResolver>,
    attributes: Mutex<GlAttributes>,
    monitor: InterruptionMonitor,
    swap_interval: SwapInterval,
    library_from_env: bool,
}

impl<A: NativeApi> Driver<A> {
    /// Create a driver with the default configuration.
    pub fn new(api: A) -> Self {
        DriverBuilder::new().build(api)
    }

    /// The native api the driver wraps.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Load the GL library.
    ///
    /// `None` loads the platform's default library. Loading again while a
    /// library is loaded only counts a reference, unless a different path is
    /// requested, which fails.
    pub fn load_library(&self, path: Option<&Path>) -> Result<()> {
        let env_path: Option<PathBuf> = match path {
            None if self.library_from_env => env::var_os(LIBRARY_ENV_VAR).map(PathBuf::from),
            _ => None,
        };
        let path = path.or(env_path.as_deref());

        let mut symbols = self.symbols();
        match symbols.load(path, self.api.default_library_names())? {
            LoadOutcome::AlreadyLoaded => Ok(()),
            LoadOutcome::Loaded(library) => {
                if let Err(err) = self.api.library_loaded(library) {
                    symbols.unload();
                    return Err(err.with_kind(ErrorKind::LoadLibrary));
                }

                match symbols.path() {
                    Some(path) => debug!("loaded GL library {}", path.display()),
                    None => debug!("using the implicit GL library"),
                }
                Ok(())
            },
        }
    }

    /// Drop a reference to the GL library, releasing it with the last one.
    pub fn unload_library(&self) {
        let live = self.state().registry.len();

        let mut symbols = self.symbols();
        if symbols.unload() {
            if live > 0 {
                warn!("GL library released with {live} contexts alive");
            }
            self.api.library_unloaded();
            debug!("GL library released");
        }
    }

    /// Resolve a GL entry point.
    ///
    /// `None` is returned for names unknown to the library and when no
    /// library is loaded, the caller has to check before using it.
    pub fn get_proc_address(&self, name: &str) -> Option<NonNull<c_void>> {
        self.symbols().resolve(
            name,
            |symbol| self.api.get_proc_address(symbol),
            self.api.links_statically(),
        )
    }

    /// Check whether the calling thread's current context advertises the
    /// extension `name`.
    pub fn extension_supported(&self, name: &str) -> bool {
        if self.current_context().is_none() {
            return false;
        }

        extensions::extension_supported(|entry| self.get_proc_address(entry), name)
    }

    /// Create a context rendering into `window`'s drawable.
    ///
    /// The context is current on the calling thread when this returns. The
    /// default GL library is loaded first if none is.
    pub fn create_context(&self, window: &Window) -> Result<GraphicsContext> {
        if !self.symbols().is_loaded() {
            self.load_library(None).map_err(|err| err.with_kind(ErrorKind::ContextCreation))?;
        }

        let attributes = self.attributes().clone();
        let thread = thread::current().id();

        let mut guard = self.state();
        let state = &mut *guard;

        let current =
            state.bindings.get(thread).and_then(|binding| state.registry.get(&binding.context));
        let share = match current {
            Some(entry) if attributes.share_with_current_context => Some(entry),
            _ if self.api.requires_shared_namespace() => state.registry.any(),
            _ => None,
        }
        .map(|entry| (entry.raw, entry.share_group));

        let surface = self
            .ensure_surface(state, window, &attributes)
            .map_err(|err| err.with_kind(ErrorKind::ContextCreation))?;
        let raw = self
            .api
            .create_context(surface, &attributes, share.map(|(raw, _)| raw))
            .map_err(|err| err.with_kind(ErrorKind::ContextCreation))?;

        if let Err(err) = self.api.make_current(Some(surface), Some(raw)) {
            self.api.destroy_context(raw);
            return Err(err.with_kind(ErrorKind::ContextCreation));
        }

        let swap_interval = match self.api.set_swap_interval(surface, self.swap_interval) {
            Ok(()) => self.swap_interval,
            Err(err) => {
                warn!("failed to apply swap interval {:?}: {err}", self.swap_interval);
                SwapInterval::default()
            },
        };

        let context_state =
            if self.monitor.is_suspended() { ContextState::Suspended } else { ContextState::Active };
        let context = state.registry.insert(
            raw,
            window.id(),
            share.map(|(_, group)| group),
            context_state,
            swap_interval,
        );
        state.bindings.bind(
            thread,
            Binding { context, window: window.id(), generation: self.monitor.generation() },
        );

        debug!("created context {} for window {:?}", context.id(), window.id());
        Ok(context)
    }

    /// Delete `context`, releasing it from the thread it's current on.
    ///
    /// Passing a context deleted already is an error.
    pub fn delete_context(&self, context: GraphicsContext) -> Result<()> {
        let thread = thread::current().id();

        let mut guard = self.state();
        let state = &mut *guard;

        let entry = state.registry.remove(&context).ok_or(ErrorKind::BadContext)?;
        match state.bindings.release(&context) {
            Some(owner) if owner == thread => {
                if let Err(err) = self.api.make_current(None, None) {
                    warn!("failed to release context {}: {err}", context.id());
                }
            },
            Some(owner) => {
                warn!("deleting context {} while current on thread {owner:?}", context.id())
            },
            None => (),
        }

        self.api.destroy_context(entry.raw);
        debug!("deleted context {} of window {:?}", context.id(), entry.window);
        Ok(())
    }

    /// Make `context` current on the calling thread, targeting `window`.
    ///
    /// `None` releases the calling thread's context and always succeeds.
    pub fn make_current(&self, window: &Window, context: Option<&GraphicsContext>) -> Result<()> {
        let thread = thread::current().id();

        let mut guard = self.state();
        let state = &mut *guard;

        let Some(context) = context else {
            // The native binding may outlive the logical one when the context
            // was deleted from another thread.
            let previous = state.bindings.clear(thread);
            if let Err(err) = self.api.make_current(None, None) {
                match previous {
                    Some(previous) => {
                        warn!("failed to release context {}: {err}", previous.context.id())
                    },
                    None => warn!("failed to release the native context on {thread:?}: {err}"),
                }
            }
            return Ok(());
        };

        let entry = state.registry.get(context).ok_or_else(|| {
            Error::new(None, Some(ErrorKind::BadContext.to_string()), ErrorKind::MakeCurrent)
        })?;

        if entry.state == ContextState::Lost {
            return Err(Error::new(
                None,
                Some("the context was lost and must be created again".into()),
                ErrorKind::MakeCurrent,
            ));
        }

        if let Some(owner) = state.bindings.thread_of(context).filter(|owner| *owner != thread) {
            return Err(Error::new(
                None,
                Some(format!("the context is current on thread {owner:?}")),
                ErrorKind::MakeCurrent,
            ));
        }

        let raw = entry.raw;
        let attributes = self.attributes().clone();
        let surface = self
            .ensure_surface(state, window, &attributes)
            .map_err(|err| err.with_kind(ErrorKind::MakeCurrent))?;

        self.api
            .make_current(Some(surface), Some(raw))
            .map_err(|err| err.with_kind(ErrorKind::MakeCurrent))?;

        state.bindings.bind(
            thread,
            Binding { context: *context, window: window.id(), generation: self.monitor.generation() },
        );
        trace!("context {} current on {thread:?}", context.id());
        Ok(())
    }

    /// Re-assert the calling thread's context with the native api.
    ///
    /// The platform may have dropped the native binding during an
    /// interruption, or other system code may have made its own context
    /// current. The recorded binding is left untouched, and nothing happens
    /// when the native binding is intact or the thread has none.
    ///
    /// When this fails the context is [`ContextState::Lost`].
    pub fn restore_current_context(&self) -> Result<()> {
        let thread = thread::current().id();

        let mut guard = self.state();
        let state = &mut *guard;

        let Some(binding) = state.bindings.get(thread).copied() else {
            return Ok(());
        };

        if self.monitor.is_suspended() {
            debug!("not restoring context {} while suspended", binding.context.id());
            return Ok(());
        }

        let Some(entry) = state.registry.get_mut(&binding.context) else {
            return Ok(());
        };

        if entry.state == ContextState::Lost {
            return Err(Error::new(
                None,
                Some("the context was lost and must be created again".into()),
                ErrorKind::MakeCurrent,
            ));
        }

        let generation = self.monitor.generation();
        if binding.generation == generation && self.api.current_context() == Some(entry.raw) {
            return Ok(());
        }

        // Without its drawable the context waits to be made current with another
        // window, presenting fails until then.
        let Some(surface) = state.surfaces.get(&binding.window).map(|surface| surface.raw) else {
            debug!(
                "not restoring context {}, window {:?} has no drawable",
                binding.context.id(),
                binding.window
            );
            return Ok(());
        };

        if let Err(err) = self.api.make_current(Some(surface), Some(entry.raw)) {
            entry.state = ContextState::Lost;
            return Err(err.with_kind(ErrorKind::MakeCurrent));
        }

        entry.state = ContextState::Active;
        if let Some(binding) = state.bindings.get_mut(thread) {
            binding.generation = generation;
        }

        debug!("restored context {} on {thread:?}", binding.context.id());
        Ok(())
    }

    /// Present the back buffer of `window`.
    ///
    /// `window` must be the target of the calling thread's current context.
    /// With a swap interval set this blocks until the display refresh.
    pub fn swap_window(&self, window: &Window) -> Result<()> {
        let (surface, context) = {
            let thread = thread::current().id();
            let state = self.state();

            let binding = state.bindings.get(thread).ok_or_else(|| {
                Error::new(
                    None,
                    Some("no context is current on the calling thread".into()),
                    ErrorKind::Swap,
                )
            })?;

            if binding.window != window.id() {
                return Err(Error::new(
                    None,
                    Some(format!("window {:?} is not the current window", window.id())),
                    ErrorKind::Swap,
                ));
            }

            let surface = state.surfaces.get(&binding.window).ok_or_else(|| {
                Error::new(None, Some("the drawable was destroyed".into()), ErrorKind::Swap)
            })?;
            let entry = state.registry.get(&binding.context).ok_or(ErrorKind::Swap)?;

            if entry.state == ContextState::Lost {
                return Err(Error::new(
                    None,
                    Some("the context was lost and must be created again".into()),
                    ErrorKind::Swap,
                ));
            }

            if entry.state == ContextState::Suspended {
                warn!("presenting with context {} in state {:?}", binding.context.id(), entry.state);
            }

            (surface.raw, entry.raw)
        };

        // Don't hold the lock while the presentation waits for the display.
        self.api.swap_buffers(surface, context).map_err(|err| err.with_kind(ErrorKind::Swap))
    }

    /// Set the swap interval of the calling thread's current context.
    pub fn set_swap_interval(&self, interval: SwapInterval) -> Result<()> {
        let thread = thread::current().id();

        let mut guard = self.state();
        let state = &mut *guard;

        let binding = state.bindings.get(thread).copied().ok_or_else(|| {
            Error::new(
                None,
                Some("no context is current on the calling thread".into()),
                ErrorKind::Swap,
            )
        })?;
        let surface = state.surfaces.get(&binding.window).ok_or_else(|| {
            Error::new(None, Some("the drawable was destroyed".into()), ErrorKind::Swap)
        })?;

        self.api
            .set_swap_interval(surface.raw, interval)
            .map_err(|err| err.with_kind(ErrorKind::Swap))?;

        if let Some(entry) = state.registry.get_mut(&binding.context) {
            entry.swap_interval = interval;
        }
        Ok(())
    }

    /// The swap interval of the calling thread's current context.
    pub fn swap_interval(&self) -> Option<SwapInterval> {
        let state = self.state();
        let binding = state.bindings.get(thread::current().id())?;
        state.registry.get(&binding.context).map(|entry| entry.swap_interval)
    }

    /// The calling thread's current context.
    pub fn current_context(&self) -> Option<GraphicsContext> {
        self.state().bindings.get(thread::current().id()).map(|binding| binding.context)
    }

    /// The window targeted by the calling thread's current context.
    pub fn current_window(&self) -> Option<WindowId> {
        self.state().bindings.get(thread::current().id()).map(|binding| binding.window)
    }

    /// The thread `context` is current on.
    pub fn thread_of(&self, context: &GraphicsContext) -> Option<ThreadId> {
        self.state().bindings.thread_of(context)
    }

    /// The share group of `context`, `None` when it was deleted.
    pub fn share_group(&self, context: &GraphicsContext) -> Option<ShareGroup> {
        self.state().registry.get(context).map(|entry| entry.share_group)
    }

    /// The interruption state of `context`, `None` when it was deleted.
    pub fn context_state(&self, context: &GraphicsContext) -> Option<ContextState> {
        self.state().registry.get(context).map(|entry| entry.state)
    }

    /// Size of the drawable of `window`, `None` when it has none.
    pub fn drawable_size(&self, window: WindowId) -> Option<(NonZeroU32, NonZeroU32)> {
        self.state().surfaces.get(&window).map(|surface| (surface.width, surface.height))
    }

    /// Set an attribute for the contexts created from now on.
    pub fn set_attribute(&self, attr: GlAttr, value: i32) -> Result<()> {
        self.attributes().set(attr, value)
    }

    /// The value of `attr` used for the next context.
    pub fn attribute(&self, attr: GlAttr) -> i32 {
        self.attributes().get(attr)
    }

    /// Reset every attribute to its default.
    pub fn reset_attributes(&self) {
        *self.attributes() = GlAttributes::default();
    }

    /// Whether the application is in the background.
    pub fn is_suspended(&self) -> bool {
        self.monitor.is_suspended()
    }

    /// Deliver a lifecycle notification from the platform.
    ///
    /// After the application is back in the foreground every rendering
    /// thread must call [`Self::restore_current_context`] before issuing GL
    /// calls.
    pub fn handle_app_event(&self, event: AppEvent) {
        let transition = self.monitor.notify(event);
        let (from, to) = match transition {
            Transition::Suspended => (ContextState::Active, ContextState::Suspended),
            Transition::Resumed => (ContextState::Suspended, ContextState::Active),
            Transition::Unchanged => return,
        };

        let moved = self.state().registry.transition(from, to);
        debug!("{event:?}: {moved} contexts {to:?}");
    }

    /// The window-management component resized `window`.
    pub fn window_resized(&self, window: WindowId, width: NonZeroU32, height: NonZeroU32) {
        let mut state = self.state();
        if let Some(surface) = state.surfaces.get_mut(&window) {
            surface.width = width;
            surface.height = height;
            self.api.resize_surface(surface.raw, width, height);
        }
    }

    /// The window-management component destroyed `window`.
    ///
    /// Contexts targeting it stay current, presenting fails until they are
    /// made current with another window.
    pub fn window_destroyed(&self, window: WindowId) {
        let surface = self.state().surfaces.remove(&window);
        if let Some(surface) = surface {
            self.api.destroy_surface(surface.raw);
            debug!("destroyed drawable of window {:?}", surface.window);
        }
    }

    fn ensure_surface(
        &self,
        state: &mut DriverState,
        window: &Window,
        attributes: &GlAttributes,
    ) -> Result<RawSurface> {
        if let Some(surface) = state.surfaces.get(&window.id()) {
            return Ok(surface.raw);
        }

        let raw = self.api.create_surface(window, attributes)?;
        state.surfaces.insert(window.id(), DrawableSurface::new(window.id(), raw, window.size()));
        debug!("created drawable for window {:?}", window.id());
        Ok(raw)
    }

    fn state(&self) -> MutexGuard<'_, DriverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn symbols(&self) -> MutexGuard<'_, SymbolResolver> {
        self.symbols.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attributes(&self) -> MutexGuard<'_, GlAttributes> {
        self.attributes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A: NativeApi> Drop for Driver<A> {
    fn drop(&mut self) {
        let thread = thread::current().id();
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);

        if state.bindings.get(thread).is_some() {
            if let Err(err) = self.api.make_current(None, None) {
                warn!("failed to release the current context: {err}");
            }
        }
        if state.bindings.len() > 1 {
            warn!("driver dropped with contexts current on other threads");
        }

        for (_, entry) in state.registry.drain() {
            self.api.destroy_context(entry.raw);
        }
        for (_, surface) in state.surfaces.drain() {
            self.api.destroy_surface(surface.raw);
        }

        let symbols = self.symbols.get_mut().unwrap_or_else(PoisonError::into_inner);
        if symbols.is_loaded() {
            while !symbols.unload() {}
            self.api.library_unloaded();
        }
    }
}
