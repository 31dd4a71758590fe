//! Context handles and the registry owning their native state.

use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::surface::SwapInterval;
use crate::window::WindowId;

/// Opaque native context handle, e.g. an `EGLContext`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawContext(*const c_void);

// The handle is only an identifier, thread affinity is enforced by the tracker.
unsafe impl Send for RawContext {}
unsafe impl Sync for RawContext {}

impl RawContext {
    pub const fn new(raw: *const c_void) -> Self {
        Self(raw)
    }

    pub const fn as_ptr(self) -> *const c_void {
        self.0
    }
}

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_SHARE_GROUP: AtomicU64 = AtomicU64::new(1);

/// A handle to a context created by a [`Driver`].
///
/// The handle doesn't own the context, it stays alive until it's passed to
/// [`Driver::delete_context`].
///
/// [`Driver`]: crate::driver::Driver
/// [`Driver::delete_context`]: crate::driver::Driver::delete_context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphicsContext {
    id: u64,
}

impl GraphicsContext {
    fn next() -> Self {
        Self { id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed) }
    }

    /// Unique id of the context for the lifetime of the process.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// A set of contexts sharing textures and buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShareGroup(u64);

impl ShareGroup {
    fn next() -> Self {
        Self(NEXT_SHARE_GROUP.fetch_add(1, Ordering::Relaxed))
    }
}

/// The interruption state of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextState {
    /// The context can be rendered with.
    Active,

    /// The application is in the background, the native context may be
    /// invalidated at any point.
    Suspended,

    /// Restoring the context after an interruption failed, it must be
    /// deleted and created again.
    Lost,
}

#[derive(Debug)]
pub(crate) struct ContextEntry {
    pub(crate) raw: RawContext,
    pub(crate) window: WindowId,
    pub(crate) share_group: ShareGroup,
    pub(crate) state: ContextState,
    pub(crate) swap_interval: SwapInterval,
}

/// Owner of every live context of a driver.
#[derive(Debug, Default)]
pub(crate) struct ContextRegistry {
    contexts: HashMap<GraphicsContext, ContextEntry>,
}

impl ContextRegistry {
    pub(crate) fn insert(
        &mut self,
        raw: RawContext,
        window: WindowId,
        share_group: Option<ShareGroup>,
        state: ContextState,
        swap_interval: SwapInterval,
    ) -> GraphicsContext {
        let context = GraphicsContext::next();
        let share_group = share_group.unwrap_or_else(ShareGroup::next);
        self.contexts
            .insert(context, ContextEntry { raw, window, share_group, state, swap_interval });
        context
    }

    pub(crate) fn remove(&mut self, context: &GraphicsContext) -> Option<ContextEntry> {
        self.contexts.remove(context)
    }

    pub(crate) fn get(&self, context: &GraphicsContext) -> Option<&ContextEntry> {
        self.contexts.get(context)
    }

    pub(crate) fn get_mut(&mut self, context: &GraphicsContext) -> Option<&mut ContextEntry> {
        self.contexts.get_mut(context)
    }

    /// Any live context, the one to join when the platform has a single
    /// shared namespace.
    pub(crate) fn any(&self) -> Option<&ContextEntry> {
        self.contexts.values().next()
    }

    pub(crate) fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Move every context in state `from` to state `to`.
    pub(crate) fn transition(&mut self, from: ContextState, to: ContextState) -> usize {
        let mut moved = 0;
        for entry in self.contexts.values_mut().filter(|entry| entry.state == from) {
            entry.state = to;
            moved += 1;
        }
        moved
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = (GraphicsContext, ContextEntry)> + '_ {
        self.contexts.drain()
    }
}
