//! Tracking of the context current on each thread.

use std::collections::HashMap;
use std::thread::ThreadId;

use crate::context::GraphicsContext;
use crate::window::WindowId;

/// What a thread has bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Binding {
    pub(crate) context: GraphicsContext,
    pub(crate) window: WindowId,
    /// Suspend generation the native binding was last asserted in.
    pub(crate) generation: u64,
}

/// Mapping from thread identity to its current context.
///
/// A thread has at most one current context and a context is current on at
/// most one thread.
#[derive(Debug, Default)]
pub(crate) struct CurrentBindings {
    threads: HashMap<ThreadId, Binding>,
}

impl CurrentBindings {
    pub(crate) fn get(&self, thread: ThreadId) -> Option<&Binding> {
        self.threads.get(&thread)
    }

    pub(crate) fn get_mut(&mut self, thread: ThreadId) -> Option<&mut Binding> {
        self.threads.get_mut(&thread)
    }

    /// Bind `binding` to `thread`, returning the previous binding.
    ///
    /// The caller must make sure the context isn't current elsewhere.
    pub(crate) fn bind(&mut self, thread: ThreadId, binding: Binding) -> Option<Binding> {
        debug_assert!(self.thread_of(&binding.context).map_or(true, |owner| owner == thread));
        self.threads.insert(thread, binding)
    }

    pub(crate) fn clear(&mut self, thread: ThreadId) -> Option<Binding> {
        self.threads.remove(&thread)
    }

    /// The thread `context` is current on.
    pub(crate) fn thread_of(&self, context: &GraphicsContext) -> Option<ThreadId> {
        self.threads
            .iter()
            .find_map(|(thread, binding)| (binding.context == *context).then_some(*thread))
    }

    /// Unbind `context` from whatever thread has it current.
    pub(crate) fn release(&mut self, context: &GraphicsContext) -> Option<ThreadId> {
        let thread = self.thread_of(context)?;
        self.threads.remove(&thread);
        Some(thread)
    }

    pub(crate) fn len(&self) -> usize {
        self.threads.len()
    }
}
