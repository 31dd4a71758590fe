//! Application lifecycle interruptions.
//!
//! Mobile platforms may invalidate the native context or its framebuffer
//! while the application is in the background, without telling the code
//! rendering with it. The monitor records those periods so the driver can
//! re-assert the thread bindings once the application is back.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Lifecycle notifications delivered by the platform lifecycle observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppEvent {
    /// The application is about to be moved to the background.
    WillEnterBackground,

    /// The application is in the background.
    DidEnterBackground,

    /// The application is about to be moved to the foreground.
    WillEnterForeground,

    /// The application is in the foreground and may render again.
    DidEnterForeground,
}

/// Transition caused by an [`AppEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    Suspended,
    Resumed,
    Unchanged,
}

/// Process-wide interruption state.
#[derive(Debug, Default)]
pub(crate) struct InterruptionMonitor {
    suspended: AtomicBool,
    /// Number of suspensions so far.
    generation: AtomicU64,
}

impl InterruptionMonitor {
    pub(crate) fn notify(&self, event: AppEvent) -> Transition {
        match event {
            AppEvent::WillEnterBackground | AppEvent::DidEnterBackground => self.suspend(),
            AppEvent::DidEnterForeground => self.resume(),
            AppEvent::WillEnterForeground => Transition::Unchanged,
        }
    }

    fn suspend(&self) -> Transition {
        if self.suspended.swap(true, Ordering::AcqRel) {
            return Transition::Unchanged;
        }

        self.generation.fetch_add(1, Ordering::AcqRel);
        Transition::Suspended
    }

    fn resume(&self) -> Transition {
        if self.suspended.swap(false, Ordering::AcqRel) {
            Transition::Resumed
        } else {
            Transition::Unchanged
        }
    }

    pub(crate) fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
