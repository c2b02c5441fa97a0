//! The UI surface a watcher is bound to.
//!
//! A destroyed surface stops the watcher; a hidden one suspends polling.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::shared::errors::CommandResult;

pub trait Surface: Send + Sync {
    /// True once the surface is gone for good
    fn is_destroyed(&self) -> bool;

    /// False while hidden or minimized
    fn is_visible(&self) -> bool;

    /// Ask the UI to get out of the way after a paste
    fn dismiss(&self) -> CommandResult<()>;
}

/// Surface with no window behind it: used by the daemon and by tests
#[derive(Debug)]
pub struct HeadlessSurface {
    destroyed: AtomicBool,
    visible: AtomicBool,
    dismissals: AtomicUsize,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self {
            destroyed: AtomicBool::new(false),
            visible: AtomicBool::new(true),
            dismissals: AtomicUsize::new(0),
        }
    }
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }

    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }

    pub fn dismissals(&self) -> usize {
        self.dismissals.load(Ordering::SeqCst)
    }
}

impl Surface for HeadlessSurface {
    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn is_visible(&self) -> bool {
        !self.is_destroyed() && self.visible.load(Ordering::SeqCst)
    }

    fn dismiss(&self) -> CommandResult<()> {
        // Nothing to hide
        self.dismissals.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destroyed_surface_is_never_visible() {
        let surface = HeadlessSurface::new();
        assert!(surface.is_visible());
        surface.destroy();
        assert!(surface.is_destroyed());
        assert!(!surface.is_visible());
    }

    #[test]
    fn dismiss_is_counted_and_keeps_polling_visible() {
        let surface = HeadlessSurface::new();
        surface.dismiss().unwrap();
        assert!(surface.is_visible());
        assert_eq!(surface.dismissals(), 1);
    }
}
