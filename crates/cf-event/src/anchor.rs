//! Anchors
//!
//! An anchor is the world object a voice follows. The host owns anchors;
//! voices only observe them through a `Weak` reference, so an anchor may
//! disappear between any two ticks.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use cf_core::{Position, origin};
use parking_lot::Mutex;

/// Host-side view of a world object
pub trait Anchor: Send + Sync {
    /// Current world position
    fn position(&self) -> Position;

    /// Movement counter, bumped whenever the position changes
    ///
    /// Readers compare against the value they last saw; reading never
    /// resets anything, so any number of voices may share one anchor.
    fn revision(&self) -> u64;

    /// Whether the object is still alive. Dropping the last strong
    /// reference also counts as death.
    fn is_alive(&self) -> bool {
        true
    }
}

/// Owning reference held by the host
pub type AnchorRef = Arc<dyn Anchor>;

/// Non-owning reference held by voices
pub type WeakAnchor = Weak<dyn Anchor>;

/// Upgrade a weak anchor, treating a despawned anchor as gone
#[inline]
pub fn live_anchor(anchor: &WeakAnchor) -> Option<AnchorRef> {
    anchor.upgrade().filter(|a| a.is_alive())
}

// ═══════════════════════════════════════════════════════════════════════════════
// GLOBAL ANCHOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Fixed anchor at the origin for non-positional (2D) playback
#[derive(Debug, Default)]
pub struct GlobalAnchor;

impl Anchor for GlobalAnchor {
    fn position(&self) -> Position {
        origin()
    }

    fn revision(&self) -> u64 {
        0
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRACKED ANCHOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Ready-made anchor for hosts without their own transform type
#[derive(Debug)]
pub struct TrackedAnchor {
    position: Mutex<Position>,
    revision: AtomicU64,
    alive: AtomicBool,
}

impl TrackedAnchor {
    pub fn new(position: Position) -> Arc<Self> {
        Arc::new(Self {
            position: Mutex::new(position),
            revision: AtomicU64::new(0),
            alive: AtomicBool::new(true),
        })
    }

    pub fn set_position(&self, position: Position) {
        let mut current = self.position.lock();
        if *current != position {
            *current = position;
            self.revision.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Mark dead while strong references still exist
    pub fn despawn(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl Anchor for TrackedAnchor {
    fn position(&self) -> Position {
        *self.position.lock()
    }

    fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}
