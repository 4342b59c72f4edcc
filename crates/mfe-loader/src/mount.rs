//! Host-provided mount points.

use crate::resolver::Fragment;

/// What currently occupies a mount point.
pub enum MountContent {
    /// Nothing mounted yet.
    Empty,
    /// The degraded placeholder shown after a failed load.
    Fallback,
    /// A live fragment.
    Live(Box<dyn Fragment>),
}

/// A slot in the host UI that holds at most one fragment.
///
/// The generation counter advances on every teardown, letting an
/// in-flight load detect that its target was cleared or repopulated
/// while it was resolving.
pub struct MountPoint {
    content: MountContent,
    generation: u64,
}

impl MountPoint {
    /// Create an empty mount point.
    #[must_use]
    pub fn new() -> Self {
        Self {
            content: MountContent::Empty,
            generation: 0,
        }
    }

    /// Current teardown generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a live fragment is mounted.
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self.content, MountContent::Live(_))
    }

    /// Whether the fallback placeholder is showing.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self.content, MountContent::Fallback)
    }

    /// Name of the mounted fragment, if one is live.
    #[must_use]
    pub fn fragment_name(&self) -> Option<&str> {
        match &self.content {
            MountContent::Live(fragment) => Some(fragment.name()),
            _ => None,
        }
    }

    /// Tear down the occupant, leaving the slot empty.
    pub fn clear(&mut self) {
        self.replace(MountContent::Empty);
    }

    /// Tear down the occupant and show the degraded placeholder.
    pub fn show_fallback(&mut self) {
        self.replace(MountContent::Fallback);
    }

    /// Tear down the occupant and mount `fragment`.
    pub fn insert(&mut self, fragment: Box<dyn Fragment>) {
        self.replace(MountContent::Live(fragment));
    }

    // Previous occupant is dropped (torn down) before the new content
    // becomes observable; there is never a moment with two fragments.
    fn replace(&mut self, content: MountContent) {
        self.content = content;
        self.generation += 1;
    }
}

impl Default for MountPoint {
    fn default() -> Self {
        Self::new()
    }
}
