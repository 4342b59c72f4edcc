//! Load-with-fallback front end over a resolver.

use std::sync::{Arc, Mutex};

use mfe_core::Participant;

use crate::mount::MountPoint;
use crate::resolver::FragmentResolver;

/// Receipt for a successfully mounted fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentHandle {
    pub participant: Participant,
    pub fragment: String,
    /// Mount generation at which this fragment became live.
    pub generation: u64,
}

/// Resolves fragments and populates mount points, substituting the
/// fallback view on any failure.
pub struct FragmentLoader {
    resolver: Arc<dyn FragmentResolver>,
}

impl FragmentLoader {
    #[must_use]
    pub fn new(resolver: Arc<dyn FragmentResolver>) -> Self {
        Self { resolver }
    }

    /// Resolve `fragment` from `participant` and mount it.
    ///
    /// Never raises: any resolution or instantiation failure is logged,
    /// the mount point shows the fallback, and `None` is returned.
    /// Safe to call repeatedly; the last successful call wins. A load
    /// whose mount point was torn down while resolving is dropped
    /// without touching the mount.
    pub async fn load(
        &self,
        participant: Participant,
        fragment: &str,
        mount: &Mutex<MountPoint>,
    ) -> Option<FragmentHandle> {
        let expected_generation = mount.lock().unwrap().generation();

        match self.resolver.resolve(participant, fragment).await {
            Ok(instance) => {
                let mut mount = mount.lock().unwrap();
                if mount.generation() != expected_generation {
                    tracing::warn!(
                        %participant,
                        fragment,
                        "Dropping stale fragment load; mount point changed while resolving"
                    );
                    return None;
                }
                mount.insert(instance);
                tracing::info!(%participant, fragment, "Fragment mounted");
                Some(FragmentHandle {
                    participant,
                    fragment: fragment.to_owned(),
                    generation: mount.generation(),
                })
            }
            Err(e) => {
                tracing::error!(%participant, fragment, "Failed to load fragment: {e}");
                let mut mount = mount.lock().unwrap();
                if mount.generation() == expected_generation {
                    mount.show_fallback();
                }
                None
            }
        }
    }
}
