//! Fragment resolution.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use thiserror::Error;

use mfe_core::Participant;

/// A live unit of UI functionality obtained from a participant.
///
/// Rendering is the host's concern; the runtime contract only needs an
/// opaque, droppable handle. Dropping the instance tears it down.
pub trait Fragment: Send + Sync {
    /// Name the fragment was registered under.
    fn name(&self) -> &str;
}

impl std::fmt::Debug for dyn Fragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fragment").field("name", &self.name()).finish()
    }
}

/// Load error.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Fragment {fragment:?} not found in {participant}")]
    NotFound {
        participant: Participant,
        fragment: String,
    },
    #[error("Participant unavailable: {0}")]
    Unavailable(String),
    #[error("Fragment {fragment:?} from {participant} is incompatible: {reason}")]
    Incompatible {
        participant: Participant,
        fragment: String,
        reason: String,
    },
}

/// Trait for late-bound fragment resolution.
///
/// Address and version of the providing participant are unknown until
/// resolution time; that late binding is the point.
#[async_trait]
pub trait FragmentResolver: Send + Sync {
    /// Resolve and instantiate a fragment by participant and name.
    async fn resolve(
        &self,
        participant: Participant,
        fragment: &str,
    ) -> Result<Box<dyn Fragment>, LoadError>;
}

type FragmentFactory = Arc<dyn Fn() -> Result<Box<dyn Fragment>, LoadError> + Send + Sync>;

/// Capability-based runtime registry of fragment factories.
///
/// Participants register what they expose at composition time; the
/// shell resolves purely by name.
pub struct FragmentRegistry {
    factories: RwLock<HashMap<(Participant, String), FragmentFactory>>,
}

impl FragmentRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Register a factory under `(participant, fragment)`. A repeated
    /// registration replaces the previous factory.
    pub fn register<F>(&self, participant: Participant, fragment: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Box<dyn Fragment>, LoadError> + Send + Sync + 'static,
    {
        self.factories
            .write()
            .unwrap()
            .insert((participant, fragment.into()), Arc::new(factory));
    }
}

impl Default for FragmentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FragmentResolver for FragmentRegistry {
    async fn resolve(
        &self,
        participant: Participant,
        fragment: &str,
    ) -> Result<Box<dyn Fragment>, LoadError> {
        let factory = self
            .factories
            .read()
            .unwrap()
            .get(&(participant, fragment.to_owned()))
            .cloned();

        match factory {
            Some(factory) => factory(),
            None => Err(LoadError::NotFound {
                participant,
                fragment: fragment.to_owned(),
            }),
        }
    }
}
