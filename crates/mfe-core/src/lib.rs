//! Core abstractions for micro-frontend coordination.
//!
//! This crate provides the fundamental building blocks:
//! - `Participant` - Closed set of known execution contexts
//! - `Message` - Addressed, typed inter-participant message
//! - `MessageBus` - Single-slot broadcast register
//! - `Product` - Catalog item model shared by all participants
//! - `ActivityJournal` - Bounded diagnostics log

pub mod bus;
pub mod journal;
pub mod message;
pub mod participant;
pub mod product;

pub use bus::{BusEvent, MessageBus, Subscription};
pub use journal::{ActivityEntry, ActivityJournal, ActivityKind};
pub use message::{AddToCart, CartCountUpdated, CartOperation, Message, Navigate, Payload};
pub use participant::Participant;
pub use product::{Product, demo_catalog};
