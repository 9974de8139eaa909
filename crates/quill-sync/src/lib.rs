//! # quill-sync
//!
//! Client-side event synchronization: the boot sequencer that brings the
//! client to a ready state, the dispatcher that applies server-pushed
//! messages, and the session registry those reactions operate on.

pub mod api;
pub mod boot;
pub mod channel;
pub mod dispatcher;
pub mod error;
pub mod extensions;
pub mod registry;
pub mod state;
pub mod store;
pub mod surfaces;

#[cfg(test)]
mod testing;

pub use api::{ConfResponse, HttpServerApi, ServerApi};
pub use boot::{BootPhase, BootReport, BootSequencer};
pub use channel::{decode_line, run_channel, spawn_line_reader};
pub use dispatcher::{Collaborators, Dispatcher};
pub use error::{BootError, SyncError};
pub use extensions::{Extension, ExtensionLoader, ExtensionSet, WS_MAIN_EVENT};
pub use registry::SessionRegistry;
pub use state::AppState;
pub use store::KeyValueStore;
pub use surfaces::{BootHooks, ReconcileOptions, Surfaces, TracingSurfaces};
