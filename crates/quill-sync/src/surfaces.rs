//! UI-facing seams. The sync engine never renders anything itself; it hands
//! forwards, reconciliation requests and layout changes to these traits.

use quill_core::config::{AppConfig, ThemeLink};
use quill_core::ids::{ContainerId, SessionId};
use quill_core::links::OpenRequest;
use quill_core::message::{MergeResult, RawMessage};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::extensions::ExtensionSet;

/// How a document reconciliation pass should treat the open views.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Suppress the notice the reconcile pass would otherwise show.
    pub hide_message: bool,
    /// Restore scroll position and focus after reloading.
    pub restore_view_state: bool,
}

impl ReconcileOptions {
    /// Reconciliation after a sync merge. The merge already reported itself,
    /// so the pass stays silent and keeps scroll position and focus.
    pub fn after_merge() -> Self {
        Self {
            hide_message: true,
            restore_view_state: true,
        }
    }

    /// Reload of a single changed document without view-state restoration.
    pub fn single_document() -> Self {
        Self {
            hide_message: false,
            restore_view_state: false,
        }
    }
}

/// Everything a dispatcher reaction can ask the UI to do.
pub trait Surfaces: Send + Sync {
    fn reconcile(&self, result: &MergeResult, options: ReconcileOptions);
    /// Hide floating elements tagged with any of `kinds`.
    fn hide_elements(&self, kinds: &[&str]);
    fn progress_loading(&self, message: &RawMessage);
    fn progress_status(&self, message: &RawMessage);
    fn download_progress(&self, data: &Value);
    fn transaction_error(&self);
    fn sync_progress(&self, message: &RawMessage, extensions: &ExtensionSet);
    fn background_tasks(&self, tasks: &[Value]);
    fn set_theme_link(&self, link: ThemeLink, href: &str);
    fn open_document(&self, request: &OpenRequest);
    /// Detach a session from the container holding it.
    fn close_session(&self, owner: &ContainerId, session: &SessionId);
    fn retitle_session(&self, session: &SessionId, title: &str);
}

/// Finalisation steps run once boot fetches have joined.
pub trait BootHooks: Send + Sync {
    fn build_menus(&self);
    /// `started` is true when the server itself has just started.
    fn on_config_ready(&self, config: &AppConfig, started: bool);
    fn apply_account(&self, user: Option<&Value>);
    fn set_title(&self, title: &str);
    fn init_messages(&self);
}

/// Headless surfaces that only log. Used by the CLI.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSurfaces;

impl Surfaces for TracingSurfaces {
    fn reconcile(&self, result: &MergeResult, options: ReconcileOptions) {
        info!(
            upsert = result.upsert_root_ids.len(),
            remove = result.remove_root_ids.len(),
            restore_view_state = options.restore_view_state,
            "reconcile documents"
        );
    }

    fn hide_elements(&self, kinds: &[&str]) {
        debug!(?kinds, "hide elements");
    }

    fn progress_loading(&self, message: &RawMessage) {
        info!(code = message.code(), msg = message.msg(), "progress");
    }

    fn progress_status(&self, message: &RawMessage) {
        info!(msg = message.msg(), "status");
    }

    fn download_progress(&self, data: &Value) {
        debug!(%data, "download progress");
    }

    fn transaction_error(&self) {
        warn!("transaction failed on the server");
    }

    fn sync_progress(&self, message: &RawMessage, extensions: &ExtensionSet) {
        info!(code = message.code(), msg = message.msg(), extensions = extensions.len(), "syncing");
    }

    fn background_tasks(&self, tasks: &[Value]) {
        debug!(count = tasks.len(), "background tasks");
    }

    fn set_theme_link(&self, link: ThemeLink, href: &str) {
        info!(element = link.element_id(), href, "theme link updated");
    }

    fn open_document(&self, request: &OpenRequest) {
        info!(id = %request.id, zoom_in = request.zoom_in, "open document");
    }

    fn close_session(&self, owner: &ContainerId, session: &SessionId) {
        info!(%owner, %session, "close session");
    }

    fn retitle_session(&self, session: &SessionId, title: &str) {
        info!(%session, title, "retitle session");
    }
}

impl BootHooks for TracingSurfaces {
    fn build_menus(&self) {
        debug!("menus built");
    }

    fn on_config_ready(&self, config: &AppConfig, started: bool) {
        info!(lang = %config.appearance.lang, readonly = config.readonly, started, "configuration applied");
    }

    fn apply_account(&self, user: Option<&Value>) {
        info!(signed_in = user.is_some(), "account applied");
    }

    fn set_title(&self, title: &str) {
        info!(title, "title set");
    }

    fn init_messages(&self) {
        debug!("message subsystem ready");
    }
}
