//! Message dispatcher. Reconciles server pushes against local state.
//!
//! Every raw frame is first broadcast to the loaded extensions, then decoded
//! into a [`Command`] and handled by exactly one reaction. Reaction failures
//! are logged and contained; `dispatch` itself never fails.

use std::sync::Arc;

use quill_core::ids::DocumentRootId;
use quill_core::links::{parse_open_url, OpenRequest};
use quill_core::message::{Command, MergeResult, RawMessage};
use tracing::{debug, info, warn};

use crate::api::ServerApi;
use crate::error::SyncError;
use crate::extensions::{ExtensionLoader, WS_MAIN_EVENT};
use crate::state::AppState;
use crate::store::KeyValueStore;
use crate::surfaces::{ReconcileOptions, Surfaces};

/// Element tag hidden when read-only mode flips.
const UTIL_ELEMENTS: &str = "util";

/// External collaborators shared by the dispatcher and the boot sequencer.
#[derive(Clone)]
pub struct Collaborators {
    pub api: Arc<dyn ServerApi>,
    pub loader: Arc<dyn ExtensionLoader>,
    pub store: Arc<dyn KeyValueStore>,
    pub surfaces: Arc<dyn Surfaces>,
}

pub struct Dispatcher {
    state: Arc<AppState>,
    deps: Collaborators,
}

impl Dispatcher {
    pub fn new(state: Arc<AppState>, deps: Collaborators) -> Self {
        Self { state, deps }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Handle one inbound frame to completion.
    pub async fn dispatch(&self, raw: RawMessage) {
        self.broadcast(&raw);

        let command = match Command::decode(&raw) {
            Ok(command) => command,
            Err(e) => {
                warn!(cmd = %raw.cmd, error = %e, "dropping malformed message");
                return;
            }
        };

        let tag = command.tag().to_owned();
        debug!(cmd = %tag, "dispatch");
        if let Err(e) = self.react(command).await {
            warn!(cmd = %tag, error = %e, "reaction failed");
        }
    }

    /// Open a `siyuan://blocks/...` link. Returns false for anything else.
    pub fn open_url(&self, url: &str) -> bool {
        match parse_open_url(url) {
            Some(request) => {
                self.deps.surfaces.open_document(&request);
                true
            }
            None => false,
        }
    }

    fn broadcast(&self, raw: &RawMessage) {
        let extensions = self.state.extensions_snapshot();
        if extensions.is_empty() {
            return;
        }
        match serde_json::to_value(raw) {
            Ok(detail) => extensions.broadcast(WS_MAIN_EVENT, &detail),
            Err(e) => warn!(cmd = %raw.cmd, error = %e, "could not encode message for extensions"),
        }
    }

    async fn react(&self, command: Command) -> Result<(), SyncError> {
        let surfaces = &self.deps.surfaces;
        match command {
            Command::ExtensionReload(id) => {
                let extension = self.deps.loader.reload(&id).await?;
                self.state.extensions.write().insert(extension);
                info!(extension = %id, "extension reloaded");
            }
            Command::LocaleRefresh => self.refresh_emojis(),
            Command::SyncMergeResult(result) => {
                surfaces.reconcile(&result, ReconcileOptions::after_merge());
            }
            Command::DocumentChanged(root) => {
                let result = MergeResult {
                    upsert_root_ids: vec![root],
                    remove_root_ids: Vec::new(),
                };
                surfaces.reconcile(&result, ReconcileOptions::single_document());
            }
            Command::ReadOnlyPatch(read_only) => {
                self.state.config.write().editor.read_only = read_only;
                surfaces.hide_elements(&[UTIL_ELEMENTS]);
            }
            Command::ConfigReplace(config) => {
                *self.state.config.write() = *config;
                info!("configuration replaced");
            }
            Command::Progress(message) => surfaces.progress_loading(&message),
            Command::PersistedValueSet(entry) => {
                self.state
                    .storage
                    .write()
                    .insert(entry.key.clone(), entry.val.clone());
                self.deps.store.set(&entry.key, &entry.val)?;
            }
            Command::SessionRename(rename) => {
                let renamed = self.state.sessions.write().rename_root(&rename.id, &rename.title);
                for id in &renamed {
                    surfaces.retitle_session(id, &rename.title);
                }
                debug!(root = %rename.id, count = renamed.len(), "sessions renamed");
            }
            Command::NotebookUnmounted(unmount) => {
                let removed = self.state.sessions.write().remove_notebook(&unmount.notebook);
                for session in &removed {
                    surfaces.close_session(&session.owner, &session.id);
                }
                debug!(notebook = %unmount.notebook, count = removed.len(), "notebook sessions closed");
            }
            Command::DocumentsRemoved(removed_docs) => {
                self.close_roots(&removed_docs.ids);
            }
            Command::StatusBar(message) => surfaces.progress_status(&message),
            Command::DownloadProgress(data) => surfaces.download_progress(&data),
            Command::TransactionError => surfaces.transaction_error(),
            Command::SyncInProgress(message) => {
                let extensions = self.state.extensions_snapshot();
                surfaces.sync_progress(&message, &extensions);
            }
            Command::BackgroundTasks(payload) => surfaces.background_tasks(&payload.tasks),
            Command::ThemeRefresh(theme) => {
                let link = self.state.config.read().theme_link_for_refresh();
                surfaces.set_theme_link(link, &theme.theme);
            }
            Command::OpenDocument(open) => {
                surfaces.open_document(&OpenRequest::focus(open.id));
            }
            Command::Unknown(tag) => {
                debug!(cmd = %tag, "ignoring unknown command");
            }
        }
        Ok(())
    }

    fn close_roots(&self, roots: &[DocumentRootId]) {
        let removed = self.state.sessions.write().remove_roots(roots);
        for session in &removed {
            self.deps.surfaces.close_session(&session.owner, &session.id);
        }
        debug!(roots = roots.len(), count = removed.len(), "document sessions closed");
    }

    /// Refetch the emoji configuration in the background. The cache is
    /// replaced whenever the response lands, possibly after later messages.
    fn refresh_emojis(&self) {
        let api = Arc::clone(&self.deps.api);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            match api.get_emoji_conf().await {
                Ok(emojis) => {
                    debug!(count = emojis.len(), "emoji configuration refreshed");
                    *state.emojis.write() = emojis;
                }
                Err(e) => warn!(error = %e, kind = e.error_kind(), "emoji refresh failed"),
            }
        });
    }
}
