//! One-time startup orchestration.
//!
//! ```text
//! Idle → FetchingConfig → FetchingDependents → AwaitingAll
//!      → RequestingSync (skipped when read-only) → Finalizing → Ready
//! ```
//!
//! The dependent fetches run as independent tasks, each writing a distinct
//! field of [`AppState`], and are joined before finalisation. No timeout is
//! applied: a fetch that never resolves holds the sequence in `AwaitingAll`.

use std::sync::Arc;

use futures::future::OptionFuture;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::dispatcher::Collaborators;
use crate::error::BootError;
use crate::extensions;
use crate::state::AppState;
use crate::surfaces::BootHooks;

/// Locale key holding the application name.
pub const APP_NAME_KEY: &str = "siyuanNote";
/// Title used when the locale table has no application name.
pub const FALLBACK_TITLE: &str = "SiYuan";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootPhase {
    Idle,
    FetchingConfig,
    FetchingDependents,
    AwaitingAll,
    RequestingSync,
    Finalizing,
    Ready,
}

/// What boot produced.
#[derive(Debug)]
pub struct BootReport {
    pub read_only: bool,
    pub extensions: usize,
    pub restored_keys: usize,
    pub signed_in: bool,
    /// Boot sync request, when one was issued. Never awaited by boot itself.
    pub sync_task: Option<JoinHandle<()>>,
}

pub struct BootSequencer {
    state: Arc<AppState>,
    deps: Collaborators,
    hooks: Arc<dyn BootHooks>,
    phase: watch::Sender<BootPhase>,
}

impl BootSequencer {
    pub fn new(state: Arc<AppState>, deps: Collaborators, hooks: Arc<dyn BootHooks>) -> Self {
        let (phase, _) = watch::channel(BootPhase::Idle);
        Self {
            state,
            deps,
            hooks,
            phase,
        }
    }

    pub fn phase(&self) -> BootPhase {
        *self.phase.borrow()
    }

    /// Observe phase transitions while `run` is in flight.
    pub fn subscribe(&self) -> watch::Receiver<BootPhase> {
        self.phase.subscribe()
    }

    fn enter(&self, phase: BootPhase) {
        info!(?phase, "boot phase");
        self.phase.send_replace(phase);
    }

    /// Run the sequence. Consumes the sequencer: boot happens once.
    pub async fn run(self) -> Result<BootReport, BootError> {
        self.enter(BootPhase::FetchingConfig);
        let response = self.deps.api.get_conf().await.map_err(BootError::Config)?;
        let started = response.start;
        let read_only = response.conf.readonly;
        let lang = response.conf.appearance.lang.clone();
        *self.state.config.write() = response.conf;
        info!(read_only, %lang, "configuration received");

        self.enter(BootPhase::FetchingDependents);
        let extensions_task = self.spawn_extensions();
        let restore_task = self.spawn_restore();
        let languages_task = self.spawn_languages(lang);
        let user_task = (!read_only).then(|| self.spawn_user());

        self.enter(BootPhase::AwaitingAll);
        let (extensions, restored, languages, signed_in) = tokio::join!(
            extensions_task,
            restore_task,
            languages_task,
            OptionFuture::from(user_task),
        );
        let extensions = extensions?;
        let restored_keys = restored?.map_err(BootError::Restore)?;
        languages?.map_err(BootError::Languages)?;
        let signed_in = signed_in.transpose()?.unwrap_or(false);

        let sync_task = if read_only {
            None
        } else {
            self.enter(BootPhase::RequestingSync);
            Some(self.spawn_boot_sync())
        };

        self.enter(BootPhase::Finalizing);
        self.finalize(started);

        self.enter(BootPhase::Ready);
        Ok(BootReport {
            read_only,
            extensions,
            restored_keys,
            signed_in,
            sync_task,
        })
    }

    fn spawn_extensions(&self) -> JoinHandle<usize> {
        let loader = Arc::clone(&self.deps.loader);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let set = extensions::load_all(loader.as_ref()).await;
            let count = set.len();
            *state.extensions.write() = set;
            count
        })
    }

    /// The store read is synchronous, so it runs on the blocking pool.
    fn spawn_restore(&self) -> JoinHandle<Result<usize, quill_store::StoreError>> {
        let store = Arc::clone(&self.deps.store);
        let state = Arc::clone(&self.state);
        tokio::task::spawn_blocking(move || {
            let values = store.load_all()?;
            let count = values.len();
            *state.storage.write() = values;
            Ok(count)
        })
    }

    fn spawn_languages(&self, lang: String) -> JoinHandle<Result<(), quill_core::ApiError>> {
        let api = Arc::clone(&self.deps.api);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let languages = api.get_languages(&lang).await?;
            *state.languages.write() = languages;
            Ok(())
        })
    }

    /// A failed account lookup leaves the user signed out.
    fn spawn_user(&self) -> JoinHandle<bool> {
        let api = Arc::clone(&self.deps.api);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            match api.get_cloud_user().await {
                Ok(user) => {
                    let signed_in = user.is_some();
                    *state.user.write() = user;
                    signed_in
                }
                Err(e) => {
                    warn!(error = %e, kind = e.error_kind(), "cloud user fetch failed");
                    false
                }
            }
        })
    }

    fn spawn_boot_sync(&self) -> JoinHandle<()> {
        let api = Arc::clone(&self.deps.api);
        tokio::spawn(async move {
            if let Err(e) = api.boot_sync().await {
                warn!(error = %e, kind = e.error_kind(), "boot sync request failed");
            }
        })
    }

    fn finalize(&self, started: bool) {
        let config = self.state.config();
        self.hooks.build_menus();
        self.hooks.on_config_ready(&config, started);
        let user: Option<Value> = self.state.user.read().clone();
        self.hooks.apply_account(user.as_ref());
        let title = self
            .state
            .text(APP_NAME_KEY)
            .unwrap_or_else(|| FALLBACK_TITLE.to_owned());
        self.hooks.set_title(&title);
        self.hooks.init_messages();
    }
}
