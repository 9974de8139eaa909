//! Recording fakes for the collaborator traits.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use quill_core::config::{AppConfig, ThemeLink};
use quill_core::errors::{ApiError, ExtensionError};
use quill_core::ids::{ContainerId, ExtensionId, SessionId};
use quill_core::links::OpenRequest;
use quill_core::message::{MergeResult, RawMessage};
use serde_json::{Map, Value};
use tokio::sync::oneshot;

use crate::api::{ConfResponse, ServerApi};
use crate::extensions::{Extension, ExtensionLoader, ExtensionSet};
use crate::surfaces::{BootHooks, ReconcileOptions, Surfaces};

pub struct RecordingExtension {
    id: ExtensionId,
    events: Mutex<Vec<(String, Value)>>,
}

impl RecordingExtension {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: ExtensionId::from(id),
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn events(&self) -> Vec<(String, Value)> {
        self.events.lock().clone()
    }
}

impl Extension for RecordingExtension {
    fn id(&self) -> &ExtensionId {
        &self.id
    }

    fn emit(&self, event: &str, detail: &Value) {
        self.events.lock().push((event.to_owned(), detail.clone()));
    }
}

pub struct FakeLoader {
    enabled: Vec<ExtensionId>,
    failing: HashSet<ExtensionId>,
    listing_fails: bool,
    handles: Mutex<HashMap<ExtensionId, Arc<RecordingExtension>>>,
    reloads: Mutex<Vec<ExtensionId>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl FakeLoader {
    pub fn new(enabled: &[&str]) -> Self {
        Self {
            enabled: enabled.iter().map(|s| ExtensionId::from(*s)).collect(),
            failing: HashSet::new(),
            listing_fails: false,
            handles: Mutex::new(HashMap::new()),
            reloads: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
        }
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(ExtensionId::from(id));
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    /// Hold `enabled()` until the returned sender fires.
    pub fn gate(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock() = Some(rx);
        tx
    }

    /// Most recent handle created for `id`.
    pub fn handle(&self, id: &str) -> Option<Arc<RecordingExtension>> {
        self.handles.lock().get(&ExtensionId::from(id)).cloned()
    }

    pub fn reloads(&self) -> Vec<ExtensionId> {
        self.reloads.lock().clone()
    }

    fn create(&self, id: &ExtensionId) -> Result<Arc<dyn Extension>, ExtensionError> {
        if self.failing.contains(id) {
            return Err(ExtensionError::InitFailed {
                id: id.clone(),
                reason: "boom".into(),
            });
        }
        let ext = RecordingExtension::new(id.as_str());
        self.handles.lock().insert(id.clone(), Arc::clone(&ext));
        Ok(ext)
    }
}

#[async_trait]
impl ExtensionLoader for FakeLoader {
    async fn enabled(&self) -> Result<Vec<ExtensionId>, ExtensionError> {
        let gate = self.gate.lock().take();
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        if self.listing_fails {
            return Err(ExtensionError::Listing("offline".into()));
        }
        Ok(self.enabled.clone())
    }

    async fn load(&self, id: &ExtensionId) -> Result<Arc<dyn Extension>, ExtensionError> {
        self.create(id)
    }

    async fn reload(&self, id: &ExtensionId) -> Result<Arc<dyn Extension>, ExtensionError> {
        self.reloads.lock().push(id.clone());
        self.create(id)
    }
}

pub struct FakeApi {
    conf: ConfResponse,
    languages: Map<String, Value>,
    user: Option<Value>,
    emojis: Vec<Value>,
    errors: Mutex<HashMap<&'static str, ApiError>>,
    gates: Mutex<HashMap<&'static str, oneshot::Receiver<()>>>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            conf: ConfResponse::default(),
            languages: Map::new(),
            user: None,
            emojis: Vec::new(),
            errors: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_conf(mut self, conf: AppConfig, start: bool) -> Self {
        self.conf = ConfResponse { conf, start };
        self
    }

    pub fn with_languages(mut self, languages: Value) -> Self {
        if let Value::Object(map) = languages {
            self.languages = map;
        }
        self
    }

    pub fn with_user(mut self, user: Value) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_emojis(mut self, emojis: Vec<Value>) -> Self {
        self.emojis = emojis;
        self
    }

    /// Make `call` fail with `error`.
    pub fn failing(self, call: &'static str, error: ApiError) -> Self {
        self.errors.lock().insert(call, error);
        self
    }

    /// Hold `call` until the returned sender fires.
    pub fn gate(&self, call: &'static str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().insert(call, rx);
        tx
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    async fn enter(&self, call: &'static str) -> Result<(), ApiError> {
        self.calls.lock().push(call);
        let gate = self.gates.lock().remove(call);
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        match self.errors.lock().get(call) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ServerApi for FakeApi {
    async fn get_conf(&self) -> Result<ConfResponse, ApiError> {
        self.enter("get_conf").await?;
        Ok(self.conf.clone())
    }

    async fn get_languages(&self, _lang: &str) -> Result<Map<String, Value>, ApiError> {
        self.enter("get_languages").await?;
        Ok(self.languages.clone())
    }

    async fn get_cloud_user(&self) -> Result<Option<Value>, ApiError> {
        self.enter("get_cloud_user").await?;
        Ok(self.user.clone())
    }

    async fn get_emoji_conf(&self) -> Result<Vec<Value>, ApiError> {
        self.enter("get_emoji_conf").await?;
        Ok(self.emojis.clone())
    }

    async fn boot_sync(&self) -> Result<(), ApiError> {
        self.enter("boot_sync").await
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceCall {
    Reconcile(MergeResult, ReconcileOptions),
    HideElements(Vec<String>),
    Progress(RawMessage),
    Status(RawMessage),
    Download(Value),
    TransactionError,
    Sync(RawMessage, Vec<ExtensionId>),
    BackgroundTasks(Vec<Value>),
    Theme(ThemeLink, String),
    Open(OpenRequest),
    Close(ContainerId, SessionId),
    Retitle(SessionId, String),
}

#[derive(Default)]
pub struct RecordingSurfaces {
    calls: Mutex<Vec<SurfaceCall>>,
}

impl RecordingSurfaces {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().clone()
    }

    fn push(&self, call: SurfaceCall) {
        self.calls.lock().push(call);
    }
}

impl Surfaces for RecordingSurfaces {
    fn reconcile(&self, result: &MergeResult, options: ReconcileOptions) {
        self.push(SurfaceCall::Reconcile(result.clone(), options));
    }

    fn hide_elements(&self, kinds: &[&str]) {
        self.push(SurfaceCall::HideElements(kinds.iter().map(|k| k.to_string()).collect()));
    }

    fn progress_loading(&self, message: &RawMessage) {
        self.push(SurfaceCall::Progress(message.clone()));
    }

    fn progress_status(&self, message: &RawMessage) {
        self.push(SurfaceCall::Status(message.clone()));
    }

    fn download_progress(&self, data: &Value) {
        self.push(SurfaceCall::Download(data.clone()));
    }

    fn transaction_error(&self) {
        self.push(SurfaceCall::TransactionError);
    }

    fn sync_progress(&self, message: &RawMessage, extensions: &ExtensionSet) {
        self.push(SurfaceCall::Sync(message.clone(), extensions.names()));
    }

    fn background_tasks(&self, tasks: &[Value]) {
        self.push(SurfaceCall::BackgroundTasks(tasks.to_vec()));
    }

    fn set_theme_link(&self, link: ThemeLink, href: &str) {
        self.push(SurfaceCall::Theme(link, href.to_owned()));
    }

    fn open_document(&self, request: &OpenRequest) {
        self.push(SurfaceCall::Open(request.clone()));
    }

    fn close_session(&self, owner: &ContainerId, session: &SessionId) {
        self.push(SurfaceCall::Close(owner.clone(), session.clone()));
    }

    fn retitle_session(&self, session: &SessionId, title: &str) {
        self.push(SurfaceCall::Retitle(session.clone(), title.to_owned()));
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum HookCall {
    BuildMenus,
    ConfigReady { readonly: bool, started: bool },
    Account(Option<Value>),
    Title(String),
    InitMessages,
}

#[derive(Default)]
pub struct RecordingHooks {
    calls: Mutex<Vec<HookCall>>,
}

impl RecordingHooks {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<HookCall> {
        self.calls.lock().clone()
    }
}

impl BootHooks for RecordingHooks {
    fn build_menus(&self) {
        self.calls.lock().push(HookCall::BuildMenus);
    }

    fn on_config_ready(&self, config: &AppConfig, started: bool) {
        self.calls.lock().push(HookCall::ConfigReady {
            readonly: config.readonly,
            started,
        });
    }

    fn apply_account(&self, user: Option<&Value>) {
        self.calls.lock().push(HookCall::Account(user.cloned()));
    }

    fn set_title(&self, title: &str) {
        self.calls.lock().push(HookCall::Title(title.to_owned()));
    }

    fn init_messages(&self) {
        self.calls.lock().push(HookCall::InitMessages);
    }
}
