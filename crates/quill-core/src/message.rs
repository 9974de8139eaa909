//! Inbound channel messages.
//!
//! The server pushes `{ "cmd": ..., "data": ... }` frames. [`RawMessage`] is
//! the decoded frame as delivered by the channel; [`Command`] is the closed set
//! of commands the dispatcher understands, each with a typed payload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::errors::DecodeError;
use crate::ids::{DocumentRootId, ExtensionId, NotebookId};

/// One decoded frame from the push channel.
///
/// Serializing a `RawMessage` reproduces the frame the server sent. `code`
/// and `msg` are only written back when the frame carried them, and fields
/// the client does not interpret are kept in `extra`. `data` is always
/// written, as `null` when the frame had none.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    pub cmd: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    /// Frame fields outside the decoded set (`sid`, `reqId`, `callback`, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RawMessage {
    pub fn new(cmd: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            cmd: cmd.into(),
            data,
            code: None,
            msg: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Status code, zero when the frame has none.
    pub fn code(&self) -> i64 {
        self.code.unwrap_or(0)
    }

    /// Human-readable message, empty when the frame has none.
    pub fn msg(&self) -> &str {
        self.msg.as_deref().unwrap_or_default()
    }
}

/// Document roots touched by a sync merge.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    #[serde(rename = "upsertRootIDs", default)]
    pub upsert_root_ids: Vec<DocumentRootId>,
    #[serde(rename = "removeRootIDs", default)]
    pub remove_root_ids: Vec<DocumentRootId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RenamePayload {
    pub id: DocumentRootId,
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UnmountPayload {
    #[serde(rename = "box")]
    pub notebook: NotebookId,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RemoveDocsPayload {
    pub ids: Vec<DocumentRootId>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StorageValuePayload {
    pub key: String,
    #[serde(default)]
    pub val: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BackgroundTasksPayload {
    #[serde(default)]
    pub tasks: Vec<serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ThemePayload {
    pub theme: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct OpenDocumentPayload {
    pub id: DocumentRootId,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReloadTarget {
    Bare(ExtensionId),
    Named { name: ExtensionId },
}

/// Every command the dispatcher reacts to.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    ExtensionReload(ExtensionId),
    LocaleRefresh,
    SyncMergeResult(MergeResult),
    DocumentChanged(DocumentRootId),
    ReadOnlyPatch(bool),
    ConfigReplace(Box<AppConfig>),
    Progress(RawMessage),
    PersistedValueSet(StorageValuePayload),
    SessionRename(RenamePayload),
    NotebookUnmounted(UnmountPayload),
    DocumentsRemoved(RemoveDocsPayload),
    StatusBar(RawMessage),
    DownloadProgress(serde_json::Value),
    TransactionError,
    SyncInProgress(RawMessage),
    BackgroundTasks(BackgroundTasksPayload),
    ThemeRefresh(ThemePayload),
    OpenDocument(OpenDocumentPayload),
    /// Tag this build does not know. Ignored by the dispatcher.
    Unknown(String),
}

fn payload<T: DeserializeOwned>(raw: &RawMessage) -> Result<T, DecodeError> {
    serde_json::from_value(raw.data.clone()).map_err(|source| DecodeError {
        cmd: raw.cmd.clone(),
        source,
    })
}

impl Command {
    /// Classify a raw frame. Unknown tags never fail.
    pub fn decode(raw: &RawMessage) -> Result<Self, DecodeError> {
        let cmd = match raw.cmd.as_str() {
            "reloadPlugin" => {
                let id = match payload::<ReloadTarget>(raw)? {
                    ReloadTarget::Bare(id) | ReloadTarget::Named { name: id } => id,
                };
                Self::ExtensionReload(id)
            }
            "reloadEmojiConf" => Self::LocaleRefresh,
            "syncMergeResult" => Self::SyncMergeResult(payload(raw)?),
            "reloaddoc" => Self::DocumentChanged(payload(raw)?),
            "readonly" => Self::ReadOnlyPatch(payload(raw)?),
            "setConf" => Self::ConfigReplace(Box::new(payload(raw)?)),
            "progress" => Self::Progress(raw.clone()),
            "setLocalStorageVal" => Self::PersistedValueSet(payload(raw)?),
            "rename" => Self::SessionRename(payload(raw)?),
            "unmount" => Self::NotebookUnmounted(payload(raw)?),
            "removeDoc" => Self::DocumentsRemoved(payload(raw)?),
            "statusbar" => Self::StatusBar(raw.clone()),
            "downloadProgress" => Self::DownloadProgress(raw.data.clone()),
            "txerr" => Self::TransactionError,
            "syncing" => Self::SyncInProgress(raw.clone()),
            "backgroundtask" => Self::BackgroundTasks(payload(raw)?),
            "refreshtheme" => Self::ThemeRefresh(payload(raw)?),
            "openFileById" => Self::OpenDocument(payload(raw)?),
            other => Self::Unknown(other.to_owned()),
        };
        Ok(cmd)
    }

    /// Wire tag, for logging.
    pub fn tag(&self) -> &str {
        match self {
            Self::ExtensionReload(_) => "reloadPlugin",
            Self::LocaleRefresh => "reloadEmojiConf",
            Self::SyncMergeResult(_) => "syncMergeResult",
            Self::DocumentChanged(_) => "reloaddoc",
            Self::ReadOnlyPatch(_) => "readonly",
            Self::ConfigReplace(_) => "setConf",
            Self::Progress(_) => "progress",
            Self::PersistedValueSet(_) => "setLocalStorageVal",
            Self::SessionRename(_) => "rename",
            Self::NotebookUnmounted(_) => "unmount",
            Self::DocumentsRemoved(_) => "removeDoc",
            Self::StatusBar(_) => "statusbar",
            Self::DownloadProgress(_) => "downloadProgress",
            Self::TransactionError => "txerr",
            Self::SyncInProgress(_) => "syncing",
            Self::BackgroundTasks(_) => "backgroundtask",
            Self::ThemeRefresh(_) => "refreshtheme",
            Self::OpenDocument(_) => "openFileById",
            Self::Unknown(tag) => tag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(cmd: &str, data: serde_json::Value) -> Command {
        Command::decode(&RawMessage::new(cmd, data)).unwrap()
    }

    #[test]
    fn raw_message_parses_wire_frame() {
        let raw: RawMessage =
            serde_json::from_str(r#"{"cmd":"txerr","code":0,"msg":"","data":null,"sid":"s1"}"#).unwrap();
        assert_eq!(raw.cmd, "txerr");
        assert!(raw.data.is_null());
    }

    #[test]
    fn raw_message_without_data() {
        let raw: RawMessage = serde_json::from_str(r#"{"cmd":"reloadEmojiConf"}"#).unwrap();
        assert_eq!(Command::decode(&raw).unwrap(), Command::LocaleRefresh);
    }

    #[test]
    fn reload_plugin_accepts_name_object_and_bare_string() {
        assert_eq!(
            decode("reloadPlugin", json!({"name": "calendar"})),
            Command::ExtensionReload("calendar".into())
        );
        assert_eq!(
            decode("reloadPlugin", json!("calendar")),
            Command::ExtensionReload("calendar".into())
        );
    }

    #[test]
    fn sync_merge_result_payload() {
        let cmd = decode(
            "syncMergeResult",
            json!({"upsertRootIDs": ["a", "b"], "removeRootIDs": ["c"]}),
        );
        let Command::SyncMergeResult(result) = cmd else {
            panic!("expected SyncMergeResult, got {cmd:?}");
        };
        assert_eq!(result.upsert_root_ids, vec![DocumentRootId::from("a"), "b".into()]);
        assert_eq!(result.remove_root_ids, vec![DocumentRootId::from("c")]);
    }

    #[test]
    fn reloaddoc_carries_bare_root_id() {
        assert_eq!(
            decode("reloaddoc", json!("root-1")),
            Command::DocumentChanged("root-1".into())
        );
    }

    #[test]
    fn identity_payloads() {
        assert_eq!(
            decode("rename", json!({"id": "r1", "title": "New"})),
            Command::SessionRename(RenamePayload { id: "r1".into(), title: "New".into() })
        );
        assert_eq!(
            decode("unmount", json!({"box": "nb"})),
            Command::NotebookUnmounted(UnmountPayload { notebook: "nb".into() })
        );
        assert_eq!(
            decode("removeDoc", json!({"ids": ["x", "y"]})),
            Command::DocumentsRemoved(RemoveDocsPayload { ids: vec!["x".into(), "y".into()] })
        );
    }

    #[test]
    fn set_conf_is_full_config() {
        let cmd = decode("setConf", json!({"readonly": true, "appearance": {"mode": 1}}));
        let Command::ConfigReplace(config) = cmd else {
            panic!("expected ConfigReplace");
        };
        assert!(config.readonly);
    }

    #[test]
    fn forwards_keep_whole_message() {
        let raw = RawMessage {
            cmd: "progress".into(),
            data: json!({"current": 1, "total": 3}),
            code: Some(1),
            msg: Some("indexing".into()),
            extra: serde_json::Map::new(),
        };
        assert_eq!(Command::decode(&raw).unwrap(), Command::Progress(raw.clone()));
    }

    #[test]
    fn frame_reencodes_unchanged() {
        let wire = json!({
            "cmd": "progress",
            "code": 0,
            "msg": "",
            "data": {"n": 1},
            "sid": "s1",
            "reqId": 7
        });
        let raw: RawMessage = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(raw.code(), 0);
        assert_eq!(raw.msg(), "");
        assert_eq!(raw.extra["sid"], "s1");
        assert_eq!(serde_json::to_value(&raw).unwrap(), wire);

        let bare = json!({"cmd": "txerr", "data": null});
        let raw: RawMessage = serde_json::from_value(bare.clone()).unwrap();
        assert_eq!(serde_json::to_value(&raw).unwrap(), bare);
    }

    #[test]
    fn unknown_tag_is_not_an_error() {
        let cmd = decode("somethingNew", json!({"x": 1}));
        assert_eq!(cmd, Command::Unknown("somethingNew".into()));
        assert_eq!(cmd.tag(), "somethingNew");
    }

    #[test]
    fn malformed_known_payload_is_error() {
        let err = Command::decode(&RawMessage::new("rename", json!({"id": 5}))).unwrap_err();
        assert_eq!(err.cmd, "rename");
        assert!(err.to_string().contains("rename"));

        assert!(Command::decode(&RawMessage::new("readonly", json!("yes"))).is_err());
    }

    #[test]
    fn tag_matches_wire_name() {
        for cmd in [
            "reloadEmojiConf", "txerr", "readonly", "statusbar", "downloadProgress",
        ] {
            let data = if cmd == "readonly" { json!(true) } else { json!({}) };
            assert_eq!(decode(cmd, data).tag(), cmd);
        }
    }
}
