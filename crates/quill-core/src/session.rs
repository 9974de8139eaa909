use serde::Deserialize;

use crate::ids::{ContainerId, DocumentRootId, NotebookId, SessionId};

/// Instance tag carried by document editor views.
pub const EDITOR_INSTANCE: &str = "Editor";

/// What kind of view a session displays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionKind {
    /// A document editor. The only kind identity-based commands touch.
    Editor,
    /// Any other panel (graph, outline, search, extension tab...).
    Other(String),
}

impl SessionKind {
    fn from_instance(instance: &str) -> Self {
        if instance == EDITOR_INSTANCE {
            Self::Editor
        } else {
            Self::Other(instance.to_owned())
        }
    }
}

/// Identity attached to a session when its view is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionIdentity {
    pub kind: SessionKind,
    pub root_id: Option<DocumentRootId>,
    pub notebook_id: Option<NotebookId>,
}

/// Legacy init-data blob stored on tab headers.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitData {
    instance: String,
    #[serde(default)]
    root_id: Option<DocumentRootId>,
    #[serde(default)]
    notebook_id: Option<NotebookId>,
}

impl SessionIdentity {
    pub fn editor(root_id: DocumentRootId, notebook_id: NotebookId) -> Self {
        Self {
            kind: SessionKind::Editor,
            root_id: Some(root_id),
            notebook_id: Some(notebook_id),
        }
    }

    pub fn other(instance: impl Into<String>) -> Self {
        Self {
            kind: SessionKind::Other(instance.into()),
            root_id: None,
            notebook_id: None,
        }
    }

    /// Parse the string-encoded init data a view was created with.
    ///
    /// Returns `None` when the blob is not valid JSON or lacks an `instance`;
    /// such sessions are treated as non-document views.
    pub fn from_init_data(raw: &str) -> Option<Self> {
        let data: InitData = serde_json::from_str(raw).ok()?;
        Some(Self {
            kind: SessionKind::from_instance(&data.instance),
            root_id: data.root_id,
            notebook_id: data.notebook_id,
        })
    }

    pub fn is_editor(&self) -> bool {
        self.kind == SessionKind::Editor
    }
}

/// One open view, held by a layout container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    /// Layout container holding this view. Relation only.
    pub owner: ContainerId,
    pub title: String,
    pub identity: Option<SessionIdentity>,
}

impl Session {
    pub fn new(owner: ContainerId, title: impl Into<String>, identity: Option<SessionIdentity>) -> Self {
        Self {
            id: SessionId::new(),
            owner,
            title: title.into(),
            identity,
        }
    }

    /// Build a session from its legacy init-data attribute.
    pub fn from_init_data(owner: ContainerId, title: impl Into<String>, init_data: &str) -> Self {
        Self::new(owner, title, SessionIdentity::from_init_data(init_data))
    }

    pub fn is_document_view(&self) -> bool {
        self.identity.as_ref().is_some_and(SessionIdentity::is_editor)
    }

    /// Document root, only for document views.
    pub fn document_root(&self) -> Option<&DocumentRootId> {
        self.identity
            .as_ref()
            .filter(|i| i.is_editor())
            .and_then(|i| i.root_id.as_ref())
    }

    /// Notebook, only for document views.
    pub fn notebook(&self) -> Option<&NotebookId> {
        self.identity
            .as_ref()
            .filter(|i| i.is_editor())
            .and_then(|i| i.notebook_id.as_ref())
    }
}
