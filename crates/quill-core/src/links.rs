use url::Url;

use crate::ids::DocumentRootId;

pub const BLOCK_SCHEME: &str = "siyuan";

/// What an editor should load and restore when a document opens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusIntent {
    All,
    Focus,
    Context,
    RootScroll,
}

/// A request to open a document view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenRequest {
    pub id: DocumentRootId,
    pub intents: Vec<FocusIntent>,
    pub zoom_in: bool,
}

impl OpenRequest {
    /// Open with focus only; used for server-initiated opens.
    pub fn focus(id: DocumentRootId) -> Self {
        Self {
            id,
            intents: vec![FocusIntent::Focus],
            zoom_in: false,
        }
    }
}

/// Parse a `siyuan://blocks/<id>` link. `focus=1` zooms into the block.
pub fn parse_open_url(raw: &str) -> Option<OpenRequest> {
    let url = Url::parse(raw).ok()?;
    if url.scheme() != BLOCK_SCHEME || url.host_str() != Some("blocks") {
        return None;
    }
    let id = url.path().trim_start_matches('/');
    if id.is_empty() {
        return None;
    }
    let zoom_in = url.query_pairs().any(|(k, v)| k == "focus" && v == "1");
    let intents = if zoom_in {
        vec![FocusIntent::All, FocusIntent::Focus]
    } else {
        vec![FocusIntent::Focus, FocusIntent::Context, FocusIntent::RootScroll]
    };
    Some(OpenRequest {
        id: DocumentRootId::from(id),
        intents,
        zoom_in,
    })
}
