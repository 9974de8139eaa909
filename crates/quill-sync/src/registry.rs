use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use quill_core::ids::{DocumentRootId, NotebookId, SessionId};
use quill_core::session::Session;

/// Open sessions keyed by id, with lookup indexes over the identity of
/// document views. Only document views are indexed, so identity-based
/// operations can never touch other panels.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
    by_root: HashMap<DocumentRootId, HashSet<SessionId>>,
    by_notebook: HashMap<NotebookId, HashSet<SessionId>>,
}

fn index_add<K: Eq + Hash + Clone>(index: &mut HashMap<K, HashSet<SessionId>>, key: &K, id: &SessionId) {
    index.entry(key.clone()).or_default().insert(id.clone());
}

fn index_remove<K: Eq + Hash>(index: &mut HashMap<K, HashSet<SessionId>>, key: &K, id: &SessionId) {
    if let Some(ids) = index.get_mut(key) {
        ids.remove(id);
        if ids.is_empty() {
            index.remove(key);
        }
    }
}

fn sorted(ids: impl IntoIterator<Item = SessionId>) -> Vec<SessionId> {
    let mut ids: Vec<SessionId> = ids.into_iter().collect();
    ids.sort();
    ids
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a session. A handle with the same id is replaced and returned.
    pub fn insert(&mut self, session: Session) -> Option<Session> {
        let previous = self.remove(&session.id);
        if let Some(root) = session.document_root() {
            index_add(&mut self.by_root, root, &session.id);
        }
        if let Some(notebook) = session.notebook() {
            index_add(&mut self.by_notebook, notebook, &session.id);
        }
        self.sessions.insert(session.id.clone(), session);
        previous
    }

    pub fn remove(&mut self, id: &SessionId) -> Option<Session> {
        let session = self.sessions.remove(id)?;
        if let Some(root) = session.document_root() {
            index_remove(&mut self.by_root, root, id);
        }
        if let Some(notebook) = session.notebook() {
            index_remove(&mut self.by_notebook, notebook, id);
        }
        Some(session)
    }

    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// All session ids, sorted.
    pub fn ids(&self) -> Vec<SessionId> {
        sorted(self.sessions.keys().cloned())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    /// Document views showing `root`, sorted by id.
    pub fn sessions_for_root(&self, root: &DocumentRootId) -> Vec<SessionId> {
        self.by_root
            .get(root)
            .map(|ids| sorted(ids.iter().cloned()))
            .unwrap_or_default()
    }

    /// Document views inside `notebook`, sorted by id.
    pub fn sessions_for_notebook(&self, notebook: &NotebookId) -> Vec<SessionId> {
        self.by_notebook
            .get(notebook)
            .map(|ids| sorted(ids.iter().cloned()))
            .unwrap_or_default()
    }

    /// Document views showing any of `roots`, sorted and deduplicated.
    pub fn sessions_for_roots(&self, roots: &[DocumentRootId]) -> Vec<SessionId> {
        let ids: HashSet<SessionId> = roots
            .iter()
            .filter_map(|root| self.by_root.get(root))
            .flatten()
            .cloned()
            .collect();
        sorted(ids)
    }

    /// Set the title of every document view showing `root`.
    /// Returns the ids that were retitled.
    pub fn rename_root(&mut self, root: &DocumentRootId, title: &str) -> Vec<SessionId> {
        let ids = self.sessions_for_root(root);
        for id in &ids {
            if let Some(session) = self.sessions.get_mut(id) {
                session.title = title.to_owned();
            }
        }
        ids
    }

    /// Drop every document view inside `notebook`. Returns the removed handles
    /// so the caller can detach them from their containers.
    pub fn remove_notebook(&mut self, notebook: &NotebookId) -> Vec<Session> {
        let ids = self.sessions_for_notebook(notebook);
        self.remove_all(&ids)
    }

    /// Drop every document view showing one of `roots`.
    pub fn remove_roots(&mut self, roots: &[DocumentRootId]) -> Vec<Session> {
        let ids = self.sessions_for_roots(roots);
        self.remove_all(&ids)
    }

    fn remove_all(&mut self, ids: &[SessionId]) -> Vec<Session> {
        ids.iter().filter_map(|id| self.remove(id)).collect()
    }
}
