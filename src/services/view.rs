//! Resources a view holds only while it is on screen.
//!
//! Both the page title and the global key listeners are released through
//! `Drop`, so every way of dismissing a view gives them back exactly once.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

/// A global key press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Escape,
    Enter,
}

/// What a listener asks the session to do when its key fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerAction {
    CloseDetail,
    FocusSearch,
}

struct PageTitleInner {
    current: String,
    default: String,
    changes: u64,
}

/// The window title shared by every view
#[derive(Clone)]
pub struct PageTitle {
    inner: Arc<Mutex<PageTitleInner>>,
}

impl PageTitle {
    pub fn new(default: impl Into<String>) -> Self {
        let default = default.into();
        Self {
            inner: Arc::new(Mutex::new(PageTitleInner {
                current: default.clone(),
                default,
                changes: 0,
            })),
        }
    }

    pub fn current(&self) -> String {
        self.lock().current.clone()
    }

    /// Number of times the title has been written
    pub fn changes(&self) -> u64 {
        self.lock().changes
    }

    /// Sets "Movie | <title>" until the returned guard is dropped
    pub fn show_movie(&self, title: &str) -> TitleGuard {
        self.set(format!("Movie | {}", title));
        TitleGuard { page: self.clone() }
    }

    fn set(&self, title: String) {
        let mut inner = self.lock();
        tracing::debug!(from = %inner.current, to = %title, "Page title changed");
        inner.current = title;
        inner.changes += 1;
    }

    fn restore(&self) {
        let default = self.lock().default.clone();
        self.set(default);
    }

    fn lock(&self) -> MutexGuard<'_, PageTitleInner> {
        // The title is plain data; a poisoned lock still holds a usable value
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Restores the default page title when dropped
pub struct TitleGuard {
    page: PageTitle,
}

impl std::fmt::Debug for TitleGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TitleGuard").finish_non_exhaustive()
    }
}

impl Drop for TitleGuard {
    fn drop(&mut self) {
        self.page.restore();
    }
}

struct Listener {
    id: u64,
    key: Key,
    action: ListenerAction,
}

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    listeners: Vec<Listener>,
}

/// Registry of global keyboard listeners
#[derive(Clone, Default)]
pub struct KeyListeners {
    table: Arc<Mutex<ListenerTable>>,
}

impl KeyListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener that stays active until the registration is dropped
    pub fn register(&self, key: Key, action: ListenerAction) -> ListenerRegistration {
        let mut table = self.lock();
        let id = table.next_id;
        table.next_id += 1;
        table.listeners.push(Listener { id, key, action });
        tracing::debug!(?key, ?action, id, "Key listener registered");

        ListenerRegistration {
            id,
            listeners: self.clone(),
        }
    }

    /// Actions of every live listener bound to `key`, in registration order
    pub fn dispatch(&self, key: Key) -> Vec<ListenerAction> {
        self.lock()
            .listeners
            .iter()
            .filter(|l| l.key == key)
            .map(|l| l.action)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn unregister(&self, id: u64) {
        self.lock().listeners.retain(|l| l.id != id);
        tracing::debug!(id, "Key listener removed");
    }

    fn lock(&self) -> MutexGuard<'_, ListenerTable> {
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Removes its listener when dropped
pub struct ListenerRegistration {
    id: u64,
    listeners: KeyListeners,
}

impl std::fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistration").field("id", &self.id).finish()
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        self.listeners.unregister(self.id);
    }
}
