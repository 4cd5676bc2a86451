//! Editing-session state machine for selection-driven corpus editing.
//!
//! The session tracks two keyed, order-preserving collections: the parent
//! entries of an aggregate and the child entries of whichever parent is
//! selected. Each level has one active slot holding a draft, the "on screen"
//! copy the caller edits. Every selection change commits the draft back under
//! the key it was loaded from before the new entry's fields are exposed, so
//! edits are never attributed to the wrong entry.

use std::fmt;
use std::hash::Hash;

use indexmap::IndexMap;
use thiserror::Error;

/// Errors raised by editing-session transitions and raw-input parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("an entry keyed '{key}' already exists")]
    IdentityConflict { key: String },
    #[error("no entry exists under key '{key}'")]
    UnknownKey { key: String },
    #[error("no entry is selected")]
    NothingSelected,
    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },
}

/// An entity addressable by a key derived from its own fields.
pub trait Keyed: Clone + fmt::Debug {
    type Key: Hash + Eq + Clone + fmt::Debug + fmt::Display;

    fn key(&self) -> Self::Key;
}

/// A parent entity owning the child collection edited one level down.
pub trait ParentEntity: Keyed {
    type Child: Keyed;

    fn children(&self) -> &[Self::Child];
    fn replace_children(&mut self, children: Vec<Self::Child>);
}

type ChildOf<P> = <P as ParentEntity>::Child;
type ChildKey<P> = <ChildOf<P> as Keyed>::Key;

#[derive(Debug, Clone)]
struct ActiveSlot<E: Keyed> {
    key: E::Key,
    draft: E,
}

/// Two-level selection-driven editor state for one aggregate.
#[derive(Debug, Clone)]
pub struct EditingSession<P: ParentEntity> {
    parents: IndexMap<P::Key, P>,
    children: IndexMap<ChildKey<P>, ChildOf<P>>,
    active_parent: Option<ActiveSlot<P>>,
    active_child: Option<ActiveSlot<ChildOf<P>>>,
}

impl<P: ParentEntity> Default for EditingSession<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ParentEntity> EditingSession<P> {
    pub fn new() -> Self {
        Self {
            parents: IndexMap::new(),
            children: IndexMap::new(),
            active_parent: None,
            active_child: None,
        }
    }

    /// Build a session over existing entries. Later duplicates of a key win,
    /// as when hydrating from a hand-edited document.
    pub fn load(parents: impl IntoIterator<Item = P>) -> Self {
        let mut session = Self::new();
        for parent in parents {
            session.parents.insert(parent.key(), parent);
        }
        session
    }

    pub fn parent_keys(&self) -> impl Iterator<Item = &P::Key> {
        self.parents.keys()
    }

    pub fn child_keys(&self) -> impl Iterator<Item = &ChildKey<P>> {
        self.children.keys()
    }

    /// Committed parent entries in insertion order.
    pub fn parents(&self) -> impl Iterator<Item = &P> {
        self.parents.values()
    }

    pub fn selected_parent(&self) -> Option<&P::Key> {
        self.active_parent.as_ref().map(|slot| &slot.key)
    }

    pub fn selected_child(&self) -> Option<&ChildKey<P>> {
        self.active_child.as_ref().map(|slot| &slot.key)
    }

    pub fn parent_draft(&self) -> Option<&P> {
        self.active_parent.as_ref().map(|slot| &slot.draft)
    }

    /// Mutable access to the on-screen parent fields.
    pub fn parent_draft_mut(&mut self) -> Option<&mut P> {
        self.active_parent.as_mut().map(|slot| &mut slot.draft)
    }

    pub fn child_draft(&self) -> Option<&ChildOf<P>> {
        self.active_child.as_ref().map(|slot| &slot.draft)
    }

    pub fn child_draft_mut(&mut self) -> Option<&mut ChildOf<P>> {
        self.active_child.as_mut().map(|slot| &mut slot.draft)
    }

    /// Switch the parent selection, committing in-progress edits first.
    ///
    /// On a commit conflict the transition aborts: the previous selection,
    /// drafts, and collections are left intact.
    pub fn select_parent(&mut self, key: Option<P::Key>) -> Result<(), SessionError> {
        if let Some(key) = &key {
            if !self.parents.contains_key(key) {
                return Err(SessionError::UnknownKey {
                    key: key.to_string(),
                });
            }
        }
        self.commit_child()?;
        self.commit_parent()?;

        self.children.clear();
        self.active_child = None;
        self.active_parent = None;
        if let Some(key) = key {
            // The commit above may have re-keyed the entry we were asked for.
            let Some(parent) = self.parents.get(&key) else {
                return Err(SessionError::UnknownKey {
                    key: key.to_string(),
                });
            };
            let draft = parent.clone();
            for child in draft.children() {
                self.children.insert(child.key(), child.clone());
            }
            self.active_parent = Some(ActiveSlot { key, draft });
        }
        Ok(())
    }

    /// Switch the child selection within the selected parent.
    pub fn select_child(&mut self, key: Option<ChildKey<P>>) -> Result<(), SessionError> {
        if key.is_some() && self.active_parent.is_none() {
            return Err(SessionError::NothingSelected);
        }
        if let Some(key) = &key {
            if !self.children.contains_key(key) {
                return Err(SessionError::UnknownKey {
                    key: key.to_string(),
                });
            }
        }
        self.commit_child()?;
        self.active_child = None;
        if let Some(key) = key {
            let Some(child) = self.children.get(&key) else {
                return Err(SessionError::UnknownKey {
                    key: key.to_string(),
                });
            };
            self.active_child = Some(ActiveSlot {
                draft: child.clone(),
                key,
            });
        }
        Ok(())
    }

    /// Insert a new parent entry; its derived key must be unused.
    pub fn add_parent(&mut self, parent: P) -> Result<P::Key, SessionError> {
        let key = parent.key();
        if self.parents.contains_key(&key) {
            return Err(SessionError::IdentityConflict {
                key: key.to_string(),
            });
        }
        self.parents.insert(key.clone(), parent);
        Ok(key)
    }

    /// Insert a new child under the selected parent; its derived key must be
    /// unused there.
    pub fn add_child(&mut self, child: ChildOf<P>) -> Result<ChildKey<P>, SessionError> {
        if self.active_parent.is_none() {
            return Err(SessionError::NothingSelected);
        }
        let key = child.key();
        if self.children.contains_key(&key) {
            return Err(SessionError::IdentityConflict {
                key: key.to_string(),
            });
        }
        self.children.insert(key.clone(), child);
        Ok(key)
    }

    /// Remove a parent entry. Removing the selected parent also discards its
    /// uncommitted child collection.
    pub fn remove_parent(&mut self, key: &P::Key) -> Option<P> {
        let removed = self.parents.shift_remove(key);
        if removed.is_some() && self.selected_parent() == Some(key) {
            self.active_parent = None;
            self.active_child = None;
            self.children.clear();
        }
        removed
    }

    pub fn remove_child(&mut self, key: &ChildKey<P>) -> Option<ChildOf<P>> {
        let removed = self.children.shift_remove(key);
        if removed.is_some() && self.selected_child() == Some(key) {
            self.active_child = None;
        }
        removed
    }

    /// Commit both drafts without changing the selection. Called before the
    /// aggregate is rebuilt for saving.
    pub fn commit(&mut self) -> Result<(), SessionError> {
        self.commit_child()?;
        self.commit_parent()
    }

    fn commit_child(&mut self) -> Result<(), SessionError> {
        let Some(slot) = self.active_child.as_mut() else {
            return Ok(());
        };
        let draft = slot.draft.clone();
        let new_key = draft.key();
        if new_key == slot.key {
            self.children.insert(new_key, draft);
            return Ok(());
        }
        // Editing key-bearing fields re-keys the entry in place.
        if self.children.contains_key(&new_key) {
            return Err(SessionError::IdentityConflict {
                key: new_key.to_string(),
            });
        }
        match self.children.get_index_of(&slot.key) {
            Some(index) => {
                self.children.shift_remove(&slot.key);
                self.children.shift_insert(index, new_key.clone(), draft);
            }
            None => {
                self.children.insert(new_key.clone(), draft);
            }
        }
        slot.key = new_key;
        Ok(())
    }

    fn commit_parent(&mut self) -> Result<(), SessionError> {
        let Some(slot) = self.active_parent.as_mut() else {
            return Ok(());
        };
        let mut draft = slot.draft.clone();
        draft.replace_children(self.children.values().cloned().collect());
        let new_key = draft.key();
        if new_key == slot.key {
            self.parents.insert(new_key, draft.clone());
            slot.draft = draft;
            return Ok(());
        }
        if self.parents.contains_key(&new_key) {
            return Err(SessionError::IdentityConflict {
                key: new_key.to_string(),
            });
        }
        match self.parents.get_index_of(&slot.key) {
            Some(index) => {
                self.parents.shift_remove(&slot.key);
                self.parents
                    .shift_insert(index, new_key.clone(), draft.clone());
            }
            None => {
                self.parents.insert(new_key.clone(), draft.clone());
            }
        }
        slot.key = new_key;
        slot.draft = draft;
        Ok(())
    }
}
