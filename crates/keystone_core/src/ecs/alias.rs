//! # Scene Aliases
//!
//! Raw handle values are session-local: a freshly loaded scene may issue
//! different handles than the run that saved it. Scene files therefore
//! name entities by alias (`entity3_PlayerTag`) and this table maps the
//! aliases back to whatever handles the current session issued.

use std::collections::HashMap;

use super::handle::Handle;
use crate::error::{StorageError, StorageResult};

/// Bidirectional alias/handle side table.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    by_alias: HashMap<String, Handle>,
    by_handle: HashMap<Handle, String>,
    next_ordinal: usize,
}

impl AliasTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a fresh alias to a handle, for saving.
    ///
    /// Aliases take the form `entity{n}_{tag}` (`entity{n}` without a
    /// tag), where `n` counts up per table. A handle that already has an
    /// alias keeps it.
    pub fn assign(&mut self, handle: Handle, tag: &str) -> &str {
        if !self.by_handle.contains_key(&handle) {
            let alias = loop {
                let ordinal = self.next_ordinal;
                self.next_ordinal += 1;
                let alias = if tag.is_empty() {
                    format!("entity{ordinal}")
                } else {
                    format!("entity{ordinal}_{tag}")
                };
                if !self.by_alias.contains_key(&alias) {
                    break alias;
                }
            };
            self.by_alias.insert(alias.clone(), handle);
            self.by_handle.insert(handle, alias);
        }
        &self.by_handle[&handle]
    }

    /// Binds an alias read from a scene file to a handle issued on load.
    ///
    /// # Errors
    ///
    /// - [`StorageError::DuplicateAlias`] if the alias is already bound
    /// - [`StorageError::HandleInUse`] if the handle already has an alias
    pub fn bind(&mut self, alias: impl Into<String>, handle: Handle) -> StorageResult<()> {
        let alias = alias.into();
        if self.by_alias.contains_key(&alias) {
            return Err(StorageError::DuplicateAlias(alias));
        }
        if self.by_handle.contains_key(&handle) {
            return Err(StorageError::HandleInUse(handle));
        }
        self.by_alias.insert(alias.clone(), handle);
        self.by_handle.insert(handle, alias);
        Ok(())
    }

    /// Resolves an alias to its handle.
    #[inline]
    #[must_use]
    pub fn resolve(&self, alias: &str) -> Option<Handle> {
        self.by_alias.get(alias).copied()
    }

    /// Returns the alias of a handle.
    #[inline]
    #[must_use]
    pub fn alias_of(&self, handle: Handle) -> Option<&str> {
        self.by_handle.get(&handle).map(String::as_str)
    }

    /// Returns the number of bound aliases.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_alias.len()
    }

    /// Returns `true` if no alias is bound.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_alias.is_empty()
    }

    /// Iterates over `(alias, handle)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Handle)> {
        self.by_alias
            .iter()
            .map(|(alias, handle)| (alias.as_str(), *handle))
    }
}
