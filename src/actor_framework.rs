use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::error::StoreError;

// =============================================================================
// 1. THE ABSTRACTION (Traits with Hooks, DTOs, and Actions)
// =============================================================================

/// Trait that any domain entity must implement to be stored in a [`Table`].
///
/// Ids are strings of the form `{PREFIX}_{n}`, allocated by the table.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Collection name, also used as the id prefix.
    const PREFIX: &'static str;

    type CreatePayload: Send + Debug;
    type Patch: Send + Debug;

    // --- Custom Actions ---
    type Action: Send + Debug;
    type ActionResult: Send + Debug;

    /// Domain error raised by hooks and actions.
    type Error: std::error::Error + Into<StoreError>;

    /// Construct the full Entity from the allocated id and the payload
    fn from_create(id: String, payload: Self::CreatePayload) -> Result<Self, Self::Error>;

    // --- Lifecycle Hooks ---

    fn on_create(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn on_update(&mut self, patch: Self::Patch) -> Result<(), Self::Error>;
    fn on_delete(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    // --- Action Handler ---

    /// Handle a domain-specific action. On `Err` the table restores the row.
    fn handle_action(&mut self, action: Self::Action) -> Result<Self::ActionResult, Self::Error>;
}

// =============================================================================
// 2. THE JOURNALED TABLE
// =============================================================================

/// In-memory collection of one entity type.
///
/// Every write records the previous version of the row in a journal so an
/// enclosing transaction can be undone with [`Table::rollback`].
#[derive(Debug)]
pub struct Table<T: Entity> {
    rows: BTreeMap<String, T>,
    journal: Vec<(String, Option<T>)>,
    next_id: u64,
}

impl<T: Entity> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Table<T> {
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            journal: Vec::new(),
            next_id: 1,
        }
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.rows.get(id)
    }

    pub fn find_first(&self, predicate: impl Fn(&T) -> bool) -> Option<&T> {
        self.rows.values().find(|row| predicate(row))
    }

    pub fn create(&mut self, payload: T::CreatePayload) -> Result<String, StoreError> {
        let id = format!("{}_{}", T::PREFIX, self.next_id);
        self.next_id += 1;

        let mut item = T::from_create(id.clone(), payload).map_err(Into::<StoreError>::into)?;
        item.on_create().map_err(Into::<StoreError>::into)?;

        self.journal.push((id.clone(), None));
        self.rows.insert(id.clone(), item);
        Ok(id)
    }

    pub fn update(&mut self, id: &str, patch: T::Patch) -> Result<T, StoreError> {
        let item = self.rows.get_mut(id).ok_or_else(|| not_found::<T>(id))?;
        let before = item.clone();
        if let Err(e) = item.on_update(patch) {
            *item = before;
            return Err(e.into());
        }
        let after = item.clone();
        self.journal.push((id.to_string(), Some(before)));
        Ok(after)
    }

    pub fn delete(&mut self, id: &str) -> Result<T, StoreError> {
        let item = self.rows.get(id).ok_or_else(|| not_found::<T>(id))?;
        item.on_delete().map_err(Into::<StoreError>::into)?;
        let removed = self.rows.remove(id).ok_or_else(|| not_found::<T>(id))?;
        self.journal.push((id.to_string(), Some(removed.clone())));
        Ok(removed)
    }

    pub fn apply(&mut self, id: &str, action: T::Action) -> Result<T::ActionResult, StoreError> {
        let item = self.rows.get_mut(id).ok_or_else(|| not_found::<T>(id))?;
        let before = item.clone();
        match item.handle_action(action) {
            Ok(result) => {
                self.journal.push((id.to_string(), Some(before)));
                Ok(result)
            }
            Err(e) => {
                *item = before;
                Err(e.into())
            }
        }
    }

    /// Forget the journal, making every write since the last commit durable.
    pub fn commit(&mut self) {
        self.journal.clear();
    }

    /// Replay the journal backwards, restoring the rows as of the last commit.
    pub fn rollback(&mut self) {
        while let Some((id, previous)) = self.journal.pop() {
            match previous {
                Some(row) => {
                    self.rows.insert(id, row);
                }
                None => {
                    self.rows.remove(&id);
                }
            }
        }
    }
}

fn not_found<T: Entity>(id: &str) -> StoreError {
    StoreError::NotFound {
        collection: T::PREFIX,
        id: id.to_string(),
    }
}

// =============================================================================
// 3. EXAMPLE USAGE (Test)
// =============================================================================
