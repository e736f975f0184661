//! Process-wide table of capability areas.
//!
//! Each area ("presentation", ...) has at most one owner at a time. An owner
//! registers a whole [`CapabilitySet`] in a single write and gets back a
//! [`RegistrationHandle`]; releasing that handle clears the area only if no
//! newer owner has registered since. Lookups clone the current set under the
//! read lock and call the operation after the lock is gone, so an invocation
//! racing a registration sees either the old set or the new one, never a mix.

use crate::error::CapabilityError;
use crate::tools::ToolResult;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub type Operation = Arc<dyn Fn(&Value) -> ToolResult + Send + Sync>;

/// Named operations contributed by one owner.
#[derive(Clone, Default)]
pub struct CapabilitySet {
    operations: HashMap<String, Operation>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, name: &str, operation: F) -> Self
    where
        F: Fn(&Value) -> ToolResult + Send + Sync + 'static,
    {
        self.operations.insert(name.to_string(), Arc::new(operation));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.operations.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.operations.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl std::fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilitySet").field("operations", &self.names()).finish()
    }
}

/// Proof of one registration. Pass it back to [`CapabilityRegistry::release`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping the handle leaves the registration in place"]
pub struct RegistrationHandle {
    area: String,
    generation: u64,
}

impl RegistrationHandle {
    pub fn area(&self) -> &str {
        &self.area
    }
}

struct Registered {
    generation: u64,
    set: Arc<CapabilitySet>,
}

#[derive(Default)]
pub struct CapabilityRegistry {
    areas: RwLock<HashMap<String, Registered>>,
    next_generation: AtomicU64,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Operations never run under the lock, so a poisoned lock still holds a
    // consistent map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Registered>> {
        self.areas.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Registered>> {
        self.areas.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Replaces whatever set `area` had. Visible to the next lookup.
    pub fn register(&self, area: &str, set: CapabilitySet) -> RegistrationHandle {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let operations = set.len();
        let previous = self.write().insert(
            area.to_string(),
            Registered {
                generation,
                set: Arc::new(set),
            },
        );
        tracing::debug!(
            area,
            generation,
            operations,
            replaced = previous.is_some(),
            "capability area registered"
        );
        RegistrationHandle {
            area: area.to_string(),
            generation,
        }
    }

    /// Clears the area if `handle` is still its current registration.
    /// Returns whether anything was cleared.
    pub fn release(&self, handle: RegistrationHandle) -> bool {
        let mut areas = self.write();
        let current = areas.get(&handle.area).map(|r| r.generation);
        if current == Some(handle.generation) {
            areas.remove(&handle.area);
            tracing::debug!(area = %handle.area, generation = handle.generation, "capability area released");
            true
        } else {
            tracing::debug!(
                area = %handle.area,
                generation = handle.generation,
                "stale release ignored"
            );
            false
        }
    }

    pub fn is_registered(&self, area: &str) -> bool {
        self.read().contains_key(area)
    }

    /// Operation names of the current owner, empty when unowned.
    pub fn operations(&self, area: &str) -> Vec<String> {
        self.read().get(area).map(|r| r.set.names()).unwrap_or_default()
    }

    fn current(&self, area: &str) -> Option<Arc<CapabilitySet>> {
        self.read().get(area).map(|r| r.set.clone())
    }

    pub fn try_invoke(&self, area: &str, operation: &str, args: &Value) -> Result<ToolResult, CapabilityError> {
        let set = self
            .current(area)
            .ok_or_else(|| CapabilityError::AreaUnavailable(area.to_string()))?;
        let op = set.get(operation).ok_or_else(|| CapabilityError::OperationMissing {
            area: area.to_string(),
            operation: operation.to_string(),
        })?;
        Ok(op(args))
    }

    /// Like [`try_invoke`](Self::try_invoke) but a miss becomes a failure result.
    pub fn invoke(&self, area: &str, operation: &str, args: &Value) -> ToolResult {
        match self.try_invoke(area, operation, args) {
            Ok(result) => result,
            Err(e) => {
                tracing::info!(area, operation, "capability unavailable: {}", e);
                ToolResult::failure(unavailable_message(&e)).with_field("unavailable", true)
            }
        }
    }
}

fn unavailable_message(error: &CapabilityError) -> String {
    match error {
        CapabilityError::AreaUnavailable(area) => {
            format!("That can't be done right now because nothing on screen provides the {area} controls.")
        }
        CapabilityError::OperationMissing { area, operation } => {
            format!("The {area} on screen does not support \"{operation}\".")
        }
    }
}
