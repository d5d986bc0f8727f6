//! Lifecycle Hooks
//!
//! Called by the data layer after a record is created, updated or deleted.
//! Each hook turns the mutation into invalidation calls on the façade. The
//! `spawn_*` variants run in the background so a slow or unreachable cache
//! never delays the write that triggered them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::facade::CacheFacade;

/// Kind of mutation the data layer performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// A completed write reported by the data layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationEvent {
    /// Resource class of the record
    pub class: String,
    /// Record identifier
    pub id: String,
    /// Record slug, when the class is also cached by slug
    #[serde(default)]
    pub slug: Option<String>,
    pub operation: Operation,
}

impl MutationEvent {
    pub fn new(class: impl Into<String>, id: impl Into<String>, operation: Operation) -> Self {
        Self {
            class: class.into(),
            id: id.into(),
            slug: None,
            operation,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }
}

// == Lifecycle Hooks ==
/// Translates mutation events into cache invalidations.
#[derive(Clone)]
pub struct LifecycleHooks {
    cache: Arc<CacheFacade>,
    /// Classes whose cached collections embed another class's records
    dependents: HashMap<String, Vec<String>>,
}

impl LifecycleHooks {
    pub fn new(cache: Arc<CacheFacade>) -> Self {
        Self {
            cache,
            dependents: HashMap::new(),
        }
    }

    /// Declares that a mutation of `class` also invalidates the collections
    /// of `dependents` (e.g. shop renames show up in cached event lists).
    pub fn with_dependents<I, S>(mut self, class: impl Into<String>, dependents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependents
            .entry(class.into())
            .or_default()
            .extend(dependents.into_iter().map(Into::into));
        self
    }

    pub async fn after_create(&self, class: &str, id: &str) -> u64 {
        self.on_mutation(&MutationEvent::new(class, id, Operation::Create))
            .await
    }

    pub async fn after_update(&self, class: &str, id: &str) -> u64 {
        self.on_mutation(&MutationEvent::new(class, id, Operation::Update))
            .await
    }

    pub async fn after_delete(&self, class: &str, id: &str) -> u64 {
        self.on_mutation(&MutationEvent::new(class, id, Operation::Delete))
            .await
    }

    /// Invalidates everything `event` can have made stale. Returns the number
    /// of entries removed.
    pub async fn on_mutation(&self, event: &MutationEvent) -> u64 {
        debug!(
            class = %event.class,
            id = %event.id,
            operation = %event.operation,
            "mutation hook fired"
        );

        let mut removed = self.cache.invalidate_document(&event.class, &event.id).await;

        if let Some(slug) = &event.slug {
            removed += self.cache.invalidate_slug(&event.class, slug).await;
        }

        if let Some(dependents) = self.dependents.get(&event.class) {
            for dependent in dependents {
                removed += self.cache.invalidate_collection(dependent).await;
            }
        }

        removed
    }

    /// Invalidates a singleton document such as site settings.
    pub async fn after_global_change(&self, name: &str) -> u64 {
        self.cache.invalidate_global(name).await
    }

    // == Fire And Forget ==
    /// Runs [`LifecycleHooks::on_mutation`] in the background.
    pub fn spawn_mutation(&self, event: MutationEvent) -> JoinHandle<u64> {
        let hooks = self.clone();
        tokio::spawn(async move { hooks.on_mutation(&event).await })
    }

    /// Runs [`LifecycleHooks::after_global_change`] in the background.
    pub fn spawn_global_change(&self, name: impl Into<String>) -> JoinHandle<u64> {
        let hooks = self.clone();
        let name = name.into();
        tokio::spawn(async move { hooks.after_global_change(&name).await })
    }
}
