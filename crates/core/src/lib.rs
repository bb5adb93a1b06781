//! Krelay core types: event payloads, handler traits, GVK helpers

#![forbid(unsafe_code)]

use anyhow::{anyhow, Result};
use kube::core::{DynamicObject, GroupVersionKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What an informer hands to an event handler: a live object, a deletion
/// tombstone when the final state was not observed, or an opaque value
/// that carries no object identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Payload {
    Object(DynamicObject),
    Tombstone(Tombstone),
    Opaque(serde_json::Value),
}

impl Payload {
    pub fn as_object(&self) -> Option<&DynamicObject> {
        match self {
            Payload::Object(o) => Some(o),
            _ => None,
        }
    }

    /// `namespace/name` key, or bare `name` for cluster-scoped objects.
    pub fn obj_key(&self) -> Option<String> {
        let o = self.as_object()?;
        let name = o.metadata.name.as_deref()?;
        Some(match o.metadata.namespace.as_deref() {
            Some(ns) => format!("{}/{}", ns, name),
            None => name.to_string(),
        })
    }
}

/// Last-known state of a deleted object whose final delete event was
/// missed by the watch. `obj` is whatever the cache last held under `key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tombstone {
    pub key: String,
    pub obj: Box<Payload>,
}

impl Tombstone {
    pub fn new(key: impl Into<String>, obj: Payload) -> Self {
        Self { key: key.into(), obj: Box::new(obj) }
    }
}

/// Read-only view of the objects a cache currently holds.
pub trait Lister: Send + Sync {
    fn list(&self) -> Vec<Payload>;
}

/// Handler slots matching the event shapes a watch dispatches.
pub trait EventHandler {
    fn on_add(&self, obj: Payload);
    fn on_update(&self, old: Payload, new: Payload);
    fn on_delete(&self, obj: Payload);
}

pub type Callback = Arc<dyn Fn(Payload) + Send + Sync>;
pub type UpdateCallback = Arc<dyn Fn(Payload, Payload) + Send + Sync>;

/// Struct-of-callbacks adapter; unset slots ignore their events.
#[derive(Clone, Default)]
pub struct HandlerFns {
    pub on_add: Option<Callback>,
    pub on_update: Option<UpdateCallback>,
    pub on_delete: Option<Callback>,
}

impl EventHandler for HandlerFns {
    fn on_add(&self, obj: Payload) {
        if let Some(f) = self.on_add.as_deref() {
            f(obj)
        }
    }

    fn on_update(&self, old: Payload, new: Payload) {
        if let Some(f) = self.on_update.as_deref() {
            f(old, new)
        }
    }

    fn on_delete(&self, obj: Payload) {
        if let Some(f) = self.on_delete.as_deref() {
            f(obj)
        }
    }
}

pub fn parse_gvk_key(key: &str) -> Result<GroupVersionKind> {
    let parts: Vec<_> = key.split('/').collect();
    match parts.as_slice() {
        [version, kind] => Ok(GroupVersionKind {
            group: String::new(),
            version: (*version).to_string(),
            kind: (*kind).to_string(),
        }),
        [group, version, kind] => Ok(GroupVersionKind {
            group: (*group).to_string(),
            version: (*version).to_string(),
            kind: (*kind).to_string(),
        }),
        _ => Err(anyhow!("invalid gvk key: {} (expect v1/Kind or group/v1/Kind)", key)),
    }
}

/// Canonical `apiVersion`/`kind` pair for a GVK: `group/version`, or bare
/// `version` for the core group.
pub fn api_version_and_kind(gvk: &GroupVersionKind) -> (String, String) {
    let api_version = if gvk.group.is_empty() {
        gvk.version.clone()
    } else {
        format!("{}/{}", gvk.group, gvk.version)
    };
    (api_version, gvk.kind.clone())
}
