//! Resync broadcast and type-identity stamping for cache event handlers.
//!
//! Sits between an informer cache and the handler functions a reconcile
//! loop registers with it: `send_global_updates` forces an update pass
//! over everything a snapshot holds, and `ensure_type_meta` guarantees
//! objects reaching a callback carry the configured apiVersion/kind.

#![forbid(unsafe_code)]

use kube::core::{GroupVersionKind, TypeMeta};
use metrics::counter;
use std::sync::Arc;
use tracing::debug;

use krelay_core::{
    api_version_and_kind, Callback, EventHandler, HandlerFns, Lister, Payload, UpdateCallback,
};

/// Deliver a synthetic update for every object the snapshot currently
/// holds, passing the same value as both old and new state. Ordering
/// follows the snapshot; handler panics propagate and stop the pass.
pub fn send_global_updates(store: &dyn Lister, handler: &dyn EventHandler) {
    let objs = store.list();
    debug!(count = objs.len(), "sending global updates");
    counter!("relay_resync_updates_total", objs.len() as u64);
    for obj in objs {
        handler.on_update(obj.clone(), obj);
    }
}

/// One level of tombstone unwrapping, then stamp. `None` means the value
/// carries no type identity and must not be forwarded.
fn stamp(payload: Payload, api_version: &str, kind: &str) -> Option<Payload> {
    let inner = match payload {
        Payload::Tombstone(t) => *t.obj,
        other => other,
    };
    match inner {
        Payload::Object(mut obj) => {
            obj.types = Some(TypeMeta {
                api_version: api_version.to_string(),
                kind: kind.to_string(),
            });
            Some(Payload::Object(obj))
        }
        other => {
            debug!(payload = ?other, "dropping value without type identity");
            counter!("relay_typemeta_dropped_total", 1u64);
            None
        }
    }
}

/// Wrap `cb` so every object it receives carries the apiVersion/kind
/// derived from `gvk`, overwriting any prior values. Tombstones are
/// unwrapped first; values that cannot carry type identity are dropped
/// without a call.
pub fn ensure_type_meta(cb: Callback, gvk: &GroupVersionKind) -> Callback {
    let (api_version, kind) = api_version_and_kind(gvk);
    Arc::new(move |payload| {
        if let Some(stamped) = stamp(payload, &api_version, &kind) {
            (*cb)(stamped);
        }
    })
}

/// Wrap every populated slot of `fns` with type-identity stamping. The
/// update slot stamps old and new independently and forwards only when
/// both qualify.
pub fn ensure_handler_type_meta(fns: HandlerFns, gvk: &GroupVersionKind) -> HandlerFns {
    let (api_version, kind) = api_version_and_kind(gvk);
    HandlerFns {
        on_add: fns.on_add.map(|f| ensure_type_meta(f, gvk)),
        on_update: fns.on_update.map(|f| -> UpdateCallback {
            Arc::new(move |old, new| {
                if let (Some(old), Some(new)) = (
                    stamp(old, &api_version, &kind),
                    stamp(new, &api_version, &kind),
                ) {
                    (*f)(old, new)
                }
            })
        }),
        on_delete: fns.on_delete.map(|f| ensure_type_meta(f, gvk)),
    }
}

/// Adapt a single-object callback into an update callback that ignores
/// the old state.
pub fn pass_new(f: Callback) -> UpdateCallback {
    Arc::new(move |_old, new| (*f)(new))
}

/// Route add, update (new state only), and delete through one callback.
pub fn handle_all(f: Callback) -> HandlerFns {
    HandlerFns {
        on_add: Some(f.clone()),
        on_update: Some(pass_new(f.clone())),
        on_delete: Some(f),
    }
}
