//! Contract-driven mirror projections of mutable JSON sources.
//!
//! `mirror-state` projects a mutable "source" document into one or more
//! derived "mirror" documents whose shape is declared by a field-mapping
//! contract, and keeps every mirror synchronized whenever the source changes.
//! Each mirror may emit an ordered stream of patch operations describing, in
//! mirror-space terms, exactly what changed — so downstream consumers
//! (incremental sync, change logs, network diffing) can react without
//! re-diffing whole documents.
//!
//! # Core Concepts
//!
//! - **FieldMappings**: declarative, pure contract mapping source fields to
//!   mirror paths, with optional transforms and nested contracts
//! - **SourceHandler**: owns a source and fans every mutation out to all
//!   live mirror bindings in registration order
//! - **MirrorHandler**: owns one mirror, applies the contract, emits patches
//! - **SourceProxy** / **ProxyManager**: explicit accessor handles that make
//!   ordinary-looking mutation route through propagation
//! - **filter_mirror**: registry-free path for one-off projections
//! - **PatchOp**: atomic description (`Set` / `Delete`, mirror path,
//!   optional value) of one mirror-side change
//!
//! Everything is push-based and fully synchronous: a mutation call completes
//! its entire fan-out before returning. There is exactly one source of truth
//! and N one-way projections — no merging, no conflict resolution, no I/O.
//!
//! # Quick Start
//!
//! ```
//! use mirror_state::{FieldMappings, MirrorOptions, ProxyManager, SourceHandler};
//! use serde_json::json;
//!
//! let handler = SourceHandler::new(
//!     json!({"name": "a", "age": 1}),
//!     |_key: &&str| {
//!         Some(
//!             FieldMappings::new()
//!                 .map("name", "displayName")
//!                 .map_with("age", "yearsOld", |v| json!(v.as_i64().unwrap_or(0) + 1)),
//!         )
//!     },
//!     ProxyManager::new(),
//! );
//!
//! let mirror = handler.create_mirror("ui", MirrorOptions::new()).unwrap();
//! assert_eq!(mirror, json!({"displayName": "a", "yearsOld": 2}));
//!
//! // Mutate through the registry, or through an interception handle:
//! let proxy = handler.proxy("ui");
//! proxy.set("age", 2);
//!
//! assert_eq!(handler.mirror(&"ui").unwrap()["yearsOld"], 3);
//! ```
//!
//! # Patch Emission
//!
//! ```
//! use mirror_state::{path, FieldMappings, MirrorOptions, PatchOp, ProxyManager, SourceHandler};
//! use serde_json::json;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let patches = Rc::new(RefCell::new(Vec::new()));
//! let sink = patches.clone();
//!
//! let handler = SourceHandler::new(
//!     json!({}),
//!     |_key: &&str| Some(FieldMappings::new().map("a", "b")),
//!     ProxyManager::new(),
//! );
//! handler
//!     .create_mirror(
//!         "log",
//!         MirrorOptions::new().patch_callback(move |op| sink.borrow_mut().push(op)),
//!     )
//!     .unwrap();
//!
//! handler.set_field("a", json!(5));
//!
//! assert_eq!(patches.borrow().as_slice(), [PatchOp::set(path!("b"), 5)]);
//! ```
//!
//! # Re-entrancy
//!
//! Transforms and patch callbacks must be side-effect-free with respect to
//! the source: they run inside fan-out, and one that calls back into the
//! handler that invoked it re-enters the mutation path, which the core does
//! not detect or break. The registry's post-mutation hook is the exception:
//! it fires after fan-out has settled, with no registry lock held, so it may
//! read back through the handler.

mod apply;
mod error;
mod filter;
mod mappings;
mod mirror;
mod patch;
mod path;
mod proxy;
mod source;

pub use apply::get_at_path;
pub use error::{MirrorError, MirrorResult};
pub use filter::{filter_mirror, FilteredMirror, MappingHandler};
pub use mappings::{FieldMappings, MappingRule, Transform};
pub use mirror::{ChangeHook, MirrorHandler, MirrorInit, MirrorOptions, PatchCallback};
pub use patch::PatchOp;
pub use path::Path;
pub use proxy::{ProxyManager, SourceOps, SourceProxy};
pub use source::{AfterChange, MappingResolver, SourceHandler};

// Re-export serde_json::Value for convenience
pub use serde_json::Value;
