//! Layout engine - node storage, lifecycle and hierarchy.
//!
//! The engine manages the core data structures:
//! - Handle: index + generation reference into a store
//! - DataStore / NodeStore: chunked slab storage with free-list reuse
//! - ManagedObjectStore: callbacks and owner references behind integer slots
//! - LayoutNode / LayoutConfig: `Copy` handles, operated on via the manager
//! - LayoutManager: factory, deferred destruction, dispose
//! - Registry: live managers by id, shared default instance
//!
//! # Architecture
//!
//! Nodes are NOT objects. They are handles into parallel component arrays:
//!
//! ```text
//! Handle 1: data(parent=0, children=[2,3]) style(row)    dimensions(w=100)
//! Handle 2: data(parent=1)                 style(column) dimensions(w=auto)
//! Handle 3: data(parent=1)                 style(column) dimensions(w=40)
//! ```
//!
//! Handle 0 is reserved for "undefined".

mod config;
mod data_store;
mod handle;
mod hierarchy;
mod managed_store;
mod manager;
mod node;
pub mod records;
pub mod registry;

pub use config::*;
pub use data_store::*;
pub use handle::*;
pub use hierarchy::Children;
pub use managed_store::*;
pub use manager::*;
pub use node::*;
