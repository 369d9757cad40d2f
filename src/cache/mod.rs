//! On-disk cache of built app environments
//!
//! Layout under the cache root:
//!
//! ```text
//! <root>/
//!   <name>/               one entry per app
//!     venv/               isolated runtime
//!     ready.json          present once a build completed
//!     building.json       present while a build is in flight
//!   <name>.lock           advisory lock, sibling of the entry
//! ```
//!
//! Entry states and what they mean:
//!
//! | State    | Markers                         | Meaning                    |
//! |----------|---------------------------------|----------------------------|
//! | absent   | none                            | never built (or purged)    |
//! | building | `building.json`, owner alive    | another process is on it   |
//! | stale    | `building.json`, owner dead     | interrupted, rebuild first |
//! | ready    | `ready.json` only               | launchable as-is           |

pub mod lock;
pub mod store;

pub use lock::EntryLock;
pub use store::{AppEntry, BuildingMarker, CacheState, CacheStore, ReadyMarker};
