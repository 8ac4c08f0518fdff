//! `casebook` - Blog post persistence for a small law-practice website
//!
//! Posts live in a local `SQLite` database and, optionally, in a remote
//! document collection. The [`HybridStore`] reads from the remote store when
//! it can and falls back to the local one when it cannot, so the site keeps
//! serving posts while the remote backend is missing or down.
//!
//! ```no_run
//! use casebook::{Config, HybridStore, PostDraft, PostStore};
//!
//! # async fn demo() -> casebook::Result<()> {
//! let store = HybridStore::from_config(&Config::load()?)?;
//! let post = store.save(&PostDraft::new("Choosing an Executor")).await?;
//! assert_eq!(post.slug, "choosing-an-executor");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod hybrid;
pub mod logging;
pub mod post;
pub mod remote;
pub mod seed;
pub mod slug;
pub mod storage;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use hybrid::{HybridStore, SyncReport};
pub use logging::init_logging;
pub use post::{BlogPost, PostDraft, PostPatch, PostStatus};
pub use remote::RemoteStore;
pub use storage::{LocalStore, StorageStats};
pub use store::PostStore;
