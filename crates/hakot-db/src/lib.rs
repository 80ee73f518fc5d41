//! Hakot DB - Database abstractions
//!
//! SQLx-based database layer for the hakot billing services.
//!
//! # Example
//!
//! ```rust,ignore
//! use hakot_db::{create_pool, Repositories};
//!
//! let pool = create_pool("postgres://localhost/hakot").await?;
//! let repos = Repositories::new(pool);
//!
//! let sub = repos.subscriptions.find_by_account_id(account_id).await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, DbPool};
pub use repo::*;
