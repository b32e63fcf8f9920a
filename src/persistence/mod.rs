//! Row mapping for the two mirrored tables. Only db logic lives here; this is
//! independent of the web framework.
//!
//! Queries are checked at runtime (`sqlx::query`), not at compile time, so
//! the crate builds without a running db or an offline `.sqlx` directory.

mod lists;
mod members;

pub use lists::delete_list;
pub use lists::find_list;
pub use lists::insert_list;
pub use lists::update_list;
pub use members::delete_member;
pub use members::find_member;
pub use members::insert_member;
pub use members::update_member;
