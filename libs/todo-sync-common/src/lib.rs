//! Todo Sync Common - Shared constants and helpers for the todo sync client
//!
//! # Examples
//!
//! ```
//! use todo_sync_common::{join_url, truncate_string, TODOS_API_PATH};
//!
//! assert_eq!(
//!     join_url("http://localhost:8080/", TODOS_API_PATH),
//!     "http://localhost:8080/api/v1/todos"
//! );
//! assert_eq!(truncate_string("hello world", 5), "he...");
//! ```

pub mod constants;
pub mod utils;

pub use constants::*;
pub use utils::*;
