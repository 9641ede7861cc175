//! Comment formatting for jira-relay.
//!
//! CI tooling writes comments in Markdown; the tracker expects its own wiki
//! markup. [`render_markdown`] converts one into the other and
//! [`rewrite_mentions`] turns `@name` into tracker user references.
//!
//! ## Architectural Layer
//!
//! **Pure transformation.** No I/O; every call owns its own render state, so
//! renders may run concurrently.

pub mod mention;
pub mod render;

pub use mention::rewrite_mentions;
pub use render::{render_markdown, DEFAULT_CODE_LANGUAGE};
