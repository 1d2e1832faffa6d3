//! quill-core: errors, configuration and identifiers shared by the
//! Quill crates.

pub mod config;
pub mod errors;
pub mod ids;

pub use config::{QuillConfig, QuillConfigSnapshot};
pub use errors::{ErrorKind, QuillError};
pub use ids::{is_object_id, ObjectId, OBJECT_ID_LEN};
