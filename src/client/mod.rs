//! Typed client for the blog API: HTTP calls, the write/edit draft flow,
//! and the writing assistant chat.

pub mod api;
pub mod assist;
pub mod render;
pub mod workflow;

pub use api::{ApiClient, ClientConfig, ClientError, ErrorKind, ImageFile};
pub use workflow::{Draft, PostApi, Published, WorkflowError};
