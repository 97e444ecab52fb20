pub mod async_runtime;
pub mod path_processing;
pub mod text_processing;

pub use async_runtime::block_on_future;
pub use path_processing::expand_tilde;
pub use text_processing::{join_with_ampersand, redact_json, redact_sensitive};
