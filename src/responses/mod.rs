pub mod errors;
pub mod json;

pub use errors::json_error_response;
pub use json::json_response;

pub use crate::errors::ResultResp;
