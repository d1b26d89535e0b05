pub mod auth;
pub mod response;
pub mod restrict;

pub use auth::{extract_token, require_session, session_cookie, SESSION_COOKIE};
pub use response::{ApiResponse, ApiResult};
pub use restrict::restrict_to;
