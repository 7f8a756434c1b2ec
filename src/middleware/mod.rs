pub mod auth;
pub mod json;
pub mod response;
pub mod roles;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use json::Json;
pub use response::{ApiResponse, ApiResult};
pub use roles::{admin_only, require_roles, responsible_only, staff_only};
