//! HTTP handlers for the CRUD views.

pub mod request_utils;
pub mod response;
pub mod view_handlers;

pub use request_utils::{
    build_redirect, build_response, map_scaffold_error, parse_form_data,
    read_request_body_with_timeout, MatchitParams,
};
pub use response::{error_response, success_response, ApiError, ApiResponse, ErrorResponse};
