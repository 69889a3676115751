// src/web/guards.rs
//! Caller identity. The user id is an opaque header value. No token
//! verification is done.

use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;

use crate::app_log;

pub const USER_HEADER: &str = "X-User-Id";
pub const SESSION_HEADER: &str = "X-Session-Id";
const MAX_ID_LEN: usize = 128;

#[derive(Debug)]
pub enum IdentityError {
    MissingUser,
    InvalidUser,
}

/// User and session keys of the request. The session defaults to the user.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: String,
    pub session_id: String,
}

fn header_value<'r>(req: &'r Request<'_>, name: &str) -> Option<&'r str> {
    req.headers()
        .get_one(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn acceptable(id: &str) -> bool {
    id.len() <= MAX_ID_LEN && !id.chars().any(char::is_control)
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Caller {
    type Error = IdentityError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let user_id = match header_value(req, USER_HEADER) {
            Some(id) if acceptable(id) => id.to_string(),
            Some(_) => {
                app_log!(warn, "Rejected malformed {} header", USER_HEADER);
                return Outcome::Error((Status::Unauthorized, IdentityError::InvalidUser));
            }
            None => {
                app_log!(warn, "Missing {} header", USER_HEADER);
                return Outcome::Error((Status::Unauthorized, IdentityError::MissingUser));
            }
        };

        let session_id = header_value(req, SESSION_HEADER)
            .filter(|s| acceptable(s))
            .map(|s| format!("{}:{}", user_id, s))
            .unwrap_or_else(|| user_id.clone());

        Outcome::Success(Caller {
            user_id,
            session_id,
        })
    }
}
