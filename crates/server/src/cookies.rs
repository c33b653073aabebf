use axum::{
    extract::Request,
    http::{
        HeaderValue,
        header::{COOKIE, SET_COOKIE},
    },
    middleware::Next,
    response::Response,
};
use tracing::debug;
use wayside::user::{new_user_id, user_id_cookie, user_id_from_cookies};

/// Hands out a `userId` cookie to requests that arrive without one.
pub async fn ensure_user_id(request: Request, next: Next) -> Response {
    let known = request
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|header| user_id_from_cookies(header).is_some());

    let mut response = next.run(request).await;
    if !known {
        let user_id = new_user_id();
        debug!("Issuing user id {user_id}");
        if let Ok(value) = HeaderValue::from_str(&user_id_cookie(&user_id)) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    response
}
