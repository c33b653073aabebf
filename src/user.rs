//! Anonymous user identifier kept in a cookie.

use uuid::Uuid;

pub const USER_ID_COOKIE: &str = "userId";
pub const USER_ID_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 365;

/// Reads `userId` from a `Cookie` header value.
pub fn user_id_from_cookies(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == USER_ID_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

pub fn new_user_id() -> String {
    Uuid::new_v4().to_string()
}

/// `Set-Cookie` value persisting the id for a year.
pub fn user_id_cookie(user_id: &str) -> String {
    format!("{USER_ID_COOKIE}={user_id}; Path=/; Max-Age={USER_ID_MAX_AGE_SECS}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_user_id_among_cookies() {
        assert_eq!(user_id_from_cookies("a=1; userId=abc; b=2"), Some("abc"));
        assert_eq!(user_id_from_cookies("userId=abc"), Some("abc"));
        assert_eq!(user_id_from_cookies("xuserId=abc"), None);
        assert_eq!(user_id_from_cookies("userId="), None);
        assert_eq!(user_id_from_cookies(""), None);
    }

    #[test]
    fn new_ids_are_uuids() {
        let id = new_user_id();
        assert!(Uuid::parse_str(&id).is_ok());
        assert_ne!(id, new_user_id());
    }

    #[test]
    fn cookie_lasts_a_year() {
        assert_eq!(
            user_id_cookie("abc"),
            "userId=abc; Path=/; Max-Age=31536000"
        );
    }
}
