use url::form_urlencoded;

/// Joins `base` and `path` with exactly one slash and appends the
/// form-encoded `params`. The `?` is always present.
pub fn build_url<K, V>(base: &str, path: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
        .finish();
    format!("{base}/{path}?{query}")
}

#[cfg(test)]
mod tests {
    use super::build_url;

    const NO_PARAMS: &[(&str, &str)] = &[];

    #[test]
    fn joins_base_and_path() {
        let url = build_url("http://example.com/", "/api/data", &[("key", "value")]);
        assert_eq!(url, "http://example.com/api/data?key=value");
    }

    #[test]
    fn collapses_repeated_slashes() {
        let url = build_url("http://example.com///", "///api/data", NO_PARAMS);
        assert_eq!(url, "http://example.com/api/data?");
    }

    #[test]
    fn encodes_params() {
        let url = build_url(
            "http://example.com",
            "search",
            &[("q", "space needle"), ("lang", "en&fr")],
        );
        assert_eq!(url, "http://example.com/search?q=space+needle&lang=en%26fr");
    }

    #[test]
    fn keeps_param_order() {
        let url = build_url("http://example.com", "a", &[("b", "2"), ("a", "1")]);
        assert_eq!(url, "http://example.com/a?b=2&a=1");
    }
}
