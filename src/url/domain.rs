use url::Url;

/// Returns the origin of a URL (`scheme://host[:port]/`)
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_digest::url::origin_of;
///
/// let url = Url::parse("https://example.com:8443/path?q=1").unwrap();
/// assert_eq!(origin_of(&url).unwrap().as_str(), "https://example.com:8443/");
/// ```
pub fn origin_of(url: &Url) -> Option<Url> {
    url.host_str()?;
    let mut origin = url.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    if origin.set_username("").is_err() || origin.set_password(None).is_err() {
        return None;
    }
    Some(origin)
}

/// Checks whether `candidate` shares the scheme, host and port of `origin`
///
/// Unparseable candidates never match.
pub fn same_origin(candidate: &str, origin: &Url) -> bool {
    match Url::parse(candidate) {
        Ok(url) => url.host_str().is_some() && url.origin() == origin.origin(),
        Err(_) => false,
    }
}
