const HTTP_PREFIX: &str = "http://";
const HTTPS_PREFIX: &str = "https://";

pub fn has_scheme(base: &str) -> bool {
    base.starts_with(HTTP_PREFIX) || base.starts_with(HTTPS_PREFIX)
}

// builds the absolute url for a subdomain and endpoint.
// nothing is validated here, a malformed host fails later at the network layer.
pub fn normalize_url(base: &str, endpoint: &str) -> String {
    let base = base.strip_suffix('/').unwrap_or(base);
    let mut url = String::with_capacity(HTTPS_PREFIX.len() + base.len() + endpoint.len() + 1);
    if !has_scheme(base) {
        url.push_str(HTTPS_PREFIX);
    }
    url.push_str(base);
    if !endpoint.starts_with('/') {
        url.push('/');
    }
    url.push_str(endpoint);
    url
}
