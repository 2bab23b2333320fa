use percent_encoding::percent_decode_str;

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Returns the decoded value of the first cookie called `name` in a
/// `Cookie` header value such as `"a=1; csrftoken=abc"`.
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name).then_some(value)
        })
        .map(|value| percent_decode_str(value).decode_utf8_lossy().into_owned())
}
