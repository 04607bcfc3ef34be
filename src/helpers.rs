use crate::types::{ParamValue, RouteParams};
use percent_encoding::percent_decode_str;

pub(crate) fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Parses `a=1&b=x+y` into decoded values. A key without `=` gets an empty string.
pub(crate) fn parse_query(query: Option<&str>) -> RouteParams {
    let mut params = RouteParams::new();

    let Some(query) = query else {
        return params;
    };

    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode(&key.replace('+', " "));
        params.set(key, ParamValue::parse(&value.replace('+', "%20")));
    }

    params
}
