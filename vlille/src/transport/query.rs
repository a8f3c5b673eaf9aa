//! Query-string formatting.

use std::fmt::Display;

/// Format parameters as `key=value` pairs joined by `&`, in the order
/// given. Keys and values are written verbatim.
pub fn format_params<K, V>(params: impl IntoIterator<Item = (K, V)>) -> String
where
    K: Display,
    V: Display,
{
    params
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Append formatted parameters to `url` after a `?`, if there are any.
pub fn with_params(url: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    format!("{url}?{}", format_params(params.iter().copied()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_param() {
        assert_eq!(format_params([("borne", "42")]), "borne=42");
    }

    #[test]
    fn params_keep_their_order() {
        assert_eq!(format_params([("b", 2), ("a", 1), ("c", 3)]), "b=2&a=1&c=3");
    }

    #[test]
    fn no_params() {
        assert_eq!(format_params(Vec::<(&str, &str)>::new()), "");
    }

    #[test]
    fn url_with_params() {
        assert_eq!(
            with_params("http://proxy/xml-station.aspx", &[("borne", "42")]),
            "http://proxy/xml-station.aspx?borne=42"
        );
    }

    #[test]
    fn url_without_params() {
        assert_eq!(
            with_params("http://proxy/xml-stations.aspx", &[]),
            "http://proxy/xml-stations.aspx"
        );
    }
}
