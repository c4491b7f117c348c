//! URL resolution against the client's versioned base URL.
//!
//! # Design
//! The base URL is normalized once, at client construction, to end in `/`.
//! Relative paths are joined under it with their leading slashes removed,
//! and a resolved URL that lands outside the base path is rejected, so no
//! path can escape the `/v1/` root.
//!
//! Query parameters come from any [`QueryParams`] type. The value is
//! serialized through `serde_json` (declared field order preserved) and
//! fields holding their zero value are dropped unless listed in
//! [`QueryParams::REQUIRED`].

use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;
use url::Url;

use crate::error::ApiError;

/// A serializable set of query parameters.
pub trait QueryParams: Serialize {
    /// Keys sent even when the field holds its zero value.
    const REQUIRED: &'static [&'static str] = &[];
}

impl QueryParams for () {}

/// Joins relative paths and query parameters onto a fixed base URL.
#[derive(Debug, Clone)]
pub struct EndpointResolver {
    base: Url,
}

impl EndpointResolver {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| ApiError::Construction(format!("invalid base url '{base_url}': {e}")))?;
        if base.cannot_be_a_base() || !base.has_host() {
            return Err(ApiError::Construction(format!(
                "base url '{base_url}' must be absolute"
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self { base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve `path` under the base URL and append `query` if given.
    ///
    /// `None` leaves the URL without a query string. `Some` appends every
    /// non-zero field as `key=value`, form-urlencoded.
    pub fn resolve<Q>(&self, path: &str, query: Option<&Q>) -> Result<Url, ApiError>
    where
        Q: QueryParams + ?Sized,
    {
        let relative = path.trim_start_matches('/');
        let mut url = self
            .base
            .join(relative)
            .map_err(|e| ApiError::Construction(format!("invalid path '{path}': {e}")))?;

        if url.origin() != self.base.origin() || !url.path().starts_with(self.base.path()) {
            return Err(ApiError::Construction(format!(
                "path '{path}' resolves outside of {}",
                self.base
            )));
        }

        if let Some(query) = query {
            let pairs = query_pairs(query)?;
            url.set_query(None);
            if !pairs.is_empty() {
                url.query_pairs_mut().extend_pairs(pairs);
            }
        }
        Ok(url)
    }
}

/// Percent-encode one path segment so identifiers cannot add segments.
pub fn encode_segment(segment: &str) -> String {
    // byte_serialize writes spaces as '+' and a literal '+' as %2B.
    form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn query_pairs<Q>(query: &Q) -> Result<Vec<(String, String)>, ApiError>
where
    Q: QueryParams + ?Sized,
{
    let fields = match serde_json::to_value(query).map_err(ApiError::construction)? {
        Value::Object(fields) => fields,
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(ApiError::Construction(format!(
                "query parameters must be a struct or map, got {other}"
            )))
        }
    };

    let mut pairs = Vec::with_capacity(fields.len());
    for (key, value) in fields {
        match value {
            Value::Array(items) => {
                for item in &items {
                    pairs.push((key.clone(), scalar(&key, item)?));
                }
            }
            value => {
                if Q::REQUIRED.contains(&key.as_str()) || !is_zero(&value) {
                    let rendered = scalar(&key, &value)?;
                    pairs.push((key, rendered));
                }
            }
        }
    }
    Ok(pairs)
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(_) => false,
    }
}

fn scalar(key: &str, value: &Value) -> Result<String, ApiError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s.clone()),
        Value::Array(_) | Value::Object(_) => Err(ApiError::Construction(format!(
            "query parameter '{key}' must be a scalar"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[derive(Serialize, Default)]
    struct Paging {
        size: u32,
        page: u32,
        #[serde(rename = "serialNumber")]
        serial_number: String,
    }

    impl QueryParams for Paging {}

    #[derive(Serialize)]
    struct RequiredPage {
        page: u32,
        size: u32,
    }

    impl QueryParams for RequiredPage {
        const REQUIRED: &'static [&'static str] = &["page"];
    }

    impl QueryParams for serde_json::Value {}

    fn resolver() -> EndpointResolver {
        EndpointResolver::new("https://api.example.com/v1/").unwrap()
    }

    fn pairs(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn no_query_leaves_path_untouched() {
        let url = resolver().resolve::<()>("terminals", None).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/terminals");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn base_without_trailing_slash_keeps_version_segment() {
        let resolver = EndpointResolver::new("https://api.example.com/v1").unwrap();
        let url = resolver.resolve::<()>("models", None).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/models");
    }

    #[test]
    fn leading_slash_does_not_escape_root() {
        let url = resolver().resolve::<()>("/templates", None).unwrap();
        assert_eq!(url.path(), "/v1/templates");
    }

    #[test]
    fn parent_segments_are_rejected() {
        let err = resolver().resolve::<()>("../admin", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
    }

    #[test]
    fn zero_fields_are_omitted() {
        let query = Paging {
            size: 10,
            ..Default::default()
        };
        let url = resolver().resolve("terminals", Some(&query)).unwrap();
        assert_eq!(url.path(), "/v1/terminals");
        assert_eq!(pairs(&url), vec![("size".to_string(), "10".to_string())]);
    }

    #[test]
    fn all_zero_query_has_no_query_string() {
        let url = resolver()
            .resolve("terminals", Some(&Paging::default()))
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/terminals");
    }

    #[test]
    fn values_are_percent_encoded() {
        let query = Paging {
            serial_number: "A&B C".to_string(),
            ..Default::default()
        };
        let url = resolver().resolve("terminals", Some(&query)).unwrap();
        assert_eq!(url.query(), Some("serialNumber=A%26B+C"));
        assert_eq!(
            pairs(&url),
            vec![("serialNumber".to_string(), "A&B C".to_string())]
        );
    }

    #[test]
    fn required_fields_are_kept_at_zero() {
        let url = resolver()
            .resolve("templates", Some(&RequiredPage { page: 0, size: 0 }))
            .unwrap();
        assert_eq!(pairs(&url), vec![("page".to_string(), "0".to_string())]);
    }

    #[test]
    fn nested_objects_are_rejected() {
        let query = serde_json::json!({ "filter": { "a": 1 } });
        let err = resolver().resolve("terminals", Some(&query)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
    }

    #[test]
    fn relative_base_is_rejected() {
        let err = EndpointResolver::new("v1/").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
    }

    #[test]
    fn segments_cannot_add_path_components() {
        assert_eq!(encode_segment("a/b c+d"), "a%2Fb%20c%2Bd");
        let url = resolver()
            .resolve::<()>(&format!("templates/params/{}", encode_segment("../x")), None)
            .unwrap();
        assert_eq!(url.path(), "/v1/templates/params/..%2Fx");
    }
}
