//! Link resolution - turns relative link references into absolute URIs.
//!
//! Relative references resolve against the *root* of the request URI, not
//! against its last path segment:
//!
//! | Base | Reference | Result |
//! |------|-----------|--------|
//! | `http://host/a/b/c` | `x` | `http://host/x` |
//! | `http://host/a/b/c` | `/x/y` | `http://host/x/y` |
//! | `http://host/a/b/c` | `http://other/z` | `http://other/z` (unchanged) |

use serde_json::{Map, Value};
use tracing::trace;
use url::{Position, Url};

use crate::error::LinkError;
use crate::types::json_type_name;

/// Absolute URI of the current request, the root for relative links.
///
/// Resolution goes through [`Url`], but the scheme and authority are written
/// back exactly as the caller spelled them, so `http://BASEPATH/` yields
/// `http://BASEPATH/location` rather than a lowercased host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUri {
    url: Url,
    root: Url,
    origin: String,
}

impl BaseUri {
    /// Parse an absolute URI.
    ///
    /// # Errors
    ///
    /// Returns `LinkError::InvalidBase` unless `uri` is an absolute URI that
    /// relative references can resolve against.
    pub fn parse(uri: &str) -> Result<Self, LinkError> {
        let invalid = |source| LinkError::InvalidBase {
            uri: uri.to_string(),
            source,
        };
        let url = Url::parse(uri).map_err(invalid)?;
        let root = url.join("/").map_err(invalid)?;
        let origin = original_origin(uri.trim(), &url);
        Ok(Self { url, root, origin })
    }

    /// The parsed, normalized URI.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Scheme and authority as originally written, e.g. `http://BASEPATH:8080`.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The root of the URI: same scheme and authority, path `/`.
    pub fn root(&self) -> String {
        format!("{}/", self.origin)
    }

    /// The URI without query or fragment.
    pub fn without_query(&self) -> String {
        format!(
            "{}{}",
            self.origin,
            &self.url[Position::BeforePath..Position::AfterPath]
        )
    }
}

impl std::fmt::Display for BaseUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.origin, &self.url[Position::BeforePath..])
    }
}

/// Parse a base URI.
///
/// # Errors
///
/// Returns `LinkError::InvalidBase` unless `uri` is an absolute URI.
pub fn parse_base(uri: &str) -> Result<BaseUri, LinkError> {
    BaseUri::parse(uri)
}

/// The root of `base`: same scheme and authority, path `/`.
pub fn request_root(base: &BaseUri) -> String {
    base.root()
}

/// Resolve `reference` against the root of `base`.
///
/// An absolute reference (one with a scheme) is returned unchanged.
///
/// # Errors
///
/// Returns `LinkError::InvalidReference` if the reference cannot be resolved.
pub fn absolutize(base: &BaseUri, reference: &str) -> Result<String, LinkError> {
    if Url::parse(reference).is_ok() {
        return Ok(reference.to_string());
    }

    let resolved = base
        .root
        .join(reference)
        .map_err(|source| LinkError::InvalidReference {
            reference: reference.to_string(),
            source,
        })?;

    // A network-path reference (`//other/x`) leaves the request's authority.
    let absolute = if resolved[..Position::BeforePath] == base.root[..Position::BeforePath] {
        format!("{}{}", base.origin, &resolved[Position::BeforePath..])
    } else {
        resolved.into()
    };
    trace!(reference, resolved = %absolute, "absolutized link");
    Ok(absolute)
}

/// Absolutize every links object of a JSON:API document in place.
///
/// Visits the top-level `links`, the `links` of each resource object in `data`
/// and `included`, and the `links` of each relationship entry. Attributes are
/// never touched. A link is either a string or a link object with an `href`.
///
/// # Errors
///
/// Returns `LinkError` on unresolvable references or malformed links.
pub fn absolutize_links(document: &mut Value, base: &BaseUri) -> Result<(), LinkError> {
    let Some(map) = document.as_object_mut() else {
        return Ok(());
    };

    if let Some(links) = map.get_mut("links") {
        absolutize_links_object(links, base, "/links")?;
    }
    if let Some(data) = map.get_mut("data") {
        absolutize_primary(data, base, "/data")?;
    }
    if let Some(included) = map.get_mut("included") {
        absolutize_primary(included, base, "/included")?;
    }

    Ok(())
}

// --- Internal implementation ---

fn absolutize_primary(data: &mut Value, base: &BaseUri, path: &str) -> Result<(), LinkError> {
    match data {
        Value::Array(resources) => {
            for (i, resource) in resources.iter_mut().enumerate() {
                absolutize_resource(resource, base, &format!("{}/{}", path, i))?;
            }
            Ok(())
        }
        Value::Object(_) => absolutize_resource(data, base, path),
        _ => Ok(()),
    }
}

fn absolutize_resource(resource: &mut Value, base: &BaseUri, path: &str) -> Result<(), LinkError> {
    let Some(map) = resource.as_object_mut() else {
        return Ok(());
    };

    if let Some(links) = map.get_mut("links") {
        absolutize_links_object(links, base, &format!("{}/links", path))?;
    }

    if let Some(Value::Object(relationships)) = map.get_mut("relationships") {
        for (name, entry) in relationships.iter_mut() {
            if let Some(links) = entry.get_mut("links") {
                let links_path = format!("{}/relationships/{}/links", path, name);
                absolutize_links_object(links, base, &links_path)?;
            }
        }
    }

    Ok(())
}

fn absolutize_links_object(links: &mut Value, base: &BaseUri, path: &str) -> Result<(), LinkError> {
    let Some(links) = links.as_object_mut() else {
        return Err(invalid_link(links, path));
    };

    for (name, link) in links.iter_mut() {
        let link_path = format!("{}/{}", path, name);
        match link {
            Value::String(reference) => {
                *reference = absolutize(base, reference)?;
            }
            Value::Object(object) => absolutize_link_object(object, base, &link_path)?,
            // JSON:API allows a link to be explicitly absent.
            Value::Null => {}
            other => return Err(invalid_link(other, &link_path)),
        }
    }

    Ok(())
}

fn absolutize_link_object(
    object: &mut Map<String, Value>,
    base: &BaseUri,
    path: &str,
) -> Result<(), LinkError> {
    match object.get_mut("href") {
        Some(Value::String(href)) => {
            *href = absolutize(base, href)?;
            Ok(())
        }
        Some(other) => Err(invalid_link(other, &format!("{}/href", path))),
        None => Err(LinkError::InvalidLinkType {
            path: path.to_string(),
            actual: "object without href".to_string(),
        }),
    }
}

/// Scheme and authority of `raw`, falling back to the normalized form when
/// the text does not have the plain `scheme://authority` shape.
fn original_origin(raw: &str, url: &Url) -> String {
    let normalized = &url[..Position::BeforePath];
    let scheme_end = url.scheme().len();
    let written = raw
        .get(..scheme_end)
        .filter(|scheme| scheme.eq_ignore_ascii_case(url.scheme()))
        .and_then(|_| raw[scheme_end..].strip_prefix("://"));

    match written {
        Some(rest) => {
            let end = rest
                .find(|c| matches!(c, '/' | '?' | '#'))
                .unwrap_or(rest.len());
            raw[..scheme_end + "://".len() + end].to_string()
        }
        None => normalized.to_string(),
    }
}

fn invalid_link(value: &Value, path: &str) -> LinkError {
    LinkError::InvalidLinkType {
        path: path.to_string(),
        actual: json_type_name(value).to_string(),
    }
}
