//! Hypermedia links and the linked-resource capability.
//!
//! Every representation carries `<Link rel type name href/>` elements. Resolution only
//! ever keys on the link's media type and name; the order of links is the server's.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A typed, named pointer from one resource to another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Relation to the owning resource (`down`, `up`, `add`, `edit`, ...)
    #[serde(rename = "@rel", default, skip_serializing_if = "String::is_empty")]
    pub rel: String,
    /// Media type of the target
    #[serde(rename = "@type", default, skip_serializing_if = "String::is_empty")]
    pub media_type: String,
    /// Logical name of the target
    #[serde(rename = "@name", default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Target href
    #[serde(rename = "@href", default)]
    pub href: String,
}

impl Link {
    /// Create a reference link without a relation.
    #[must_use]
    pub fn reference(
        media_type: impl Into<String>,
        name: impl Into<String>,
        href: impl Into<String>,
    ) -> Self {
        Self {
            rel: String::new(),
            media_type: media_type.into(),
            name: name.into(),
            href: href.into(),
        }
    }

    /// Returns true if the link targets the given media type.
    #[must_use]
    pub fn is_type(&self, media_type: &str) -> bool {
        self.media_type == media_type
    }
}

/// All links of the given media type, in source order.
pub fn find_links<'a, I>(links: I, media_type: &str) -> Vec<&'a Link>
where
    I: IntoIterator<Item = &'a Link>,
{
    links
        .into_iter()
        .filter(|link| link.is_type(media_type))
        .collect()
}

/// First link matching both media type and name.
pub fn find_link<'a, I>(links: I, media_type: &str, name: &str) -> Option<&'a Link>
where
    I: IntoIterator<Item = &'a Link>,
{
    links
        .into_iter()
        .find(|link| link.is_type(media_type) && link.name == name)
}

/// A resource that exposes a sequence of links.
///
/// Implementors only provide [`links`](Self::links); lookup is shared.
pub trait Linked {
    /// Links carried by the representation, in server order.
    fn links(&self) -> &[Link];

    /// All links of the given media type. Empty, never an error, when none match.
    fn find_links(&self, media_type: &str) -> Vec<&Link> {
        find_links(self.links(), media_type)
    }

    /// First link matching media type and name, if any.
    fn find_link(&self, media_type: &str, name: &str) -> Option<&Link> {
        find_link(self.links(), media_type, name)
    }

    /// First link with the given relation and media type, if any.
    fn find_rel(&self, rel: &str, media_type: &str) -> Option<&Link> {
        self.links()
            .iter()
            .find(|link| link.rel == rel && link.is_type(media_type))
    }
}

/// A decodable representation reachable by following links.
pub trait Resource: Linked + DeserializeOwned + Send + Sync {
    /// Media type links use to point at this kind of resource.
    const MEDIA_TYPE: &'static str;

    /// Root element names this representation may arrive as.
    const ELEMENTS: &'static [&'static str];

    /// The resource's own href.
    fn href(&self) -> &str;

    /// The resource's name, if it has one.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Href that accepts updates and deletes; the resource's own href unless the
    /// API manages the kind under another path.
    fn edit_href(&self) -> String {
        self.href().to_string()
    }
}
