//! Response envelope and XML helpers.
//!
//! Every verb on the [`Connector`](crate::Connector) returns an [`ApiResponse`] whose
//! body has already been read to the end, so no pooled connection is left half-drained.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::link::Resource;
use crate::types::TASK_MEDIA_TYPE;

/// A fully-read API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Value of the `Content-Type` header, without parameters
    pub media_type: Option<String>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Build an envelope from its parts, stripping `;version=...` style parameters
    /// from the content type.
    #[must_use]
    pub fn new(status: u16, content_type: Option<&str>, body: Vec<u8>) -> Self {
        let media_type = content_type
            .and_then(|value| value.split(';').next())
            .map(|value| value.trim().to_ascii_lowercase())
            .filter(|value| !value.is_empty());

        Self {
            status,
            media_type,
            body,
        }
    }

    /// Returns true if the body is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Body as UTF-8 text, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body into an arbitrary schema type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the body is not valid XML for `T`.
    pub fn decode<T>(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        decode_xml(&self.body)
    }

    /// Decode the body into a resource, checking that the root element is one the
    /// resource accepts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the root element is of another kind or the body
    /// does not match the resource schema.
    pub fn decode_resource<T>(&self) -> Result<T>
    where
        T: Resource,
    {
        let root = self.root_element()?;
        if !T::ELEMENTS.contains(&root.as_str()) {
            return Err(Error::Decode(format!(
                "expected one of {:?}, found <{root}>",
                T::ELEMENTS
            )));
        }
        self.decode()
    }

    /// Local name of the body's root element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the body holds no element.
    pub fn root_element(&self) -> Result<String> {
        root_element(&self.body)
    }

    /// Returns true if the body carries a task rather than the requested resource.
    #[must_use]
    pub fn is_task(&self) -> bool {
        if self.media_type.as_deref() == Some(TASK_MEDIA_TYPE) {
            return true;
        }
        matches!(self.root_element().as_deref(), Ok("Task"))
    }
}

/// Decode an XML document into `T`.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the bytes are not UTF-8 or do not match `T`.
pub fn decode_xml<T>(body: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let text = std::str::from_utf8(body)
        .map_err(|err| Error::Decode(format!("response body is not UTF-8: {err}")))?;
    quick_xml::de::from_str(text).map_err(|err| Error::Decode(err.to_string()))
}

/// Serialize a request payload to XML.
///
/// # Errors
///
/// Returns [`Error::Encode`] if the value cannot be represented as XML.
pub fn encode_xml<T>(value: &T) -> Result<String>
where
    T: Serialize,
{
    quick_xml::se::to_string(value).map_err(|err| Error::Encode(err.to_string()))
}

/// Local name of the first element in an XML document.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the document is malformed or has no element.
pub fn root_element(body: &[u8]) -> Result<String> {
    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(element) | Event::Empty(element)) => {
                return Ok(String::from_utf8_lossy(element.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) => {
                return Err(Error::Decode("response body has no root element".to_string()));
            }
            Ok(_) => {}
            Err(err) => return Err(Error::Decode(err.to_string())),
        }
        buf.clear();
    }
}
