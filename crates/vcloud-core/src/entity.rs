//! Connector-bound resources and generic navigation.
//!
//! An [`Entity`] pairs a decoded representation with a borrowed [`Connector`]. The
//! borrow ties every entity's lifetime to its connector; entities never own it.
//! Navigation is written once here for every resource kind.

use serde::Serialize;
use std::ops::{Deref, DerefMut};
use tracing::debug;

use crate::connector::Connector;
use crate::envelope::{encode_xml, ApiResponse};
use crate::error::{Error, Result};
use crate::link::{Link, Resource};
use crate::task::{Task, TaskRecord};

/// A representation fetched through, and bound to, a [`Connector`].
#[derive(Debug, Clone)]
pub struct Entity<'c, T> {
    connector: &'c Connector,
    record: T,
}

impl<'c, T> Entity<'c, T> {
    /// Bind an already-decoded record to a connector.
    #[must_use]
    pub const fn from_record(connector: &'c Connector, record: T) -> Self {
        Self { connector, record }
    }

    /// The connector this entity navigates with.
    #[must_use]
    pub const fn connector(&self) -> &'c Connector {
        self.connector
    }

    /// The decoded representation.
    #[must_use]
    pub const fn record(&self) -> &T {
        &self.record
    }

    /// Detach the representation from the connector.
    #[must_use]
    pub fn into_record(self) -> T {
        self.record
    }
}

impl<'c, T> Entity<'c, T>
where
    T: Resource,
{
    /// GET `href` and decode it as `T`.
    ///
    /// # Errors
    ///
    /// Fails with whatever [`Connector::get`] raised, or [`Error::Decode`] if the body
    /// is not a `T`.
    pub async fn fetch(connector: &'c Connector, href: &str) -> Result<Self> {
        let response = connector.get(href).await?;
        let record = response.decode_resource::<T>()?;
        Ok(Self { connector, record })
    }

    /// Fetch another resource with this entity's connector.
    ///
    /// # Errors
    ///
    /// See [`Entity::fetch`].
    pub async fn resolve<U>(&self, href: &str) -> Result<Entity<'c, U>>
    where
        U: Resource,
    {
        Entity::fetch(self.connector, href).await
    }

    /// Follow a link to its target.
    ///
    /// # Errors
    ///
    /// See [`Entity::fetch`].
    pub async fn resolve_link<U>(&self, link: &Link) -> Result<Entity<'c, U>>
    where
        U: Resource,
    {
        self.resolve(&link.href).await
    }

    /// Links to every child of kind `U`.
    #[must_use]
    pub fn children<U>(&self) -> Vec<&Link>
    where
        U: Resource,
    {
        self.record.find_links(U::MEDIA_TYPE)
    }

    /// Resolve the child of kind `U` with the given name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no link of that kind carries `name`, otherwise
    /// see [`Entity::fetch`].
    pub async fn child<U>(&self, name: &str) -> Result<Entity<'c, U>>
    where
        U: Resource,
    {
        let link = self.record.find_link(U::MEDIA_TYPE, name).ok_or_else(|| {
            Error::NotFound(format!(
                "no `{}` link named `{name}` on {}",
                U::MEDIA_TYPE,
                self.record.href()
            ))
        })?;
        self.resolve_link(link).await
    }

    /// Re-fetch this entity's own href and replace the record in place.
    ///
    /// # Errors
    ///
    /// See [`Entity::fetch`]; on failure the current record is left untouched.
    pub async fn reload(&mut self) -> Result<()> {
        let fresh = Self::fetch(self.connector, self.record.href()).await?;
        self.record = fresh.record;
        Ok(())
    }

    /// POST `body` to the link with relation `rel` and request media type
    /// `media_type`, decoding the reply as either the created `U` or a task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if this entity offers no such link, otherwise any
    /// error from encoding, the POST, or decoding the reply.
    pub async fn create<B, U>(
        &self,
        rel: &str,
        media_type: &str,
        body: &B,
    ) -> Result<Submitted<'c, U>>
    where
        B: Serialize + Sync,
        U: Resource,
    {
        let link = self.record.find_rel(rel, media_type).ok_or_else(|| {
            Error::NotFound(format!(
                "no `{rel}` link for `{media_type}` on {}",
                self.record.href()
            ))
        })?;

        let payload = encode_xml(body)?;
        debug!(href = %link.href, media_type, "Submitting vCloud create request");
        let response = self.connector.post(&link.href, payload, media_type).await?;
        Submitted::from_response(self.connector, &response)
    }

    /// PUT the current record to its edit href.
    ///
    /// A reply carrying a task is returned for the caller to wait on; any other reply
    /// replaces the record (re-fetching it when the body is empty).
    ///
    /// # Errors
    ///
    /// Any error from encoding, the PUT, or decoding the reply.
    pub async fn update(&mut self) -> Result<Option<Task<'c>>>
    where
        T: Serialize,
    {
        let href = self.record.edit_href();
        let payload = encode_xml(&self.record)?;
        debug!(href = %href, media_type = T::MEDIA_TYPE, "Submitting vCloud update");
        let response = self.connector.put(&href, payload, T::MEDIA_TYPE).await?;

        if response.is_task() {
            return Task::from_response(self.connector, &response);
        }
        if response.is_empty() {
            self.reload().await?;
        } else {
            self.record = response.decode_resource()?;
        }
        Ok(None)
    }

    /// DELETE the resource at its edit href.
    ///
    /// # Errors
    ///
    /// Any error from the DELETE, or [`Error::Decode`] if a task reply is malformed.
    pub async fn delete(&self) -> Result<Option<Task<'c>>> {
        let href = self.record.edit_href();
        debug!(href = %href, "Deleting vCloud resource");
        let response = self.connector.delete(&href).await?;
        Task::from_response(self.connector, &response)
    }
}

impl<T> Deref for Entity<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.record
    }
}

impl<T> DerefMut for Entity<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.record
    }
}

/// Reply to a mutating call: the finished resource, or a task still running on the
/// server.
#[derive(Debug, Clone)]
pub enum Submitted<'c, T> {
    /// The server completed the operation synchronously.
    Done(Entity<'c, T>),
    /// The server accepted the operation and is running it asynchronously.
    Pending(Task<'c>),
}

impl<'c, T> Submitted<'c, T>
where
    T: Resource,
{
    /// Classify a mutating response by its media type or root element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the body is neither a task nor a `T`.
    pub fn from_response(connector: &'c Connector, response: &ApiResponse) -> Result<Self> {
        if response.is_task() {
            let record = response.decode_resource::<TaskRecord>()?;
            return Ok(Self::Pending(Entity::from_record(connector, record)));
        }
        let record = response.decode_resource::<T>()?;
        Ok(Self::Done(Entity::from_record(connector, record)))
    }

    /// The pending task, if the operation is asynchronous.
    #[must_use]
    pub fn into_task(self) -> Option<Task<'c>> {
        match self {
            Self::Done(_) => None,
            Self::Pending(task) => Some(task),
        }
    }

    /// Returns true if the server still has work to do.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}
