//! Result sets and paging.

use std::collections::VecDeque;

use futures::stream::{self, Stream};
use serde_json::Value;

use crate::client::Resource;
use crate::entity::Entity;
use crate::envelope::Envelope;
use crate::error::{Error, ErrorKind, Result};

/// The reply of one resource operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    resource_name: String,
    envelope: Envelope,
}

impl ResultSet {
    pub fn new(resource_name: impl Into<String>, envelope: Envelope) -> Self {
        Self {
            resource_name: resource_name.into(),
            envelope,
        }
    }

    /// Resource that produced this result.
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn is_valid(&self) -> bool {
        self.envelope.is_valid()
    }

    pub fn is_empty(&self) -> bool {
        self.envelope.is_empty()
    }

    pub fn has_more_results(&self) -> bool {
        self.envelope.has_more_results()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.envelope.request_id()
    }

    pub fn rows(&self) -> &[Value] {
        self.envelope.rows()
    }

    pub fn entities_count(&self) -> usize {
        self.envelope.rows().len()
    }

    pub fn entities(&self) -> Vec<Entity> {
        self.envelope.rows().iter().cloned().map(Entity::new).collect()
    }

    pub fn into_entities(self) -> Vec<Entity> {
        self.envelope.into_rows().into_iter().map(Entity::new).collect()
    }

    /// Fetch the next page through `resource`.
    ///
    /// Fails with [`ErrorKind::NoMoreData`] when the service reported no
    /// further pages.
    pub async fn get_more_results(&self, resource: &mut Resource<'_>) -> Result<ResultSet> {
        let request_id = match (self.has_more_results(), self.request_id()) {
            (true, Some(id)) => id,
            _ => {
                return Err(Error::new(ErrorKind::NoMoreData(format!(
                    "No more data available for {} request[{}]",
                    self.resource_name,
                    self.request_id().unwrap_or("none")
                ))))
            }
        };
        resource.more_results(request_id).await
    }
}

/// Walks every entity of a result set, fetching further pages on demand.
pub struct EntityCursor<'r, 'c> {
    resource: &'r mut Resource<'c>,
    current: ResultSet,
    pending: VecDeque<Entity>,
}

impl<'r, 'c> EntityCursor<'r, 'c> {
    pub(crate) fn new(resource: &'r mut Resource<'c>, result: ResultSet) -> Self {
        let pending = result.entities().into();
        Self {
            resource,
            current: result,
            pending,
        }
    }

    /// The page currently being walked.
    pub fn current(&self) -> &ResultSet {
        &self.current
    }

    /// The next entity, or `None` once the last page is exhausted.
    pub async fn next(&mut self) -> Result<Option<Entity>> {
        loop {
            if let Some(entity) = self.pending.pop_front() {
                return Ok(Some(entity));
            }
            if !self.current.has_more_results() {
                return Ok(None);
            }
            let next = self.current.get_more_results(self.resource).await?;
            self.pending = next.entities().into();
            self.current = next;
        }
    }

    /// The remaining entities as a stream.
    pub fn into_stream(self) -> impl Stream<Item = Result<Entity>> + use<'r, 'c> {
        stream::try_unfold(self, |mut cursor| async move {
            Ok(cursor.next().await?.map(|entity| (entity, cursor)))
        })
    }

    /// Drain every remaining entity across pages.
    pub async fn collect_all(mut self) -> Result<Vec<Entity>> {
        let mut entities = Vec::new();
        while let Some(entity) = self.next().await? {
            entities.push(entity);
        }
        Ok(entities)
    }
}
