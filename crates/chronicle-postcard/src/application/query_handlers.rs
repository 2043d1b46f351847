//! Query handlers for the postcard context.

use chronicle_core::entity::Entity;
use chronicle_core::error::DomainError;
use chronicle_core::store::EventStore;
use chronicle_core::stream::StreamId;
use serde::Serialize;

use crate::domain::aggregates::{Address, Postcard};

/// Read-only view of a postcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostcardView {
    /// The postcard identifier.
    pub postcard_id: String,
    /// Who sends the postcard.
    pub sender: Address,
    /// Who receives it.
    pub addressee: Address,
    /// The message.
    pub content: String,
    /// Whether it has been sent.
    pub sent: bool,
    /// Version of the last stored event.
    pub version: i64,
}

impl From<&Postcard> for PostcardView {
    fn from(postcard: &Postcard) -> Self {
        Self {
            postcard_id: postcard.id().to_owned(),
            sender: postcard.sender().clone(),
            addressee: postcard.addressee().clone(),
            content: postcard.content().to_owned(),
            sent: postcard.is_sent(),
            version: postcard.stream().version(),
        }
    }
}

/// Retrieves a postcard by its id.
///
/// # Errors
///
/// Returns `DomainError::StreamNotFound` if nothing is stored for the id,
/// or any store failure.
pub async fn get_postcard_by_id(
    postcard_id: &str,
    store: &dyn EventStore<Postcard>,
) -> Result<PostcardView, DomainError> {
    let id = StreamId::new(postcard_id)?;
    let postcard = store.load(&id).await?;
    Ok(PostcardView::from(&postcard))
}
