//! Commands for the postcard context.

use super::aggregates::Address;

/// Command to create a new postcard.
#[derive(Debug, Clone)]
pub struct CreatePostcard {
    /// The identifier of the postcard to create.
    pub postcard_id: String,
}

/// Command to set sender and addressee.
#[derive(Debug, Clone)]
pub struct AddressPostcard {
    /// The postcard to address.
    pub postcard_id: String,
    /// Who sends the postcard.
    pub sender: Address,
    /// Who receives it.
    pub addressee: Address,
}

/// Command to write the message.
#[derive(Debug, Clone)]
pub struct WritePostcard {
    /// The postcard to write on.
    pub postcard_id: String,
    /// The message.
    pub content: String,
}

/// Command to send the postcard.
#[derive(Debug, Clone)]
pub struct SendPostcard {
    /// The postcard to send.
    pub postcard_id: String,
}
