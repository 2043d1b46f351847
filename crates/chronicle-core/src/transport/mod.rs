//! Payload transport: turning events and snapshots into bytes and back.
//!
//! Encoding happens in two steps. A [`Mapper`] turns a domain event into a
//! transport value (optionally through a dedicated transport model, with
//! sensitive fields anonymized), then a [`Marshaler`] turns that value into
//! bytes. [`EventSerializer`] combines both and is what stores consume.

mod anonymizer;
mod mapper;
mod marshaler;
mod serializer;

pub use anonymizer::{
    AesAnonymizer, Anonymizer, ConstantSecretProvider, HashingAnonymizer, MaskingAnonymizer,
    SecretProvider,
};
pub use mapper::{DefaultMapper, Mapper, NoOpMapper, TransportEvent};
pub use marshaler::{JsonMarshaler, Marshaler, YamlMarshaler};
pub use serializer::{EventSerializer, SnapshotCodec, SnapshotSerializer};
