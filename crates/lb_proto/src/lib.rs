//! lb_proto — Lockbox record model and wire types
//!
//! A [`Record`] is the addressable unit shared by the server store, the
//! client cache and the HTTP API.  Its `opaque` field carries a packed
//! [`Payload`]; nothing outside the client ever looks inside it.

pub mod api;
pub mod error;
pub mod payload;
pub mod record;

pub use api::{StatusResponse, User, STATUS_OK};
pub use error::ProtoError;
pub use payload::{Account, Binary, Card, Note, Payload};
pub use record::{Record, RecordType, Records};
