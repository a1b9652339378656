//! Client protocol (§6.1): the inbound/outbound message enums `serve`
//! bridges to/from `engine::workflow::Engine`, plus the per-event
//! `Envelope`.

mod envelope;
mod message;

pub use envelope::Envelope;
pub use message::{ClientMessage, ServerMessage};
