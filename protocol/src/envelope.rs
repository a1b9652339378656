//! `Envelope`: session/node/event identity attached to outbound frames so a
//! client can correlate streamed events with the run that produced them.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub session_id: String,
    pub node_id: String,
    pub event_id: u64,
}

impl Envelope {
    pub fn new(session_id: impl Into<String>, node_id: impl Into<String>, event_id: u64) -> Self {
        Self { session_id: session_id.into(), node_id: node_id.into(), event_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_all_fields() {
        let env = Envelope::new("s1", "research", 3);
        assert_eq!(env.session_id, "s1");
        assert_eq!(env.node_id, "research");
        assert_eq!(env.event_id, 3);
    }
}
