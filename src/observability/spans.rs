//! Session spans.
//!
//! Every signing session gets a UUID v4 and a span carrying it, so all
//! events of one request can be correlated. The chain id is recorded once
//! the request has been decoded.

use tracing::field;
use tracing::Span;
use uuid::Uuid;

pub fn new_session_id() -> Uuid {
    Uuid::new_v4()
}

pub fn session_span(session_id: Uuid) -> Span {
    tracing::info_span!("esr_session", session_id = %session_id, chain_id = field::Empty)
}

pub fn record_chain_id(span: &Span, chain_id: &str) {
    span.record("chain_id", chain_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique_v4() {
        let a = new_session_id();
        let b = new_session_id();
        assert_ne!(a, b);
        assert_eq!(a.get_version_num(), 4);
    }

    #[test]
    fn test_span_without_subscriber() {
        let span = session_span(new_session_id());
        record_chain_id(&span, "aca376f2");
        let _entered = span.enter();
    }
}
