//! Standardized span constructors for lifecycle observability.

pub mod spans {
    use tracing::{Span, debug_span, info_span};
    use uuid::Uuid;

    /// Span for one lifecycle event handler.
    pub fn lifecycle_event(kind: &str, uuid: Option<Uuid>) -> Span {
        match uuid {
            Some(uuid) => info_span!("lifecycle", kind = %kind, uuid = %uuid),
            None => info_span!("lifecycle", kind = %kind),
        }
    }

    /// Span for a deferred task running on the scheduler.
    pub fn deferred_task(label: &str) -> Span {
        debug_span!("deferred", task = %label)
    }
}
