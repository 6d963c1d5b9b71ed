//! Deterministic mock capture backend for lifecycle tests.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

use crate::backend::{
    Acquisition, AcquisitionTicket, CaptureBackend, CaptureConfig, CaptureStream, StreamHandle,
};
use crate::Error;

/// Scripted result of one acquisition request.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Grant the device after the request has been polled `after_polls`
    /// times (0 resolves on the first poll).
    Grant {
        /// Polls to stay pending before granting.
        after_polls: u32,
    },
    /// Refuse with an access-denied error after `after_polls` polls.
    DenyAccess {
        /// Polls to stay pending before refusing.
        after_polls: u32,
    },
    /// Refuse with a device-unavailable error after `after_polls` polls.
    Unavailable {
        /// Polls to stay pending before refusing.
        after_polls: u32,
    },
}

struct PendingRequest {
    outcome: MockOutcome,
    polls_seen: u32,
}

/// Mock backend whose grants and denials follow a script.
///
/// Each acquisition request consumes the next script entry (an empty script
/// grants immediately). The backend counts open streams through a shared
/// counter decremented when a granted [`CaptureStream`] drops, so tests can
/// assert that no device outlives the handle that owned it.
pub struct MockBackend {
    script: VecDeque<MockOutcome>,
    pending: HashMap<u64, PendingRequest>,
    next_ticket: u64,
    open_streams: Arc<AtomicUsize>,
}

/// Decrements the open-stream counter when a granted stream drops.
struct OpenStreamGuard(Arc<AtomicUsize>);

impl Drop for OpenStreamGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockBackend {
    /// Creates a backend that grants every request on its first poll.
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            pending: HashMap::new(),
            next_ticket: 0,
            open_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Appends a scripted outcome; requests consume the script in order.
    pub fn push_outcome(&mut self, outcome: MockOutcome) {
        self.script.push_back(outcome);
    }

    /// Builder-style variant of [`push_outcome`](Self::push_outcome).
    pub fn with_outcome(mut self, outcome: MockOutcome) -> Self {
        self.push_outcome(outcome);
        self
    }

    /// Shared count of currently open (granted, not yet dropped) streams.
    pub fn open_streams(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.open_streams)
    }

    /// Number of requests still pending a result.
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    fn grant(&mut self) -> CaptureStream {
        self.open_streams.fetch_add(1, Ordering::SeqCst);
        let (_tx, rx) = mpsc::channel();
        CaptureStream::new(
            "mock capture".to_string(),
            48000,
            1,
            rx,
            StreamHandle::new(OpenStreamGuard(Arc::clone(&self.open_streams))),
        )
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn request_capture(&mut self, _config: &CaptureConfig) -> AcquisitionTicket {
        let ticket = AcquisitionTicket(self.next_ticket);
        self.next_ticket += 1;
        let outcome = self
            .script
            .pop_front()
            .unwrap_or(MockOutcome::Grant { after_polls: 0 });
        self.pending.insert(
            ticket.0,
            PendingRequest {
                outcome,
                polls_seen: 0,
            },
        );
        ticket
    }

    fn poll(&mut self, ticket: AcquisitionTicket) -> Acquisition {
        let Some(request) = self.pending.get_mut(&ticket.0) else {
            return Acquisition::Refused(Error::DeviceUnavailable(
                "unknown acquisition ticket".to_string(),
            ));
        };

        let due = match request.outcome {
            MockOutcome::Grant { after_polls }
            | MockOutcome::DenyAccess { after_polls }
            | MockOutcome::Unavailable { after_polls } => request.polls_seen >= after_polls,
        };
        if !due {
            request.polls_seen += 1;
            return Acquisition::Pending;
        }

        let request = self
            .pending
            .remove(&ticket.0)
            .expect("request present, checked above");
        match request.outcome {
            MockOutcome::Grant { .. } => Acquisition::Granted(self.grant()),
            MockOutcome::DenyAccess { .. } => Acquisition::Refused(Error::AccessDenied(
                "permission denied by host".to_string(),
            )),
            MockOutcome::Unavailable { .. } => Acquisition::Refused(Error::DeviceUnavailable(
                "no capture device present".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_script_grants_on_first_poll() {
        let mut backend = MockBackend::new();
        let open = backend.open_streams();
        let ticket = backend.request_capture(&CaptureConfig::default());

        match backend.poll(ticket) {
            Acquisition::Granted(stream) => {
                assert_eq!(open.load(Ordering::SeqCst), 1);
                drop(stream);
                assert_eq!(open.load(Ordering::SeqCst), 0);
            }
            other => panic!("expected grant, got {other:?}"),
        }
    }

    #[test]
    fn pending_polls_count_down() {
        let mut backend = MockBackend::new().with_outcome(MockOutcome::Grant { after_polls: 2 });
        let ticket = backend.request_capture(&CaptureConfig::default());

        assert!(matches!(backend.poll(ticket), Acquisition::Pending));
        assert!(matches!(backend.poll(ticket), Acquisition::Pending));
        assert!(matches!(backend.poll(ticket), Acquisition::Granted(_)));
    }

    #[test]
    fn denial_maps_to_access_denied() {
        let mut backend =
            MockBackend::new().with_outcome(MockOutcome::DenyAccess { after_polls: 0 });
        let ticket = backend.request_capture(&CaptureConfig::default());
        match backend.poll(ticket) {
            Acquisition::Refused(Error::AccessDenied(_)) => {}
            other => panic!("expected access denied, got {other:?}"),
        }
    }

    #[test]
    fn resolved_ticket_cannot_resolve_twice() {
        let mut backend = MockBackend::new();
        let ticket = backend.request_capture(&CaptureConfig::default());
        assert!(matches!(backend.poll(ticket), Acquisition::Granted(_)));
        assert!(matches!(
            backend.poll(ticket),
            Acquisition::Refused(Error::DeviceUnavailable(_))
        ));
    }
}
