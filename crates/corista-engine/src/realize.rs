//! Graph realization: from validated description to live handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use corista_core::EffectToggles;
use corista_core::graph::GraphSpec;

use crate::backend::{CaptureStream, StreamHandle};
use crate::{Error, Result};

/// Handle to one realized processing node.
///
/// Carries an optional RAII guard; whatever resource the node occupies is
/// released when the handle drops. Handles exist so teardown and leak
/// accounting work identically for real and null realizations.
pub struct NodeHandle {
    label: String,
    _guard: Option<Box<dyn Send>>,
}

impl NodeHandle {
    /// Creates a node handle with an optional drop guard.
    pub fn new(label: impl Into<String>, guard: Option<Box<dyn Send>>) -> Self {
        Self {
            label: label.into(),
            _guard: guard,
        }
    }

    /// The node's label.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl std::fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeHandle")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Everything one live graph instance owns.
///
/// Exclusively held by the mic controller. Dropping it releases every node
/// handle and stops every stream — there is no partial teardown.
pub struct GraphHandle {
    toggles: EffectToggles,
    nodes: Vec<NodeHandle>,
    _streams: Vec<StreamHandle>,
}

impl GraphHandle {
    /// Assembles a handle from realized parts.
    pub fn new(toggles: EffectToggles, nodes: Vec<NodeHandle>, streams: Vec<StreamHandle>) -> Self {
        tracing::debug!("graph live: {} nodes, toggles {:?}", nodes.len(), toggles);
        Self {
            toggles,
            nodes,
            _streams: streams,
        }
    }

    /// The configuration snapshot this graph was built for.
    pub fn toggles(&self) -> EffectToggles {
        self.toggles
    }

    /// Number of realized nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Labels of the realized nodes, in declaration order.
    pub fn node_labels(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(NodeHandle::label)
    }
}

impl std::fmt::Debug for GraphHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphHandle")
            .field("toggles", &self.toggles)
            .field("nodes", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

/// Turns a graph description plus a capture stream into a live graph.
///
/// Realization is all-or-nothing: on any error, every node handle created in
/// the same call is released (and the capture stream dropped, stopping the
/// device) before the error reaches the caller.
pub trait GraphRealizer: Send {
    /// Realizes `spec` against `capture`.
    fn realize(
        &mut self,
        spec: &GraphSpec,
        capture: CaptureStream,
        toggles: EffectToggles,
    ) -> Result<GraphHandle>;
}

/// Decrements a shared counter when dropped.
struct CountGuard(Arc<AtomicUsize>);

impl Drop for CountGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Topology-only realizer for tests.
///
/// Validates the description and allocates one counted handle per node — no
/// audio backend, no devices. The shared live-node counter makes leak
/// assertions trivial, and a scripted failure index exercises the
/// all-or-nothing rollback path.
pub struct NullRealizer {
    live_nodes: Arc<AtomicUsize>,
    fail_at: Option<usize>,
}

impl NullRealizer {
    /// Creates a realizer that succeeds on every build.
    pub fn new() -> Self {
        Self {
            live_nodes: Arc::new(AtomicUsize::new(0)),
            fail_at: None,
        }
    }

    /// Makes every subsequent build fail while allocating the node at
    /// `index`, after the nodes before it were already created.
    pub fn fail_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Shared count of currently live node handles.
    pub fn live_nodes(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.live_nodes)
    }
}

impl Default for NullRealizer {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphRealizer for NullRealizer {
    fn realize(
        &mut self,
        spec: &GraphSpec,
        capture: CaptureStream,
        toggles: EffectToggles,
    ) -> Result<GraphHandle> {
        spec.validate()?;

        let mut nodes = Vec::with_capacity(spec.nodes().len());
        for (index, node) in spec.nodes().iter().enumerate() {
            if self.fail_at == Some(index) {
                // `nodes` (and `capture`) drop here: full rollback.
                return Err(Error::GraphConstruction {
                    node: node.label().to_string(),
                    reason: "scripted allocation failure".to_string(),
                });
            }
            self.live_nodes.fetch_add(1, Ordering::SeqCst);
            nodes.push(NodeHandle::new(
                node.label(),
                Some(Box::new(CountGuard(Arc::clone(&self.live_nodes)))),
            ));
        }

        let (_name, _rate, _channels, _frames, handle) = capture.into_parts();
        Ok(GraphHandle::new(toggles, nodes, vec![handle]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CaptureStream;
    use corista_core::graph::voice_topology;
    use std::sync::mpsc;

    fn fake_capture() -> CaptureStream {
        let (_tx, rx) = mpsc::channel();
        CaptureStream::new("fake".to_string(), 48000, 1, rx, StreamHandle::new(()))
    }

    #[test]
    fn realize_then_drop_releases_every_node() {
        let mut realizer = NullRealizer::new();
        let live = realizer.live_nodes();

        let spec = voice_topology(EffectToggles::default());
        let graph = realizer
            .realize(&spec, fake_capture(), EffectToggles::default())
            .expect("realizes");
        assert_eq!(live.load(Ordering::SeqCst), spec.nodes().len());
        assert_eq!(graph.node_count(), spec.nodes().len());

        drop(graph);
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failed_realization_rolls_back_created_nodes() {
        let mut realizer = NullRealizer::new().fail_at(4);
        let live = realizer.live_nodes();

        let spec = voice_topology(EffectToggles::default());
        let err = realizer
            .realize(&spec, fake_capture(), EffectToggles::default())
            .unwrap_err();
        assert!(matches!(err, Error::GraphConstruction { .. }));
        assert_eq!(
            live.load(Ordering::SeqCst),
            0,
            "partially created nodes must be released before the error propagates"
        );
    }

    #[test]
    fn invalid_spec_is_rejected_before_allocation() {
        let mut realizer = NullRealizer::new();
        let live = realizer.live_nodes();

        let err = realizer
            .realize(
                &GraphSpec::new(),
                fake_capture(),
                EffectToggles::default(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Topology(_)));
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn node_labels_follow_the_spec() {
        let mut realizer = NullRealizer::new();
        let graph = realizer
            .realize(
                &voice_topology(EffectToggles::default()),
                fake_capture(),
                EffectToggles::default(),
            )
            .unwrap();
        let labels: Vec<&str> = graph.node_labels().collect();
        assert_eq!(labels[0], "capture");
        assert!(labels.contains(&"reverb"));
        assert_eq!(labels[labels.len() - 1], "sink");
    }
}
