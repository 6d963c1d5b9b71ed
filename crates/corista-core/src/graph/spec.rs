//! Graph description, validation, and the fixed voice topology.

use thiserror::Error;

use crate::toggles::EffectToggles;

/// Echo delay time when the echo toggle is on, in seconds.
pub const ECHO_DELAY_SECS: f32 = 0.18;
/// Echo feedback amount when the echo toggle is on.
pub const ECHO_FEEDBACK: f32 = 0.25;
/// Reverb kernel duration in seconds.
pub const REVERB_DURATION_SECS: f32 = 1.6;
/// Reverb kernel decay exponent.
pub const REVERB_DECAY: f32 = 2.8;
/// Gain on the unprocessed monitoring path.
pub const DRY_GAIN: f32 = 0.9;
/// Gain on the reverb return when the reverb toggle is on.
pub const WET_GAIN: f32 = 0.8;

/// Index of a node within a [`GraphSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The raw index into the spec's node list.
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// One node in the declarative graph description.
///
/// This is pure description — nothing is allocated until the spec is
/// compiled or realized.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeSpec {
    /// The capture source (microphone). Exactly one per graph.
    Capture,
    /// Fixed linear gain stage.
    Gain {
        /// Role of this gain stage, used for handles and logs.
        label: &'static str,
        /// Linear gain factor.
        gain: f32,
    },
    /// Feedback echo delay.
    Echo {
        /// Delay time in seconds (zero means transparent).
        delay_secs: f32,
        /// Feedback amount.
        feedback: f32,
    },
    /// Soft-clip waveshaper.
    Shaper,
    /// Transparent placeholder keeping the shape fixed when an effect slot
    /// is disabled.
    Passthrough,
    /// Convolution reverb with a freshly generated decaying-noise kernel.
    Reverb {
        /// Kernel duration in seconds.
        duration_secs: f32,
        /// Kernel decay exponent.
        decay: f32,
    },
    /// The output sink. Exactly one per graph.
    Sink,
}

impl NodeSpec {
    /// Short name for logs and node handles.
    pub fn label(&self) -> &'static str {
        match self {
            NodeSpec::Capture => "capture",
            NodeSpec::Gain { label, .. } => *label,
            NodeSpec::Echo { .. } => "echo",
            NodeSpec::Shaper => "shaper",
            NodeSpec::Passthrough => "passthrough",
            NodeSpec::Reverb { .. } => "reverb",
            NodeSpec::Sink => "sink",
        }
    }
}

/// Errors from validating a graph description.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A graph must have exactly one capture node.
    #[error("expected exactly one capture node, found {0}")]
    CaptureCount(usize),
    /// A graph must have exactly one sink node.
    #[error("expected exactly one sink node, found {0}")]
    SinkCount(usize),
    /// An edge references a node index outside the node list.
    #[error("edge {from} → {to} references a node outside the graph")]
    EdgeOutOfRange {
        /// Source index of the offending edge.
        from: usize,
        /// Destination index of the offending edge.
        to: usize,
    },
    /// The same edge was declared twice.
    #[error("duplicate edge {from} → {to}")]
    DuplicateEdge {
        /// Source index.
        from: usize,
        /// Destination index.
        to: usize,
    },
    /// An edge terminates at the capture node.
    #[error("node {0} connects into the capture source")]
    EdgeIntoCapture(usize),
    /// An edge leaves the sink node.
    #[error("the sink has an outgoing edge to node {0}")]
    EdgeOutOfSink(usize),
    /// The edges form a cycle.
    #[error("the graph contains a cycle")]
    CycleDetected,
    /// A node is not on any capture → sink path.
    #[error("node {0} ({1}) is not on a capture → sink path")]
    Disconnected(usize, &'static str),
}

/// Declarative audio graph: an explicit node list plus edge list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphSpec {
    nodes: Vec<NodeSpec>,
    edges: Vec<(usize, usize)>,
}

impl GraphSpec {
    /// Creates an empty description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node, returning its id.
    pub fn node(&mut self, spec: NodeSpec) -> NodeId {
        self.nodes.push(spec);
        NodeId(self.nodes.len() - 1)
    }

    /// Declares a directed edge. Validation happens in [`validate`](Self::validate),
    /// not here, so a spec under construction can be inspected whole.
    pub fn connect(&mut self, from: NodeId, to: NodeId) {
        self.edges.push((from.0, to.0));
    }

    /// The node list.
    pub fn nodes(&self) -> &[NodeSpec] {
        &self.nodes
    }

    /// The edge list as `(from, to)` index pairs.
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Indices of the direct predecessors of every node.
    pub fn predecessors(&self) -> Vec<Vec<usize>> {
        let mut preds = vec![Vec::new(); self.nodes.len()];
        for &(from, to) in &self.edges {
            if to < preds.len() {
                preds[to].push(from);
            }
        }
        preds
    }

    /// Checks the description for structural soundness.
    ///
    /// Exactly one capture and one sink, all edges in range and unique, no
    /// edge into the capture or out of the sink, no cycles, and every node on
    /// a capture → sink path.
    pub fn validate(&self) -> Result<(), GraphError> {
        let captures = self
            .nodes
            .iter()
            .filter(|n| matches!(n, NodeSpec::Capture))
            .count();
        if captures != 1 {
            return Err(GraphError::CaptureCount(captures));
        }
        let sinks = self
            .nodes
            .iter()
            .filter(|n| matches!(n, NodeSpec::Sink))
            .count();
        if sinks != 1 {
            return Err(GraphError::SinkCount(sinks));
        }

        let mut seen = std::collections::HashSet::new();
        for &(from, to) in &self.edges {
            if from >= self.nodes.len() || to >= self.nodes.len() {
                return Err(GraphError::EdgeOutOfRange { from, to });
            }
            if !seen.insert((from, to)) {
                return Err(GraphError::DuplicateEdge { from, to });
            }
            if matches!(self.nodes[to], NodeSpec::Capture) {
                return Err(GraphError::EdgeIntoCapture(from));
            }
            if matches!(self.nodes[from], NodeSpec::Sink) {
                return Err(GraphError::EdgeOutOfSink(to));
            }
        }

        let order = self.topo_order()?;
        debug_assert_eq!(order.len(), self.nodes.len());

        // Reachability in both directions: forward from capture, backward
        // from sink. A node off either set does no useful work.
        let capture = self
            .nodes
            .iter()
            .position(|n| matches!(n, NodeSpec::Capture))
            .unwrap_or(0);
        let sink = self
            .nodes
            .iter()
            .position(|n| matches!(n, NodeSpec::Sink))
            .unwrap_or(0);
        let forward = self.reachable(capture, false);
        let backward = self.reachable(sink, true);
        for (i, node) in self.nodes.iter().enumerate() {
            if !(forward[i] && backward[i]) {
                return Err(GraphError::Disconnected(i, node.label()));
            }
        }
        Ok(())
    }

    /// Kahn topological sort over all nodes.
    ///
    /// Errors with [`GraphError::CycleDetected`] when the edges loop. Edges
    /// must already be range-checked.
    pub fn topo_order(&self) -> Result<Vec<usize>, GraphError> {
        let n = self.nodes.len();
        let mut in_degree = vec![0usize; n];
        for &(_, to) in &self.edges {
            if to < n {
                in_degree[to] += 1;
            }
        }

        let mut queue: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(idx) = queue.pop() {
            order.push(idx);
            for &(from, to) in &self.edges {
                if from == idx && to < n {
                    in_degree[to] -= 1;
                    if in_degree[to] == 0 {
                        queue.push(to);
                    }
                }
            }
        }

        if order.len() != n {
            return Err(GraphError::CycleDetected);
        }
        Ok(order)
    }

    /// DFS reachability set from `start`, following edges forward or
    /// (with `reverse`) backward.
    fn reachable(&self, start: usize, reverse: bool) -> Vec<bool> {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if visited[current] {
                continue;
            }
            visited[current] = true;
            for &(from, to) in &self.edges {
                let (tail, head) = if reverse { (to, from) } else { (from, to) };
                if tail == current && !visited[head] {
                    stack.push(head);
                }
            }
        }
        visited
    }
}

/// Builds the fixed voice-chain topology for an [`EffectToggles`] snapshot.
///
/// The structure never varies with the snapshot; disabled effects become
/// transparent parameters (zero delay/feedback, a passthrough in the shaper
/// slot, zero wet gain). The wet branch stays wired even with reverb off —
/// gating happens in the wet gain.
pub fn voice_topology(toggles: EffectToggles) -> GraphSpec {
    let mut spec = GraphSpec::new();

    let capture = spec.node(NodeSpec::Capture);
    let input = spec.node(NodeSpec::Gain {
        label: "input",
        gain: 1.0,
    });
    let echo = spec.node(NodeSpec::Echo {
        delay_secs: if toggles.echo { ECHO_DELAY_SECS } else { 0.0 },
        feedback: if toggles.echo { ECHO_FEEDBACK } else { 0.0 },
    });
    let drive = if toggles.distortion {
        spec.node(NodeSpec::Shaper)
    } else {
        spec.node(NodeSpec::Passthrough)
    };
    let reverb = spec.node(NodeSpec::Reverb {
        duration_secs: REVERB_DURATION_SECS,
        decay: REVERB_DECAY,
    });
    let dry = spec.node(NodeSpec::Gain {
        label: "dry",
        gain: DRY_GAIN,
    });
    let wet = spec.node(NodeSpec::Gain {
        label: "wet",
        gain: if toggles.reverb { WET_GAIN } else { 0.0 },
    });
    let master = spec.node(NodeSpec::Gain {
        label: "master",
        gain: 1.0,
    });
    let sink = spec.node(NodeSpec::Sink);

    spec.connect(capture, input);
    spec.connect(input, echo);
    spec.connect(echo, drive);
    spec.connect(drive, reverb);
    spec.connect(reverb, wet);
    spec.connect(input, dry);
    spec.connect(dry, master);
    spec.connect(wet, master);
    spec.connect(master, sink);

    spec
}
