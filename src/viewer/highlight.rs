use crate::gfx::{
    picking::PickResult,
    scene::{NodeId, SceneGraph},
};

/// Emissive value of a node that is not emphasized
pub const NEUTRAL_EMISSIVE: [f32; 3] = [0.0, 0.0, 0.0];

/// What a click asks the transition controller to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    None,
    EnterInterior,
}

/// Remembers the single emphasized node and restores it when the pointer
/// moves on.
#[derive(Debug, Clone)]
pub struct HighlightTracker {
    current: Option<NodeId>,
    color: [f32; 3],
    door_id: String,
}

impl HighlightTracker {
    pub fn new(color: [f32; 3], door_id: impl Into<String>) -> Self {
        Self {
            current: None,
            color,
            door_id: door_id.into(),
        }
    }

    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    /// Moves the emphasis to the nearest hit if it is interactive
    pub fn on_pointer_move(&mut self, result: &PickResult, graph: &mut SceneGraph) {
        let candidate = result.nearest().map(|hit| hit.node);

        if let Some(previous) = self.current {
            if Some(previous) != candidate {
                if let Some(node) = graph.node_mut(previous) {
                    node.set_emissive(NEUTRAL_EMISSIVE);
                }
                self.current = None;
            }
        }

        let Some(candidate) = candidate else {
            return;
        };
        let Some(node) = graph.node_mut(candidate) else {
            return;
        };
        if node.interactive {
            if node.set_emissive(self.color) {
                log::debug!("Highlighting {}", node.name);
            }
            self.current = Some(candidate);
        }
    }

    /// Maps a click to an action; only the door does anything
    pub fn on_click(&self, result: &PickResult, graph: &SceneGraph) -> ClickAction {
        let Some(node) = result.nearest().and_then(|hit| graph.node(hit.node)) else {
            return ClickAction::None;
        };

        log::debug!("Clicked {}", node.name);
        if node.name == self.door_id {
            ClickAction::EnterInterior
        } else {
            ClickAction::None
        }
    }

    /// Drops the recorded node without touching any graph; used when the
    /// graph it belonged to is discarded
    pub fn forget(&mut self) {
        self.current = None;
    }
}
