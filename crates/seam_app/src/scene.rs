// SPDX-License-Identifier: MIT OR Apache-2.0
//! The demo graph driven by the headless host.
//!
//! ```text
//! Clock ──────┐
//!             ├─> Mix ─> Gradient ─> Preview
//! Constant ───┘
//! Pulse (unobserved until rewired into Mix.b)
//! ```

use crate::nodes::{CLOCK, CONSTANT, GRADIENT, MIX, PREVIEW, PULSE};
use seam_graph::{ConnectionError, GraphEngine, NodeId, PinDirection, PinId};

/// Errors while building or editing the demo graph
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The registry has no type with this name
    #[error("Unknown node type: {0}")]
    UnknownNodeType(&'static str),

    /// A node does not declare the requested pin
    #[error("{node} has no {direction:?} pin named {pin:?}")]
    MissingPin {
        /// Node name
        node: String,
        /// Requested pin name
        pin: &'static str,
        /// Requested direction
        direction: PinDirection,
    },

    /// The engine refused a link
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// Handles to the nodes of the demo graph
#[derive(Debug, Clone, Copy)]
pub struct Scene {
    /// Time source feeding the mix
    pub clock: NodeId,
    /// Unobserved until [`Scene::rewire`] links it into the mix
    pub pulse: NodeId,
    /// Initial second input of the mix
    pub constant: NodeId,
    /// Blends the clock with the constant or the pulse
    pub mix: NodeId,
    /// Visual intermediate, hidden but evaluated as an ancestor
    pub gradient: NodeId,
    /// The observed sink
    pub preview: NodeId,
}

impl Scene {
    /// Instantiate and wire the demo graph
    pub fn build(engine: &mut GraphEngine) -> Result<Self, SceneError> {
        let mut add = |name: &'static str| {
            engine
                .create_and_add_by_name(name)
                .ok_or(SceneError::UnknownNodeType(name))
        };
        let scene = Self {
            clock: add(CLOCK)?,
            pulse: add(PULSE)?,
            constant: add(CONSTANT)?,
            mix: add(MIX)?,
            gradient: add(GRADIENT)?,
            preview: add(PREVIEW)?,
        };

        link(engine, (scene.clock, "time"), (scene.mix, "a"))?;
        link(engine, (scene.constant, "value"), (scene.mix, "b"))?;
        link(engine, (scene.mix, "result"), (scene.gradient, "value"))?;
        link(engine, (scene.gradient, "texture"), (scene.preview, "texture"))?;

        // only the sink is observed; the gradient still runs as its ancestor
        engine.hide_node(scene.gradient);
        engine.show_node(scene.preview);

        tracing::info!(
            nodes = engine.node_count(),
            links = engine.link_count(),
            clock = ?scene.clock,
            sink = ?scene.preview,
            "Built demo graph"
        );
        Ok(scene)
    }

    /// Feed the mix from the pulse instead of the constant
    pub fn rewire(&self, engine: &mut GraphEngine) -> Result<(), SceneError> {
        let constant = find_pin(engine, self.constant, "value", PinDirection::Output)?;
        let pulse = find_pin(engine, self.pulse, "trigger", PinDirection::Output)?;
        let input = find_pin(engine, self.mix, "b", PinDirection::Input)?;

        engine.disconnect(constant, input)?;
        engine.connect(pulse, input)?;
        tracing::info!("Rewired mix input from constant to pulse");
        Ok(())
    }
}

fn link(
    engine: &mut GraphEngine,
    (from, output): (NodeId, &'static str),
    (to, input): (NodeId, &'static str),
) -> Result<(), SceneError> {
    let output = find_pin(engine, from, output, PinDirection::Output)?;
    let input = find_pin(engine, to, input, PinDirection::Input)?;
    engine.connect(output, input)?;
    Ok(())
}

/// Look up a pin of `node` by name
fn find_pin(
    engine: &GraphEngine,
    node: NodeId,
    pin: &'static str,
    direction: PinDirection,
) -> Result<PinId, SceneError> {
    let missing = || SceneError::MissingPin {
        node: engine
            .node(node)
            .map_or_else(|| format!("{node:?}"), |n| n.name().to_string()),
        pin,
        direction,
    };
    let owner = engine.node(node).ok_or_else(missing)?;
    let pins = match direction {
        PinDirection::Input => owner.inputs(),
        PinDirection::Output => owner.outputs(),
    };
    pins.iter()
        .copied()
        .find(|&id| engine.pin(id).is_some_and(|p| p.name == pin))
        .ok_or_else(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::builtin_registry;
    use seam_graph::EngineConfig;

    fn engine() -> GraphEngine {
        let config = EngineConfig {
            verify_invariants: true,
            ..EngineConfig::default()
        };
        GraphEngine::with_registry(builtin_registry(), config)
    }

    #[test]
    fn test_demo_graph_layers() {
        let mut engine = engine();
        let scene = Scene::build(&mut engine).unwrap();

        assert_eq!(engine.link_count(), 4);
        assert_eq!(engine.update_order(scene.mix), Some(1));
        assert_eq!(engine.update_order(scene.preview), Some(3));
        assert_eq!(engine.draw_order(scene.gradient), Some(1));
        assert_eq!(engine.draw_order(scene.preview), Some(2));

        assert_eq!(engine.visible_nodes().collect::<Vec<_>>(), vec![scene.preview]);

        engine.update(0.1);
        assert_eq!(engine.nodes_to_draw(), &[scene.gradient, scene.preview]);
        assert!(!engine.evaluated_nodes().contains(&scene.pulse));
    }

    #[test]
    fn test_rewire_moves_the_source() {
        let mut engine = engine();
        let scene = Scene::build(&mut engine).unwrap();
        engine.update(0.1);

        scene.rewire(&mut engine).unwrap();
        assert_eq!(engine.connection_count(scene.constant, scene.mix), 0);
        assert_eq!(engine.connection_count(scene.pulse, scene.mix), 1);
        assert_eq!(engine.link_count(), 4);

        engine.update(0.1);
        assert!(engine.evaluated_nodes().contains(&scene.pulse));
        assert!(!engine.evaluated_nodes().contains(&scene.constant));
    }

    #[test]
    fn test_missing_pin() {
        let mut engine = engine();
        let scene = Scene::build(&mut engine).unwrap();
        let err = find_pin(&engine, scene.mix, "c", PinDirection::Input).unwrap_err();
        assert!(matches!(err, SceneError::MissingPin { pin: "c", .. }));
    }
}
