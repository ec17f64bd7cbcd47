// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared node behaviours and graph helpers for the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use seam_graph::{
    EngineConfig, GraphEngine, NodeBehavior, NodeId, NodeTypeId, PinId, PinSpec, PinType,
    UpdateResult,
};

/// Records `update:<name>` and `draw:<name>` events across nodes
pub type EventLog = Rc<RefCell<Vec<String>>>;

/// Configurable test node
pub struct TestNode {
    pub name: String,
    pub inputs: Vec<PinSpec>,
    pub outputs: Vec<PinSpec>,
    pub visual: bool,
    pub over_time: bool,
    pub result: UpdateResult,
    pub log: EventLog,
}

impl NodeBehavior for TestNode {
    fn update(&mut self, _elapsed: f32) -> UpdateResult {
        self.log.borrow_mut().push(format!("update:{}", self.name));
        self.result
    }

    fn draw(&mut self) {
        self.log.borrow_mut().push(format!("draw:{}", self.name));
    }

    fn is_visual(&self) -> bool {
        self.visual
    }

    fn updates_over_time(&self) -> bool {
        self.over_time
    }

    fn inputs(&self) -> &[PinSpec] {
        &self.inputs
    }

    fn outputs(&self) -> &[PinSpec] {
        &self.outputs
    }
}

/// Declarative description of a test node
#[derive(Clone)]
pub struct Shape {
    pub visual: bool,
    pub over_time: bool,
    pub result: UpdateResult,
    pub inputs: Vec<PinType>,
    pub outputs: Vec<PinType>,
}

impl Shape {
    /// Non-visual node with `inputs` float inputs and `outputs` float outputs
    pub fn plain(inputs: usize, outputs: usize) -> Self {
        Self {
            visual: false,
            over_time: false,
            result: UpdateResult::Changed,
            inputs: vec![PinType::Float; inputs],
            outputs: vec![PinType::Float; outputs],
        }
    }

    /// Visual node with float pins
    pub fn visual(inputs: usize, outputs: usize) -> Self {
        Self {
            visual: true,
            ..Self::plain(inputs, outputs)
        }
    }

    pub fn over_time(mut self, result: UpdateResult) -> Self {
        self.over_time = true;
        self.result = result;
        self
    }
}

/// An engine with invariant checks on, plus a shared event log
pub struct Harness {
    pub engine: GraphEngine,
    pub log: EventLog,
}

impl Harness {
    pub fn new() -> Self {
        let config = EngineConfig {
            auto_show_visual_nodes: false,
            verify_invariants: true,
        };
        Self {
            engine: GraphEngine::new(config),
            log: EventLog::default(),
        }
    }

    pub fn add(&mut self, name: &str, shape: Shape) -> NodeId {
        let pins = |types: &[PinType], prefix: &str| {
            types
                .iter()
                .enumerate()
                .map(|(i, &t)| PinSpec::new(format!("{prefix}{i}"), t))
                .collect()
        };
        let node = TestNode {
            name: name.to_string(),
            inputs: pins(&shape.inputs, "in"),
            outputs: pins(&shape.outputs, "out"),
            visual: shape.visual,
            over_time: shape.over_time,
            result: shape.result,
            log: self.log.clone(),
        };
        self.engine
            .add_node(NodeTypeId::from_name("TestNode"), name, Box::new(node))
    }

    pub fn input(&self, node: NodeId, index: usize) -> PinId {
        self.engine.node(node).unwrap().input(index).unwrap()
    }

    pub fn output(&self, node: NodeId, index: usize) -> PinId {
        self.engine.node(node).unwrap().output(index).unwrap()
    }

    /// Link output `from_pin` of `from` to input `to_pin` of `to`
    pub fn link(&mut self, from: NodeId, from_pin: usize, to: NodeId, to_pin: usize) {
        let out = self.output(from, from_pin);
        let input = self.input(to, to_pin);
        self.engine.connect(out, input).unwrap();
    }

    pub fn orders(&self, node: NodeId) -> (i32, i32) {
        (
            self.engine.update_order(node).unwrap(),
            self.engine.draw_order(node).unwrap(),
        )
    }

    pub fn take_log(&self) -> Vec<String> {
        std::mem::take(&mut *self.log.borrow_mut())
    }
}

/// Adjacency and order state of every node, ignoring dirty flags
pub fn topology(engine: &GraphEngine) -> Vec<(i32, i32, Vec<(u32, u32)>, Vec<(u32, u32)>)> {
    engine
        .nodes()
        .map(|node| {
            (
                node.update_order(),
                node.draw_order(),
                node.parents()
                    .iter()
                    .map(|a| (a.node.0, a.connection_count))
                    .collect(),
                node.children()
                    .iter()
                    .map(|a| (a.node.0, a.connection_count))
                    .collect(),
            )
        })
        .collect()
}
