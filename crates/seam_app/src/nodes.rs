// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node types of the headless host.
//!
//! The engine only schedules nodes; it never moves values between pins. These
//! nodes keep a little state of their own so the logs show what ran and when.

use seam_graph::{NodeBehavior, NodeRegistry, NodeType, PinSpec, PinType, UpdateResult};

/// Type name of [`Clock`]
pub const CLOCK: &str = "Clock";
/// Type name of [`Pulse`]
pub const PULSE: &str = "Pulse";
/// Type name of [`Constant`]
pub const CONSTANT: &str = "Constant";
/// Type name of [`Mix`]
pub const MIX: &str = "Mix";
/// Type name of [`Gradient`]
pub const GRADIENT: &str = "Gradient";
/// Type name of [`Preview`]
pub const PREVIEW: &str = "Preview";

/// Seconds since start, refreshed every frame
#[derive(Debug)]
pub struct Clock {
    time: f32,
    outputs: [PinSpec; 1],
}

impl Clock {
    fn new() -> Self {
        Self {
            time: 0.0,
            outputs: [PinSpec::new("time", PinType::Float)],
        }
    }
}

impl NodeBehavior for Clock {
    fn update(&mut self, elapsed: f32) -> UpdateResult {
        self.time = elapsed;
        tracing::trace!(time = self.time, "Clock ticked");
        UpdateResult::Changed
    }

    fn updates_over_time(&self) -> bool {
        true
    }

    fn inputs(&self) -> &[PinSpec] {
        &[]
    }

    fn outputs(&self) -> &[PinSpec] {
        &self.outputs
    }
}

/// Fires once every `period` seconds and stays quiet in between
#[derive(Debug)]
pub struct Pulse {
    period: f32,
    last_fired: Option<f32>,
    fired: u32,
    outputs: [PinSpec; 1],
}

impl Pulse {
    fn new(period: f32) -> Self {
        Self {
            period,
            last_fired: None,
            fired: 0,
            outputs: [PinSpec::new("trigger", PinType::Float)],
        }
    }
}

impl NodeBehavior for Pulse {
    fn update(&mut self, elapsed: f32) -> UpdateResult {
        if self
            .last_fired
            .is_some_and(|last| elapsed - last < self.period)
        {
            return UpdateResult::Unchanged;
        }
        self.last_fired = Some(elapsed);
        self.fired += 1;
        tracing::debug!(fired = self.fired, "Pulse fired");
        UpdateResult::Changed
    }

    fn updates_over_time(&self) -> bool {
        true
    }

    fn inputs(&self) -> &[PinSpec] {
        &[]
    }

    fn outputs(&self) -> &[PinSpec] {
        &self.outputs
    }
}

/// A fixed value; only evaluated when first observed or explicitly dirtied
#[derive(Debug)]
pub struct Constant {
    outputs: [PinSpec; 1],
}

impl NodeBehavior for Constant {
    fn update(&mut self, _elapsed: f32) -> UpdateResult {
        UpdateResult::Changed
    }

    fn inputs(&self) -> &[PinSpec] {
        &[]
    }

    fn outputs(&self) -> &[PinSpec] {
        &self.outputs
    }
}

/// Blends two scalars
#[derive(Debug)]
pub struct Mix {
    inputs: [PinSpec; 2],
    outputs: [PinSpec; 1],
}

impl NodeBehavior for Mix {
    fn update(&mut self, _elapsed: f32) -> UpdateResult {
        UpdateResult::Changed
    }

    fn inputs(&self) -> &[PinSpec] {
        &self.inputs
    }

    fn outputs(&self) -> &[PinSpec] {
        &self.outputs
    }
}

/// Visual node that renders a scalar into a texture other visual nodes can
/// layer on top of
#[derive(Debug)]
pub struct Gradient {
    inputs: [PinSpec; 1],
    outputs: [PinSpec; 1],
    draws: u32,
}

impl NodeBehavior for Gradient {
    fn update(&mut self, _elapsed: f32) -> UpdateResult {
        UpdateResult::Changed
    }

    fn draw(&mut self) {
        self.draws += 1;
        tracing::debug!(draws = self.draws, "Gradient drawn");
    }

    fn is_visual(&self) -> bool {
        true
    }

    fn inputs(&self) -> &[PinSpec] {
        &self.inputs
    }

    fn outputs(&self) -> &[PinSpec] {
        &self.outputs
    }
}

/// Terminal visual node
#[derive(Debug)]
pub struct Preview {
    inputs: [PinSpec; 1],
    draws: u32,
}

impl NodeBehavior for Preview {
    fn update(&mut self, _elapsed: f32) -> UpdateResult {
        UpdateResult::Changed
    }

    fn draw(&mut self) {
        self.draws += 1;
        tracing::debug!(draws = self.draws, "Preview drawn");
    }

    fn is_visual(&self) -> bool {
        true
    }

    fn inputs(&self) -> &[PinSpec] {
        &self.inputs
    }

    fn outputs(&self) -> &[PinSpec] {
        &[]
    }
}

/// Registry holding every built-in node type
pub fn builtin_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    registry.register(NodeType::new(CLOCK, "Seconds since start", || {
        Box::new(Clock::new())
    }));
    registry.register(NodeType::new(PULSE, "Fires every half second", || {
        Box::new(Pulse::new(0.5))
    }));
    registry.register(NodeType::new(CONSTANT, "Fixed scalar value", || {
        Box::new(Constant {
            outputs: [PinSpec::new("value", PinType::Float)],
        })
    }));
    registry.register(NodeType::new(MIX, "Blend of two scalars", || {
        Box::new(Mix {
            inputs: [
                PinSpec::new("a", PinType::Float),
                PinSpec::new("b", PinType::Float),
            ],
            outputs: [PinSpec::new("result", PinType::Float)],
        })
    }));
    registry.register(NodeType::new(GRADIENT, "Scalar rendered as a texture", || {
        Box::new(Gradient {
            inputs: [PinSpec::new("value", PinType::Float)],
            outputs: [PinSpec::new("texture", PinType::Texture)],
            draws: 0,
        })
    }));
    registry.register(NodeType::new(PREVIEW, "Shows a texture", || {
        Box::new(Preview {
            inputs: [PinSpec::new("texture", PinType::Texture)],
            draws: 0,
        })
    }));

    registry
}
