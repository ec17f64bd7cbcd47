// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pin definitions for node inputs/outputs.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// Handle of a pin in the engine's pin arena.
///
/// Handles are handed out in increasing order and never reused, so they double
/// as the sort key of the [`PinIndex`](crate::pin_index::PinIndex).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PinId(pub u32);

impl PinId {
    /// Position of the pin in the arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinDirection {
    /// Input pin
    Input,
    /// Output pin
    Output,
}

impl PinDirection {
    /// The direction a pin must have to be linked with this one
    pub fn opposite(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }
}

/// Value type carried by a pin.
///
/// Two pins may only be linked when their types are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinType {
    /// Event/flow trigger without a payload
    Flow,
    /// Boolean value
    Bool,
    /// Signed integer value
    Int,
    /// Unsigned integer value
    Uint,
    /// Floating point value
    Float,
    /// 2D vector
    Vector2,
    /// 3D vector
    Vector3,
    /// 4D vector
    Vector4,
    /// Color (RGBA)
    Color,
    /// Texture produced by a visual node
    Texture,
    /// String value
    String,
}

impl PinType {
    /// Short lowercase name, used in log and error output
    pub fn name(self) -> &'static str {
        match self {
            Self::Flow => "flow",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::Vector2 => "vec2",
            Self::Vector3 => "vec3",
            Self::Vector4 => "vec4",
            Self::Color => "color",
            Self::Texture => "texture",
            Self::String => "string",
        }
    }
}

impl std::fmt::Display for PinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Declaration of a pin, as reported by a node behaviour.
///
/// The engine turns each declaration into a stored [`Pin`] when the node is
/// registered; the set of pins never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinSpec {
    /// Pin name
    pub name: String,
    /// Data type
    pub pin_type: PinType,
}

impl PinSpec {
    /// Create a new pin declaration
    pub fn new(name: impl Into<String>, pin_type: PinType) -> Self {
        Self {
            name: name.into(),
            pin_type,
        }
    }
}

/// A pin owned by a registered node
#[derive(Debug, Clone)]
pub struct Pin {
    /// Arena handle
    pub id: PinId,
    /// Node owning this pin
    pub node: NodeId,
    /// Pin name
    pub name: String,
    /// Pin direction
    pub direction: PinDirection,
    /// Data type
    pub pin_type: PinType,
    /// Input pins fed by this pin. Always empty for inputs.
    pub(crate) connections: Vec<PinId>,
}

impl Pin {
    pub(crate) fn new(id: PinId, node: NodeId, spec: &PinSpec, direction: PinDirection) -> Self {
        Self {
            id,
            node,
            name: spec.name.clone(),
            direction,
            pin_type: spec.pin_type,
            connections: Vec::new(),
        }
    }

    /// Whether this is an input pin
    pub fn is_input(&self) -> bool {
        self.direction == PinDirection::Input
    }

    /// Whether this is an output pin
    pub fn is_output(&self) -> bool {
        self.direction == PinDirection::Output
    }

    /// Input pins currently fed by this output pin
    pub fn connections(&self) -> &[PinId] {
        &self.connections
    }

    /// Check if a link between this pin and another would be well-typed
    pub fn can_connect(&self, other: &Pin) -> bool {
        self.id != other.id
            && self.direction == other.direction.opposite()
            && self.pin_type == other.pin_type
    }
}
