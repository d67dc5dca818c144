//! # Component System
//!
//! Components are data attached to entities. Each component type is
//! registered at compile time with a small numeric ID, which selects its
//! table in the [`World`](super::World) and its bit in the entity's
//! component mask.

use bytemuck::{Pod, Zeroable};

/// Number of distinct component types a world can hold.
pub const MAX_COMPONENT_TYPES: usize = 64;

/// Marker trait for user components.
///
/// # Example
///
/// ```rust
/// use keystone_core::Component;
///
/// struct PointLight {
///     radius: f32,
/// }
///
/// impl Component for PointLight {
///     const ID: u8 = 3;
/// }
/// ```
pub trait Component: 'static {
    /// Unique identifier for this component type (0-63).
    ///
    /// This ID is used for the component bitmask in entities.
    const ID: u8;
}

/// Transform attached to every entity.
///
/// Position, rotation quaternion (x, y, z, w) and per-axis scale, laid
/// out without padding so the dense transform view can be uploaded as-is.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Transform {
    /// Position in parent space.
    pub position: [f32; 3],
    /// Rotation quaternion, `w` last.
    pub rotation: [f32; 4],
    /// Scale per axis.
    pub scale: [f32; 3],
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        position: [0.0; 3],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0; 3],
    };

    /// Creates an identity-rotated, unit-scaled transform at a position.
    #[inline]
    #[must_use]
    pub const fn from_position(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
            ..Self::IDENTITY
        }
    }

    /// Moves the transform by an offset.
    #[inline]
    pub fn translate(&mut self, offset: [f32; 3]) {
        for (axis, delta) in self.position.iter_mut().zip(offset) {
            *axis += delta;
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
