//! # Entity Records
//!
//! Entities are stored like any other value: their records live in a
//! handle-addressed storage inside the [`World`](super::World), and the
//! record's handle is the entity's identity.

use super::component::Transform;
use super::handle::Handle;

/// Description of an entity to spawn.
#[derive(Clone, Debug, Default)]
pub struct EntityInfo {
    /// Human-readable tag, also used for scene aliases.
    pub tag: String,
    /// Layer bits stamped into the entity handle.
    pub layer: u8,
    /// Flag bits stamped into the entity handle.
    pub flags: u8,
    /// Parent entity, or [`Handle::NULL`] for a root.
    pub parent: Handle,
    /// Initial transform.
    pub transform: Transform,
}

impl EntityInfo {
    /// Creates a root entity description with the given tag.
    #[must_use]
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Sets the parent entity.
    #[must_use]
    pub fn with_parent(mut self, parent: Handle) -> Self {
        self.parent = parent;
        self
    }

    /// Sets the handle layer and flags.
    #[must_use]
    pub fn with_traits(mut self, layer: u8, flags: u8) -> Self {
        self.layer = layer;
        self.flags = flags;
        self
    }

    /// Sets the initial transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// Mask bit for a component ID, zero for IDs past the mask width.
#[inline]
pub(crate) const fn component_bit(component_id: u8) -> u64 {
    match 1u64.checked_shl(component_id as u32) {
        Some(bit) => bit,
        None => 0,
    }
}

/// Entity record with its components' validity flags.
///
/// It tracks which components are attached via a bitmask, and which of
/// those are scheduled for removal at the end of the frame.
#[derive(Clone, Debug)]
pub struct Entity {
    pub(crate) tag: String,
    pub(crate) parent: Handle,
    pub(crate) children: Vec<Handle>,
    /// Bitmask of attached components (up to 64 component types).
    pub(crate) component_mask: u64,
    /// Bitmask of attached components pending removal.
    pub(crate) pending_mask: u64,
    pub(crate) pending_destroy: bool,
}

impl Entity {
    pub(crate) fn new(tag: String, parent: Handle) -> Self {
        Self {
            tag,
            parent,
            children: Vec::new(),
            component_mask: 0,
            pending_mask: 0,
            pending_destroy: false,
        }
    }

    /// Returns the entity's tag.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the parent entity, [`Handle::NULL`] for a root.
    #[inline]
    #[must_use]
    pub const fn parent(&self) -> Handle {
        self.parent
    }

    /// Returns the direct children.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[Handle] {
        &self.children
    }

    /// Returns `true` if the entity is destroyed at the end of this frame.
    #[inline]
    #[must_use]
    pub const fn is_pending_destroy(&self) -> bool {
        self.pending_destroy
    }

    /// Checks if this entity has a specific component.
    ///
    /// # Arguments
    ///
    /// * `component_id` - The component type ID (0-63)
    #[inline]
    #[must_use]
    pub const fn has_component(&self, component_id: u8) -> bool {
        (self.component_mask & component_bit(component_id)) != 0
    }

    /// Checks if a component is scheduled for removal.
    #[inline]
    #[must_use]
    pub const fn is_component_pending_removal(&self, component_id: u8) -> bool {
        (self.pending_mask & component_bit(component_id)) != 0
    }

    /// Iterates over the IDs of attached components.
    pub fn component_ids(&self) -> impl Iterator<Item = u8> {
        let mask = self.component_mask;
        (0..64u8).filter(move |id| mask & component_bit(*id) != 0)
    }
}
