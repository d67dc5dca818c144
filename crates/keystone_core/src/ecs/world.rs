//! # ECS World
//!
//! The central container for all entities and components.
//!
//! The world is an explicit context: every storage container is owned by
//! it and reached through it, never through a process-wide static.
//!
//! ## Frame Discipline
//!
//! Destroying an entity or removing a component only marks it. Values
//! stay readable until [`World::end_frame`] sweeps them, so data fetched
//! by one phase of a frame (physics) is still there for the next
//! (rendering).

use std::any::{type_name, Any};

use super::alias::AliasTable;
use super::component::{Component, Transform, MAX_COMPONENT_TYPES};
use super::entity::{component_bit, Entity, EntityInfo};
use super::handle::Handle;
use super::storage::{ComponentStorage, DenseStorage};
use crate::config::WorldConfig;
use crate::error::{fatal, StorageError, StorageResult};

/// Type-erased view of one component table.
trait ComponentTable {
    /// Drops the entity's component, `false` if it had none.
    fn remove_entity(&mut self, entity: Handle) -> bool;
    /// Name of the stored component type.
    fn component_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ComponentTable for DenseStorage<T> {
    fn remove_entity(&mut self, entity: Handle) -> bool {
        self.remove(entity).is_some()
    }

    fn component_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// What an end-of-frame sweep removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Entities destroyed, children included.
    pub entities_destroyed: usize,
    /// Components dropped, including those of destroyed entities.
    pub components_removed: usize,
}

/// The ECS World - container for all game state.
///
/// Every entity has a [`Transform`], stored densely so the whole set can
/// be handed to a renderer as one slice. User components live in one
/// dense table per type, selected by [`Component::ID`].
///
/// # Example
///
/// ```rust
/// use keystone_core::{Component, EntityInfo, World};
///
/// struct Health(u32);
/// impl Component for Health {
///     const ID: u8 = 0;
/// }
///
/// let mut world = World::new();
/// let player = world.spawn(EntityInfo::tagged("Player"))?;
/// world.insert_component(player, Health(100))?;
///
/// assert!(world.destroy(player));
/// assert!(world.is_alive(player)); // still readable this frame
///
/// world.end_frame();
/// assert!(!world.is_alive(player));
/// # Ok::<(), keystone_core::StorageError>(())
/// ```
pub struct World {
    /// Entity records, their handles are the entity identities.
    entities: ComponentStorage<Entity>,
    /// One transform per entity.
    transforms: DenseStorage<Transform>,
    /// Component tables indexed by [`Component::ID`].
    tables: Vec<Option<Box<dyn ComponentTable>>>,
    /// Entities to destroy at the end of the frame.
    pending_destroy: Vec<Handle>,
    /// Components to remove at the end of the frame.
    pending_removals: Vec<(u8, Handle)>,
    /// Initial reservation for new component tables.
    table_reserve: usize,
}

impl World {
    /// Creates an empty world with default sizing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&WorldConfig::default())
    }

    /// Creates an empty world sized from configuration.
    #[must_use]
    pub fn with_config(config: &WorldConfig) -> Self {
        Self {
            entities: ComponentStorage::with_capacity(config.reserve_entities),
            transforms: DenseStorage::with_capacity(config.reserve_entities),
            tables: (0..MAX_COMPONENT_TYPES).map(|_| None).collect(),
            pending_destroy: Vec::new(),
            pending_removals: Vec::new(),
            table_reserve: config.storage.reserve,
        }
    }

    /// Returns the number of live entities, pending ones included.
    #[inline]
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.entities.len()
    }

    /// Spawns an entity, returning its handle.
    ///
    /// # Errors
    ///
    /// [`StorageError::UnknownHandle`] if the parent is not alive or is
    /// already being destroyed.
    ///
    /// # Panics
    ///
    /// Panics if the issued handle disagrees with the pre-fetched one,
    /// which means the entity storage is corrupt.
    pub fn spawn(&mut self, info: EntityInfo) -> StorageResult<Handle> {
        let EntityInfo {
            tag,
            layer,
            flags,
            parent,
            transform,
        } = info;

        if parent.is_valid() && !self.entities.get(parent).is_some_and(|p| !p.pending_destroy) {
            return Err(StorageError::UnknownHandle(parent));
        }

        let expected = self.entities.peek_handle(layer, flags);
        let entity = self.entities.add_tagged(layer, flags, Entity::new(tag, parent));
        if entity != expected {
            fatal(StorageError::HandleMismatch {
                expected,
                actual: entity,
            });
        }
        if let Err(err) = self.transforms.insert(entity, transform) {
            fatal(err);
        }
        if let Some(record) = self.entities.get_mut(parent) {
            record.children.push(entity);
        }

        Ok(entity)
    }

    /// Schedules an entity and all its descendants for destruction.
    ///
    /// Returns `true` once per live entity; `false` for unknown entities
    /// and for entities already scheduled.
    pub fn destroy(&mut self, entity: Handle) -> bool {
        if !self.entities.get(entity).is_some_and(|e| !e.pending_destroy) {
            return false;
        }

        let mut stack = vec![entity];
        while let Some(current) = stack.pop() {
            let Some(record) = self.entities.get_mut(current) else {
                continue;
            };
            if record.pending_destroy {
                continue;
            }
            record.pending_destroy = true;
            stack.extend_from_slice(&record.children);
            self.pending_destroy.push(current);
        }
        true
    }

    /// Checks if an entity is alive (it may still be pending destruction).
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Handle) -> bool {
        self.entities.contains(entity)
    }

    /// Checks if an entity is scheduled for destruction.
    #[inline]
    #[must_use]
    pub fn is_pending_destroy(&self, entity: Handle) -> bool {
        self.entities.get(entity).is_some_and(Entity::is_pending_destroy)
    }

    /// Gets an entity record.
    #[inline]
    #[must_use]
    pub fn entity(&self, entity: Handle) -> Option<&Entity> {
        self.entities.get(entity)
    }

    /// Returns the parent of an entity, `None` for roots and unknown entities.
    #[must_use]
    pub fn parent_of(&self, entity: Handle) -> Option<Handle> {
        self.entities
            .get(entity)
            .map(Entity::parent)
            .filter(|parent| parent.is_valid())
    }

    /// Iterates over live entities with their records.
    pub fn entities(&self) -> impl Iterator<Item = (Handle, &Entity)> {
        self.entities.iter()
    }

    /// Gets an entity's transform.
    #[inline]
    #[must_use]
    pub fn transform(&self, entity: Handle) -> Option<&Transform> {
        self.transforms.get(entity)
    }

    /// Gets an entity's transform mutably.
    #[inline]
    pub fn transform_mut(&mut self, entity: Handle) -> Option<&mut Transform> {
        self.transforms.get_mut(entity)
    }

    /// Returns every transform as one contiguous slice.
    #[inline]
    #[must_use]
    pub fn transforms(&self) -> &[Transform] {
        self.transforms.as_slice()
    }

    /// Returns every transform as one contiguous mutable slice.
    #[inline]
    pub fn transforms_mut(&mut self) -> &mut [Transform] {
        self.transforms.as_mut_slice()
    }

    /// Returns the owning entities, parallel to [`transforms`](Self::transforms).
    #[inline]
    #[must_use]
    pub fn transform_owners(&self) -> &[Handle] {
        self.transforms.handles()
    }

    /// Attaches a component to an entity.
    ///
    /// # Errors
    ///
    /// - [`StorageError::UnknownHandle`] if the entity is not alive
    /// - [`StorageError::DuplicateComponent`] if it already has a `T`
    /// - [`StorageError::ComponentIdOutOfRange`] if `T::ID` is 64 or more
    /// - [`StorageError::ComponentIdConflict`] if another type owns `T::ID`
    pub fn insert_component<T: Component>(&mut self, entity: Handle, value: T) -> StorageResult<()> {
        if !self.entities.contains(entity) {
            return Err(StorageError::UnknownHandle(entity));
        }

        let table = self.table_mut::<T>()?;
        if table.contains(entity) {
            return Err(StorageError::DuplicateComponent {
                entity,
                component: type_name::<T>(),
            });
        }
        table.insert(entity, value)?;

        if let Some(record) = self.entities.get_mut(entity) {
            record.component_mask |= component_bit(T::ID);
        }
        Ok(())
    }

    /// Schedules an entity's `T` for removal at the end of the frame.
    ///
    /// Returns `false` if the entity has no `T` or it is already scheduled.
    /// A type that shares its ID with the registered one never matches.
    pub fn remove_component<T: Component>(&mut self, entity: Handle) -> bool {
        if !self.has_component::<T>(entity) {
            return false;
        }
        let Some(record) = self.entities.get_mut(entity) else {
            return false;
        };
        if !record.has_component(T::ID) || record.is_component_pending_removal(T::ID) {
            return false;
        }
        record.pending_mask |= component_bit(T::ID);
        self.pending_removals.push((T::ID, entity));
        true
    }

    /// Gets an entity's `T`.
    #[must_use]
    pub fn component<T: Component>(&self, entity: Handle) -> Option<&T> {
        self.table::<T>()?.get(entity)
    }

    /// Gets an entity's `T` mutably.
    pub fn component_mut<T: Component>(&mut self, entity: Handle) -> Option<&mut T> {
        self.tables
            .get_mut(usize::from(T::ID))?
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<DenseStorage<T>>()?
            .get_mut(entity)
    }

    /// Checks if an entity has a `T`.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Handle) -> bool {
        self.table::<T>().is_some_and(|table| table.contains(entity))
    }

    /// Returns every live `T` as one contiguous slice.
    #[must_use]
    pub fn view<T: Component>(&self) -> &[T] {
        self.table::<T>().map(DenseStorage::as_slice).unwrap_or_default()
    }

    /// Returns the owning entities, parallel to [`view`](Self::view).
    #[must_use]
    pub fn view_owners<T: Component>(&self) -> &[Handle] {
        self.table::<T>().map(DenseStorage::handles).unwrap_or_default()
    }

    /// Visits every live `T` with its owning entity.
    pub fn for_each<T, F>(&self, visit: F)
    where
        T: Component,
        F: FnMut(Handle, &T),
    {
        if let Some(table) = self.table::<T>() {
            table.for_each(visit);
        }
    }

    /// Returns the number of entities scheduled for destruction.
    #[inline]
    #[must_use]
    pub fn pending_destroy_count(&self) -> usize {
        self.pending_destroy.len()
    }

    /// Applies every scheduled removal.
    ///
    /// Call once per frame after the last consumer has read the world.
    pub fn end_frame(&mut self) -> SweepStats {
        let mut stats = SweepStats::default();

        let mut removals = std::mem::take(&mut self.pending_removals);
        for (id, entity) in removals.drain(..) {
            if self.remove_from_table(id, entity) {
                stats.components_removed += 1;
            }
            if let Some(record) = self.entities.get_mut(entity) {
                let bit = component_bit(id);
                record.component_mask &= !bit;
                record.pending_mask &= !bit;
            }
        }
        self.pending_removals = removals;

        let mut doomed = std::mem::take(&mut self.pending_destroy);
        for entity in doomed.drain(..) {
            let Some(record) = self.entities.take(entity) else {
                continue;
            };
            for id in record.component_ids() {
                if self.remove_from_table(id, entity) {
                    stats.components_removed += 1;
                }
            }
            if self.transforms.remove(entity).is_none() {
                fatal(StorageError::Desynchronized(format!(
                    "entity {entity} had no transform"
                )));
            }
            if let Some(parent) = self.entities.get_mut(record.parent) {
                parent.children.retain(|child| *child != entity);
            }
            stats.entities_destroyed += 1;
        }
        self.pending_destroy = doomed;

        if stats != SweepStats::default() {
            tracing::debug!(
                entities = stats.entities_destroyed,
                components = stats.components_removed,
                alive = self.entities.len(),
                "end of frame sweep"
            );
        }
        stats
    }

    /// Assigns scene aliases to every live entity, in dense order.
    #[must_use]
    pub fn aliases(&self) -> AliasTable {
        let mut table = AliasTable::new();
        for (handle, entity) in self.entities.iter() {
            table.assign(handle, entity.tag());
        }
        table
    }

    fn table<T: Component>(&self) -> Option<&DenseStorage<T>> {
        self.tables
            .get(usize::from(T::ID))?
            .as_ref()?
            .as_any()
            .downcast_ref::<DenseStorage<T>>()
    }

    fn table_mut<T: Component>(&mut self) -> StorageResult<&mut DenseStorage<T>> {
        let id = T::ID;
        let reserve = self.table_reserve;
        let slot = self
            .tables
            .get_mut(usize::from(id))
            .ok_or(StorageError::ComponentIdOutOfRange {
                id,
                limit: MAX_COMPONENT_TYPES,
            })?;

        let table = slot.get_or_insert_with(|| {
            tracing::debug!(id, component = type_name::<T>(), "registered component table");
            Box::new(DenseStorage::<T>::with_capacity(reserve)) as Box<dyn ComponentTable>
        });
        let registered = table.component_name();
        table
            .as_any_mut()
            .downcast_mut::<DenseStorage<T>>()
            .ok_or(StorageError::ComponentIdConflict {
                id,
                registered,
                requested: type_name::<T>(),
            })
    }

    fn remove_from_table(&mut self, id: u8, entity: Handle) -> bool {
        self.tables
            .get_mut(usize::from(id))
            .and_then(Option::as_mut)
            .is_some_and(|table| table.remove_entity(entity))
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
