//! Frame lifecycle of the world.
//!
//! Simulates a few game frames: spawning, marking for destruction,
//! reading during the frame, sweeping at its end, and saving the scene
//! by alias.

use keystone_core::{
    AliasTable, Component, EntityInfo, Handle, StorageError, Transform, World, WorldConfig,
};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Velocity([f32; 3]);

impl Component for Velocity {
    const ID: u8 = 0;
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Health(u32);

impl Component for Health {
    const ID: u8 = 1;
}

fn integrate(world: &mut World) {
    let moves: Vec<(Handle, [f32; 3])> = world
        .view_owners::<Velocity>()
        .iter()
        .copied()
        .zip(world.view::<Velocity>().iter().map(|v| v.0))
        .collect();
    for (entity, delta) in moves {
        if let Some(transform) = world.transform_mut(entity) {
            transform.translate(delta);
        }
    }
}

#[test]
fn destroyed_entities_survive_until_end_of_frame() {
    let mut world = World::new();
    let ship = world.spawn(EntityInfo::tagged("Ship")).unwrap();
    world.insert_component(ship, Velocity([1.0, 0.0, 0.0])).unwrap();
    world.insert_component(ship, Health(10)).unwrap();

    // Gameplay kills the ship mid-frame.
    assert!(world.destroy(ship));

    // Physics and rendering still see it.
    integrate(&mut world);
    assert_eq!(world.transform(ship).unwrap().position, [1.0, 0.0, 0.0]);
    assert_eq!(world.component::<Health>(ship), Some(&Health(10)));

    let stats = world.end_frame();
    assert_eq!(stats.entities_destroyed, 1);
    assert_eq!(stats.components_removed, 2);
    assert!(!world.is_alive(ship));
    assert!(world.component::<Health>(ship).is_none());
    assert!(world.transforms().is_empty());
}

#[test]
fn many_frames_keep_storage_dense() {
    let mut world = World::new();
    let mut live = Vec::new();

    for frame in 0..50u32 {
        for i in 0..8u32 {
            let entity = world
                .spawn(EntityInfo::default().with_transform(Transform::from_position(
                    f32::from(u16::try_from(i).unwrap()),
                    0.0,
                    0.0,
                )))
                .unwrap();
            world.insert_component(entity, Health(frame * 10 + i)).unwrap();
            live.push(entity);
        }
        for entity in live.drain(..4) {
            world.destroy(entity);
        }
        world.end_frame();

        assert_eq!(world.alive_count(), live.len());
        assert_eq!(world.transforms().len(), live.len());
        assert_eq!(world.view::<Health>().len(), live.len());
        for entity in &live {
            assert!(world.is_alive(*entity));
            assert!(world.has_component::<Health>(*entity));
        }
    }
}

#[test]
fn hierarchy_is_destroyed_together() {
    let mut world = World::new();
    let station = world.spawn(EntityInfo::tagged("Station")).unwrap();
    let modules: Vec<_> = (0..3)
        .map(|_| {
            world
                .spawn(EntityInfo::tagged("Module").with_parent(station))
                .unwrap()
        })
        .collect();
    let crew = world
        .spawn(EntityInfo::tagged("Crew").with_parent(modules[1]))
        .unwrap();

    assert_eq!(world.entity(station).unwrap().children(), modules.as_slice());

    world.destroy(modules[1]);
    world.end_frame();
    assert!(!world.is_alive(crew));
    assert_eq!(world.entity(station).unwrap().children().len(), 2);

    world.destroy(station);
    let stats = world.end_frame();
    assert_eq!(stats.entities_destroyed, 3);
    assert_eq!(world.alive_count(), 0);
}

#[test]
fn stale_entity_handles_are_rejected() {
    let mut world = World::new();
    let old = world.spawn(EntityInfo::tagged("Old")).unwrap();
    world.destroy(old);
    world.end_frame();

    let new = world.spawn(EntityInfo::tagged("New")).unwrap();
    assert_eq!(new.index(), old.index());
    assert!(!world.is_alive(old));
    assert!(world.transform(old).is_none());
    assert_eq!(
        world.insert_component(old, Health(1)),
        Err(StorageError::UnknownHandle(old))
    );
    assert!(!world.destroy(old));
    assert!(world.is_alive(new));
}

#[test]
fn scene_round_trips_through_aliases() {
    let mut world = World::new();
    let player = world.spawn(EntityInfo::tagged("PlayerTag")).unwrap();
    let camera = world
        .spawn(EntityInfo::tagged("Camera").with_parent(player))
        .unwrap();

    // Save: record each entity by alias.
    let saved = world.aliases();
    let player_alias = saved.alias_of(player).unwrap().to_string();
    let camera_alias = saved.alias_of(camera).unwrap().to_string();
    let camera_parent_alias = saved
        .alias_of(world.parent_of(camera).unwrap())
        .unwrap()
        .to_string();

    // Load into a fresh session whose handles differ.
    let mut loaded = World::new();
    let filler = loaded.spawn(EntityInfo::tagged("Filler")).unwrap();
    let mut table = AliasTable::new();

    let new_player = loaded.spawn(EntityInfo::tagged("PlayerTag")).unwrap();
    table.bind(player_alias.clone(), new_player).unwrap();
    let parent = table.resolve(&camera_parent_alias).unwrap();
    let new_camera = loaded
        .spawn(EntityInfo::tagged("Camera").with_parent(parent))
        .unwrap();
    table.bind(camera_alias.clone(), new_camera).unwrap();

    assert_ne!(new_player, player);
    assert_ne!(filler, new_player);
    assert_eq!(loaded.parent_of(new_camera), Some(new_player));
    assert_eq!(table.resolve(&player_alias), Some(new_player));
    assert_eq!(
        table.bind(player_alias, new_camera),
        Err(StorageError::DuplicateAlias("entity0_PlayerTag".to_string()))
    );
}

#[test]
fn world_from_config_file_text() {
    let config = WorldConfig::from_toml_str(
        r"
        reserve_entities = 64

        [storage]
        reserve = 32
        ",
    )
    .unwrap();
    let mut world = World::with_config(&config);
    let entity = world.spawn(EntityInfo::default()).unwrap();
    world.insert_component(entity, Velocity([0.0; 3])).unwrap();
    assert_eq!(world.view::<Velocity>(), &[Velocity([0.0; 3])]);
}
