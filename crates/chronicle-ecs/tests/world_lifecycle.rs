//! Entity lifecycle end-to-end: monotonic IDs, destroy semantics, and
//! query consistency across component stores.

use chronicle_ecs::world::World;

#[derive(Debug, Clone, PartialEq)]
struct Position {
    x: f64,
    y: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct Health(u32);

#[test]
fn three_fresh_entities_one_destroyed() {
    let mut world = World::new();
    let a = world.create_entity();
    let b = world.create_entity();
    let c = world.create_entity();

    world.destroy_entity(b);

    let mut alive = world.all_alive();
    alive.sort();
    assert_eq!(alive, vec![a, c]);
    assert!(!world.is_alive(b));

    let d = world.create_entity();
    assert!(d > c);
}

#[test]
fn destroying_already_destroyed_entity_is_a_no_op() {
    let mut world = World::new();
    let a = world.create_entity();
    world.destroy_entity(a);
    world.destroy_entity(a);
    assert!(!world.is_alive(a));
    assert_eq!(world.all_alive(), Vec::new());
}

#[test]
fn query_requires_every_listed_component_type() {
    let mut world = World::new();
    world.register_component::<Position>("position");
    world.register_component::<Health>("health");

    let a = world.create_entity();
    let b = world.create_entity();

    world.add_component(a, Position { x: 1.0, y: 2.0 }).unwrap();
    world.add_component(a, Health(100)).unwrap();
    world.add_component(b, Position { x: 3.0, y: 4.0 }).unwrap();

    let position_id = world.component_type_id::<Position>().unwrap();
    let health_id = world.component_type_id::<Health>().unwrap();

    let both = world.query(&[position_id, health_id]);
    assert_eq!(both, vec![a]);

    let mut positioned = world.query(&[position_id]);
    positioned.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(positioned, expected);
}

#[test]
fn destroying_an_entity_removes_it_from_every_store() {
    let mut world = World::new();
    world.register_component::<Position>("position");
    world.register_component::<Health>("health");

    let a = world.create_entity();
    world.add_component(a, Position { x: 0.0, y: 0.0 }).unwrap();
    world.add_component(a, Health(10)).unwrap();

    world.destroy_entity(a);

    assert_eq!(world.get_component::<Position>(a), None);
    assert_eq!(world.get_component::<Health>(a), None);
    assert!(!world.has_component::<Position>(a));
}
