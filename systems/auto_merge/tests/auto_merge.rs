use std::time::Duration;

use merge_farm_core::{BalanceConfig, Command, Event, ItemTier, ModifierKind, SlotCoord};
use merge_farm_system_auto_merge::{AutoMerge, Config};
use merge_farm_world::{self as world, query, World};

fn seeded_world(slots: &[(u32, u32, u8)]) -> World {
    let mut world = World::new(BalanceConfig::default());
    let mut events = Vec::new();
    for (column, row, tier) in slots {
        world::apply(
            &mut world,
            Command::SpawnItem {
                slot: SlotCoord::new(*column, *row),
                tier: ItemTier::new(*tier),
            },
            &mut events,
        );
    }
    world
}

fn grant_auto_merge(world: &mut World, duration: Duration) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::GrantModifier {
            kind: ModifierKind::AutoMerge,
            duration,
        },
        &mut events,
    );
    events
}

/// Drives the world one tick at a time and returns the number of merges applied.
fn run(world: &mut World, auto_merge: &mut AutoMerge, ticks: usize, dt: Duration) -> usize {
    let mut merges = 0;
    for _ in 0..ticks {
        let mut events = Vec::new();
        world::apply(world, Command::Tick { dt }, &mut events);

        let mut commands = Vec::new();
        auto_merge.handle(
            &events,
            query::modifier_active(world, ModifierKind::AutoMerge),
            &query::item_view(world),
            &mut commands,
        );
        for command in commands {
            let mut generated = Vec::new();
            world::apply(world, command, &mut generated);
            merges += generated
                .iter()
                .filter(|event| matches!(event, Event::MergeCompleted { .. }))
                .count();
        }
    }
    merges
}

#[test]
fn inactive_modifier_emits_nothing() {
    let world = seeded_world(&[(0, 0, 0), (1, 0, 0)]);
    let mut auto_merge = AutoMerge::new(Config::from_balance(&BalanceConfig::default()));

    let mut commands = Vec::new();
    auto_merge.handle(
        &[Event::TimeAdvanced {
            dt: Duration::from_secs(5),
            now: Duration::from_secs(5),
        }],
        query::modifier_active(&world, ModifierKind::AutoMerge),
        &query::item_view(&world),
        &mut commands,
    );

    assert!(commands.is_empty());
    assert_eq!(auto_merge.next_attempt(), None);
}

#[test]
fn merges_once_per_step_while_pairs_remain() {
    let mut world = seeded_world(&[(0, 0, 0), (1, 0, 0), (2, 0, 0), (3, 0, 0), (4, 0, 2)]);
    let _ = grant_auto_merge(&mut world, Duration::from_secs(60));
    let mut auto_merge = AutoMerge::new(Config::from_balance(&BalanceConfig::default()));

    // First tick merges immediately, the next pair waits a full step.
    assert_eq!(
        run(&mut world, &mut auto_merge, 1, Duration::from_millis(500)),
        1
    );
    assert_eq!(
        run(&mut world, &mut auto_merge, 1, Duration::from_millis(500)),
        0
    );
    assert_eq!(
        run(&mut world, &mut auto_merge, 1, Duration::from_millis(500)),
        1
    );

    // Two tier-one items remain and merge into a second tier-two item.
    assert_eq!(
        run(&mut world, &mut auto_merge, 2, Duration::from_millis(500)),
        1
    );
    let tiers: Vec<_> = query::item_view(&world)
        .iter()
        .map(|item| item.tier.get())
        .collect();
    assert_eq!(tiers, vec![2, 2]);
}

#[test]
fn empty_scan_backs_off_for_scan_interval() {
    let mut world = seeded_world(&[(0, 0, 0), (1, 0, 1)]);
    let _ = grant_auto_merge(&mut world, Duration::from_secs(60));
    let mut auto_merge = AutoMerge::new(Config::from_balance(&BalanceConfig::default()));

    assert_eq!(run(&mut world, &mut auto_merge, 1, Duration::from_secs(1)), 0);
    assert_eq!(auto_merge.next_attempt(), Some(Duration::from_secs(3)));
}

#[test]
fn deadlines_follow_seeded_clock() {
    let mut world = seeded_world(&[(0, 0, 0), (1, 0, 0)]);
    let _ = grant_auto_merge(&mut world, Duration::from_secs(60));
    let mut auto_merge = AutoMerge::new(Config::from_balance(&BalanceConfig::default()))
        .with_clock(Duration::from_secs(10));

    let mut commands = Vec::new();
    auto_merge.handle(
        &[],
        query::modifier_active(&world, ModifierKind::AutoMerge),
        &query::item_view(&world),
        &mut commands,
    );

    assert_eq!(commands.len(), 1);
    assert_eq!(auto_merge.next_attempt(), Some(Duration::from_secs(11)));
}

#[test]
fn stops_when_modifier_expires() {
    let mut world = seeded_world(&[(0, 0, 0), (1, 0, 0), (2, 0, 1), (3, 0, 2)]);
    let _ = grant_auto_merge(&mut world, Duration::from_secs(1));
    let mut auto_merge = AutoMerge::new(Config::from_balance(&BalanceConfig::default()));

    assert_eq!(
        run(&mut world, &mut auto_merge, 1, Duration::from_millis(500)),
        1
    );
    assert_eq!(
        run(&mut world, &mut auto_merge, 6, Duration::from_millis(500)),
        0,
        "expired modifier must not drive further merges"
    );
    assert_eq!(auto_merge.next_attempt(), None);
    assert_eq!(query::item_view(&world).len(), 3);
}
