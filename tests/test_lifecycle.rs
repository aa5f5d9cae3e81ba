mod common;

use common::{LedgerOp, RecordingLedger, SiegeHarness, StaticTerritory};
use flagsiege::config::SiegeConfig;
use flagsiege::coordinator::BreakCheck;
use flagsiege::observability::EventLog;
use flagsiege::region::{BlockPos, RegionId};

#[test]
fn flag_is_drawn_on_registration() {
    let harness = SiegeHarness::new(SiegeConfig::default(), StaticTerritory::new());
    harness.plant("alice", 37, 53);

    let base = BlockPos::new("overworld", 37, 64, 53);
    assert_eq!(harness.renderer.material_at(&base).as_deref(), Some("OAK_FENCE"));
    assert_eq!(
        harness.renderer.material_at(&base.above(1)).as_deref(),
        Some("LIME_WOOL"),
        "indicator starts on the first phase material"
    );
    assert_eq!(
        harness.renderer.material_at(&base.above(2)).as_deref(),
        Some("TORCH")
    );
    // Default window is 300s; the countdown anchors at the light block.
    assert_eq!(
        harness.renderer.countdown_text(&base.above(2)).as_deref(),
        Some("5m 0s")
    );
}

#[test]
fn phases_advance_through_the_palette() {
    let harness = SiegeHarness::new(SiegeConfig::default(), StaticTerritory::new());
    harness.plant("alice", 0, 0);
    let indicator = BlockPos::new("overworld", 0, 65, 0);

    harness.scheduler.tick();
    assert_eq!(
        harness.renderer.material_at(&indicator).as_deref(),
        Some("GREEN_WOOL")
    );

    // Seven more ticks land on the ninth material.
    harness.scheduler.tick_n(7);
    assert_eq!(
        harness.renderer.material_at(&indicator).as_deref(),
        Some("ORANGE_WOOL")
    );
    harness.scheduler.tick();
    assert_eq!(
        harness.renderer.material_at(&indicator).as_deref(),
        Some("RED_WOOL")
    );
}

#[test]
fn expiry_resolves_won_and_clears_the_world() {
    let region = RegionId::new("overworld", 0, 0);
    let territory = StaticTerritory::new().claim(region.clone(), "rivertown");
    let harness = SiegeHarness::new(SiegeConfig::default(), territory);
    harness.plant("alice", 0, 0);
    assert!(harness.renderer.painted_blocks() > 0);

    // Ten phases, one tick each; the tenth resolves the capture.
    harness.scheduler.tick_n(10);

    assert!(!harness.coordinator.is_under_attack(&region));
    assert_eq!(harness.coordinator.count_active("alice"), 0);
    assert_eq!(harness.renderer.painted_blocks(), 0);
    assert_eq!(harness.renderer.countdown_count(), 0);
    assert_eq!(
        harness.ledger.ops(),
        vec![LedgerOp::Pay {
            payer: "rivertown".to_owned(),
            amount: 10.0,
            payee: "alice".to_owned(),
            reason: "captured region spoils".to_owned(),
        }]
    );
    assert!(harness
        .coordinator
        .is_on_cooldown("rivertown", chrono::Utc::now()));
    // The capture hands the region over.
    assert_eq!(harness.territory.owner_of(&region).as_deref(), Some("alice"));
}

#[test]
fn capturing_unclaimed_land_claims_it_for_the_attacker() {
    let harness = SiegeHarness::new(SiegeConfig::default(), StaticTerritory::new());
    let cell = harness.plant("alice", 0, 0);

    harness.coordinator.resolve_won(&cell);
    let region = RegionId::new("overworld", 0, 0);
    assert_eq!(harness.territory.owner_of(&region).as_deref(), Some("alice"));
    // No counterparty, so no money moved.
    assert!(harness.ledger.ops().is_empty());
}

#[test]
fn resolution_survives_a_sealed_territory_store() {
    let harness = SiegeHarness::new(SiegeConfig::default(), StaticTerritory::sealed());
    let cell = harness.plant("alice", 0, 0);

    harness.coordinator.resolve_won(&cell);
    // The handover was rejected, but cleanup still completed.
    assert!(!harness.coordinator.is_under_attack(&RegionId::new("overworld", 0, 0)));
    assert_eq!(harness.renderer.painted_blocks(), 0);
    assert_eq!(harness.coordinator.events().recorded(), 2);
}

#[test]
fn breaking_the_indicator_defends() {
    let region = RegionId::new("overworld", 0, 0);
    let territory = StaticTerritory::new().claim(region.clone(), "rivertown");
    let harness = SiegeHarness::new(SiegeConfig::default(), territory);
    harness.plant("alice", 5, 5);

    let outcome = harness
        .coordinator
        .on_block_broken("bob", &BlockPos::new("overworld", 5, 65, 5));
    assert_eq!(outcome, BreakCheck::Defended);
    assert!(!harness.coordinator.is_under_attack(&region));
    assert_eq!(harness.renderer.painted_blocks(), 0);
    assert_eq!(
        harness.ledger.ops(),
        vec![LedgerOp::Pay {
            payer: "alice".to_owned(),
            amount: 10.0,
            payee: "bob".to_owned(),
            reason: "attack defended".to_owned(),
        }]
    );
    assert!(harness
        .coordinator
        .is_on_cooldown("rivertown", chrono::Utc::now()));
    // A defense never moves ownership.
    assert_eq!(
        harness.territory.owner_of(&region).as_deref(),
        Some("rivertown")
    );
}

#[test]
fn environmental_defense_refunds_the_attacker() {
    let harness = SiegeHarness::new(SiegeConfig::default(), StaticTerritory::new());
    let cell = harness.plant("alice", 0, 0);

    harness.coordinator.resolve_defended(None, &cell);
    assert_eq!(
        harness.ledger.ops(),
        vec![LedgerOp::Deposit {
            account: "alice".to_owned(),
            amount: 10.0,
            reason: "attack defended by greater forces".to_owned(),
        }]
    );
}

#[test]
fn negative_capture_reward_charges_the_attacker() {
    let region = RegionId::new("overworld", 0, 0);
    let territory = StaticTerritory::new().claim(region, "rivertown");
    let mut config = SiegeConfig::default();
    config.economy.captured_region_reward = -25.0;
    let harness = SiegeHarness::new(config, territory);
    let cell = harness.plant("alice", 0, 0);

    harness.coordinator.resolve_won(&cell);
    assert_eq!(
        harness.ledger.ops(),
        vec![LedgerOp::Pay {
            payer: "alice".to_owned(),
            amount: 25.0,
            payee: "rivertown".to_owned(),
            reason: "captured region rebuild cost".to_owned(),
        }]
    );
}

#[test]
fn resolution_survives_a_broken_economy() {
    let region = RegionId::new("overworld", 0, 0);
    let territory = StaticTerritory::new().claim(region.clone(), "rivertown");
    let harness =
        SiegeHarness::with_ledger(SiegeConfig::default(), territory, RecordingLedger::failing());
    harness.plant("alice", 0, 0);

    harness.scheduler.tick_n(10);
    // The payment failed, but cleanup still completed.
    assert!(!harness.coordinator.is_under_attack(&region));
    assert_eq!(harness.renderer.painted_blocks(), 0);
    assert_eq!(harness.ledger.ops().len(), 1);
}

#[test]
fn region_can_be_attacked_again_after_defense() {
    let harness = SiegeHarness::new(SiegeConfig::default(), StaticTerritory::new());
    harness.plant("alice", 0, 0);
    assert_eq!(
        harness
            .coordinator
            .on_block_broken("bob", &BlockPos::new("overworld", 0, 65, 0)),
        BreakCheck::Defended
    );

    let cell = harness.plant("alice", 3, 3);
    assert_eq!(cell.attacker(), "alice");
    assert!(harness
        .coordinator
        .is_under_attack(&RegionId::new("overworld", 0, 0)));
}

#[test]
fn countdown_text_follows_the_clock() {
    let harness = SiegeHarness::new(SiegeConfig::default(), StaticTerritory::new());
    harness.plant("alice", 0, 0);
    let light = BlockPos::new("overworld", 0, 66, 0);

    // Each manual tick fires the one-second countdown job once. Stay under
    // ten ticks so the phase timer does not expire the attack.
    harness.scheduler.tick();
    assert_eq!(
        harness.renderer.countdown_text(&light).as_deref(),
        Some("4m 59s")
    );
    harness.scheduler.tick_n(8);
    assert_eq!(
        harness.renderer.countdown_text(&light).as_deref(),
        Some("4m 51s")
    );
}

#[test]
fn event_stream_records_the_whole_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    let events = EventLog::to_file(&path).unwrap();

    let territory = StaticTerritory::new().claim(RegionId::new("overworld", 0, 0), "rivertown");
    let harness = SiegeHarness::with_events(SiegeConfig::default(), territory, events);
    harness.plant("alice", 0, 0);
    harness.scheduler.tick_n(10);
    harness.coordinator.shutdown();

    let lines: Vec<serde_json::Value> = std::fs::read_to_string(&path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    // AttackStarted, nine PhaseAdvanced, AttackWon.
    assert_eq!(lines.len(), 11);
    assert_eq!(lines[0]["type"], "AttackStarted");
    assert_eq!(lines[0]["owner"], "rivertown");
    assert_eq!(lines[10]["type"], "AttackWon");
    assert_eq!(lines[10]["attacker"], "alice");
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(line["sequence"], i as u64);
    }
    let phases: Vec<_> = lines
        .iter()
        .filter(|l| l["type"] == "PhaseAdvanced")
        .collect();
    assert_eq!(phases.len(), 9);
    assert_eq!(phases[0]["material"], "GREEN_WOOL");
    assert_eq!(phases[8]["material"], "RED_WOOL");
}

#[test]
fn is_group_under_attack_reads_through_territory() {
    let territory = StaticTerritory::new()
        .claim(RegionId::new("overworld", 0, 0), "rivertown")
        .claim(RegionId::new("overworld", 6, 6), "hilltop");
    let harness = SiegeHarness::new(SiegeConfig::default(), territory);
    harness.plant("alice", 0, 0);

    assert!(harness.coordinator.is_group_under_attack("rivertown"));
    assert!(!harness.coordinator.is_group_under_attack("hilltop"));
    assert_eq!(harness.coordinator.attacks_for_group("rivertown").len(), 1);
    assert!(harness.coordinator.attacks_for_group("hilltop").is_empty());
}
