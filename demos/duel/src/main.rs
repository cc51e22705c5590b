//! Two arenas, a handful of simulated players and a shutdown at the end.
//!
//! Run with `RUST_LOG=debug cargo run -p duel` to see the engine's
//! diagnostics alongside the player-facing messages.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use colosseum::prelude::*;
use rand::Rng;

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Prints every player-facing message.
struct ConsoleSink;

impl MessageSink for ConsoleSink {
    fn send(&self, player: PlayerId, message: Message) {
        println!("  [{player}] {message}");
    }
}

/// Pretends to paste template maps into a world, one slot per instance.
/// Occasionally fails, the way a busy world would.
struct FakeWorld {
    next_slot: AtomicU64,
}

impl ProvisioningBackend for FakeWorld {
    fn is_available(&self) -> bool {
        true
    }

    async fn instantiate(
        &self,
        arena: &str,
        map: &MapDescriptor,
    ) -> Result<MapInstance, ProvisionError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if rand::rng().random_bool(0.2) {
            return Err(ProvisionError::new(map.name.clone(), "chunk load timed out"));
        }
        let slot = self.next_slot.fetch_add(1, Ordering::Relaxed);
        let width = map.bounds.as_ref().map_or(64, |b| b.size()[0]) as i32;
        tracing::info!(%arena, map = %map.name, slot, "pasted template");
        Ok(MapInstance {
            id: slot,
            map: map.name.clone(),
            origin: [slot as i32 * (width + 16), 64, 0],
        })
    }

    async fn release(&self, instance: MapInstance) {
        tracing::info!(instance = instance.id, map = %instance.map, "cleared instance");
    }
}

// ---------------------------------------------------------------------------
// Arenas
// ---------------------------------------------------------------------------

fn duel() -> Result<ArenaType, ColosseumError> {
    let arena = ArenaType::builder("Duel")
        .config(CompetitionConfig {
            min_players: 2,
            max_players: 2,
            ..CompetitionConfig::default()
        })
        .phase(PhaseType::new(PhaseId::WAITING, Waiting::default))
        .phase(PhaseType::new(PhaseId::COUNTDOWN, || {
            Countdown::new(Duration::from_secs(3))
        }))
        .phase(PhaseType::new(PhaseId::INGAME, Ingame::default))
        .phase(PhaseType::victory(PhaseId::VICTORY, || {
            Victory::new(Duration::from_secs(2))
        }))
        .condition(LastStanding::default)
        .condition(|| TimeLimit::new(Duration::from_secs(30)))
        .build()?;
    Ok(arena)
}

const DESCRIPTORS: &str = r#"{
    "Duel": [
        { "name": "pit", "kind": "fixed" }
    ],
    "Siege": [
        { "name": "keep", "kind": "template", "bounds": { "min": [0,0,0], "max": [63,31,63] } },
        { "name": "gate", "kind": "template", "bounds": { "min": [0,0,0], "max": [47,31,47] } }
    ]
}"#;

const CONFIG: &str = r#"{
    "maxDynamicInstances": 5,
    "arenas": { "Siege": { "maxDynamicInstances": 2 } },
    "tickRateHz": 20
}"#;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), ColosseumError> {
    colosseum::init_tracing();

    let colosseum = Colosseum::builder()
        .config_json(CONFIG)?
        .arena(duel()?)
        .arena(ArenaType::standard(
            "Siege",
            CompetitionConfig {
                min_players: 3,
                max_players: 4,
                ..CompetitionConfig::default()
            },
        ))
        .descriptors(JsonDescriptors::from_json(DESCRIPTORS)?)
        .backend(FakeWorld {
            next_slot: AtomicU64::new(1),
        })
        .sink(Arc::new(ConsoleSink))
        .start()
        .await?;
    let engine = colosseum.engine().clone();

    println!("== Duel: two players fight, a third is turned away");
    for player in 1..=3 {
        engine.join(PlayerId(player), "Duel", None).await;
    }
    engine.spectate(PlayerId(3), "Duel", None).await;
    tokio::time::sleep(Duration::from_secs(4)).await;
    engine.leave(PlayerId(2)).await;
    tokio::time::sleep(Duration::from_secs(3)).await;

    println!("== Siege: players spread over provisioned copies");
    let mut requests = Vec::new();
    for player in 10..20 {
        let engine = engine.clone();
        requests.push(tokio::spawn(async move {
            engine.join(PlayerId(player), "Siege", None).await
        }));
    }
    for request in requests {
        if let Ok(result) = request.await {
            tracing::debug!(?result, "siege join finished");
        }
    }
    for info in engine.list_live_competitions("Siege").await? {
        println!(
            "  {} on {} ({}): {}/{} players",
            info.id, info.map, info.phase, info.players, info.max_players
        );
    }

    println!("== Shutdown");
    let report = colosseum
        .run_until(tokio::time::sleep(Duration::from_secs(1)))
        .await;
    if let Some(report) = report {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => tracing::error!(error = %err, "could not render shutdown report"),
        }
    }
    Ok(())
}
