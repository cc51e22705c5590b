//! Integration tests for booting a Colosseum from configuration and
//! descriptor documents.

use std::sync::{Arc, Mutex};

use colosseum::prelude::*;

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<(PlayerId, Message)>>,
}

impl RecordingSink {
    fn to(&self, player: PlayerId) -> Vec<Message> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| *p == player)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl MessageSink for RecordingSink {
    fn send(&self, player: PlayerId, message: Message) {
        self.sent.lock().unwrap().push((player, message));
    }
}

/// Lays copies out along the x axis.
struct Strip;

impl ProvisioningBackend for Strip {
    fn is_available(&self) -> bool {
        true
    }

    async fn instantiate(
        &self,
        _arena: &str,
        map: &MapDescriptor,
    ) -> Result<MapInstance, ProvisionError> {
        Ok(MapInstance {
            id: 1,
            map: map.name.clone(),
            origin: [1000, 0, 0],
        })
    }
}

const DESCRIPTORS: &str = r#"{
    "Duel": [
        { "name": "pit", "kind": "fixed" },
        { "name": "pit", "kind": "fixed" },
        { "name": "ring", "kind": "fixed" }
    ],
    "Siege": [
        { "name": "keep", "kind": "template", "bounds": { "min": [0,0,0], "max": [63,31,63] } },
        { "name": "floating", "kind": "template" }
    ]
}"#;

const CONFIG: &str = r#"{
    "maxDynamicInstances": -1,
    "arenas": { "Siege": { "maxDynamicInstances": 1 } },
    "tickRateHz": 0
}"#;

fn duel() -> ArenaType {
    ArenaType::standard(
        "Duel",
        CompetitionConfig {
            max_players: 2,
            ..CompetitionConfig::default()
        },
    )
}

fn siege() -> ArenaType {
    ArenaType::standard("Siege", CompetitionConfig::default())
}

#[tokio::test]
async fn test_boot_registers_arenas_and_fixed_maps() {
    let sink = Arc::new(RecordingSink::default());
    let colosseum = Colosseum::builder()
        .config_json(CONFIG)
        .unwrap()
        .arena(duel())
        .arena(siege())
        .descriptors(JsonDescriptors::from_json(DESCRIPTORS).unwrap())
        .backend(Strip)
        .sink(Arc::clone(&sink) as Arc<dyn MessageSink>)
        .start()
        .await
        .unwrap();

    let names: Vec<&str> = colosseum.arenas().map(|(_, name)| name).collect();
    assert_eq!(names, vec!["Duel", "Siege"]);

    // The duplicate "pit" is skipped; each remaining fixed map has a
    // competition. Template maps wait for demand.
    let engine = colosseum.engine();
    let duel = engine.list_live_competitions("Duel").await.unwrap();
    assert_eq!(
        duel.iter().map(|c| c.map.as_str()).collect::<Vec<_>>(),
        vec!["pit", "ring"]
    );
    assert!(engine.list_live_competitions("Siege").await.unwrap().is_empty());

    // "floating" had no bounds and was skipped, so only "keep" is known.
    assert_eq!(
        engine.join(PlayerId(1), "Siege", Some("floating")).await.message,
        Some(Message::NoArenaWithName)
    );
    assert!(engine.join(PlayerId(1), "Siege", None).await.is_success());
    assert_eq!(
        sink.to(PlayerId(1)).last(),
        Some(&Message::ArenaJoined {
            map: "keep".to_string()
        })
    );

    let report = colosseum.run_until(async {}).await.unwrap();
    assert_eq!(report.len(), 3);
    assert!(report.competitions.iter().all(|c| c.victory_released));
}

#[tokio::test]
async fn test_duplicate_arena_fails_boot() {
    let result = Colosseum::builder()
        .config(EngineConfig {
            tick_rate_hz: 0,
            ..EngineConfig::default()
        })
        .arena(duel())
        .arena(duel())
        .start()
        .await;
    assert!(matches!(result, Err(ColosseumError::Engine(_))));
}

#[tokio::test]
async fn test_bad_config_is_an_error() {
    let result = Colosseum::builder().config_json(r#"{ "maxDynamicInstances": -5 }"#);
    assert!(matches!(result, Err(ColosseumError::Engine(_))));
}
