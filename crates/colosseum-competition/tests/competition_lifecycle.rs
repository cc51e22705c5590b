//! Integration tests for a competition driven through the built-in phases.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use colosseum_competition::phases::{Ingame, Victory, Waiting};
use colosseum_competition::{
    ArenaType, Bounds, Competition, CompetitionConfig, CompetitionError, MapDescriptor,
    MapInstance, Outcome, PhaseId, PhaseType,
};
use colosseum_types::{ArenaId, CompetitionId, Message, MessageSink, PlayerId, Role};

// =========================================================================
// Recording sink
// =========================================================================

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<(PlayerId, Message)>>,
}

impl RecordingSink {
    fn take(&self) -> Vec<(PlayerId, Message)> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

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

// =========================================================================
// Helpers
// =========================================================================

const P1: PlayerId = PlayerId(1);
const P2: PlayerId = PlayerId(2);
const P3: PlayerId = PlayerId(3);

fn duel_config() -> CompetitionConfig {
    CompetitionConfig {
        min_players: 2,
        max_players: 2,
        ..CompetitionConfig::default()
    }
}

fn competition(arena: ArenaType, sink: &Arc<RecordingSink>) -> Competition {
    Competition::new(
        CompetitionId(1),
        ArenaId(1),
        Arc::new(arena),
        MapDescriptor::fixed("pit"),
        None,
        Arc::clone(sink) as Arc<dyn MessageSink>,
    )
}

fn tick(competition: &mut Competition, seconds: u64) {
    for _ in 0..seconds {
        competition.update(Duration::from_secs(1));
    }
}

// =========================================================================
// Join rules
// =========================================================================

#[test]
fn test_new_competition_starts_waiting() {
    let sink = Arc::new(RecordingSink::default());
    let c = competition(ArenaType::standard("Duel", duel_config()), &sink);
    assert_eq!(c.phase(), PhaseId::WAITING);
    assert!(c.roster().is_empty());
    assert!(!c.is_dynamic());
}

#[test]
fn test_join_notifies_player() {
    let sink = Arc::new(RecordingSink::default());
    let mut c = competition(ArenaType::standard("Duel", duel_config()), &sink);

    c.join(P1, Role::Playing).unwrap();

    assert_eq!(c.roster().role(P1), Some(Role::Playing));
    assert_eq!(
        sink.to(P1),
        vec![Message::ArenaJoined { map: "pit".into() }]
    );
}

#[test]
fn test_duplicate_join_is_rejected() {
    let sink = Arc::new(RecordingSink::default());
    let mut c = competition(ArenaType::standard("Duel", duel_config()), &sink);
    c.join(P1, Role::Playing).unwrap();

    let result = c.evaluate_join(P1, Role::Spectating);
    assert_eq!(result.message, Some(Message::AlreadyInArena));
}

#[test]
fn test_full_competition_rejects_third_player() {
    let sink = Arc::new(RecordingSink::default());
    let config = CompetitionConfig {
        min_players: 3,
        max_players: 2,
        ..CompetitionConfig::default()
    };
    let mut c = competition(ArenaType::standard("Duel", config), &sink);
    c.join(P1, Role::Playing).unwrap();
    c.join(P2, Role::Playing).unwrap();

    let err = c.join(P3, Role::Playing).unwrap_err();
    assert!(matches!(
        err,
        CompetitionError::JoinRejected {
            reason: Message::ArenaFull,
            ..
        }
    ));
    assert_eq!(c.roster().len(), 2);
}

#[test]
fn test_spectators_can_be_disabled() {
    let sink = Arc::new(RecordingSink::default());
    let config = CompetitionConfig {
        allow_spectators: false,
        ..duel_config()
    };
    let c = competition(ArenaType::standard("Duel", config), &sink);

    let result = c.evaluate_join(P1, Role::Spectating);
    assert!(!result.is_success());
    assert_eq!(result.message, Some(Message::ArenaNotSpectatable));
}

#[test]
fn test_spectator_limit() {
    let sink = Arc::new(RecordingSink::default());
    let config = CompetitionConfig {
        max_spectators: 1,
        ..duel_config()
    };
    let mut c = competition(ArenaType::standard("Duel", config), &sink);
    c.join(P1, Role::Spectating).unwrap();

    assert_eq!(
        c.evaluate_join(P2, Role::Spectating).message,
        Some(Message::ArenaFull)
    );
}

#[test]
fn test_leave_unknown_player_is_an_error() {
    let sink = Arc::new(RecordingSink::default());
    let mut c = competition(ArenaType::standard("Duel", duel_config()), &sink);
    assert!(matches!(
        c.leave(P1),
        Err(CompetitionError::NotInRoster(..))
    ));
}

// =========================================================================
// Phase lifecycle
// =========================================================================

#[test]
fn test_full_round_lifecycle() {
    let sink = Arc::new(RecordingSink::default());
    let mut c = competition(ArenaType::standard("Duel", duel_config()), &sink);

    c.join(P1, Role::Playing).unwrap();
    assert_eq!(c.phase(), PhaseId::WAITING);

    c.join(P2, Role::Playing).unwrap();
    assert_eq!(c.phase(), PhaseId::COUNTDOWN);
    sink.take();

    // The countdown stays open; the duel is simply full.
    assert_eq!(
        c.evaluate_join(P3, Role::Playing).message,
        Some(Message::ArenaFull)
    );

    tick(&mut c, 10);
    assert_eq!(c.phase(), PhaseId::INGAME);

    let announced: Vec<u64> = sink
        .to(P1)
        .into_iter()
        .filter_map(|m| match m {
            Message::ArenaStartsIn { seconds, .. } => Some(seconds),
            _ => None,
        })
        .collect();
    assert_eq!(announced, vec![5, 4, 3, 2, 1]);
    assert_eq!(sink.to(P1).last(), Some(&Message::Fight));

    // Spectators may watch a round in progress; players may not join it.
    assert_eq!(
        c.evaluate_join(P3, Role::Playing).message,
        Some(Message::ArenaNotJoinable)
    );
    assert!(c.evaluate_join(P3, Role::Spectating).is_success());

    c.leave(P2).unwrap();
    assert_eq!(c.phase(), PhaseId::VICTORY);
    assert_eq!(c.victory().outcome(), Some(&Outcome::Victory(vec![P1])));
    assert!(sink.to(P1).contains(&Message::Victory { winners: vec![P1] }));

    // Closed to everyone until the round is cleared.
    assert_eq!(
        c.evaluate_join(P3, Role::Spectating).message,
        Some(Message::ArenaNotSpectatable)
    );

    tick(&mut c, 5);
    assert_eq!(c.phase(), PhaseId::WAITING);
    assert!(c.roster().is_empty());
    assert_eq!(c.take_departed(), vec![P1]);
    assert_eq!(
        sink.to(P1).last(),
        Some(&Message::ArenaLeft { map: "pit".into() })
    );
    // A new round starts clean.
    assert!(c.victory().outcome().is_none());
    assert!(!c.victory().is_released());
}

#[test]
fn test_countdown_cancels_when_player_leaves() {
    let sink = Arc::new(RecordingSink::default());
    let mut c = competition(ArenaType::standard("Duel", duel_config()), &sink);
    c.join(P1, Role::Playing).unwrap();
    c.join(P2, Role::Playing).unwrap();
    assert_eq!(c.phase(), PhaseId::COUNTDOWN);

    c.leave(P2).unwrap();

    assert_eq!(c.phase(), PhaseId::WAITING);
    assert!(sink.to(P1).contains(&Message::ArenaStartCancelled));
}

#[test]
fn test_spectators_do_not_start_countdown() {
    let sink = Arc::new(RecordingSink::default());
    let mut c = competition(ArenaType::standard("Duel", duel_config()), &sink);
    c.join(P1, Role::Playing).unwrap();
    c.join(P2, Role::Spectating).unwrap();
    assert_eq!(c.phase(), PhaseId::WAITING);
}

#[test]
fn test_forced_victory_and_draw() {
    let sink = Arc::new(RecordingSink::default());
    let mut c = competition(ArenaType::standard("Duel", duel_config()), &sink);
    c.join(P1, Role::Playing).unwrap();

    assert!(!c.declare_draw());
    c.set_phase(PhaseId::VICTORY).unwrap();
    assert!(c.declare_draw());

    assert_eq!(c.victory().outcome(), Some(&Outcome::Draw));
    assert!(sink.to(P1).contains(&Message::Draw));
    assert!(c.victory_mut().end());
    assert!(!c.victory_mut().end());
}

#[test]
fn test_unknown_phase_is_rejected() {
    let sink = Arc::new(RecordingSink::default());
    let mut c = competition(ArenaType::standard("Duel", duel_config()), &sink);
    assert!(matches!(
        c.set_phase(PhaseId("overtime")),
        Err(CompetitionError::UnknownPhase { .. })
    ));
    assert_eq!(c.phase(), PhaseId::WAITING);
}

#[test]
fn test_custom_arena_with_late_join() {
    let sink = Arc::new(RecordingSink::default());
    let arena = ArenaType::builder("Race")
        .config(CompetitionConfig {
            min_players: 1,
            ..CompetitionConfig::default()
        })
        .phase(PhaseType::new(PhaseId::WAITING, || {
            Waiting::new().next(PhaseId::INGAME)
        }))
        .phase(PhaseType::new(PhaseId::INGAME, || Ingame::new().late_join(true)))
        .build()
        .unwrap();
    let mut c = competition(arena, &sink);

    c.join(P1, Role::Playing).unwrap();
    assert_eq!(c.phase(), PhaseId::INGAME);
    c.join(P2, Role::Playing).unwrap();
    assert_eq!(c.roster().playing_count(), 2);
}

#[test]
fn test_template_competition_abandoned_after_last_leave() {
    let sink = Arc::new(RecordingSink::default());
    let arena = ArenaType::builder("Siege")
        .phase(PhaseType::new(PhaseId::WAITING, || {
            Waiting::new().next(PhaseId::VICTORY)
        }))
        .phase(PhaseType::victory(PhaseId::VICTORY, Victory::default))
        .build()
        .unwrap();
    let instance = MapInstance {
        id: 7,
        map: "keep".into(),
        origin: [1000, 64, 0],
    };
    let mut c = Competition::new(
        CompetitionId(2),
        ArenaId(1),
        Arc::new(arena),
        MapDescriptor::template("keep", Bounds::new([0, 0, 0], [31, 31, 31])),
        Some(instance.clone()),
        Arc::clone(&sink) as Arc<dyn MessageSink>,
    );
    assert!(c.is_dynamic());
    assert!(!c.is_abandoned());

    c.join(P1, Role::Playing).unwrap();
    c.leave(P1).unwrap();

    assert!(c.is_abandoned());
    assert_eq!(c.into_instance(), Some(instance));
}

#[test]
fn test_info_snapshot() {
    let sink = Arc::new(RecordingSink::default());
    let mut c = competition(ArenaType::standard("Duel", duel_config()), &sink);
    c.join(P1, Role::Playing).unwrap();
    c.join(P3, Role::Spectating).unwrap();

    let info = c.info();
    assert_eq!(info.arena, "Duel");
    assert_eq!(info.map, "pit");
    assert_eq!(info.phase, PhaseId::WAITING);
    assert_eq!(info.players, 1);
    assert_eq!(info.spectators, 1);
    assert_eq!(info.max_players, 2);
}
