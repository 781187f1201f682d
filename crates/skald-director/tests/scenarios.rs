//! End-to-end runs of the Director against in-memory logs and scripted
//! reasoning services.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use skald_campaign_store::InMemoryCampaignLog;
use skald_core::action::{ActionKind, ProposalOrigin};
use skald_core::error::DomainError;
use skald_core::event::Topic;
use skald_core::ids::{AgentId, EntityId, LocationId, TurnNumber};
use skald_core::reason::ReasonCode;
use skald_core::repository::CampaignLogRepository;
use skald_core::service::ReasoningService;
use skald_core::turn::{TurnRange, TurnRecord};
use skald_core::verdict::Verdict;
use skald_core::world::{ResourceKey, WorldState};
use skald_director::{Director, DirectorConfig, DirectorState, RunError, RunOutcome};
use skald_persona::domain::candidate::{Situation, rank};
use skald_persona::domain::strategy::Balanced;
use skald_persona::{CharacterProfile, DecisionEngine, EngineConfig, Persona, ProfileFormat};
use skald_test_support::{
    FlakyCampaignLog, ScriptedReasoningService, StalledReasoningService,
    UnreachableReasoningService, WorldBuilder, fixed_clock,
};

fn world() -> WorldState {
    WorldBuilder::new()
        .location("hall", None)
        .location("room_a", Some(1))
        .location("crypt", None)
        .connect("hall", "room_a")
        .connect("hall", "crypt")
        .entity("aria", "Aria", "hall")
        .entity("borin", "Borin", "hall")
        .build()
}

fn config() -> DirectorConfig {
    DirectorConfig {
        agent_deadline: Duration::from_millis(100),
        turn_deadline: Duration::from_secs(1),
        max_workers: 4,
        history_capacity: 8,
    }
}

fn director(log: Arc<dyn CampaignLogRepository>) -> Director {
    Director::new(config(), world(), log, fixed_clock()).unwrap()
}

fn engine(service: impl ReasoningService + 'static) -> Arc<dyn Persona> {
    Arc::new(
        DecisionEngine::new(EngineConfig {
            service_timeout: Duration::from_secs(60),
        })
        .with_reasoning(Arc::new(service)),
    )
}

fn profile(id: &str, name: &str, actions: &str, initiative: i32) -> String {
    format!("id: {id}\nname: {name}\nallowed_actions: [{actions}]\ninitiative: {initiative}\n")
}

fn register(director: &mut Director, document: &str, persona: Arc<dyn Persona>) {
    director
        .register_agent_from_document(document, ProfileFormat::Yaml, persona)
        .unwrap();
}

async fn records(log: &dyn CampaignLogRepository) -> Vec<TurnRecord> {
    log.load_range(TurnRange::all()).await.unwrap()
}

fn topics(director: &Director, watched: &[Topic]) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    for topic in watched {
        let sink = Arc::clone(&seen);
        director.bus().subscribe(topic.clone(), move |event| {
            sink.lock().unwrap().push(event.topic.to_string());
            Ok(())
        });
    }
    seen
}

#[tokio::test(start_paused = true)]
async fn test_agent_that_always_times_out_idles_while_others_act() {
    // Arrange
    let log = Arc::new(InMemoryCampaignLog::new());
    let mut director = director(log.clone());
    register(
        &mut director,
        &profile("aria", "Aria", "observe", 0),
        engine(StalledReasoningService),
    );
    register(
        &mut director,
        &profile("borin", "Borin", "observe", 0),
        engine(ScriptedReasoningService::new().with_choice("borin", "observe", "keeping watch")),
    );

    // Act
    let report = director.start(3).await.unwrap();

    // Assert
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.completed, 3);
    let status = director.get_status();
    assert_eq!(status.state, DirectorState::Completed);
    assert_eq!(status.turn_count, 3);

    let records = records(log.as_ref()).await;
    assert_eq!(records.len(), 3);
    for record in &records {
        let aria = record.entry_for(&AgentId::new("aria")).unwrap();
        assert_eq!(aria.action.kind, ActionKind::NoOp);
        assert_eq!(aria.origin, ProposalOrigin::TimedOut);
        assert_eq!(aria.origin.reason(), Some(ReasonCode::Timeout));

        let borin = record.entry_for(&AgentId::new("borin")).unwrap();
        assert_eq!(borin.action.kind, ActionKind::Observe);
        assert_eq!(borin.verdict, Verdict::Legal);
        assert_eq!(borin.action.rationale.as_deref(), Some("keeping watch"));
    }
}

#[tokio::test]
async fn test_capped_room_goes_to_higher_initiative() {
    let log = Arc::new(InMemoryCampaignLog::new());
    let mut director = director(log.clone());
    let script = || {
        ScriptedReasoningService::new()
            .with_choice("aria", "move:room_a", "")
            .with_choice("borin", "move:room_a", "")
    };
    register(&mut director, &profile("aria", "Aria", "move", 1), engine(script()));
    register(&mut director, &profile("borin", "Borin", "move", 5), engine(script()));

    director.start(1).await.unwrap();

    let record = &records(log.as_ref()).await[0];
    assert_eq!(
        record.entry_for(&AgentId::new("borin")).unwrap().verdict,
        Verdict::Legal
    );
    assert_eq!(
        record.entry_for(&AgentId::new("aria")).unwrap().verdict,
        Verdict::FailedContention {
            resource: ResourceKey::Location(LocationId::new("room_a")),
            winner: AgentId::new("borin"),
        }
    );
    assert_eq!(
        director.world().entity(&EntityId::new("borin")).unwrap().location,
        LocationId::new("room_a")
    );
    assert_eq!(
        director.world().entity(&EntityId::new("aria")).unwrap().location,
        LocationId::new("hall")
    );
}

#[tokio::test]
async fn test_capped_room_tie_goes_to_earlier_registration() {
    let log = Arc::new(InMemoryCampaignLog::new());
    let mut director = director(log.clone());
    let script = || {
        ScriptedReasoningService::new()
            .with_choice("aria", "move:room_a", "")
            .with_choice("borin", "move:room_a", "")
    };
    register(&mut director, &profile("borin", "Borin", "move", 2), engine(script()));
    register(&mut director, &profile("aria", "Aria", "move", 2), engine(script()));

    director.start(1).await.unwrap();

    let record = &records(log.as_ref()).await[0];
    let committed: Vec<_> = record.committed().map(|e| e.actor().as_str()).collect();
    assert_eq!(committed, vec!["borin"]);
}

#[tokio::test]
async fn test_malformed_profile_never_reaches_collection() {
    let log = Arc::new(InMemoryCampaignLog::new());
    let mut director = director(log.clone());
    let status = director.status_watch();

    let err = director
        .register_agent_from_document(
            "id: aria\nname: Aria\nallowed_actions: [dance]\n",
            ProfileFormat::Yaml,
            engine(StalledReasoningService),
        )
        .unwrap_err();

    assert!(matches!(err, DomainError::MalformedProfile { .. }));
    assert!(!status.has_changed().unwrap());
    assert!(matches!(director.start(1).await, Err(RunError::NotStarted(_))));
    assert_eq!(director.get_status().state, DirectorState::Idle);
    assert!(records(log.as_ref()).await.is_empty());
}

#[tokio::test]
async fn test_unreachable_service_falls_back_every_turn() {
    // Arrange
    let log = Arc::new(InMemoryCampaignLog::new());
    let mut director = director(log.clone());
    let service = Arc::new(UnreachableReasoningService::default());
    let mut profiles = Vec::new();
    for (id, name) in [("aria", "Aria"), ("borin", "Borin")] {
        let document = format!(
            "{}weights: {{search: 50}}\n",
            profile(id, name, "observe, search, rest", 0)
        );
        profiles.push(CharacterProfile::from_yaml_str(&document).unwrap());
        let persona: Arc<dyn Persona> = Arc::new(
            DecisionEngine::new(EngineConfig::default()).with_reasoning(service.clone()),
        );
        register(&mut director, &document, persona);
    }
    let opening = world();
    let expected: Vec<_> = profiles
        .iter()
        .map(|profile| {
            let me = opening.entity(&EntityId::new(profile.id.as_str())).unwrap();
            let situation = Situation {
                profile,
                world: &opening,
                me,
                history: &[],
            };
            rank(&Balanced, &situation)[0].to_action(&profile.id, profile.initiative)
        })
        .collect();

    // Act
    let report = director.start(2).await.unwrap();

    // Assert
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(director.get_status().state, DirectorState::Completed);
    assert_eq!(service.calls(), 4);
    let records = records(log.as_ref()).await;
    for action in &expected {
        let entry = records[0].entry_for(&action.actor).unwrap();
        assert_eq!(entry.action.kind, action.kind);
        assert_eq!(entry.action.target, action.target);
    }
    for record in &records {
        for entry in &record.entries {
            assert_eq!(
                entry.origin,
                ProposalOrigin::Fallback {
                    reason: ReasonCode::ServiceUnavailable
                }
            );
            assert_eq!(entry.action.kind, ActionKind::Search);
            assert_eq!(entry.action.target, None);
            assert!(entry.is_committed());
        }
    }
}

#[tokio::test]
async fn test_resume_replays_log_and_continues_numbering() {
    // Arrange
    let log = Arc::new(InMemoryCampaignLog::new());
    let walker = || ScriptedReasoningService::new().with_choice("aria", "move:crypt", "");
    let mut first = director(log.clone());
    register(&mut first, &profile("aria", "Aria", "move", 0), engine(walker()));
    first.start(3).await.unwrap();
    let digest = first.world().digest();

    // Act
    let mut second = director(log.clone());
    register(&mut second, &profile("aria", "Aria", "move", 0), engine(walker()));
    let last = second.resume_from_log().await.unwrap();

    // Assert
    assert_eq!(last, Some(TurnNumber::new(3)));
    assert_eq!(second.world().digest(), digest);
    assert_eq!(second.get_status().turn_count, 3);
    let aria = second.registry().get(&AgentId::new("aria")).unwrap();
    assert_eq!(aria.history().len(), 3);

    second.start(1).await.unwrap();
    assert_eq!(second.last_turn(), Some(TurnNumber::new(4)));
    assert_eq!(records(log.as_ref()).await.len(), 4);
}

#[tokio::test]
async fn test_resume_detects_tampered_record() {
    let original = Arc::new(InMemoryCampaignLog::new());
    let mut director = director(original.clone());
    register(
        &mut director,
        &profile("aria", "Aria", "move", 0),
        engine(ScriptedReasoningService::new().with_choice("aria", "move:crypt", "")),
    );
    director.start(2).await.unwrap();

    let tampered = Arc::new(InMemoryCampaignLog::new());
    for mut record in records(original.as_ref()).await {
        if record.turn == TurnNumber::new(2) {
            record.deltas.clear();
        }
        tampered.append(&record).await.unwrap();
    }

    let mut resumed = self::director(tampered);
    let result = resumed.resume_from_log().await;

    assert!(matches!(result, Err(DomainError::Integrity(_))));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_collection_logs_nothing() {
    let log = Arc::new(InMemoryCampaignLog::new());
    let mut director = Director::new(
        DirectorConfig {
            agent_deadline: Duration::from_secs(30),
            turn_deadline: Duration::from_secs(60),
            ..config()
        },
        world(),
        log.clone(),
        fixed_clock(),
    )
    .unwrap();
    register(
        &mut director,
        &profile("aria", "Aria", "observe", 0),
        engine(StalledReasoningService),
    );
    let seen = topics(&director, &[Topic::TURN_STARTED, Topic::TURN_CANCELLED]);
    let signal = director.cancel_signal();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        signal.cancel();
    });

    let report = director.start(3).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert_eq!(report.completed, 0);
    assert_eq!(report.last_turn, None);
    assert_eq!(director.get_status().state, DirectorState::Idle);
    assert!(records(log.as_ref()).await.is_empty());
    assert_eq!(*seen.lock().unwrap(), vec!["turn.started", "turn.cancelled"]);
    assert!(!director.cancel_signal().is_cancelled());
}

#[tokio::test]
async fn test_failed_append_keeps_prior_turns_and_reports_progress() {
    // Arrange
    let log = Arc::new(FlakyCampaignLog::failing_after(2));
    let mut director = director(log.clone());
    register(
        &mut director,
        &profile("aria", "Aria", "observe", 0),
        engine(ScriptedReasoningService::new().with_choice("aria", "observe", "")),
    );
    let seen = topics(&director, &[Topic::TURN_COMPLETED, Topic::TURN_FAILED]);

    // Act
    let err = director.start(3).await.unwrap_err();

    // Assert
    match &err {
        RunError::Failed {
            completed,
            requested,
            last_committed,
            source,
        } => {
            assert_eq!(*completed, 2);
            assert_eq!(*requested, 3);
            assert_eq!(*last_committed, Some(TurnNumber::new(2)));
            assert!(matches!(source, DomainError::Infrastructure(_)));
        }
        other @ RunError::NotStarted(_) => panic!("expected Failed, got {other:?}"),
    }
    assert!(err.to_string().contains("completing 2 of 3 turns"));
    assert_eq!(log.records().len(), 2);
    assert_eq!(director.get_status().state, DirectorState::Failed);
    assert_eq!(director.last_turn(), Some(TurnNumber::new(2)));
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["turn.completed", "turn.completed", "turn.failed"]
    );
    assert!(matches!(director.start(1).await, Err(RunError::NotStarted(_))));

    assert_eq!(director.resume_from_log().await.unwrap(), Some(TurnNumber::new(2)));
    assert_eq!(director.get_status().state, DirectorState::Idle);
}

#[tokio::test]
async fn test_events_follow_turn_lifecycle() {
    let log = Arc::new(InMemoryCampaignLog::new());
    let mut director = director(log);
    register(
        &mut director,
        &profile("aria", "Aria", "observe", 0),
        engine(ScriptedReasoningService::new().with_choice("aria", "observe", "")),
    );
    let seen = topics(
        &director,
        &[
            Topic::TURN_STARTED,
            Topic::TURN_COMPLETED,
            Topic::SIMULATION_COMPLETED,
        ],
    );
    let mut status = director.status_watch();

    director.start(2).await.unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            "turn.started",
            "turn.completed",
            "turn.started",
            "turn.completed",
            "simulation.completed",
        ]
    );
    assert!(status.has_changed().unwrap());
    let last = *status.borrow_and_update();
    assert_eq!(last.state, DirectorState::Completed);
    assert_eq!(last.turn_count, 2);
    assert_eq!(last.agent_count, 1);
}

#[tokio::test]
async fn test_history_never_exceeds_capacity() {
    let log = Arc::new(InMemoryCampaignLog::new());
    let mut director = director(log);
    register(
        &mut director,
        "id: aria\nname: Aria\nallowed_actions: [observe]\nhistory_capacity: 2\n",
        engine(ScriptedReasoningService::new().with_choice("aria", "observe", "")),
    );

    director.start(5).await.unwrap();

    let history = director.registry().get(&AgentId::new("aria")).unwrap().history();
    assert_eq!(history.len(), 2);
    assert_eq!(history.last().unwrap().turn, TurnNumber::new(5));
}
