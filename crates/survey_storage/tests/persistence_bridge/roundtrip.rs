#![forbid(unsafe_code)]

use rand::rngs::StdRng;
use rand::SeedableRng;
use survey_engines::assignment::AssignmentStore;
use survey_kernel_contracts::assignment::{AssignmentSnapshot, DragPayload};
use survey_kernel_contracts::role::RoleId;
use survey_kernel_contracts::session::{
    NavigationState, ParticipantInfo, PersistedSession, SurveyPage,
};
use survey_storage::bridge::{PersistenceBridge, SessionKey};
use survey_storage::kv::{FileKeyValueStore, KeyValueStore};

fn worked_store(rng: &mut StdRng) -> AssignmentStore {
    let mut store = AssignmentStore::fresh(rng);
    let first = store.available_icons()[0].id.clone();
    let second = store.available_icons()[1].id.clone();
    store.apply_drop(RoleId(1), &DragPayload::New { icon_id: first });
    store.apply_drop(RoleId(2), &DragPayload::New { icon_id: second });
    store.apply_drop(
        RoleId(5),
        &DragPayload::Reassign {
            source_role_id: RoleId(1),
        },
    );
    store
}

#[test]
fn at_bridge_rt_01_session_survives_a_reopened_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let store = worked_store(&mut rng);
    let session = PersistedSession {
        navigation: NavigationState {
            current_page: SurveyPage::Assignment,
            is_submitted: false,
            history: Vec::new(),
        },
        participant: Some(ParticipantInfo {
            age: 52,
            field_of_study: "Ecology".to_string(),
        }),
        assignment_snapshot: Some(store.snapshot()),
    };

    {
        let mut bridge = PersistenceBridge::new(FileKeyValueStore::new(dir.path()));
        bridge.save_session(&session);
    }

    let bridge = PersistenceBridge::new(FileKeyValueStore::new(dir.path()));
    let loaded = bridge.load_session();
    assert_eq!(loaded, session);

    let mut other_rng = StdRng::seed_from_u64(99);
    let restored = AssignmentStore::initialize(loaded.assignment_snapshot, &mut other_rng);
    assert_eq!(restored, store);
    assert_eq!(restored.progress(), (2, 14));
}

#[test]
fn at_bridge_rt_02_tampered_snapshot_falls_back_to_fresh_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut rng = StdRng::seed_from_u64(11);
    let mut snapshot: AssignmentSnapshot = worked_store(&mut rng).snapshot();
    snapshot.roles.truncate(3);

    let mut bridge = PersistenceBridge::new(FileKeyValueStore::new(dir.path()));
    bridge.save(SessionKey::Assignment, &snapshot);
    let loaded: Option<AssignmentSnapshot> = bridge.load(SessionKey::Assignment);
    assert_eq!(loaded.as_ref(), Some(&snapshot));

    let restored = AssignmentStore::initialize(loaded, &mut rng);
    assert_eq!(restored.roles().len(), 14);
    assert_eq!(restored.progress(), (0, 14));
    assert_eq!(restored.current_icon_index(), 0);
}

#[test]
fn at_bridge_rt_03_keys_land_as_json_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut bridge = PersistenceBridge::new(FileKeyValueStore::new(dir.path()));
    bridge.save(SessionKey::Navigation, &NavigationState::default());
    assert!(dir.path().join("credit_survey_state.json").exists());

    let raw = bridge
        .store()
        .get(SessionKey::Navigation.as_str())
        .unwrap()
        .unwrap();
    assert!(raw.contains("\"current_page\":\"intake\""));

    bridge.clear();
    assert!(!dir.path().join("credit_survey_state.json").exists());
    assert_eq!(bridge.load_session(), PersistedSession::default());
}
