use chrono::{DateTime, TimeZone, Utc};
use compact_registry::{
    BuildOptions, ProjectSnapshot, Registry, SnapshotSet, StateSnapshot, TeamSnapshot,
    UserSnapshot,
};
use compact_schema::EntityKind;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0)
        .single()
        .expect("timestamp")
}

fn user(id: &str, created: i64) -> UserSnapshot {
    UserSnapshot {
        id: id.to_string(),
        created_at: at(created),
        name: format!("User {id}"),
        display_name: None,
        email: Some(format!("{id}@example.com")),
        role: Some("member".to_string()),
        active: true,
    }
}

fn team(id: &str, key: &str, created: i64) -> TeamSnapshot {
    TeamSnapshot {
        id: id.to_string(),
        created_at: at(created),
        key: key.to_string(),
        name: format!("Team {key}"),
    }
}

fn state(id: &str, team_id: &str, created: i64) -> StateSnapshot {
    StateSnapshot {
        id: id.to_string(),
        created_at: at(created),
        name: format!("State {id}"),
        state_type: "started".to_string(),
        team_id: Some(team_id.to_string()),
    }
}

fn two_team_set() -> SnapshotSet {
    SnapshotSet {
        teams: vec![team("team-sqt", "SQT", 0), team("team-sqm", "SQM", 1)],
        states: vec![
            state("sqm-todo", "team-sqm", 5),
            state("sqt-todo", "team-sqt", 3),
            state("sqt-done", "team-sqt", 4),
            state("sqm-done", "team-sqm", 6),
        ],
        ..SnapshotSet::default()
    }
}

#[test]
fn users_are_numbered_in_creation_order_regardless_of_input_order() {
    let set = SnapshotSet {
        users: vec![user("c", 20), user("a", 0), user("b", 10)],
        ..SnapshotSet::default()
    };
    let registry = Registry::build(&set, &BuildOptions::new("ws"), at(100)).expect("build");

    assert_eq!(registry.reverse_lookup(EntityKind::User, "a"), Some("u0"));
    assert_eq!(registry.reverse_lookup(EntityKind::User, "b"), Some("u1"));
    assert_eq!(registry.reverse_lookup(EntityKind::User, "c"), Some("u2"));
    assert_eq!(registry.keys(EntityKind::User), ["u0", "u1", "u2"]);
}

#[test]
fn non_default_team_states_are_prefixed() {
    let options = BuildOptions::new("ws").with_default_team("SQT");
    let registry = Registry::build(&two_team_set(), &options, at(100)).expect("build");

    assert_eq!(registry.reverse_lookup(EntityKind::State, "sqt-todo"), Some("s0"));
    assert_eq!(registry.reverse_lookup(EntityKind::State, "sqt-done"), Some("s1"));
    assert_eq!(registry.reverse_lookup(EntityKind::State, "sqm-todo"), Some("sqm:s0"));
    assert_eq!(registry.reverse_lookup(EntityKind::State, "sqm-done"), Some("sqm:s1"));

    assert_eq!(
        registry.resolve(EntityKind::State, "SQM:S1").as_deref(),
        Some("sqm-done")
    );
    let meta = registry.state_metadata("sqm-todo").expect("meta");
    assert_eq!(meta.team_key.as_deref(), Some("SQM"));
}

#[test]
fn without_default_every_team_is_prefixed() {
    let registry =
        Registry::build(&two_team_set(), &BuildOptions::new("ws"), at(100)).expect("build");
    assert_eq!(registry.reverse_lookup(EntityKind::State, "sqt-todo"), Some("sqt:s0"));
    assert_eq!(registry.reverse_lookup(EntityKind::State, "sqm-todo"), Some("sqm:s0"));
}

#[test]
fn default_team_accepts_id_or_key() {
    let by_id = BuildOptions::new("ws").with_default_team("team-sqm");
    let by_key = BuildOptions::new("ws").with_default_team("sqm");
    for options in [by_id, by_key] {
        let registry = Registry::build(&two_team_set(), &options, at(0)).expect("build");
        assert_eq!(registry.default_team_id(), Some("team-sqm"));
        assert_eq!(registry.reverse_lookup(EntityKind::State, "sqm-todo"), Some("s0"));
    }
}

#[test]
fn unknown_and_out_of_range_keys_resolve_to_none() {
    let set = SnapshotSet {
        users: (0..6).map(|i| user(&format!("user-{i}"), i)).collect(),
        ..SnapshotSet::default()
    };
    let registry = Registry::build(&set, &BuildOptions::new("ws"), at(0)).expect("build");

    assert_eq!(registry.resolve(EntityKind::User, "zz999"), None);
    assert_eq!(registry.resolve(EntityKind::User, "u9999"), None);
    assert_eq!(registry.resolve(EntityKind::User, ""), None);
    assert_eq!(registry.resolve(EntityKind::State, "u1"), None);

    let err = registry
        .resolve_or_error(EntityKind::User, "u9")
        .expect_err("out of range");
    assert_eq!(err.requested, "u9");
    assert_eq!(err.suggestions, vec!["u5", "u4", "u3", "u2", "u1"]);
    assert!(err.to_string().contains("valid keys include: u5"));
}

#[test]
fn canonical_ids_pass_through() {
    let registry =
        Registry::build(&SnapshotSet::default(), &BuildOptions::new("ws"), at(0)).expect("build");
    let id = "3f2b8a8e-6d1c-4a7e-9a0b-1c2d3e4f5a6b";
    assert_eq!(registry.resolve(EntityKind::User, id).as_deref(), Some(id));
    assert_eq!(registry.reverse_lookup(EntityKind::User, id), None);
}

#[test]
fn batch_resolution_reports_each_item() {
    let set = SnapshotSet {
        users: vec![user("a", 0)],
        ..SnapshotSet::default()
    };
    let registry = Registry::build(&set, &BuildOptions::new("ws"), at(0)).expect("build");
    let outcomes = registry.resolve_batch(EntityKind::User, &["u0", "u7", "U0"]);

    assert_eq!(outcomes[0].as_deref(), Ok("a"));
    assert!(outcomes[1].is_err());
    assert_eq!(outcomes[2].as_deref(), Ok("a"));
}

#[test]
fn projects_index_slug_and_hash() {
    let set = SnapshotSet {
        users: vec![user("lead", 0)],
        projects: vec![
            ProjectSnapshot {
                id: "p-2".to_string(),
                created_at: at(20),
                name: "Billing".to_string(),
                slug: Some("billing-aa11bb22cc33".to_string()),
                lead_id: Some("gone".to_string()),
                state: None,
            },
            ProjectSnapshot {
                id: "p-1".to_string(),
                created_at: at(10),
                name: "Mobile App".to_string(),
                slug: Some("mobile-app-3f2a9c1b7d4e".to_string()),
                lead_id: Some("lead".to_string()),
                state: Some("started".to_string()),
            },
        ],
        ..SnapshotSet::default()
    };
    let registry = Registry::build(&set, &BuildOptions::new("ws"), at(0)).expect("build");

    assert_eq!(registry.project_key_for_slug("mobile-app-3f2a9c1b7d4e"), Some("pr0"));
    assert_eq!(registry.project_key_for_slug("3F2A9C1B7D4E"), Some("pr0"));
    assert_eq!(registry.project_key_for_slug("renamed-project-aa11bb22cc33"), Some("pr1"));
    assert_eq!(registry.project_key_for_slug("unknown"), None);
    assert_eq!(registry.project_slug("pr1"), Some("billing-aa11bb22cc33"));

    let mobile = registry.project_metadata("p-1").expect("meta");
    assert_eq!(mobile.lead_key.as_deref(), Some("u0"));
    let billing = registry.project_metadata("p-2").expect("meta");
    assert_eq!(billing.lead_key, None);
}

fn users_from_offsets(offsets: &[i64]) -> Vec<UserSnapshot> {
    offsets
        .iter()
        .enumerate()
        .map(|(i, &offset)| user(&format!("user-{i}"), offset))
        .collect()
}

proptest! {
    #[test]
    fn proptest_keys_form_a_creation_ordered_permutation(
        offsets in proptest::collection::vec(0i64..50, 0..40)
    ) {
        let users = users_from_offsets(&offsets);
        let set = SnapshotSet { users: users.clone(), ..SnapshotSet::default() };
        let registry = Registry::build(&set, &BuildOptions::new("ws"), at(0)).expect("build");

        let mut indices: Vec<usize> = users
            .iter()
            .map(|u| {
                let key = registry.reverse_lookup(EntityKind::User, &u.id).expect("key");
                key[1..].parse().expect("index")
            })
            .collect();

        // Creation order: smaller index never belongs to a later user.
        for (a, ua) in users.iter().enumerate() {
            for (b, ub) in users.iter().enumerate() {
                if ua.created_at < ub.created_at {
                    prop_assert!(indices[a] < indices[b]);
                }
                if ua.created_at == ub.created_at && a < b {
                    prop_assert!(indices[a] < indices[b]);
                }
            }
        }

        indices.sort_unstable();
        prop_assert_eq!(indices, (0..users.len()).collect::<Vec<_>>());
    }

    #[test]
    fn proptest_rebuild_is_identical(offsets in proptest::collection::vec(0i64..50, 0..30)) {
        let set = SnapshotSet { users: users_from_offsets(&offsets), ..SnapshotSet::default() };
        let first = Registry::build(&set, &BuildOptions::new("ws"), at(0)).expect("build");
        let second = Registry::build(&set, &BuildOptions::new("ws"), at(99)).expect("build");
        let a: Vec<_> = first.entries(EntityKind::User).collect();
        let b: Vec<_> = second.entries(EntityKind::User).collect();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn proptest_resolve_reverse_resolve_round_trips(
        offsets in proptest::collection::vec(0i64..50, 1..30),
        pick in any::<prop::sample::Index>(),
    ) {
        let set = SnapshotSet { users: users_from_offsets(&offsets), ..SnapshotSet::default() };
        let registry = Registry::build(&set, &BuildOptions::new("ws"), at(0)).expect("build");
        let keys = registry.keys(EntityKind::User).to_vec();
        let key = &keys[pick.index(keys.len())];

        let id = registry.resolve(EntityKind::User, key).expect("id");
        let back = registry.reverse_lookup(EntityKind::User, &id).expect("key");
        prop_assert_eq!(registry.resolve(EntityKind::User, back), Some(id));
        prop_assert_eq!(back, key.as_str());
    }
}
