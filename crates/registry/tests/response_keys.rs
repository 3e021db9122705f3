use chrono::Utc;
use compact_encoder::{encode, Document, Meta, Row, Section};
use compact_registry::{
    check_references, failure_section, BuildOptions, Registry, ResponseKeys, SnapshotSet,
};
use compact_schema::{EntityKind, Value, COMMENTS, PROJECTS};
use pretty_assertions::assert_eq;
use serde_json::json;

fn registry() -> Registry {
    let set = SnapshotSet::from_json(json!({
        "users": [
            {"id": "user-ada", "createdAt": "2024-01-01T00:00:00Z", "name": "Ada Lovelace",
             "displayName": "ada", "email": "ada@example.com", "role": "admin"},
            {"id": "user-grace", "createdAt": "2024-01-02T00:00:00Z", "name": "Grace Hopper",
             "displayName": "grace", "email": "grace@example.com", "role": "member"}
        ],
        "projects": [
            {"id": "proj-1", "createdAt": "2024-01-03T00:00:00Z", "name": "Mobile App",
             "slug": "mobile-app-3f2a9c1b7d4e", "leadId": "user-grace", "state": "started"}
        ]
    }))
    .expect("snapshots");
    Registry::build(&set, &BuildOptions::new("ws"), Utc::now()).expect("build")
}

#[test]
fn unknown_ids_get_response_local_ext_keys() {
    let registry = registry();
    let mut keys = ResponseKeys::new(&registry);

    assert_eq!(keys.key_for(EntityKind::User, "user-ada"), "u0");
    assert_eq!(
        keys.key_for_named(EntityKind::User, "user-gone", Some("Old Timer")),
        "ext0"
    );
    assert_eq!(keys.key_for(EntityKind::User, "user-gone"), "ext0");
    assert_eq!(keys.key_for(EntityKind::User, "user-other"), "ext1");
    assert_eq!(keys.external_count(), 2);

    // Never merged into the registry; a fresh response starts over.
    assert_eq!(registry.reverse_lookup(EntityKind::User, "user-gone"), None);
    let mut next = ResponseKeys::new(&registry);
    assert_eq!(next.key_for(EntityKind::User, "user-other"), "ext0");
}

#[test]
fn lookups_cover_exactly_the_referenced_entities() {
    let registry = registry();
    let mut keys = ResponseKeys::new(&registry);

    let mut comments = Section::new(&COMMENTS);
    for (author, body) in [("user-ada", "Looks good"), ("user-gone", "Ship it")] {
        comments.push(
            Row::new()
                .with("issue", "SQT-1")
                .with("author", keys.key_for(EntityKind::User, author))
                .with("created", "2024-05-01T09:00:00.000Z")
                .with("body", body),
        );
    }

    let mut doc = Document::new(Meta::new().field("tool", "list_comments"));
    for lookup in keys.lookups() {
        doc = doc.with_lookup(lookup);
    }
    doc = doc.with_data(comments);

    let expected = "\
_meta{tool}:list_comments
_users[2]{key,name,displayName,email,role}:
  u0,Ada Lovelace,ada,ada@example.com,admin
  ext0,(external),,,
comments[2]{issue,author,created,body}:
  SQT-1,u0,2024-05-01,Looks good
  SQT-1,ext0,2024-05-01,Ship it";
    assert_eq!(encode(&doc).expect("encode"), expected);
    assert!(check_references(&doc, &registry).is_empty());
}

#[test]
fn project_usage_pulls_in_its_lead() {
    let registry = registry();
    let mut keys = ResponseKeys::new(&registry);
    assert_eq!(keys.key_for(EntityKind::Project, "proj-1"), "pr0");

    let lookups = keys.lookups();
    let names: Vec<_> = lookups.iter().map(Section::name).collect();
    assert_eq!(names, vec!["_users", "_projects"]);
    assert_eq!(lookups[0].rows[0].get("key"), Some(&Value::from("u1")));
    assert_eq!(lookups[1].rows[0].get("lead"), Some(&Value::from("u1")));
}

#[test]
fn dangling_references_are_reported() {
    let registry = registry();
    let row = Row::new()
        .with("key", "pr7")
        .with("name", "Ghost")
        .with("state", Value::Null)
        .with("progress", 0.5)
        .with("lead", "u0")
        .with("target", Value::Null);
    let doc = Document::default().with_data(Section::with_rows(&PROJECTS, vec![row]));

    let dangling = check_references(&doc, &registry);
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].field, "key");
    assert_eq!(dangling[0].key, "pr7");
}

#[test]
fn failed_batch_items_become_failure_rows() {
    let registry = registry();
    let outcomes = registry.resolve_batch(EntityKind::User, &["u0", "u9", "nobody"]);
    let doc = Document::default().with_data(failure_section(&outcomes));

    let expected = "\
failures[2]{index,kind,key,error,suggestions}:
  1,user,u9,unknown key,u1 u0
  2,user,nobody,unknown key,u0 u1";
    assert_eq!(encode(&doc).expect("encode"), expected);
}
