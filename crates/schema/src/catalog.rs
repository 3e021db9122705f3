use crate::field::{Field, Schema};
use crate::format::{cycle_tag, date_only, percent, priority_label};
use crate::kind::EntityKind;

pub const USERS_LOOKUP: Schema = Schema {
    name: "_users",
    fields: &[
        Field::key("key", EntityKind::User),
        Field::plain("name"),
        Field::plain("displayName"),
        Field::plain("email"),
        Field::plain("role"),
    ],
};

pub const STATES_LOOKUP: Schema = Schema {
    name: "_states",
    fields: &[
        Field::key("key", EntityKind::State),
        Field::plain("name"),
        Field::plain("type"),
    ],
};

pub const PROJECTS_LOOKUP: Schema = Schema {
    name: "_projects",
    fields: &[
        Field::key("key", EntityKind::Project),
        Field::plain("name"),
        Field::plain("state"),
        Field::reference("lead", EntityKind::User),
    ],
};

pub const TEAMS_LOOKUP: Schema = Schema {
    name: "_teams",
    fields: &[
        Field::key("key", EntityKind::Team),
        Field::plain("teamKey"),
        Field::plain("name"),
    ],
};

pub const ISSUES: Schema = Schema {
    name: "issues",
    fields: &[
        Field::plain("identifier"),
        Field::plain("title"),
        Field::reference("state", EntityKind::State),
        Field::formatted("priority", priority_label),
        Field::reference("assignee", EntityKind::User),
        Field::plain("estimate"),
        Field::formatted("cycle", cycle_tag),
        Field::reference("project", EntityKind::Project),
        Field::plain("labels"),
        Field::formatted("due", date_only),
    ],
};

pub const COMMENTS: Schema = Schema {
    name: "comments",
    fields: &[
        Field::plain("issue"),
        Field::reference("author", EntityKind::User),
        Field::formatted("created", date_only),
        Field::plain("body"),
    ],
};

pub const PROJECTS: Schema = Schema {
    name: "projects",
    fields: &[
        Field::reference("key", EntityKind::Project),
        Field::plain("name"),
        Field::plain("state"),
        Field::formatted("progress", percent),
        Field::reference("lead", EntityKind::User),
        Field::formatted("target", date_only),
    ],
};

pub const CYCLES: Schema = Schema {
    name: "cycles",
    fields: &[
        Field::formatted("num", cycle_tag),
        Field::plain("name"),
        Field::formatted("start", date_only),
        Field::formatted("end", date_only),
        Field::formatted("progress", percent),
    ],
};

/// Per-item outcome of a batch write.
pub const WRITE_RESULTS: Schema = Schema {
    name: "results",
    fields: &[
        Field::plain("index"),
        Field::plain("status"),
        Field::plain("identifier"),
        Field::plain("error"),
    ],
};

/// Per-item resolution failures, so batch writes can partially succeed.
pub const FAILURES: Schema = Schema {
    name: "failures",
    fields: &[
        Field::plain("index"),
        Field::plain("kind"),
        Field::plain("key"),
        Field::plain("error"),
        Field::plain("suggestions"),
    ],
};

static ALL: [&Schema; 10] = [
    &USERS_LOOKUP,
    &STATES_LOOKUP,
    &PROJECTS_LOOKUP,
    &TEAMS_LOOKUP,
    &ISSUES,
    &COMMENTS,
    &PROJECTS,
    &CYCLES,
    &WRITE_RESULTS,
    &FAILURES,
];

#[must_use]
pub fn all_schemas() -> &'static [&'static Schema] {
    &ALL
}

#[must_use]
pub fn schema_by_name(name: &str) -> Option<&'static Schema> {
    ALL.iter().copied().find(|schema| schema.name == name)
}
