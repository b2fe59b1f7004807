use super::ViewDefinition;
use crate::collections::{
    APPLICATIONS, DOMAINS, ORGANIZATIONS, ORGANIZATIONS_AUDITORS, ORGANIZATIONS_BILLING_MANAGERS,
    ORGANIZATIONS_MANAGERS, ORGANIZATIONS_USERS, ROUTES, SPACES, SPACES_AUDITORS, SPACES_DEVELOPERS,
    SPACES_MANAGERS, USERS_CC, USERS_UAA,
};
use crate::projection::{Column, JoinSpec, Lookup};
use once_cell::sync::Lazy;

pub const ORGANIZATION_ROLES_VIEW: &str = "organization_roles";
pub const SPACE_ROLES_VIEW: &str = "space_roles";
pub const SPACES_VIEW: &str = "spaces";
pub const ROUTES_VIEW: &str = "routes";
pub const APPLICATIONS_VIEW: &str = "applications";

static VIEWS: Lazy<Vec<ViewDefinition>> = Lazy::new(|| {
    vec![
        organization_roles(),
        space_roles(),
        spaces(),
        routes(),
        applications(),
    ]
});

pub fn all() -> &'static [ViewDefinition] {
    &VIEWS
}

pub fn find(name: &str) -> Option<&'static ViewDefinition> {
    VIEWS.iter().find(|view| view.name == name)
}

fn organization_role(label: &str, collection: &str) -> JoinSpec {
    JoinSpec::new(label, collection, "role")
        .lookup(Lookup::new("organization", ORGANIZATIONS, "role", "organization_id"))
        .lookup(Lookup::new("user_cc", USERS_CC, "role", "user_id"))
        .lookup(Lookup::new("user_uaa", USERS_UAA, "user_cc", "guid"))
        .column(Column::field("organization", "name"))
        .column(Column::field("organization", "guid"))
        .column(Column::field("user_uaa", "username"))
        .column(Column::field("user_uaa", "id"))
        .column(Column::Label)
}

fn organization_roles() -> ViewDefinition {
    ViewDefinition::new(
        ORGANIZATION_ROLES_VIEW,
        &[
            ORGANIZATIONS,
            ORGANIZATIONS_AUDITORS,
            ORGANIZATIONS_BILLING_MANAGERS,
            ORGANIZATIONS_MANAGERS,
            ORGANIZATIONS_USERS,
            USERS_CC,
            USERS_UAA,
        ],
    )
    .join(organization_role("Auditor", ORGANIZATIONS_AUDITORS))
    .join(organization_role("Billing Manager", ORGANIZATIONS_BILLING_MANAGERS))
    .join(organization_role("Manager", ORGANIZATIONS_MANAGERS))
    .join(organization_role("User", ORGANIZATIONS_USERS))
    .sortable(0..=4)
    .searchable(0..=4)
}

fn space_role(label: &str, collection: &str) -> JoinSpec {
    JoinSpec::new(label, collection, "role")
        .lookup(Lookup::new("space", SPACES, "role", "space_id"))
        .lookup(Lookup::new("organization", ORGANIZATIONS, "space", "organization_id"))
        .lookup(Lookup::new("user_cc", USERS_CC, "role", "user_id"))
        .lookup(Lookup::new("user_uaa", USERS_UAA, "user_cc", "guid"))
        .column(Column::field("space", "name"))
        .column(Column::field("space", "guid"))
        .column(Column::field("organization", "name"))
        .column(Column::field("user_uaa", "username"))
        .column(Column::field("user_uaa", "id"))
        .column(Column::Label)
}

fn space_roles() -> ViewDefinition {
    ViewDefinition::new(
        SPACE_ROLES_VIEW,
        &[
            ORGANIZATIONS,
            SPACES,
            SPACES_AUDITORS,
            SPACES_DEVELOPERS,
            SPACES_MANAGERS,
            USERS_CC,
            USERS_UAA,
        ],
    )
    .join(space_role("Auditor", SPACES_AUDITORS))
    .join(space_role("Developer", SPACES_DEVELOPERS))
    .join(space_role("Manager", SPACES_MANAGERS))
    .sortable(0..=5)
    .searchable(0..=5)
}

fn spaces() -> ViewDefinition {
    ViewDefinition::new(SPACES_VIEW, &[ORGANIZATIONS, SPACES])
        .join(
            JoinSpec::new("Space", SPACES, "space")
                .lookup(Lookup::new("organization", ORGANIZATIONS, "space", "organization_id"))
                .column(Column::field("space", "name"))
                .column(Column::field("space", "guid"))
                .column(Column::field("organization", "name"))
                .column(Column::field("space", "created_at")),
        )
        .sortable(0..=3)
        .searchable(0..=2)
}

fn routes() -> ViewDefinition {
    ViewDefinition::new(ROUTES_VIEW, &[DOMAINS, ORGANIZATIONS, ROUTES, SPACES])
        .join(
            JoinSpec::new("Route", ROUTES, "route")
                .lookup(Lookup::new("domain", DOMAINS, "route", "domain_id"))
                .lookup(Lookup::new("space", SPACES, "route", "space_id"))
                .lookup(Lookup::new("organization", ORGANIZATIONS, "space", "organization_id"))
                .column(Column::field("route", "host"))
                .column(Column::field("domain", "name"))
                .column(Column::field("route", "created_at"))
                .column(Column::field("organization", "name"))
                .column(Column::field("space", "name")),
        )
        .sortable(0..=4)
        .searchable([0, 1, 3, 4])
}

fn applications() -> ViewDefinition {
    ViewDefinition::new(APPLICATIONS_VIEW, &[APPLICATIONS, ORGANIZATIONS, SPACES])
        .join(
            JoinSpec::new("Application", APPLICATIONS, "application")
                .lookup(Lookup::new("space", SPACES, "application", "space_id"))
                .lookup(Lookup::new("organization", ORGANIZATIONS, "space", "organization_id"))
                .column(Column::field("application", "name"))
                .column(Column::field("application", "guid"))
                .column(Column::field("application", "state"))
                .column(Column::field("application", "instances"))
                .column(Column::field("application", "memory"))
                .column(Column::field("organization", "name"))
                .column(Column::field("space", "name")),
        )
        .sortable(0..=6)
        .searchable([0, 1, 2, 5, 6])
}
