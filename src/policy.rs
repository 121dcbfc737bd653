//! Ownership guard.
//!
//! Every handler that touches a resource calls [`authorize`] (or [`permit`]
//! for actions without a target) before reading or writing. The policy is a
//! fixed capability table keyed by [`Role`]; ownership is checked only for
//! resource-scoped actions, and staff/admin bypass it.

use crate::db::{Application, Internship, Project, UserRole};

/// Closed set of roles a request can act under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Anonymous,
    User,
    Staff,
    Admin,
}

impl From<UserRole> for Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::User => Role::User,
            UserRole::Staff => Role::Staff,
            UserRole::Admin => Role::Admin,
        }
    }
}

/// The identity a request acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    Anonymous,
    User { id: i64, role: UserRole },
}

impl Principal {
    pub fn role(&self) -> Role {
        match self {
            Principal::Anonymous => Role::Anonymous,
            Principal::User { role, .. } => Role::from(*role),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Principal::Anonymous => None,
            Principal::User { id, .. } => Some(*id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Register,
    SubmitProject,
    SubmitApplication,
    SubmitContact,
    BrowseCourses,
    ViewProfile,
    ValidateInternship,
    /// Read a single owned resource.
    ReadResource,
    /// Edit the owner-editable fields of an owned resource.
    UpdateResource,
    DeleteResource,
    /// List every submission and change project/internship status fields.
    ReviewSubmissions,
    ManageCourses,
    ManageInternships,
    ListUsers,
    /// Change roles, activation and intern linkage.
    ManageUsers,
}

const PUBLIC: &[Action] = &[
    Action::Register,
    Action::SubmitProject,
    Action::SubmitApplication,
    Action::SubmitContact,
    Action::BrowseCourses,
];

const AUTHENTICATED: &[Action] = &[
    Action::ViewProfile,
    Action::ValidateInternship,
    Action::ReadResource,
    Action::UpdateResource,
    Action::DeleteResource,
];

const STAFF: &[Action] = &[
    Action::ReviewSubmissions,
    Action::ManageCourses,
    Action::ManageInternships,
    Action::ListUsers,
];

const ADMIN: &[Action] = &[Action::ManageUsers];

/// Capability table. Each role holds the union of the listed action sets.
pub fn capabilities(role: Role) -> &'static [&'static [Action]] {
    match role {
        Role::Anonymous => &[PUBLIC],
        Role::User => &[PUBLIC, AUTHENTICATED],
        Role::Staff => &[PUBLIC, AUTHENTICATED, STAFF],
        Role::Admin => &[PUBLIC, AUTHENTICATED, STAFF, ADMIN],
    }
}

impl Role {
    pub fn allows(self, action: Action) -> bool {
        capabilities(self).iter().any(|set| set.contains(&action))
    }

    pub fn bypasses_ownership(self) -> bool {
        matches!(self, Role::Staff | Role::Admin)
    }
}

/// A resource subject to ownership checks.
pub trait Owned {
    /// `None` for anonymous submissions, which only staff may see.
    fn owner_id(&self) -> Option<i64>;
}

impl Owned for Project {
    fn owner_id(&self) -> Option<i64> {
        self.user_id
    }
}

impl Owned for Application {
    fn owner_id(&self) -> Option<i64> {
        self.user_id
    }
}

impl Owned for Internship {
    fn owner_id(&self) -> Option<i64> {
        Some(self.intern_id)
    }
}

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Denied {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("You do not have permission to perform this action")]
    Forbidden,
    #[error("Not found")]
    NotFound,
}

/// Check the capability table only.
pub fn permit(principal: &Principal, action: Action) -> Result<(), Denied> {
    let role = principal.role();
    if role.allows(action) {
        Ok(())
    } else if role == Role::Anonymous {
        Err(Denied::Unauthenticated)
    } else {
        Err(Denied::Forbidden)
    }
}

/// Check the capability table, then existence, then ownership.
///
/// `resource` is `None` when the lookup found nothing; that yields `NotFound`
/// for any principal allowed to attempt the action, so a missing id is never
/// reported as `Forbidden`.
pub fn authorize<R: Owned>(
    principal: &Principal,
    action: Action,
    resource: Option<&R>,
) -> Result<(), Denied> {
    permit(principal, action)?;

    let resource = resource.ok_or(Denied::NotFound)?;

    if principal.role().bypasses_ownership() {
        return Ok(());
    }

    match (principal.user_id(), resource.owner_id()) {
        (Some(user_id), Some(owner_id)) if user_id == owner_id => Ok(()),
        _ => Err(Denied::Forbidden),
    }
}
