use std::fmt;

/// Machine-readable error codes surfaced through GraphQL `extensions.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    TeamNotFound,
    ProjectNotFound,
    TodoNotFound,
    LabelNotFound,
    ReferenceNotFound,
    DuplicateName,
    DuplicateReference,
    InvalidInput,
    NotATeamMember,
    TeamHasProjects,
    ActorRequired,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::TeamNotFound => "E2001",
            Self::ProjectNotFound => "E2002",
            Self::TodoNotFound => "E2003",
            Self::LabelNotFound => "E2004",
            Self::ReferenceNotFound => "E2005",
            Self::DuplicateName => "E3001",
            Self::DuplicateReference => "E3002",
            Self::InvalidInput => "E4001",
            Self::NotATeamMember => "E4002",
            Self::TeamHasProjects => "E4003",
            Self::ActorRequired => "E4004",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and API consumers.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::TeamNotFound => "Team not found",
            Self::ProjectNotFound => "Project not found",
            Self::TodoNotFound => "To-do not found",
            Self::LabelNotFound => "Label not found",
            Self::ReferenceNotFound => "Reference not found",
            Self::DuplicateName => "Name already taken",
            Self::DuplicateReference => "Reference already attached",
            Self::InvalidInput => "Invalid input",
            Self::NotATeamMember => "Not a team member",
            Self::TeamHasProjects => "Team still owns projects",
            Self::ActorRequired => "Actor identity required",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to API clients.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::TeamNotFound
            | Self::ProjectNotFound
            | Self::TodoNotFound
            | Self::LabelNotFound
            | Self::ReferenceNotFound => None,
            Self::DuplicateName => Some("Pick a different name or update the existing record."),
            Self::DuplicateReference => Some("The URL is already linked to this to-do."),
            Self::InvalidInput => None,
            Self::NotATeamMember => Some("Add the user to the owning team first."),
            Self::TeamHasProjects => Some("Delete or move the team's projects first."),
            Self::ActorRequired => Some("Send the x-dodo-actor header or set server.default_actor."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Entity kinds named in lookup and uniqueness errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Team,
    Project,
    Todo,
    Label,
    Reference,
}

impl Entity {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Project => "project",
            Self::Todo => "to-do",
            Self::Label => "label",
            Self::Reference => "reference",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the service layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },

    #[error("{entity} '{name}' already exists")]
    Duplicate { entity: Entity, name: String },

    #[error("invalid {field} '{value}': {reason}")]
    Validation {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("'{member}' is not a member of team {team_id}")]
    NotATeamMember { team_id: i64, member: String },

    #[error("team {team_id} still owns {projects} project(s)")]
    TeamHasProjects { team_id: i64, projects: usize },

    #[error("an actor identity is required for this operation")]
    MissingActor,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl Error {
    pub(crate) fn validation(
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Validation {
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub(crate) const fn not_found(entity: Entity, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// The stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { entity, .. } => match entity {
                Entity::Team => ErrorCode::TeamNotFound,
                Entity::Project => ErrorCode::ProjectNotFound,
                Entity::Todo => ErrorCode::TodoNotFound,
                Entity::Label => ErrorCode::LabelNotFound,
                Entity::Reference => ErrorCode::ReferenceNotFound,
            },
            Self::Duplicate { entity, .. } => match entity {
                Entity::Reference => ErrorCode::DuplicateReference,
                _ => ErrorCode::DuplicateName,
            },
            Self::Validation { .. } => ErrorCode::InvalidInput,
            Self::NotATeamMember { .. } => ErrorCode::NotATeamMember,
            Self::TeamHasProjects { .. } => ErrorCode::TeamHasProjects,
            Self::MissingActor => ErrorCode::ActorRequired,
            Self::Storage(_) => ErrorCode::InternalUnexpected,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
