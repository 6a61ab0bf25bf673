//! Static authorization tables.
//!
//! Both tables are hand-authored per role. There is no hierarchy between
//! roles: an administrator holding a grant says nothing about any other role.

use std::str::FromStr;

use cantoria_core::AppError;
use serde::{Deserialize, Serialize};

use crate::Role;

/// Fine-grained capabilities checked before an action is offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows opening the dashboard.
    ViewDashboard,
    /// Allows listing members.
    ViewUsers,
    /// Allows registering members.
    CreateUsers,
    /// Allows editing member records.
    EditUsers,
    /// Allows removing members.
    DeleteUsers,
    /// Allows full member administration.
    ManageUsers,
    /// Allows assigning roles to members.
    ManageRoles,
    /// Allows listing events.
    ViewEvents,
    /// Allows scheduling events.
    CreateEvents,
    /// Allows editing events.
    EditEvents,
    /// Allows cancelling events.
    DeleteEvents,
    /// Allows full event administration.
    ManageEvents,
    /// Allows reading attendance sheets.
    ViewAttendances,
    /// Allows recording attendance.
    RegisterAttendance,
    /// Allows reading one's own attendance history.
    ViewOwnAttendance,
    /// Allows full attendance administration.
    ManageAttendances,
    /// Allows listing teams.
    ViewTeams,
    /// Allows forming teams.
    CreateTeams,
    /// Allows editing teams.
    EditTeams,
    /// Allows full team administration.
    ManageTeams,
    /// Allows listing questionnaires.
    ViewQuestionnaires,
    /// Allows submitting questionnaire answers.
    AnswerQuestionnaires,
    /// Allows authoring questionnaires.
    CreateQuestionnaires,
    /// Allows editing questionnaires.
    EditQuestionnaires,
    /// Allows grading submitted answers.
    GradeQuestionnaires,
    /// Allows reading questionnaire results.
    ViewQuestionnaireResults,
    /// Allows full questionnaire administration.
    ManageQuestionnaires,
    /// Allows reading the ranking summary.
    ViewRanking,
    /// Allows reading per-criterion ranking scores.
    ViewDetailedRanking,
    /// Allows adjusting ranking criteria.
    ManageRanking,
    /// Allows reading reports.
    ViewReports,
    /// Allows generating reports.
    GenerateReports,
    /// Allows exporting reports.
    ExportReports,
    /// Allows reading data across the region.
    ViewRegionalData,
    /// Allows reading data of the local congregation.
    ViewLocalData,
    /// Allows approving candidates as musicians.
    ApproveCandidates,
    /// Allows evaluating musicians.
    EvaluateMusicians,
    /// Allows scheduling exams.
    ScheduleExams,
    /// Allows managing youth activities.
    ManageYouthActivities,
    /// Allows reading ministry reports.
    ViewMinistryReports,
    /// Allows editing one's own profile.
    ManageOwnProfile,
    /// Allows changing application settings.
    ManageSettings,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewDashboard => "view_dashboard",
            Self::ViewUsers => "view_users",
            Self::CreateUsers => "create_users",
            Self::EditUsers => "edit_users",
            Self::DeleteUsers => "delete_users",
            Self::ManageUsers => "manage_users",
            Self::ManageRoles => "manage_roles",
            Self::ViewEvents => "view_events",
            Self::CreateEvents => "create_events",
            Self::EditEvents => "edit_events",
            Self::DeleteEvents => "delete_events",
            Self::ManageEvents => "manage_events",
            Self::ViewAttendances => "view_attendances",
            Self::RegisterAttendance => "register_attendance",
            Self::ViewOwnAttendance => "view_own_attendance",
            Self::ManageAttendances => "manage_attendances",
            Self::ViewTeams => "view_teams",
            Self::CreateTeams => "create_teams",
            Self::EditTeams => "edit_teams",
            Self::ManageTeams => "manage_teams",
            Self::ViewQuestionnaires => "view_questionnaires",
            Self::AnswerQuestionnaires => "answer_questionnaires",
            Self::CreateQuestionnaires => "create_questionnaires",
            Self::EditQuestionnaires => "edit_questionnaires",
            Self::GradeQuestionnaires => "grade_questionnaires",
            Self::ViewQuestionnaireResults => "view_questionnaire_results",
            Self::ManageQuestionnaires => "manage_questionnaires",
            Self::ViewRanking => "view_ranking",
            Self::ViewDetailedRanking => "view_detailed_ranking",
            Self::ManageRanking => "manage_ranking",
            Self::ViewReports => "view_reports",
            Self::GenerateReports => "generate_reports",
            Self::ExportReports => "export_reports",
            Self::ViewRegionalData => "view_regional_data",
            Self::ViewLocalData => "view_local_data",
            Self::ApproveCandidates => "approve_candidates",
            Self::EvaluateMusicians => "evaluate_musicians",
            Self::ScheduleExams => "schedule_exams",
            Self::ManageYouthActivities => "manage_youth_activities",
            Self::ViewMinistryReports => "view_ministry_reports",
            Self::ManageOwnProfile => "manage_own_profile",
            Self::ManageSettings => "manage_settings",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        use Permission as P;
        const ALL: &[Permission] = &[
            P::ViewDashboard,
            P::ViewUsers,
            P::CreateUsers,
            P::EditUsers,
            P::DeleteUsers,
            P::ManageUsers,
            P::ManageRoles,
            P::ViewEvents,
            P::CreateEvents,
            P::EditEvents,
            P::DeleteEvents,
            P::ManageEvents,
            P::ViewAttendances,
            P::RegisterAttendance,
            P::ViewOwnAttendance,
            P::ManageAttendances,
            P::ViewTeams,
            P::CreateTeams,
            P::EditTeams,
            P::ManageTeams,
            P::ViewQuestionnaires,
            P::AnswerQuestionnaires,
            P::CreateQuestionnaires,
            P::EditQuestionnaires,
            P::GradeQuestionnaires,
            P::ViewQuestionnaireResults,
            P::ManageQuestionnaires,
            P::ViewRanking,
            P::ViewDetailedRanking,
            P::ManageRanking,
            P::ViewReports,
            P::GenerateReports,
            P::ExportReports,
            P::ViewRegionalData,
            P::ViewLocalData,
            P::ApproveCandidates,
            P::EvaluateMusicians,
            P::ScheduleExams,
            P::ManageYouthActivities,
            P::ViewMinistryReports,
            P::ManageOwnProfile,
            P::ManageSettings,
        ];

        ALL
    }

    /// Parses a transport value into a permission.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|permission| permission.as_str() == value)
            .copied()
            .ok_or_else(|| AppError::Validation(format!("unknown permission value '{value}'")))
    }
}

/// Navigable application sections gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resource {
    /// Landing dashboard.
    #[serde(rename = "dashboard")]
    Dashboard,
    /// Member administration.
    #[serde(rename = "usuarios")]
    Users,
    /// Rehearsals, services and other events.
    #[serde(rename = "eventos")]
    Events,
    /// Attendance sheets.
    #[serde(rename = "presencas")]
    Attendances,
    /// Teams.
    #[serde(rename = "equipes")]
    Teams,
    /// Questionnaires and exams.
    #[serde(rename = "questionarios")]
    Questionnaires,
    /// Member ranking.
    #[serde(rename = "ranking")]
    Ranking,
    /// Reports.
    #[serde(rename = "relatorios")]
    Reports,
    /// Application settings.
    #[serde(rename = "configuracoes")]
    Settings,
}

impl Resource {
    /// Returns the stable section tag.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Users => "usuarios",
            Self::Events => "eventos",
            Self::Attendances => "presencas",
            Self::Teams => "equipes",
            Self::Questionnaires => "questionarios",
            Self::Ranking => "ranking",
            Self::Reports => "relatorios",
            Self::Settings => "configuracoes",
        }
    }

    /// Returns the English alias accepted on input.
    #[must_use]
    pub fn alias(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Users => "users",
            Self::Events => "events",
            Self::Attendances => "attendances",
            Self::Teams => "teams",
            Self::Questionnaires => "questionnaires",
            Self::Ranking => "ranking",
            Self::Reports => "reports",
            Self::Settings => "settings",
        }
    }

    /// Returns the navigation title of the section.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Users => "Usuários",
            Self::Events => "Eventos",
            Self::Attendances => "Presenças",
            Self::Teams => "Equipes",
            Self::Questionnaires => "Questionários",
            Self::Ranking => "Ranking",
            Self::Reports => "Relatórios",
            Self::Settings => "Configurações",
        }
    }

    /// Returns all sections in navigation order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Resource] = &[
            Resource::Dashboard,
            Resource::Users,
            Resource::Events,
            Resource::Attendances,
            Resource::Teams,
            Resource::Questionnaires,
            Resource::Ranking,
            Resource::Reports,
            Resource::Settings,
        ];

        ALL
    }

    /// Returns the roles allowed to open this section.
    #[must_use]
    pub fn allowed_roles(&self) -> &'static [Role] {
        use Role as R;
        match self {
            Self::Dashboard => &[
                R::Administrator,
                R::RegionalSupervisor,
                R::LocalSupervisor,
                R::Instructor,
                R::Examiner,
                R::Musician,
                R::Candidate,
                R::YouthCoordinator,
                R::OfficeCoordinator,
                R::Elder,
                R::Deacon,
            ],
            Self::Users => &[
                R::Administrator,
                R::RegionalSupervisor,
                R::LocalSupervisor,
                R::Elder,
            ],
            Self::Events => &[
                R::Administrator,
                R::LocalSupervisor,
                R::Instructor,
                R::Musician,
                R::Candidate,
            ],
            Self::Attendances => &[
                R::Administrator,
                R::RegionalSupervisor,
                R::LocalSupervisor,
                R::Instructor,
            ],
            Self::Teams => &[
                R::Administrator,
                R::RegionalSupervisor,
                R::LocalSupervisor,
                R::Instructor,
            ],
            Self::Questionnaires => &[
                R::Administrator,
                R::RegionalSupervisor,
                R::Examiner,
                R::Instructor,
                R::Musician,
                R::Candidate,
            ],
            Self::Ranking => &[
                R::Administrator,
                R::RegionalSupervisor,
                R::LocalSupervisor,
                R::Instructor,
                R::Musician,
                R::Candidate,
            ],
            Self::Reports => &[
                R::Administrator,
                R::RegionalSupervisor,
                R::LocalSupervisor,
                R::Elder,
                R::Deacon,
                R::OfficeCoordinator,
                R::YouthCoordinator,
            ],
            Self::Settings => &[R::Administrator],
        }
    }

    /// Returns whether the role is listed for this section.
    #[must_use]
    pub fn allows(&self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }

    /// Parses a transport value into a section. English aliases are accepted.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl FromStr for Resource {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|resource| resource.as_str() == value || resource.alias() == value)
            .copied()
            .ok_or_else(|| AppError::Validation(format!("unknown resource value '{value}'")))
    }
}

/// Returns the permissions granted to a role.
#[must_use]
pub fn role_permissions(role: Role) -> &'static [Permission] {
    use Permission as P;
    match role {
        Role::Candidate => &[
            P::ViewDashboard,
            P::ViewEvents,
            P::ViewOwnAttendance,
            P::ViewQuestionnaires,
            P::AnswerQuestionnaires,
            P::ViewRanking,
            P::ManageOwnProfile,
        ],
        Role::Musician => &[
            P::ViewDashboard,
            P::ViewEvents,
            P::ViewOwnAttendance,
            P::ViewQuestionnaires,
            P::AnswerQuestionnaires,
            P::ViewRanking,
            P::ViewDetailedRanking,
            P::ManageOwnProfile,
        ],
        Role::Instructor => &[
            P::ViewDashboard,
            P::ViewEvents,
            P::CreateEvents,
            P::EditEvents,
            P::ViewAttendances,
            P::RegisterAttendance,
            P::ViewTeams,
            P::CreateTeams,
            P::EditTeams,
            P::ViewQuestionnaires,
            P::CreateQuestionnaires,
            P::EditQuestionnaires,
            P::GradeQuestionnaires,
            P::ViewQuestionnaireResults,
            P::ViewRanking,
            P::ViewDetailedRanking,
            P::EvaluateMusicians,
            P::ViewLocalData,
            P::ManageOwnProfile,
        ],
        Role::LocalSupervisor => &[
            P::ViewDashboard,
            P::ViewUsers,
            P::CreateUsers,
            P::EditUsers,
            P::ViewEvents,
            P::CreateEvents,
            P::EditEvents,
            P::DeleteEvents,
            P::ManageEvents,
            P::ViewAttendances,
            P::RegisterAttendance,
            P::ManageAttendances,
            P::ViewTeams,
            P::CreateTeams,
            P::EditTeams,
            P::ManageTeams,
            P::ViewRanking,
            P::ViewDetailedRanking,
            P::ViewReports,
            P::GenerateReports,
            P::ViewLocalData,
            P::ApproveCandidates,
            P::EvaluateMusicians,
            P::ManageOwnProfile,
        ],
        Role::RegionalSupervisor => &[
            P::ViewDashboard,
            P::ViewUsers,
            P::CreateUsers,
            P::EditUsers,
            P::ViewAttendances,
            P::ManageAttendances,
            P::ViewTeams,
            P::ManageTeams,
            P::ViewQuestionnaires,
            P::ViewQuestionnaireResults,
            P::ViewRanking,
            P::ViewDetailedRanking,
            P::ManageRanking,
            P::ViewReports,
            P::GenerateReports,
            P::ExportReports,
            P::ViewRegionalData,
            P::ViewLocalData,
            P::ApproveCandidates,
            P::ScheduleExams,
            P::ManageOwnProfile,
        ],
        Role::Examiner => &[
            P::ViewDashboard,
            P::ViewQuestionnaires,
            P::CreateQuestionnaires,
            P::EditQuestionnaires,
            P::GradeQuestionnaires,
            P::ViewQuestionnaireResults,
            P::EvaluateMusicians,
            P::ScheduleExams,
            P::ManageOwnProfile,
        ],
        Role::YouthCoordinator => &[
            P::ViewDashboard,
            P::ViewReports,
            P::ManageYouthActivities,
            P::ViewLocalData,
            P::ManageOwnProfile,
        ],
        Role::OfficeCoordinator => &[
            P::ViewDashboard,
            P::ViewReports,
            P::ViewMinistryReports,
            P::ViewLocalData,
            P::ManageOwnProfile,
        ],
        Role::Elder => &[
            P::ViewDashboard,
            P::ViewUsers,
            P::ViewReports,
            P::ViewMinistryReports,
            P::ViewRegionalData,
            P::ViewLocalData,
            P::ManageOwnProfile,
        ],
        Role::Deacon => &[
            P::ViewDashboard,
            P::ViewReports,
            P::ViewMinistryReports,
            P::ViewLocalData,
            P::ManageOwnProfile,
        ],
        Role::Administrator => &[
            P::ViewDashboard,
            P::ViewUsers,
            P::CreateUsers,
            P::EditUsers,
            P::DeleteUsers,
            P::ManageUsers,
            P::ManageRoles,
            P::ViewEvents,
            P::CreateEvents,
            P::EditEvents,
            P::DeleteEvents,
            P::ManageEvents,
            P::ViewAttendances,
            P::RegisterAttendance,
            P::ManageAttendances,
            P::ViewTeams,
            P::CreateTeams,
            P::EditTeams,
            P::ManageTeams,
            P::ViewQuestionnaires,
            P::CreateQuestionnaires,
            P::EditQuestionnaires,
            P::GradeQuestionnaires,
            P::ViewQuestionnaireResults,
            P::ManageQuestionnaires,
            P::ViewRanking,
            P::ViewDetailedRanking,
            P::ManageRanking,
            P::ViewReports,
            P::GenerateReports,
            P::ExportReports,
            P::ViewRegionalData,
            P::ViewLocalData,
            P::ApproveCandidates,
            P::EvaluateMusicians,
            P::ScheduleExams,
            P::ManageYouthActivities,
            P::ViewMinistryReports,
            P::ManageOwnProfile,
            P::ManageSettings,
        ],
    }
}

/// Returns the permissions for a role storage value; unknown roles get none.
#[must_use]
pub fn permissions_for_role_tag(role: &str) -> &'static [Permission] {
    Role::from_str(role).map(role_permissions).unwrap_or(&[])
}

/// Returns the roles allowed for a section tag; unknown sections allow none.
#[must_use]
pub fn roles_for_resource_tag(resource: &str) -> &'static [Role] {
    Resource::from_str(resource)
        .map(|resource| resource.allowed_roles())
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::str::FromStr;

    use proptest::prelude::*;

    use super::{
        Permission, Resource, permissions_for_role_tag, role_permissions, roles_for_resource_tag,
    };
    use crate::Role;

    #[test]
    fn permission_roundtrip_storage_value() {
        for permission in Permission::all() {
            assert_eq!(
                Permission::from_str(permission.as_str()).ok(),
                Some(*permission)
            );
        }
    }

    #[test]
    fn unknown_permission_is_rejected() {
        assert!(Permission::from_str("manage_everything").is_err());
        assert!(Permission::from_str("MANAGE_USERS").is_err());
    }

    #[test]
    fn every_role_has_a_non_empty_permission_set() {
        for role in Role::all() {
            assert!(
                !role_permissions(*role).is_empty(),
                "role '{role}' has no permissions"
            );
        }
    }

    #[test]
    fn musician_sees_detailed_ranking_but_not_settings() {
        let permissions = role_permissions(Role::Musician);
        assert!(permissions.contains(&Permission::ViewDetailedRanking));
        assert!(!permissions.contains(&Permission::ManageSettings));
    }

    #[test]
    fn only_administrator_manages_settings() {
        let holders: Vec<Role> = Role::all()
            .iter()
            .copied()
            .filter(|role| role_permissions(*role).contains(&Permission::ManageSettings))
            .collect();
        assert_eq!(holders, vec![Role::Administrator]);
    }

    #[test]
    fn events_section_lists_exactly_five_roles() {
        let expected = BTreeSet::from([
            Role::Administrator,
            Role::LocalSupervisor,
            Role::Instructor,
            Role::Musician,
            Role::Candidate,
        ]);

        for role in Role::all() {
            assert_eq!(
                Resource::Events.allows(*role),
                expected.contains(role),
                "unexpected access for role '{role}'"
            );
        }
    }

    #[test]
    fn settings_section_is_administrator_only() {
        assert!(Resource::Settings.allows(Role::Administrator));
        for role in Role::all()
            .iter()
            .filter(|role| **role != Role::Administrator)
        {
            assert!(!Resource::Settings.allows(*role));
        }
    }

    #[test]
    fn administrator_access_does_not_imply_other_roles() {
        // Regional supervisors are senior to musicians yet cannot open events.
        assert!(Resource::Events.allows(Role::Administrator));
        assert!(Resource::Events.allows(Role::Musician));
        assert!(!Resource::Events.allows(Role::RegionalSupervisor));
    }

    #[test]
    fn dashboard_is_open_to_every_role() {
        for role in Role::all() {
            assert!(Resource::Dashboard.allows(*role));
        }
    }

    #[test]
    fn resource_parses_canonical_tags_and_english_aliases() {
        assert_eq!(Resource::from_str("eventos").ok(), Some(Resource::Events));
        assert_eq!(Resource::from_str("events").ok(), Some(Resource::Events));
        assert_eq!(
            Resource::from_str("settings").ok(),
            Some(Resource::Settings)
        );
        assert!(Resource::from_str("financeiro").is_err());
    }

    #[test]
    fn unknown_role_tag_yields_no_permissions() {
        assert!(permissions_for_role_tag("maestro").is_empty());
        assert_eq!(
            permissions_for_role_tag("musico"),
            role_permissions(Role::Musician)
        );
    }

    #[test]
    fn unknown_resource_tag_yields_no_roles() {
        assert!(roles_for_resource_tag("financeiro").is_empty());
    }

    #[test]
    fn permission_tables_hold_no_duplicates() {
        for role in Role::all() {
            let permissions = role_permissions(*role);
            let unique: BTreeSet<_> = permissions.iter().collect();
            assert_eq!(unique.len(), permissions.len(), "duplicate in '{role}'");
        }
    }

    proptest! {
        #[test]
        fn arbitrary_role_tags_never_panic(tag in ".{0,32}") {
            let permissions = permissions_for_role_tag(&tag);
            if Role::from_str(&tag).is_err() {
                prop_assert!(permissions.is_empty());
            }
        }

        #[test]
        fn arbitrary_permission_tags_resolve_to_a_bool_for_every_role(tag in "[a-z_]{0,32}") {
            let parsed = Permission::from_str(&tag).ok();
            for role in Role::all() {
                let granted = parsed
                    .map(|permission| role_permissions(*role).contains(&permission))
                    .unwrap_or(false);
                if parsed.is_none() {
                    prop_assert!(!granted);
                }
            }
        }

        #[test]
        fn arbitrary_resource_tags_never_panic(tag in ".{0,32}") {
            let roles = roles_for_resource_tag(&tag);
            if Resource::from_str(&tag).is_err() {
                prop_assert!(roles.is_empty());
            }
        }
    }
}
