use std::fmt::{Display, Formatter};
use std::str::FromStr;

use cantoria_core::AppError;
use serde::{Deserialize, Serialize};

/// Ministry position held by a member. The set is closed and never extended at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Candidate preparing to join the orchestra.
    #[serde(rename = "candidato")]
    Candidate,
    /// Approved musician.
    #[serde(rename = "musico")]
    Musician,
    /// Music instructor.
    #[serde(rename = "instrutor")]
    Instructor,
    /// Local orchestra supervisor.
    #[serde(rename = "encarregado_local")]
    LocalSupervisor,
    /// Regional orchestra supervisor.
    #[serde(rename = "encarregado_regional")]
    RegionalSupervisor,
    /// Examiner responsible for musician evaluations.
    #[serde(rename = "examinadora")]
    Examiner,
    /// Youth and minors coordinator.
    #[serde(rename = "cooperador_jovens")]
    YouthCoordinator,
    /// Ministerial office coordinator.
    #[serde(rename = "cooperador_oficio")]
    OfficeCoordinator,
    /// Elder.
    #[serde(rename = "anciao")]
    Elder,
    /// Deacon.
    #[serde(rename = "diacono")]
    Deacon,
    /// Application administrator.
    #[serde(rename = "administrador")]
    Administrator,
}

impl Role {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Candidate => "candidato",
            Self::Musician => "musico",
            Self::Instructor => "instrutor",
            Self::LocalSupervisor => "encarregado_local",
            Self::RegionalSupervisor => "encarregado_regional",
            Self::Examiner => "examinadora",
            Self::YouthCoordinator => "cooperador_jovens",
            Self::OfficeCoordinator => "cooperador_oficio",
            Self::Elder => "anciao",
            Self::Deacon => "diacono",
            Self::Administrator => "administrador",
        }
    }

    /// Returns the label shown to operators.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Candidate => "Candidato",
            Self::Musician => "Músico",
            Self::Instructor => "Instrutor",
            Self::LocalSupervisor => "Encarregado Local",
            Self::RegionalSupervisor => "Encarregado Regional",
            Self::Examiner => "Examinadora",
            Self::YouthCoordinator => "Cooperador de Jovens e Menores",
            Self::OfficeCoordinator => "Cooperador do Ofício Ministerial",
            Self::Elder => "Ancião",
            Self::Deacon => "Diácono",
            Self::Administrator => "Administrador",
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Role] = &[
            Role::Candidate,
            Role::Musician,
            Role::Instructor,
            Role::LocalSupervisor,
            Role::RegionalSupervisor,
            Role::Examiner,
            Role::YouthCoordinator,
            Role::OfficeCoordinator,
            Role::Elder,
            Role::Deacon,
            Role::Administrator,
        ];

        ALL
    }

    /// Role applied to members without any role assignment.
    #[must_use]
    pub fn lowest_privilege() -> Self {
        Self::Candidate
    }

    /// Parses a transport value into a role.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|role| role.as_str() == value)
            .copied()
            .ok_or_else(|| AppError::Validation(format!("unknown role value '{value}'")))
    }
}

impl Display for Role {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::Role;

    #[test]
    fn registry_has_eleven_distinct_roles() {
        let mut tags: Vec<&str> = Role::all().iter().map(Role::as_str).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), 11);
    }

    #[test]
    fn every_role_parses_back_from_its_storage_value() {
        for role in Role::all() {
            assert_eq!(Role::from_str(role.as_str()).ok(), Some(*role));
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(Role::from_str("maestro").is_err());
        assert!(Role::from_str("Administrador").is_err());
    }

    #[test]
    fn display_matches_storage_value() {
        assert_eq!(Role::LocalSupervisor.to_string(), "encarregado_local");
    }

    #[test]
    fn candidate_is_lowest_privilege() {
        assert_eq!(Role::lowest_privilege(), Role::Candidate);
    }
}
