/// Shared domain enumerations used across the codebase
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role carried in the `roles` JWT claim and stored on `users.role`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    OfficeManager,
    Responsible,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::OfficeManager, Role::Responsible];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::OfficeManager => "office_manager",
            Role::Responsible => "responsible",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == normalized)
            .ok_or_else(|| format!("invalid role '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Gender::ALL
            .into_iter()
            .find(|g| g.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "invalid gender '{}': valid values are {}",
                    s,
                    Gender::ALL.map(|g| g.as_str()).join(", ")
                )
            })
    }
}

/// How an adult responsible relates to a child (`responsible_of.relationship`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    Father,
    Mother,
    Grandfather,
    Grandmother,
    Guardian,
}

impl Relationship {
    pub const ALL: [Relationship; 5] = [
        Relationship::Father,
        Relationship::Mother,
        Relationship::Grandfather,
        Relationship::Grandmother,
        Relationship::Guardian,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Father => "father",
            Relationship::Mother => "mother",
            Relationship::Grandfather => "grandfather",
            Relationship::Grandmother => "grandmother",
            Relationship::Guardian => "guardian",
        }
    }

    /// "father, mother, grandfather, grandmother, guardian"
    pub fn valid_values() -> String {
        Relationship::ALL.map(|r| r.as_str()).join(", ")
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relationship {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Relationship::ALL
            .into_iter()
            .find(|r| r.as_str() == normalized)
            .ok_or_else(|| s.to_string())
    }
}
