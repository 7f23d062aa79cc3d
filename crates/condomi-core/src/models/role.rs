use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;

/// Application role. Síndico, porteiro and morador are scoped to the
/// condominiums a user belongs to; superadmin is global.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "app_role", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superadmin,
    Sindico,
    Porteiro,
    Morador,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Sindico => "sindico",
            Role::Porteiro => "porteiro",
            Role::Morador => "morador",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "superadmin" => Ok(Role::Superadmin),
            "sindico" | "síndico" => Ok(Role::Sindico),
            "porteiro" => Ok(Role::Porteiro),
            "morador" | "resident" => Ok(Role::Morador),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}
