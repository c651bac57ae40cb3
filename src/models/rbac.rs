// src/models/rbac.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use utoipa::ToSchema;

// ---
// 1. Permission (o catálogo fechado de capacidades)
// ---
// A chave de cada variante é a mesma string guardada na tabela `permissions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum Permission {
    #[serde(rename = "crear_dependencias")]
    CreateUnits,
    #[serde(rename = "ver_usuarios_global")]
    ViewAllUsers,
    #[serde(rename = "asignar_roles_global")]
    AssignRoles,
    #[serde(rename = "editar_dependencias")]
    EditUnits,
    #[serde(rename = "eliminar_dependencias")]
    DeleteUnits,
    #[serde(rename = "ver_presupuestos")]
    ViewBudgets,
    #[serde(rename = "asignar_presupuestos")]
    AssignBudgets,
    #[serde(rename = "ver_edificios")]
    ViewBuildings,
    #[serde(rename = "crear_edificios")]
    CreateBuildings,
    #[serde(rename = "editar_edificios")]
    EditBuildings,
    #[serde(rename = "eliminar_edificios")]
    DeleteBuildings,
    #[serde(rename = "cargar_consumos")]
    UploadConsumption,
    #[serde(rename = "ver_dashboard")]
    ViewDashboard,
}

impl Permission {
    pub const ALL: [Permission; 13] = [
        Permission::CreateUnits,
        Permission::ViewAllUsers,
        Permission::AssignRoles,
        Permission::EditUnits,
        Permission::DeleteUnits,
        Permission::ViewBudgets,
        Permission::AssignBudgets,
        Permission::ViewBuildings,
        Permission::CreateBuildings,
        Permission::EditBuildings,
        Permission::DeleteBuildings,
        Permission::UploadConsumption,
        Permission::ViewDashboard,
    ];

    /// A chave estável usada no armazenamento.
    pub const fn key(self) -> &'static str {
        match self {
            Permission::CreateUnits => "crear_dependencias",
            Permission::ViewAllUsers => "ver_usuarios_global",
            Permission::AssignRoles => "asignar_roles_global",
            Permission::EditUnits => "editar_dependencias",
            Permission::DeleteUnits => "eliminar_dependencias",
            Permission::ViewBudgets => "ver_presupuestos",
            Permission::AssignBudgets => "asignar_presupuestos",
            Permission::ViewBuildings => "ver_edificios",
            Permission::CreateBuildings => "crear_edificios",
            Permission::EditBuildings => "editar_edificios",
            Permission::DeleteBuildings => "eliminar_edificios",
            Permission::UploadConsumption => "cargar_consumos",
            Permission::ViewDashboard => "ver_dashboard",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPermission(pub String);

impl fmt::Display for UnknownPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "permissão desconhecida: '{}'", self.0)
    }
}

impl std::error::Error for UnknownPermission {}

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.key() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

// ---
// 2. Role (Cargo) e o registro de permissão como está no banco
// ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(example = 2)]
    pub id: i64,

    #[schema(example = "Admin Dependencia")]
    pub name: String,

    #[schema(example = "Controle total de uma dependência específica.")]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRecord {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = "crear_dependencias")]
    pub name: String,

    #[schema(example = "Criar dependências (alcance global)")]
    pub description: String,
}

// Cargo + chaves das permissões
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    #[serde(flatten)]
    pub role: Role,

    #[schema(example = json!(["ver_dashboard", "ver_edificios"]))]
    pub permissions: Vec<String>,
}

// ---
// 3. Assignment (a tripla usuário-dependência-cargo)
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub user_id: i64,
    pub unit_id: i64,
    pub role_id: i64,
}

// Um par (cargo, dependência) desejado para um usuário
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentInput {
    #[schema(example = 2)]
    pub role_id: i64,

    #[schema(example = 7)]
    pub unit_id: i64,
}

// Atribuição com os nomes resolvidos (para /me e listagens)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDetail {
    pub unit_id: i64,
    #[schema(example = "Secretaría de Salud de Quintana Roo")]
    pub unit_name: String,
    pub role_id: i64,
    #[schema(example = "Lector")]
    pub role_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceAssignmentsPayload {
    pub assignments: Vec<AssignmentInput>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_permission_round_trips_through_its_key() {
        for permission in Permission::ALL {
            assert_eq!(permission.key().parse::<Permission>(), Ok(permission));
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = "crear_dependencia".parse::<Permission>().unwrap_err();
        assert_eq!(err, UnknownPermission("crear_dependencia".into()));
    }

    #[test]
    fn serde_uses_storage_keys() {
        let json = serde_json::to_string(&Permission::UploadConsumption).unwrap();
        assert_eq!(json, "\"cargar_consumos\"");
    }
}
