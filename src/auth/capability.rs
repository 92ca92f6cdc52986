use strum_macros::{AsRefStr, EnumIter};

use crate::model::role::Role;

/// Everything a caller can be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    ViewOwnRequests,
    CreateOwnRequests,
    CancelOwnRequests,
    ViewTeamRequests,
    ApproveTeamRequests,
    RejectTeamRequests,
    ViewTeamEmployees,
    ViewOwnBalances,
    ManageEmployees,
    ManageDepartments,
    ManageLeaveTypes,
    ManageBalances,
    ViewAuditLogs,
    SystemConfig,
}

impl Role {
    /// Static (role, capability) table.
    pub fn can(self, capability: Capability) -> bool {
        use Capability::*;

        match self {
            Role::Admin => true,
            Role::Hr => !matches!(capability, SystemConfig),
            Role::Manager => matches!(
                capability,
                ViewOwnRequests
                    | CreateOwnRequests
                    | CancelOwnRequests
                    | ViewTeamRequests
                    | ApproveTeamRequests
                    | RejectTeamRequests
                    | ViewTeamEmployees
                    | ViewOwnBalances
            ),
            Role::Employee => matches!(
                capability,
                ViewOwnRequests | CreateOwnRequests | CancelOwnRequests | ViewOwnBalances
            ),
        }
    }

    /// HR and admin act on every employee; others only on themselves or their reports.
    pub fn sees_everyone(self) -> bool {
        matches!(self, Role::Admin | Role::Hr)
    }
}
