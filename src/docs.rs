use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

use crate::api::employee::EmployeeListResponse;
use crate::api::leave_balance::{BalanceSnapshot, BalanceView};
use crate::api::leave_request::{ApproveLeave, LeaveListResponse, RejectLeave};
use crate::leave::admission::{Admitted, LeaveApplication};
use crate::leave::balance::{BalanceAdjustment, LeaveBalance};
use crate::leave::entitlement::AdjustBalance;
use crate::leave::onboarding::Onboarded;
use crate::leave::status::LeaveStatus;
use crate::model::audit::{AuditAction, AuditLog};
use crate::model::department::{CreateDepartment, Department};
use crate::model::employee::{CreateEmployee, Employee, UpdateEmployee};
use crate::model::leave_request::LeaveRequest;
use crate::model::leave_type::{CreateLeaveType, LeaveType, UpdateLeaveType};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management API",
        version = "1.0.0",
        description = r#"
## Leave Management

REST backend for employee leave administration.

### Key Features
- **Leave Requests**
  - Apply for leave with balance and overlap checks, then approve, reject or cancel
- **Leave Balances**
  - Per employee, per leave type, per year ledger debited on approval
- **Employees & Departments**
  - Onboarding seeds opening balances for every active leave type
- **Audit Trail**
  - Every change is recorded with its before and after values

### Security
All `/api` endpoints require a **JWT Bearer** access token.
What a caller may do depends on the role in the token (admin, hr, manager, employee).

### Response Format
- JSON bodies; errors carry a stable `error` code and a human readable `message`
- Pagination supported for list endpoints
"#,
    ),
    paths(
        crate::api::leave_request::create_leave_request,
        crate::api::leave_request::list_leave_requests,
        crate::api::leave_request::get_leave_request,
        crate::api::leave_request::approve_leave_request,
        crate::api::leave_request::reject_leave_request,
        crate::api::leave_request::cancel_leave_request,

        crate::api::leave_balance::get_leave_balances,
        crate::api::leave_balance::update_leave_balance,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::deactivate_employee,

        crate::api::department::list_departments,
        crate::api::department::get_department,
        crate::api::department::create_department,

        crate::api::leave_type::list_leave_types,
        crate::api::leave_type::create_leave_type,
        crate::api::leave_type::update_leave_type,
        crate::api::leave_type::deactivate_leave_type,

        crate::api::audit::list_audit_logs
    ),
    components(
        schemas(
            LeaveApplication,
            Admitted,
            LeaveRequest,
            LeaveStatus,
            LeaveListResponse,
            ApproveLeave,
            RejectLeave,
            LeaveBalance,
            BalanceAdjustment,
            AdjustBalance,
            BalanceView,
            BalanceSnapshot,
            Employee,
            CreateEmployee,
            UpdateEmployee,
            EmployeeListResponse,
            Onboarded,
            Department,
            CreateDepartment,
            LeaveType,
            CreateLeaveType,
            UpdateLeaveType,
            AuditAction,
            AuditLog
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request APIs"),
        (name = "Leave Balance", description = "Leave balance ledger APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Department", description = "Department APIs"),
        (name = "Leave Type", description = "Leave type catalogue APIs"),
        (name = "Audit", description = "Audit trail APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
