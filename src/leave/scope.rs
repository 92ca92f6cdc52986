use crate::model::employee::Employee;
use crate::model::role::Role;

/// Which employees' records a caller may act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// HR and admin.
    Everyone,
    /// A manager: themselves and their direct reports.
    Team { manager_id: u64 },
    /// An employee: only themselves.
    Own { employee_id: u64 },
    /// A caller whose token is not linked to an employee record.
    Nobody,
}

impl Scope {
    pub fn for_caller(role: Role, employee_id: Option<u64>) -> Self {
        match (role, employee_id) {
            (Role::Admin | Role::Hr, _) => Scope::Everyone,
            (Role::Manager, Some(id)) => Scope::Team { manager_id: id },
            (Role::Employee, Some(id)) => Scope::Own { employee_id: id },
            (Role::Manager | Role::Employee, None) => Scope::Nobody,
        }
    }

    pub fn permits(&self, employee: &Employee) -> bool {
        match *self {
            Scope::Everyone => true,
            Scope::Team { manager_id } => {
                employee.id == manager_id || employee.manager_id == Some(manager_id)
            }
            Scope::Own { employee_id } => employee.id == employee_id,
            Scope::Nobody => false,
        }
    }

    /// Shortcut for checks that only know the employee id.
    pub fn is_self(&self, employee_id: u64) -> bool {
        match *self {
            Scope::Team { manager_id } => manager_id == employee_id,
            Scope::Own { employee_id: own } => own == employee_id,
            Scope::Everyone | Scope::Nobody => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn employee(id: u64, manager_id: Option<u64>) -> Employee {
        Employee {
            id,
            employee_id: format!("EMP-{id}"),
            name: "n".into(),
            email: format!("{id}@x.io"),
            department_id: 1,
            manager_id,
            joining_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            phone: None,
            is_active: true,
        }
    }

    #[test]
    fn test_scope_for_caller() {
        assert_eq!(Scope::for_caller(Role::Hr, None), Scope::Everyone);
        assert_eq!(Scope::for_caller(Role::Admin, Some(3)), Scope::Everyone);
        assert_eq!(
            Scope::for_caller(Role::Manager, Some(3)),
            Scope::Team { manager_id: 3 }
        );
        assert_eq!(
            Scope::for_caller(Role::Employee, Some(9)),
            Scope::Own { employee_id: 9 }
        );
        assert_eq!(Scope::for_caller(Role::Employee, None), Scope::Nobody);
    }

    #[test]
    fn test_team_scope_covers_manager_and_reports() {
        let scope = Scope::Team { manager_id: 3 };
        assert!(scope.permits(&employee(3, None)));
        assert!(scope.permits(&employee(5, Some(3))));
        assert!(!scope.permits(&employee(6, Some(4))));
    }

    #[test]
    fn test_own_scope() {
        let scope = Scope::Own { employee_id: 5 };
        assert!(scope.permits(&employee(5, Some(3))));
        assert!(!scope.permits(&employee(6, Some(5))));
        assert!(scope.is_self(5));
        assert!(!Scope::Everyone.is_self(5));
    }
}
