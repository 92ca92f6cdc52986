use crate::leave::calendar::DateRange;
use crate::model::leave_request::LeaveRequest;

/// In-memory counterpart of the overlap query in the MySQL store: true when a
/// pending or approved request of `employee_id`, other than `exclude`,
/// intersects `range`.
pub fn overlaps_any<'a>(
    existing: impl IntoIterator<Item = &'a LeaveRequest>,
    employee_id: u64,
    range: &DateRange,
    exclude: Option<u64>,
) -> bool {
    existing.into_iter().any(|request| {
        request.employee_id == employee_id
            && Some(request.id) != exclude
            && request.status.blocks_dates()
            && range.intersects(&request.range())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::status::LeaveStatus;
    use chrono::{NaiveDate, Utc};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, day).unwrap()
    }

    fn request(
        id: u64,
        employee_id: u64,
        start: u32,
        end: u32,
        status: LeaveStatus,
    ) -> LeaveRequest {
        LeaveRequest {
            id,
            employee_id,
            leave_type_id: 1,
            start_date: d(start),
            end_date: d(end),
            total_days: 1,
            reason: "r".into(),
            status,
            applied_at: Utc::now(),
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
        }
    }

    fn range(start: u32, end: u32) -> DateRange {
        DateRange::new(d(start), d(end)).unwrap()
    }

    #[test]
    fn test_pending_and_approved_requests_block() {
        let existing = [
            request(1, 7, 1, 5, LeaveStatus::Pending),
            request(2, 7, 12, 14, LeaveStatus::Approved),
        ];
        assert!(overlaps_any(&existing, 7, &range(3, 4), None));
        assert!(overlaps_any(&existing, 7, &range(14, 20), None));
        assert!(!overlaps_any(&existing, 7, &range(6, 11), None));
    }

    #[test]
    fn test_rejected_and_cancelled_requests_never_block() {
        let existing = [
            request(1, 7, 1, 5, LeaveStatus::Rejected),
            request(2, 7, 1, 5, LeaveStatus::Cancelled),
        ];
        assert!(!overlaps_any(&existing, 7, &range(1, 5), None));
    }

    #[test]
    fn test_other_employees_do_not_block() {
        let existing = [request(1, 8, 1, 5, LeaveStatus::Approved)];
        assert!(!overlaps_any(&existing, 7, &range(1, 5), None));
    }

    #[test]
    fn test_excluded_request_is_skipped() {
        let existing = [
            request(1, 7, 1, 5, LeaveStatus::Pending),
            request(2, 7, 20, 22, LeaveStatus::Pending),
        ];
        assert!(!overlaps_any(&existing, 7, &range(2, 3), Some(1)));
        assert!(overlaps_any(&existing, 7, &range(2, 21), Some(1)));
    }
}
