use crate::calc;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{session_user, student_row_json};
use crate::ipc::types::{AppState, Request};
use crate::model::{LeaveStatus, Role};
use serde_json::json;

const SCHEDULE_PREVIEW: usize = 4;
const ANNOUNCEMENT_PREVIEW: usize = 3;

fn dashboard_summary(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let user = session_user(state)?;
    let store = &state.store;
    let average_attendance = calc::mean_attendance_percentage(store.students(), store.attendance());
    let for_role = calc::notifications_for_role(store.notifications(), user.role);

    let body = match user.role {
        Role::Admin => json!({
            "role": user.role,
            "totalStudents": store.students().len(),
            "totalStaff": store.staff_profiles().len(),
            "averageAttendance": average_attendance,
            "averageGrade": calc::mean_average_grade(store.students(), store.exam_results()),
            // Admins see the school-wide unread count, not only their own feed.
            "unreadNotifications": calc::unread_count(store.notifications()),
            "pendingLeaves": store
                .leave_requests()
                .iter()
                .filter(|l| l.status == LeaveStatus::Pending)
                .count(),
        }),
        Role::Staff => {
            let schedule: Vec<_> = store
                .staff_profile(&user.id)
                .map(|p| p.schedule.iter().take(SCHEDULE_PREVIEW).collect())
                .unwrap_or_default();
            json!({
                "role": user.role,
                "totalStudents": store.students().len(),
                "averageAttendance": average_attendance,
                "unreadNotifications": calc::unread_count(for_role.iter().copied()),
                "schedule": schedule,
                "leave": calc::leave_counts(store.leave_requests(), Some(user.id.as_str())),
            })
        }
        Role::Parent => {
            let children: Vec<serde_json::Value> =
                calc::children_of(store.users(), store.students(), &user.id)
                    .into_iter()
                    .map(|s| student_row_json(store, s))
                    .collect();
            let announcements: Vec<_> = for_role.iter().take(ANNOUNCEMENT_PREVIEW).collect();
            json!({
                "role": user.role,
                "children": children,
                "unreadNotifications": calc::unread_count(for_role.iter().copied()),
                "announcements": announcements,
            })
        }
    };
    Ok(body)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "dashboard.summary" => dashboard_summary(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
