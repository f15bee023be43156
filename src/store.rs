use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{
    initials, Attendance, AttendanceStatus, ExamResult, LeaveRequest, LeaveStatus,
    Notification, Role, StaffProfile, Student, User,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreError {
    pub code: &'static str,
    pub message: String,
}

impl StoreError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn not_found(what: &str, id: &str) -> Self {
        Self::new("not_found", format!("{} not found: {}", what, id))
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for StoreError {}

/// In-memory school data. Collections are shared between snapshots; every
/// update returns a new `Store` and copies only the collection it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    #[serde(default)]
    users: Arc<Vec<User>>,
    #[serde(default)]
    students: Arc<Vec<Student>>,
    #[serde(default)]
    attendance: Arc<Vec<Attendance>>,
    #[serde(default)]
    exam_results: Arc<Vec<ExamResult>>,
    #[serde(default)]
    notifications: Arc<Vec<Notification>>,
    #[serde(default)]
    staff_profiles: Arc<Vec<StaffProfile>>,
    #[serde(default)]
    leave_requests: Arc<Vec<LeaveRequest>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewStudent {
    pub name: String,
    pub roll_number: String,
    pub grade: String,
    pub parent_id: String,
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub roll_number: Option<String>,
    pub grade: Option<String>,
    pub parent_id: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewExamResult {
    pub student_id: String,
    pub subject: String,
    pub score: f64,
    pub max_score: f64,
    pub exam_date: NaiveDate,
    pub exam_type: String,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub target_roles: Vec<Role>,
}

fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

impl Store {
    pub fn from_parts(
        users: Vec<User>,
        students: Vec<Student>,
        attendance: Vec<Attendance>,
        exam_results: Vec<ExamResult>,
        notifications: Vec<Notification>,
        staff_profiles: Vec<StaffProfile>,
        leave_requests: Vec<LeaveRequest>,
    ) -> Self {
        Self {
            users: Arc::new(users),
            students: Arc::new(students),
            attendance: Arc::new(attendance),
            exam_results: Arc::new(exam_results),
            notifications: Arc::new(notifications),
            staff_profiles: Arc::new(staff_profiles),
            leave_requests: Arc::new(leave_requests),
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn attendance(&self) -> &[Attendance] {
        &self.attendance
    }

    pub fn exam_results(&self) -> &[ExamResult] {
        &self.exam_results
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn staff_profiles(&self) -> &[StaffProfile] {
        &self.staff_profiles
    }

    pub fn leave_requests(&self) -> &[LeaveRequest] {
        &self.leave_requests
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn student(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn staff_profile(&self, user_id: &str) -> Option<&StaffProfile> {
        self.staff_profiles.iter().find(|p| p.user_id == user_id)
    }

    pub fn authenticate(&self, email: &str, password: &str) -> Option<&User> {
        self.users
            .iter()
            .find(|u| u.email == email && u.password == password)
    }

    pub fn mark_attendance(
        &self,
        student_id: &str,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Store {
        let mut next = self.clone();
        let records = Arc::make_mut(&mut next.attendance);
        match records
            .iter_mut()
            .find(|a| a.student_id == student_id && a.date == date)
        {
            Some(existing) => existing.status = status,
            None => records.push(Attendance {
                student_id: student_id.to_string(),
                date,
                status,
            }),
        }
        next
    }

    pub fn add_student(&self, new: NewStudent) -> (Store, String) {
        let id = new_id("student");
        let avatar = initials(&new.name);
        let mut next = self.clone();
        Arc::make_mut(&mut next.students).push(Student {
            id: id.clone(),
            name: new.name,
            roll_number: new.roll_number,
            grade: new.grade,
            parent_id: new.parent_id,
            avatar: Some(avatar),
            date_of_birth: new.date_of_birth,
            email: new.email,
            phone: new.phone,
        });
        (next, id)
    }

    pub fn update_student(&self, id: &str, patch: StudentPatch) -> Result<Store, StoreError> {
        let idx = self
            .students
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| StoreError::not_found("student", id))?;

        let mut next = self.clone();
        let student = &mut Arc::make_mut(&mut next.students)[idx];
        if let Some(name) = patch.name {
            student.avatar = Some(initials(&name));
            student.name = name;
        }
        if let Some(v) = patch.roll_number {
            student.roll_number = v;
        }
        if let Some(v) = patch.grade {
            student.grade = v;
        }
        if let Some(v) = patch.parent_id {
            student.parent_id = v;
        }
        if let Some(v) = patch.date_of_birth {
            student.date_of_birth = Some(v);
        }
        if let Some(v) = patch.email {
            student.email = v;
        }
        if let Some(v) = patch.phone {
            student.phone = v;
        }
        Ok(next)
    }

    pub fn remove_student(&self, id: &str) -> Result<Store, StoreError> {
        if self.student(id).is_none() {
            return Err(StoreError::not_found("student", id));
        }
        let mut next = self.clone();
        Arc::make_mut(&mut next.students).retain(|s| s.id != id);
        Ok(next)
    }

    pub fn add_exam_result(&self, new: NewExamResult) -> (Store, String) {
        let id = new_id("exam");
        let mut next = self.clone();
        Arc::make_mut(&mut next.exam_results).push(ExamResult {
            id: id.clone(),
            student_id: new.student_id,
            subject: new.subject,
            score: new.score,
            max_score: new.max_score,
            exam_date: new.exam_date,
            exam_type: new.exam_type,
        });
        (next, id)
    }

    /// Newest notifications go first.
    pub fn create_notification(
        &self,
        new: NewNotification,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> (Store, String) {
        let id = new_id("notif");
        let mut next = self.clone();
        Arc::make_mut(&mut next.notifications).insert(
            0,
            Notification {
                id: id.clone(),
                title: new.title,
                message: new.message,
                target_roles: new.target_roles,
                created_at: now,
                created_by: created_by.to_string(),
                read: false,
            },
        );
        (next, id)
    }

    pub fn mark_notification_read(&self, id: &str) -> Result<Store, StoreError> {
        let idx = self
            .notifications
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| StoreError::not_found("notification", id))?;
        let mut next = self.clone();
        Arc::make_mut(&mut next.notifications)[idx].read = true;
        Ok(next)
    }

    pub fn mark_all_read(&self, role: Role) -> (Store, usize) {
        let changed = self
            .notifications
            .iter()
            .filter(|n| n.targets(role) && !n.read)
            .count();
        if changed == 0 {
            return (self.clone(), 0);
        }
        let mut next = self.clone();
        for n in Arc::make_mut(&mut next.notifications).iter_mut() {
            if n.targets(role) {
                n.read = true;
            }
        }
        (next, changed)
    }

    pub fn submit_leave(
        &self,
        staff_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: &str,
        now: DateTime<Utc>,
    ) -> (Store, String) {
        let id = new_id("leave");
        let mut next = self.clone();
        Arc::make_mut(&mut next.leave_requests).insert(
            0,
            LeaveRequest {
                id: id.clone(),
                staff_id: staff_id.to_string(),
                start_date,
                end_date,
                reason: reason.to_string(),
                status: LeaveStatus::Pending,
                created_at: now,
            },
        );
        (next, id)
    }

    pub fn decide_leave(&self, id: &str, decision: LeaveStatus) -> Result<Store, StoreError> {
        if decision == LeaveStatus::Pending {
            return Err(StoreError::new(
                "bad_params",
                "decision must be approved or rejected",
            ));
        }
        let idx = self
            .leave_requests
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| StoreError::not_found("leave request", id))?;
        if self.leave_requests[idx].status != LeaveStatus::Pending {
            return Err(StoreError::new(
                "invalid_state",
                format!("leave request {} was already decided", id),
            ));
        }
        let mut next = self.clone();
        Arc::make_mut(&mut next.leave_requests)[idx].status = decision;
        Ok(next)
    }
}
