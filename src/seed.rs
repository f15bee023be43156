use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};

use crate::model::{
    Attendance, AttendanceStatus, ExamResult, LeaveRequest, LeaveStatus, Notification, Role,
    ScheduleSlot, StaffProfile, Student, User,
};
use crate::store::Store;

const ATTENDANCE_WINDOW_DAYS: i64 = 30;

const STATUS_ROTATION: [AttendanceStatus; 6] = [
    AttendanceStatus::Present,
    AttendanceStatus::Present,
    AttendanceStatus::Present,
    AttendanceStatus::Present,
    AttendanceStatus::Absent,
    AttendanceStatus::Late,
];

pub fn empty() -> Store {
    Store::default()
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
        .single()
        .unwrap_or_default()
}

fn user(id: &str, email: &str, password: &str, name: &str, role: Role, avatar: &str) -> User {
    User {
        id: id.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        name: name.to_string(),
        role,
        avatar: Some(avatar.to_string()),
        child_ids: Vec::new(),
    }
}

fn demo_users() -> Vec<User> {
    let mut parent_1 = user(
        "parent-1",
        "parent1@gmail.com",
        "parent123",
        "Michael Brown",
        Role::Parent,
        "MB",
    );
    parent_1.child_ids = vec!["student-1".to_string(), "student-2".to_string()];
    let mut parent_2 = user(
        "parent-2",
        "parent2@gmail.com",
        "parent123",
        "Linda Martinez",
        Role::Parent,
        "LM",
    );
    parent_2.child_ids = vec!["student-3".to_string()];

    vec![
        user(
            "admin-1",
            "admin@teckish.edu",
            "admin123",
            "Dr. Sarah Johnson",
            Role::Admin,
            "SJ",
        ),
        user(
            "staff-1",
            "teacher1@teckish.edu",
            "staff123",
            "Mr. James Wilson",
            Role::Staff,
            "JW",
        ),
        user(
            "staff-2",
            "teacher2@teckish.edu",
            "staff123",
            "Ms. Emily Davis",
            Role::Staff,
            "ED",
        ),
        parent_1,
        parent_2,
    ]
}

fn demo_students() -> Vec<Student> {
    let rows: [(&str, &str, &str, &str, &str, &str, NaiveDate, &str, &str); 5] = [
        ("student-1", "Alex Brown", "TCK2024001", "10-A", "parent-1", "AB", ymd(2010, 5, 15), "alex.b@teckish.edu", "+1-555-0101"),
        ("student-2", "Sophie Brown", "TCK2024002", "8-B", "parent-1", "SB", ymd(2012, 8, 22), "sophie.b@teckish.edu", "+1-555-0102"),
        ("student-3", "Carlos Martinez", "TCK2024003", "10-A", "parent-2", "CM", ymd(2010, 3, 10), "carlos.m@teckish.edu", "+1-555-0103"),
        ("student-4", "Emma Thompson", "TCK2024004", "9-A", "parent-3", "ET", ymd(2011, 11, 28), "emma.t@teckish.edu", "+1-555-0104"),
        ("student-5", "Ryan Chen", "TCK2024005", "10-B", "parent-4", "RC", ymd(2010, 1, 5), "ryan.c@teckish.edu", "+1-555-0105"),
    ];
    rows.into_iter()
        .map(
            |(id, name, roll, grade, parent, avatar, dob, email, phone)| Student {
                id: id.to_string(),
                name: name.to_string(),
                roll_number: roll.to_string(),
                grade: grade.to_string(),
                parent_id: parent.to_string(),
                avatar: Some(avatar.to_string()),
                date_of_birth: Some(dob),
                email: email.to_string(),
                phone: phone.to_string(),
            },
        )
        .collect()
}

/// One record per student per weekday in the window ending at `today`.
fn demo_attendance(students: &[Student], today: NaiveDate) -> Vec<Attendance> {
    let mut out = Vec::new();
    for (si, s) in students.iter().enumerate() {
        for offset in 0..ATTENDANCE_WINDOW_DAYS {
            let date = today - Duration::days(offset);
            if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                continue;
            }
            let idx = (si * 5 + offset as usize) % STATUS_ROTATION.len();
            out.push(Attendance {
                student_id: s.id.clone(),
                date,
                status: STATUS_ROTATION[idx],
            });
        }
    }
    out
}

fn demo_exam_results() -> Vec<ExamResult> {
    let scores: [(&str, [(&str, f64); 4]); 5] = [
        ("student-1", [("Mathematics", 85.0), ("English", 78.0), ("Science", 92.0), ("History", 88.0)]),
        ("student-2", [("Mathematics", 72.0), ("English", 88.0), ("Science", 76.0), ("Art", 95.0)]),
        ("student-3", [("Mathematics", 90.0), ("English", 82.0), ("Science", 88.0), ("Spanish", 98.0)]),
        ("student-4", [("Mathematics", 78.0), ("English", 94.0), ("Science", 85.0), ("Music", 92.0)]),
        ("student-5", [("Mathematics", 96.0), ("English", 75.0), ("Science", 94.0), ("Computer Science", 99.0)]),
    ];
    let mut out = Vec::new();
    for (student_id, subjects) in scores {
        for (day, (subject, score)) in subjects.into_iter().enumerate() {
            out.push(ExamResult {
                id: format!("exam-{}", out.len() + 1),
                student_id: student_id.to_string(),
                subject: subject.to_string(),
                score,
                max_score: 100.0,
                exam_date: ymd(2024, 1, 15 + day as u32),
                exam_type: "Mid-Term".to_string(),
            });
        }
    }
    out
}

fn demo_notifications() -> Vec<Notification> {
    let n = |id: &str, title: &str, message: &str, roles: &[Role], at: DateTime<Utc>, read: bool| {
        Notification {
            id: id.to_string(),
            title: title.to_string(),
            message: message.to_string(),
            target_roles: roles.to_vec(),
            created_at: at,
            created_by: "admin-1".to_string(),
            read,
        }
    };
    vec![
        n(
            "notif-1",
            "School Holiday Announcement",
            "The school will be closed on February 15th for the annual sports day preparation. Classes will resume on February 17th.",
            &[Role::Admin, Role::Staff, Role::Parent],
            utc(2024, 2, 1, 10),
            false,
        ),
        n(
            "notif-2",
            "Staff Meeting Reminder",
            "All staff members are requested to attend the quarterly review meeting on Friday at 3 PM in the conference room.",
            &[Role::Admin, Role::Staff],
            utc(2024, 2, 5, 9),
            false,
        ),
        n(
            "notif-3",
            "Parent-Teacher Conference",
            "The upcoming parent-teacher conference is scheduled for February 20th. Please book your slot through the school portal.",
            &[Role::Parent],
            utc(2024, 2, 3, 14),
            false,
        ),
        n(
            "notif-4",
            "New Curriculum Update",
            "The updated curriculum for the spring semester has been published. Teachers please review and provide feedback by next week.",
            &[Role::Staff],
            utc(2024, 2, 4, 11),
            true,
        ),
    ]
}

fn slots(rows: &[(&str, &str, &str)]) -> Vec<ScheduleSlot> {
    rows.iter()
        .map(|(day, time, subject)| ScheduleSlot {
            day: day.to_string(),
            time: time.to_string(),
            subject: subject.to_string(),
        })
        .collect()
}

fn demo_staff_profiles() -> Vec<StaffProfile> {
    vec![
        StaffProfile {
            user_id: "staff-1".to_string(),
            department: "Mathematics".to_string(),
            designation: "Senior Teacher".to_string(),
            join_date: ymd(2018, 8, 15),
            phone: "+1-555-0201".to_string(),
            schedule: slots(&[
                ("Monday", "9:00 AM - 10:00 AM", "Math 10-A"),
                ("Monday", "11:00 AM - 12:00 PM", "Math 9-A"),
                ("Tuesday", "9:00 AM - 10:00 AM", "Math 10-B"),
                ("Wednesday", "10:00 AM - 11:00 AM", "Math 10-A"),
                ("Thursday", "9:00 AM - 10:00 AM", "Math 8-B"),
                ("Friday", "11:00 AM - 12:00 PM", "Math 9-A"),
            ]),
        },
        StaffProfile {
            user_id: "staff-2".to_string(),
            department: "English".to_string(),
            designation: "Teacher".to_string(),
            join_date: ymd(2020, 1, 10),
            phone: "+1-555-0202".to_string(),
            schedule: slots(&[
                ("Monday", "10:00 AM - 11:00 AM", "English 10-A"),
                ("Tuesday", "9:00 AM - 10:00 AM", "English 8-B"),
                ("Wednesday", "9:00 AM - 10:00 AM", "English 10-B"),
                ("Thursday", "10:00 AM - 11:00 AM", "English 9-A"),
                ("Friday", "9:00 AM - 10:00 AM", "English 10-A"),
            ]),
        },
    ]
}

fn demo_leave_requests() -> Vec<LeaveRequest> {
    vec![
        LeaveRequest {
            id: "leave-1".to_string(),
            staff_id: "staff-1".to_string(),
            start_date: ymd(2024, 2, 20),
            end_date: ymd(2024, 2, 22),
            reason: "Personal family event".to_string(),
            status: LeaveStatus::Pending,
            created_at: utc(2024, 2, 8, 10),
        },
        LeaveRequest {
            id: "leave-2".to_string(),
            staff_id: "staff-2".to_string(),
            start_date: ymd(2024, 2, 25),
            end_date: ymd(2024, 2, 25),
            reason: "Medical appointment".to_string(),
            status: LeaveStatus::Approved,
            created_at: utc(2024, 2, 5, 14),
        },
    ]
}

pub fn demo(today: NaiveDate) -> Store {
    let students = demo_students();
    let attendance = demo_attendance(&students, today);
    Store::from_parts(
        demo_users(),
        students,
        attendance,
        demo_exam_results(),
        demo_notifications(),
        demo_staff_profiles(),
        demo_leave_requests(),
    )
}
