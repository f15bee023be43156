use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{
    Attendance, AttendanceStatus, ExamResult, LeaveRequest, LeaveStatus, Notification, Role,
    Student, User,
};

/// Half-up rounding to a whole percent: `floor(x + 0.5)`.
/// Negative and non-finite inputs clamp to 0.
pub fn round_percent(x: f64) -> u32 {
    if !x.is_finite() || x <= 0.0 {
        return 0;
    }
    (x + 0.5).floor() as u32
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub total: usize,
    pub percentage: u32,
}

pub fn tally_attendance<I>(statuses: I) -> AttendanceSummary
where
    I: IntoIterator<Item = AttendanceStatus>,
{
    let mut out = AttendanceSummary::default();
    for s in statuses {
        match s {
            AttendanceStatus::Present => out.present += 1,
            AttendanceStatus::Absent => out.absent += 1,
            AttendanceStatus::Late => out.late += 1,
        }
        out.total += 1;
    }
    out.percentage = if out.total > 0 {
        round_percent(100.0 * out.present as f64 / out.total as f64)
    } else {
        0
    };
    out
}

pub fn attendance_summary(records: &[Attendance], student_id: &str) -> AttendanceSummary {
    tally_attendance(
        records
            .iter()
            .filter(|r| r.student_id == student_id)
            .map(|r| r.status),
    )
}

/// Unrounded percentage of one exam; `max_score <= 0` scores as 0.
fn exam_percent(r: &ExamResult) -> f64 {
    if r.max_score > 0.0 {
        100.0 * r.score / r.max_score
    } else {
        0.0
    }
}

pub fn result_percentage(r: &ExamResult) -> u32 {
    round_percent(exam_percent(r))
}

/// Rounded mean of the per-exam percentages; 0 for an empty set.
pub fn results_average<'a, I>(results: I) -> u32
where
    I: IntoIterator<Item = &'a ExamResult>,
{
    let mut sum = 0.0_f64;
    let mut n = 0_usize;
    for r in results {
        sum += exam_percent(r);
        n += 1;
    }
    if n == 0 {
        return 0;
    }
    round_percent(sum / n as f64)
}

pub fn average_grade(results: &[ExamResult], student_id: &str) -> u32 {
    results_average(results.iter().filter(|r| r.student_id == student_id))
}

pub fn best_result_percentage(results: &[ExamResult]) -> u32 {
    results.iter().map(result_percentage).max().unwrap_or(0)
}

pub fn notifications_for_role(notifications: &[Notification], role: Role) -> Vec<&Notification> {
    notifications.iter().filter(|n| n.targets(role)).collect()
}

pub fn unread_count<'a, I>(notifications: I) -> usize
where
    I: IntoIterator<Item = &'a Notification>,
{
    notifications.into_iter().filter(|n| !n.read).count()
}

/// Students named by the parent's `child_ids`, in that order. Unknown ids are skipped.
pub fn children_of<'a>(users: &[User], students: &'a [Student], parent_id: &str) -> Vec<&'a Student> {
    let Some(parent) = users.iter().find(|u| u.id == parent_id) else {
        return Vec::new();
    };
    parent
        .child_ids
        .iter()
        .filter_map(|cid| students.iter().find(|s| &s.id == cid))
        .collect()
}

fn mean_rounded<I>(values: I) -> u32
where
    I: IntoIterator<Item = u32>,
{
    let mut sum = 0_u64;
    let mut n = 0_u64;
    for v in values {
        sum += u64::from(v);
        n += 1;
    }
    if n == 0 {
        return 0;
    }
    round_percent(sum as f64 / n as f64)
}

pub fn mean_attendance_percentage(students: &[Student], records: &[Attendance]) -> u32 {
    mean_rounded(
        students
            .iter()
            .map(|s| attendance_summary(records, &s.id).percentage),
    )
}

pub fn mean_average_grade(students: &[Student], results: &[ExamResult]) -> u32 {
    mean_rounded(students.iter().map(|s| average_grade(results, &s.id)))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAttendance {
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub unmarked: usize,
    pub student_count: usize,
    /// present / marked, rounded
    pub rate: u32,
}

pub fn status_on(records: &[Attendance], student_id: &str, date: NaiveDate) -> Option<AttendanceStatus> {
    records
        .iter()
        .find(|r| r.student_id == student_id && r.date == date)
        .map(|r| r.status)
}

pub fn students_in_grade<'a>(students: &'a [Student], grade: Option<&str>) -> Vec<&'a Student> {
    students
        .iter()
        .filter(|s| grade.map(|g| s.grade == g).unwrap_or(true))
        .collect()
}

pub fn day_attendance(
    students: &[Student],
    records: &[Attendance],
    date: NaiveDate,
    grade: Option<&str>,
) -> DayAttendance {
    let roster = students_in_grade(students, grade);
    let tally = tally_attendance(
        roster
            .iter()
            .filter_map(|s| status_on(records, &s.id, date)),
    );
    DayAttendance {
        present: tally.present,
        absent: tally.absent,
        late: tally.late,
        unmarked: roster.len() - tally.total,
        student_count: roster.len(),
        rate: tally.percentage,
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResultFilter {
    pub student_id: Option<String>,
    pub subject: Option<String>,
    pub query: Option<String>,
}

pub fn filter_results<'a>(
    results: &'a [ExamResult],
    students: &[Student],
    filter: &ResultFilter,
) -> Vec<&'a ExamResult> {
    let needle = filter
        .query
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .unwrap_or_default();
    results
        .iter()
        .filter(|r| {
            let student_ok = filter
                .student_id
                .as_deref()
                .map(|id| r.student_id == id)
                .unwrap_or(true);
            let subject_ok = filter
                .subject
                .as_deref()
                .map(|s| r.subject == s)
                .unwrap_or(true);
            let query_ok = needle.is_empty()
                || r.subject.to_lowercase().contains(&needle)
                || students
                    .iter()
                    .find(|s| s.id == r.student_id)
                    .map(|s| s.name.to_lowercase().contains(&needle))
                    .unwrap_or(false);
            student_ok && subject_ok && query_ok
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Performer<'a> {
    pub student: &'a Student,
    pub average: u32,
}

/// Highest average first; equal averages keep store order.
pub fn top_performers<'a>(
    students: &'a [Student],
    results: &[ExamResult],
    limit: usize,
) -> Vec<Performer<'a>> {
    let mut ranked: Vec<Performer<'a>> = students
        .iter()
        .map(|s| Performer {
            student: s,
            average: average_grade(results, &s.id),
        })
        .collect();
    ranked.sort_by(|a, b| b.average.cmp(&a.average));
    ranked.truncate(limit);
    ranked
}

pub fn grade_band(percentage: u32) -> &'static str {
    if percentage >= 90 {
        "A+"
    } else if percentage >= 80 {
        "A"
    } else if percentage >= 70 {
        "B"
    } else if percentage >= 60 {
        "C"
    } else if percentage >= 50 {
        "D"
    } else {
        "F"
    }
}

pub fn search_students<'a>(students: &'a [Student], query: &str) -> Vec<&'a Student> {
    let needle = query.trim().to_lowercase();
    students
        .iter()
        .filter(|s| {
            needle.is_empty()
                || s.name.to_lowercase().contains(&needle)
                || s.roll_number.to_lowercase().contains(&needle)
                || s.grade.to_lowercase().contains(&needle)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveCounts {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub total: usize,
}

pub fn leave_counts(requests: &[LeaveRequest], staff_id: Option<&str>) -> LeaveCounts {
    let mut out = LeaveCounts::default();
    for r in requests {
        if staff_id.map(|id| r.staff_id != id).unwrap_or(false) {
            continue;
        }
        match r.status {
            LeaveStatus::Pending => out.pending += 1,
            LeaveStatus::Approved => out.approved += 1,
            LeaveStatus::Rejected => out.rejected += 1,
        }
        out.total += 1;
    }
    out
}

/// Inclusive calendar days; a reversed range counts as 0.
pub fn leave_days(start: NaiveDate, end: NaiveDate) -> i64 {
    ((end - start).num_days() + 1).max(0)
}

/// Distinct values in first-seen order.
pub fn distinct<'a, I>(values: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out: Vec<&str> = Vec::new();
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("date")
    }

    fn student(id: &str, name: &str, grade: &str) -> Student {
        Student {
            id: id.to_string(),
            name: name.to_string(),
            roll_number: format!("R-{}", id),
            grade: grade.to_string(),
            parent_id: "parent-1".to_string(),
            avatar: None,
            date_of_birth: None,
            email: String::new(),
            phone: String::new(),
        }
    }

    fn mark(student_id: &str, d: &str, status: AttendanceStatus) -> Attendance {
        Attendance {
            student_id: student_id.to_string(),
            date: date(d),
            status,
        }
    }

    fn exam(student_id: &str, subject: &str, score: f64, max_score: f64) -> ExamResult {
        ExamResult {
            id: format!("exam-{}-{}", student_id, subject),
            student_id: student_id.to_string(),
            subject: subject.to_string(),
            score,
            max_score,
            exam_date: date("2024-01-15"),
            exam_type: "Mid-Term".to_string(),
        }
    }

    fn notif(id: &str, roles: &[Role], read: bool) -> Notification {
        Notification {
            id: id.to_string(),
            title: id.to_string(),
            message: String::new(),
            target_roles: roles.to_vec(),
            created_at: Utc::now(),
            created_by: "admin-1".to_string(),
            read,
        }
    }

    #[test]
    fn round_percent_is_half_up() {
        assert_eq!(round_percent(66.666), 67);
        assert_eq!(round_percent(66.5), 67);
        assert_eq!(round_percent(66.49), 66);
        assert_eq!(round_percent(0.0), 0);
        assert_eq!(round_percent(f64::NAN), 0);
    }

    #[test]
    fn two_present_one_absent_is_sixty_seven_percent() {
        use AttendanceStatus::*;
        let records = vec![
            mark("s1", "2024-02-01", Present),
            mark("s1", "2024-02-02", Present),
            mark("s1", "2024-02-05", Absent),
            mark("s2", "2024-02-01", Late),
        ];
        let summary = attendance_summary(&records, "s1");
        assert_eq!(
            summary,
            AttendanceSummary {
                present: 2,
                absent: 1,
                late: 0,
                total: 3,
                percentage: 67,
            }
        );
    }

    #[test]
    fn no_records_yield_zero_not_a_division_error() {
        let summary = attendance_summary(&[], "ghost");
        assert_eq!(summary.total, 0);
        assert_eq!(summary.percentage, 0);
        assert_eq!(average_grade(&[], "ghost"), 0);
    }

    #[test]
    fn status_counts_always_sum_to_total() {
        use AttendanceStatus::*;
        let cycle = [Present, Late, Absent, Present, Present];
        let records: Vec<Attendance> = (0..23)
            .map(|i| Attendance {
                student_id: format!("s{}", i % 4),
                date: date("2024-03-01") + chrono::Duration::days(i as i64),
                status: cycle[i % cycle.len()],
            })
            .collect();
        for sid in ["s0", "s1", "s2", "s3", "s9"] {
            let s = attendance_summary(&records, sid);
            assert_eq!(s.present + s.absent + s.late, s.total, "student {}", sid);
        }
    }

    #[test]
    fn average_grade_means_per_exam_percentages() {
        let results = vec![
            exam("s1", "Math", 85.0, 100.0),
            exam("s1", "Art", 40.0, 50.0),
            exam("s1", "Music", 9.0, 0.0),
            exam("s2", "Math", 10.0, 100.0),
        ];
        // (85 + 80 + 0) / 3 = 55
        assert_eq!(average_grade(&results, "s1"), 55);
        assert_eq!(average_grade(&results, "s2"), 10);
        assert_eq!(best_result_percentage(&results), 85);
        assert_eq!(best_result_percentage(&[]), 0);
    }

    #[test]
    fn parent_filter_never_leaks_other_roles() {
        let notifications = vec![
            notif("n1", &[Role::Admin, Role::Staff, Role::Parent], false),
            notif("n2", &[Role::Admin, Role::Staff], false),
            notif("n3", &[Role::Parent], true),
            notif("n4", &[Role::Staff], true),
        ];
        let ids: Vec<&str> = notifications_for_role(&notifications, Role::Parent)
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(ids, vec!["n1", "n3"]);
        assert!(notifications_for_role(&notifications, Role::Parent)
            .iter()
            .all(|n| n.target_roles.contains(&Role::Parent)));
        assert_eq!(
            unread_count(notifications_for_role(&notifications, Role::Staff)),
            2
        );
    }

    #[test]
    fn children_follow_child_id_order() {
        let students = vec![
            student("s1", "Alex Brown", "10-A"),
            student("s2", "Sophie Brown", "8-B"),
            student("s3", "Carlos Martinez", "10-A"),
        ];
        let users = vec![User {
            id: "parent-1".to_string(),
            email: "p@x".to_string(),
            password: "pw".to_string(),
            name: "Pat Parent".to_string(),
            role: Role::Parent,
            avatar: None,
            child_ids: vec!["s3".to_string(), "missing".to_string(), "s1".to_string()],
        }];
        let ids: Vec<&str> = children_of(&users, &students, "parent-1")
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["s3", "s1"]);
        assert!(children_of(&users, &students, "parent-404").is_empty());
    }

    #[test]
    fn day_attendance_counts_unmarked_and_filters_grade() {
        use AttendanceStatus::*;
        let students = vec![
            student("s1", "A", "10-A"),
            student("s2", "B", "10-A"),
            student("s3", "C", "9-A"),
        ];
        let records = vec![
            mark("s1", "2024-02-01", Present),
            mark("s3", "2024-02-01", Absent),
            mark("s2", "2024-01-31", Late),
        ];
        let all = day_attendance(&students, &records, date("2024-02-01"), None);
        assert_eq!(all.present, 1);
        assert_eq!(all.absent, 1);
        assert_eq!(all.unmarked, 1);
        assert_eq!(all.rate, 50);

        let grade = day_attendance(&students, &records, date("2024-02-01"), Some("10-A"));
        assert_eq!(grade.student_count, 2);
        assert_eq!(grade.rate, 100);

        let empty = day_attendance(&students, &records, date("2024-03-01"), None);
        assert_eq!(empty.rate, 0);
        assert_eq!(empty.unmarked, 3);
    }

    #[test]
    fn class_means_degrade_to_zero_without_students() {
        assert_eq!(mean_attendance_percentage(&[], &[]), 0);
        assert_eq!(mean_average_grade(&[], &[]), 0);

        let students = vec![student("s1", "A", "1"), student("s2", "B", "1")];
        let results = vec![exam("s1", "Math", 90.0, 100.0)];
        // (90 + 0) / 2
        assert_eq!(mean_average_grade(&students, &results), 45);
    }

    #[test]
    fn result_filter_matches_student_name_or_subject() {
        let students = vec![student("s1", "Alex Brown", "10-A"), student("s2", "Ryan Chen", "10-B")];
        let results = vec![
            exam("s1", "Mathematics", 85.0, 100.0),
            exam("s2", "Mathematics", 96.0, 100.0),
            exam("s2", "Computer Science", 99.0, 100.0),
        ];

        let by_name = filter_results(
            &results,
            &students,
            &ResultFilter {
                query: Some("ryan".to_string()),
                ..ResultFilter::default()
            },
        );
        assert_eq!(by_name.len(), 2);

        let by_subject = filter_results(
            &results,
            &students,
            &ResultFilter {
                subject: Some("Mathematics".to_string()),
                query: Some("SCI".to_string()),
                ..ResultFilter::default()
            },
        );
        assert!(by_subject.is_empty());

        let all = filter_results(&results, &students, &ResultFilter::default());
        assert_eq!(results_average(all), 93);
    }

    #[test]
    fn top_performers_rank_by_average_and_keep_ties_stable() {
        let students = vec![
            student("s1", "A", "1"),
            student("s2", "B", "1"),
            student("s3", "C", "1"),
        ];
        let results = vec![
            exam("s1", "Math", 70.0, 100.0),
            exam("s2", "Math", 90.0, 100.0),
            exam("s3", "Math", 70.0, 100.0),
        ];
        let top: Vec<&str> = top_performers(&students, &results, 2)
            .iter()
            .map(|p| p.student.id.as_str())
            .collect();
        assert_eq!(top, vec!["s2", "s1"]);
    }

    #[test]
    fn grade_bands_follow_ten_point_steps() {
        assert_eq!(grade_band(100), "A+");
        assert_eq!(grade_band(90), "A+");
        assert_eq!(grade_band(89), "A");
        assert_eq!(grade_band(70), "B");
        assert_eq!(grade_band(60), "C");
        assert_eq!(grade_band(50), "D");
        assert_eq!(grade_band(49), "F");
    }

    #[test]
    fn student_search_checks_name_roll_and_grade() {
        let students = vec![student("s1", "Alex Brown", "10-A"), student("s2", "Emma Thompson", "9-A")];
        assert_eq!(search_students(&students, "").len(), 2);
        assert_eq!(search_students(&students, "brown").len(), 1);
        assert_eq!(search_students(&students, "9-a").len(), 1);
        assert_eq!(search_students(&students, "r-s2").len(), 1);
    }

    #[test]
    fn leave_counts_and_days() {
        let now = Utc::now();
        let req = |staff: &str, status| LeaveRequest {
            id: format!("leave-{}", staff),
            staff_id: staff.to_string(),
            start_date: date("2024-02-20"),
            end_date: date("2024-02-22"),
            reason: String::new(),
            status,
            created_at: now,
        };
        let requests = vec![
            req("staff-1", LeaveStatus::Pending),
            req("staff-1", LeaveStatus::Approved),
            req("staff-2", LeaveStatus::Pending),
        ];
        let mine = leave_counts(&requests, Some("staff-1"));
        assert_eq!((mine.pending, mine.approved, mine.rejected, mine.total), (1, 1, 0, 2));
        assert_eq!(leave_counts(&requests, None).pending, 2);

        assert_eq!(leave_days(date("2024-02-20"), date("2024-02-22")), 3);
        assert_eq!(leave_days(date("2024-02-25"), date("2024-02-25")), 1);
        assert_eq!(leave_days(date("2024-02-25"), date("2024-02-20")), 0);
    }

    #[test]
    fn distinct_keeps_first_seen_order() {
        assert_eq!(distinct(["10-A", "8-B", "10-A", "9-A"]), vec!["10-A", "8-B", "9-A"]);
    }
}
