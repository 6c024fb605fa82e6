//! Per-student evaluation of the five checks
//!
//! Each evaluation is one join: resolve the student's enrolled course codes
//! through the enrollment `student_id` index, issue every course lookup the
//! check needs, wait for all of them, then decide. Lookups never mutate the
//! store.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures_util::future::join_all;

use super::conflict::{CheckKind, Conflict, ConflictDetail};
use crate::config::{EngineConfig, UnparsableCreditsPolicy, UnparsableGradePolicy};
use crate::model::{fields, Course, Student};
use crate::observability::{log_event_with_fields, Event};
use crate::schema::Collection;
use crate::store::{Store, StoreResult};

/// Everything a check shares across its per-student joins.
#[derive(Debug)]
pub(crate) struct CheckContext {
    pub(crate) kind: CheckKind,
    pub(crate) store: Store,
    pub(crate) config: Arc<EngineConfig>,
    /// Codes of AP courses; only filled for the AP check
    pub(crate) ap_courses: BTreeSet<String>,
}

impl CheckContext {
    /// Prepares the shared state of a check run.
    ///
    /// The AP check needs the global AP course set before any student is
    /// evaluated; it is built from one full course scan.
    pub(crate) async fn prepare(
        kind: CheckKind,
        store: Store,
        config: Arc<EngineConfig>,
    ) -> StoreResult<Self> {
        let mut ap_courses = BTreeSet::new();
        if kind == CheckKind::Ap {
            let mut cursor = store.scan(Collection::Courses).await;
            while let Some(record) = cursor.next().await? {
                if let Some(course) = record.document.as_course() {
                    if course.is_ap {
                        ap_courses.insert(course.course_code.clone());
                    }
                }
            }
        }

        Ok(Self {
            kind,
            store,
            config,
            ap_courses,
        })
    }
}

/// Evaluates one student. Returns the student's conflict, if any.
pub(crate) async fn evaluate(ctx: Arc<CheckContext>, student: Student) -> Option<Conflict> {
    let outcome = match ctx.kind {
        CheckKind::Grades => Ok(check_grade(&ctx.config, &student)),
        CheckKind::Credits => check_credits(&ctx, &student).await,
        CheckKind::Subjects => check_subjects(&ctx, &student).await,
        CheckKind::Advisory => check_advisory(&ctx, &student).await,
        CheckKind::Ap => check_ap(&ctx, &student).await,
    };

    match outcome {
        Ok(conflict) => conflict,
        Err(error) => {
            let message = error.to_string();
            log_event_with_fields(
                Event::JoinFailed,
                &[
                    ("check", ctx.kind.as_str()),
                    ("code", error.code()),
                    ("error", message.as_str()),
                    ("student_id", student.student_id.as_str()),
                ],
            );
            Some(Conflict::lookup_failed(ctx.kind, &student.student_id, &message))
        }
    }
}

fn check_grade(config: &EngineConfig, student: &Student) -> Option<Conflict> {
    if student.grade_level.within(config.min_grade, config.max_grade) {
        None
    } else {
        Some(Conflict::invalid_grade(
            &student.student_id,
            student.grade_level.raw(),
        ))
    }
}

/// Enrolled course codes of a student, duplicates included, in request order.
async fn enrolled_courses(store: &Store, student_id: &str) -> StoreResult<Vec<String>> {
    let records = store
        .lookup_by_index(Collection::EnrollmentRequests, fields::STUDENT_ID, student_id)
        .await?;

    Ok(records
        .into_iter()
        .filter_map(|record| record.document.as_request().map(|r| r.course_code.clone()))
        .collect())
}

/// Looks up every code concurrently and waits for all of them.
///
/// Codes with no matching course resolve to `None`.
async fn resolve_courses(store: &Store, codes: &[String]) -> StoreResult<Vec<Option<Course>>> {
    let lookups = codes
        .iter()
        .map(|code| store.get(Collection::Courses, code));

    join_all(lookups)
        .await
        .into_iter()
        .map(|found| found.map(|record| record.and_then(|r| r.document.into_course())))
        .collect()
}

async fn check_credits(ctx: &CheckContext, student: &Student) -> StoreResult<Option<Conflict>> {
    let codes = enrolled_courses(&ctx.store, &student.student_id).await?;
    if codes.is_empty() {
        return Ok(Some(Conflict::missing_from_requests(
            CheckKind::Credits,
            &student.student_id,
            None,
        )));
    }

    let courses = resolve_courses(&ctx.store, &codes).await?;

    // Saturates: a total past i64 is out of range either way.
    let mut total: i64 = 0;
    let mut unparsable = Vec::new();
    for course in courses.iter().flatten() {
        if course.credits_offered.value().is_none() && !unparsable.contains(&course.course_code) {
            unparsable.push(course.course_code.clone());
        }
        total = total.saturating_add(course.credit_value());
    }

    if ctx.config.unparsable_credits_policy == UnparsableCreditsPolicy::FlagStudent
        && !unparsable.is_empty()
    {
        return Ok(Some(Conflict::unparsable_credits(
            &student.student_id,
            unparsable,
        )));
    }

    if total < ctx.config.min_credits || total > ctx.config.max_credits {
        return Ok(Some(Conflict::credits_out_of_range(
            &student.student_id,
            total,
        )));
    }
    Ok(None)
}

async fn check_subjects(ctx: &CheckContext, student: &Student) -> StoreResult<Option<Conflict>> {
    let required = &ctx.config.required_subjects;

    let codes = enrolled_courses(&ctx.store, &student.student_id).await?;
    if codes.is_empty() {
        return Ok(Some(Conflict::missing_from_requests(
            CheckKind::Subjects,
            &student.student_id,
            Some(ConflictDetail::Subjects {
                missing_subjects: required.clone(),
            }),
        )));
    }

    let areas: Vec<String> = resolve_courses(&ctx.store, &codes)
        .await?
        .into_iter()
        .flatten()
        .map(|course| course.subject_area.to_uppercase())
        .collect();

    let missing: Vec<String> = required
        .iter()
        .filter(|token| {
            let token = token.to_uppercase();
            !areas.iter().any(|area| area.contains(&token))
        })
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Conflict::missing_subjects(&student.student_id, missing)))
    }
}

async fn check_advisory(ctx: &CheckContext, student: &Student) -> StoreResult<Option<Conflict>> {
    let advisory = &ctx.config.advisory_course_code;

    let codes = enrolled_courses(&ctx.store, &student.student_id).await?;
    if codes.is_empty() {
        return Ok(Some(Conflict::missing_from_requests(
            CheckKind::Advisory,
            &student.student_id,
            None,
        )));
    }

    if codes.iter().any(|code| code == advisory) {
        Ok(None)
    } else {
        Ok(Some(Conflict::missing_advisory(
            &student.student_id,
            advisory,
            codes,
        )))
    }
}

/// Returns true if the AP rule applies to this student's grade.
fn in_ap_population(config: &EngineConfig, student: &Student) -> bool {
    match student.grade_level.value() {
        Some(grade) => !config.is_ap_eligible_grade(grade),
        None => config.unparsable_grade_policy == UnparsableGradePolicy::IncludeInApCheck,
    }
}

async fn check_ap(ctx: &CheckContext, student: &Student) -> StoreResult<Option<Conflict>> {
    if !in_ap_population(&ctx.config, student) {
        return Ok(None);
    }

    let codes = enrolled_courses(&ctx.store, &student.student_id).await?;
    if codes.is_empty() {
        return Ok(Some(Conflict::missing_from_requests(
            CheckKind::Ap,
            &student.student_id,
            None,
        )));
    }

    let mut seen = BTreeSet::new();
    let ap_courses: Vec<String> = codes
        .into_iter()
        .filter(|code| ctx.ap_courses.contains(code) && seen.insert(code.clone()))
        .collect();

    if ap_courses.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Conflict::ap_ineligible(
            &student.student_id,
            student.grade_level.raw(),
            ap_courses,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Row;
    use crate::query::ConflictReason;
    use crate::store::{Dataset, StoreOptions};

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn student(id: &str, grade: &str) -> Student {
        Student::from_row(row(&[("student_id", id), ("grade_level", grade)]))
    }

    async fn context(kind: CheckKind, config: EngineConfig) -> Arc<CheckContext> {
        let store = Store::open(StoreOptions::default()).unwrap();
        store
            .load(Dataset {
                students: vec![],
                courses: vec![
                    row(&[("course_code", "C1"), ("subject_area", "History"), ("credits_offered", "4"), ("is_ap", "TRUE")]),
                    row(&[("course_code", "C2"), ("subject_area", "math"), ("credits_offered", "four"), ("is_ap", "true")]),
                ],
                requests: vec![
                    row(&[("student_id", "S1"), ("course_code", "C1")]),
                    row(&[("student_id", "S1"), ("course_code", "C2")]),
                    row(&[("student_id", "S1"), ("course_code", "C1")]),
                ],
            })
            .await
            .unwrap();
        Arc::new(CheckContext::prepare(kind, store, Arc::new(config)).await.unwrap())
    }

    #[test]
    fn test_grade_bounds_inclusive() {
        let config = EngineConfig::default();
        assert!(check_grade(&config, &student("S", "9")).is_none());
        assert!(check_grade(&config, &student("S", "12")).is_none());
        assert!(check_grade(&config, &student("S", "13")).is_some());
        assert!(check_grade(&config, &student("S", "")).is_some());
        assert!(check_grade(&config, &student("S", "tenth")).is_some());
    }

    #[test]
    fn test_ap_population() {
        let mut config = EngineConfig::default();
        assert!(in_ap_population(&config, &student("S", "10")));
        assert!(!in_ap_population(&config, &student("S", "11")));
        assert!(in_ap_population(&config, &student("S", "")));

        config.unparsable_grade_policy = UnparsableGradePolicy::ExcludeFromApCheck;
        assert!(!in_ap_population(&config, &student("S", "n/a")));
    }

    #[tokio::test]
    async fn test_duplicate_enrollments_count_twice() {
        let ctx = context(CheckKind::Credits, EngineConfig::default()).await;
        let conflict = evaluate(ctx, student("S1", "10")).await.unwrap();
        assert_eq!(conflict.detail, Some(ConflictDetail::Credits { total_credits: 8 }));
    }

    #[tokio::test]
    async fn test_credit_total_saturates_instead_of_overflowing() {
        let store = Store::open(StoreOptions::default()).unwrap();
        store
            .load(Dataset {
                students: vec![],
                courses: vec![row(&[("course_code", "BIG"), ("credits_offered", "9223372036854775807")])],
                requests: vec![
                    row(&[("student_id", "S1"), ("course_code", "BIG")]),
                    row(&[("student_id", "S1"), ("course_code", "BIG")]),
                ],
            })
            .await
            .unwrap();
        let config = Arc::new(EngineConfig::default());
        let ctx = Arc::new(CheckContext::prepare(CheckKind::Credits, store, config).await.unwrap());

        let conflict = evaluate(ctx, student("S1", "10")).await.unwrap();
        assert_eq!(conflict.reason, ConflictReason::CreditsOutOfRange);
        assert_eq!(
            conflict.detail,
            Some(ConflictDetail::Credits {
                total_credits: i64::MAX
            })
        );
    }

    #[tokio::test]
    async fn test_flag_student_policy_names_courses() {
        let config = EngineConfig {
            unparsable_credits_policy: UnparsableCreditsPolicy::FlagStudent,
            ..EngineConfig::default()
        };
        let ctx = context(CheckKind::Credits, config).await;
        let conflict = evaluate(ctx, student("S1", "10")).await.unwrap();
        assert_eq!(
            conflict.detail,
            Some(ConflictDetail::UnparsableCredits {
                unparsable_courses: vec!["C2".into()]
            })
        );
    }

    #[tokio::test]
    async fn test_ap_set_uses_case_sensitive_literal() {
        let ctx = context(CheckKind::Ap, EngineConfig::default()).await;
        assert_eq!(ctx.ap_courses.iter().collect::<Vec<_>>(), vec!["C1"]);

        let conflict = evaluate(ctx, student("S1", "9")).await.unwrap();
        assert_eq!(
            conflict.detail,
            Some(ConflictDetail::ApCourses {
                ap_courses: vec!["C1".into()]
            })
        );
    }

    #[tokio::test]
    async fn test_zero_enrollments_reported_per_check() {
        for kind in [CheckKind::Credits, CheckKind::Subjects, CheckKind::Advisory, CheckKind::Ap] {
            let ctx = context(kind, EngineConfig::default()).await;
            let conflict = evaluate(ctx, student("S9", "10")).await.unwrap();
            assert_eq!(conflict.reason, ConflictReason::MissingFromRequests);
        }
    }
}
