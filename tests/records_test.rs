//! Entity store and range scanner behaviour through the contract

mod common;

use serde_json::json;
use std::collections::BTreeSet;

use common::{memory_contract, typed, write_raw};
use srs_ledger::records::{Course, Student};
use srs_ledger::LedgerError;

#[tokio::test]
async fn test_second_create_fails_and_keeps_first_value() {
    let contract = memory_contract();
    contract
        .create_student("registrar", typed(json!({"studentId": "102", "program": "Mathematics"})))
        .await
        .unwrap();

    let err = contract
        .create_student("registrar", typed(json!({"studentId": "102", "program": "History"})))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateKey(_)));

    let student: Student = contract.get_student("registrar", "102").await.unwrap();
    assert_eq!(student.program.as_deref(), Some("Mathematics"));
}

#[tokio::test]
async fn test_get_unknown_key_is_not_found() {
    let contract = memory_contract();
    let err = contract.get_course("registrar", "999").await.unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
}

#[tokio::test]
async fn test_create_without_key_field() {
    let contract = memory_contract();
    let err = contract
        .create_course("registrar", typed(json!({"courseCode": "mt101"})))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::MissingKey(ref field) if field == "courseId"));
}

#[tokio::test]
async fn test_list_survives_corrupt_and_foreign_values() {
    let contract = memory_contract();
    for id in ["102", "103", "105"] {
        contract
            .create_student("registrar", typed(json!({"studentId": id})))
            .await
            .unwrap();
    }
    let course: Course = typed(json!({"courseId": "18", "courseName": "Calculus"}));
    contract.create_course("registrar", course).await.unwrap();

    write_raw(contract.store(), "student:bad", b"{not json").await;
    write_raw(contract.store(), "student:alien", br#"{"type":"course","courseId":"x"}"#).await;

    let students = contract.list_students("registrar").await.unwrap();
    let ids: BTreeSet<String> = students
        .records
        .iter()
        .filter_map(|s| s.student_id.as_ref().map(|id| id.to_string()))
        .collect();
    assert_eq!(ids, ["102", "103", "105"].iter().map(|s| s.to_string()).collect());
    assert_eq!(students.skipped.len(), 1);
    assert_eq!(students.skipped[0].key, "student:bad");

    assert_eq!(contract.list_courses("registrar").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_scan_is_idempotent() {
    let contract = memory_contract();
    for id in 1..=5u64 {
        contract
            .create_enrollment("registrar", typed(json!({"enrollmentId": id, "studentId": "102"})))
            .await
            .unwrap();
    }

    let first = contract.list_enrollments("registrar").await.unwrap();
    let second = contract.list_enrollments("registrar").await.unwrap();
    let as_set = |records: &[srs_ledger::records::Enrollment]| -> BTreeSet<String> {
        records.iter().map(|e| serde_json::to_string(e).unwrap()).collect()
    };
    assert_eq!(as_set(&first.records), as_set(&second.records));
    assert_eq!(first.len(), 5);
}

#[tokio::test]
async fn test_deactivated_lecturer_stays_listed() {
    let contract = memory_contract();
    contract
        .create_lecturer("admin", typed(json!({"lecturerId": "lect-1", "username": "mwale"})))
        .await
        .unwrap();
    contract.deactivate_lecturer("admin", "lect-1").await.unwrap();

    let lecturers = contract.list_lecturers("admin").await.unwrap();
    assert_eq!(lecturers.len(), 1);
    assert!(!lecturers.records[0].meta.is_active);
}

#[tokio::test]
async fn test_unknown_fields_are_preserved() {
    let contract = memory_contract();
    contract
        .create_student("registrar", typed(json!({"studentId": "102", "hostel": "Block C"})))
        .await
        .unwrap();

    let student = contract.get_student("registrar", "102").await.unwrap();
    assert_eq!(student.meta.extra.get("hostel"), Some(&json!("Block C")));
}
