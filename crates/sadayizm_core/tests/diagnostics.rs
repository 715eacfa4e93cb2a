use sadayizm_core::db::open_db_in_memory;
use sadayizm_core::{
    run_diagnostics, CheckStatus, MemoryTrollRepository, SqliteTrollRepository, TrollInput,
    TrollService,
};

#[test]
fn diagnostics_pass_and_leave_store_as_found() {
    let repo = SqliteTrollRepository::try_new(open_db_in_memory().unwrap()).unwrap();
    let service = TrollService::new(repo);
    let existing = service.add(&TrollInput::new("foo", "123")).unwrap();

    let report = run_diagnostics(&service);

    assert!(report.is_healthy(), "report: {report:?}");
    assert_eq!(report.backend, "sqlite");
    let names: Vec<_> = report.tests.iter().map(|check| check.name).collect();
    assert_eq!(
        names,
        vec!["GET_ALL_TROLLS", "INSERT_TROLL", "UPDATE_TROLL", "DELETE_TROLL"]
    );
    assert_eq!(report.tests[0].data, vec![existing.clone()]);
    assert_eq!(service.list().unwrap(), vec![existing]);
}

#[test]
fn diagnostics_report_serializes_status_in_upper_case() {
    let service = TrollService::new(MemoryTrollRepository::new());
    let report = run_diagnostics(&service);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "SUCCESS");
    assert_eq!(json["backend"], "memory");
    assert_eq!(json["tests"][1]["name"], "INSERT_TROLL");
    assert!(json.get("error").is_none());
    assert_eq!(report.status, CheckStatus::Success);
}
