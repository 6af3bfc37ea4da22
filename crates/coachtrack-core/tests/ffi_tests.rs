//! End-to-end flows through the exported API object.

use coachtrack_core::{
    open_database_in_memory, preview_csv, CoachTrackError, FfiCalendarCell, FfiClientUpdate,
    FfiTrend,
};

const EXPORT: &str = "\
Name,Notes,Last follow up,Diet end,Start,1 Jun,2 Jun,3 Jun,4 Jun,5 Jun,6 Jun,7 Jun
Ravi Kumar,back pain,,,75.0(01-06),,74.0,73.0,72.0,71.0,70.0,69.0
Flat Fran,,,,70.0(01-06),,70.0,70.0,70.0,70.0,70.0,70.0
";

fn empty_update() -> FfiClientUpdate {
    FfiClientUpdate {
        name: None,
        email: None,
        start_date: None,
        start_weight: None,
        current_weight: None,
        goal_weight: None,
        height: None,
        status: None,
        notes: None,
        health_issues: None,
        diet_end_date: None,
        clear_diet_end_date: false,
        routine: None,
        health_summary: None,
    }
}

#[test]
fn test_preview_does_not_store() {
    let preview = preview_csv(EXPORT.to_string(), 2025, 6, None).unwrap();
    assert_eq!(preview.len(), 2);
    assert_eq!(preview[0].health_issues, vec!["Pain Issues".to_string()]);

    let core = open_database_in_memory().unwrap();
    assert!(core.list_clients().unwrap().is_empty());
}

#[test]
fn test_preview_rejects_bad_period() {
    assert!(matches!(
        preview_csv(EXPORT.to_string(), 2025, 13, None),
        Err(CoachTrackError::ImportFailed(_))
    ));
}

#[test]
fn test_preview_with_custom_layout() {
    let text = "h\nback pain,Ravi Kumar,,,75.0(31-05),74.0,73.0".to_string();
    let layout = r#"{"name_column": 1, "notes_column": 0, "daily_columns": 2}"#.to_string();

    let preview = preview_csv(text.clone(), 2025, 6, Some(layout.clone())).unwrap();
    assert_eq!(preview[0].name, "Ravi Kumar");
    assert_eq!(preview[0].health_issues, vec!["Pain Issues".to_string()]);
    assert_eq!(preview[0].weight_entries.len(), 3);

    let core = open_database_in_memory().unwrap();
    let summary = core.import_csv(text, 2025, 6, Some(layout)).unwrap();
    assert_eq!(summary.client_count, 1);
    assert_eq!(summary.entry_count, 3);
}

#[test]
fn test_import_rejects_bad_layout() {
    let core = open_database_in_memory().unwrap();
    for layout in [r#"{"name_column": 1}"#, "not json"] {
        assert!(matches!(
            core.import_csv(EXPORT.to_string(), 2025, 6, Some(layout.to_string())),
            Err(CoachTrackError::ImportFailed(_))
        ));
    }
    assert!(core.list_clients().unwrap().is_empty());
}

#[test]
fn test_import_and_classify() {
    let core = open_database_in_memory().unwrap();
    let summary = core.import_csv(EXPORT.to_string(), 2025, 6, None).unwrap();
    assert_eq!(summary.client_count, 2);
    assert_eq!(summary.entry_count, 14);
    assert_eq!(summary.message, "Successfully parsed 2 clients");

    let ravi = &summary.client_ids[0];
    let fran = &summary.client_ids[1];

    assert_eq!(
        core.classify_day(ravi.clone(), "2025-06-07".into()).unwrap(),
        FfiCalendarCell::Recorded {
            weight: 69.0,
            trend: FfiTrend::Progressing
        }
    );
    assert_eq!(
        core.classify_day(fran.clone(), "2025-06-07".into()).unwrap(),
        FfiCalendarCell::Recorded {
            weight: 70.0,
            trend: FfiTrend::Regressing
        }
    );
    assert_eq!(
        core.classify_day(fran.clone(), "2025-06-08".into()).unwrap(),
        FfiCalendarCell::Empty
    );
    assert_eq!(
        core.classify_day(fran.clone(), "2025-05-31".into()).unwrap(),
        FfiCalendarCell::NotStarted
    );

    let june = core.month_calendar(ravi.clone(), 2025, 6).unwrap();
    assert_eq!(june.len(), 30);
    assert_eq!(june[0].date, "2025-06-01");
    assert_eq!(june[29].cell, FfiCalendarCell::Empty);
    assert!(core.month_calendar(ravi.clone(), 2025, 0).is_err());
}

#[test]
fn test_search_update_and_stats() {
    let core = open_database_in_memory().unwrap();
    let summary = core.import_csv(EXPORT.to_string(), 2025, 6, None).unwrap();
    let fran = summary.client_ids[1].clone();

    let found = core.search_clients("fran".into(), "all".into()).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].email, "flat.fran@imported.com");
    assert!(matches!(
        core.search_clients("".into(), "paused".into()),
        Err(CoachTrackError::InvalidInput(_))
    ));

    let mut update = empty_update();
    update.status = Some("inactive".into());
    let updated = core.update_client(fran.clone(), update).unwrap();
    assert_eq!(updated.status, "inactive");

    let stats = core.roster_stats(Some(2025), Some(6)).unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.active, 1);
    assert_eq!(stats.inactive, 1);
    assert_eq!(stats.new_this_month, 2);
    assert_eq!(core.roster_stats(None, None).unwrap().new_this_month, 0);
}

#[test]
fn test_activity_and_delete() {
    let core = open_database_in_memory().unwrap();
    let summary = core.import_csv(EXPORT.to_string(), 2025, 6, None).unwrap();
    let ravi = summary.client_ids[0].clone();

    let entry = core
        .add_weight_entry(ravi.clone(), "2025-06-07".into(), 68.6)
        .unwrap();
    assert_eq!(entry.weight, 68.6);
    let comment = core
        .add_comment(ravi.clone(), "Great week".into(), "Coach".into())
        .unwrap();

    let client = core.get_client(ravi.clone()).unwrap().unwrap();
    assert_eq!(client.current_weight, Some(68.6));
    assert_eq!(client.weight_entries.len(), 7);
    assert_eq!(client.comments[0].id, comment.id);
    assert_eq!(client.recent_trend, "decreasing");

    assert!(matches!(
        core.add_weight_entry("missing".into(), "2025-06-07".into(), 70.0),
        Err(CoachTrackError::NotFound(_))
    ));

    assert!(core.delete_client(ravi.clone()).unwrap());
    assert!(!core.delete_client(ravi.clone()).unwrap());
    assert!(matches!(
        core.classify_day(ravi, "2025-06-07".into()),
        Err(CoachTrackError::NotFound(_))
    ));
}
