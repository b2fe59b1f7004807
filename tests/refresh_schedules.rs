use chrono::{DateTime, Duration, TimeZone, Utc};
use cluster_admin_console::{
    bootstrap, init_tracing, seconds_until_next_run, DashboardError, DashboardSettings, Schedule, ScheduleSet,
};

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).single().expect("valid timestamp")
}

#[test]
fn hourly_schedule_waits_for_top_of_hour() {
    let schedules = ScheduleSet::parse(&["0 * * * *"]).expect("schedule");
    let now = at(2024, 6, 3, 9, 20);
    assert_eq!(seconds_until_next_run(&schedules, &now, &now), Some(40 * 60));
}

#[test]
fn combined_schedules_take_the_earliest_wait() {
    let combined = ScheduleSet::parse(&["0 1 * * *", "0 12-17 * * 1-5"]).expect("schedules");
    let mut now = at(2024, 6, 1, 0, 0);
    let end = at(2024, 6, 15, 0, 0);
    while now < end {
        let individual = combined
            .schedules()
            .iter()
            .filter_map(|schedule| schedule.next_occurrence(&now))
            .map(|next| (next - now).num_seconds() as u64)
            .min();
        assert_eq!(seconds_until_next_run(&combined, &now, &now), individual, "at {}", now);
        now += Duration::minutes(37);
    }
}

#[test]
fn aliases_match_their_expansions() {
    let pairs = [
        ("@yearly", "0 0 1 1 *"),
        ("@annually", "0 0 1 1 *"),
        ("@monthly", "0 0 1 * *"),
        ("@weekly", "0 0 * * 0"),
        ("@daily", "0 0 * * *"),
        ("@midnight", "0 0 * * *"),
        ("@hourly", "0 * * * *"),
    ];
    for (alias, expanded) in pairs {
        let alias_schedule = Schedule::parse(alias).expect("alias");
        let expanded_schedule = Schedule::parse(expanded).expect("expansion");
        let mut t = at(2023, 12, 30, 22, 0);
        for _ in 0..40 {
            assert_eq!(
                alias_schedule.next_occurrence(&t),
                expanded_schedule.next_occurrence(&t),
                "{} at {}",
                alias,
                t
            );
            t += Duration::hours(19);
        }
    }
}

#[test]
fn settings_with_invalid_schedule_fail_to_load() {
    let dir = tempfile::tempdir().expect("temp dir");
    let settings_path = dir.path().join("dashboard.yml");
    std::fs::write(&settings_path, "stats_refresh_schedules:\n  - '0 5 * * *'\n  - '0 25 * * *'\n")
        .expect("write settings");

    let err = bootstrap(&settings_path, &dir.path().join("logs")).expect_err("invalid schedule");
    assert!(matches!(err, DashboardError::ScheduleParse(_)));

    let settings = DashboardSettings::load(&settings_path).expect("settings parse");
    assert!(settings.validate().is_err());
}

#[test]
fn tracing_initialises_log_directory() {
    let dir = tempfile::tempdir().expect("temp dir");
    let log_dir = dir.path().join("logs");
    init_tracing(&log_dir, "debug").expect("first init");
    init_tracing(&log_dir, "debug").expect("repeat init");
    assert!(log_dir.is_dir());
}
