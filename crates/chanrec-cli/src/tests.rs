use super::*;

#[test]
fn parses_migrate_command() {
    let cli = Cli::try_parse_from(["chanrec", "migrate"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Migrate));
}

#[test]
fn parses_seed_command() {
    let cli = Cli::try_parse_from(["chanrec", "seed"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Seed));
}

#[test]
fn parses_ingest_with_file() {
    let cli = Cli::try_parse_from(["chanrec", "ingest", "orders.jsonl"])
        .expect("expected valid cli args");
    match cli.command {
        Commands::Ingest { file } => assert_eq!(file, PathBuf::from("orders.jsonl")),
        other => panic!("expected Ingest, got {other:?}"),
    }
}

#[test]
fn parses_reconcile_with_range() {
    let cli = Cli::try_parse_from([
        "chanrec",
        "reconcile",
        "--from",
        "2026-03-01",
        "--to",
        "2026-03-08",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Commands::Reconcile { from, to, dry_run } => {
            assert_eq!(from, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
            assert_eq!(to, NaiveDate::from_ymd_opt(2026, 3, 8).unwrap());
            assert!(!dry_run);
        }
        other => panic!("expected Reconcile, got {other:?}"),
    }
}

#[test]
fn parses_reconcile_dry_run_flag() {
    let cli = Cli::try_parse_from([
        "chanrec",
        "reconcile",
        "--from",
        "2026-03-01",
        "--to",
        "2026-03-02",
        "--dry-run",
    ])
    .expect("expected valid cli args");

    assert!(matches!(cli.command, Commands::Reconcile { dry_run: true, .. }));
}

#[test]
fn reconcile_requires_both_range_bounds() {
    let result = Cli::try_parse_from(["chanrec", "reconcile", "--from", "2026-03-01"]);
    assert!(result.is_err(), "missing --to should be rejected");
}

#[test]
fn rejects_malformed_date() {
    let result = Cli::try_parse_from([
        "chanrec",
        "reconcile",
        "--from",
        "03/01/2026",
        "--to",
        "2026-03-02",
    ]);
    assert!(result.is_err(), "non-ISO date should be rejected");
}

#[test]
fn parses_report_command() {
    let cli = Cli::try_parse_from([
        "chanrec",
        "report",
        "--from",
        "2026-03-01",
        "--to",
        "2026-04-01",
    ])
    .expect("expected valid cli args");

    assert!(matches!(cli.command, Commands::Report { .. }));
}
