//! Report pipeline tests
//!
//! Configuration files on disk, console summaries and the report driver.
//! Rendering needs a system font; tests that draw accept `Error::Plot`.

use std::fs;
use std::path::Path;

use trueno_report::align::Statistic;
use trueno_report::discovery::FileFilter;
use trueno_report::event::{EventWriter, OnMissingKey};
use trueno_report::report::{
    aggregate_metric, load_experiment, load_plot_config, resolve_experiment, write_summary,
    AnalysisSettings, ColorMode, ExperimentConfig, PlotConfig, ReportDriver, SummaryMode,
    PLOT_CONFIG_FILE,
};
use trueno_report::Error;

fn write_run(dir: &Path, tag: &str, samples: &[(i64, f64)]) {
    let mut writer = EventWriter::create_file(dir.join("events.out.tfevents.1700000000.test")).unwrap();
    for &(step, value) in samples {
        writer.add_scalar_at(tag, step, 100.0, value).unwrap();
    }
    writer.flush().unwrap();
}

/// Two seeds of one configuration under `<tmp>/logs/sweep`.
fn seeded_logs(tmp: &Path) -> std::path::PathBuf {
    let root = tmp.join("logs").join("sweep");
    write_run(&root.join("seed0"), "eval/success", &[(0, 1.0), (10, 2.0), (20, 3.0)]);
    write_run(&root.join("seed1"), "eval/success", &[(0, 3.0), (10, 4.0), (20, 5.0)]);
    root
}

fn seed_settings() -> AnalysisSettings {
    AnalysisSettings {
        resolution: 3,
        stats_key: Some("/seed".to_string()),
        ..AnalysisSettings::default()
    }
}

#[test]
fn test_load_config_documents_from_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let config_dir = tmp.path().join("experiments");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join(PLOT_CONFIG_FILE),
        "savedir: plots\nstats_key: /seed\nstatistic: min-max\nresolution: 20\nsmooth: 0.5\ncolors: ['#ff0000']\n",
    )
    .unwrap();
    fs::write(
        config_dir.join("sweep.yml"),
        concat!(
            "paths: [[logs/a, logs/b], [logs/c]]\n",
            "plot_name: [ab, c]\n",
            "keys:\n",
            "  - [eval, eval/success, success, {summary: max, vmin: 0.0, vmax: 1.0}]\n",
            "  - {key: train/loss, file: loss, label: Loss, plot: {logy: true}}\n",
            "filters: [seed]\n",
        ),
    )
    .unwrap();

    let plot = load_plot_config(config_dir.join(PLOT_CONFIG_FILE)).unwrap();
    assert_eq!(plot.savedir().unwrap(), Path::new("plots"));
    assert_eq!(plot.analysis.stats_key.as_deref(), Some("/seed"));
    assert_eq!(plot.analysis.statistic, Statistic::MinMax);
    assert_eq!(plot.analysis.resolution, 20);
    assert_eq!(plot.plot.smooth, 0.5);
    assert_eq!(plot.palette().len(), 1);

    let path = resolve_experiment(&config_dir, Path::new("sweep.yml"));
    assert_eq!(path, config_dir.join("sweep.yml"));
    let experiment = load_experiment(&path).unwrap();
    let pairs: Vec<_> = experiment.experiments().collect();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[1].1, "c");
    assert_eq!(experiment.keys[0].prefix, "eval");
    assert_eq!(experiment.keys[0].overrides.summary, Some(SummaryMode::Max));
    assert_eq!(experiment.keys[0].overrides.plot.vmax, Some(1.0));
    assert_eq!(experiment.keys[1].label(), "Loss");
    assert_eq!(experiment.keys[1].overrides.plot.logy, Some(true));
    assert_eq!(experiment.filters, vec!["seed".to_string()]);
}

#[test]
fn test_missing_or_invalid_documents_are_config_errors() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_plot_config(tmp.path().join(PLOT_CONFIG_FILE)),
        Err(Error::Config(_))
    ));

    let bad = tmp.path().join("bad.yml");
    fs::write(&bad, "paths: [[a], [b]]\nplot_name: [only_one]\nkeys: [[p, k, f, null]]\n").unwrap();
    match load_experiment(&bad) {
        Err(Error::Config(msg)) => assert!(msg.contains("plot_name")),
        other => panic!("expected Config error, got {other:?}"),
    }
}

#[test]
fn test_aggregate_metric_and_plain_summary() {
    let tmp = tempfile::tempdir().unwrap();
    let root = seeded_logs(tmp.path());

    let aggregation = aggregate_metric(&[&root], &FileFilter::default(), "eval/success", &seed_settings())
        .unwrap()
        .unwrap();
    assert_eq!(aggregation.series["sweep"].mean(), &[2.0, 3.0, 4.0]);

    let mut out = Vec::new();
    write_summary(&mut out, "eval/success", &aggregation, None, &seed_settings(), ColorMode::Plain)
        .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text, "eval/success\n  sweep: 4.0000 +/- 1.0000\n");

    let mut out = Vec::new();
    let minmax = AnalysisSettings {
        statistic: Statistic::MinMax,
        ..seed_settings()
    };
    let aggregation = aggregate_metric(&[&root], &FileFilter::default(), "eval/success", &minmax)
        .unwrap()
        .unwrap();
    write_summary(&mut out, "m", &aggregation, Some(SummaryMode::Min), &minmax, ColorMode::Plain)
        .unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "m\n  sweep: 2.0000 - 1.0000(-) 3.0000(+)\n"
    );
}

#[test]
fn test_aggregate_metric_absent_tag() {
    let tmp = tempfile::tempdir().unwrap();
    let root = seeded_logs(tmp.path());

    let skipped = aggregate_metric(&[&root], &FileFilter::default(), "train/loss", &seed_settings())
        .unwrap();
    assert!(skipped.is_none());

    let strict = AnalysisSettings {
        on_missing_key: OnMissingKey::Raise,
        ..seed_settings()
    };
    assert!(matches!(
        aggregate_metric(&[&root], &FileFilter::default(), "train/loss", &strict),
        Err(Error::MissingKey { .. })
    ));
}

#[test]
fn test_report_driver_runs_experiment() {
    let tmp = tempfile::tempdir().unwrap();
    let root = seeded_logs(tmp.path());
    let savedir = tmp.path().join("plots");

    let plot = PlotConfig::from_yaml(&format!(
        "savedir: {}\nstats_key: /seed\nresolution: 5\n",
        savedir.display()
    ))
    .unwrap();
    let experiment = ExperimentConfig::from_yaml(&format!(
        "paths: [[{}]]\nplot_name: [sweep]\nkeys:\n  - ['', eval/success, success, null]\n  - ['', train/loss, loss, null]\n",
        root.display()
    ))
    .unwrap();

    let mut out = Vec::new();
    let result = ReportDriver::new(&plot)
        .color(ColorMode::Plain)
        .export(true)
        .run(&experiment, &mut out);
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("Processing sweep ..."));
    assert!(text.contains("eval/success\n  sweep: 4.0000 +/- 1.0000"));
    assert!(savedir.is_dir());

    match result {
        Ok(outcome) => {
            assert_eq!(outcome.plots, vec![savedir.join("sweep_success.png")]);
            assert_eq!(outcome.exports, vec![savedir.join("sweep_success.parquet")]);
            assert_eq!(outcome.missing_metrics, 1);
            assert_eq!(outcome.degenerate_groups, 0);
            assert!(outcome.plots[0].is_file());
            assert!(outcome.exports[0].is_file());
        }
        // No usable font on this machine
        Err(Error::Plot(_)) => {}
        Err(other) => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_report_driver_requires_savedir() {
    let plot = PlotConfig::default();
    let experiment = ExperimentConfig::from_yaml(
        "paths: [[logs]]\nplot_name: [x]\nkeys: [['', k, f, null]]\n",
    )
    .unwrap();
    let mut out = Vec::new();
    assert!(matches!(
        ReportDriver::new(&plot).run(&experiment, &mut out),
        Err(Error::Config(_))
    ));
}
