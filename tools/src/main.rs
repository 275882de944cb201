//! studio-sim: headless Monte Carlo runner for the studio financial model.
//!
//! Usage:
//!   studio-sim --params data/scenarios/starter_studio.json --trials 2000
//!   studio-sim --preset beginner_friendly
//!   studio-sim --seed 43 --months 36 --json report.json
//!   studio-sim --db studio.db --save baseline
//!   studio-sim --db studio.db --load baseline --threads 4

use anyhow::{bail, Result};
use std::env;
use studio_core::{
    aggregate::{AggregateReport, DscrBand},
    config::{ParameterSet, ScenarioConfig, PRESETS},
    metric::Metric,
    monte_carlo::{CancelToken, LogProgress, MonteCarloRunner},
    store::ScenarioStore,
};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let params_path = flag_value(&args, "--params");
    let preset = flag_value(&args, "--preset");
    let db = flag_value(&args, "--db");
    let save = flag_value(&args, "--save");
    let load = flag_value(&args, "--load");
    let json_out = flag_value(&args, "--json");

    if (save.is_some() || load.is_some()) && db.is_none() {
        bail!("--save and --load need --db PATH");
    }
    let store = match db {
        Some(path) => {
            let store = ScenarioStore::open(path)?;
            store.migrate()?;
            Some(store)
        }
        None => None,
    };

    let base = match (load, params_path, &store) {
        (Some(name), _, Some(store)) => store.load_scenario(name)?,
        (_, Some(path), _) => ParameterSet::load(path)?,
        _ => {
            let name = preset.unwrap_or("community_studio");
            match ScenarioConfig::preset(name) {
                Some(config) => ParameterSet::new(config)?,
                None => bail!("unknown preset '{name}', expected one of {}", PRESETS.join(", ")),
            }
        }
    };
    let mut params = apply_overrides(base, &args)?;
    if let Some(name) = save {
        let mut config = params.into_config();
        config.name = name.to_string();
        params = ParameterSet::new(config)?;
    }
    let sim = params.simulation();

    println!("studio-sim: {}", params.config().name);
    println!("  seed:      {}", sim.seed);
    println!("  trials:    {}", sim.trials);
    println!("  months:    {}", sim.horizon_months);
    println!("  archetypes: {}", params.archetypes().len());
    println!("  loans:     {}", params.loans().len());
    println!();

    let report = MonteCarloRunner::new(&params).run_with(&LogProgress, &CancelToken::new())?;
    if report.trials_failed > 0 {
        log::warn!("{} trials failed and were left out of the report", report.trials_failed);
    }
    print_summary(&report);

    if let Some(path) = json_out {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        println!("Report written to {path}");
    }
    if let (Some(store), Some(name)) = (&store, save) {
        store.save_scenario(&params)?;
        let run_id = store.save_report(&report)?;
        println!("Saved scenario '{name}' and report {run_id}");
    }

    Ok(())
}

/// Apply `--seed`, `--trials`, `--months` and `--threads`, then revalidate.
fn apply_overrides(params: ParameterSet, args: &[String]) -> Result<ParameterSet> {
    let seed = parse_arg::<u64>(args, "--seed")?;
    let trials = parse_arg::<u32>(args, "--trials")?;
    let months = parse_arg::<u32>(args, "--months")?;
    let threads = parse_arg::<usize>(args, "--threads")?;
    if seed.is_none() && trials.is_none() && months.is_none() && threads.is_none() {
        return Ok(params);
    }

    let mut config = params.into_config();
    if let Some(seed) = seed {
        config.simulation.seed = seed;
    }
    if let Some(trials) = trials {
        config.simulation.trials = trials;
    }
    if let Some(months) = months {
        config.simulation.horizon_months = months;
    }
    if threads.is_some() {
        config.simulation.threads = threads;
    }
    Ok(ParameterSet::new(config)?)
}

fn print_summary(report: &AggregateReport) {
    println!("=== {} ===", report.scenario_name);
    println!(
        "  trials: {} requested, {} completed, {} failed{}",
        report.trials_requested,
        report.trials_completed,
        report.trials_failed,
        if report.cancelled { " (cancelled)" } else { "" }
    );
    println!();
    println!(
        "  {:>5}  {:>12}  {:>12}  {:>12}  {:>11}  {:>8}  {:>6}",
        "month", "cash p5", "cash p50", "cash p95", "revenue p50", "members", "dscr"
    );

    let horizon = report.horizon_months;
    let rows = (1..=horizon).filter(|m| m % 12 == 0 || *m == 1 || *m == horizon);
    for month in rows {
        let cell = |v: Option<f64>| v.map(|v| format!("{v:.0}")).unwrap_or_else(|| "-".into());
        let dscr = report
            .dscr
            .iter()
            .find(|b| b.month() == month)
            .map(|band| match band {
                DscrBand::Computed { .. } => {
                    let mid = report.percentiles.iter().position(|p| *p == 50.0);
                    mid.and_then(|i| band.values().and_then(|v| v.get(i)))
                        .map(|v| format!("{v:.2}"))
                        .unwrap_or_else(|| "-".into())
                }
                DscrBand::InsufficientSample { .. } => "n/a".into(),
            })
            .unwrap_or_else(|| "-".into());
        println!(
            "  {:>5}  {:>12}  {:>12}  {:>12}  {:>11}  {:>8}  {:>6}",
            month,
            cell(report.cash_percentile(month, 5.0)),
            cell(report.cash_percentile(month, 50.0)),
            cell(report.cash_percentile(month, 95.0)),
            cell(report.lookup(&report.revenue, month, 50.0)),
            cell(report.lookup(&report.active_members, month, 50.0)),
            dscr,
        );
    }

    let risk = &report.risk;
    println!();
    println!("  P(cash < 0):            {}", percent(risk.probability_cash_out));
    println!(
        "  P(DSCR < {:.2}):          {}",
        risk.dscr_breach_threshold,
        percent(risk.probability_dscr_breach)
    );
    println!("  final cash mean:        {}", money(risk.final_cash_mean));
    println!("  final cash std dev:     {}", money(risk.final_cash_std_dev));
}

fn percent(metric: Metric) -> String {
    match metric {
        Metric::Defined(v) => format!("{:.1}%", v * 100.0),
        Metric::Undefined  => "undefined".into(),
    }
}

fn money(metric: Metric) -> String {
    match metric {
        Metric::Defined(v) => format!("${v:.0}"),
        Metric::Undefined  => "undefined".into(),
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<Option<T>> {
    match flag_value(args, flag) {
        Some(raw) => match raw.parse() {
            Ok(v) => Ok(Some(v)),
            Err(_) => bail!("invalid value for {flag}: {raw}"),
        },
        None => Ok(None),
    }
}
