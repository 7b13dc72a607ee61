//! Cogdrift CLI
//!
//! Usage:
//!   cogdrift --analyze bundle.json           # Calibrate + score one period
//!   cogdrift --analyze bundle.json --json    # JSON output
//!   cogdrift --registry                      # List indicators
//!   cogdrift --serve                         # HTTP API server

use clap::Parser;
use colored::Colorize;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use cogdrift::core::{
    registry, run_server, validate, AppState, BaselineCalibrator, HttpNarrativeService,
    JsonFileStore, NarrativeService, WeeklyOrchestrator,
};
use cogdrift::types::{
    AlertLevel, HistoryPoint, IndicatorVector, PeriodInput, SessionInput, WeeklyOutcome,
    WeeklyReport,
};
use cogdrift::{DriftError, EngineConfig, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "cogdrift",
    version = VERSION,
    about = "Cogdrift - longitudinal drift scoring for conversational speech indicators",
    long_about = "Cogdrift compares each week's speech and language indicators against a\n\
                  personal baseline, stages any decline cascade, weighs competing\n\
                  explanations and forecasts the trajectory.\n\n\
                  Modes:\n  \
                  --analyze FILE  Calibrate and score one period from a JSON bundle\n  \
                  --registry      Print the indicator catalog\n  \
                  --serve         HTTP API server mode\n\n\
                  Alert levels:\n  \
                  GREEN   composite >= -0.5\n  \
                  YELLOW  composite in [-1.0, -0.5)\n  \
                  ORANGE  composite in [-1.5, -1.0)\n  \
                  RED     composite < -1.5"
)]
struct Args {
    /// JSON bundle: calibration sessions, period sessions, prior history
    #[arg(short, long)]
    analyze: Option<String>,

    /// Print the indicator registry
    #[arg(long)]
    registry: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Period key (YYYY-Www); defaults to the bundle's, then the current week
    #[arg(long)]
    period: Option<String>,

    /// Engine config file (JSON)
    #[arg(long)]
    config: Option<String>,

    /// Directory for weekly reports
    #[arg(long)]
    report_dir: Option<String>,

    /// Narrative service endpoint
    #[arg(long)]
    narrative_url: Option<String>,

    /// Narrative call deadline in seconds
    #[arg(long)]
    narrative_timeout_secs: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,
}

/// Input file for --analyze
#[derive(Debug, Deserialize)]
struct AnalysisBundle {
    patient_id: String,
    #[serde(default)]
    period: Option<String>,
    /// Calibration sessions, oldest first
    calibration: Vec<IndicatorVector>,
    sessions: Vec<SessionInput>,
    #[serde(default)]
    history: Vec<HistoryPoint>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(!args.no_color)
        .init();

    if args.no_color {
        colored::control::set_override(false);
    }

    let config = match load_config(&args) {
        Ok(c) => c,
        Err(e) => fail(&e),
    };

    if args.registry {
        print_registry(args.json);
    } else if args.serve {
        run_serve(&args, &config).await;
    } else if let Some(ref path) = args.analyze {
        if let Err(e) = run_analyze(path, &args, &config).await {
            fail(&e);
        }
    } else {
        eprintln!("Nothing to do. Use --analyze FILE, --registry or --serve (see --help).");
        std::process::exit(2);
    }
}

fn fail(e: &DriftError) -> ! {
    eprintln!("{} {}", "error:".red().bold(), e);
    std::process::exit(1);
}

/// Defaults, then the config file, then flags
fn load_config(args: &Args) -> Result<EngineConfig, DriftError> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = &args.report_dir {
        config.report_dir = dir.clone();
    }
    if let Some(url) = &args.narrative_url {
        config.narrative.endpoint = Some(url.clone());
    }
    if let Some(secs) = args.narrative_timeout_secs {
        config.narrative.timeout_secs = secs;
    }
    config.validate()?;
    Ok(config)
}

fn narrative_service(config: &EngineConfig) -> Result<Arc<dyn NarrativeService>, DriftError> {
    HttpNarrativeService::from_config(&config.narrative)
        .map(Arc::from)
        .map_err(|e| DriftError::Config(e.to_string()))
}

/// Calibrate from the bundle and run one weekly report
async fn run_analyze(path: &str, args: &Args, config: &EngineConfig) -> Result<(), DriftError> {
    let json = std::fs::read_to_string(path)?;
    let bundle: AnalysisBundle = serde_json::from_str(&json)?;
    validate::patient_id(&bundle.patient_id)?;

    let period = args
        .period
        .clone()
        .or(bundle.period.clone())
        .unwrap_or_else(|| validate::period_for(chrono::Utc::now().date_naive()));

    let calibrator = BaselineCalibrator::new(config.calibration.clone());
    let baseline = calibrator.calibrate(bundle.patient_id.clone(), &bundle.calibration);

    let orchestrator = WeeklyOrchestrator::new(
        config,
        narrative_service(config)?,
        Arc::new(JsonFileStore::new(&config.report_dir)),
    );
    let outcome = orchestrator
        .run(&PeriodInput {
            patient_id: bundle.patient_id,
            period,
            baseline,
            sessions: bundle.sessions,
            history: bundle.history,
        })
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }
    match &outcome {
        WeeklyOutcome::Report(report) => print_report(report),
        WeeklyOutcome::CalibrationPending {
            sessions_used,
            target_sessions,
            needs_extension,
        } => {
            println!(
                "{} baseline incomplete: {}/{} sessions{}",
                "CALIBRATING".cyan().bold(),
                sessions_used,
                target_sessions,
                if *needs_extension {
                    " (extended: high variance)"
                } else {
                    ""
                }
            );
        }
        WeeklyOutcome::NoSessions => println!("No sessions in period; nothing to report."),
        WeeklyOutcome::NothingMeasured { sessions_analyzed } => println!(
            "{} {} session(s) carried no measured indicator; period not scored.",
            "UNMEASURED".dimmed().bold(),
            sessions_analyzed
        ),
    }
    Ok(())
}

fn alert_label(alert: AlertLevel) -> colored::ColoredString {
    let label = alert.to_string();
    match alert {
        AlertLevel::Green => label.green().bold(),
        AlertLevel::Yellow => label.yellow().bold(),
        AlertLevel::Orange => label.truecolor(255, 140, 0).bold(),
        AlertLevel::Red => label.red().bold(),
    }
}

fn print_report(report: &WeeklyReport) {
    let a = &report.algorithmic;
    let diff = &a.differential;

    println!();
    println!(
        "{} {}  {}",
        a.patient_id.bold(),
        a.period,
        alert_label(a.alert_level())
    );
    println!(
        "  composite {:+.3}  ({} sessions, {}/9 domains, coverage {:.0}%)",
        a.composite(),
        a.sessions_analyzed,
        a.deviation.measured_domains,
        a.deviation.coverage * 100.0
    );
    if let Some(prior) = &a.prior {
        println!(
            "  vs {}: {:+.3} (was {})",
            prior.previous_period,
            prior.delta,
            alert_label(prior.previous_alert)
        );
    }

    println!();
    println!("  {}", "Domains".underline());
    for (domain, score) in &a.deviation.domain_scores {
        println!("    {:<10} {:+.3}", domain.name(), score);
    }
    if !a.deviation.outliers.is_empty() {
        println!("    outliers: {}", a.deviation.outliers.join(", "));
    }

    println!();
    match a.cascade.deepest() {
        Some(stage) => println!(
            "  cascade   stage {} ({}, confidence {:.1})",
            stage.stage,
            if stage.order_preserved {
                "expected order"
            } else {
                "atypical order"
            },
            stage.confidence
        ),
        None => println!("  cascade   none"),
    }
    println!("  pattern   {}", a.temporal_pattern);

    println!();
    println!("  {}", "Differential".underline());
    for (condition, p) in &diff.probabilities {
        let line = format!("    {:<18} {:.3}", condition.name(), p);
        if *condition == diff.primary_hypothesis {
            println!("{}", line.bold());
        } else {
            println!("{}", line);
        }
    }
    println!("    confidence {:.2}", diff.confidence);
    if !diff.flags.is_empty() {
        let flags: Vec<String> = diff.flags.iter().map(|f| format!("{:?}", f)).collect();
        println!("    flags: {}", flags.join(", "));
    }
    for rec in &diff.recommendation {
        println!("    - {}", rec);
    }

    println!();
    println!(
        "  forecast  {} at +{} periods ({}, velocity {:+.3}, confidence {:.2})",
        alert_label(a.trajectory.predicted_alert_at_horizon),
        a.trajectory.horizon(),
        a.trajectory.model,
        a.trajectory.velocity,
        a.trajectory.confidence
    );

    println!();
    let source = if report.algorithmic_only {
        "templated".dimmed()
    } else {
        "generated".normal()
    };
    println!("  {} ({})", "Family summary".underline(), source);
    println!("    {}", report.narrative.family_text);
    println!("  {}", "Clinician summary".underline());
    println!("    {}", report.narrative.clinician_text);
    for focus in &report.narrative.next_focus {
        println!("    next: {}", focus);
    }
    println!();
    println!("  fingerprint {}", report.fingerprint.dimmed());
}

fn print_registry(json: bool) {
    if json {
        match serde_json::to_string_pretty(registry::all()) {
            Ok(s) => println!("{}", s),
            Err(e) => fail(&e.into()),
        }
        return;
    }

    let mut by_domain: BTreeMap<_, Vec<_>> = BTreeMap::new();
    for def in registry::all() {
        by_domain.entry(def.domain).or_default().push(def);
    }
    for (domain, defs) in by_domain {
        println!(
            "{} (weight {:.2}, {} indicators)",
            domain.name().to_uppercase().bold(),
            domain.weight(),
            defs.len()
        );
        for def in defs {
            let sentinel = if def.sentinel_for.is_empty() {
                String::new()
            } else {
                let names: Vec<&str> = def.sentinel_for.iter().map(|c| c.name()).collect();
                format!("  [sentinel: {}]", names.join(", "))
            };
            println!(
                "  {:<24} {:<40} w={:.1}{}",
                def.id,
                def.name,
                def.base_weight,
                sentinel.dimmed()
            );
        }
    }
}

/// Run HTTP API server
async fn run_serve(args: &Args, config: &EngineConfig) {
    println!();
    println!("Cogdrift API Server {}", VERSION);
    println!("  reports: {}", config.report_dir);
    println!(
        "  narrative: {}",
        config.narrative.endpoint.as_deref().unwrap_or("offline (templated)")
    );
    println!();

    let narrative = match narrative_service(config) {
        Ok(n) => n,
        Err(e) => fail(&e),
    };
    let state = Arc::new(AppState::new(
        config,
        narrative,
        Arc::new(JsonFileStore::new(&config.report_dir)),
    ));

    if let Err(e) = run_server(&args.addr, state).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
