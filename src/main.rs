use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use runstatus::config::AppConfig;
use runstatus::dashboard::{Analysis, Dashboard};
use runstatus::database::Database;
use runstatus::format::{format_duration, format_sleep};
use runstatus::logging::{init_logging, LogFormat};
use runstatus::models::{GoalType, Snapshot};
use runstatus::pmc::{ac_status, atl_status, ctl_status, sleep_status, tsb_status, Status, TsbZone};
use runstatus::race::{extract_pr_candidates, fit_critical_speed, Activity, Effort};
use runstatus::taper::TaperModel;
use runstatus::thresholds::race as race_cfg;

/// runstatus - Running training status analytics
///
/// Stores daily training snapshots and derives load projections, injury risk,
/// race predictions, readiness and recovery insights from them.
#[derive(Parser)]
#[command(name = "runstatus")]
#[command(version)]
#[command(about = "Running training status analytics", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Snapshot database, overriding the config
    #[arg(short, long, value_name = "FILE", global = true)]
    database: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format (pretty, json, compact)
    #[arg(long, value_name = "FORMAT", global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import snapshots from a JSON array
    Import {
        /// Input file path
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show the latest snapshot with status labels
    Status,

    /// Run one analysis over the stored snapshots
    Analyze {
        /// consistency, projections, injury-risk, correlations, race, summary,
        /// adherence, readiness, suggestion, overload, zones, hr-drift, sleep,
        /// detraining or recommendation
        analysis: Analysis,

        /// Weekly km target for adherence, overriding goals and config
        #[arg(long)]
        target_km: Option<f64>,

        /// Print JSON instead of a report
        #[arg(long)]
        json: bool,
    },

    /// Plan a taper for an upcoming race
    Taper {
        /// Race day (YYYY-MM-DD)
        #[arg(short, long)]
        race_date: String,

        /// linear, step or exponential (default from config)
        #[arg(short, long)]
        model: Option<TaperModel>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Find race-distance PR candidates in an activity export
    Records {
        /// JSON array of activities
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Manage distance goals
    Goal {
        #[command(subcommand)]
        action: GoalAction,
    },

    /// Configure application settings
    Config {
        /// Print the active configuration
        #[arg(short, long)]
        show: bool,

        /// Write a default configuration file
        #[arg(short, long)]
        init: bool,
    },
}

#[derive(Subcommand)]
enum GoalAction {
    /// Add a distance goal
    Add {
        /// Target distance in km
        target: f64,

        /// weekly_km, monthly_km or yearly_km
        #[arg(short = 't', long, default_value = "weekly_km")]
        goal_type: GoalType,

        /// First day of the goal period (YYYY-MM-DD)
        #[arg(long)]
        period_start: Option<NaiveDate>,
    },

    /// List active goals
    List,

    /// Deactivate a goal
    Remove {
        id: i64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(AppConfig::default_config_path);
    let mut config = AppConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let mut log_config = config.logging.clone();
    log_config.level = log_config.level.raised_by(cli.verbose);
    if let Some(format) = cli.log_format {
        log_config.format = format;
    }
    init_logging(&log_config)?;

    if cli.verbose > 0 {
        eprintln!("{}", format!("Log level: {}", log_config.level.to_filter()).dimmed());
    }

    let db_path = cli
        .database
        .clone()
        .unwrap_or_else(|| config.settings.database_path.clone());
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Import { file } => import(&db_path, &file)?,

        Commands::Status => {
            let dashboard = open_dashboard(&db_path, &config)?;
            show_status(&dashboard)?;
        }

        Commands::Analyze {
            analysis,
            target_km,
            json,
        } => {
            let dashboard = open_dashboard(&db_path, &config)?;
            let target = match (analysis, target_km) {
                (Analysis::Adherence, Some(km)) => Some(km),
                (Analysis::Adherence, None) => Some(weekly_target(dashboard.source(), &config)?),
                _ => None,
            };

            if json {
                let value = match target {
                    Some(km) => serde_json::to_value(dashboard.goal_adherence(km)?)?,
                    None => dashboard.run(analysis, today)?,
                };
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                print_analysis(&dashboard, analysis, today, target)?;
            }
        }

        Commands::Taper {
            race_date,
            model,
            json,
        } => {
            let dashboard = open_dashboard(&db_path, &config)?;
            let model = model.unwrap_or(config.settings.default_taper_model);
            let plan = dashboard.taper(&race_date, today, model)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else if let Some(error) = &plan.error {
                println!("{} {}", "✗".red(), error);
            } else {
                println!(
                    "{}",
                    format!("{} taper: {} days to race", plan.model, plan.days_to_race.unwrap_or(0))
                        .green()
                        .bold()
                );
                let rows: Vec<TaperRow> = plan
                    .weeks
                    .iter()
                    .map(|w| TaperRow {
                        week: w.label.clone(),
                        volume: format!("{:.0}%", w.target_volume_pct),
                        reduction: format!("-{:.0}%", w.reduction_pct),
                        projected_ctl: opt1(w.projected_ctl),
                    })
                    .collect();
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
        }

        Commands::Records { file } => records(&file)?,

        Commands::Goal { action } => {
            let mut db = Database::open(&db_path)?;
            match action {
                GoalAction::Add {
                    target,
                    goal_type,
                    period_start,
                } => {
                    if target <= 0.0 {
                        bail!("Goal target must be positive, got {}", target);
                    }
                    let goal = db.create_goal(goal_type, target, period_start)?;
                    println!(
                        "{} Added goal #{}: {} {:.1} km",
                        "✓".green(),
                        goal.id,
                        goal.goal_type,
                        goal.target_value
                    );
                }
                GoalAction::List => {
                    let goals = db.active_goals()?;
                    if goals.is_empty() {
                        println!("No active goals");
                    } else {
                        let rows: Vec<GoalRow> = goals
                            .into_iter()
                            .map(|g| GoalRow {
                                id: g.id,
                                goal_type: g.goal_type.to_string(),
                                target_km: format!("{:.1}", g.target_value),
                                period_start: g
                                    .period_start
                                    .map(|d| d.to_string())
                                    .unwrap_or_else(|| "-".to_string()),
                                created_at: g.created_at,
                            })
                            .collect();
                        println!("{}", Table::new(rows).with(Style::rounded()));
                    }
                }
                GoalAction::Remove { id } => {
                    if let Err(e) = db.deactivate_goal(id) {
                        let e = runstatus::RunStatusError::from(e);
                        bail!(e.user_message());
                    }
                    println!("{} Removed goal #{}", "✓".green(), id);
                }
            }
        }

        Commands::Config { show, init } => {
            if init {
                if config_path.exists() {
                    bail!("Config already exists at {}", config_path.display());
                }
                config.save_to_file(&config_path)?;
                println!(
                    "{} Wrote default config to {}",
                    "✓".green(),
                    config_path.display()
                );
            }
            if show || !init {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

fn open_dashboard(path: &Path, config: &AppConfig) -> Result<Dashboard<Database>> {
    let db = Database::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    Ok(Dashboard::new(db).with_athlete(config.athlete.clone()))
}

/// Active weekly goal, then the configured target, then nothing
fn weekly_target(db: &Database, config: &AppConfig) -> Result<f64> {
    let stored = db
        .active_goals()?
        .into_iter()
        .rev()
        .find(|g| g.goal_type == GoalType::WeeklyKm)
        .map(|g| g.target_value);

    stored
        .or(config.athlete.weekly_km_target)
        .context("No weekly goal set. Add one with `runstatus goal add <km>` or pass --target-km")
}

fn import(db_path: &Path, file: &Path) -> Result<()> {
    println!("{}", "Importing snapshots...".green().bold());
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let snapshots: Vec<Snapshot> =
        serde_json::from_str(&content).context("Expected a JSON array of snapshots")?;

    let (valid, skipped): (Vec<Snapshot>, Vec<Snapshot>) = snapshots
        .into_iter()
        .partition(|s| s.recorded_date().is_some());
    for snapshot in &skipped {
        tracing::warn!(recorded_at = %snapshot.recorded_at, "Skipping snapshot with malformed date");
    }

    let mut db = Database::open(db_path)?;
    let stored = db.insert_snapshots(&valid)?;

    println!("{} Imported {} snapshots", "✓".green(), stored);
    if !skipped.is_empty() {
        println!("{} Skipped {} with malformed dates", "!".yellow(), skipped.len());
    }
    Ok(())
}

fn records(file: &Path) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let activities: Vec<Activity> =
        serde_json::from_str(&content).context("Expected a JSON array of activities")?;

    let candidates = extract_pr_candidates(&activities);
    if candidates.is_empty() {
        println!("No race-distance runs found in {} activities", activities.len());
        return Ok(());
    }

    let rows: Vec<RecordRow> = candidates
        .iter()
        .map(|c| RecordRow {
            distance: c.distance_label.clone(),
            time: format_duration(c.time_secs),
            pace: c.pace_str.clone(),
            date: c.activity_date.chars().take(10).collect(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    let efforts: Vec<Effort> = candidates
        .iter()
        .filter(|c| c.time_secs >= race_cfg::MIN_EFFORT_SECS)
        .map(|c| Effort {
            distance_m: c.distance_m,
            time_secs: c.time_secs,
        })
        .collect();
    if let Some(fit) = fit_critical_speed(&efforts) {
        println!(
            "Critical speed {:.2} m/s, D' {:.0} m ({} efforts)",
            fit.critical_speed,
            fit.d_prime,
            fit.points_used.len()
        );
    }
    Ok(())
}

fn colored_status(text: String, status: Status) -> ColoredString {
    match status {
        Status::Good => text.green(),
        Status::Ok => text.yellow(),
        Status::Bad => text.red(),
        Status::Neutral => text.normal(),
    }
}

fn opt1(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.1}", v))
}

fn show_status(dashboard: &Dashboard<Database>) -> Result<()> {
    let Some(latest) = dashboard.latest_snapshot()? else {
        println!("{}", "No snapshots yet. Import some with `runstatus import`.".yellow());
        return Ok(());
    };

    println!("{}", format!("Training status ({})", latest.recorded_at).bold());

    let zone = latest
        .tsb
        .map(|t| format!(" ({})", TsbZone::from_tsb(t)))
        .unwrap_or_default();
    println!(
        "  Fitness (CTL)  {}",
        colored_status(opt1(latest.ctl), ctl_status(latest.ramp_rate))
    );
    println!(
        "  Fatigue (ATL)  {}",
        colored_status(opt1(latest.atl), atl_status(latest.atl, latest.ctl))
    );
    println!(
        "  Form (TSB)     {}",
        colored_status(format!("{}{}", opt1(latest.tsb), zone), tsb_status(latest.tsb))
    );
    println!(
        "  A:C ratio      {}",
        colored_status(
            latest
                .ac_ratio
                .map_or_else(|| "N/A".to_string(), |r| format!("{:.2}", r)),
            ac_status(latest.ac_ratio)
        )
    );
    if let Some(secs) = latest.sleep_secs {
        println!(
            "  Sleep          {}",
            colored_status(format_sleep(secs), sleep_status(latest.sleep_quality))
        );
    }
    if let Some(hrv) = latest.hrv {
        println!("  HRV            {:.0} ms", hrv);
    }

    let summary = dashboard.weekly_summary()?;
    println!("\n{} {}", "This week:".bold(), summary.message);

    let rec = dashboard.recommendation()?;
    println!("{} {}", "Today:".bold(), rec.recommendation);
    println!("  {}", rec.reason.dimmed());
    Ok(())
}

#[derive(Tabled)]
struct TaperRow {
    #[tabled(rename = "Week")]
    week: String,
    #[tabled(rename = "Volume")]
    volume: String,
    #[tabled(rename = "Reduction")]
    reduction: String,
    #[tabled(rename = "Projected CTL")]
    projected_ctl: String,
}

#[derive(Tabled)]
struct GoalRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Type")]
    goal_type: String,
    #[tabled(rename = "Target km")]
    target_km: String,
    #[tabled(rename = "Period start")]
    period_start: String,
    #[tabled(rename = "Created")]
    created_at: String,
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Pace")]
    pace: String,
    #[tabled(rename = "Date")]
    date: String,
}

#[derive(Tabled)]
struct ValueRow {
    #[tabled(rename = "")]
    label: String,
    #[tabled(rename = "")]
    value: String,
}

fn rows<T: Tabled>(rows: Vec<T>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn print_adherence(report: &runstatus::consistency::AdherenceReport) {
    println!("{}", report.message.bold());
    let weeks: Vec<ValueRow> = report
        .weeks
        .iter()
        .map(|w| ValueRow {
            label: w.week_start.clone(),
            value: format!(
                "{:.1} / {:.1} km {}",
                w.actual_km,
                w.planned_km,
                if w.achieved { "✓" } else { "✗" }
            ),
        })
        .collect();
    if !weeks.is_empty() {
        println!("{}", rows(weeks));
        println!("Current streak: {} weeks", report.streak);
    }
}

fn print_analysis(
    dashboard: &Dashboard<Database>,
    analysis: Analysis,
    today: NaiveDate,
    target_km: Option<f64>,
) -> Result<()> {
    match analysis {
        Analysis::Consistency => {
            let r = dashboard.consistency()?;
            match r.score {
                Some(score) => println!("Consistency: {} ({})", score.to_string().bold(), r.assessment),
                None => println!("Consistency: N/A ({})", r.reason.unwrap_or_default()),
            }
            for (label, value) in [
                ("Volume", r.volume_score),
                ("Rest", r.rest_score),
                ("Monotony", r.monotony_score),
            ] {
                if let Some(v) = value {
                    println!("  {:<9}{}", label, v);
                }
            }
        }
        Analysis::Projections => {
            let view = dashboard.projections()?;
            if let Some(message) = view.message {
                println!("{}", message);
                return Ok(());
            }
            let table: Vec<ValueRow> = view
                .projections
                .iter()
                .map(|p| ValueRow {
                    label: format!("Day {}", p.day),
                    value: format!(
                        "CTL {:.1}  ATL {:.1}  TSB {:.1}  {:?}",
                        p.ctl, p.atl, p.tsb, p.zone
                    ),
                })
                .collect();
            println!("{}", rows(table));
            if let Some(day) = view.days_to_positive_tsb {
                println!("TSB turns positive on day {}", day);
            }
        }
        Analysis::InjuryRisk => {
            let r = dashboard.injury_risk()?;
            println!("{} ({})", r.message.bold(), r.risk_level);
            for factor in &r.factors {
                println!("  {}: {} - {}", factor.factor, factor.value, factor.message);
            }
            for rec in &r.recommendations {
                println!("  → {}", rec);
            }
        }
        Analysis::Correlations => {
            let r = dashboard.correlations()?;
            println!("{}", r.message.bold());
            for insight in &r.insights {
                println!("  {}: {}", insight.title.cyan(), insight.description);
                println!("    → {}", insight.recommendation);
            }
        }
        Analysis::Race => {
            let r = dashboard.race_predictions()?;
            println!("{}", r.message);
            let table: Vec<ValueRow> = r
                .predictions
                .iter()
                .map(|p| ValueRow {
                    label: p.distance.clone(),
                    value: format!("{} ({})", p.predicted_time, p.predicted_pace),
                })
                .collect();
            if !table.is_empty() {
                println!("{}", rows(table));
            }
        }
        Analysis::Summary => {
            let s = dashboard.weekly_summary()?;
            println!("{} (TSB {})", s.message, s.tsb_trend);
        }
        Analysis::Adherence => {
            print_adherence(&dashboard.goal_adherence(target_km.unwrap_or(0.0))?);
        }
        Analysis::Readiness => {
            let r = dashboard.readiness()?;
            println!("Readiness: {} ({})", r.score.to_string().bold(), r.label);
            let c = r.components;
            for (label, value) in [
                ("TSB", c.tsb),
                ("HRV trend", c.hrv_trend),
                ("Sleep", c.sleep),
                ("Fatigue", c.fatigue),
                ("Soreness", c.soreness),
            ] {
                println!("  {:<10}{:.0}", label, value);
            }
        }
        Analysis::Suggestion => {
            let s = dashboard.workout_suggestion(today)?;
            println!("{}", s.title.bold());
            println!("  {}", s.description);
            if s.duration_min > 0 {
                println!("  ~{} min", s.duration_min);
            }
        }
        Analysis::Overload => {
            let r = dashboard.overload()?;
            let table: Vec<ValueRow> = r
                .weeks
                .iter()
                .map(|w| ValueRow {
                    label: w.label.clone(),
                    value: format!(
                        "{:.1} km vs {:.1} km ({:+.1}%){}",
                        w.current_km,
                        w.previous_km,
                        w.change_pct,
                        if w.flagged { " ⚠" } else { "" }
                    ),
                })
                .collect();
            if !table.is_empty() {
                println!("{}", rows(table));
            }
            println!("{}", r.recommendation);
        }
        Analysis::Zones => {
            let z = dashboard.training_zones()?;
            let hr: Vec<ValueRow> = z
                .hr_zones
                .iter()
                .map(|h| ValueRow {
                    label: h.zone.clone(),
                    value: format!("{}-{} bpm", h.hr_low, h.hr_high),
                })
                .collect();
            let pace: Vec<ValueRow> = z
                .pace_zones
                .iter()
                .map(|p| ValueRow {
                    label: p.zone.clone(),
                    value: format!("{} - {}", p.pace_low, p.pace_high),
                })
                .collect();
            if hr.is_empty() && pace.is_empty() {
                println!("Need resting/max HR or critical speed for zones");
            }
            if !hr.is_empty() {
                println!("{}\n{}", "Heart rate zones".bold(), rows(hr));
            }
            if !pace.is_empty() {
                println!("{}\n{}", "Pace zones".bold(), rows(pace));
            }
        }
        Analysis::HrDrift => {
            let r = dashboard.hr_drift()?;
            println!("{} ({})", r.message, r.trend);
        }
        Analysis::Sleep => {
            let r = dashboard.sleep_insights()?;
            println!("{}", r.message.bold());
            for insight in &r.insights {
                println!("  {}: {}", insight.title.cyan(), insight.finding);
                println!("    → {}", insight.recommendation);
            }
        }
        Analysis::Detraining => {
            let view = dashboard.detraining()?;
            println!("{}", view.message);
            let table: Vec<ValueRow> = view
                .points
                .iter()
                .map(|p| ValueRow {
                    label: format!("Week {}", p.week),
                    value: format!("CTL {:.1} (-{:.0}%)  TSB {:.1}", p.ctl, p.ctl_pct_lost, p.tsb),
                })
                .collect();
            if !table.is_empty() {
                println!("{}", rows(table));
            }
        }
        Analysis::Recommendation => {
            let r = dashboard.recommendation()?;
            println!("{}", r.recommendation.bold());
            println!("  {}", r.reason);
        }
    }
    Ok(())
}
