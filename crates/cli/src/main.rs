use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Context,
    chrono::{NaiveDateTime, TimeDelta},
    clap::{Parser, Subcommand},
    recast_config::{RecastConfig, Severity},
    recast_skills::{
        CreateSkillEvent, RecastPolicy, Skill, SkillDraft, SkillMutator, SkillReader,
        clock::{Clock, SystemClock},
        refresh::RefreshTicker,
        store_memory::InMemorySkillStore,
    },
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "recast", about = "Recast — skill charge tracker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (default: ./recast.toml, then ~/.config/recast/).
    #[arg(long, global = true, env = "RECAST_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed skills and print every change until Ctrl-C (default).
    Watch,
    /// Validate the config file.
    Check,
    /// Show when each seeded skill next gains a charge.
    Next,
}

fn init_telemetry(cli: &Cli, config: &RecastConfig) {
    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs || config.logging.json {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // An explicit path must load; discovery falls back to defaults.
    let config = match &cli.config {
        Some(path) => recast_config::load_config(path)?,
        None => recast_config::discover_and_load(),
    };

    init_telemetry(&cli, &config);

    info!(version = env!("CARGO_PKG_VERSION"), "recast starting");

    match cli.command {
        None | Some(Commands::Watch) => watch(config).await,
        Some(Commands::Check) => check(&config),
        Some(Commands::Next) => next(config).await,
    }
}

async fn watch(config: RecastConfig) -> anyhow::Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(InMemorySkillStore::new());
    seed(store.as_ref(), &config.skills, clock.now()).await?;

    let mut rx = store.skills();
    print_snapshot(&rx.borrow_and_update(), clock.now());

    let ticker = RefreshTicker::new(store.clone(), Arc::clone(&clock), config.refresh.interval());
    ticker.start().await;
    info!(
        skills = config.skills.len(),
        period_ms = u64::try_from(ticker.period().as_millis()).unwrap_or(u64::MAX),
        "watching skills, press Ctrl-C to stop"
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = Arc::clone(&rx.borrow_and_update());
                print_snapshot(&snapshot, clock.now());
            }
            res = &mut shutdown => {
                if let Err(e) = res {
                    warn!(error = %e, "failed to listen for Ctrl-C");
                }
                break;
            }
        }
    }

    ticker.stop().await;
    info!("recast stopped");
    Ok(())
}

fn check(config: &RecastConfig) -> anyhow::Result<()> {
    let result = recast_config::validate(config);
    for diagnostic in &result.diagnostics {
        println!("{diagnostic}");
    }
    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    println!(
        "{} skill(s), {errors} error(s), {warnings} warning(s)",
        config.skills.len()
    );
    if result.has_errors() {
        anyhow::bail!("config has {errors} error(s)");
    }
    Ok(())
}

async fn next(config: RecastConfig) -> anyhow::Result<()> {
    let now = SystemClock.now();
    let store = InMemorySkillStore::new();
    seed(&store, &config.skills, now).await?;

    for skill in store.get_all().await {
        let next = match skill.recast_at()? {
            Some(at) => {
                let left = skill.until_recast(now)?.unwrap_or_default();
                format!("{} (in {})", at.format("%Y-%m-%d %H:%M:%S"), format_remaining(left))
            },
            None => "-".to_string(),
        };
        println!(
            "{:<24} {:<28} next charge: {next}",
            skill.name().as_str(),
            describe_policy(skill.recast())
        );
    }
    Ok(())
}

async fn seed(
    store: &dyn SkillMutator,
    drafts: &[SkillDraft],
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    for (i, draft) in drafts.iter().enumerate() {
        let event = CreateSkillEvent::from_draft(draft.clone(), now)
            .with_context(|| format!("invalid skill at skills[{i}]"))?;
        store.handle_create(event).await?;
    }
    Ok(())
}

fn print_snapshot(skills: &[Arc<Skill>], now: NaiveDateTime) {
    println!("--- {} ---", now.format("%H:%M:%S"));
    for skill in skills {
        println!("{}", format_skill(skill, now));
    }
}

fn format_skill(skill: &Skill, now: NaiveDateTime) -> String {
    let status = if skill.is_full_charged() {
        "full".to_string()
    } else {
        match skill.until_recast(now) {
            Ok(Some(left)) => format!("next in {}", format_remaining(left)),
            Ok(None) => "manual".to_string(),
            Err(e) => format!("error: {e}"),
        }
    };
    format!(
        "{:<24} {:>4}/{:<4} {status}",
        skill.name().as_str(),
        skill.casting_charge(),
        skill.casting_charge_limit()
    )
}

fn describe_policy(policy: &RecastPolicy) -> String {
    match policy {
        RecastPolicy::Duration { recast_time } => {
            format!("every {}", format_remaining(*recast_time))
        },
        RecastPolicy::Daily {
            available_at,
            interval_days,
        } => format!("daily at {available_at} (+{interval_days}d)"),
        RecastPolicy::Weekly {
            recast_day_of_week,
            available_at,
            interval_weeks,
        } => format!("weekly on {recast_day_of_week} at {available_at} (+{interval_weeks}w)"),
        RecastPolicy::Manual => "manual".to_string(),
    }
}

/// `1d 02:03:04` style; overdue spans render as zero.
fn format_remaining(delta: TimeDelta) -> String {
    let secs = delta.num_seconds().max(0);
    let (days, rest) = (secs / 86_400, secs % 86_400);
    let clock = format!("{:02}:{:02}:{:02}", rest / 3600, rest % 3600 / 60, rest % 60);
    if days > 0 {
        format!("{days}d {clock}")
    } else {
        clock
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        chrono::{NaiveDate, NaiveTime, Weekday},
        recast_skills::UseSkillEvent,
    };

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn remaining_formats() {
        assert_eq!(format_remaining(TimeDelta::seconds(59)), "00:00:59");
        assert_eq!(format_remaining(TimeDelta::seconds(3_725)), "01:02:05");
        assert_eq!(format_remaining(TimeDelta::seconds(90_061)), "1d 01:01:01");
        assert_eq!(format_remaining(TimeDelta::seconds(-5)), "00:00:00");
    }

    #[test]
    fn policy_descriptions() {
        let five = NaiveTime::from_hms_opt(5, 0, 0).unwrap();
        assert_eq!(
            describe_policy(&RecastPolicy::duration(TimeDelta::seconds(90)).unwrap()),
            "every 00:01:30"
        );
        assert_eq!(
            describe_policy(&RecastPolicy::weekly(Weekday::Mon, five, 1)),
            "weekly on Mon at 05:00:00 (+1w)"
        );
        assert_eq!(describe_policy(&RecastPolicy::Manual), "manual");
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["recast", "check", "--log-level", "debug"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Check)));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));

        let cli = Cli::try_parse_from(["recast"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[tokio::test]
    async fn seeded_skill_lines() {
        let store = InMemorySkillStore::new();
        let drafts = vec![
            SkillDraft {
                name: "Dash".into(),
                casting_charge_limit: 2,
                recast: RecastPolicy::duration(TimeDelta::seconds(30)).unwrap(),
                initially_available: true,
            },
            SkillDraft {
                name: "Potion".into(),
                casting_charge_limit: 3,
                recast: RecastPolicy::Manual,
                initially_available: false,
            },
        ];
        seed(&store, &drafts, t0()).await.unwrap();

        let skills = store.get_all().await;
        let dash = skills[0].id();
        store
            .handle_use(UseSkillEvent {
                skill_id: dash,
                used_at: t0(),
            })
            .await
            .unwrap();

        let skills = store.get_all().await;
        let now = t0() + TimeDelta::seconds(10);
        assert!(format_skill(&skills[0], now).ends_with("0/2    next in 00:00:20"));
        assert!(format_skill(&skills[1], now).ends_with("manual"));
    }

    #[tokio::test]
    async fn seeding_reports_the_bad_entry() {
        let store = InMemorySkillStore::new();
        let drafts = vec![SkillDraft {
            name: "   ".into(),
            casting_charge_limit: 1,
            recast: RecastPolicy::Manual,
            initially_available: true,
        }];
        let err = seed(&store, &drafts, t0()).await.unwrap_err();
        assert!(err.to_string().contains("skills[0]"));
    }
}
