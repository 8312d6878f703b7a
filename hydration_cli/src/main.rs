use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use hydration_core::recommend::{self, BmiCategory};
use hydration_core::*;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "watercheck")]
#[command(about = "Daily water intake tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's progress (default)
    Status,

    /// Log a drink
    Add {
        /// Amount in milliliters
        #[arg(allow_negative_numbers = true)]
        amount: f64,
    },

    /// Remove one of today's entries
    Remove {
        /// Entry id as shown by `status`
        id: Uuid,
    },

    /// Set the daily goal
    Goal {
        /// Goal in milliliters
        #[arg(allow_negative_numbers = true)]
        amount: f64,
    },

    /// List daily totals for a timeframe
    History {
        /// week, month or year
        #[arg(long, short, default_value = "week")]
        timeframe: Timeframe,
    },

    /// Summary statistics for a timeframe
    Stats {
        /// week, month or year
        #[arg(long, short, default_value = "week")]
        timeframe: Timeframe,
    },

    /// Export daily totals to CSV
    Export {
        /// Output file (defaults to watercheck_data.csv in the data directory)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Suggest a goal from body weight
    Recommend {
        /// Body weight in kilograms
        #[arg(long)]
        weight: f64,

        /// Height in centimeters (enables BMI output)
        #[arg(long)]
        height: Option<f64>,

        /// Set the suggested goal as the daily goal
        #[arg(long)]
        apply: bool,
    },

    /// Delete today's entries and all history
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    hydration_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    tracing::debug!(data_dir = ?data_dir, "Opening hydration store");
    let mut store = HydrationStore::open_in_dir(&data_dir, StoreOptions::from(&config))?;

    let command = cli.command.unwrap_or(Commands::Status);
    tracing::debug!(command = command.name(), "Dispatching command");
    let result = run(&mut store, command, &data_dir);
    if let Err(e) = &result {
        tracing::error!("Command failed: {}", e);
    }
    result
}

fn run(store: &mut HydrationStore, command: Commands, data_dir: &Path) -> Result<()> {
    match command {
        Commands::Status => cmd_status(store),
        Commands::Add { amount } => cmd_add(store, amount),
        Commands::Remove { id } => cmd_remove(store, id),
        Commands::Goal { amount } => cmd_goal(store, amount),
        Commands::History { timeframe } => cmd_history(store, timeframe),
        Commands::Stats { timeframe } => cmd_stats(store, timeframe),
        Commands::Export { output } => {
            let path = output.unwrap_or_else(|| data_dir.join("watercheck_data.csv"));
            cmd_export(store, path)
        }
        Commands::Recommend {
            weight,
            height,
            apply,
        } => cmd_recommend(store, weight, height, apply),
        Commands::Reset { yes } => cmd_reset(store, yes),
    }
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Status => "status",
            Commands::Add { .. } => "add",
            Commands::Remove { .. } => "remove",
            Commands::Goal { .. } => "goal",
            Commands::History { .. } => "history",
            Commands::Stats { .. } => "stats",
            Commands::Export { .. } => "export",
            Commands::Recommend { .. } => "recommend",
            Commands::Reset { .. } => "reset",
        }
    }
}

fn cmd_status(store: &HydrationStore) -> Result<()> {
    let today = store.clock().today();
    println!(
        "Today ({}): {:.0} / {:.0} ml ({:.0}%)",
        today,
        store.current_intake(),
        store.daily_goal(),
        store.progress_ratio() * 100.0
    );
    println!("  {}", band_message(store.progress_band()));

    if let Some(kind) = store.achievements().message {
        println!("  {}", achievement_message(kind));
    }

    let entries = store.today_entries();
    if entries.is_empty() {
        println!("\nNo drinks logged yet today.");
        return Ok(());
    }

    let now = store.clock().now().with_timezone(&Utc);
    println!("\nEntries:");
    for entry in entries {
        println!(
            "  {}  {:>6.0} ml  {}  ({})",
            entry.id,
            entry.amount,
            entry.time_label(&Local),
            entry.time_ago(now)
        );
    }
    Ok(())
}

fn cmd_add(store: &mut HydrationStore, amount: f64) -> Result<()> {
    let entry = store.add_entry(amount)?;
    println!("✓ Logged {:.0} ml", entry.amount);
    println!("  Id: {}", entry.id);
    println!(
        "  Today: {:.0} / {:.0} ml",
        store.current_intake(),
        store.daily_goal()
    );
    if let Some(kind) = store.achievements().message {
        println!("  {}", achievement_message(kind));
    }
    Ok(())
}

fn cmd_remove(store: &mut HydrationStore, id: Uuid) -> Result<()> {
    match store.remove_entry(id)? {
        Some(entry) => {
            println!("✓ Removed {:.0} ml", entry.amount);
            println!(
                "  Today: {:.0} / {:.0} ml",
                store.current_intake(),
                store.daily_goal()
            );
        }
        None => println!("No entry {} logged today - nothing removed.", id),
    }
    Ok(())
}

fn cmd_goal(store: &mut HydrationStore, amount: f64) -> Result<()> {
    store.update_goal(amount)?;
    println!("✓ Daily goal set to {:.0} ml", store.daily_goal());
    Ok(())
}

fn cmd_history(store: &HydrationStore, timeframe: Timeframe) -> Result<()> {
    let records = store.data_for_timeframe(timeframe);
    if records.is_empty() {
        println!("No history for the last {}.", timeframe);
        return Ok(());
    }

    println!("History ({}):", timeframe);
    for day in &records {
        println!(
            "  {}  {:>6.0} ml  {:>2} entries  {}",
            day.date.format("%Y-%m-%d %a"),
            day.total_intake,
            day.entry_count,
            if day.goal_met { "✓" } else { "·" }
        );
    }
    Ok(())
}

fn cmd_stats(store: &HydrationStore, timeframe: Timeframe) -> Result<()> {
    let stats = store.statistics(timeframe);
    let achievements = store.achievements();

    println!("Statistics ({}):", timeframe);
    println!("  Average:    {:.0} ml", stats.average_intake);
    println!("  Best day:   {:.0} ml", stats.best_day_intake);
    println!(
        "  Goal met:   {} of {} days ({:.0}%)",
        stats.goal_met_days,
        stats.total_days,
        stats.goal_met_percentage()
    );
    println!("  Streak:     {} days", achievements.streak);
    println!("  All-time best: {:.0} ml", achievements.best_day);
    Ok(())
}

fn cmd_export(store: &HydrationStore, path: PathBuf) -> Result<()> {
    let records = store.export_records();
    let count = hydration_core::export::export_to_path(&records, &path)?;
    println!("✓ Exported {} days", count);
    println!("  CSV: {}", path.display());
    Ok(())
}

fn cmd_recommend(
    store: &mut HydrationStore,
    weight: f64,
    height: Option<f64>,
    apply: bool,
) -> Result<()> {
    if let Some(height) = height {
        let bmi = recommend::bmi(weight, height)?;
        println!(
            "BMI: {:.1} ({})",
            bmi,
            bmi_label(BmiCategory::from_bmi(bmi))
        );
    }

    let goal = recommend::recommended_goal(weight)?;
    println!("Suggested daily goal: {:.0} ml", goal);

    if apply {
        store.update_goal(goal)?;
        println!("✓ Daily goal set to {:.0} ml", goal);
    }
    Ok(())
}

fn cmd_reset(store: &mut HydrationStore, yes: bool) -> Result<()> {
    if !yes {
        println!("This deletes today's entries and all history. Re-run with --yes to confirm.");
        return Ok(());
    }
    store.reset_all()?;
    println!("✓ All hydration data cleared");
    Ok(())
}

fn band_message(band: ProgressBand) -> &'static str {
    match band {
        ProgressBand::Complete => "Excellent! You've reached your goal!",
        ProgressBand::Almost => "Almost there! Keep going!",
        ProgressBand::Halfway => "Great progress! You're halfway there!",
        ProgressBand::Starting => "Stay hydrated! Every drop counts!",
    }
}

fn achievement_message(kind: AchievementKind) -> String {
    match kind {
        AchievementKind::BeatYesterday => "You drank more than yesterday!".to_string(),
        AchievementKind::Streak(days) => format!("Streak: {} days!", days),
        AchievementKind::GoalAchieved => "Goal achieved!".to_string(),
    }
}

fn bmi_label(category: BmiCategory) -> &'static str {
    match category {
        BmiCategory::Underweight => "Underweight",
        BmiCategory::Normal => "Normal weight",
        BmiCategory::Overweight => "Overweight",
        BmiCategory::Obese => "Obesity",
    }
}
