use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use coachtrack_core::trend::{recent_trend, CalendarCell, ClientCalendar, MonthCalendar};
use coachtrack_core::{
    ClientRecord, CsvImporter, Database, ImportBatch, ImportLayout, ImportPeriod, RosterQuery,
    RosterStats, StatusFilter, Trend,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Coaching client tracker CLI", long_about = None)]
struct Cli {
    /// SQLite database path
    #[arg(
        long,
        global = true,
        env = "COACHTRACK_DB",
        default_value = "coachtrack.db",
        value_hint = ValueHint::FilePath
    )]
    db: PathBuf,

    /// Verbose logging
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a tracking export and print what would be imported
    Preview(PreviewArgs),
    /// Parse a tracking export and store every client
    Import(ImportArgs),
    /// List clients, newest first
    List(ListArgs),
    /// Show one client with readings and comments
    Show(ShowArgs),
    /// Print a month of trend cells for one client
    Calendar(CalendarArgs),
    /// Record a weight reading (replaces a reading on the same date)
    AddWeight(AddWeightArgs),
    /// Add a comment to a client's file
    Comment(CommentArgs),
    /// Print roster statistics
    Stats(StatsArgs),
    /// Delete a client with its history
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
struct PeriodArgs {
    /// Year of the export's tracking month (default 2025)
    #[arg(long)]
    year: Option<i32>,

    /// Tracking month, 1-12 (default 6)
    #[arg(long)]
    month: Option<u32>,

    /// Column layout JSON overriding the default positions
    #[arg(long, value_hint = ValueHint::FilePath)]
    layout: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    /// Export file
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    #[command(flatten)]
    period: PeriodArgs,

    /// Print the parsed records as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// Export file
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    #[command(flatten)]
    period: PeriodArgs,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Status filter: all, active, inactive, yet-to-start, completed
    #[arg(long, default_value = "all")]
    status: String,

    /// Case-insensitive match on name or email
    #[arg(long, default_value = "")]
    search: String,

    /// Print as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Args, Debug)]
struct ShowArgs {
    id: String,

    /// Print as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Args, Debug)]
struct CalendarArgs {
    id: String,

    /// Year (defaults to the current year)
    #[arg(long)]
    year: Option<i32>,

    /// Month 1-12 (defaults to the current month)
    #[arg(long)]
    month: Option<u32>,
}

#[derive(Args, Debug)]
struct AddWeightArgs {
    id: String,
    /// YYYY-MM-DD
    date: String,
    /// Kilograms
    weight: f64,
}

#[derive(Args, Debug)]
struct CommentArgs {
    id: String,
    text: String,

    #[arg(long, default_value = "Coach")]
    author: String,
}

#[derive(Args, Debug)]
struct StatsArgs {
    /// Reference year for new-this-month (defaults to the current year)
    #[arg(long)]
    year: Option<i32>,

    /// Reference month for new-this-month (defaults to the current month)
    #[arg(long)]
    month: Option<u32>,

    /// Print as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Args, Debug)]
struct DeleteArgs {
    id: String,
}

fn main() {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    if let Err(err) = run(cli) {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Preview(args) => handle_preview(args),
        Command::Import(args) => handle_import(&cli.db, args),
        Command::List(args) => handle_list(&cli.db, args),
        Command::Show(args) => handle_show(&cli.db, args),
        Command::Calendar(args) => handle_calendar(&cli.db, args),
        Command::AddWeight(args) => handle_add_weight(&cli.db, args),
        Command::Comment(args) => handle_comment(&cli.db, args),
        Command::Stats(args) => handle_stats(&cli.db, args),
        Command::Delete(args) => handle_delete(&cli.db, args),
    }
}

fn open_db(path: &Path) -> Result<Database> {
    debug!(path = %path.display(), "opening database");
    Database::open(path).with_context(|| format!("failed to open database {}", path.display()))
}

fn load_client(db: &Database, id: &str) -> Result<ClientRecord> {
    db.get_client(id)?
        .ok_or_else(|| anyhow!("no client with id {}", id))
}

fn current_month() -> (i32, u32) {
    let today = Utc::now().date_naive();
    (today.year(), today.month())
}

fn build_importer(period: &PeriodArgs) -> Result<CsvImporter> {
    let defaults = ImportPeriod::default();
    let period_value = ImportPeriod::new(
        period.year.unwrap_or(defaults.year),
        period.month.unwrap_or(defaults.month),
    )?;
    let mut importer = CsvImporter::new(period_value);
    if let Some(path) = &period.layout {
        let layout = ImportLayout::from_path(path)
            .with_context(|| format!("failed to load layout {}", path.display()))?;
        importer = importer.with_layout(layout)?;
    }
    Ok(importer)
}

fn parse_export(input: &Path, period: &PeriodArgs) -> Result<ImportBatch> {
    let importer = build_importer(period).context("import failed")?;
    let bytes =
        fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    importer.parse_bytes(&bytes).context("import failed")
}

fn handle_preview(args: PreviewArgs) -> Result<()> {
    let batch = parse_export(&args.input, &args.period)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&batch.clients)?);
        return Ok(());
    }

    println!(
        "{} ({} readings, {} rows skipped)",
        batch.summary(),
        batch.entry_count(),
        batch.skipped_rows
    );
    for client in &batch.clients {
        println!(
            "  {:<24} {:<13} start {} {:>6.1} kg  current {:>6.1} kg  {} readings  issues: {}",
            client.name,
            client.status.as_str(),
            client.start_date,
            client.start_weight,
            client.current_weight.unwrap_or(client.start_weight),
            client.weight_entries.len(),
            client.health_issues.join(", ")
        );
    }
    Ok(())
}

fn handle_import(db_path: &Path, args: ImportArgs) -> Result<()> {
    let batch = parse_export(&args.input, &args.period)?;
    let mut db = open_db(db_path)?;
    let ids = db
        .create_clients(&batch.clients)
        .context("import failed")?;
    info!(
        clients = ids.len(),
        entries = batch.entry_count(),
        db = %db_path.display(),
        "import complete"
    );
    println!("{}", batch.summary());
    Ok(())
}

fn handle_list(db_path: &Path, args: ListArgs) -> Result<()> {
    let status: StatusFilter = args
        .status
        .parse()
        .with_context(|| format!("invalid --status {:?}", args.status))?;
    let db = open_db(db_path)?;
    let clients = db.list_clients()?;
    let matches = RosterQuery::new(args.search, status).apply(&clients);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }
    for client in matches {
        println!(
            "{}  {:<24} {:<28} {:<13} {:>6}  {:>4}%  {}",
            client.id,
            client.name,
            client.email,
            client.status.as_str(),
            client
                .current_weight
                .map(|w| format!("{:.1}", w))
                .unwrap_or_else(|| "-".into()),
            client.progress_percent(),
            recent_trend(&client.weight_entries).as_str()
        );
    }
    Ok(())
}

fn handle_show(db_path: &Path, args: ShowArgs) -> Result<()> {
    let db = open_db(db_path)?;
    let client = load_client(&db, &args.id)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&client)?);
        return Ok(());
    }

    println!("{} <{}>", client.name, client.email);
    println!("  status:        {}", client.status);
    println!("  start:         {} at {:.1} kg", client.start_date, client.start_weight);
    if let Some(current) = client.current_weight {
        println!("  current:       {:.1} kg", current);
    }
    if let Some(goal) = client.goal_weight {
        println!("  goal:          {:.1} kg ({}% there)", goal, client.progress_percent());
    }
    if let Some(end) = &client.diet_end_date {
        println!("  diet ends:     {}", end);
    }
    println!("  health issues: {}", client.health_issues.join(", "));
    if !client.notes.is_empty() {
        println!("  notes:         {}", client.notes);
    }

    println!("readings:");
    for entry in client.sorted_entries() {
        println!("  {}  {:.1}", entry.date, entry.weight);
    }
    if !client.comments.is_empty() {
        println!("comments:");
        for comment in &client.comments {
            println!("  [{}] {}: {}", comment.timestamp, comment.author, comment.text);
        }
    }
    Ok(())
}

fn cell_symbol(cell: &CalendarCell) -> char {
    match cell {
        CalendarCell::NotStarted => '~',
        CalendarCell::Empty => ' ',
        CalendarCell::Recorded { trend, .. } => match trend {
            Trend::Progressing => '+',
            Trend::Stagnant => '=',
            Trend::Regressing => '!',
            Trend::Neutral => '.',
        },
    }
}

fn print_calendar(calendar: &MonthCalendar) {
    println!("{}-{:02}", calendar.year, calendar.month);
    println!(" Mo   Tu   We   Th   Fr   Sa   Su");

    let offset = calendar
        .days
        .first()
        .map(|d| d.date.weekday().num_days_from_monday() as usize)
        .unwrap_or(0);
    let mut line = "     ".repeat(offset);
    for day in &calendar.days {
        line.push_str(&format!(" {:>2}{} ", day.date.day(), cell_symbol(&day.cell)));
        if day.date.weekday().num_days_from_monday() == 6 {
            println!("{}", line.trim_end());
            line.clear();
        }
    }
    if !line.is_empty() {
        println!("{}", line.trim_end());
    }

    println!();
    println!("  + progressing  = stagnant  ! regressing  . no trend  ~ not started");
    println!(
        "  {} progressing, {} stagnant, {} regressing",
        calendar.count(Trend::Progressing),
        calendar.count(Trend::Stagnant),
        calendar.count(Trend::Regressing)
    );
}

fn handle_calendar(db_path: &Path, args: CalendarArgs) -> Result<()> {
    let (this_year, this_month) = current_month();
    let year = args.year.unwrap_or(this_year);
    let month = args.month.unwrap_or(this_month);

    let db = open_db(db_path)?;
    let client = load_client(&db, &args.id)?;
    let calendar = ClientCalendar::new(&client)
        .month(year, month)
        .ok_or_else(|| anyhow!("invalid month {}-{:02}", year, month))?;

    println!("{}", client.name);
    print_calendar(&calendar);
    Ok(())
}

fn handle_add_weight(db_path: &Path, args: AddWeightArgs) -> Result<()> {
    NaiveDate::parse_from_str(&args.date, "%Y-%m-%d")
        .with_context(|| format!("invalid date {:?}, expected YYYY-MM-DD", args.date))?;
    let mut db = open_db(db_path)?;
    let entry = db
        .add_weight_entry(&args.id, &args.date, args.weight)
        .context("failed to record weight")?;
    println!("recorded {:.1} kg on {}", entry.weight, entry.date);
    Ok(())
}

fn handle_comment(db_path: &Path, args: CommentArgs) -> Result<()> {
    let db = open_db(db_path)?;
    let comment = db
        .add_comment(&args.id, &args.text, &args.author)
        .context("failed to add comment")?;
    println!("added comment {}", comment.id);
    Ok(())
}

fn handle_stats(db_path: &Path, args: StatsArgs) -> Result<()> {
    let (this_year, this_month) = current_month();
    let reference = (args.year.unwrap_or(this_year), args.month.unwrap_or(this_month));

    let db = open_db(db_path)?;
    let clients = db.list_clients()?;
    let stats = RosterStats::compute(&clients, Some(reference));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    println!("total:          {}", stats.total);
    println!("active:         {}", stats.active);
    println!("inactive:       {}", stats.inactive);
    println!("yet to start:   {}", stats.yet_to_start);
    println!("completed:      {}", stats.completed);
    println!(
        "new {}-{:02}:    {}",
        reference.0, reference.1, stats.new_this_month
    );
    Ok(())
}

fn handle_delete(db_path: &Path, args: DeleteArgs) -> Result<()> {
    let db = open_db(db_path)?;
    if db.delete_client(&args.id)? {
        println!("deleted {}", args.id);
        Ok(())
    } else {
        Err(anyhow!("no client with id {}", args.id))
    }
}
