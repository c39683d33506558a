use chrono::format::{Item, StrftimeItems};
use chrono::{Months, NaiveDate};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use freelance::analytics::{
    aggregate_with, parse_payment_amount, parse_payments, parse_wire_date, render_bars, BarRow,
    DashboardSummary, EarningsSeries, ParsedPayments, WindowMode,
};
use freelance::api::{
    payments_from_value, projects_from_value, ApiClient, PaymentInput, PaymentStatus, Project,
    ProjectInput, ProjectStatus, ProjectUpdate, RawPayment,
};
use freelance::config::{
    clear_session, config_dir, ensure_initialized, init_config_dir, load_config, load_session,
    require_session, save_session, Config,
};
use freelance::csv_io::{read_projects, write_projects};
use freelance::error::{FreelanceError, Result};

const CHART_WIDTH: usize = 40;

#[derive(Parser)]
#[command(name = "freelance")]
#[command(version, about = "Freelancer project and payment manager", long_about = None)]
struct Cli {
    /// Path to config directory (default: XDG config dir or ~/.freelance)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Show debug logs
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template config.toml
    Init,

    /// Create an account on the server
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Sign in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show who is signed in
    Whoami,

    /// List projects
    Projects {
        /// Read projects from a JSON file instead of the server
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Add, edit or delete a project
    Project {
        #[command(subcommand)]
        action: ProjectCommand,
    },

    /// Show the payments ledger
    Payments {
        /// Read payments from a JSON file instead of the server
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Record a payment for a project
    Pay {
        /// Project ID
        project: String,

        /// Payment amount
        amount: f64,

        /// Payment date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,

        /// paid or unpaid (default: unpaid)
        #[arg(long)]
        status: Option<PaymentStatus>,
    },

    /// Monthly earnings for the last twelve months
    Earnings {
        /// Read payments from a JSON file instead of the server
        #[arg(long)]
        file: Option<PathBuf>,

        /// Reference date (YYYY-MM-DD, default: today)
        #[arg(long)]
        as_of: Option<String>,

        /// month-of-year or rolling (default: from config.toml)
        #[arg(long)]
        window: Option<WindowMode>,

        /// Print the series as JSON
        #[arg(long)]
        json: bool,
    },

    /// Project and payment counts with earnings charts
    Dashboard {
        /// Read projects from a JSON file instead of the server
        #[arg(long)]
        projects_file: Option<PathBuf>,

        /// Read payments from a JSON file instead of the server
        #[arg(long)]
        payments_file: Option<PathBuf>,

        /// Reference date (YYYY-MM-DD, default: today)
        #[arg(long)]
        as_of: Option<String>,

        /// month-of-year or rolling (default: from config.toml)
        #[arg(long)]
        window: Option<WindowMode>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export projects as CSV
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Read projects from a JSON file instead of the server
        #[arg(long)]
        projects_file: Option<PathBuf>,
    },

    /// Create projects from a CSV file (id,name,duedate,status)
    Import {
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// Create a project
    Add {
        #[arg(long)]
        name: String,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: String,

        /// Active or Completed
        #[arg(long)]
        status: ProjectStatus,
    },

    /// Update fields of an existing project
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        status: Option<ProjectStatus>,
    },

    /// Delete a project
    Delete { id: String },
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr. RUST_LOG overrides the -v/-q level.
fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set up logging: {e}");
    }
}

fn run(cli: Cli) -> Result<()> {
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };
    debug!(config_dir = %cfg_dir.display(), "using config directory");

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Register {
            name,
            email,
            password,
        } => cmd_register(&cfg_dir, &name, &email, &password),
        Commands::Login { email, password } => cmd_login(&cfg_dir, &email, &password),
        Commands::Logout => cmd_logout(&cfg_dir),
        Commands::Whoami => cmd_whoami(&cfg_dir),
        Commands::Projects { file } => cmd_projects(&cfg_dir, file.as_deref()),
        Commands::Project { action } => match action {
            ProjectCommand::Add { name, due, status } => {
                cmd_project_add(&cfg_dir, &name, &due, status)
            }
            ProjectCommand::Edit {
                id,
                name,
                due,
                status,
            } => cmd_project_edit(&cfg_dir, &id, name, due, status),
            ProjectCommand::Delete { id } => cmd_project_delete(&cfg_dir, &id),
        },
        Commands::Payments { file } => cmd_payments(&cfg_dir, file.as_deref()),
        Commands::Pay {
            project,
            amount,
            date,
            status,
        } => cmd_pay(&cfg_dir, &project, amount, date, status),
        Commands::Earnings {
            file,
            as_of,
            window,
            json,
        } => cmd_earnings(&cfg_dir, file.as_deref(), as_of, window, json),
        Commands::Dashboard {
            projects_file,
            payments_file,
            as_of,
            window,
            json,
        } => cmd_dashboard(
            &cfg_dir,
            projects_file.as_deref(),
            payments_file.as_deref(),
            as_of,
            window,
            json,
        ),
        Commands::Export {
            output,
            projects_file,
        } => cmd_export(&cfg_dir, output, projects_file.as_deref()),
        Commands::Import { file } => cmd_import(&cfg_dir, &file),
    }
}

/// Check the config dir exists and load config.toml
fn load(cfg_dir: &Path) -> Result<Config> {
    ensure_initialized(cfg_dir)?;
    load_config(cfg_dir)
}

/// Client carrying the stored session; fails when logged out
fn authed_client(cfg_dir: &Path, config: &Config) -> Result<ApiClient> {
    let session = require_session(cfg_dir)?;
    Ok(ApiClient::new(&config.api, Some(&session)))
}

fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| FreelanceError::InputParse {
        path: path.to_path_buf(),
        source: e,
    })
}

fn fetch_projects(cfg_dir: &Path, config: &Config, file: Option<&Path>) -> Result<Vec<Project>> {
    match file {
        Some(path) => Ok(projects_from_value(read_json(path)?)),
        None => authed_client(cfg_dir, config)?.list_projects(),
    }
}

fn fetch_payments(cfg_dir: &Path, config: &Config, file: Option<&Path>) -> Result<Vec<RawPayment>> {
    match file {
        Some(path) => Ok(payments_from_value(read_json(path)?)),
        None => authed_client(cfg_dir, config)?.list_payments(),
    }
}

/// Validate payments and log every record left out of the totals
fn parse_and_report(raw: &[RawPayment]) -> ParsedPayments {
    let parsed = parse_payments(raw);
    for rejected in &parsed.rejected {
        warn!("Skipping {rejected}");
    }
    parsed
}

fn parse_date_arg(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| FreelanceError::InvalidDate(value.to_string()))
}

fn reference_date(as_of: Option<&str>) -> Result<NaiveDate> {
    match as_of {
        Some(s) => parse_date_arg(s),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

/// Initialize config directory with the config template
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    init_config_dir(cfg_dir)?;

    println!("Initialized freelance config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Point at your server:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!("  2. Sign in:               freelance login --email <email> --password <password>");

    Ok(())
}

fn cmd_register(cfg_dir: &Path, name: &str, email: &str, password: &str) -> Result<()> {
    let config = load(cfg_dir)?;
    ApiClient::new(&config.api, None).register(name, email, password)?;

    println!("Registered {email}. Run 'freelance login' to sign in.");
    Ok(())
}

fn cmd_login(cfg_dir: &Path, email: &str, password: &str) -> Result<()> {
    let config = load(cfg_dir)?;
    let session = ApiClient::new(&config.api, None).login(email, password)?;
    save_session(cfg_dir, &session)?;

    println!("Logged in as {email}");
    Ok(())
}

fn cmd_logout(cfg_dir: &Path) -> Result<()> {
    ensure_initialized(cfg_dir)?;
    if clear_session(cfg_dir)? {
        println!("Logged out.");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

fn cmd_whoami(cfg_dir: &Path) -> Result<()> {
    ensure_initialized(cfg_dir)?;
    let session = load_session(cfg_dir)?.ok_or(FreelanceError::NotLoggedIn)?;
    println!(
        "Logged in as {} (since {})",
        session.email,
        session
            .created_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
    );
    Ok(())
}

// Table row structs for tabled
#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "DUE")]
    due: String,
    #[tabled(rename = "STATUS")]
    status: String,
}

#[derive(Tabled)]
struct PaymentRow {
    #[tabled(rename = "PAYMENT ID")]
    id: String,
    #[tabled(rename = "PROJECT ID")]
    project: String,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
    #[tabled(rename = "STATUS")]
    status: String,
}

fn format_grouped_int(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    let mut grouped: String = out.chars().rev().collect();
    if negative {
        grouped.insert(0, '-');
    }
    grouped
}

/// Two decimals with thousands separators, e.g. ₹12,500.00
fn format_money(value: f64, currency_symbol: &str) -> String {
    let cents = (value * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let whole = format_grouped_int((cents / 100) as i64);
    format!("{sign}{currency_symbol}{whole}.{:02}", cents % 100)
}

/// Format with a user-supplied strftime string, falling back to ISO when it
/// is not a valid format.
fn format_date(date: NaiveDate, format: &str) -> String {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return date.to_string();
    }
    date.format(format).to_string()
}

/// Show a wire date in the configured format, or as-is if unparseable
fn display_wire_date(raw: &str, format: &str) -> String {
    match parse_wire_date(raw) {
        Some(date) => format_date(date, format),
        None => raw.to_string(),
    }
}

fn cmd_projects(cfg_dir: &Path, file: Option<&Path>) -> Result<()> {
    let config = load(cfg_dir)?;
    let projects = fetch_projects(cfg_dir, &config, file)?;

    if projects.is_empty() {
        println!("No projects available at the moment.");
        return Ok(());
    }

    let rows: Vec<ProjectRow> = projects
        .iter()
        .map(|p| ProjectRow {
            id: p.id.clone(),
            name: p.name.clone(),
            due: display_wire_date(&p.duedate, &config.display.date_format),
            status: p.status.clone(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    println!("Total: {} projects", projects.len());

    Ok(())
}

fn cmd_project_add(cfg_dir: &Path, name: &str, due: &str, status: ProjectStatus) -> Result<()> {
    let config = load(cfg_dir)?;
    let due = parse_date_arg(due)?;
    let input = ProjectInput {
        name: name.to_string(),
        duedate: due.format("%Y-%m-%d").to_string(),
        status,
    };

    authed_client(cfg_dir, &config)?.create_project(&input)?;
    println!("Project added: {} (due {}, {})", input.name, input.duedate, input.status);
    Ok(())
}

fn cmd_project_edit(
    cfg_dir: &Path,
    id: &str,
    name: Option<String>,
    due: Option<String>,
    status: Option<ProjectStatus>,
) -> Result<()> {
    if name.is_none() && due.is_none() && status.is_none() {
        return Err(FreelanceError::NothingToUpdate(id.to_string()));
    }

    let config = load(cfg_dir)?;
    let client = authed_client(cfg_dir, &config)?;
    let current = client.get_project(id)?;

    let duedate = match due {
        Some(d) => Some(parse_date_arg(&d)?.format("%Y-%m-%d").to_string()),
        None => None,
    };
    let input = ProjectUpdate::from_project(current, name, duedate, status);

    client.update_project(id, &input)?;
    println!("Project updated: {}", input.name);
    println!("  Due:     {}", input.duedate);
    println!("  Status:  {}", input.status);
    Ok(())
}

fn cmd_project_delete(cfg_dir: &Path, id: &str) -> Result<()> {
    let config = load(cfg_dir)?;
    authed_client(cfg_dir, &config)?.delete_project(id)?;
    println!("Project deleted: {id}");
    Ok(())
}

/// Show the payments ledger. Rows that cannot be read are still listed.
fn cmd_payments(cfg_dir: &Path, file: Option<&Path>) -> Result<()> {
    let config = load(cfg_dir)?;
    let raw = fetch_payments(cfg_dir, &config, file)?;

    if raw.is_empty() {
        println!("No payments found.");
        return Ok(());
    }

    let symbol = &config.display.currency_symbol;
    let date_format = &config.display.date_format;
    let rows: Vec<PaymentRow> = raw
        .iter()
        .map(|p| PaymentRow {
            id: p.id.clone().unwrap_or_default(),
            project: p.project_id.clone().unwrap_or_default(),
            date: match &p.date {
                Some(Value::String(s)) => display_wire_date(s, date_format),
                Some(other) => other.to_string(),
                None => "N/A".to_string(),
            },
            amount: match parse_payment_amount(p.amount.as_ref()) {
                Ok(amount) => format_money(amount, symbol),
                Err(_) => "N/A".to_string(),
            },
            status: PaymentStatus::from_wire(p.status.as_deref()).to_string(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    let parsed = parse_and_report(&raw);
    let (paid, unpaid) = parsed
        .records
        .iter()
        .fold((0.0, 0.0), |(paid, unpaid), r| match r.status {
            PaymentStatus::Paid => (paid + r.amount, unpaid),
            PaymentStatus::Unpaid => (paid, unpaid + r.amount),
        });
    println!(
        "Total: {} payments (paid {}, unpaid {})",
        raw.len(),
        format_money(paid, symbol),
        format_money(unpaid, symbol)
    );

    Ok(())
}

fn cmd_pay(
    cfg_dir: &Path,
    project: &str,
    amount: f64,
    date: Option<String>,
    status: Option<PaymentStatus>,
) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(FreelanceError::InvalidAmount(amount.to_string()));
    }

    let config = load(cfg_dir)?;
    let date = match date {
        Some(s) => parse_date_arg(&s)?,
        None => chrono::Local::now().date_naive(),
    };
    let input = PaymentInput {
        project_id: project.to_string(),
        amount,
        date: date.format("%Y-%m-%d").to_string(),
        status: status.unwrap_or(PaymentStatus::Unpaid),
    };

    authed_client(cfg_dir, &config)?.add_payment(&input)?;
    println!(
        "Recorded {} payment for project {} on {} ({})",
        format_money(amount, &config.display.currency_symbol),
        project,
        input.date,
        input.status
    );
    Ok(())
}

fn earnings_title(reference: NaiveDate, window: WindowMode) -> String {
    let start = reference
        .checked_sub_months(Months::new(11))
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_default();
    format!(
        "Monthly Earnings ({} to {}, {})",
        start,
        reference.format("%b %Y"),
        window
    )
}

fn earnings_chart(series: &EarningsSeries, currency_symbol: &str) -> String {
    let rows: Vec<BarRow> = series
        .buckets()
        .iter()
        .map(|b| BarRow::new(b.label, b.earnings, format_money(b.earnings, currency_symbol)))
        .collect();
    render_bars(&rows, CHART_WIDTH)
}

fn cmd_earnings(
    cfg_dir: &Path,
    file: Option<&Path>,
    as_of: Option<String>,
    window: Option<WindowMode>,
    json: bool,
) -> Result<()> {
    let config = load(cfg_dir)?;
    let reference = reference_date(as_of.as_deref())?;
    let window = window.unwrap_or(config.analytics.window);

    let raw = fetch_payments(cfg_dir, &config, file)?;
    let parsed = parse_and_report(&raw);
    let series = aggregate_with(&parsed.records, reference, window);

    if json {
        println!("{}", serde_json::to_string_pretty(&series)?);
        return Ok(());
    }

    let symbol = &config.display.currency_symbol;
    println!("{}", earnings_title(reference, window));
    println!("{}", earnings_chart(&series, symbol));
    println!();
    println!("Total: {}", format_money(series.total(), symbol));
    if series.has_no_earnings() {
        println!("No earnings recorded in this window.");
    }
    if !parsed.rejected.is_empty() {
        println!("Skipped {} malformed payment(s)", parsed.rejected.len());
    }

    Ok(())
}

fn cmd_dashboard(
    cfg_dir: &Path,
    projects_file: Option<&Path>,
    payments_file: Option<&Path>,
    as_of: Option<String>,
    window: Option<WindowMode>,
    json: bool,
) -> Result<()> {
    let config = load(cfg_dir)?;
    let reference = reference_date(as_of.as_deref())?;
    let window = window.unwrap_or(config.analytics.window);

    let projects = fetch_projects(cfg_dir, &config, projects_file)?;
    let raw = fetch_payments(cfg_dir, &config, payments_file)?;
    let parsed = parse_and_report(&raw);
    let summary = DashboardSummary::build(&projects, &parsed, reference, window);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Analytics Dashboard");
    println!("{}", "-".repeat(50));
    println!("Active projects:     {}", summary.active_projects);
    println!("Processed payments:  {}", summary.processed_payments);
    println!("Completed projects:  {}", summary.completed_projects);
    println!();
    println!("{}", earnings_title(reference, window));
    println!(
        "{}",
        earnings_chart(&summary.earnings, &config.display.currency_symbol)
    );
    println!();
    println!("Comparative Analysis");
    let rows: Vec<BarRow> = summary
        .project_rows()
        .iter()
        .map(|(label, count)| BarRow::new(*label, *count as f64, count.to_string()))
        .collect();
    println!("{}", render_bars(&rows, CHART_WIDTH));

    Ok(())
}

fn cmd_export(cfg_dir: &Path, output: Option<PathBuf>, projects_file: Option<&Path>) -> Result<()> {
    let config = load(cfg_dir)?;
    let projects = fetch_projects(cfg_dir, &config, projects_file)?;

    match output {
        Some(path) => {
            let file = fs::File::create(&path)?;
            write_projects(file, &projects)?;
            println!("Exported {} projects to {}", projects.len(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            write_projects(&mut handle, &projects)?;
            handle.flush()?;
        }
    }
    Ok(())
}

fn cmd_import(cfg_dir: &Path, file: &Path) -> Result<()> {
    let config = load(cfg_dir)?;
    let imported = read_projects(fs::File::open(file)?)?;

    for rejected in &imported.rejected {
        warn!("Skipping line {}: {}", rejected.line, rejected.reason);
    }

    if imported.projects.is_empty() {
        println!("No valid projects to import.");
        return Ok(());
    }

    let client = authed_client(cfg_dir, &config)?;
    for project in &imported.projects {
        client.create_project(project)?;
        debug!(name = %project.name, "imported project");
    }

    println!(
        "Imported {} projects ({} rows skipped)",
        imported.projects.len(),
        imported.rejected.len()
    );
    Ok(())
}
