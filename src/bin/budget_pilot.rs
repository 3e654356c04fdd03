//! CLI front end for the budget-pilot expense ledger.

use std::io::{self, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use budget_pilot::ledger::{ExpenseFilter, LedgerStore};
use budget_pilot::models::{
    Budget, BudgetUpdate, Category, Currency, Expense, ExpenseId, Ledger, NaiveDate, Valuation,
};
use budget_pilot::rates::{FrankfurterClient, RateProvider, RateQuery, lookup};
use budget_pilot::rebase::{RebaseReport, change_base_currency};
use budget_pilot::report::{self, Summary};
use budget_pilot::storage::{FileStorage, Storage};
use budget_pilot::synth;
use clap::{Args, Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::runtime::Runtime;

/// Environment variable overriding the exchange-rate API base URL.
const RATES_URL_ENV: &str = "BUDGET_PILOT_RATES_URL";

/// Number of expenses shown in the summary's recent list.
const RECENT_COUNT: usize = 5;

/// Placeholder for empty table cells.
const EMPTY_CELL: &str = "\u{2014}";

/// Budget Pilot: track travel expenses against a budget in any currency.
#[derive(Debug, Parser)]
#[command(name = "budget-pilot", version, about)]
struct Cli {
    /// Override the storage directory (default: XDG data dir).
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Show spending against the budget, statistics, per-category
    /// totals, and the most recent expenses.
    Summary,
    /// List expenses, optionally filtered.
    List(ListArgs),
    /// Show every detail of one expense.
    Show {
        /// Identifier of the expense.
        id: String,
    },
    /// Record a new expense.
    Add(AddArgs),
    /// Remove an expense by id.
    Remove {
        /// Identifier of the expense to remove.
        id: String,
    },
    /// Remove every expense.
    Reset,
    /// Show or change the budget. Changing the currency re-prices every
    /// expense with current exchange rates.
    Budget {
        /// New spending limit.
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<f64>,
        /// New base currency (ISO code).
        #[arg(long)]
        currency: Option<Currency>,
    },
    /// Add randomly generated sample expenses.
    Demo {
        /// How many expenses to generate.
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
    /// Show spending per day.
    Daily,
}

/// Arguments for the `list` subcommand.
#[derive(Debug, Args)]
struct ListArgs {
    /// Text to look for in the title or location (case-insensitive).
    #[arg(long)]
    search: Option<String>,
    /// Only show this category.
    #[arg(long)]
    category: Option<Category>,
    /// Start date (inclusive, YYYY-MM-DD). Requires --to.
    #[arg(long, requires = "to", value_parser = parse_date)]
    from: Option<NaiveDate>,
    /// End date (inclusive, YYYY-MM-DD). Requires --from.
    #[arg(long, requires = "from", value_parser = parse_date)]
    to: Option<NaiveDate>,
}

/// Arguments for the `add` subcommand.
#[derive(Debug, Args)]
struct AddArgs {
    /// Short title.
    #[arg(long)]
    title: String,
    /// Amount, in `--currency` (default: the budget currency).
    #[arg(long, allow_negative_numbers = true)]
    amount: f64,
    /// Category (English or stored label).
    #[arg(long)]
    category: Category,
    /// Transaction date (YYYY-MM-DD, default: today).
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
    /// Currency the amount was paid in.
    #[arg(long)]
    currency: Option<Currency>,
    /// Where the money was spent.
    #[arg(long)]
    location: Option<String>,
    /// Free-form notes.
    #[arg(long)]
    description: Option<String>,
}

/// Everything a subcommand needs.
#[derive(Debug)]
struct App<S, P> {
    /// Ledger state.
    store: LedgerStore<S>,
    /// Exchange-rate source.
    rates: Arc<P>,
    /// Runtime driving rate lookups.
    runtime: Runtime,
    /// Current local date.
    today: NaiveDate,
}

/// Parses a date string in `YYYY-MM-DD` format for clap.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|err| format!("{err}"))
}

/// Runs the CLI, returning an appropriate exit code.
fn run() -> io::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let _dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let storage = match create_storage(cli.data_dir) {
        Ok(storage) => storage,
        Err(err) => return report_error("failed to initialize storage", &err),
    };

    let rates = match create_rate_client() {
        Ok(client) => client,
        Err(err) => return report_error("failed to build rate client", &err),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let today = chrono::Local::now().date_naive();
    let mut app = App {
        store: LedgerStore::load_with_seed(storage, Ledger::demo(today)),
        rates: Arc::new(rates),
        runtime,
        today,
    };
    dispatch(&mut app, cli.command)
}

/// Creates the storage backend, using `data_dir` if provided or the
/// default XDG data directory otherwise.
fn create_storage(data_dir: Option<PathBuf>) -> budget_pilot::error::Result<FileStorage> {
    let dir = match data_dir {
        Some(dir) => dir,
        None => FileStorage::default_dir()?,
    };
    FileStorage::new(dir)
}

/// Builds the exchange-rate client, honouring [`RATES_URL_ENV`].
fn create_rate_client() -> budget_pilot::error::Result<FrankfurterClient> {
    let mut builder = FrankfurterClient::builder();
    if let Ok(url) = std::env::var(RATES_URL_ENV)
        && !url.is_empty()
    {
        builder = builder.base_url(url);
    }
    builder.build()
}

/// Dispatches to the appropriate subcommand handler.
fn dispatch<S: Storage, P: RateProvider + 'static>(
    app: &mut App<S, P>,
    command: Command,
) -> io::Result<ExitCode> {
    match command {
        Command::Summary => cmd_summary(app),
        Command::List(args) => cmd_list(app, &args),
        Command::Show { id } => cmd_show(app, &ExpenseId::new(id)),
        Command::Add(args) => cmd_add(app, args),
        Command::Remove { id } => cmd_remove(app, &ExpenseId::new(id)),
        Command::Reset => cmd_reset(app),
        Command::Budget { limit, currency } => cmd_budget(app, BudgetUpdate { total_limit: limit, currency }),
        Command::Demo { count } => cmd_demo(app, count),
        Command::Daily => cmd_daily(app),
    }
}

/// Prints an error with context to stderr and returns a failure code.
fn report_error<E: core::fmt::Display>(context: &str, err: &E) -> io::Result<ExitCode> {
    writeln!(
        io::stderr().lock(),
        "{} {context}: {err}",
        "error:".red().bold()
    )?;
    Ok(ExitCode::FAILURE)
}

/// Executes the `summary` subcommand.
fn cmd_summary<S: Storage, P>(app: &App<S, P>) -> io::Result<ExitCode> {
    let ledger = app.store.ledger();
    print_summary(&Summary::of(ledger))?;
    print_statistics(&ledger.expenses, ledger.budget.currency)?;
    print_category_table(&report::category_totals(&ledger.expenses), ledger.budget.currency)?;
    let recent: Vec<&Expense> = report::recent(&ledger.expenses, RECENT_COUNT).iter().collect();
    print_expenses_table("Recent expenses", &recent, ledger.budget.currency)?;
    Ok(ExitCode::SUCCESS)
}

/// Builds an [`ExpenseFilter`] from CLI arguments.
fn build_expense_filter(args: &ListArgs) -> ExpenseFilter {
    let mut filter = ExpenseFilter::new();
    if let Some(text) = args.search.as_deref() {
        filter = filter.search(text);
    }
    if let Some(category) = args.category {
        filter = filter.category(category);
    }
    if let Some((from_date, to_date)) = args.from.zip(args.to) {
        filter = filter.date_range(from_date, to_date);
    }
    filter
}

/// Executes the `list` subcommand.
fn cmd_list<S: Storage, P>(app: &App<S, P>, args: &ListArgs) -> io::Result<ExitCode> {
    let filter = build_expense_filter(args);
    let expenses = app.store.filter_expenses(&filter);
    print_expenses_table("Expenses", &expenses, app.store.budget().currency)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `show` subcommand.
fn cmd_show<S: Storage, P>(app: &App<S, P>, id: &ExpenseId) -> io::Result<ExitCode> {
    match app.store.expense(id) {
        Some(expense) => {
            print_expense_details(expense, app.store.budget().currency)?;
            Ok(ExitCode::SUCCESS)
        }
        None => report_error("no such expense", id),
    }
}

/// Executes the `add` subcommand.
///
/// An amount in a foreign currency is converted with the historical rate
/// of the expense date; if no rate is available nothing is recorded.
fn cmd_add<S: Storage, P: RateProvider>(app: &mut App<S, P>, args: AddArgs) -> io::Result<ExitCode> {
    if !args.amount.is_finite() || args.amount <= 0.0 {
        return report_error("invalid amount", &args.amount);
    }
    let base = app.store.budget().currency;
    let date = args.date.unwrap_or(app.today);
    let currency = args.currency.unwrap_or(base);

    let valuation = if currency == base {
        Valuation::Native {
            amount: args.amount,
        }
    } else {
        let query = RateQuery::historical(currency, base, date);
        match app.runtime.block_on(lookup(app.rates.as_ref(), query)) {
            Ok(rate) => Valuation::converted(args.amount, currency, rate),
            Err(err) => return report_error("failed to convert amount", &err),
        }
    };

    let mut expense = Expense::new(args.title, date, args.category, valuation);
    if let Some(location) = args.location {
        expense = expense.with_location(location);
    }
    if let Some(description) = args.description {
        expense = expense.with_description(description);
    }
    let id = expense.id.clone();
    let amount = expense.amount();

    match app.store.add_expense(expense) {
        Ok(()) => {
            writeln!(
                io::stdout().lock(),
                "{} {} {}",
                "Added".green().bold(),
                format_args!("{amount:.2} {base}").bold(),
                format_args!("(id {id})").dimmed()
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_error("failed to save expense", &err),
    }
}

/// Executes the `remove` subcommand.
fn cmd_remove<S: Storage, P>(app: &mut App<S, P>, id: &ExpenseId) -> io::Result<ExitCode> {
    match app.store.remove_expense(id) {
        Ok(Some(expense)) => {
            writeln!(
                io::stdout().lock(),
                "{} {}",
                "Removed".green().bold(),
                expense.title
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Ok(None) => {
            writeln!(
                io::stdout().lock(),
                "{}",
                format_args!("No expense with id {id}.").dimmed()
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_error("failed to remove expense", &err),
    }
}

/// Executes the `reset` subcommand.
fn cmd_reset<S: Storage, P>(app: &mut App<S, P>) -> io::Result<ExitCode> {
    let count = app.store.expenses().len();
    match app.store.reset_expenses() {
        Ok(()) => {
            writeln!(
                io::stdout().lock(),
                "{} {}",
                "Cleared".green().bold(),
                format_args!("({count} expenses)").dimmed()
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_error("failed to reset expenses", &err),
    }
}

/// Executes the `budget` subcommand: shows the budget, or applies a
/// change and re-prices expenses when the currency changes.
fn cmd_budget<S: Storage, P: RateProvider + 'static>(
    app: &mut App<S, P>,
    update: BudgetUpdate,
) -> io::Result<ExitCode> {
    if update.total_limit.is_none() && update.currency.is_none() {
        print_budget(app.store.budget())?;
        return Ok(ExitCode::SUCCESS);
    }

    let spinner = make_spinner("Updating budget...");
    let result = app.runtime.block_on(change_base_currency(
        &mut app.store,
        Arc::clone(&app.rates),
        update,
    ));
    spinner.finish_and_clear();

    match result {
        Ok(rebase) => {
            print_budget(app.store.budget())?;
            print_rebase_report(&rebase)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_error("budget update failed", &err),
    }
}

/// Executes the `demo` subcommand: adds `count` random expenses.
fn cmd_demo<S: Storage, P: RateProvider>(app: &mut App<S, P>, count: usize) -> io::Result<ExitCode> {
    let mut rng = rand::rng();
    let base = app.store.budget().currency;
    let mut added = Vec::with_capacity(count);
    for _ in 0..count {
        let expense = app.runtime.block_on(synth::random_expense(
            &mut rng,
            app.rates.as_ref(),
            base,
            app.today,
        ));
        if let Err(err) = app.store.add_expense(expense.clone()) {
            return report_error("failed to save expense", &err);
        }
        added.push(expense);
    }
    let rows: Vec<&Expense> = added.iter().collect();
    print_expenses_table("Generated", &rows, base)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `daily` subcommand.
fn cmd_daily<S: Storage, P>(app: &App<S, P>) -> io::Result<ExitCode> {
    let totals = report::daily_totals(app.store.expenses());
    print_daily_table(&totals, app.store.budget().currency)?;
    Ok(ExitCode::SUCCESS)
}

// ── Output formatting ────────────────────────────────────────────────

/// Returns the color matching how much of the budget is used.
fn usage_color(percent_used: f64) -> Color {
    if percent_used >= 100.0 {
        Color::Red
    } else if percent_used >= 80.0 {
        Color::Yellow
    } else {
        Color::Green
    }
}

/// Prints the budget summary.
fn print_summary(summary: &Summary) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let currency = summary.currency;

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.add_row(vec![
        Cell::new("Budget").fg(Color::Cyan),
        Cell::new(format!("{:.2} {currency}", summary.limit)),
    ]);
    _ = table.add_row(vec![
        Cell::new("Spent").fg(Color::Cyan),
        Cell::new(format!(
            "{:.2} {currency} ({:.1}%)",
            summary.total_spent, summary.percent_used
        ))
        .fg(usage_color(summary.percent_used)),
    ]);
    let remaining_cell = Cell::new(format!("{:.2} {currency}", summary.remaining));
    _ = table.add_row(vec![
        Cell::new("Remaining").fg(Color::Cyan),
        if summary.is_over_budget() {
            remaining_cell.fg(Color::Red)
        } else {
            remaining_cell
        },
    ]);

    writeln!(out, "{}", "Summary".green().bold())?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints the transaction count, average expense, and top category.
fn print_statistics(expenses: &[Expense], currency: Currency) -> io::Result<()> {
    let average = report::average(expenses).unwrap_or(0.0);
    let top_cell = match report::top_category(expenses) {
        Some((category, total)) => Cell::new(format!("{category} ({total:.2} {currency})")),
        None => Cell::new(EMPTY_CELL).fg(Color::DarkGrey),
    };

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.add_row(vec![
        Cell::new("Transactions").fg(Color::Cyan),
        Cell::new(expenses.len()),
    ]);
    _ = table.add_row(vec![
        Cell::new("Average expense").fg(Color::Cyan),
        Cell::new(format!("{average:.2} {currency}")),
    ]);
    _ = table.add_row(vec![Cell::new("Top category").fg(Color::Cyan), top_cell]);

    let mut out = io::stdout().lock();
    writeln!(out)?;
    writeln!(out, "{}", "Statistics".green().bold())?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints every field of one expense.
fn print_expense_details(expense: &Expense, currency: Currency) -> io::Result<()> {
    let optional = |value: Option<&str>| match value {
        Some(text) => Cell::new(text),
        None => Cell::new(EMPTY_CELL).fg(Color::DarkGrey),
    };

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.add_row(vec![Cell::new("ID").fg(Color::Cyan), Cell::new(&expense.id)]);
    _ = table.add_row(vec![Cell::new("Date").fg(Color::Cyan), Cell::new(expense.date)]);
    _ = table.add_row(vec![Cell::new("Category").fg(Color::Cyan), Cell::new(expense.category)]);
    _ = table.add_row(vec![
        Cell::new("Amount").fg(Color::Cyan),
        Cell::new(format!("{:.2} {currency}", expense.amount())).fg(Color::Red),
    ]);
    if let Valuation::Converted {
        original_amount,
        original_currency,
        exchange_rate,
        ..
    } = expense.valuation
    {
        _ = table.add_row(vec![
            Cell::new("Original amount").fg(Color::Cyan),
            Cell::new(format!("{original_amount:.2} {original_currency}")),
        ]);
        _ = table.add_row(vec![
            Cell::new("Exchange rate").fg(Color::Cyan),
            Cell::new(format!("1 {original_currency} = {exchange_rate:.4} {currency}")),
        ]);
    }
    _ = table.add_row(vec![
        Cell::new("Location").fg(Color::Cyan),
        optional(expense.location.as_deref()),
    ]);
    _ = table.add_row(vec![
        Cell::new("Description").fg(Color::Cyan),
        optional(expense.description.as_deref()),
    ]);
    _ = table.add_row(vec![
        Cell::new("Receipt").fg(Color::Cyan),
        optional(expense.receipt_image.as_deref()),
    ]);

    let mut out = io::stdout().lock();
    writeln!(out, "{}", expense.title.green().bold())?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints the budget configuration.
fn print_budget(budget: &Budget) -> io::Result<()> {
    writeln!(
        io::stdout().lock(),
        "{} {}",
        "Budget:".bold(),
        format_args!("{:.2} {} ({})", budget.total_limit, budget.currency, budget.currency.name())
    )
}

/// Prints the result of a rebase.
fn print_rebase_report(rebase: &RebaseReport) -> io::Result<()> {
    if rebase.converted == 0 && rebase.is_complete() {
        return Ok(());
    }
    let mut out = io::stdout().lock();
    writeln!(
        out,
        "{} {}",
        "Re-priced".green().bold(),
        format_args!("{} expenses", rebase.converted)
    )?;
    if !rebase.is_complete() {
        let ids: Vec<&str> = rebase.skipped.iter().map(ExpenseId::as_inner).collect();
        writeln!(
            out,
            "{} no exchange rate for {} expenses, left unchanged: {}",
            "warning:".yellow().bold(),
            rebase.skipped.len(),
            ids.join(", ")
        )?;
    }
    Ok(())
}

/// Prints per-category totals with their share of all spending.
fn print_category_table(totals: &[(Category, f64)], currency: Currency) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if totals.is_empty() {
        return Ok(());
    }
    let grand_total: f64 = totals.iter().map(|entry| entry.1).sum();

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Category").fg(Color::Cyan),
        Cell::new(format!("Total ({currency})")).fg(Color::Cyan),
        Cell::new("Share").fg(Color::Cyan),
    ]);
    for &(category, total) in totals {
        let share = if grand_total > 0.0 {
            total / grand_total * 100.0
        } else {
            0.0
        };
        _ = table.add_row(vec![
            Cell::new(category),
            Cell::new(format!("{total:.2}")),
            Cell::new(format!("{share:.1}%")),
        ]);
    }

    writeln!(out)?;
    writeln!(out, "{}", "By category".green().bold())?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints expenses in a table.
fn print_expenses_table(title: &str, expenses: &[&Expense], currency: Currency) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if expenses.is_empty() {
        writeln!(out, "{}", "No expenses found.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Date").fg(Color::Cyan),
        Cell::new("Title").fg(Color::Cyan),
        Cell::new("Category").fg(Color::Cyan),
        Cell::new("Location").fg(Color::Cyan),
        Cell::new(format!("Amount ({currency})")).fg(Color::Cyan),
        Cell::new("Original").fg(Color::Cyan),
    ]);

    for expense in expenses {
        let original_cell = match expense.valuation {
            Valuation::Converted {
                original_amount,
                original_currency,
                exchange_rate,
                ..
            } => Cell::new(format!(
                "{original_amount:.2} {original_currency} @ {exchange_rate:.4}"
            )),
            Valuation::Native { .. } => Cell::new(EMPTY_CELL).fg(Color::DarkGrey),
        };
        _ = table.add_row(vec![
            Cell::new(&expense.id).fg(Color::DarkGrey),
            Cell::new(expense.date),
            Cell::new(&expense.title),
            Cell::new(expense.category),
            Cell::new(expense.location.as_deref().unwrap_or(EMPTY_CELL)),
            Cell::new(format!("{:.2}", expense.amount())).fg(Color::Red),
            original_cell,
        ]);
    }

    writeln!(out)?;
    writeln!(
        out,
        "{} {}",
        title.green().bold(),
        format_args!("({})", expenses.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints per-day totals in a table.
fn print_daily_table(totals: &[(NaiveDate, f64)], currency: Currency) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if totals.is_empty() {
        writeln!(out, "{}", "No expenses found.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Date").fg(Color::Cyan),
        Cell::new(format!("Total ({currency})")).fg(Color::Cyan),
    ]);
    for &(date, total) in totals {
        _ = table.add_row(vec![Cell::new(date), Cell::new(format!("{total:.2}"))]);
    }

    writeln!(
        out,
        "{} {}",
        "Daily spending".green().bold(),
        format_args!("({} days)", totals.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Creates a spinner with the given message.
fn make_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(core::time::Duration::from_millis(80));
    spinner
}

/// Entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            let _ignored = writeln!(io::stderr(), "fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use budget_pilot::rates::StaticRates;
    use budget_pilot::storage::{InMemoryStorage, Slot};

    /// Creates an app over in-memory storage with an `EUR -> PLN` rate.
    fn test_app() -> App<InMemoryStorage, StaticRates> {
        App {
            store: LedgerStore::load(InMemoryStorage::new()),
            rates: Arc::new(
                StaticRates::new()
                    .with_rate(Currency::Eur, Currency::Pln, 4.0)
                    .with_rate(Currency::Pln, Currency::Eur, 0.25),
            ),
            runtime: tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap(),
            today: NaiveDate::from_ymd_opt(2025, 8, 20).unwrap(),
        }
    }

    /// Parses a command line into a [`Command`].
    fn parse(args: &[&str]) -> Command {
        let mut argv = vec!["budget-pilot"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn parse_date_valid() {
        let date = parse_date("2024-01-15").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn parse_date_invalid() {
        assert!(parse_date("not-a-date").is_err());
        assert!(parse_date("01-15-2024").is_err());
    }

    #[test]
    fn cli_parses_add_with_labels_and_codes() {
        let Command::Add(args) = parse(&[
            "add",
            "--title",
            "Taxi",
            "--amount",
            "12.5",
            "--category",
            "nocleg",
            "--currency",
            "eur",
        ]) else {
            panic!("expected add");
        };
        assert_eq!(args.category, Category::Accommodation);
        assert_eq!(args.currency, Some(Currency::Eur));
        assert!(args.date.is_none());
    }

    #[test]
    fn cli_rejects_unknown_values() {
        assert!(
            Cli::try_parse_from(["budget-pilot", "budget", "--currency", "XYZ"]).is_err()
        );
        assert!(
            Cli::try_parse_from(["budget-pilot", "list", "--category", "Casino"]).is_err()
        );
    }

    #[test]
    fn cli_list_date_range_requires_both_ends() {
        assert!(Cli::try_parse_from(["budget-pilot", "list", "--from", "2024-01-01"]).is_err());
    }

    #[test]
    fn cli_global_data_dir() {
        let cli = Cli::try_parse_from(["budget-pilot", "summary", "--data-dir", "/tmp/x"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
    }

    #[test]
    fn create_storage_with_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = create_storage(Some(dir.path().to_path_buf()));
        assert!(storage.is_ok());
    }

    #[test]
    fn build_filter_from_args() {
        let Command::List(args) = parse(&[
            "list",
            "--search",
            "rome",
            "--category",
            "Restaurants",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-31",
        ]) else {
            panic!("expected list");
        };
        let filter = build_expense_filter(&args);
        assert_eq!(filter.search.as_deref(), Some("rome"));
        assert_eq!(filter.category, Some(Category::Restaurants));
        assert!(filter.date_from.is_some());
        assert!(filter.date_to.is_some());
    }

    #[test]
    fn add_native_expense() {
        let mut app = test_app();
        let code = dispatch(
            &mut app,
            parse(&["add", "--title", "Bread", "--amount", "8.5", "--category", "Shopping"]),
        )
        .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        let expense = app.store.expenses().first().unwrap();
        assert_eq!(expense.valuation, Valuation::Native { amount: 8.5 });
        assert_eq!(expense.date, app.today);
    }

    #[test]
    fn add_foreign_expense_is_converted() {
        let mut app = test_app();
        let code = dispatch(
            &mut app,
            parse(&[
                "add",
                "--title",
                "Museum",
                "--amount",
                "10",
                "--category",
                "Attractions",
                "--currency",
                "EUR",
                "--date",
                "2025-08-01",
                "--location",
                "Vienna",
            ]),
        )
        .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        let expense = app.store.expenses().first().unwrap();
        assert!((expense.amount() - 40.0).abs() < 1e-9);
        assert_eq!(expense.valuation.original(), Some((10.0, Currency::Eur)));
        assert_eq!(expense.location.as_deref(), Some("Vienna"));
    }

    #[test]
    fn add_without_rate_records_nothing() {
        let mut app = test_app();
        let code = dispatch(
            &mut app,
            parse(&[
                "add", "--title", "Bath", "--amount", "900", "--category", "Other", "--currency",
                "HUF",
            ]),
        )
        .unwrap();
        assert_eq!(code, ExitCode::FAILURE);
        assert!(app.store.expenses().is_empty());
    }

    #[test]
    fn add_rejects_non_positive_amount() {
        let mut app = test_app();
        let code = dispatch(
            &mut app,
            parse(&["add", "--title", "Refund", "--amount", "0", "--category", "Other"]),
        )
        .unwrap();
        assert_eq!(code, ExitCode::FAILURE);
        assert!(app.store.expenses().is_empty());
    }

    #[test]
    fn add_rejects_overflowing_conversion() {
        let mut app = test_app();
        let code = dispatch(
            &mut app,
            parse(&[
                "add", "--title", "Yacht", "--amount", "1e308", "--category", "Other", "--currency",
                "EUR",
            ]),
        )
        .unwrap();
        assert_eq!(code, ExitCode::FAILURE);
        assert!(app.store.expenses().is_empty());
        assert!(app.store.storage().read(Slot::Expenses).unwrap().is_none());
    }

    #[test]
    fn show_finds_expense_by_id() {
        let mut app = test_app();
        app.store.replace_all_expenses(Ledger::demo(app.today).expenses).unwrap();
        let id = app.store.expenses().first().unwrap().id.to_string();
        assert_eq!(dispatch(&mut app, parse(&["show", id.as_str()])).unwrap(), ExitCode::SUCCESS);
        assert_eq!(
            dispatch(&mut app, parse(&["show", "no-such-id"])).unwrap(),
            ExitCode::FAILURE
        );
    }

    #[test]
    fn print_details_of_converted_expense() {
        let expense = Expense::new(
            "Museum",
            NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            Category::Attractions,
            Valuation::converted(10.0, Currency::Eur, 4.0),
        )
        .with_location("Vienna");
        assert!(print_expense_details(&expense, Currency::Pln).is_ok());
    }

    #[test]
    fn print_statistics_empty_and_filled() {
        assert!(print_statistics(&[], Currency::Pln).is_ok());
        let expenses = Ledger::demo(NaiveDate::from_ymd_opt(2025, 8, 20).unwrap()).expenses;
        assert!(print_statistics(&expenses, Currency::Pln).is_ok());
    }

    #[test]
    fn remove_and_reset() {
        let mut app = test_app();
        app.store.replace_all_expenses(Ledger::demo(app.today).expenses).unwrap();

        assert_eq!(dispatch(&mut app, parse(&["remove", "3"])).unwrap(), ExitCode::SUCCESS);
        assert_eq!(app.store.expenses().len(), 4);
        assert_eq!(dispatch(&mut app, parse(&["remove", "3"])).unwrap(), ExitCode::SUCCESS);
        assert_eq!(app.store.expenses().len(), 4);

        assert_eq!(dispatch(&mut app, parse(&["reset"])).unwrap(), ExitCode::SUCCESS);
        assert!(app.store.expenses().is_empty());
    }

    #[test]
    fn budget_currency_change_rebases() {
        let mut app = test_app();
        app.store.replace_all_expenses(Ledger::demo(app.today).expenses).unwrap();
        let total_before = report::total(app.store.expenses());

        let code = dispatch(&mut app, parse(&["budget", "--currency", "EUR", "--limit", "1200"])).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(app.store.budget().currency, Currency::Eur);
        assert!((app.store.budget().total_limit - 1200.0).abs() < f64::EPSILON);
        assert!((report::total(app.store.expenses()) - total_before * 0.25).abs() < 1e-6);
    }

    #[test]
    fn budget_rejects_invalid_limit() {
        let mut app = test_app();
        let code = dispatch(&mut app, parse(&["budget", "--limit", "-3"])).unwrap();
        assert_eq!(code, ExitCode::FAILURE);
        assert_eq!(*app.store.budget(), Budget::default());
    }

    #[test]
    fn budget_without_arguments_only_shows() {
        let mut app = test_app();
        assert_eq!(dispatch(&mut app, parse(&["budget"])).unwrap(), ExitCode::SUCCESS);
        assert_eq!(app.rates.calls(), 0);
    }

    #[test]
    fn demo_adds_requested_count() {
        let mut app = test_app();
        let code = dispatch(&mut app, parse(&["demo", "--count", "3"])).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(app.store.expenses().len(), 3);
    }

    #[test]
    fn read_only_commands_succeed() {
        let mut app = test_app();
        app.store.replace_all_expenses(Ledger::demo(app.today).expenses).unwrap();
        for args in [
            &["summary"][..],
            &["show", "1"][..],
            &["list"][..],
            &["list", "--search", "rome"][..],
            &["daily"][..],
        ] {
            assert_eq!(dispatch(&mut app, parse(args)).unwrap(), ExitCode::SUCCESS);
        }
    }

    #[test]
    fn print_tables_empty() {
        assert!(print_expenses_table("Expenses", &[], Currency::Pln).is_ok());
        assert!(print_daily_table(&[], Currency::Pln).is_ok());
        assert!(print_category_table(&[], Currency::Pln).is_ok());
    }

    #[test]
    fn print_rebase_report_with_skipped() {
        let rebase = RebaseReport {
            converted: 2,
            skipped: vec![ExpenseId::from("7")],
        };
        assert!(print_rebase_report(&rebase).is_ok());
    }

    #[test]
    fn usage_color_thresholds() {
        assert_eq!(usage_color(10.0), Color::Green);
        assert_eq!(usage_color(85.0), Color::Yellow);
        assert_eq!(usage_color(100.0), Color::Red);
    }
}
