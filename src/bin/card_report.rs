use std::{error::Error, path::PathBuf};

use clap::Parser;
use rand::{SeedableRng, rngs::StdRng};

use cardwise_rs::{
    Catalog, FileStore, SavingsReport, UserId, format_currency, generate_savings_report,
    generate_user_data, local_today,
};

/// A utility for generating a user's transactions and printing which card
/// would have cost them the least.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The user to generate the report for.
    #[arg(long, short, required_unless_present = "email", conflicts_with = "email")]
    user_id: Option<String>,

    /// The email address of the user to generate the report for.
    #[arg(long, short)]
    email: Option<String>,

    /// Directory that generated user data and reports are saved under.
    #[arg(long, env = "DATA_DIR", default_value = "test_data")]
    data_dir: PathBuf,

    /// File path to a JSON catalog of merchants, category weights and cards.
    #[arg(long, env = "CATALOG_PATH")]
    catalog_path: Option<PathBuf>,

    /// How many transactions to generate.
    #[arg(long, short, default_value_t = 200)]
    n_transactions: i64,

    /// How many days back generated transactions may be dated.
    #[arg(long, default_value_t = 365)]
    lookback_days: u32,

    /// The canonical timezone used to decide today's date.
    #[arg(long, env = "TIMEZONE", default_value = "Etc/UTC")]
    timezone: String,

    /// Seed the random number generator so generated data is repeatable.
    #[arg(long)]
    seed: Option<u64>,

    /// Use the user's existing data instead of generating new transactions.
    #[arg(long)]
    reuse: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let user_id = UserId::from_id_or_email(args.user_id.as_deref(), args.email.as_deref())?;
    let store = FileStore::new(&args.data_dir);
    let catalog = match &args.catalog_path {
        Some(path) => Catalog::load(path)?,
        None => Catalog::default(),
    };

    if !args.reuse {
        let mut rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        println!(
            "Generating {} transactions for {user_id}...",
            args.n_transactions
        );
        let paths = generate_user_data(
            &store,
            &catalog,
            &user_id,
            args.n_transactions,
            args.lookback_days,
            local_today(&args.timezone)?,
            &mut rng,
        )?;
        println!("✓ Saved transactions to {}", paths.transactions_path.display());
    }

    println!(
        "Loading category data for {user_id} from {}...",
        store.data_paths(&user_id).top_categories_path.display()
    );
    let (report, path) = generate_savings_report(&store, &catalog, &user_id)?;

    print_report(&report);
    println!("✓ Results saved to: {}", path.display());

    Ok(())
}

fn print_report(report: &SavingsReport) {
    let rule = "=".repeat(70);
    let ranked = report.cards.ranked();
    let total_spent = ranked
        .first()
        .map(|(_, result)| result.total_spent)
        .unwrap_or_default();

    println!("{rule}");
    println!("CARD SAVINGS COMPARISON");
    println!("{rule}");
    println!("\nTotal Spending: {}\n", format_currency(total_spent));

    for (card_name, result) in &ranked {
        println!("{}. {card_name}", result.rank);
        println!("   Effective Cost: {}", format_currency(result.effective_cost));
        println!("   Rewards Earned: {}", format_currency(result.rewards_earned));
        if result.annual_fee > 0.0 {
            println!("   Annual Fee: {}", format_currency(-result.annual_fee));
        }
        println!(
            "   Savings vs Debit: {} ({:.2}%)\n",
            format_currency(result.savings_vs_debit),
            result.savings_percentage
        );
    }

    println!("{rule}");
    println!("✓ Best card: {}", report.cards.best_card());
}
