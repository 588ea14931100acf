use std::{error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use findice::{
    Category, NewTransaction, NewUser, PasswordHash, TransactionType, ValidatedPassword,
    add_savings, create_profile, create_transaction, create_user, initialize_db, set_budget,
    set_goal_target,
};

/// A utility for creating a demo database for FinDice.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// A sample transaction: days before today, amount, type, category and description.
type SampleTransaction = (i64, f64, TransactionType, Option<Category>, &'static str);

const SAMPLE_TRANSACTIONS: [SampleTransaction; 12] = [
    (0, 12.5, TransactionType::Expense, Some(Category::Food), "Coffee and a bagel"),
    (1, 86.4, TransactionType::Expense, Some(Category::Food), "Weekly groceries"),
    (3, 45.0, TransactionType::Expense, Some(Category::Entertainment), "Concert tickets"),
    (5, 1200.0, TransactionType::Expense, Some(Category::Rent), "Rent"),
    (6, 250.0, TransactionType::Income, None, "Freelance design work"),
    (9, 60.0, TransactionType::Cash, None, "ATM withdrawal"),
    (12, 23.99, TransactionType::Expense, Some(Category::Other), "Phone case"),
    (20, 91.2, TransactionType::Expense, Some(Category::Food), "Weekly groceries"),
    (35, 1200.0, TransactionType::Expense, Some(Category::Rent), "Rent"),
    (38, 15.99, TransactionType::Expense, Some(Category::Entertainment), "Streaming subscription"),
    (40, 300.0, TransactionType::Income, None, "Sold old bike"),
    (66, 1200.0, TransactionType::Expense, Some(Category::Rent), "Rent"),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    println!("Creating test user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;

    let user = create_user(
        NewUser {
            username: "test".to_owned(),
            email: "test@example.com".to_owned(),
            first_name: "Test".to_owned(),
            last_name: "User".to_owned(),
            password_hash,
        },
        &connection,
    )?;
    create_profile(user.id, 3000.0, &connection)?;

    println!("Creating sample transactions...");

    let today = OffsetDateTime::now_utc().date();
    for (days_ago, amount, transaction_type, category, description) in SAMPLE_TRANSACTIONS {
        let date = today - Duration::days(days_ago);
        let transaction = NewTransaction::new(amount, transaction_type, category, description, date)?;
        create_transaction(user.id, transaction, &connection)?;
    }

    println!("Creating budget and savings goal...");

    set_budget(user.id, today.replace_day(1)?, 2000.0, &connection)?;
    set_goal_target(user.id, 5000.0, &connection)?;
    add_savings(user.id, 1250.0, &connection)?;

    println!("Success! Log in with the username \"test\" and the password \"test\".");

    Ok(())
}
