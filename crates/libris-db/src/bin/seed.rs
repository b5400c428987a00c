//! # Seed Data Generator
//!
//! Populates a development database with a small catalog, some members and
//! the default admin account.
//!
//! ## Usage
//! ```bash
//! # Seed ./libris_dev.db with 3 copies of each title (default)
//! cargo run -p libris-db --bin seed
//!
//! # More copies per title
//! cargo run -p libris-db --bin seed -- --copies 5
//!
//! # Specify database path
//! cargo run -p libris-db --bin seed -- --db ./data/libris.db
//! ```
//!
//! ## Generated Data
//! - One book per entry in `BOOKS`, filed under the default categories
//! - One member per entry in `MEMBERS`, all active
//! - `admin` / `admin123` if no admin exists yet
//!
//! Seeding is skipped when the catalog already has books.

use libris_core::{BookDraft, Category, MemberDraft, MemberStatus};
use libris_db::{Database, DbConfig};
use std::env;

/// (title, author, isbn, publisher, year, category)
const BOOKS: &[(&str, &str, &str, &str, i64, &str)] = &[
    ("Dune", "Frank Herbert", "978-0-441-17271-9", "Ace", 1965, "Fiction"),
    ("The Left Hand of Darkness", "Ursula K. Le Guin", "978-0-441-47812-5", "Ace", 1969, "Fiction"),
    ("Pride and Prejudice", "Jane Austen", "978-0-14-143951-8", "Penguin Classics", 1813, "Fiction"),
    ("One Hundred Years of Solitude", "Gabriel Garcia Marquez", "978-0-06-088328-7", "Harper", 1967, "Fiction"),
    ("A Brief History of Time", "Stephen Hawking", "978-0-553-38016-3", "Bantam", 1988, "Science"),
    ("The Selfish Gene", "Richard Dawkins", "978-0-19-878860-7", "Oxford University Press", 1976, "Science"),
    ("Cosmos", "Carl Sagan", "978-0-345-53943-4", "Ballantine", 1980, "Science"),
    ("The Pragmatic Programmer", "Andrew Hunt", "978-0-13-595705-9", "Addison-Wesley", 1999, "Technology"),
    ("Structure and Interpretation of Computer Programs", "Harold Abelson", "978-0-262-51087-5", "MIT Press", 1985, "Technology"),
    ("The Rust Programming Language", "Steve Klabnik", "978-1-7185-0310-6", "No Starch Press", 2019, "Technology"),
    ("SPQR", "Mary Beard", "978-1-63149-222-8", "Liveright", 2015, "History"),
    ("The Guns of August", "Barbara W. Tuchman", "978-0-345-47609-8", "Ballantine", 1962, "History"),
    ("Meditations", "Marcus Aurelius", "978-0-8129-6825-7", "Modern Library", 180, "Philosophy"),
    ("The Republic", "Plato", "978-0-14-045511-3", "Penguin Classics", 375, "Philosophy"),
    ("The Story of Art", "E. H. Gombrich", "978-0-7148-3355-3", "Phaidon", 1950, "Arts"),
    ("Ways of Seeing", "John Berger", "978-0-14-103579-6", "Penguin", 1972, "Arts"),
    ("Atomic Habits", "James Clear", "978-0-7352-1129-2", "Avery", 2018, "Self-Help"),
    ("Thinking, Fast and Slow", "Daniel Kahneman", "978-0-374-53355-7", "Farrar, Straus and Giroux", 2011, "Non-Fiction"),
    ("Sapiens", "Yuval Noah Harari", "978-0-06-231609-7", "Harper", 2011, "Non-Fiction"),
];

/// (first, last, email, phone)
const MEMBERS: &[(&str, &str, &str, &str)] = &[
    ("Ada", "Lovelace", "ada@example.org", "555-0101"),
    ("Alan", "Turing", "alan@example.org", "555-0102"),
    ("Grace", "Hopper", "grace@example.org", "555-0103"),
    ("Edsger", "Dijkstra", "edsger@example.org", "555-0104"),
    ("Barbara", "Liskov", "barbara@example.org", "555-0105"),
    ("Donald", "Knuth", "donald@example.org", "555-0106"),
    ("Frances", "Allen", "frances@example.org", "555-0107"),
    ("John", "Backus", "john@example.org", "555-0108"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut copies: i64 = 3;
    let mut db_path = String::from("./libris_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--copies" | "-c" => {
                if i + 1 < args.len() {
                    copies = args[i + 1].parse().unwrap_or(3);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Libris Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --copies <N>   Copies of each title (default: 3)");
                println!("  -d, --db <PATH>    Database file path (default: ./libris_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Libris Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!("Copies per title: {}", copies);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.users().ensure_default_admin().await? {
        println!("✓ Created default admin account (admin / admin123)");
    }

    let existing = db.books().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} books", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let categories = db.categories().list().await?;

    println!();
    println!("Adding books...");
    let mut added = 0;
    for (title, author, isbn, publisher, year, category) in BOOKS {
        let draft = BookDraft {
            title: title.to_string(),
            author: author.to_string(),
            isbn: Some(isbn.to_string()),
            publisher: Some(publisher.to_string()),
            publication_year: Some(*year),
            category_id: category_id(&categories, category),
            total_copies: copies,
            description: None,
        };

        match db.books().create(draft).await {
            Ok(_) => added += 1,
            Err(e) => eprintln!("Failed to add {}: {}", title, e),
        }
    }
    println!("✓ Added {} books", added);

    println!();
    println!("Registering members...");
    let mut registered = 0;
    for (first, last, email, phone) in MEMBERS {
        let draft = MemberDraft {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
            phone: Some(phone.to_string()),
            address: None,
            status: MemberStatus::Active,
        };

        match db.members().create(draft).await {
            Ok(_) => registered += 1,
            Err(e) => eprintln!("Failed to register {}: {}", email, e),
        }
    }
    println!("✓ Registered {} members", registered);

    println!();
    let search_results = db.books().search("the").await?;
    println!("  Search 'the': {} results", search_results.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn category_id(categories: &[Category], name: &str) -> Option<i64> {
    categories
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
        .map(|c| c.id)
}
