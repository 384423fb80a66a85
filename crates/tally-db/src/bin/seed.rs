//! # Seed Data Generator
//!
//! Populates the database with a demo warehouse, catalog, and stock levels
//! for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default development database
//! cargo run -p tally-db --bin seed
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! ## Generated Data
//! - One warehouse: WH-MAIN
//! - Products across categories (beverages, snacks, dairy, grocery),
//!   each with a unit value and a deterministic on-hand quantity
//! - A handful of zero-stock products, so `include_zero_stock` has
//!   something to include

use chrono::Utc;
use std::env;
use tracing::info;
use uuid::Uuid;

use tally_core::{Product, Warehouse, DEFAULT_TENANT_ID};
use tally_db::{Database, DbConfig};

/// Product categories for realistic demo data.
/// (category code, product names)
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "BEV",
        &[
            "Coca-Cola 330ml",
            "Pepsi 330ml",
            "Sprite 500ml",
            "Orange Juice 1L",
            "Apple Juice 1L",
            "Sparkling Water 750ml",
            "Iced Tea 500ml",
            "Cold Brew Coffee 250ml",
        ],
    ),
    (
        "SNK",
        &[
            "Lays Classic 150g",
            "Doritos Nacho 150g",
            "Pretzels 200g",
            "Salted Peanuts 250g",
            "Dark Chocolate Bar",
            "Gummy Bears 200g",
            "Oat Cookies 300g",
        ],
    ),
    (
        "DRY",
        &[
            "Whole Milk 1L",
            "Skim Milk 1L",
            "Greek Yogurt 500g",
            "Cheddar Cheese 200g",
            "Butter 250g",
            "Eggs Dozen",
        ],
    ),
    (
        "GRO",
        &[
            "Spaghetti 500g",
            "Penne 500g",
            "White Rice 1kg",
            "Canned Tomatoes 400g",
            "Canned Beans 400g",
            "Olive Oil 500ml",
            "Flour 1kg",
            "Sugar 1kg",
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, "Seeding Tally demo data");

    // Connect to database (runs migrations)
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    let ledger = db.ledger();

    // One demo warehouse
    let now = Utc::now();
    let warehouse = Warehouse {
        id: Uuid::new_v4().to_string(),
        tenant_id: DEFAULT_TENANT_ID.to_string(),
        code: "WH-MAIN".to_string(),
        name: "Main Warehouse".to_string(),
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    ledger.insert_warehouse(&warehouse).await?;
    info!(warehouse_id = %warehouse.id, code = %warehouse.code, "Warehouse created");

    // Catalog + stock levels
    let mut generated = 0usize;
    let mut seed = 0usize;

    for (category_code, names) in CATEGORIES {
        // One shared category id per group so the generator's category
        // filter has something to point at
        let category_id = Uuid::new_v4().to_string();

        for name in *names {
            let product = generate_product(category_code, &category_id, name, seed);

            // Deterministic stock: every 7th product is out of stock
            let on_hand = if seed % 7 == 0 { 0 } else { ((seed * 13) % 120) as i64 };

            ledger.insert_product(&product).await?;
            ledger.set_on_hand(&warehouse.id, &product.id, on_hand).await?;

            generated += 1;
            seed += 1;
        }
    }

    info!(products = generated, "Seed complete");
    println!("Seeded {} products into warehouse {} ({})", generated, warehouse.code, db_path);

    Ok(())
}

/// Generates a single catalog product with a deterministic unit value.
fn generate_product(category: &str, category_id: &str, name: &str, seed: usize) -> Product {
    let now = Utc::now();

    // Unique SKU: {CATEGORY}-{INDEX}
    let sku = format!("{}-{:03}", category, seed);

    // Unit value: $0.99 - $8.99
    let unit_value_cents = 99 + ((seed * 37) % 800) as i64;

    Product {
        id: Uuid::new_v4().to_string(),
        tenant_id: DEFAULT_TENANT_ID.to_string(),
        sku,
        name: name.to_string(),
        category_id: Some(category_id.to_string()),
        unit_value_cents,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
