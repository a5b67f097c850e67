//! # Seed Data Generator
//!
//! Populates the database with a demo configurator catalog.
//!
//! ## Usage
//! ```bash
//! # Seed ./figforge_dev.db with 6 torso bags (default)
//! cargo run -p figforge-db --bin seed
//!
//! # Custom number of torso bags
//! cargo run -p figforge-db --bin seed -- --bags 20
//!
//! # Specify database path
//! cargo run -p figforge-db --bin seed -- --db ./data/figforge.db
//! ```
//!
//! ## Generated Catalog
//! - Four bundle tiers (100, 200, 300, 500 minifigs), the largest inactive
//! - Add-ons with and without constituent items
//! - One extra-bag option per part category
//! - Torso bags whose totals fit the smallest active bundle

use std::env;

use figforge_core::{
    AddonItem, AddonOption, AllocationCeiling, BundleTier, DesignItem, ExtraBagOption, TorsoBag,
    MAX_DESIGN_QUANTITY,
};
use figforge_db::{Database, DbConfig};
use uuid::Uuid;

/// (id, name, minifigs, unit price cents, active)
const BUNDLES: &[(&str, &str, u32, i64, bool)] = &[
    ("bundle-100", "Starter 100", 100, 150, true),
    ("bundle-200", "Shop 200", 200, 125, true),
    ("bundle-300", "Dealer 300", 300, 110, true),
    ("bundle-500", "Warehouse 500", 500, 95, false),
];

const PART_CATEGORIES: &[(&str, i64)] = &[
    ("legs", 1_500),
    ("hair", 2_000),
    ("hats", 1_800),
    ("accessories", 1_200),
    ("weapons", 2_200),
];

const THEMES: &[&str] = &[
    "Space", "Castle", "Pirates", "City", "Western", "Ninja", "Robots", "Jungle",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut bags: usize = 6;
    let mut db_path = String::from("./figforge_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bags" | "-b" => {
                if i + 1 < args.len() {
                    bags = args[i + 1].parse().unwrap_or(6);
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
                println!("Figforge Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -b, --bags <N>     Number of torso bags to generate (default: 6)");
                println!("  -d, --db <PATH>    Database file path (default: ./figforge_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Figforge Seed Data Generator");
    println!("===============================");
    println!("Database:   {}", db_path);
    println!("Torso bags: {}", bags);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.catalog().count_bundles().await?;
    if existing > 0 {
        println!("⚠ Database already has {} bundles", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Bundles
    let mut bundles = Vec::new();
    for (id, name, minifigs, unit, active) in BUNDLES {
        let mut bundle = BundleTier::new(*id, *name, *minifigs, *unit, unit * *minifigs as i64);
        if !active {
            bundle = bundle.inactive();
        }
        db.catalog().insert_bundle(&bundle).await?;
        bundles.push(bundle);
    }
    println!("✓ {} bundles", bundles.len());

    // Add-ons
    let addons = [
        AddonOption::new("addon-stands", "Display stands", 2_500),
        AddonOption::new("addon-capes", "Cape pack", 4_500).with_items(vec![
            AddonItem::new("Cape", 150, "red"),
            AddonItem::new("Cape", 150, "black"),
            AddonItem::new("Cape", 150, "dark blue"),
        ]),
        AddonOption::new("addon-weapons", "Weapon crate", 3_900).with_items(vec![
            AddonItem::new("Sword", 90, "pearl silver"),
            AddonItem::new("Blaster", 110, "black"),
        ]),
    ];
    for addon in &addons {
        db.catalog().insert_addon(addon).await?;
    }
    println!("✓ {} add-ons", addons.len());

    // Extra bag options
    for (category, price) in PART_CATEGORIES {
        let option = ExtraBagOption::new(format!("extra-{}", category), *category, *price);
        db.catalog().insert_extra_bag_option(&option).await?;
    }
    println!("✓ {} extra bag options", PART_CATEGORIES.len());

    // Torso bags sized to the smallest active bundle
    let ceiling = AllocationCeiling::from_bundles(&bundles);
    for n in 0..bags {
        let theme = THEMES[n % THEMES.len()];
        let bag = generate_bag(theme, n, ceiling);
        db.torso_bags().upsert(&bag).await?;
    }
    println!("✓ {} torso bags (ceiling {})", bags, ceiling.limit());

    println!();
    println!("Verifying catalog...");
    let loaded = db.catalog().list_torso_bags().await?;
    let largest = loaded.iter().map(TorsoBag::total_quantity).max().unwrap_or(0);
    println!("  Largest torso bag total: {}", largest);

    db.close().await;
    println!();
    println!("🎉 Seed complete!");
    Ok(())
}

/// Builds a bag of 8-15 designs whose total never exceeds `ceiling`.
fn generate_bag(theme: &str, index: usize, ceiling: AllocationCeiling) -> TorsoBag {
    let designs = 8 + (index * 7) % 8;
    let mut total = 0u32;
    let mut items = Vec::with_capacity(designs);

    for d in 0..designs {
        let quantity = ((d + index) % MAX_DESIGN_QUANTITY as usize) as u8 + 1;
        if ceiling.admits(total + quantity as u32).is_err() {
            break;
        }
        total += quantity as u32;
        items.push(DesignItem::new(
            format!("designs/{}/{:02}.png", theme.to_lowercase(), d),
            quantity,
        ));
    }

    let mut bag = TorsoBag::new(Uuid::new_v4().to_string(), format!("{} #{}", theme, index + 1), items);
    if index % 5 == 4 {
        bag = bag.inactive();
    }
    bag
}
