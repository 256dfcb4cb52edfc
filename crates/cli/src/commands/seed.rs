//! Seed the catalog from a YAML file.
//!
//! The file is a list of products:
//!
//! ```yaml
//! - id: 1
//!   title: Ananas-Chips
//!   description: Getrocknete Ananas, ungesüßt.
//!   price: 4.99
//!   image: /img/chips.jpg
//! - title: Kokosmilch
//!   description: 400 ml
//!   price: "2.49"
//!   active: false
//! ```
//!
//! Entries with an `id` are inserted or updated in place; entries without one
//! are inserted with a new id. The whole file is applied in one transaction.

use std::path::Path;

use serde::Deserialize;
use sqlx::{Connection, PgConnection};
use tracing::{error, info};

use kiosk_core::{Money, ProductId};

/// One product entry of the seed file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductSeed {
    pub id: Option<ProductId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    pub image: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

/// Counts reported after seeding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedResult {
    pub upserted: usize,
    pub inserted: usize,
}

/// Seed products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation, or if a
/// database operation fails. Nothing is written in that case.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seeds: Vec<ProductSeed> = serde_yaml::from_str(&content)?;

    info!(products = seeds.len(), "Parsed seed file");

    let errors = validate(&seeds);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = super::connect().await?;
    let mut conn = pool.acquire().await?;
    let result = apply(&mut conn, &seeds).await?;

    info!("Seeding complete!");
    info!("  Products inserted or updated by id: {}", result.upserted);
    info!("  Products inserted with a new id: {}", result.inserted);

    Ok(())
}

/// Check every entry, returning one message per problem.
fn validate(seeds: &[ProductSeed]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for (index, seed) in seeds.iter().enumerate() {
        let entry = index + 1;
        if seed.title.trim().is_empty() {
            errors.push(format!("entry {entry}: title is empty"));
        }
        if seed.price.is_negative() {
            errors.push(format!("entry {entry}: price {} is negative", seed.price));
        }
        if let Some(id) = seed.id {
            if !id.is_valid() {
                errors.push(format!("entry {entry}: id {id} is not positive"));
            } else if !seen.insert(id) {
                errors.push(format!("entry {entry}: id {id} appears more than once"));
            }
        }
    }

    errors
}

async fn apply(
    conn: &mut PgConnection,
    seeds: &[ProductSeed],
) -> Result<SeedResult, sqlx::Error> {
    let mut tx = conn.begin().await?;
    let mut result = SeedResult::default();

    for seed in seeds {
        if let Some(id) = seed.id {
            sqlx::query(
                r"
                INSERT INTO products (id, title, description, price, image, is_active)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (id) DO UPDATE SET
                    title = EXCLUDED.title,
                    description = EXCLUDED.description,
                    price = EXCLUDED.price,
                    image = EXCLUDED.image,
                    is_active = EXCLUDED.is_active
                ",
            )
            .bind(id)
            .bind(&seed.title)
            .bind(&seed.description)
            .bind(seed.price)
            .bind(seed.image.as_deref())
            .bind(seed.active)
            .execute(&mut *tx)
            .await?;
            result.upserted += 1;
        } else {
            sqlx::query(
                r"
                INSERT INTO products (title, description, price, image, is_active)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(&seed.title)
            .bind(&seed.description)
            .bind(seed.price)
            .bind(seed.image.as_deref())
            .bind(seed.active)
            .execute(&mut *tx)
            .await?;
            result.inserted += 1;
        }
    }

    // Explicit ids bypass the sequence; move it past them.
    if result.upserted > 0 {
        sqlx::query(
            r"
            SELECT setval(
                pg_get_serial_sequence('products', 'id'),
                (SELECT COALESCE(MAX(id), 1) FROM products)
            )
            ",
        )
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Vec<ProductSeed> {
        match serde_yaml::from_str(yaml) {
            Ok(seeds) => seeds,
            Err(e) => panic!("seed file should parse: {e}"),
        }
    }

    #[test]
    fn test_parse_with_defaults() {
        let seeds = parse(
            r#"
- id: 1
  title: Ananas-Chips
  description: Getrocknete Ananas
  price: 4.99
  image: /img/chips.jpg
- title: Kokosmilch
  price: "2.49"
  active: false
"#,
        );

        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].id, Some(ProductId::new(1)));
        assert_eq!(seeds[0].price, Money::from_cents(499));
        assert!(seeds[0].active);
        assert_eq!(seeds[1].id, None);
        assert_eq!(seeds[1].description, "");
        assert_eq!(seeds[1].price, Money::from_cents(249));
        assert!(!seeds[1].active);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result: Result<Vec<ProductSeed>, _> =
            serde_yaml::from_str("- title: X\n  price: 1\n  colour: red\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let seeds = parse(
            r"
- id: 2
  title: ' '
  price: -1
- id: 2
  title: Duplicate
  price: 1
- id: 0
  title: Zero
  price: 1
",
        );

        let errors = validate(&seeds);

        assert_eq!(
            errors,
            vec![
                "entry 1: title is empty".to_owned(),
                "entry 1: price -1.00 is negative".to_owned(),
                "entry 2: id 2 appears more than once".to_owned(),
                "entry 3: id 0 is not positive".to_owned(),
            ]
        );
    }

    #[test]
    fn test_validate_accepts_clean_file() {
        let seeds = parse("- title: A\n  price: 1\n- id: 7\n  title: B\n  price: 0\n");
        assert!(validate(&seeds).is_empty());
    }
}
