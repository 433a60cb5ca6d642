use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::CliError;

/// A connected pool for one of the supported databases
#[derive(Clone)]
pub enum Backend {
    Sqlite(SqlitePool),
    Postgres(PgPool),
}

/// Connect based on the URL scheme
pub async fn connect(database_url: &str) -> Result<Backend, CliError> {
    if database_url.starts_with("sqlite:") {
        let pool = SqlitePoolOptions::new().connect(database_url).await?;
        tracing::info!("connected to SQLite");
        Ok(Backend::Sqlite(pool))
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        let pool = PgPoolOptions::new().max_connections(5).connect(database_url).await?;
        tracing::info!("connected to PostgreSQL");
        Ok(Backend::Postgres(pool))
    } else {
        Err(CliError::UnsupportedUrl(database_url.to_string()))
    }
}

impl Backend {
    /// Round-trip a trivial statement
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        match self {
            Backend::Sqlite(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
            Backend::Postgres(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
        }
    }
}

/// Create the demo tables and seed them when empty
///
/// `users` has an auto-increment key, `memberships` a composite key and
/// `audit_log` none at all, so every form and key-shape rule is reachable.
pub async fn setup(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT UNIQUE,
            bio TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            price REAL NOT NULL,
            stock INTEGER DEFAULT 0,
            category TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS memberships (
            user_id INTEGER NOT NULL REFERENCES users(id),
            group_name TEXT NOT NULL,
            role TEXT,
            PRIMARY KEY (user_id, group_name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS audit_log (
            message TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    seed_sample_data(pool).await
}

async fn seed_sample_data(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let user_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    if user_count.0 > 0 {
        tracing::debug!("demo data already present");
        return Ok(());
    }

    let first_names = [
        "Alice", "Bob", "Charlie", "Diana", "Evan", "Fiona", "George", "Hannah", "Isaac", "Julia",
    ];
    let last_names = [
        "Johnson", "Smith", "Brown", "Prince", "Davis", "Wilson", "Taylor", "Anderson",
    ];

    for index in 0..40 {
        let first = first_names[index % first_names.len()];
        let last = last_names[index % last_names.len()];
        let email = format!("{}.{}{}@example.com", first.to_lowercase(), last.to_lowercase(), index);
        // Every third user has no bio so NULL rendering shows up
        let bio = (index % 3 != 0).then(|| format!("{} likes {}", first, last_names[(index + 3) % last_names.len()]));
        sqlx::query("INSERT INTO users (name, email, bio) VALUES (?, ?, ?)")
            .bind(format!("{} {}", first, last))
            .bind(email)
            .bind(bio)
            .execute(pool)
            .await?;
    }

    let categories = ["Electronics", "Furniture", "Stationery", "Books"];
    let product_types = ["Laptop", "Chair", "Notebook", "Lamp", "Desk", "Pen"];

    for index in 0..30 {
        let product_type = product_types[index % product_types.len()];
        let category = (index % 5 != 0).then(|| categories[index % categories.len()]);
        let price = 5.99 + (index as f64 * 12.5);

        sqlx::query("INSERT INTO products (name, price, stock, category) VALUES (?, ?, ?, ?)")
            .bind(format!("{} {}", product_type, index + 1))
            .bind(price)
            .bind(((index * 7 + 5) % 100) as i32)
            .bind(category)
            .execute(pool)
            .await?;
    }

    let groups = ["admins", "editors", "readers"];
    for user_id in 1..=20 {
        let group_name = groups[user_id % groups.len()];
        sqlx::query("INSERT INTO memberships (user_id, group_name, role) VALUES (?, ?, ?)")
            .bind(user_id as i64)
            .bind(group_name)
            .bind(if user_id % 4 == 0 { "owner" } else { "member" })
            .execute(pool)
            .await?;
    }

    for message in ["schema created", "demo users added", "demo products added"] {
        sqlx::query("INSERT INTO audit_log (message) VALUES (?)")
            .bind(message)
            .execute(pool)
            .await?;
    }

    tracing::info!("demo data seeded: 40 users, 30 products, 20 memberships, 3 audit_log rows");
    Ok(())
}
