//! Database pool construction, migrations and first-run seeding.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::access::DEFAULT_ROLES;

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    Ok(db)
}

/// Inserts the default role set on a fresh installation. Existing role
/// tables are left untouched.
pub async fn seed_default_roles(db: &PgPool) -> anyhow::Result<()> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM roles")
        .fetch_one(db)
        .await?;
    if count.0 > 0 {
        return Ok(());
    }
    for (name, description) in DEFAULT_ROLES {
        sqlx::query(
            "INSERT INTO roles (id, name, description, created_at) VALUES ($1, $2, $3, NOW()) ON CONFLICT (name) DO NOTHING",
        )
        .bind(Uuid::now_v7())
        .bind(name)
        .bind(description)
        .execute(db)
        .await?;
    }
    tracing::info!("seeded default roles");
    Ok(())
}
