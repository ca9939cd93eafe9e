use sqlx::PgPool;
use tgcollect_core::AppConfig;
use tgcollect_db::PoolConfig;

/// Connect and make sure the schema exists.
///
/// Creating a missing database is best-effort: a role without `CREATEDB`
/// can still run against a database that was provisioned for it.
pub(crate) async fn prepare_pool(config: &AppConfig) -> anyhow::Result<PgPool> {
    match tgcollect_db::ensure_database(&config.database_url).await {
        Ok(true) => tracing::info!("created missing database"),
        Ok(false) => {}
        Err(e) => tracing::warn!(error = %e, "could not verify database exists; connecting anyway"),
    }

    let pool = connect(config).await?;
    tgcollect_db::init_schema(&pool).await?;
    Ok(pool)
}

pub(crate) async fn init(config: &AppConfig) -> anyhow::Result<()> {
    let created = tgcollect_db::ensure_database(&config.database_url).await?;
    let pool = connect(config).await?;
    tgcollect_db::init_schema(&pool).await?;

    if created {
        println!("database created and schema initialized");
    } else {
        println!("schema initialized");
    }
    Ok(())
}

pub(crate) async fn ping(config: &AppConfig) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    tgcollect_db::health_check(&pool).await?;
    println!("database is reachable");
    Ok(())
}

async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool_config = PoolConfig::from_app_config(config);
    let pool = tgcollect_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}
