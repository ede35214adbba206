use school_ledger::{
    config::{database, school},
    core::{report, school_year},
    errors::Result,
};
use dotenvy::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the school configuration
    let config = school::load_default_config()
        .inspect_err(|e| error!("Failed to load school configuration: {}", e))?;

    // 4. Connect and create tables
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed grade levels, school years and contributions
    school::seed_school(&db, &config)
        .await
        .inspect(|summary| info!("Seeding finished: {:?}", summary))
        .inspect_err(|e| error!("Failed to seed school: {}", e))?;

    // 6. Summarize the active school year
    match school_year::get_active_school_year_id(&db).await? {
        Some(year_id) => {
            let dashboard = report::load_treasurer_dashboard(&db, year_id).await?;
            info!("{}", report::format_treasurer_summary(&dashboard));
        }
        None => warn!("No active school year configured"),
    }

    Ok(())
}
