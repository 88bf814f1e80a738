use mimalloc::MiMalloc;
use tokio::fs;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &lab_assets::config::CONFIG;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.basic.database_url,
        loglevel = %cfg.basic.loglevel,
        seed_demo_data = cfg.basic.seed_demo_data,
        output_dir = %cfg.export.output_dir.display()
    );

    let db = lab_assets::db::spawn(cfg.db_options()).await?;

    let columns = db.list_columns().await?;
    let records = db.list_records().await?;
    info!(
        columns = ?columns.iter().map(|c| c.physical_id.as_str()).collect::<Vec<_>>(),
        records = records.len(),
        "inventory ready"
    );

    fs::create_dir_all(&cfg.export.output_dir).await?;
    for attachment in [db.export_csv().await?, db.export_snapshot().await?] {
        let path = cfg.export.output_dir.join(&attachment.filename);
        fs::write(&path, &attachment.body).await?;
        info!(
            path = %path.display(),
            bytes = attachment.body.len(),
            content_type = %attachment.content_type,
            "export written"
        );
    }

    Ok(())
}
