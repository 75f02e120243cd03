use anyhow::Context;
use booknest_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load BookNest settings")?;
    booknest_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %booknest_db::redact_uri(&settings.database.uri),
        port = settings.server.port,
        "booknest bootstrap starting"
    );

    booknest::run(&settings).await
}
