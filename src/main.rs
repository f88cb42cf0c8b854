use ai_llm_service::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the variables may come from the environment.
    dotenvy::dotenv().ok();

    telemetry::init("info,api=debug", false)?;

    api::start().await?;

    Ok(())
}
