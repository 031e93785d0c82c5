//! procdoc binary

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = procdoc_cli::command().get_matches();
    let config = procdoc_cli::resolve_config(&matches)?;
    procdoc_cli::logging::init(config.log_format);

    tracing::debug!(
        storage_root = %config.storage_root.display(),
        database_url = %config.database_url,
        "configuration resolved"
    );

    let output = procdoc_cli::run(&matches, &config).await?;
    println!("{output}");
    Ok(())
}
