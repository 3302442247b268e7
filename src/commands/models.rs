use clap::Args;
use serde_json::json;

#[derive(Debug, Args, Clone)]
pub struct ModelsArgs {
    #[arg(long)]
    profile: Option<String>,
    #[arg(long)]
    base_url: Option<String>,
    /// Print the model list as JSON.
    #[arg(long)]
    json: bool,
}

pub async fn run(args: ModelsArgs) -> anyhow::Result<()> {
    let profile = super::load_profile(args.profile.as_deref())?;
    let client = super::client_builder(args.base_url.as_deref(), &profile).build()?;

    let models = client.models()?.list().await?;
    tracing::debug!(count = models.data.len(), "listed models");

    if args.json {
        let ids = models.data.iter().map(|model| &model.id).collect::<Vec<_>>();
        println!("{}", json!({ "models": ids }));
        return Ok(());
    }

    println!("Available models:");
    for model in &models.data {
        println!("- {}", model.id);
    }
    Ok(())
}
