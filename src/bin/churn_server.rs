use std::sync::Arc;

use anyhow::{Context, Result};
use churnform::logging::init_logging;
use churnform::{ChurnModel, Classifier, Cli};
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_filter)?;
    let config = cli.build_config()?;

    let model = ChurnModel::load(config.model_path(), config.require_feature_names())
        .with_context(|| {
            format!(
                "failed to load model artifact {}",
                config.model_path().display()
            )
        })?;
    info!(
        path = %config.model_path().display(),
        kind = model.kind_name(),
        feature_names = model.feature_names().is_some(),
        "model loaded"
    );
    let classifier: Arc<dyn Classifier> = Arc::new(model);

    churnform::serve(&config, classifier).await
}
