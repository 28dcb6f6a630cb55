#[tokio::main]
async fn main() -> slackgpt::error::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("slackgpt=info"))
        .init();
    log::info!("Starting slackgpt Slack relay");

    match slackgpt::run().await {
        Ok(()) => {
            log::info!("Server shut down successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Server encountered an error: {}", e);
            Err(e)
        }
    }
}
