//! `robert ask`: one turn, reply on stdout.

use robert_core::message::ConversationKey;
use std::path::Path;

pub async fn run(
    config_path: &Path,
    message: &str,
    session: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (config, secrets) = super::load(config_path)?;
    let agent = robert_agent::build(&config, &secrets)?;

    let key = ConversationKey::from(session);
    let response = agent.process(message, &key).await?;
    tracing::debug!(key = %key, iterations = response.iterations, "Turn finished");
    println!("{}", response.content);

    Ok(())
}
