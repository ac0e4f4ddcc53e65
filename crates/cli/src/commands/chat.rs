//! `robert chat`: interactive conversation on one session key.

use robert_core::message::ConversationKey;
use std::io::Write;
use std::path::Path;
use tokio::io::{self, AsyncBufReadExt, BufReader};

pub async fn run(config_path: &Path, session: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (config, secrets) = super::load(config_path)?;
    let agent = robert_agent::build(&config, &secrets)?;
    let key = ConversationKey::from(session);

    println!();
    println!("  Agent R.O.B.E.R.T. — Interactive Mode");
    println!();
    println!("  Provider:  {}", agent.provider_name());
    println!("  Model:     {}", config.model);
    println!("  Tools:     {}", agent.tools().names().join(", "));
    println!("  Session:   {key}");
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if is_exit(line) {
            break;
        }

        eprint!("  ...");
        match agent.process(line, &key).await {
            Ok(response) => {
                eprint!("\r     \r");
                println!();
                for reply_line in response.content.lines() {
                    println!("  Assistant > {reply_line}");
                }
                println!();
            }
            Err(e) => {
                eprint!("\r     \r");
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

fn is_exit(line: &str) -> bool {
    matches!(
        line.to_ascii_lowercase().as_str(),
        "exit" | "quit" | "/exit" | "/quit"
    )
}
