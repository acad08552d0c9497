//! Ask command handler.
//!
//! Runs one chat turn against the configured store and prints the ranked
//! rows returned by the hybrid search.

use clap::Args;
use futures::StreamExt;
use std::sync::Arc;
use ward_core::{config::AppConfig, AppError, AppResult};
use ward_knowledge::{ChatEvent, ChatService};

/// Answer a question once against the document store
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub text: String,

    /// Print progress events as they happen
    #[arg(long)]
    pub stream: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        config.validate()?;

        let service = ChatService::from_config(config)?;

        if self.stream {
            return self.handle_streaming(Arc::new(service)).await;
        }

        let reply = service.answer(&self.text).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&reply)?);
            return Ok(());
        }

        println!("{}", reply.log_data);
        println!();
        print_replies(&reply.replies);
        Ok(())
    }

    async fn handle_streaming(&self, service: Arc<ChatService>) -> AppResult<()> {
        let mut events = service.stream(self.text.clone());

        while let Some(event) = events.next().await {
            if self.json {
                println!("{}", serde_json::to_string(&event)?);
                continue;
            }
            match event {
                ChatEvent::Log(line) => eprintln!("[log] {}", line),
                ChatEvent::Replies(rows) => print_replies(&rows),
                ChatEvent::Error(message) => return Err(AppError::Other(message)),
            }
        }

        Ok(())
    }
}

fn print_replies(rows: &[serde_json::Value]) {
    if rows.is_empty() {
        println!("No matching documents.");
        return;
    }

    for (i, row) in rows.iter().enumerate() {
        let title = row["procedure_name"].as_str().unwrap_or("(untitled)");
        let labels = format!(
            "{}/{}",
            row["category"].as_str().unwrap_or("-"),
            row["subject"].as_str().unwrap_or("-")
        );
        println!("{}. {} [{}]", i + 1, title, labels);
        if let Some(text) = row["text_content"].as_str() {
            println!("   {}", text);
        }
    }
}
