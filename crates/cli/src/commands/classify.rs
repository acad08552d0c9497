//! Classify command handler.
//!
//! Prints the normalized form of a question, the keyword hit count per
//! bucket and the resulting label. Needs neither the store nor embeddings.

use clap::Args;
use ward_core::AppResult;
use ward_knowledge::classifier::{route, score, PRIORITY};

/// Show how a question is normalized and classified
#[derive(Args, Debug)]
pub struct ClassifyCommand {
    /// The question to classify
    pub text: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ClassifyCommand {
    /// Execute the classify command.
    pub fn execute(&self) -> AppResult<()> {
        let routed = route(&self.text);
        let scores = score(&routed.normalized);

        if self.json {
            let output = serde_json::json!({
                "query": self.text,
                "normalized": routed.normalized,
                "scores": scores,
                "winner": scores.winner(),
                "category": routed.classification.category,
                "subject": routed.classification.subject,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("Normalized: {}", routed.normalized);
        println!();
        println!("Scores:");
        for bucket in PRIORITY {
            println!("  {:<12} {}", format!("{:?}", bucket), scores.get(bucket));
        }
        println!();
        println!("{}", routed.classification);

        Ok(())
    }
}
