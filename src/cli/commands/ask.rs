//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::tutor::Tutor;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, no_enrich: bool, trace: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vidya doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let tutor = Tutor::from_settings(&settings)?;

    let spinner = Output::spinner("Thinking...");
    let result = tutor.answer_traced(question, !no_enrich).await;
    spinner.finish_and_clear();

    let (response, outcome) = match result {
        Ok(answered) => answered,
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    };

    println!("\n{}\n", response.answer);

    if let Some(video) = &response.suggested_video {
        Output::header("Suggested video");
        Output::kv("Title", &video.title);
        Output::kv("Link", &video.link);
    }
    if let Some(audio) = &response.audio_base64 {
        Output::kv("Audio", &format!("{} base64 characters", audio.len()));
    }

    if trace {
        let path = outcome
            .path
            .iter()
            .map(|node| node.to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        Output::header("Trace");
        Output::kv("Path", &path);
        Output::kv("Rewrites", &outcome.rewrites.to_string());
        if outcome.forced {
            Output::warning("No relevant passages were found; the answer is best effort.");
        }
    }

    Ok(())
}
