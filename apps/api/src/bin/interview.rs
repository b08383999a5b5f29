//! Terminal front end: pick a resume, get questions, page through them.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use interview_api::client::extract::{DocumentExtractor, UploadedFile};
use interview_api::client::feed::{QuestionCard, RenderedCard};
use interview_api::client::gateway::GatewayClient;
use interview_api::client::session::{MoreOutcome, Session, SubmitForm, SubmitOutcome};
use interview_api::client::ClientError;

#[derive(Debug, Parser)]
#[command(name = "interview", version, about = "Generate interview questions from a resume")]
struct Cli {
    /// Resume document (.pdf, .doc or .docx, at most 5MB)
    resume: PathBuf,

    /// Target position (required)
    #[arg(short, long)]
    position: String,

    /// Target company
    #[arg(short, long, default_value = "")]
    company: String,

    /// Preferred difficulty: easy, medium, hard (default: all)
    #[arg(short, long, default_value = "")]
    difficulty: String,

    /// Base URL of the question gateway
    #[arg(long, env = "INTERVIEW_GATEWAY_URL", default_value = "http://localhost:5000")]
    gateway: String,

    /// Seconds to wait for the gateway
    #[arg(long, default_value_t = 90)]
    timeout_secs: u64,

    /// Use the gateway's canned debug questions (no oracle quota spent)
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout only carries questions.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("interview_api=warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut gateway = GatewayClient::new(&cli.gateway, Duration::from_secs(cli.timeout_secs))?;
    if cli.debug {
        gateway = gateway.debug_mode();
    }
    let session = Session::new(Arc::new(gateway), Arc::new(DocumentExtractor));

    session.select_file(UploadedFile::from_path(&cli.resume).await?);

    let form = SubmitForm {
        position: cli.position.clone(),
        company: cli.company.clone(),
        difficulty: cli.difficulty.clone(),
    };

    println!("Generating questions for {}...", cli.position.trim());
    match session.submit(&form).await {
        Ok(SubmitOutcome::Batch(cards)) => print_cards(&cards),
        Ok(SubmitOutcome::NoQuestions) => {
            println!("{}\n", RenderedCard::NoQuestions);
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error generating questions: {e}");
            return Err(e.into());
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        println!(
            "[Enter] {}   [r] back to first page   [q] quit",
            session.view().more.label.text()
        );
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "q" | "quit" => break,
            "r" => print_cards(&session.render_next_batch(true)),
            _ => match session.request_more().await {
                Ok(MoreOutcome::Revealed(cards)) | Ok(MoreOutcome::Fetched(cards)) => {
                    print_cards(&cards)
                }
                Ok(MoreOutcome::Exhausted) => println!("No more questions available\n"),
                Err(ClientError::Busy) => println!("Still working on the last request...\n"),
                Err(e) => eprintln!("Failed to generate more: {e}\n"),
            },
        }
    }

    Ok(())
}

fn print_cards(cards: &[QuestionCard]) {
    for card in cards {
        println!("{card}\n");
    }
}
