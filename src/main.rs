use clap::{Parser, Subcommand};
use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use watson_rs::{config::Settings, dialogue::{Orchestrator, Session}, prompts::SYSTEM_PROMPT, server};

#[derive(Parser)]
#[command(name="watson", version, about="Logic detective with web fact-checking")]
struct Cli {
  #[command(subcommand)]
  cmd: Cmd,
  #[command(flatten)]
  settings: Settings,
}

#[derive(Subcommand)]
enum Cmd {
  /// Interactive session on stdin/stdout
  Chat,
  /// Analyse a single claim and exit
  Check { #[arg(long)] claim: String },
  /// Print the evidence block the assistant would see for a query
  Evidence { #[arg(long)] query: String },
  /// HTTP API for an external chat UI
  Serve { #[arg(long, default_value="127.0.0.1:8080")] addr: String },
}

#[tokio::main]
async fn main() -> Result<()> {
  dotenv::dotenv().ok();
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let evidence = cli.settings.evidence_aggregator()?;

  match cli.cmd {
    Cmd::Evidence { query } => {
      println!("{}", evidence.gather_evidence(&query).await);
    }
    Cmd::Check { claim } => {
      let llm = cli.settings.llm();
      let orch = Orchestrator::new(llm.as_ref(), &evidence, SYSTEM_PROMPT, cli.settings.turn_timeout());
      let report = orch.respond(&mut Session::new(), &claim).await?;
      println!("{}", report.reply);
    }
    Cmd::Chat => {
      let llm = cli.settings.llm();
      let orch = Orchestrator::new(llm.as_ref(), &evidence, SYSTEM_PROMPT, cli.settings.turn_timeout());
      repl(&orch).await?;
    }
    Cmd::Serve { addr } => {
      let engine = server::Engine {
        llm: cli.settings.llm(),
        evidence: Arc::new(evidence),
        turn_timeout: cli.settings.turn_timeout(),
      };
      server::run_server(engine, &addr).await?;
    }
  }
  Ok(())
}

async fn repl(orch: &Orchestrator<'_>) -> Result<()> {
  let mut session = Session::new();
  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  println!("Watson here. State a claim and I will look for holes in it. /history shows the log, /quit leaves.");
  loop {
    print!("you> ");
    std::io::stdout().flush()?;
    let Some(line) = lines.next_line().await? else { break };
    match line.trim() {
      "" => continue,
      "/quit" | "/exit" => break,
      "/history" => {
        for (role, content) in session.visible() {
          println!("[{role:?}] {content}");
        }
      }
      claim => match orch.respond(&mut session, claim).await {
        Ok(report) => println!("watson> {}\n", report.reply),
        Err(e) => println!("watson> (error: {e})\n"),
      },
    }
  }
  Ok(())
}
