use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use threadqa::config::AppConfig;
use threadqa::media::image_links;
use threadqa::speakers::summarize_speakers;
use threadqa::store::load_posts;
use threadqa::Result;
use threadqa::ThreadQa;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tracing::info;

#[derive(Parser)]
#[command(name = "threadqa")]
#[command(about = "Ask questions about a Reddit thread dump")]
#[command(version)]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file (defaults to threadqa.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer questions about a thread
    Ask {
        /// JSON file of {timestamp, author, message} posts
        thread: PathBuf,
        /// Shuffle and drop posts before indexing
        #[arg(long)]
        noisy: bool,
        /// Answer one question and exit instead of prompting
        #[arg(short, long)]
        question: Option<String>,
        /// Send the whole thread as context instead of retrieved chunks
        #[arg(long)]
        full_thread: bool,
    },
    /// Show who said what
    Speakers {
        /// JSON file of posts
        thread: PathBuf,
    },
    /// List posts that link to images
    Media {
        /// JSON file of posts
        thread: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load()?,
    };

    if cli.verbose {
        threadqa::logging::init_logging_with_level("debug", &config.logging.dir)?;
    } else {
        threadqa::logging::init_logging_with_config(Some(&config))?;
    }
    info!("Configuration loaded successfully");

    match cli.command {
        Commands::Ask {
            thread,
            noisy,
            question,
            full_thread,
        } => handle_ask(&config, &thread, noisy, question, full_thread).await,
        Commands::Speakers { thread } => {
            let posts = load_posts(&thread)?;
            for (author, preview) in summarize_speakers(&posts).iter() {
                println!("{author}: {preview}");
            }
            Ok(())
        }
        Commands::Media { thread } => {
            let posts = load_posts(&thread)?;
            let links = image_links(&posts);
            println!("Image links found: {}", links.len());
            for link in links {
                println!("  {link}");
            }
            Ok(())
        }
    }
}

async fn handle_ask(
    config: &AppConfig,
    thread: &Path,
    noisy: bool,
    question: Option<String>,
    full_thread: bool,
) -> Result<()> {
    let mut qa = ThreadQa::from_config(config)?;
    let chunks = qa.ingest_source(thread, noisy).await?;
    println!("ThreadQA ready: {} posts, {} chunks", qa.posts().len(), chunks);
    if let Some(summary) = qa.speaker_summary() {
        println!("Speakers: {summary}\n");
    }

    if let Some(question) = question {
        return answer_one(&qa, &question, full_thread).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"Q: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            break;
        }
        answer_one(&qa, question, full_thread).await?;
    }

    println!(
        "Session ended. All results logged in {}.",
        config.interaction_log_path().display()
    );
    Ok(())
}

async fn answer_one(qa: &ThreadQa, question: &str, full_thread: bool) -> Result<()> {
    let response = if full_thread {
        qa.ask_full_thread(question).await?
    } else {
        qa.ask(question).await?
    };
    println!("{}", response.format());
    Ok(())
}
