//! # threadvault CLI Application
//!
//! Command-line front end for scraping a forum thread and chatting about it.
//!
//! ## Subcommands
//!
//! - `scrape`: Walk a thread and write the JSON archive and text mirror
//! - `index`: Chunk, embed and store an archive for retrieval
//! - `ask`: Answer one question from the index
//! - `chat`: Interactive question answering with conversation history
//! - `list`: Show indexed threads
//!
//! `OPENAI_API_KEY` must be set for `index`, `ask` and `chat`.

mod logging;
mod telemetry;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rig::embeddings::EmbeddingModel;
use telemetry::OtelGuard;
use threadvault::archive::{ThreadArchive, read_archive, write_archive};
use threadvault::chat::{ChatConfig, ThreadChat};
use threadvault::crawler::{ScraperConfig, scrape_thread};
use threadvault::index::{Database, IndexConfig, index_chunks};
use threadvault::model::{
    DEFAULT_COMPLETION_MODEL, DEFAULT_EMBEDDING_DIMS, OpenAiClient, OpenAiCompletionModel,
    OpenAiEmbeddingModel,
};
use threadvault::processor::chunk_posts;
use threadvault::render;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, instrument};

type OpenAiChat = ThreadChat<OpenAiCompletionModel, OpenAiEmbeddingModel>;

#[derive(Parser)]
#[command(author, version, about = "Archive a forum thread and chat about it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape a forum thread into an archive
    Scrape(ScrapeArgs),

    /// Index an archive for question answering
    Index(IndexArgs),

    /// Answer a single question from the index
    Ask(AskArgs),

    /// Start an interactive chat about the indexed threads
    Chat(ChatArgs),

    /// List indexed threads
    List(ListArgs),
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// Thread URL (page 1)
    #[arg(required = true)]
    url: String,

    /// First page to fetch
    #[arg(short, long, default_value = "1")]
    start_page: u32,

    /// Last page to fetch
    #[arg(short, long)]
    end_page: Option<u32>,

    /// Delay between page requests in milliseconds
    #[arg(short, long, default_value = "2000")]
    delay_ms: u64,

    /// Request timeout in seconds (none by default)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// JSON archive path
    #[arg(short, long, default_value = "forum_data.json")]
    output: PathBuf,

    /// Plain-text mirror path
    #[arg(short, long, default_value = "forum_data.txt")]
    text_output: PathBuf,
}

#[derive(Args, Debug)]
struct IndexArgs {
    /// Archive to index
    #[arg(short, long, default_value = "forum_data.json")]
    archive: PathBuf,

    /// Database path
    #[arg(long, default_value = "forum_index.db")]
    database: PathBuf,

    /// Chunk size in characters
    #[arg(short = 's', long, default_value = "1000")]
    chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(short = 'o', long, default_value = "200")]
    chunk_overlap: usize,

    /// Number of concurrent embedding batches
    #[arg(short, long, default_value = "4")]
    concurrency: usize,
}

#[derive(Args, Debug)]
struct AskArgs {
    /// Question to answer
    #[arg(required = true)]
    question: String,

    /// Database path
    #[arg(long, default_value = "forum_index.db")]
    database: PathBuf,

    /// Number of chunks to retrieve
    #[arg(short, long, default_value = "3")]
    limit: usize,

    /// Only search the thread with this URL
    #[arg(short, long)]
    thread: Option<String>,

    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Completion model to answer with
    #[arg(short, long, default_value = DEFAULT_COMPLETION_MODEL)]
    model: String,
}

#[derive(Args, Debug)]
struct ChatArgs {
    /// Database path
    #[arg(long, default_value = "forum_index.db")]
    database: PathBuf,

    /// Number of chunks to retrieve per question
    #[arg(short, long, default_value = "3")]
    limit: usize,

    /// Only search the thread with this URL
    #[arg(short, long)]
    thread: Option<String>,

    /// Completion model to answer with
    #[arg(short, long, default_value = DEFAULT_COMPLETION_MODEL)]
    model: String,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Database path
    #[arg(long, default_value = "forum_index.db")]
    database: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut _otel: Option<OtelGuard> = None;
    if !matches!(cli.command, Some(Commands::Chat(_))) {
        _otel = Some(telemetry::init_tracing_subscriber()?);
    }

    match cli.command {
        Some(Commands::Scrape(args)) => {
            scrape_command(args).await?;
        }
        Some(Commands::Index(args)) => {
            index_command(args).await?;
        }
        Some(Commands::Ask(args)) => {
            ask_command(args).await?;
        }
        Some(Commands::Chat(args)) => {
            // Keep log lines out of the prompt
            logging::setup_file_logging("chat.log")?;
            chat_command(args).await?;
        }
        Some(Commands::List(args)) => {
            list_command(args).await?;
        }
        None => {
            let _ = Cli::parse_from(["threadvault", "--help"]);
        }
    }

    Ok(())
}

#[instrument]
async fn scrape_command(args: ScrapeArgs) -> anyhow::Result<()> {
    let config = ScraperConfig::builder(args.url.clone())
        .start_page(args.start_page)
        .end_page(args.end_page)
        .delay_ms(args.delay_ms)
        .timeout(args.timeout_secs.map(Duration::from_secs))
        .build();

    let outcome = scrape_thread(&config).await?;
    info!(
        "Stopped after {} pages: {}",
        outcome.pages_fetched, outcome.stop_reason
    );

    let archive = ThreadArchive::new(args.url, outcome.posts);
    write_archive(&archive, &args.output, &args.text_output)
        .await
        .context("Failed to save the archive")?;

    println!("Scraped {} posts successfully!", archive.posts.len());
    println!(
        "Saved to {} and {}",
        args.output.display(),
        args.text_output.display()
    );

    Ok(())
}

#[instrument]
async fn index_command(args: IndexArgs) -> anyhow::Result<()> {
    let config = IndexConfig::builder()
        .chunk_size(args.chunk_size)
        .chunk_overlap(args.chunk_overlap)
        .concurrency(args.concurrency)
        .build()?;

    println!("Loading archive {}...", args.archive.display());
    let archive = read_archive(&args.archive).await?;
    if archive.posts.is_empty() {
        return Err(anyhow!("{} contains no posts", args.archive.display()));
    }

    let client = OpenAiClient::new_openai_from_env(DEFAULT_COMPLETION_MODEL)?;
    let db = Database::new_from_path(&args.database, client.embedding().ndims()).await?;

    let chunks = chunk_posts(&archive.posts, &config.chunk_options)?;
    println!(
        "Embedding {} chunks from {} posts...",
        chunks.len(),
        archive.posts.len()
    );

    let (progress_sender, mut progress_receiver) = mpsc::channel(100);

    let progress_bar = ProgressBar::new(chunks.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")?
            .progress_chars("##-"),
    );
    progress_bar.set_message("Embedding chunks...");

    let start_time = std::time::Instant::now();

    // Ends once every sender is dropped
    let progress_handle = tokio::spawn({
        let progress_bar = progress_bar.clone();
        async move {
            while let Some(count) = progress_receiver.recv().await {
                progress_bar.inc(count as u64);
            }
            progress_bar.finish_with_message("Embedding completed");
        }
    });

    let summary = index_chunks(
        &client,
        &db,
        &archive,
        chunks,
        config.concurrency,
        Some(progress_sender),
    )
    .await;
    let _ = progress_handle.await;
    let summary = summary?;

    println!(
        "Indexed {} chunks from {} posts of {} in {:.2?}",
        summary.chunks,
        summary.posts,
        archive.thread_url,
        start_time.elapsed()
    );

    Ok(())
}

async fn open_chat(
    database: &Path,
    model: &str,
    limit: usize,
    thread: Option<String>,
) -> anyhow::Result<OpenAiChat> {
    if !database.exists() {
        return Err(anyhow!(
            "No index at {}; run `threadvault index` first",
            database.display()
        ));
    }

    let config = ChatConfig::builder()
        .limit(limit)
        .thread_filter(thread)
        .build()?;
    let client = OpenAiClient::new_openai_from_env(model)?;
    let db = Database::new_from_path(database, client.embedding().ndims()).await?;

    Ok(ThreadChat::new(db, client, config))
}

#[instrument]
async fn ask_command(args: AskArgs) -> anyhow::Result<()> {
    let mut chat = open_chat(&args.database, &args.model, args.limit, args.thread).await?;

    let answer = chat.ask(&args.question).await?;

    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&answer)?);
        }
        _ => {
            render::print_answer(&answer)?;
        }
    }

    Ok(())
}

async fn chat_command(args: ChatArgs) -> anyhow::Result<()> {
    let mut chat = open_chat(&args.database, &args.model, args.limit, args.thread).await?;

    println!("Ask about the indexed threads. Type `exit` or `quit` to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        match chat.ask(question).await {
            Ok(answer) => render::print_answer(&answer)?,
            // A failed question should not end the session
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    Ok(())
}

#[instrument]
async fn list_command(args: ListArgs) -> anyhow::Result<()> {
    if !args.database.exists() {
        println!("No index at {}", args.database.display());
        return Ok(());
    }

    // Dimensions only matter when the schema is created, which it already is
    let db = Database::new_from_path(&args.database, DEFAULT_EMBEDDING_DIMS).await?;
    let threads = db.list_threads().await?;

    println!("Indexed threads: {}", threads.len());
    render::print_threads(&threads)?;

    Ok(())
}
