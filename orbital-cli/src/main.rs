use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orbital_knowledge::{NoteEngine, ReindexReport};

#[derive(Parser)]
#[command(name = "orbital")]
#[command(about = "Personal notes with hybrid lexical and semantic search", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a note, optionally saving a title and body right away
    New {
        #[arg(long, help = "Note title")]
        title: Option<String>,
        #[arg(long, help = "Read the note body from a file")]
        file: Option<PathBuf>,
    },
    /// Replace a note's title and body and rebuild its index
    Save {
        id: i64,
        #[arg(long, help = "Note title")]
        title: String,
        #[arg(
            long,
            help = "Read the note body from a file",
            conflicts_with = "content",
            required_unless_present = "content"
        )]
        file: Option<PathBuf>,
        #[arg(long, help = "Note body")]
        content: Option<String>,
    },
    /// Print a note
    Show { id: i64 },
    /// List all notes
    List,
    /// Delete a note and everything derived from it
    Delete { id: i64 },
    /// Hybrid search across all strategies
    Search {
        query: String,
        #[arg(long, help = "Fuse strategy rankings and print scores")]
        ranked: bool,
    },
    /// Semantic search only
    Similar { query: String },
    /// Print a note's tags, outgoing links and backlinks
    Graph { id: i64 },
    /// List tags with note counts
    Tags,
    /// Rebuild a note's index from its stored content
    Reindex { id: i64 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = orbital_core::Config::load()?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_level().into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Configuration loaded (embedding model: {}, chat model: {})",
        config.knowledge.embedding_model, config.knowledge.chat_model
    );

    let engine = NoteEngine::open(config.knowledge.clone()).await?;
    run(&engine, cli.command).await
}

async fn run(engine: &NoteEngine, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::New { title, file } => {
            let id = engine.create_note().await?;
            if title.is_some() || file.is_some() {
                let content = match file {
                    Some(path) => read_body(&path).await?,
                    None => String::new(),
                };
                let report = engine
                    .save_note(id, title.as_deref().unwrap_or_default(), &content)
                    .await?;
                print_report(&report);
            }
            println!("{id}");
        }
        Commands::Save {
            id,
            title,
            file,
            content,
        } => {
            let content = match (file, content) {
                (Some(path), _) => read_body(&path).await?,
                (None, Some(content)) => content,
                (None, None) => String::new(),
            };
            let report = engine.save_note(id, &title, &content).await?;
            print_report(&report);
        }
        Commands::Show { id } => match engine.get_note(id).await? {
            Some(note) => {
                println!("# {}", note.title);
                if !note.summary.is_empty() {
                    println!("\n> {}", note.summary);
                }
                println!("\n{}", note.content);
            }
            None => return Err(format!("note {id} not found").into()),
        },
        Commands::List => {
            for note in engine.list_notes().await? {
                println!("{}\t{}", note.id, note.title);
            }
        }
        Commands::Delete { id } => {
            if !engine.delete_note(id).await? {
                return Err(format!("note {id} not found").into());
            }
            println!("Deleted note {id}");
        }
        Commands::Search { query, ranked } => {
            if ranked {
                for hit in engine.search_ranked(&query).await? {
                    let strategies: Vec<&str> =
                        hit.strategies.iter().map(|s| s.as_str()).collect();
                    println!(
                        "{}\t{:.4}\t{}\t{}",
                        hit.note_id,
                        hit.score,
                        title_of(engine, hit.note_id).await?,
                        strategies.join(",")
                    );
                }
            } else {
                for id in engine.search(&query).await? {
                    println!("{}\t{}", id, title_of(engine, id).await?);
                }
            }
        }
        Commands::Similar { query } => {
            for (id, score) in engine.similarity_scores(&query).await? {
                println!("{}\t{:.4}\t{}", id, score, title_of(engine, id).await?);
            }
        }
        Commands::Graph { id } => {
            let graph = engine.note_graph(id).await?;
            println!("tags: {}", graph.tags.join(", "));
            println!("links:");
            for link in &graph.links_out {
                println!("  -> {}\t{}", link.id, link.title);
            }
            println!("backlinks:");
            for link in &graph.backlinks {
                println!("  <- {}\t{}", link.id, link.title);
            }
        }
        Commands::Tags => {
            for (name, count) in engine.all_tags().await? {
                println!("{name}\t{count}");
            }
        }
        Commands::Reindex { id } => {
            let report = engine.reindex_note(id).await?;
            print_report(&report);
        }
    }
    Ok(())
}

async fn read_body(path: &Path) -> std::io::Result<String> {
    tokio::fs::read_to_string(path).await
}

async fn title_of(engine: &NoteEngine, id: i64) -> Result<String, Box<dyn std::error::Error>> {
    Ok(engine
        .get_note(id)
        .await?
        .map(|note| note.title)
        .unwrap_or_default())
}

fn print_report(report: &ReindexReport) {
    println!(
        "Indexed note {}: {} chunks, {} tags, {} links",
        report.note_id,
        report.chunk_count,
        report.tags.len(),
        report.links.len()
    );
    for title in report.unresolved_links() {
        println!("  unresolved link: [[{title}]]");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_requires_a_body_source() {
        assert!(Cli::try_parse_from(["orbital", "save", "1", "--title", "T"]).is_err());
        assert!(
            Cli::try_parse_from([
                "orbital", "save", "1", "--title", "T", "--file", "a.md", "--content", "x"
            ])
            .is_err()
        );

        let cli =
            Cli::try_parse_from(["orbital", "save", "7", "--title", "T", "--content", "body"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Save { id: 7, content: Some(ref c), file: None, .. } if c == "body"
        ));
    }

    #[test]
    fn search_flags_parse() {
        let cli = Cli::try_parse_from(["orbital", "search", "roadmap", "--ranked"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Search { ref query, ranked: true } if query == "roadmap"
        ));

        let cli = Cli::try_parse_from(["orbital", "new"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::New {
                title: None,
                file: None
            }
        ));
    }
}
