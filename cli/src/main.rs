use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use sift_core::{
    process_queries, process_queries_joined, DocId, DocumentStatus, ExecutionMode, LogDuration, RequestQueue,
    SearchIndex,
};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: DocId,
    #[serde(alias = "body")]
    text: String,
    #[serde(default)]
    status: DocumentStatus,
    #[serde(default)]
    ratings: Vec<i32>,
}

#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Rank short documents by TF-IDF", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Corpus {
    /// Input path (JSON/JSONL file or a directory of them)
    #[arg(long)]
    input: String,
    /// Space-separated stop words
    #[arg(long, default_value = "")]
    stop_words: String,
    /// Use the parallel execution mode
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

impl Corpus {
    fn mode(&self) -> ExecutionMode {
        if self.parallel { ExecutionMode::Parallel } else { ExecutionMode::Sequential }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the top documents for one query
    Search {
        #[command(flatten)]
        corpus: Corpus,
        #[arg(long)]
        query: String,
        /// ACTUAL, IRRELEVANT, BANNED or REMOVED
        #[arg(long, value_parser = parse_status, default_value = "ACTUAL")]
        status: DocumentStatus,
    },
    /// Show which query words occur in one document
    Match {
        #[command(flatten)]
        corpus: Corpus,
        #[arg(long)]
        query: String,
        #[arg(long)]
        id: DocId,
    },
    /// Run every line of a file as a query
    Batch {
        #[command(flatten)]
        corpus: Corpus,
        /// File with one query per line
        #[arg(long)]
        queries: String,
        /// Print one flat list instead of one list per query
        #[arg(long, default_value_t = false)]
        joined: bool,
        /// Also replay the queries through a request history and report empty ones
        #[arg(long, default_value_t = false)]
        history: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search { corpus, query, status } => {
            let index = load_index(&corpus)?;
            let found = index.find_top_documents_by_status_with_mode(corpus.mode(), &query, status)?;
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
        Commands::Match { corpus, query, id } => {
            let index = load_index(&corpus)?;
            let (words, status) = index.match_document_with(corpus.mode(), &query, id)?;
            let out = serde_json::json!({ "id": id, "words": words, "status": status });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Batch { corpus, queries, joined, history } => {
            let index = load_index(&corpus)?;
            let queries = read_queries(Path::new(&queries))?;
            let _timer = LogDuration::new(format!("{} queries", queries.len()));
            if joined {
                println!("{}", serde_json::to_string_pretty(&process_queries_joined(&index, &queries)?)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&process_queries(&index, &queries)?)?);
            }
            if history {
                let mut requests = RequestQueue::new(&index);
                for query in &queries {
                    requests.add_find_request(query)?;
                }
                tracing::info!(no_result = requests.no_result_requests(), kept = requests.len(), "request history");
            }
        }
    }
    Ok(())
}

fn parse_status(s: &str) -> Result<DocumentStatus, String> {
    serde_json::from_value(serde_json::Value::String(s.to_ascii_uppercase())).map_err(|_| format!("unknown status {s:?}"))
}

fn load_index(corpus: &Corpus) -> Result<SearchIndex> {
    let _timer = LogDuration::new("load index");
    let mut index = SearchIndex::new(&corpus.stop_words)?;
    let docs = load_documents(Path::new(&corpus.input))?;
    for doc in &docs {
        index
            .add_document(doc.id, &doc.text, doc.status, &doc.ratings)
            .with_context(|| format!("document {}", doc.id))?;
    }
    tracing::info!(num_docs = index.document_count(), "ingested documents");
    Ok(index)
}

fn load_documents(input_path: &Path) -> Result<Vec<InputDoc>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        anyhow::bail!("input {} does not exist", input_path.display());
    }

    let mut docs = Vec::new();
    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut docs)?;
        } else {
            read_json(&file, &mut docs)?;
        }
    }
    Ok(docs)
}

fn read_jsonl(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: InputDoc =
            serde_json::from_str(&line).with_context(|| format!("{}:{}", file.display(), n + 1))?;
        docs.push(doc);
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    let json: serde_json::Value = serde_json::from_reader(reader).with_context(|| format!("parsing {}", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                docs.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => docs.push(serde_json::from_value(json)?),
        _ => anyhow::bail!("{}: expected a document object or an array of them", file.display()),
    }
    Ok(())
}

fn read_queries(file: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    Ok(text.lines().filter(|l| !l.trim().is_empty()).map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loads_json_and_jsonl_from_directory() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a.jsonl"),
            "{\"id\": 1, \"text\": \"white cat fluffy tail\", \"ratings\": [7, 2, 7]}\n\n{\"id\": 2, \"body\": \"fluffy dog\", \"status\": \"BANNED\"}\n",
        )
        .unwrap();
        fs::write(dir.path().join("b.json"), "[{\"id\": 3, \"text\": \"parrot\"}]").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let docs = load_documents(dir.path()).unwrap();
        let ids: Vec<DocId> = docs.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(docs[1].status, DocumentStatus::Banned);
        assert_eq!(docs[2].status, DocumentStatus::Actual);
        assert!(docs[2].ratings.is_empty());
    }

    #[test]
    fn builds_searchable_index() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("docs.json");
        fs::write(&path, "[{\"id\": 1, \"text\": \"white cat fluffy tail\"}, {\"id\": 2, \"text\": \"fluffy dog\"}]").unwrap();
        let corpus = Corpus { input: path.to_string_lossy().to_string(), stop_words: "and".into(), parallel: true };
        let index = load_index(&corpus).unwrap();
        let found = index.find_top_documents_with_mode(corpus.mode(), "fluffy -dog").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);
    }

    #[test]
    fn duplicate_ids_are_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("docs.jsonl");
        fs::write(&path, "{\"id\": 1, \"text\": \"a\"}\n{\"id\": 1, \"text\": \"b\"}\n").unwrap();
        let corpus = Corpus { input: path.to_string_lossy().to_string(), stop_words: String::new(), parallel: false };
        let err = load_index(&corpus).unwrap_err();
        assert!(format!("{err:#}").contains("already exists"));
    }

    #[test]
    fn scalar_json_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "42").unwrap();
        let err = load_documents(&path).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("bad.json"));
        assert!(msg.contains("expected a document object"));
    }

    #[test]
    fn status_names_parse_case_insensitively() {
        assert_eq!(parse_status("banned").unwrap(), DocumentStatus::Banned);
        assert_eq!(parse_status("ACTUAL").unwrap(), DocumentStatus::Actual);
        assert!(parse_status("gone").is_err());
    }

    #[test]
    fn queries_skip_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("q.txt");
        fs::write(&path, "cat\n\n  \ndog -cat\n").unwrap();
        assert_eq!(read_queries(&path).unwrap(), vec!["cat".to_string(), "dog -cat".to_string()]);
    }
}
