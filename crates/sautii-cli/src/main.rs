use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sautii_core::{FilterSpec, Predicate, SearchRequest};
use sautii_search::SearchEngine;
use sautii_storage::{snapshot, InMemoryStore, IssueStore};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sautii")]
#[command(about="Sautii issue search CLI", long_about=None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run a search and print issues, total and facets.
    Search {
        #[arg(long)]
        data: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print facet counts only.
    Facets {
        #[arg(long)]
        data: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Rewrite a snapshot, keeping only issues that match the filter.
    Dump {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Args, Default)]
struct FilterArgs {
    #[arg(long)]
    query: Option<String>,
    #[arg(long = "category")]
    categories: Vec<String>,
    #[arg(long = "priority")]
    priorities: Vec<String>,
    #[arg(long = "status")]
    statuses: Vec<String>,
    #[arg(long = "tag")]
    tags: Vec<String>,
    #[arg(long)]
    start_date: Option<String>,
    #[arg(long)]
    end_date: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    lng: Option<String>,
    #[arg(long)]
    radius: Option<String>,
    #[arg(long)]
    sort_by: Option<String>,
    #[arg(long)]
    sort_order: Option<String>,
    #[arg(long)]
    page: Option<String>,
    #[arg(long)]
    limit: Option<String>,
}

impl FilterArgs {
    /// Same coercion path as the HTTP query string.
    fn to_spec(&self) -> FilterSpec {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        let lists = [
            ("categories", &self.categories),
            ("priorities", &self.priorities),
            ("statuses", &self.statuses),
            ("tags", &self.tags),
        ];
        for (key, values) in lists {
            pairs.extend(values.iter().map(|v| (key, v.clone())));
        }
        let scalars = [
            ("query", &self.query),
            ("startDate", &self.start_date),
            ("endDate", &self.end_date),
            ("lat", &self.lat),
            ("lng", &self.lng),
            ("radius", &self.radius),
            ("sortBy", &self.sort_by),
            ("sortOrder", &self.sort_order),
            ("page", &self.page),
            ("limit", &self.limit),
        ];
        for (key, value) in scalars {
            if let Some(v) = value {
                pairs.push((key, v.clone()));
            }
        }
        FilterSpec::from_request(SearchRequest::from_pairs(pairs))
    }
}

fn load(path: &PathBuf) -> Result<InMemoryStore> {
    let (issues, manifest) = snapshot::read_issues(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    if manifest.skipped > 0 {
        eprintln!("skipped {} malformed lines", manifest.skipped);
    }
    Ok(InMemoryStore::from_issues(issues))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Search { data, filter } => {
            let engine = SearchEngine::new(Arc::new(load(&data)?));
            let result = engine.search(&filter.to_spec()).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Cmd::Facets { data, filter } => {
            let engine = SearchEngine::new(Arc::new(load(&data)?));
            let facets = engine.facets(&filter.to_spec()).await?;
            println!("{}", serde_json::to_string_pretty(&facets)?);
        }
        Cmd::Dump { data, out, filter } => {
            let store = load(&data)?;
            let predicate = Predicate::compile(&filter.to_spec());
            let issues = store.query(&predicate).await?;
            let manifest = snapshot::write_issues(out, issues.iter())?;
            let report = serde_json::json!({ "path": manifest.path, "issues": manifest.issues });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
