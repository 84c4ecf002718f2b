use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

use annoroute::annotation::{parse_line, source, MappingRegistry};

#[derive(Parser)]
#[command(name = "annoroute-cli")]
#[command(about = "Inspect annotations and the routes of a running annoroute server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every annotated method in a Rust source file
    Scan { file: PathBuf },
    /// Show the annotations of one method
    Locate {
        file: PathBuf,
        type_name: String,
        method: String,
    },
    /// Resolve one annotation line to its methods and path
    Resolve { line: String },
    /// Ask a running server for its compiled routes
    Routes {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,

        #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
        key: String,
    },
    /// Ask a running server for its status
    Status {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,

        #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { file } => {
            let text = std::fs::read_to_string(&file)?;
            let methods = source::scan(&text)?;
            println!("{}", serde_json::to_string_pretty(&methods)?);
        }
        Commands::Locate { file, type_name, method } => {
            let text = std::fs::read_to_string(&file)?;
            let annotations = source::locate(&text, &type_name, &method)?;
            println!("{}", serde_json::to_string_pretty(&annotations)?);
        }
        Commands::Resolve { line } => {
            let text = line.trim();
            let text = text.strip_prefix('@').unwrap_or(text);
            let annotation = parse_line(text).ok_or("not an annotation")?;
            let registry = MappingRegistry::default();
            let mapping = registry
                .get(&annotation.name)
                .ok_or_else(|| format!("no resolver for @{}", annotation.name))?;
            let resolution = mapping.resolve(&annotation.attributes)?;
            let report = json!({
                "annotation": annotation,
                "methods": resolution.methods.iter().map(|m| m.as_str()).collect::<Vec<_>>(),
                "label": resolution.label(),
                "path": resolution.path,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Routes { url, key } => {
            admin_get(&url, &key, "/_admin/routes").await?;
        }
        Commands::Status { url, key } => {
            admin_get(&url, &key, "/_admin/status").await?;
        }
    }

    Ok(())
}

async fn admin_get(url: &str, key: &str, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);

    let res = reqwest::Client::new()
        .get(format!("{}{}", url.trim_end_matches('/'), path))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
