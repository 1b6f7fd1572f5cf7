use std::collections::BTreeMap;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "dynconf-cli")]
#[command(about = "Management CLI for the dynconf configuration store", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8085")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

/// Identifies a document: `DOMAIN CATEGORY [LOCALE]`.
#[derive(clap::Args)]
struct DocumentArgs {
    /// TRANSLATION, APPLICATION, FEATURE_FLAG or CUSTOM
    domain: String,
    category: String,
    /// Required for TRANSLATION documents
    #[arg(short, long)]
    locale: Option<String>,
}

impl DocumentArgs {
    fn path(&self) -> String {
        match &self.locale {
            Some(locale) => format!("{}/{}/{}", self.domain, self.category, locale),
            None => format!("{}/{}", self.domain, self.category),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the persisted document
    Get(DocumentArgs),
    /// Register defaults (KEY=VALUE ...) and print the merged document
    Register {
        #[command(flatten)]
        doc: DocumentArgs,
        defaults: Vec<String>,
    },
    /// Set one key
    Set {
        #[command(flatten)]
        doc: DocumentArgs,
        key: String,
        value: String,
    },
    /// Remove one key
    DeleteKey {
        #[command(flatten)]
        doc: DocumentArgs,
        key: String,
    },
    /// Remove a whole document
    Delete(DocumentArgs),
    /// List categories of a domain
    Categories {
        domain: String,
        #[arg(short, long)]
        locale: Option<String>,
    },
    /// Drop the server-side cache
    ClearCache,
    /// Check server status
    Status,
}

fn parse_pairs(pairs: &[String]) -> Result<BTreeMap<String, String>, String> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| format!("expected KEY=VALUE, got '{pair}'"))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = format!("{}/config", cli.url.trim_end_matches('/'));

    let res = match cli.command {
        Commands::Get(doc) => client.get(format!("{}/{}", base, doc.path())).send().await?,
        Commands::Register { doc, defaults } => {
            let body = parse_pairs(&defaults)?;
            client
                .post(format!("{}/{}", base, doc.path()))
                .json(&body)
                .send()
                .await?
        }
        Commands::Set { doc, key, value } => {
            client
                .put(format!("{}/{}/{}", base, doc.path(), key))
                .json(&json!({ "value": value }))
                .send()
                .await?
        }
        Commands::DeleteKey { doc, key } => {
            client
                .delete(format!("{}/{}/{}", base, doc.path(), key))
                .send()
                .await?
        }
        Commands::Delete(doc) => client.delete(format!("{}/{}", base, doc.path())).send().await?,
        Commands::Categories { domain, locale } => {
            let url = match locale {
                Some(locale) => format!("{}/{}/categories/{}", base, domain, locale),
                None => format!("{}/{}/categories", base, domain),
            };
            client.get(url).send().await?
        }
        Commands::ClearCache => client.get(format!("{}/cache/clear", base)).send().await?,
        Commands::Status => {
            client
                .get(format!("{}/status", cli.url.trim_end_matches('/')))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: store returned status {}", status);
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }
    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
