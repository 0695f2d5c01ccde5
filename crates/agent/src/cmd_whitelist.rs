//! # Whitelist Tooling
//!
//! - `format`: first CSV column to `["<addr>"] = true,` lines, the shape of
//!   the sale process's whitelist table.
//! - `fetch`: owner addresses of every transaction sent to a recipient
//!   with a given `Action` tag, paged through the gateway GraphQL index.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

pub const DEFAULT_GRAPHQL_URL: &str = "https://arweave.net/graphql";

const PAGE_SIZE: u32 = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PAGE_PAUSE: Duration = Duration::from_secs(1);

// ════════════════════════════════════════════════════════════════════════════════
// FORMAT
// ════════════════════════════════════════════════════════════════════════════════

/// One table entry per non-empty first column.
pub fn format_entries(csv: &str) -> Vec<String> {
    csv.lines()
        .filter_map(|line| line.split(',').next())
        .map(|cell| cell.trim().trim_matches('"'))
        .filter(|cell| !cell.is_empty())
        .map(|addr| format!("[\"{}\"] = true,", addr))
        .collect()
}

pub fn format_file(csv: &Path, out: &Path) -> Result<usize> {
    let input = fs::read_to_string(csv).with_context(|| format!("'{}' not found", csv.display()))?;
    let entries = format_entries(&input);
    let mut output = String::new();
    for entry in &entries {
        output.push_str(entry);
        output.push('\n');
    }
    fs::write(out, output).with_context(|| format!("writing '{}'", out.display()))?;
    Ok(entries.len())
}

// ════════════════════════════════════════════════════════════════════════════════
// FETCH
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<PageData>,
    errors: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PageData {
    transactions: Transactions,
}

#[derive(Debug, Deserialize)]
struct Transactions {
    #[serde(default)]
    edges: Vec<Edge>,
}

#[derive(Debug, Deserialize)]
struct Edge {
    cursor: String,
    node: Node,
}

#[derive(Debug, Deserialize)]
struct Node {
    owner: Owner,
}

#[derive(Debug, Deserialize)]
struct Owner {
    address: String,
}

/// Addresses on one page and the cursor of its last edge.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Page {
    pub addresses: Vec<String>,
    pub next_cursor: Option<String>,
}

pub fn parse_page(body: serde_json::Value) -> Result<Page> {
    let response: GraphQlResponse = serde_json::from_value(body).context("unexpected GraphQL response")?;
    if let Some(errors) = response.errors {
        bail!("error in response: {}", errors);
    }
    let Some(data) = response.data else {
        bail!("GraphQL response has no data");
    };
    let edges = data.transactions.edges;
    let next_cursor = edges.last().map(|e| e.cursor.clone());
    Ok(Page {
        addresses: edges.into_iter().map(|e| e.node.owner.address).collect(),
        next_cursor,
    })
}

fn query(recipient: &str, action: &str, cursor: Option<&str>) -> serde_json::Value {
    json!({
        "query": format!(
            r#"query ($after: String) {{
                transactions(
                    recipients: [{recipient}]
                    tags: [{{ name: "Action", values: [{action}] }}]
                    first: {PAGE_SIZE}
                    after: $after
                ) {{
                    edges {{ cursor node {{ owner {{ address }} }} }}
                }}
            }}"#,
            recipient = serde_json::Value::from(recipient),
            action = serde_json::Value::from(action),
        ),
        "variables": { "after": cursor },
    })
}

async fn fetch_page(
    client: &reqwest::Client,
    url: &str,
    recipient: &str,
    action: &str,
    cursor: Option<&str>,
) -> Result<Page> {
    let response = client
        .post(url)
        .json(&query(recipient, action, cursor))
        .send()
        .await
        .context("request failed")?;
    let status = response.status();
    if !status.is_success() {
        bail!("error fetching data: {}", status);
    }
    parse_page(response.json().await.context("invalid JSON body")?)
}

/// Pages until a request fails or a page comes back empty.
pub async fn collect(url: &str, recipient: &str, action: &str) -> Result<Vec<String>> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("building HTTP client")?;

    let mut all = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = match fetch_page(&client, url, recipient, action, cursor.as_deref()).await {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %format!("{e:#}"), collected = all.len(), "stopping");
                break;
            }
        };
        for address in &page.addresses {
            debug!(address = %address, "fetched");
        }
        all.extend(page.addresses);

        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
        info!(collected = all.len(), "more pages available");
        tokio::time::sleep(PAGE_PAUSE).await;
    }
    Ok(all)
}

pub async fn fetch(url: &str, recipient: &str, action: &str, out: Option<&Path>) -> Result<()> {
    let addresses = collect(url, recipient, action).await?;
    info!(count = addresses.len(), "addresses fetched");

    let mut text = addresses.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    match out {
        Some(path) => fs::write(path, text).with_context(|| format!("writing '{}'", path.display()))?,
        None => print!("{}", text),
    }
    Ok(())
}
