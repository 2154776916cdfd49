//! Switchboard CLI - Command-line interface for the routing daemon

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9630";

#[derive(Parser)]
#[command(name = "switchboard")]
#[command(about = "Switchboard agent routing CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "SWITCHBOARD_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a work item for routing
    Submit {
        /// Client identifier
        #[arg(short, long)]
        client: String,

        /// SUPPORT, DEVELOPMENT, DESIGN, CONSULTING, CONTENT, MARKETING, DATA_ANALYSIS, OTHER
        #[arg(short = 'k', long)]
        category: String,

        /// LOW, MEDIUM, HIGH, URGENT
        #[arg(short, long, default_value = "MEDIUM")]
        priority: String,

        /// Request id (generated by the daemon if omitted)
        #[arg(long)]
        id: Option<String>,
    },

    /// Cancel a pending work item
    Cancel {
        /// Request ID
        request_id: String,
    },

    /// Mark a dispatched work item finished
    Complete {
        /// Request ID
        request_id: String,
    },

    /// List pending work items in dequeue order
    Queue {
        /// Only items assigned to this agent (e.g. ANALYTICS)
        #[arg(short, long)]
        agent: Option<String>,

        /// Only items with this priority
        #[arg(short, long)]
        priority: Option<String>,
    },

    /// List registered agents
    Agents {
        /// Only agents with a skill containing this text
        #[arg(short, long)]
        skill: Option<String>,
    },

    /// Show per-agent and system load
    Load,
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize, Tabled)]
struct SubmitResult {
    request_id: String,
    #[tabled(rename = "agent")]
    agent_name: String,
    #[tabled(rename = "position")]
    queue_position: usize,
    #[tabled(rename = "estimated start", display_with = "format_epoch_ms")]
    estimated_start_at: i64,
}

#[derive(Deserialize, Tabled)]
struct QueueRow {
    request_id: String,
    priority: String,
    category: String,
    #[tabled(rename = "agent")]
    assigned_agent: String,
    #[tabled(rename = "client")]
    client_id: String,
    #[tabled(rename = "estimated start", display_with = "format_epoch_ms")]
    estimated_start_at: i64,
}

#[derive(Deserialize)]
struct AgentRow {
    agent: String,
    name: String,
    categories: Vec<String>,
    max_concurrent: u32,
    avg_response_hours: f64,
    skills: Vec<String>,
    is_default: bool,
}

#[derive(Tabled)]
struct AgentDisplay {
    agent: String,
    name: String,
    categories: String,
    capacity: u32,
    #[tabled(rename = "avg hrs")]
    avg_hours: String,
    skills: String,
}

impl From<AgentRow> for AgentDisplay {
    fn from(row: AgentRow) -> Self {
        let name = if row.is_default {
            format!("{} (default)", row.name)
        } else {
            row.name
        };
        Self {
            agent: row.agent,
            name,
            categories: row.categories.join(", "),
            capacity: row.max_concurrent,
            avg_hours: format!("{}", row.avg_response_hours),
            skills: row.skills.join(", "),
        }
    }
}

#[derive(Deserialize)]
struct AgentLoadRow {
    agent: String,
    capacity: u32,
    current_load: Option<u32>,
    utilization_percentage: Option<f64>,
    available: bool,
    pending: usize,
}

#[derive(Tabled)]
struct LoadDisplay {
    agent: String,
    load: String,
    utilization: String,
    pending: usize,
    status: String,
}

impl From<AgentLoadRow> for LoadDisplay {
    fn from(row: AgentLoadRow) -> Self {
        let (load, utilization, status) = match (row.current_load, row.utilization_percentage) {
            (Some(load), Some(pct)) => (
                format!("{}/{}", load, row.capacity),
                format!("{:.1}%", pct),
                if row.available {
                    "available".green().to_string()
                } else {
                    "full".yellow().to_string()
                },
            ),
            _ => (
                format!("?/{}", row.capacity),
                "-".to_string(),
                "unreachable".red().to_string(),
            ),
        };
        Self {
            agent: row.agent,
            load,
            utilization,
            pending: row.pending,
            status,
        }
    }
}

fn format_epoch_ms(ms: &i64) -> String {
    match Local.timestamp_millis_opt(*ms).single() {
        Some(t) => t.format("%Y-%m-%d %H:%M").to_string(),
        None => ms.to_string(),
    }
}

/// JSON object with only the fields that were given
fn optional_params(pairs: &[(&str, &Option<String>)]) -> serde_json::Value {
    let map = pairs
        .iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| (key.to_string(), json!(v))))
        .collect::<serde_json::Map<_, _>>();
    serde_json::Value::Object(map)
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Submit {
            client,
            category,
            priority,
            id,
        } => {
            let mut params = json!({
                "client_id": client,
                "category": category.to_ascii_uppercase(),
                "priority": priority.to_ascii_uppercase(),
            });
            if let Some(id) = id {
                params["request_id"] = json!(id);
            }

            let result = call_rpc(&cli.rpc_url, "work.submit.v1", params).await?;
            let submitted: SubmitResult = serde_json::from_value(result)?;

            println!("{}", "✓ Work item queued".green().bold());
            println!();
            println!("{}", Table::new(vec![submitted]));
        }

        Commands::Cancel { request_id } => {
            let params = json!({ "request_id": request_id });

            call_rpc(&cli.rpc_url, "work.cancel.v1", params).await?;

            println!("{}", format!("✓ Request {} cancelled", request_id).green().bold());
        }

        Commands::Complete { request_id } => {
            let params = json!({ "request_id": request_id });

            let result = call_rpc(&cli.rpc_url, "work.complete.v1", params).await?;

            println!(
                "{}",
                format!("✓ Request {} completed by {}", request_id, result["agent"])
                    .green()
                    .bold()
            );
        }

        Commands::Queue { agent, priority } => {
            let agent = agent.map(|s| s.to_ascii_uppercase());
            let priority = priority.map(|s| s.to_ascii_uppercase());
            let params = optional_params(&[("agent", &agent), ("priority", &priority)]);

            let result = call_rpc(&cli.rpc_url, "queue.list.v1", params).await?;
            let rows: Vec<QueueRow> = serde_json::from_value(result["items"].clone())?;

            println!(
                "{} {}",
                "Pending work items:".cyan().bold(),
                format!("{} shown / {} total", rows.len(), result["total_pending"]).dimmed()
            );
            println!();
            if rows.is_empty() {
                println!("{}", "Queue is empty".yellow());
            } else {
                println!("{}", Table::new(rows));
            }
        }

        Commands::Agents { skill } => {
            let params = optional_params(&[("skill", &skill)]);

            let result = call_rpc(&cli.rpc_url, "agents.list.v1", params).await?;
            let rows: Vec<AgentRow> = serde_json::from_value(result["agents"].clone())?;

            if rows.is_empty() {
                println!("{}", "No matching agents".yellow());
            } else {
                let display: Vec<AgentDisplay> = rows.into_iter().map(AgentDisplay::from).collect();
                println!("{}", Table::new(display));
            }
        }

        Commands::Load => {
            println!("{}", "System Load".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "admin.load.v1", json!({})).await {
                Ok(load) => {
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!(
                        "  {} {}/{} ({:.1}%)",
                        "In flight:".bold(),
                        load["current_load"],
                        load["total_capacity"],
                        load["utilization_percentage"].as_f64().unwrap_or(0.0)
                    );
                    println!("  {} {}", "Pending:".bold(), load["total_pending"]);
                    println!();

                    let rows: Vec<AgentLoadRow> = serde_json::from_value(load["agents"].clone())?;
                    let display: Vec<LoadDisplay> = rows.into_iter().map(LoadDisplay::from).collect();
                    println!("{}", Table::new(display));
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}
