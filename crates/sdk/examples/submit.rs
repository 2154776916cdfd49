//! Submit Example
//!
//! Submits a handful of work items and prints the resulting queue and load.
//!
//! 1. Start the daemon: `cargo run --package switchboard-daemon`
//! 2. Run: `cargo run --package switchboard-sdk --example submit`

use switchboard_sdk::{QueueListRequest, SubmitWorkRequest, SwitchboardClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = SwitchboardClient::connect("http://127.0.0.1:9630").await?;

    for (category, priority) in [
        ("DATA_ANALYSIS", "LOW"),
        ("DATA_ANALYSIS", "URGENT"),
        ("SUPPORT", "MEDIUM"),
    ] {
        let a = client
            .submit(SubmitWorkRequest::new("example-client", category, priority))
            .await?;
        println!(
            "✓ {} -> {} (position {}, eta {})",
            a.request_id, a.agent_name, a.queue_position, a.estimated_start_at
        );
    }

    let queue = client.queue_list(QueueListRequest::default()).await?;
    println!("\nPending ({}):", queue.total_pending);
    for item in queue.items {
        println!("  {} {} {}", item.priority, item.assigned_agent, item.request_id);
    }

    let load = client.system_load().await?;
    println!(
        "\nLoad: {}/{} ({:.1}%)",
        load.current_load, load.total_capacity, load.utilization_percentage
    );

    Ok(())
}
