//! Human-readable tables for command output.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use tokensmith_engine::planner;
use tokensmith_engine::{
    ConfigurationChunk, StrategyRecommendation, UnifiedDeploymentResult,
};

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn print_recommendation(rec: &StrategyRecommendation) {
    let mut table = base_table();
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec![Cell::new("Token"), Cell::new(&rec.token_id)]);
    table.add_row(vec![
        Cell::new("Standard"),
        Cell::new(
            rec.standard.map(|s| s.to_string()).unwrap_or_else(|| "unknown".to_string()),
        ),
    ]);
    table.add_row(vec![Cell::new("Strategy"), Cell::new(rec.strategy)]);
    table.add_row(vec![Cell::new("Complexity"), Cell::new(rec.assessment.level)]);
    table.add_row(vec![Cell::new("Score"), Cell::new(rec.assessment.score)]);
    table.add_row(vec![Cell::new("Modules"), Cell::new(rec.assessment.feature_count)]);
    table.add_row(vec![Cell::new("Chunks"), Cell::new(rec.chunk_count)]);
    println!("{table}");

    let mut costs = base_table();
    costs.set_header(vec!["Strategy", "Gas", "USD", ""]);
    for (name, cost, strategy) in [
        ("basic", rec.costs.basic, tokensmith_engine::DeploymentStrategy::Basic),
        ("enhanced", rec.costs.enhanced, tokensmith_engine::DeploymentStrategy::Enhanced),
        ("chunked", rec.costs.chunked, tokensmith_engine::DeploymentStrategy::Chunked),
    ] {
        costs.add_row(vec![
            Cell::new(name),
            Cell::new(cost.gas),
            Cell::new(format!("${:.2}", cost.usd)),
            Cell::new(if strategy == rec.strategy { "<- recommended" } else { "" }),
        ]);
    }
    println!("{costs}");

    for reason in &rec.assessment.reasoning {
        println!("  - {reason}");
    }
    for finding in &rec.findings {
        println!("  ! [{}] {}", finding.severity, finding.message);
    }
}

pub fn print_plan(chunks: &[ConfigurationChunk]) {
    if chunks.is_empty() {
        println!("No configuration chunks: a single transaction covers this token.");
        return;
    }

    let mut table = base_table();
    table.set_header(vec!["#", "Category", "Priority", "Gas estimate", "Depends on"]);
    for (index, chunk) in chunks.iter().enumerate() {
        let deps = chunk
            .dependencies
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(chunk.category),
            Cell::new(chunk.priority),
            Cell::new(chunk.gas_estimate),
            Cell::new(if deps.is_empty() { "-".to_string() } else { deps }),
        ]);
    }
    println!("{table}");
    println!("Total planned gas: {}", planner::total_gas(chunks));
}

pub fn print_result(result: &UnifiedDeploymentResult) {
    let mut table = base_table();
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec![Cell::new("Token"), Cell::new(&result.token_id)]);
    table.add_row(vec![
        Cell::new("Status"),
        Cell::new(if result.success { "success" } else { "failed" }),
    ]);
    if let Some(strategy) = result.strategy {
        table.add_row(vec![Cell::new("Strategy"), Cell::new(strategy)]);
    }
    if let Some(address) = &result.token_address {
        table.add_row(vec![Cell::new("Address"), Cell::new(address)]);
    }
    if let Some(hash) = &result.transaction_hash {
        table.add_row(vec![Cell::new("Base tx"), Cell::new(hash)]);
    }
    table.add_row(vec![Cell::new("Gas used"), Cell::new(result.gas_used)]);
    table.add_row(vec![
        Cell::new("Duration"),
        Cell::new(format!("{} ms", result.deployment_time_ms)),
    ]);
    if let Some(opt) = &result.gas_optimization {
        table.add_row(vec![
            Cell::new("Gas savings"),
            Cell::new(format!("{} ({})", opt.estimated_savings, opt.technique)),
        ]);
    }
    if let Some(error) = &result.error {
        table.add_row(vec![Cell::new("Error"), Cell::new(error)]);
    }
    println!("{table}");

    if !result.configuration_txs.is_empty() {
        let mut txs = base_table();
        txs.set_header(vec!["Category", "Status", "Tx hash", "Gas", "Error"]);
        for tx in &result.configuration_txs {
            txs.add_row(vec![
                Cell::new(tx.category),
                Cell::new(tx.status),
                Cell::new(if tx.tx_hash.is_empty() { "-" } else { &tx.tx_hash }),
                Cell::new(tx.gas_used),
                Cell::new(tx.error.as_deref().unwrap_or("-")),
            ]);
        }
        println!("{txs}");
    }

    for warning in &result.warnings {
        println!("  ! {warning}");
    }
}
