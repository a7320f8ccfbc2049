//! List engines command.

use anyhow::Result;
use rotation_engines::EngineRegistry;

pub async fn run() -> Result<()> {
    let registry = EngineRegistry::new();

    println!("Available Engines");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for (key, info) in registry.list() {
        println!("  {} ({})", info.name, key);
        println!("  ───────────────────────────────────────────────────────");
        println!("  {}", info.description);
        println!();
        println!("  Defaults:");
        let defaults = serde_json::to_string_pretty(&info.default_config)?;
        for line in defaults.lines() {
            println!("    {}", line);
        }
        println!();
    }

    println!("Use `rotation backtest --engine <key>` to replay one.");
    println!("Engine settings are read from the [signal] and [rebalance] configuration sections.");

    Ok(())
}
