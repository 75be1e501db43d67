use swapgate_core::shared::constants::SUPPORTED_CHAIN_IDS;
use swapgate_core::{Network, SwapCoreConfig};

fn main() {
    let config = match SwapCoreConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    println!("SwapGate Core Configuration ({}):\n", swapgate_core::VERSION);
    for (label, value) in config.describe() {
        println!("  {}: {}", label, value);
    }

    println!("\nSupported chains:");
    for chain_id in SUPPORTED_CHAIN_IDS {
        let name = Network::from_chain_id(*chain_id).map(|n| n.name()).unwrap_or("unknown");
        let tokens = swapgate_core::core::tokens::tokens_for_chain(*chain_id).len();
        println!("  {} ({}): {} tokens", name, chain_id, tokens);
    }
}
