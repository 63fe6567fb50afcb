use chainrelay::{MessageBusConfig, RelayerConfig};

use super::{bayc_abi, BAYC_CONTRACT_ADDRESS};

/// Fresh chain id per test, so tests sharing a Postgres store never see each other's rows
pub fn unique_chain_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Relays BAYC transfers with retry delays short enough for tests
pub fn bayc_relayer_config(chain_id: &str, start_block: u64) -> RelayerConfig {
    RelayerConfig::new(chain_id, "http://localhost:8545", BAYC_CONTRACT_ADDRESS)
        .with_contract_abi(&bayc_abi())
        .add_event_name("Transfer")
        .with_message_bus(MessageBusConfig::new(
            "http://localhost:8085",
            "chainrelay",
            "bayc-transfers",
        ))
        .with_start_block(start_block)
        .with_poll_interval_seconds(1)
        .with_rpc_base_delay(0.001)
        .with_rpc_max_backoff(0.01)
        .with_rpc_max_retries(3)
        .with_rpc_timeout(5.0)
}
