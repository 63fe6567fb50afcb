use ethers::types::{Bytes, Filter, Log, H160, H256};
use std::str::FromStr;

pub fn transfer_log(contract_address: &str, block_number: u64) -> Log {
    transfer_log_at(contract_address, block_number, random_h256(), 0)
}

pub fn transfer_log_at(
    contract_address: &str,
    block_number: u64,
    transaction_hash: H256,
    log_index: u64,
) -> Log {
    Log {
        address: H160::from_str(contract_address).unwrap(),
        topics: vec![
            h256("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"),
            h256("0x000000000000000000000000b518b3136e491101f22b77f385fe22269c515188"),
            h256("0x0000000000000000000000007dfd6013cf8d92b751e63d481b51fe0e4c5abf5e"),
            h256("0x000000000000000000000000000000000000000000000000000000000000067d"),
        ],
        data: Bytes::default(),
        block_hash: Some(h256(
            "0x8fd4ca304a2e81854059bc3e42f32064cca8b6b453f6286f95060edc6382c6f8",
        )),
        block_number: Some(block_number.into()),
        transaction_hash: Some(transaction_hash),
        transaction_index: Some(89.into()),
        log_index: Some(log_index.into()),
        transaction_log_index: None,
        log_type: None,
        removed: Some(false),
    }
}

/// What a node returns for `filter`: the logs within its block range
pub fn logs_within(logs: &[Log], filter: &Filter) -> Vec<Log> {
    let from_block = filter.get_from_block().map_or(0, |block| block.as_u64());
    let to_block = filter.get_to_block().map_or(u64::MAX, |block| block.as_u64());

    logs.iter()
        .filter(|log| {
            log.block_number
                .map(|block_number| (from_block..=to_block).contains(&block_number.as_u64()))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

pub fn random_h256() -> H256 {
    H256::from(rand::random::<[u8; 32]>())
}

pub fn h256(str: &str) -> H256 {
    H256::from_str(str).unwrap()
}
