use std::collections::HashMap;
use std::str::FromStr;

use ethers::abi::{Abi, Event, HumanReadableParser, RawLog, Token};
use ethers::types::{Address, Bytes, Log, H256, I256};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::ConfigError;
use crate::hashes::Hashes;

pub type ContractEventTopic = H256;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Log has no topics")]
    NoTopics,
    #[error("Log topic {0:?} does not match any relayed event")]
    UnknownTopic(H256),
    #[error("Could not decode log: {0}")]
    Abi(#[from] ethers::abi::Error),
}

#[derive(Debug, Clone)]
pub struct ContractEvent {
    pub name: String,
    pub value: Event,
}

impl ContractEvent {
    pub fn new(value: Event) -> Self {
        Self {
            name: value.name.clone(),
            value,
        }
    }

    pub fn topic(&self) -> ContractEventTopic {
        self.value.signature()
    }
}

/// A log decoded against the ABI of the event that emitted it
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLog {
    pub event_name: String,
    pub args: Value,
}

/// The relayed events of a single contract, indexed both by name and by topic0.
#[derive(Debug, Clone)]
pub struct ContractEvents {
    pub address: Address,
    events_by_topic: HashMap<ContractEventTopic, ContractEvent>,
    topics_by_name: HashMap<String, Vec<ContractEventTopic>>,
}

impl ContractEvents {
    /// Resolves `event_names` against `contract_abi`.
    ///
    /// `contract_abi` is either a JSON ABI (an array, or an artifact object with an `abi` key)
    /// or one human-readable event signature per line, e.g.
    /// `event Transfer(address indexed from, address indexed to, uint256 value)`.
    pub fn parse(
        contract_address: &str,
        contract_abi: &str,
        event_names: &[String],
    ) -> Result<Self, ConfigError> {
        let address = Address::from_str(contract_address.trim())
            .map_err(|_| ConfigError::InvalidContractAddress(contract_address.to_string()))?;

        let declared_events = parse_abi_events(contract_abi)?;

        let mut events_by_topic = HashMap::new();
        let mut topics_by_name: HashMap<String, Vec<ContractEventTopic>> = HashMap::new();

        for event_name in event_names {
            let matching: Vec<_> =
                declared_events.iter().filter(|event| &event.name == event_name).collect();

            if matching.is_empty() {
                return Err(ConfigError::UnknownEvent(event_name.clone()));
            }

            for event in matching {
                let contract_event = ContractEvent::new(event.clone());
                let topic = contract_event.topic();

                topics_by_name.entry(event_name.clone()).or_default().push(topic);
                events_by_topic.insert(topic, contract_event);
            }
        }

        Ok(Self {
            address,
            events_by_topic,
            topics_by_name,
        })
    }

    pub fn get_topics(&self, event_names: &[String]) -> Result<Vec<ContractEventTopic>, ConfigError> {
        let mut topics = vec![];

        for event_name in event_names {
            let event_topics = self
                .topics_by_name
                .get(event_name)
                .ok_or_else(|| ConfigError::UnknownEvent(event_name.clone()))?;

            topics.extend(event_topics.iter().copied());
        }

        Ok(topics)
    }

    pub fn decode(&self, log: &Log) -> Result<DecodedLog, DecodeError> {
        let topic0 = log.topics.first().ok_or(DecodeError::NoTopics)?;
        let event = self.events_by_topic.get(topic0).ok_or(DecodeError::UnknownTopic(*topic0))?;

        let parsed = event.value.parse_log(RawLog {
            topics: log.topics.clone(),
            data: log.data.to_vec(),
        })?;

        let args = parsed.params.into_iter().fold(Map::new(), |mut args, param| {
            args.insert(param.name, token_to_json(param.value));

            args
        });

        Ok(DecodedLog {
            event_name: event.name.clone(),
            args: Value::Object(args),
        })
    }
}

fn parse_abi_events(contract_abi: &str) -> Result<Vec<Event>, ConfigError> {
    let contract_abi = contract_abi.trim();

    if contract_abi.is_empty() {
        return Err(ConfigError::InvalidAbi("ABI is empty".to_string()));
    }

    if contract_abi.starts_with('[') || contract_abi.starts_with('{') {
        let value: Value = serde_json::from_str(contract_abi)
            .map_err(|error| ConfigError::InvalidAbi(error.to_string()))?;

        // Build artifacts (hardhat, foundry) nest the ABI
        let value = match value {
            Value::Object(mut artifact) => artifact.remove("abi").unwrap_or(Value::Null),
            value => value,
        };

        let abi: Abi = serde_json::from_value(value)
            .map_err(|error| ConfigError::InvalidAbi(error.to_string()))?;

        Ok(abi.events().cloned().collect())
    } else {
        contract_abi
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                HumanReadableParser::parse_event(line)
                    .map_err(|error| ConfigError::InvalidAbi(format!("{line}: {error}")))
            })
            .collect()
    }
}

fn token_to_json(token: Token) -> Value {
    match token {
        Token::Address(address) => Value::String(Hashes::h160_to_string(&address)),
        Token::FixedBytes(bytes) | Token::Bytes(bytes) => Value::String(Bytes::from(bytes).to_string()),
        Token::Uint(uint) => Value::String(uint.to_string()),
        Token::Int(int) => Value::String(I256::from_raw(int).to_string()),
        Token::Bool(boolean) => Value::Bool(boolean),
        Token::String(string) => Value::String(string),
        Token::FixedArray(tokens) | Token::Array(tokens) | Token::Tuple(tokens) => {
            Value::Array(tokens.into_iter().map(token_to_json).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::U256;

    const BAYC: &str = "0xBC4CA0EdA7647A8aB7C2061c2E118A18a936f13D";
    const TRANSFER_EVENT_ABI: &str =
        "event Transfer(address indexed from, address indexed to, uint256 indexed tokenId)";
    const APPROVAL_FOR_ALL_EVENT_ABI: &str =
        "event ApprovalForAll(address indexed owner, address indexed operator, bool approved)";

    fn h256(str: &str) -> H256 {
        H256::from_str(str).unwrap()
    }

    fn transfer_log() -> Log {
        Log {
            address: Address::from_str(BAYC).unwrap(),
            topics: vec![
                h256("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"),
                h256("0x000000000000000000000000b518b3136e491101f22b77f385fe22269c515188"),
                h256("0x0000000000000000000000007dfd6013cf8d92b751e63d481b51fe0e4c5abf5e"),
                h256("0x000000000000000000000000000000000000000000000000000000000000067d"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn resolves_topics_from_human_readable_signatures() {
        let abi = format!("{TRANSFER_EVENT_ABI}\n{APPROVAL_FOR_ALL_EVENT_ABI}");
        let contract_events =
            ContractEvents::parse(BAYC, &abi, &["Transfer".to_string()]).unwrap();

        let topics = contract_events.get_topics(&["Transfer".to_string()]).unwrap();

        assert_eq!(
            topics,
            vec![h256("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")]
        );
        assert!(contract_events.get_topics(&["ApprovalForAll".to_string()]).is_err());
    }

    #[test]
    fn resolves_topics_from_json_abi() {
        let abi = r#"[{
            "anonymous": false,
            "inputs": [
                {"indexed": true, "name": "from", "type": "address"},
                {"indexed": true, "name": "to", "type": "address"},
                {"indexed": false, "name": "value", "type": "uint256"}
            ],
            "name": "Transfer",
            "type": "event"
        }]"#;

        let contract_events =
            ContractEvents::parse(BAYC, abi, &["Transfer".to_string()]).unwrap();

        assert_eq!(contract_events.get_topics(&["Transfer".to_string()]).unwrap().len(), 1);
    }

    #[test]
    fn rejects_events_missing_from_abi() {
        let result = ContractEvents::parse(BAYC, TRANSFER_EVENT_ABI, &["Approval".to_string()]);

        assert!(matches!(result, Err(ConfigError::UnknownEvent(name)) if name == "Approval"));
    }

    #[test]
    fn rejects_invalid_contract_address() {
        let result =
            ContractEvents::parse("not-an-address", TRANSFER_EVENT_ABI, &["Transfer".to_string()]);

        assert!(matches!(result, Err(ConfigError::InvalidContractAddress(_))));
    }

    #[test]
    fn decodes_indexed_args() {
        let contract_events =
            ContractEvents::parse(BAYC, TRANSFER_EVENT_ABI, &["Transfer".to_string()]).unwrap();

        let decoded = contract_events.decode(&transfer_log()).unwrap();

        assert_eq!(decoded.event_name, "Transfer");
        assert_eq!(
            decoded.args["from"],
            "0xb518b3136e491101f22b77f385fe22269c515188"
        );
        assert_eq!(decoded.args["to"], "0x7dfd6013cf8d92b751e63d481b51fe0e4c5abf5e");
        assert_eq!(decoded.args["tokenId"], U256::from(0x67d).to_string());
    }

    #[test]
    fn fails_to_decode_unrelayed_topics() {
        let contract_events =
            ContractEvents::parse(BAYC, TRANSFER_EVENT_ABI, &["Transfer".to_string()]).unwrap();
        let mut log = transfer_log();
        log.topics[0] = H256::zero();

        assert!(matches!(
            contract_events.decode(&log),
            Err(DecodeError::UnknownTopic(_))
        ));
    }
}
