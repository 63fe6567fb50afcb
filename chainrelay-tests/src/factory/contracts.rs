pub const TRANSFER_EVENT_ABI: &str =
    "event Transfer(address indexed from, address indexed to, uint256 indexed tokenId)";

pub const APPROVAL_FOR_ALL_EVENT_ABI: &str =
    "event ApprovalForAll(address indexed owner, address indexed operator, bool approved)";

pub const BAYC_CONTRACT_ADDRESS: &str = "0xBC4CA0EdA7647A8aB7C2061c2E118A18a936f13D";
pub const BAYC_CONTRACT_START_BLOCK_NUMBER: u64 = 17773490;

pub fn bayc_abi() -> String {
    format!("{TRANSFER_EVENT_ABI}\n{APPROVAL_FOR_ALL_EVENT_ABI}")
}
