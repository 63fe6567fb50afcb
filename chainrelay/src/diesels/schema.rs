// Mirrors the SQL in repos::repo::SQLikeMigrations

diesel::table! {
  relayer_checkpoints (chain_id, contract_address) {
      chain_id -> VarChar,
      contract_address -> VarChar,
      last_processed_block -> Int8,
      last_processed_timestamp -> Timestamptz,
      total_events_processed -> Int8,
      event_metadata -> Json,
  }
}

diesel::table! {
  relayer_processed_events (event_id) {
      event_id -> VarChar,
      chain_id -> VarChar,
      contract_address -> VarChar,
      block_number -> Int8,
      transaction_hash -> VarChar,
      log_index -> Int8,
      event_name -> VarChar,
      processed_at -> Timestamptz,
      published -> Bool,
      event_metadata -> Json,
  }
}
