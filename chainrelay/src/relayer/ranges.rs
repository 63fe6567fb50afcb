use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Inclusive block range
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[display("{from_block}..={to_block}")]
pub struct BlockRange {
    pub from_block: u64,
    pub to_block: u64,
}

impl BlockRange {
    pub fn new(from_block: u64, to_block: u64) -> Self {
        Self {
            from_block,
            to_block,
        }
    }

    /// The next batch to poll, never reaching past `current_height`.
    /// `None` when `current_height <= from_block`, i.e. nothing new to poll.
    pub fn next_batch(from_block: u64, batch_size: u64, current_height: u64) -> Option<Self> {
        if current_height <= from_block {
            return None;
        }

        let to_block = from_block.saturating_add(batch_size.saturating_sub(1)).min(current_height);

        Some(Self::new(from_block, to_block))
    }

    pub fn len(&self) -> u64 {
        self.to_block - self.from_block + 1
    }

    /// Cuts the range into at most `parts` contiguous, near-equal sub-ranges, in block order
    pub fn split(&self, parts: usize) -> Vec<BlockRange> {
        let parts = (parts.max(1) as u64).min(self.len());
        let base_len = self.len() / parts;
        let remainder = self.len() % parts;

        let mut from_block = self.from_block;

        (0..parts)
            .map(|part| {
                let len = if part < remainder { base_len + 1 } else { base_len };
                let sub_range = BlockRange::new(from_block, from_block + len - 1);
                from_block += len;

                sub_range
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_batches_at_chain_height() {
        assert_eq!(
            BlockRange::next_batch(1000, 1000, 1005),
            Some(BlockRange::new(1000, 1005))
        );
        assert_eq!(
            BlockRange::next_batch(1000, 100, 5000),
            Some(BlockRange::new(1000, 1099))
        );
    }

    #[test]
    fn has_no_batch_when_height_has_not_passed_from_block() {
        assert_eq!(BlockRange::next_batch(1006, 1000, 1005), None);
        assert_eq!(BlockRange::next_batch(1005, 1000, 1005), None);
    }

    #[test]
    fn splits_into_near_equal_contiguous_ranges() {
        let sub_ranges = BlockRange::new(1, 10).split(3);

        assert_eq!(
            sub_ranges,
            vec![
                BlockRange::new(1, 4),
                BlockRange::new(5, 7),
                BlockRange::new(8, 10)
            ]
        );
    }

    #[test]
    fn never_splits_into_more_ranges_than_blocks() {
        let sub_ranges = BlockRange::new(7, 8).split(5);

        assert_eq!(sub_ranges, vec![BlockRange::new(7, 7), BlockRange::new(8, 8)]);
    }

    #[test]
    fn covers_every_block_exactly_once() {
        let range = BlockRange::new(1000, 1999);

        let sub_ranges = range.split(7);

        assert_eq!(sub_ranges.len(), 7);
        assert_eq!(sub_ranges.first().unwrap().from_block, 1000);
        assert_eq!(sub_ranges.last().unwrap().to_block, 1999);
        assert_eq!(sub_ranges.iter().map(BlockRange::len).sum::<u64>(), range.len());
        for window in sub_ranges.windows(2) {
            assert_eq!(window[0].to_block + 1, window[1].from_block);
        }
    }
}
