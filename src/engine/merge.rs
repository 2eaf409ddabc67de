//! Pluggable associative merge strategies
//!
//! The engine stores merge operands lazily and folds them when a key is read
//! or compacted. A strategy supplies the operand for one write (`delta`), the
//! full fold over a base value plus pending operands (`resolve`), and an
//! optional pairwise pre-combination (`combine`).

/// Width of an encoded counter.
pub const COUNTER_SIZE: usize = std::mem::size_of::<u64>();

/// Associative reduction the engine invokes at read or compaction time.
pub trait MergeStrategy: Send + Sync {
    /// Name registered with the engine. Must stay stable for an existing store.
    fn name(&self) -> &'static str;

    /// Operand issued by a single merge write.
    fn delta(&self) -> Vec<u8>;

    /// Fold `operands` (oldest first) into `base`.
    fn resolve<'a>(
        &self,
        base: Option<&[u8]>,
        operands: &mut dyn Iterator<Item = &'a [u8]>,
    ) -> Vec<u8>;

    /// Combine two adjacent operands without a base value.
    ///
    /// `None` leaves both operands in place until a full resolve.
    fn combine(&self, _left: &[u8], _right: &[u8]) -> Option<Vec<u8>> {
        None
    }
}

/// Encode a counter as 8 little-endian bytes.
pub fn encode_counter(value: u64) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

/// Decode a counter. Short values are zero-extended, extra bytes ignored.
pub fn decode_counter(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; COUNTER_SIZE];
    let len = bytes.len().min(COUNTER_SIZE);
    buf[..len].copy_from_slice(&bytes[..len]);
    u64::from_le_bytes(buf)
}

/// u64 counter with `+1` deltas and pre-combination disabled, so every
/// operand survives until the full merge.
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterMerge;

impl MergeStrategy for CounterMerge {
    fn name(&self) -> &'static str {
        "CountMergeOperator"
    }

    fn delta(&self) -> Vec<u8> {
        encode_counter(1)
    }

    fn resolve<'a>(
        &self,
        base: Option<&[u8]>,
        operands: &mut dyn Iterator<Item = &'a [u8]>,
    ) -> Vec<u8> {
        let start = base.map(decode_counter).unwrap_or(0);
        let total = operands.fold(start, |acc, operand| {
            acc.wrapping_add(decode_counter(operand))
        });
        encode_counter(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_codec() {
        assert_eq!(encode_counter(0), vec![0; 8]);
        assert_eq!(decode_counter(&encode_counter(123_456)), 123_456);
        assert_eq!(decode_counter(&[]), 0);
        assert_eq!(decode_counter(&[7]), 7);
        assert_eq!(decode_counter(&[1, 0, 0, 0, 0, 0, 0, 0, 0xff]), 1);
    }

    #[test]
    fn test_resolve_folds_base_and_operands() {
        let merge = CounterMerge;
        let operands = vec![merge.delta(), merge.delta(), encode_counter(5)];

        let base = encode_counter(10);
        let mut iter = operands.iter().map(|op| op.as_slice());
        let resolved = merge.resolve(Some(base.as_slice()), &mut iter);
        assert_eq!(decode_counter(&resolved), 17);

        // A missing base counts as zero
        let mut iter = operands.iter().map(|op| op.as_slice());
        let resolved = merge.resolve(None, &mut iter);
        assert_eq!(decode_counter(&resolved), 7);
    }

    #[test]
    fn test_resolve_without_operands_keeps_base() {
        let merge = CounterMerge;
        let base = encode_counter(3);
        let resolved = merge.resolve(Some(base.as_slice()), &mut std::iter::empty::<&[u8]>());
        assert_eq!(decode_counter(&resolved), 3);
    }

    #[test]
    fn test_counter_never_pre_combines() {
        let merge = CounterMerge;
        assert!(merge.combine(&merge.delta(), &merge.delta()).is_none());
    }
}
