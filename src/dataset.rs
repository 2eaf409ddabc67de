//! Deterministic synthetic dataset
//!
//! Every entry is a pure function of its index, so the loader and the read
//! prober agree on the key set without sharing any state.

/// Raw payload of the full dataset (4 GiB).
pub const RAW_PAYLOAD_BYTES: u64 = 4 * 1024 * 1024 * 1024;
pub const KEY_SIZE: usize = 32;
pub const VALUE_SIZE: usize = 96;
pub const ENTRY_SIZE: usize = KEY_SIZE + VALUE_SIZE;

const _: () = assert!(
    RAW_PAYLOAD_BYTES % ENTRY_SIZE as u64 == 0,
    "payload must be divisible by entry size"
);

/// Entries in the full dataset (33,554,432).
pub const ENTRY_COUNT: u64 = RAW_PAYLOAD_BYTES / ENTRY_SIZE as u64;

const ALPHABET_LEN: u64 = 26;

pub type Key = [u8; KEY_SIZE];
pub type Value = [u8; VALUE_SIZE];

/// Write the zero-padded decimal rendering of `index` into `buf`.
pub fn fill_key(index: u64, buf: &mut Key) {
    buf.fill(b'0');
    let mut rest = index;
    let mut pos = KEY_SIZE;
    // u64::MAX has 20 digits, so the loop never runs past the front.
    while rest > 0 {
        pos -= 1;
        buf[pos] = b'0' + (rest % 10) as u8;
        rest /= 10;
    }
}

/// Fill `buf` with `'a' + ((index + j) mod 26)` for every offset `j`.
pub fn fill_value(index: u64, buf: &mut Value) {
    let base = index % ALPHABET_LEN;
    for (j, byte) in buf.iter_mut().enumerate() {
        *byte = b'a' + ((base + j as u64) % ALPHABET_LEN) as u8;
    }
}

pub fn key(index: u64) -> Key {
    let mut buf = [0u8; KEY_SIZE];
    fill_key(index, &mut buf);
    buf
}

pub fn value(index: u64) -> Value {
    let mut buf = [0u8; VALUE_SIZE];
    fill_value(index, &mut buf);
    buf
}

/// Logical dataset: entries `0..entry_count` of the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dataset {
    entry_count: u64,
}

impl Dataset {
    /// The fixed 4 GiB dataset every CLI run operates on.
    pub fn full() -> Self {
        Self {
            entry_count: ENTRY_COUNT,
        }
    }

    /// A scaled-down prefix of the same generator.
    pub fn with_entries(entry_count: u64) -> Self {
        Self { entry_count }
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    pub fn raw_payload_bytes(&self) -> u64 {
        self.entry_count * ENTRY_SIZE as u64
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self::full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(ENTRY_SIZE, 128);
        assert_eq!(ENTRY_COUNT, 33_554_432);
        assert_eq!(Dataset::full().raw_payload_bytes(), RAW_PAYLOAD_BYTES);
    }

    #[test]
    fn test_key_is_padded_decimal() {
        for index in [0, 1, 9, 10, 12_345, ENTRY_COUNT - 1, u64::MAX] {
            let key = key(index);
            assert_eq!(key.len(), 32);
            let text = std::str::from_utf8(&key).unwrap();
            assert!(text.bytes().all(|b| b.is_ascii_digit()));
            assert_eq!(text.parse::<u64>().unwrap(), index);
        }
        assert_eq!(&key(42), b"00000000000000000000000000000042");
    }

    #[test]
    fn test_fill_key_overwrites_previous_contents() {
        let mut buf = key(987_654_321);
        fill_key(7, &mut buf);
        assert_eq!(buf, key(7));
    }

    #[test]
    fn test_value_pattern() {
        let v = value(0);
        assert_eq!(&v[..26], b"abcdefghijklmnopqrstuvwxyz");
        assert_eq!(v[26], b'a');

        let v = value(3);
        assert_eq!(v[0], b'd');
        assert_eq!(v[22], b'z');
        assert_eq!(v[23], b'a');

        // Index and index + 26 share a pattern
        assert_eq!(value(5), value(31));
        assert!(value(u64::MAX).iter().all(|b| b.is_ascii_lowercase()));
    }

    #[test]
    fn test_generator_is_pure() {
        for index in [0, 17, 1_000, ENTRY_COUNT / 2, ENTRY_COUNT - 1] {
            assert_eq!(key(index), key(index));
            assert_eq!(value(index), value(index));
        }
    }

    #[test]
    fn test_scaled_dataset() {
        let dataset = Dataset::with_entries(1_000);
        assert_eq!(dataset.entry_count(), 1_000);
        assert_eq!(dataset.raw_payload_bytes(), 128_000);
    }
}
