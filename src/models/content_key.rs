use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Builds the content key of a history record.
///
/// The key covers every field except the observation time, so storing an
/// unchanged snapshot again collides with the existing row and is ignored.
#[derive(Default)]
pub struct ContentKey {
    hasher: Sha256,
}

impl ContentKey {
    pub fn new(table: &str) -> Self {
        let mut key = Self::default();
        key.push_str(table);
        key
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        // Length prefix keeps ("ab", "c") and ("a", "bc") apart
        self.hasher.update((bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
    }

    pub fn push_str(&mut self, value: &str) -> &mut Self {
        self.push_bytes(value.as_bytes());
        self
    }

    pub fn push_opt_str(&mut self, value: Option<&str>) -> &mut Self {
        match value {
            Some(value) => {
                self.hasher.update([1u8]);
                self.push_str(value)
            }
            None => {
                self.hasher.update([0u8]);
                self
            }
        }
    }

    pub fn push_uuid(&mut self, value: &Uuid) -> &mut Self {
        self.push_bytes(value.as_bytes());
        self
    }

    pub fn push_i64(&mut self, value: i64) -> &mut Self {
        self.push_bytes(&value.to_le_bytes());
        self
    }

    pub fn push_f64(&mut self, value: f64) -> &mut Self {
        self.push_bytes(&value.to_bits().to_le_bytes());
        self
    }

    pub fn push_datetime(&mut self, value: &DateTime<Utc>) -> &mut Self {
        self.push_i64(value.timestamp_micros())
    }

    pub fn finish(&mut self) -> Uuid {
        let digest = std::mem::take(&mut self.hasher).finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Uuid::from_bytes(bytes)
    }
}
