use crc32fast::Hasher;

/// Derive a stable document seed from an article key using CRC32
pub fn get_document_id(key: &str) -> String {
    let mut buff = String::from(key);
    if !key.starts_with("article://") {
        buff = format!("article://{}", buff);
    }

    let mut hasher = Hasher::new();
    hasher.update(buff.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// CRC32 fingerprint of arbitrary content
pub fn fingerprint(content: &str) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(content.as_bytes());
    hasher.finalize()
}

/// Sequential ID generator for blocks and comment anchors within a session
#[derive(Debug, Clone)]
pub struct IDGenerator {
    seed: String,
    count: u32,
}

impl IDGenerator {
    pub fn new(key: &str) -> Self {
        Self {
            seed: get_document_id(key),
            count: 0,
        }
    }

    pub fn from_seed(seed: String) -> Self {
        Self { seed, count: 0 }
    }

    /// Generate next sequential ID
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    /// Next ID that `taken` does not already claim
    pub fn new_unique_id(&mut self, taken: impl Fn(&str) -> bool) -> String {
        loop {
            let id = self.new_id();
            if !taken(&id) {
                return id;
            }
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_generation() {
        let id1 = get_document_id("draft");
        let id2 = get_document_id("draft");
        assert_eq!(id1, id2);

        let id3 = get_document_id("other");
        assert_ne!(id1, id3);
    }

    #[test]
    fn test_sequential_ids() {
        let mut gen = IDGenerator::new("draft");

        let id1 = gen.new_id();
        let id2 = gen.new_id();

        assert!(id1.ends_with("-1"));
        assert!(id2.ends_with("-2"));
        assert!(id1.starts_with(gen.seed()));
    }

    #[test]
    fn test_unique_ids_skip_taken() {
        let mut gen = IDGenerator::from_seed("comment".to_string());
        let id = gen.new_unique_id(|candidate| candidate == "comment-1" || candidate == "comment-2");
        assert_eq!(id, "comment-3");
    }
}
