#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Written,
    AlreadyPresent,
}

pub trait KeyObjectStore {
    /// Number of objects whose key starts with `prefix`.
    fn count_objects_with_prefix(&self, prefix: &str) -> Result<usize, String>;

    /// Writes `body` only when no object named `key` exists yet.
    fn put_object_if_absent(&self, key: &str, body: &[u8]) -> Result<PutOutcome, String>;

    fn read_object(&self, key: &str) -> Result<Vec<u8>, String>;
}
