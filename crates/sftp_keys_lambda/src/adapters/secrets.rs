pub trait SecretStore {
    /// Creates a new secret and returns its ARN.
    fn create_secret(&self, name: &str, description: &str, secret_string: &str)
        -> Result<String, String>;
}
