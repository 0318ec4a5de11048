use serde::de::DeserializeOwned;

/// One untyped entry of a watched descriptor file.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDescriptor(serde_json::Value);

impl RawDescriptor {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.0.get(field)
    }

    /// Deserialize the category-specific fields.
    pub fn fields<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.0)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for RawDescriptor {
    fn from(value: serde_json::Value) -> Self {
        Self::new(value)
    }
}
