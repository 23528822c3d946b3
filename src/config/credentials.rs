use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

pub struct Credentials(SecretString);

impl Credentials {
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl From<String> for Credentials {
    fn from(s: String) -> Self {
        Credentials(SecretString::from(s))
    }
}

impl From<&str> for Credentials {
    fn from(s: &str) -> Self {
        Credentials::from(s.to_owned())
    }
}

impl Clone for Credentials {
    fn clone(&self) -> Self {
        Credentials::from(self.expose())
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Credentials::from(String::new())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials([REDACTED])")
    }
}

impl<'de> Deserialize<'de> for Credentials {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: Deserializer<'de> {
        let s = String::deserialize(deserializer)?;
        Ok(Credentials::from(s))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::credentials::Credentials;

    #[test]
    fn debug_is_redacted() {
        let credentials = Credentials::from("hunter2");
        let printed = format!("{:?}", credentials.clone());

        assert!(!printed.contains("hunter2"));
        assert_eq!(credentials.expose(), "hunter2");
    }
}
