use ldap3::Scope;
use serde::Deserialize;

use crate::config::credentials::Credentials;

const ATTRIBUTE_DELIMITER: char = '|';

/// Parameters of a single directory search, as entered by the operator.
///
/// Nothing here is validated; malformed values surface when the directory
/// client rejects them.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ConnectionRequest {
    #[serde(alias = "factory")]
    pub initial_context_factory: String,
    #[serde(alias = "url", alias = "uri")]
    pub provider_url: String,
    #[serde(alias = "authentication")]
    pub security_authentication: String,
    #[serde(alias = "principal", alias = "bind")]
    pub security_principal: String,
    #[serde(alias = "credentials", alias = "password")]
    pub security_credentials: Credentials,
    pub base_dn: String,
    #[serde(alias = "filter")]
    pub search_filter: String,
    #[serde(alias = "attributes")]
    pub returned_attributes: String,
}

impl Default for ConnectionRequest {
    fn default() -> Self {
        ConnectionRequest {
            initial_context_factory: "com.sun.jndi.ldap.LdapCtxFactory".to_string(),
            provider_url: "ldaps://ldap.myuniversity.edu:636".to_string(),
            security_authentication: "simple".to_string(),
            security_principal: "cn=username, ou=people, dc=myuniversity, dc=edu".to_string(),
            security_credentials: Credentials::from("password"),
            base_dn: "".to_string(),
            search_filter: "(&(objectClass=user)(sAMAccountName=username))".to_string(),
            returned_attributes: "memberof".to_string(),
        }
    }
}

/// Splits on the literal `|` character. Tokens are trimmed and empty ones dropped,
/// so an empty input asks for all user attributes.
pub fn split_attributes(returned_attributes: &str) -> Vec<String> {
    returned_attributes
        .split(ATTRIBUTE_DELIMITER)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Clone, Debug)]
pub struct SearchControls {
    pub scope: Scope,
    pub returning_attributes: Vec<String>,
}

impl SearchControls {
    pub fn new(request: &ConnectionRequest) -> Self {
        Self {
            scope: Scope::Subtree,
            returning_attributes: split_attributes(&request.returned_attributes),
        }
    }

    /// Whether `id` was asked for; an empty projection returns everything.
    pub fn returns(&self, id: &str) -> bool {
        self.returning_attributes.is_empty()
            || self.returning_attributes.iter().any(|a| a.eq_ignore_ascii_case(id))
    }

    /// Position of `id` in the requested list, used to order attributes of an entry.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.returning_attributes.iter().position(|a| a.eq_ignore_ascii_case(id))
    }
}

#[cfg(test)]
mod tests {
    use ldap3::Scope;

    use crate::request::{ConnectionRequest, SearchControls, split_attributes};

    #[test]
    fn single_attribute() {
        assert_eq!(split_attributes("memberof"), vec!["memberof"]);
    }

    #[test]
    fn literal_pipe_split() {
        assert_eq!(split_attributes("memberof|mail"), vec!["memberof", "mail"]);
        assert_eq!(split_attributes(" cn | sn ||mail|"), vec!["cn", "sn", "mail"]);
        assert!(split_attributes("").is_empty());
        assert!(split_attributes("|").is_empty());
    }

    #[test]
    fn controls_are_subtree() {
        let mut request = ConnectionRequest::default();
        request.returned_attributes = "memberOf|mail".to_string();
        let controls = SearchControls::new(&request);

        assert_eq!(controls.scope, Scope::Subtree);
        assert!(controls.returns("MEMBEROF"));
        assert!(!controls.returns("cn"));
        assert_eq!(controls.position("mail"), Some(1));
        assert_eq!(controls.position("cn"), None);

        request.returned_attributes = "".to_string();
        assert!(SearchControls::new(&request).returns("cn"));
    }
}
