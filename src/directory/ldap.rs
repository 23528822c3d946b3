use std::any::type_name;
use std::time::Duration;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ldap3::{EntryStream, LdapConn, LdapConnSettings, SearchEntry, get_url_params};
use log::debug;
use url::Url;

use crate::config::backend::Authentication;
use crate::directory::{Attribute, Directory, Entries, Entry, Environment, Session};
use crate::request::SearchControls;

pub struct Ldap {
    conn_timeout: Option<Duration>,
}

impl Ldap {
    pub fn new(conn_timeout: Option<Duration>) -> Self {
        Self {
            conn_timeout,
        }
    }

    fn settings(&self) -> LdapConnSettings {
        let settings = LdapConnSettings::new();
        match self.conn_timeout {
            Some(timeout) => settings.set_conn_timeout(timeout),
            None => settings,
        }
    }
}

impl Directory for Ldap {
    fn open(&self, env: &Environment) -> Result<Box<dyn Session>> {
        let authentication = env.authentication()?;
        let url = Url::parse(env.provider_url)
            .with_context(|| format!("invalid provider URL '{}'", env.provider_url))?;
        let url_base = get_url_params(&url)?.base.into_owned();

        let mut conn = LdapConn::from_url_with_settings(self.settings(), &url)?;
        debug!("connected to '{}'", env.provider_url);

        match authentication {
            Authentication::None => {}
            Authentication::Simple => {
                conn.simple_bind(env.principal, env.credentials)?.success()?;
            }
            Authentication::External => {
                conn.sasl_external_bind()?.success()?;
            }
        }

        Ok(Box::new(LdapSession { conn, url_base }))
    }
}

pub struct LdapSession {
    conn: LdapConn,
    // DN path of the provider URL, the context searches are relative to
    url_base: String,
}

impl Session for LdapSession {
    fn class_name(&self) -> &'static str {
        type_name::<LdapConn>()
    }

    fn search(&mut self, base_dn: &str, filter: &str, controls: &SearchControls) -> Result<Entries<'_>> {
        let base = effective_base(base_dn, &self.url_base);
        let stream = self.conn.streaming_search(
            base.as_str(),
            controls.scope,
            filter,
            controls.returning_attributes.clone(),
        )?;

        Ok(Box::new(LdapEntries { stream: Some(stream), controls: controls.clone() }))
    }

    fn close(&mut self) -> Result<()> {
        Ok(self.conn.unbind()?)
    }
}

struct LdapEntries<'s> {
    stream: Option<EntryStream<'s, 's, String, Vec<String>>>,
    controls: SearchControls,
}

impl Iterator for LdapEntries<'_> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        let stream = self.stream.as_mut()?;
        loop {
            match stream.next() {
                Ok(Some(re)) => {
                    if re.is_ref() || re.is_intermediate() {
                        continue;
                    }
                    return Some(Ok(to_entry(SearchEntry::construct(re), &self.controls)));
                }
                Ok(None) => break,
                Err(err) => {
                    self.stream = None;
                    return Some(Err(err.into()));
                }
            }
        }

        // the final result code only arrives after the last entry
        let stream = self.stream.take()?;
        match stream.result().success() {
            Ok(_) => None,
            Err(err) => Some(Err(err.into())),
        }
    }
}

fn to_entry(entry: SearchEntry, controls: &SearchControls) -> Entry {
    let mut attributes: Vec<Attribute> = entry.attrs.into_iter()
        .map(|(id, values)| Attribute { id, values })
        .collect();

    for (id, values) in entry.bin_attrs {
        let encoded = values.iter().map(|v| STANDARD.encode(v));
        match attributes.iter_mut().find(|a| a.id == id) {
            Some(attr) => attr.values.extend(encoded),
            None => attributes.push(Attribute { id, values: encoded.collect() }),
        }
    }

    Entry::ordered(entry.dn, attributes, controls)
}

fn effective_base(base_dn: &str, url_base: &str) -> String {
    match (base_dn.trim().is_empty(), url_base.is_empty()) {
        (_, true) => base_dn.to_string(),
        (true, false) => url_base.to_string(),
        (false, false) => format!("{},{}", base_dn, url_base),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use ldap3::SearchEntry;

    use crate::directory::{Directory, Environment};
    use crate::directory::ldap::{Ldap, effective_base, to_entry};
    use crate::request::{ConnectionRequest, SearchControls};

    #[test]
    fn base_from_url_path() {
        assert_eq!(effective_base("ou=people", ""), "ou=people");
        assert_eq!(effective_base("", "dc=example,dc=org"), "dc=example,dc=org");
        assert_eq!(effective_base("ou=people", "dc=example,dc=org"), "ou=people,dc=example,dc=org");
        assert_eq!(effective_base("", ""), "");
    }

    #[test]
    fn binary_values_are_base64() {
        let mut request = ConnectionRequest::default();
        request.returned_attributes = "".to_string();
        let controls = SearchControls::new(&request);

        let entry = SearchEntry {
            dn: "cn=x".to_string(),
            attrs: HashMap::from([("cn".to_string(), vec!["x".to_string()])]),
            bin_attrs: HashMap::from([("objectGUID".to_string(), vec![vec![0xff, 0xfe, 0x00]])]),
        };
        let entry = to_entry(entry, &controls);

        assert_eq!(entry.attributes.len(), 2);
        assert_eq!(entry.attributes[0].id, "cn");
        assert_eq!(entry.attributes[1].id, "objectGUID");
        assert_eq!(entry.attributes[1].first_value(), "//4A");
    }

    #[test]
    fn malformed_url() {
        let mut request = ConnectionRequest::default();
        request.provider_url = "not a url".to_string();

        let err = Ldap::new(None).open(&Environment::new(&request)).err().unwrap();
        assert!(err.to_string().contains("invalid provider URL"));
    }

    #[test]
    fn unreachable_server() {
        let mut request = ConnectionRequest::default();
        request.provider_url = "ldap://127.0.0.1:1".to_string();
        request.security_authentication = "none".to_string();

        assert!(Ldap::new(None).open(&Environment::new(&request)).is_err());
    }
}
