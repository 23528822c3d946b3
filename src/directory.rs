use std::time::Duration;

use anyhow::Result;

use crate::config::backend::{Authentication, DirectoryBackend};
use crate::directory::ldap::Ldap;
use crate::directory::test::Test;
use crate::request::{ConnectionRequest, SearchControls};

pub mod ldap;

/// Connection half of a request, the settings a directory session is opened with.
pub struct Environment<'a> {
    pub provider_url: &'a str,
    pub authentication: &'a str,
    pub principal: &'a str,
    pub credentials: &'a str,
}

impl<'a> Environment<'a> {
    pub fn new(request: &'a ConnectionRequest) -> Self {
        Self {
            provider_url: &request.provider_url,
            authentication: &request.security_authentication,
            principal: &request.security_principal,
            credentials: request.security_credentials.expose(),
        }
    }

    pub fn authentication(&self) -> Result<Authentication> {
        Authentication::resolve(self.authentication, self.principal)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub id: String,
    pub values: Vec<String>,
}

impl Attribute {
    pub fn first_value(&self) -> &str {
        self.values.first().map(String::as_str).unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub dn: String,
    pub attributes: Vec<Attribute>,
}

impl Entry {
    /// Requested attributes first in request order, the rest sorted by name.
    pub fn ordered(dn: String, mut attributes: Vec<Attribute>, controls: &SearchControls) -> Self {
        attributes.sort_by_key(|attr| (controls.position(&attr.id).unwrap_or(usize::MAX), attr.id.to_lowercase()));
        Self { dn, attributes }
    }
}

pub type Entries<'s> = Box<dyn Iterator<Item = Result<Entry>> + 's>;

pub trait Directory {
    fn open(&self, env: &Environment) -> Result<Box<dyn Session>>;
}

pub trait Session {
    fn class_name(&self) -> &'static str;
    fn search(&mut self, base_dn: &str, filter: &str, controls: &SearchControls) -> Result<Entries<'_>>;
    fn close(&mut self) -> Result<()>;
}

pub fn new(factory: &str, conn_timeout: Option<Duration>) -> Result<Box<dyn Directory>> {
    Ok(
        match factory.parse::<DirectoryBackend>()? {
            DirectoryBackend::Ldap => Box::new(Ldap::new(conn_timeout)),
            DirectoryBackend::Test => Box::new(Test),
        }
    )
}
