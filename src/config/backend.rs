use std::str::FromStr;

use anyhow::{bail, Error};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DirectoryBackend {
    #[default]
    Ldap,
    Test,
}

impl FromStr for DirectoryBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ldap" | "ldap3" | "com.sun.jndi.ldap.ldapctxfactory" => Ok(DirectoryBackend::Ldap),
            "test" => Ok(DirectoryBackend::Test),
            _ => bail!("unsupported initial context factory: '{}'", s),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Authentication {
    None,
    Simple,
    External,
}

impl Authentication {
    // an empty mode picks anonymous or simple depending on whether a principal is given
    pub fn resolve(mode: &str, principal: &str) -> anyhow::Result<Self> {
        let mode = mode.trim();
        if mode.is_empty() {
            return Ok(
                if principal.is_empty() { Authentication::None } else { Authentication::Simple }
            );
        }

        match mode.to_lowercase().as_str() {
            "none" => Ok(Authentication::None),
            "simple" => Ok(Authentication::Simple),
            "external" => Ok(Authentication::External),
            _ => bail!("unsupported authentication mode: '{}'", mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::backend::{Authentication, DirectoryBackend};

    #[test]
    fn factory_aliases() {
        for name in ["ldap", "LDAP3", "com.sun.jndi.ldap.LdapCtxFactory", " ldap "] {
            assert_eq!(name.parse::<DirectoryBackend>().unwrap(), DirectoryBackend::Ldap);
        }
        assert_eq!("Test".parse::<DirectoryBackend>().unwrap(), DirectoryBackend::Test);

        let err = "com.example.FooFactory".parse::<DirectoryBackend>().unwrap_err();
        assert!(err.to_string().contains("com.example.FooFactory"));
    }

    #[test]
    fn authentication_modes() {
        assert_eq!(Authentication::resolve("simple", "").unwrap(), Authentication::Simple);
        assert_eq!(Authentication::resolve("SIMPLE", "cn=x").unwrap(), Authentication::Simple);
        assert_eq!(Authentication::resolve("none", "cn=x").unwrap(), Authentication::None);
        assert_eq!(Authentication::resolve("EXTERNAL", "").unwrap(), Authentication::External);
        assert_eq!(Authentication::resolve("", "").unwrap(), Authentication::None);
        assert_eq!(Authentication::resolve("", "cn=x").unwrap(), Authentication::Simple);

        let err = Authentication::resolve("DIGEST-MD5", "cn=x").unwrap_err();
        assert_eq!(err.to_string(), "unsupported authentication mode: 'DIGEST-MD5'");
    }
}
