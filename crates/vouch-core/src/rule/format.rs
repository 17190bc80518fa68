//! Format predicate rules: email, IP addresses, URL, phone.
//!
//! These rules never rewrite a value. The stringified value either passes the
//! predicate and the input value is returned, or the field fails with a
//! `FormatViolation`.

use std::net::{Ipv4Addr, Ipv6Addr};

use phonenumber::country;
use url::Url;
use vouch_contracts::{MessageKey, Value, Violation, VouchError, VouchResult};

use crate::rule::{Common, Configure};
use crate::traits::Parse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Email,
    Ipv4,
    Ipv6,
    Url,
}

impl Format {
    fn message_key(self) -> MessageKey {
        match self {
            Format::Email => MessageKey::Email,
            Format::Ipv4 => MessageKey::Ipv4,
            Format::Ipv6 => MessageKey::Ipv6,
            Format::Url => MessageKey::Url,
        }
    }

    pub fn check(self, s: &str) -> bool {
        match self {
            Format::Email => is_email(s),
            Format::Ipv4 => s.parse::<Ipv4Addr>().is_ok(),
            Format::Ipv6 => s.parse::<Ipv6Addr>().is_ok(),
            Format::Url => is_url(s),
        }
    }
}

/// Reads the address out of `Name <addr>` or takes the whole string, then
/// requires `local@domain` without whitespace.
fn is_email(s: &str) -> bool {
    let s = s.trim();
    let address = match (s.rfind('<'), s.ends_with('>')) {
        (Some(start), true) => &s[start + 1..s.len() - 1],
        _ => s,
    };
    match address.rsplit_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !address.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn is_url(s: &str) -> bool {
    match Url::parse(s) {
        Ok(url) => !url.scheme().is_empty() && url.host().is_some(),
        Err(_) => false,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Email, IPv4, IPv6, or URL.
#[derive(Debug, Clone)]
pub struct FormatRule {
    pub common: Common,
    pub format: Format,
}

impl FormatRule {
    pub fn new(format: Format) -> Self {
        Self {
            common: Common::default(),
            format,
        }
    }

    pub fn email() -> Self {
        Self::new(Format::Email)
    }

    pub fn ipv4() -> Self {
        Self::new(Format::Ipv4)
    }

    pub fn ipv6() -> Self {
        Self::new(Format::Ipv6)
    }

    pub fn url() -> Self {
        Self::new(Format::Url)
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.common.default = Some(value.into());
        self
    }
}

impl Configure for FormatRule {
    fn common_mut(&mut self) -> &mut Common {
        &mut self.common
    }
}

impl Parse for FormatRule {
    fn common(&self) -> &Common {
        &self.common
    }

    fn parse(&self, key: &str, value: Value) -> VouchResult<Value> {
        if self.format.check(&stringify(&value)) {
            Ok(value)
        } else {
            Err(Violation::new(self.format.message_key(), key, &value).into())
        }
    }
}

/// Phone number valid for a region, `CN` unless configured otherwise.
#[derive(Debug, Clone)]
pub struct PhoneRule {
    pub common: Common,
    pub region: String,
    country: country::Id,
}

impl PhoneRule {
    pub fn new() -> Self {
        Self {
            common: Common::default(),
            region: "CN".to_string(),
            country: country::Id::CN,
        }
    }

    /// Set the region by its ISO 3166-1 alpha-2 code.
    pub fn region(mut self, region: &str) -> VouchResult<Self> {
        let code = region.trim().to_uppercase();
        self.country = code.parse::<country::Id>().map_err(|_| VouchError::ConfigError {
            reason: format!("unknown phone region `{region}`"),
        })?;
        self.region = code;
        Ok(self)
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.common.default = Some(value.into());
        self
    }

    fn is_valid(&self, s: &str) -> bool {
        phonenumber::parse(Some(self.country), s)
            .map(|number| number.is_valid())
            .unwrap_or(false)
    }
}

impl Default for PhoneRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Configure for PhoneRule {
    fn common_mut(&mut self) -> &mut Common {
        &mut self.common
    }
}

impl Parse for PhoneRule {
    fn common(&self) -> &Common {
        &self.common
    }

    fn parse(&self, key: &str, value: Value) -> VouchResult<Value> {
        if self.is_valid(&stringify(&value)) {
            Ok(value)
        } else {
            Err(Violation::with_param(MessageKey::Phone, key, &value, "region", &self.region).into())
        }
    }
}
