//! Service names as typed on the command line

use std::fmt;

/// A service argument such as `nginx`, `nginx.service` or `app@worker1`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitName {
    prefix: String,
    instance: Option<String>,
}

impl UnitName {
    pub fn parse(input: &str) -> Self {
        let name = normalize_service_name(input);
        match name.split_once('@') {
            Some((prefix, instance)) => Self {
                prefix: prefix.to_string(),
                instance: (!instance.is_empty()).then(|| instance.to_string()),
            },
            None => Self {
                prefix: name.to_string(),
                instance: None,
            },
        }
    }

    /// Instance name for template units
    pub fn instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }

    /// Name of the OpenRC script (`app@worker1`)
    pub fn service_name(&self) -> String {
        match &self.instance {
            Some(instance) => format!("{}@{}", self.prefix, instance),
            None => self.prefix.clone(),
        }
    }

    /// Full systemd unit name (`app@worker1.service`)
    pub fn unit_name(&self) -> String {
        format!("{}.service", self.service_name())
    }

    /// File name to look up in the unit search path (`app@.service` for instances)
    pub fn unit_file_name(&self) -> String {
        match &self.instance {
            Some(_) => format!("{}@.service", self.prefix),
            None => format!("{}.service", self.prefix),
        }
    }
}

impl fmt::Display for UnitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.service_name())
    }
}

/// Strip surrounding whitespace and a trailing `.service`
pub fn normalize_service_name(name: &str) -> &str {
    let name = name.trim();
    name.strip_suffix(".service").unwrap_or(name).trim()
}
