//! Environment-variable layer
//!
//! Only variables named by the schema are read (`DOCMUX_` + the field path
//! upper-cased, see [`env_var_name`](crate::schema::env_var_name)), so an
//! unrelated `DOCMUX_*` variable is ignored rather than rejected. List fields
//! are split on commas; every other value is passed through as a string and
//! converted during validation.

use crate::schema::{env_var_name, split_list, FieldKind, FIELDS};
use config::{ConfigError, Map, Source, Value, ValueKind};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    vars: BTreeMap<String, String>,
}

impl EnvSource {
    /// Layer built from an explicit variable set
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Layer built from the process environment
    pub fn from_process() -> Self {
        let prefix = format!("{}_", crate::schema::ENV_PREFIX);
        Self::from_vars(std::env::vars().filter(|(k, _)| k.starts_with(&prefix)))
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl Source for EnvSource {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, ConfigError> {
        let origin = "environment".to_string();
        let mut out = Map::new();
        for spec in FIELDS {
            let name = env_var_name(spec.path);
            let Some(raw) = self.vars.get(&name) else {
                continue;
            };
            log::debug!("option {} set from {}", spec.path, name);
            let kind = match spec.kind {
                FieldKind::StrList => ValueKind::Array(
                    split_list(raw)
                        .into_iter()
                        .map(|item| Value::new(Some(&origin), item))
                        .collect(),
                ),
                _ => ValueKind::String(raw.clone()),
            };
            out.insert(spec.path.to_string(), Value::new(Some(&origin), kind));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_schema_variables_are_read() {
        let source = EnvSource::from_vars([
            ("DOCMUX_HTML_NETWORK_ALLOW", "true"),
            ("DOCMUX_HTML_NETWORK_ALLOWED_HOSTS", "a.com, b.com"),
            ("DOCMUX_SOMETHING_ELSE", "x"),
            ("HOME", "/root"),
        ]);
        let map = source.collect().unwrap();
        assert_eq!(map.len(), 2);
        let hosts = map
            .get("html.network.allowed_hosts")
            .cloned()
            .unwrap()
            .into_array()
            .unwrap();
        let hosts: Vec<String> = hosts.into_iter().map(|v| v.into_string().unwrap()).collect();
        assert_eq!(hosts, vec!["a.com", "b.com"]);
        assert!(map.get("html.network.allow").cloned().unwrap().into_bool().unwrap());
    }
}
