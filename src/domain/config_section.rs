// SPDX-License-Identifier: MIT OR Apache-2.0

//! Snapshot of one branch of the configuration tree, plus best-effort binding helpers.
//!
//! Binding never fails as a whole. Each value that is missing is left untouched and each value
//! that fails to convert is logged at `debug` and skipped, so one bad key cannot take down the
//! rest of an options object.

use crate::domain::config_key::ConfigKey;
use crate::domain::config_value::ConfigValue;
use crate::ports::Bind;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

/// An immutable view of every key under one path.
///
/// Keys inside the section are relative to [`path`](ConfigSection::path). A value stored
/// directly at the path is reachable through [`value`](ConfigSection::value).
///
/// # Examples
///
/// ```
/// use hexopts::domain::{ConfigKey, ConfigSection, ConfigValue};
///
/// let section = ConfigSection::new(
///     ConfigKey::from("server"),
///     [("host", "localhost"), ("port", "8080"), ("tls.enabled", "true")]
///         .into_iter()
///         .map(|(k, v)| (ConfigKey::from(k), ConfigValue::from(v))),
/// );
///
/// let mut port = 0u16;
/// section.bind_value("port", &mut port);
/// assert_eq!(port, 8080);
///
/// let tls = section.section("tls");
/// assert_eq!(tls.path().as_str(), "server.tls");
/// assert_eq!(section.children(), vec!["host", "port", "tls"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigSection {
    path: ConfigKey,
    entries: BTreeMap<ConfigKey, ConfigValue>,
}

impl ConfigSection {
    /// Creates a section at `path` from entries whose keys are already relative to it.
    pub fn new<I>(path: ConfigKey, entries: I) -> Self
    where
        I: IntoIterator<Item = (ConfigKey, ConfigValue)>,
    {
        Self {
            path,
            entries: entries.into_iter().collect(),
        }
    }

    /// Creates the section at `path` from a flat map of absolute keys.
    pub fn from_flat<'a, I>(path: ConfigKey, flat: I) -> Self
    where
        I: IntoIterator<Item = (&'a ConfigKey, &'a ConfigValue)>,
    {
        let prefix = path.clone();
        Self::under(path, &prefix, flat)
    }

    fn under<'a, I>(path: ConfigKey, prefix: &ConfigKey, flat: I) -> Self
    where
        I: IntoIterator<Item = (&'a ConfigKey, &'a ConfigValue)>,
    {
        let entries = flat
            .into_iter()
            .filter_map(|(key, value)| key.relative_to(prefix).map(|rel| (rel, value.clone())))
            .collect();
        Self { path, entries }
    }

    /// Absolute path of this section.
    pub fn path(&self) -> &ConfigKey {
        &self.path
    }

    /// True when no key lives at or below this path.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The value stored directly at this path, if any.
    pub fn value(&self) -> Option<&ConfigValue> {
        self.entries.get(&ConfigKey::root())
    }

    /// Looks up a key relative to this section.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(&ConfigKey::from(key))
    }

    /// Iterates over every relative key and its value.
    pub fn iter(&self) -> impl Iterator<Item = (&ConfigKey, &ConfigValue)> {
        self.entries.iter()
    }

    /// Returns the sub-section at `key` (which may itself contain dots).
    pub fn section(&self, key: &str) -> ConfigSection {
        Self::under(self.path.child(key), &ConfigKey::from(key), &self.entries)
    }

    /// Distinct immediate child names.
    ///
    /// Numeric names come first in numeric order, so `"10"` sorts after `"9"`; the rest follow
    /// in lexical order.
    pub fn children(&self) -> Vec<String> {
        let mut children: Vec<String> = Vec::new();
        for key in self.entries.keys() {
            if let Some(first) = key.first_segment() {
                if !children.iter().any(|c| c == first) {
                    children.push(first.to_string());
                }
            }
        }
        children.sort_by(|a, b| compare_child_names(a, b));
        children
    }

    /// Assigns the converted value at `key` to `target`. Returns whether `target` changed.
    pub fn bind_value<V>(&self, key: &str, target: &mut V) -> bool
    where
        V: FromStr,
        V::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.convert(key, self.get(key)) {
            Some(value) => {
                *target = value;
                true
            }
            None => false,
        }
    }

    /// Like [`bind_value`](Self::bind_value) for nullable targets; a blank value binds `None`.
    pub fn bind_option<V>(&self, key: &str, target: &mut Option<V>) -> bool
    where
        V: FromStr,
        V::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get(key) {
            Some(raw) if raw.as_str().trim().is_empty() => {
                *target = None;
                true
            }
            raw => match self.convert(key, raw) {
                Some(value) => {
                    *target = Some(value);
                    true
                }
                None => false,
            },
        }
    }

    /// Binds a boolean, accepting `true/false`, `yes/no`, `on/off` and `1/0`.
    pub fn bind_flag(&self, key: &str, target: &mut bool) -> bool {
        let Some(raw) = self.get(key) else {
            return false;
        };
        match raw.as_bool(&self.path.child(key).into_string()) {
            Ok(value) => {
                *target = value;
                true
            }
            Err(e) => {
                tracing::debug!("Skipping unbindable configuration value: {}", e);
                false
            }
        }
    }

    /// Binds the nested object at `key`, if the section has any keys there.
    pub fn bind_section<B: Bind>(&self, key: &str, target: &mut B) -> bool {
        let section = self.section(key);
        if section.is_empty() {
            return false;
        }
        target.bind(&section);
        true
    }

    /// Inserts every leaf child of `key` into a string-keyed map.
    pub fn bind_map<V, M>(&self, key: &str, target: &mut M)
    where
        V: FromStr,
        V::Err: std::error::Error + Send + Sync + 'static,
        M: Extend<(String, V)>,
    {
        let section = self.section(key);
        for child in section.children() {
            if let Some(value) = section.convert(&child, section.get(&child)) {
                target.extend(std::iter::once((child, value)));
            }
        }
    }

    /// Binds every child object of `key` into a string-keyed map of nested options.
    ///
    /// Existing entries are bound over rather than replaced.
    pub fn bind_map_sections<B>(&self, key: &str, target: &mut HashMap<String, B>)
    where
        B: Bind + Default,
    {
        let section = self.section(key);
        for child in section.children() {
            let entry = target.entry(child.clone()).or_default();
            entry.bind(&section.section(&child));
        }
    }

    /// Appends every leaf child of `key` to `target`, in child order.
    pub fn bind_vec<V>(&self, key: &str, target: &mut Vec<V>)
    where
        V: FromStr,
        V::Err: std::error::Error + Send + Sync + 'static,
    {
        let section = self.section(key);
        target.extend(
            section
                .children()
                .iter()
                .filter_map(|child| section.convert(child, section.get(child))),
        );
    }

    /// Appends one bound object per child of `key` to `target`, in child order.
    pub fn bind_vec_sections<B>(&self, key: &str, target: &mut Vec<B>)
    where
        B: Bind + Default,
    {
        let section = self.section(key);
        for child in section.children() {
            let mut item = B::default();
            item.bind(&section.section(&child));
            target.push(item);
        }
    }

    fn convert<V>(&self, key: &str, raw: Option<&ConfigValue>) -> Option<V>
    where
        V: FromStr,
        V::Err: std::error::Error + Send + Sync + 'static,
    {
        let raw = raw?;
        match raw.parse::<V>(self.path.child(key).as_str()) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!("Skipping unbindable configuration value: {}", e);
                None
            }
        }
    }
}

fn compare_child_names(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(pairs: &[(&str, &str)]) -> ConfigSection {
        ConfigSection::new(
            ConfigKey::root(),
            pairs
                .iter()
                .map(|(k, v)| (ConfigKey::from(*k), ConfigValue::from(*v))),
        )
    }

    #[derive(Debug, Default, PartialEq)]
    struct Endpoint {
        host: String,
        port: u16,
    }

    impl Bind for Endpoint {
        fn bind(&mut self, section: &ConfigSection) {
            section.bind_value("host", &mut self.host);
            section.bind_value("port", &mut self.port);
        }
    }

    #[derive(Debug, PartialEq)]
    enum Mode {
        Fast,
        Safe,
    }

    #[derive(Debug)]
    struct UnknownMode;

    impl std::fmt::Display for UnknownMode {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "unknown mode")
        }
    }

    impl std::error::Error for UnknownMode {}

    impl FromStr for Mode {
        type Err = UnknownMode;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "fast" => Ok(Mode::Fast),
                "safe" => Ok(Mode::Safe),
                _ => Err(UnknownMode),
            }
        }
    }

    #[test]
    fn test_from_flat_strips_prefix() {
        let flat: BTreeMap<ConfigKey, ConfigValue> = [
            ("db.host", "x"),
            ("db.port", "5432"),
            ("dbx.host", "y"),
            ("db", "top"),
        ]
        .into_iter()
        .map(|(k, v)| (ConfigKey::from(k), ConfigValue::from(v)))
        .collect();

        let db = ConfigSection::from_flat(ConfigKey::from("db"), &flat);
        assert_eq!(db.get("host").unwrap().as_str(), "x");
        assert_eq!(db.value().unwrap().as_str(), "top");
        assert!(db.get("dbx.host").is_none());
        assert_eq!(db.children(), vec!["host", "port"]);
    }

    #[test]
    fn test_bind_value_swallows_conversion_errors() {
        let s = section(&[("port", "not-a-port"), ("retries", "3")]);
        let mut port = 80u16;
        let mut retries = 0u32;

        assert!(!s.bind_value("port", &mut port));
        assert!(s.bind_value("retries", &mut retries));
        assert_eq!(port, 80);
        assert_eq!(retries, 3);
    }

    #[test]
    fn test_bind_value_missing_key_leaves_target() {
        let s = section(&[]);
        let mut name = "keep".to_string();
        assert!(!s.bind_value("name", &mut name));
        assert_eq!(name, "keep");
    }

    #[test]
    fn test_bind_enum_via_from_str() {
        let s = section(&[("mode", "safe"), ("other", "bogus")]);
        let mut mode = Mode::Fast;
        s.bind_value("mode", &mut mode);
        assert_eq!(mode, Mode::Safe);
        assert!(!s.bind_value("other", &mut mode));
    }

    #[test]
    fn test_bind_option() {
        let s = section(&[("timeout", "30"), ("limit", ""), ("bad", "x")]);
        let mut timeout: Option<u64> = None;
        let mut limit: Option<u64> = Some(5);
        let mut bad: Option<u64> = Some(1);

        s.bind_option("timeout", &mut timeout);
        s.bind_option("limit", &mut limit);
        s.bind_option("bad", &mut bad);

        assert_eq!(timeout, Some(30));
        assert_eq!(limit, None);
        assert_eq!(bad, Some(1));
    }

    #[test]
    fn test_bind_flag() {
        let s = section(&[("enabled", "yes"), ("broken", "perhaps")]);
        let mut enabled = false;
        let mut broken = true;
        assert!(s.bind_flag("enabled", &mut enabled));
        assert!(!s.bind_flag("broken", &mut broken));
        assert!(enabled);
        assert!(broken);
    }

    #[test]
    fn test_bind_section_nested() {
        let s = section(&[("primary.host", "a"), ("primary.port", "1")]);
        let mut primary = Endpoint::default();
        let mut missing = Endpoint::default();

        assert!(s.bind_section("primary", &mut primary));
        assert!(!s.bind_section("secondary", &mut missing));
        assert_eq!(
            primary,
            Endpoint {
                host: "a".to_string(),
                port: 1
            }
        );
    }

    #[test]
    fn test_bind_map_inserts() {
        let s = section(&[("weights.a", "1"), ("weights.b", "2"), ("weights.c", "x")]);
        let mut weights: HashMap<String, i32> = HashMap::new();
        weights.insert("a".to_string(), 100);
        weights.insert("z".to_string(), 26);

        s.bind_map("weights", &mut weights);

        assert_eq!(weights.get("a"), Some(&1));
        assert_eq!(weights.get("b"), Some(&2));
        assert_eq!(weights.get("z"), Some(&26));
        assert!(!weights.contains_key("c"));
    }

    #[test]
    fn test_bind_map_sections() {
        let s = section(&[
            ("hosts.east.host", "e"),
            ("hosts.east.port", "1"),
            ("hosts.west.host", "w"),
        ]);
        let mut hosts: HashMap<String, Endpoint> = HashMap::new();
        s.bind_map_sections("hosts", &mut hosts);

        assert_eq!(hosts["east"].port, 1);
        assert_eq!(hosts["west"].host, "w");
        assert_eq!(hosts["west"].port, 0);
    }

    #[test]
    fn test_bind_vec_appends_in_numeric_order() {
        let s = section(&[
            ("items.0", "zero"),
            ("items.10", "ten"),
            ("items.2", "two"),
        ]);
        let mut items = vec!["existing".to_string()];
        s.bind_vec("items", &mut items);
        assert_eq!(items, vec!["existing", "zero", "two", "ten"]);
    }

    #[test]
    fn test_bind_vec_skips_bad_items() {
        let s = section(&[("ports.0", "80"), ("ports.1", "eighty"), ("ports.2", "443")]);
        let mut ports: Vec<u16> = Vec::new();
        s.bind_vec("ports", &mut ports);
        assert_eq!(ports, vec![80, 443]);
    }

    #[test]
    fn test_bind_vec_sections() {
        let s = section(&[
            ("servers.0.host", "a"),
            ("servers.0.port", "1"),
            ("servers.1.host", "b"),
        ]);
        let mut servers: Vec<Endpoint> = Vec::new();
        s.bind_vec_sections("servers", &mut servers);
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[1].host, "b");
    }

    #[test]
    fn test_section_path_joins_segments() {
        let s = ConfigSection::new(
            ConfigKey::from("app"),
            [(ConfigKey::from("a.b.c"), ConfigValue::from("v"))],
        );
        let deep = s.section("a.b");
        assert_eq!(deep.path().as_str(), "app.a.b");
        assert_eq!(deep.get("c").unwrap().as_str(), "v");
    }

    #[test]
    fn test_children_ordering() {
        let s = section(&[("b", "1"), ("10", "1"), ("a", "1"), ("9", "1")]);
        assert_eq!(s.children(), vec!["9", "10", "a", "b"]);
    }
}
