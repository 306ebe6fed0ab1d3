//! Attribute documents exchanged with the matchmaker.
//!
//! An [`Ad`] is an ordered, case-insensitive map of attribute names to values. The
//! negotiation code treats it as an opaque document except for a handful of well-known
//! attributes listed in [`attrs`], and for evaluating resource requests of a job against
//! a machine (see [`expr`]).

pub mod expr;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

pub use expr::AdExpr;

pub mod attrs {
    pub const OWNER: &str = "Owner";
    pub const CLUSTER_ID: &str = "ClusterId";
    pub const PROC_ID: &str = "ProcId";
    pub const GLOBAL_JOB_ID: &str = "GlobalJobId";
    pub const AUTO_CLUSTER_ID: &str = "AutoClusterId";
    pub const AUTO_CLUSTER_ATTRS: &str = "AutoClusterAttrs";
    pub const RESOURCE_REQUEST_COUNT: &str = "ResourceRequestCount";
    pub const WANT_MATCH_DIAGNOSTICS: &str = "WantMatchDiagnostics";
    pub const WANT_CLAIMING: &str = "WantClaiming";
    pub const JOB_UNIVERSE: &str = "JobUniverse";
    pub const JOB_PRIO: &str = "JobPrio";
    pub const JOB_STATUS: &str = "JobStatus";

    pub const REQUEST_CPUS: &str = "RequestCpus";
    pub const REQUEST_MEMORY: &str = "RequestMemory";
    pub const REQUEST_DISK: &str = "RequestDisk";

    pub const NAME: &str = "Name";
    pub const MY_ADDRESS: &str = "MyAddress";
    pub const CPUS: &str = "Cpus";
    pub const MEMORY: &str = "Memory";
    pub const DISK: &str = "Disk";
    pub const TOTAL_DISK: &str = "TotalDisk";
    pub const SLOT_PARTITIONABLE: &str = "PartitionableSlot";
    pub const SLOT_DYNAMIC: &str = "DynamicSlot";
    pub const OFFLINE: &str = "Offline";

    /// Links a match delivered in resource-request-list mode to the request it answers.
    pub const RESOURCE_REQUEST_CLUSTER: &str = "_condor_RESOURCE_CLUSTER";
    pub const RESOURCE_REQUEST_PROC: &str = "_condor_RESOURCE_PROC";
    pub const RESOURCE_REQUEST_AUTO_CLUSTER: &str = "_condor_RESOURCE_AUTO_CLUSTER";

    pub const LAST_REJ_MATCH_REASON: &str = "LastRejMatchReason";
    pub const LAST_REJ_MATCH_TIME: &str = "LastRejMatchTime";
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AdValue {
    Undefined,
    Error,
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
    Expr(Box<AdExpr>),
}

impl AdValue {
    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, AdValue::Int(_) | AdValue::Real(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AdValue::Int(v) => Some(*v as f64),
            AdValue::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer view of a number; reals are truncated.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AdValue::Int(v) => Some(*v),
            AdValue::Real(v) if v.is_finite() => Some(v.trunc() as i64),
            _ => None,
        }
    }
}

impl Display for AdValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AdValue::Undefined => write!(f, "undefined"),
            AdValue::Error => write!(f, "error"),
            AdValue::Bool(v) => write!(f, "{v}"),
            AdValue::Int(v) => write!(f, "{v}"),
            AdValue::Real(v) => write!(f, "{v:?}"),
            AdValue::Str(v) => write!(f, "{v:?}"),
            AdValue::Expr(expr) => write!(f, "{expr}"),
        }
    }
}

impl From<bool> for AdValue {
    fn from(value: bool) -> Self {
        AdValue::Bool(value)
    }
}
impl From<i64> for AdValue {
    fn from(value: i64) -> Self {
        AdValue::Int(value)
    }
}
impl From<i32> for AdValue {
    fn from(value: i32) -> Self {
        AdValue::Int(value as i64)
    }
}
impl From<u32> for AdValue {
    fn from(value: u32) -> Self {
        AdValue::Int(value as i64)
    }
}
impl From<f64> for AdValue {
    fn from(value: f64) -> Self {
        AdValue::Real(value)
    }
}
impl From<&str> for AdValue {
    fn from(value: &str) -> Self {
        AdValue::Str(value.to_string())
    }
}
impl From<String> for AdValue {
    fn from(value: String) -> Self {
        AdValue::Str(value)
    }
}
impl From<AdExpr> for AdValue {
    fn from(value: AdExpr) -> Self {
        match value {
            AdExpr::Literal(value) => value,
            expr => AdValue::Expr(Box::new(expr)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct AdEntry {
    name: String,
    value: AdValue,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<(String, AdValue)>", into = "Vec<(String, AdValue)>")]
pub struct Ad {
    attributes: BTreeMap<String, AdEntry>,
}

impl Ad {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn key(name: &str) -> String {
        name.to_ascii_lowercase()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn assign<V: Into<AdValue>>(&mut self, name: &str, value: V) {
        self.attributes.insert(
            Self::key(name),
            AdEntry {
                name: name.to_string(),
                value: value.into(),
            },
        );
    }

    pub fn remove(&mut self, name: &str) -> Option<AdValue> {
        self.attributes.remove(&Self::key(name)).map(|e| e.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(&Self::key(name))
    }

    pub fn lookup(&self, name: &str) -> Option<&AdValue> {
        self.attributes.get(&Self::key(name)).map(|e| &e.value)
    }

    pub fn lookup_int(&self, name: &str) -> Option<i64> {
        self.lookup(name).and_then(AdValue::as_int)
    }

    pub fn lookup_bool(&self, name: &str) -> Option<bool> {
        match self.lookup(name)? {
            AdValue::Bool(v) => Some(*v),
            AdValue::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    pub fn lookup_string(&self, name: &str) -> Option<&str> {
        match self.lookup(name)? {
            AdValue::Str(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Evaluates an attribute of this ad against `target` and converts the result to an integer.
    ///
    /// Returns `None` when the attribute is missing or does not evaluate to a number.
    pub fn eval_int(&self, name: &str, target: Option<&Ad>) -> Option<i64> {
        AdExpr::Attr(expr::Scope::My, name.to_string())
            .eval(self, target)
            .as_int()
    }

    pub fn eval_bool(&self, name: &str, target: Option<&Ad>) -> Option<bool> {
        match AdExpr::Attr(expr::Scope::My, name.to_string()).eval(self, target) {
            AdValue::Bool(v) => Some(v),
            AdValue::Int(v) => Some(v != 0),
            _ => None,
        }
    }

    /// Creates a copy that contains only the given attributes (those that are present).
    pub fn project<'a, I: IntoIterator<Item = &'a str>>(&self, names: I) -> Ad {
        let mut ad = Ad::new();
        for name in names {
            let key = Self::key(name);
            if let Some(entry) = self.attributes.get(&key) {
                ad.attributes.insert(key, entry.clone());
            }
        }
        ad
    }

    /// Copies every attribute of `other` into this ad, overwriting existing ones.
    pub fn update(&mut self, other: &Ad) {
        for (key, entry) in &other.attributes {
            self.attributes.insert(key.clone(), entry.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AdValue)> {
        self.attributes
            .values()
            .map(|entry| (entry.name.as_str(), &entry.value))
    }
}

impl From<Vec<(String, AdValue)>> for Ad {
    fn from(items: Vec<(String, AdValue)>) -> Self {
        let mut ad = Ad::new();
        for (name, value) in items {
            ad.assign(&name, value);
        }
        ad
    }
}

impl From<Ad> for Vec<(String, AdValue)> {
    fn from(ad: Ad) -> Self {
        ad.attributes
            .into_values()
            .map(|entry| (entry.name, entry.value))
            .collect()
    }
}

impl<S: AsRef<str>, V: Into<AdValue>> FromIterator<(S, V)> for Ad {
    fn from_iter<T: IntoIterator<Item = (S, V)>>(iter: T) -> Self {
        let mut ad = Ad::new();
        for (name, value) in iter {
            ad.assign(name.as_ref(), value);
        }
        ad
    }
}

impl Display for Ad {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (name, value) in self.iter() {
            writeln!(f, "{name} = {value}")?;
        }
        Ok(())
    }
}
