use std::fmt;

/// Keys understood by the balancer manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Cluster,
    LoadMethod,
    AddWorkerFlag,
    NewWorkerUri,
    Worker,
    Route,
    DisabledFlag,
    HealthCheckMethod,
    HealthCheckIntervalMillis,
}

impl ParamKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKey::Cluster => "cluster",
            ParamKey::LoadMethod => "loadMethod",
            ParamKey::AddWorkerFlag => "addWorkerFlag",
            ParamKey::NewWorkerUri => "newWorkerURI",
            ParamKey::Worker => "worker",
            ParamKey::Route => "route",
            ParamKey::DisabledFlag => "disabledFlag",
            ParamKey::HealthCheckMethod => "healthCheckMethod",
            ParamKey::HealthCheckIntervalMillis => "healthCheckIntervalMillis",
        }
    }

    /// Field name in the balancer-manager form
    pub fn form_field(&self) -> &'static str {
        match self {
            ParamKey::Cluster => "b",
            ParamKey::LoadMethod => "b_lbm",
            ParamKey::AddWorkerFlag => "b_wyes",
            ParamKey::NewWorkerUri => "b_nwrkr",
            ParamKey::Worker => "w",
            ParamKey::Route => "w_wr",
            ParamKey::DisabledFlag => "w_status_D",
            ParamKey::HealthCheckMethod => "w_hm",
            ParamKey::HealthCheckIntervalMillis => "w_hi",
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declaration sent to the balancer manager. Insertion ordered; setting an
/// existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationParams {
    entries: Vec<(ParamKey, String)>,
}

impl ReconciliationParams {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(10),
        }
    }

    pub fn set<V: Into<String>>(&mut self, key: ParamKey, value: V) -> &mut Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    pub fn get(&self, key: ParamKey) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamKey, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// `(key, value)` pairs with the logical key names
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect()
    }
}

/// Renders in balancer-manager form order, e.g. `b=mycluster&b_lbm=byrequests`
impl fmt::Display for ReconciliationParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{}={}", key.form_field(), value)?;
        }
        Ok(())
    }
}
