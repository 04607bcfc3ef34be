use crate::types::ParamValue;
use serde::Serialize;
use std::collections::HashMap;

/// Values bound from path parameters or from the query string, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteParams(HashMap<String, ParamValue>);

impl RouteParams {
    pub fn new() -> RouteParams {
        RouteParams(HashMap::new())
    }

    pub fn set<N: Into<String>, V: Into<ParamValue>>(&mut self, name: N, value: V) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get<N: AsRef<str>>(&self, name: N) -> Option<&ParamValue> {
        self.0.get(name.as_ref())
    }

    pub fn has<N: AsRef<str>>(&self, name: N) -> bool {
        self.0.contains_key(name.as_ref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn params_names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }
}
