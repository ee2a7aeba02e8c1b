use std::str::FromStr;

use super::error::TypeError;

pub type QueryData = Vec<(String, String)>;

/// Decoded query string. Keeps repeated keys, e.g. `?tags=lunch&tags=dinner`.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    inner: QueryData,
}

impl QueryParams {
    pub fn from_data(data: QueryData) -> Self {
        Self { inner: data }
    }

    /// Last non-empty value for `key`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.inner
            .iter()
            .rev()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.inner
            .iter()
            .filter(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.to_owned())
            .collect()
    }

    pub fn get_number<T>(&self, key: &str) -> Result<Option<T>, TypeError>
    where
        T: FromStr,
    {
        match self.get_str(key) {
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_e| TypeError::new(&format!("Invalid number for '{key}'"))),
            None => Ok(None),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, TypeError> {
        match self.get_str(key) {
            Some("1" | "true" | "True") => Ok(Some(true)),
            Some("0" | "false" | "False") => Ok(Some(false)),
            Some(_) => Err(TypeError::new(&format!("Invalid boolean for '{key}'"))),
            None => Ok(None),
        }
    }
}
