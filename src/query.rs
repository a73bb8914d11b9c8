use qstring::QString;
use std::str::FromStr;

use crate::error::ServiceError;

/// Thin wrapper for query strings with an API to get values
/// from the query easily
pub struct Query {
    qstring: QString,
}

impl From<&str> for Query {
    fn from(query_string: &str) -> Self {
        Self {
            qstring: QString::from(query_string),
        }
    }
}

impl Query {
    /// Get the value for `key` from the query.
    /// Returns an error if `key` is not specified
    pub fn get(&self, key: &str) -> Result<&str, ServiceError> {
        if let Some(val_str) = self.qstring.get(key) {
            Ok(val_str)
        } else {
            log::warn!("{} not specified", key);
            Err(ServiceError::BadRequest {
                message: format!("Missing parameter: '{}'", key)
            })
        }
    }

    /// Get the value for `key` from the query.
    /// Returns an error if `key` is not specified or
    /// if the value cannot be parsed to the specified type `F`.
    pub fn get_and_parse<F: FromStr>(&self, key: &str) -> Result<F, ServiceError> {
        let val_str = self.get(key)?;
        if let Ok(val) = val_str.parse::<F>() {
            Ok(val)
        } else {
            log::warn!("Cannot parse {} from string", key);
            Err(ServiceError::BadRequest {
                message: format!("Invalid value for parameter '{}': '{}'", key, val_str)
            })
        }
    }

    /// Like `get_and_parse`, but falls back to `default` if `key` is not specified
    pub fn get_and_parse_or<F: FromStr>(&self, key: &str, default: F) -> Result<F, ServiceError> {
        if self.qstring.has(key) {
            self.get_and_parse(key)
        } else {
            Ok(default)
        }
    }

    /// Get a comma separated list of values for `key` from the query.
    /// Returns an error if `key` is not specified or any element cannot be parsed.
    pub fn get_and_parse_list<F: FromStr>(&self, key: &str) -> Result<Vec<F>, ServiceError> {
        let val_str = self.get(key)?;
        val_str.split(',')
            .filter(|item| !item.is_empty())
            .map(|item| item.trim().parse::<F>().map_err(|_| {
                log::warn!("Cannot parse {} from string", key);
                ServiceError::BadRequest {
                    message: format!("Invalid element in parameter '{}': '{}'", key, item)
                }
            }))
            .collect()
    }
}
