use serde::Deserialize;
use std::collections::BTreeMap;

use super::errors::{DomainError, DomainResult};

/// `names` is written either as a list or as an `index: name` map.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ClassNames {
    List(Vec<String>),
    Map(BTreeMap<usize, String>),
}

#[derive(Debug, Clone, Deserialize)]
struct RawDescriptor {
    path: Option<String>,
    train: Option<String>,
    val: Option<String>,
    test: Option<String>,
    nc: Option<usize>,
    names: Option<ClassNames>,
}

/// Class list and split locations of a YOLO dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetDescriptor {
    pub root: Option<String>,
    pub train: Option<String>,
    pub val: Option<String>,
    pub test: Option<String>,
    pub names: Vec<String>,
}

impl DatasetDescriptor {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let d: RawDescriptor = serde_yaml::from_str(raw)
            .map_err(|e| DomainError::InvalidInput(format!("data.yaml 格式錯誤: {e}")))?;

        let names = match d.names {
            Some(ClassNames::List(v)) => v,
            Some(ClassNames::Map(m)) => {
                // ids must be 0..n without holes
                if m.keys().enumerate().any(|(i, k)| i != *k) {
                    return Err(DomainError::InvalidInput("names 的索引必須從 0 連續編號".into()));
                }
                m.into_values().collect()
            }
            None => Vec::new(),
        };
        if names.is_empty() {
            return Err(DomainError::InvalidInput("data.yaml 缺少 names".into()));
        }
        if let Some(nc) = d.nc {
            if nc != names.len() {
                return Err(DomainError::InvalidInput(format!(
                    "nc={} 與 names 數量 {} 不符",
                    nc,
                    names.len()
                )));
            }
        }

        Ok(Self { root: d.path, train: d.train, val: d.val, test: d.test, names })
    }

    pub fn class_name(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }
}
