use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One request item: a partial dependency stack to complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub package_list: Vec<String>,
    /// Per-request override of the configured recommendation count.
    #[serde(default)]
    pub comp_package_count_threshold: Option<usize>,
}

/// A single companion-package suggestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub package_name: String,
    /// Calibrated confidence, percent (0-100). Only comparable within a
    /// single response, never across requests.
    pub cooccurrence_probability: f64,
    pub topic_list: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub missing_packages: Vec<String>,
    pub companion_packages: Vec<Recommendation>,
    pub ecosystem: String,
    pub package_to_topic_dict: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Npm,
    Maven,
    Pypi,
}

impl Ecosystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::Maven => "maven",
            Ecosystem::Pypi => "pypi",
        }
    }
}

impl std::str::FromStr for Ecosystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "npm" => Ok(Ecosystem::Npm),
            "maven" => Ok(Ecosystem::Maven),
            "pypi" => Ok(Ecosystem::Pypi),
            other => Err(format!("unknown ecosystem {:?}", other)),
        }
    }
}
