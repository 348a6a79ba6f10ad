//! Cluster context supplied by the caller on the reverse path.
//!
//! Cluster name and region exist on machine API resources but have no place
//! in a machine template or cluster API machine set. Converting back cannot
//! recover them, so the caller passes them here. Missing values are emitted
//! as empty placeholders and must be filled in afterwards.

use serde::{Deserialize, Serialize};

use crate::logs::log_warning;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterContext {
    /// Value for the `machine.openshift.io/cluster-api-cluster` label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,

    /// Value for `placement.region`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl ClusterContext {
    pub fn new(cluster_name: Option<String>, region: Option<String>) -> Self {
        Self { cluster_name, region }
    }

    pub fn is_complete(&self) -> bool {
        self.cluster_name.is_some() && self.region.is_some()
    }

    /// Cluster name, or an empty placeholder (logged).
    pub fn cluster_name_or_placeholder(&self) -> String {
        match &self.cluster_name {
            Some(name) => name.clone(),
            None => {
                log_warning("cluster name not supplied: emitted empty placeholder, set it before applying");
                String::new()
            }
        }
    }

    /// Region, or an empty placeholder (logged).
    pub fn region_or_placeholder(&self) -> String {
        match &self.region {
            Some(region) => region.clone(),
            None => {
                log_warning("region not supplied: emitted empty placement.region, set it before applying");
                String::new()
            }
        }
    }
}
