use crate::DatasetReference;

/// Body of a dataset insert request. Only the reference is required, every
/// other property is left to the service defaults.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "S: serde::Deserialize<'de>"))]
pub struct Dataset<S = Box<str>> {
    pub dataset_reference: DatasetReference<S>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<S>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<S>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<S>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<S>,
}

impl<S> Dataset<S> {
    pub const fn new(dataset_reference: DatasetReference<S>) -> Self {
        Self {
            dataset_reference,
            id: None,
            friendly_name: None,
            description: None,
            location: None,
        }
    }
}

/// One page of `datasets.list`.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetList {
    #[serde(default)]
    pub next_page_token: Option<Box<str>>,
    #[serde(default = "Vec::new")]
    pub datasets: Vec<DatasetListEntry>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetListEntry {
    /// Fully qualified id, `project:dataset`.
    pub id: Box<str>,
    pub dataset_reference: DatasetReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<Box<str>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Box<str>>,
}
