#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "S: serde::Deserialize<'de>"))]
pub struct JobReference<S = Box<str>> {
    pub project_id: S,
    pub job_id: S,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<S>,
}
