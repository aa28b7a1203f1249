use serde::Serialize;

use crate::metrics::{MetricSample, MetricTag};

/// `{"names": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsListNamesResponse {
    pub names: Vec<String>,
}

/// `{"name": .., "measurements": [..], "availableTags": [..]}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDetailResponse {
    pub name: String,
    pub measurements: Vec<MetricSample>,
    pub available_tags: Vec<MetricTag>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricsResponse {
    ListNames(MetricsListNamesResponse),
    Detail(MetricDetailResponse),
}

impl MetricsResponse {
    pub fn as_list_names(&self) -> Option<&MetricsListNamesResponse> {
        match self {
            MetricsResponse::ListNames(list) => Some(list),
            MetricsResponse::Detail(_) => None,
        }
    }

    pub fn as_detail(&self) -> Option<&MetricDetailResponse> {
        match self {
            MetricsResponse::Detail(detail) => Some(detail),
            MetricsResponse::ListNames(_) => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
