use serde::{Deserialize, Serialize};

use crate::domain::Entry;

#[derive(Debug, Deserialize)]
pub struct NextRequest {
    /// Verdict for the previously served entry; absent on the first call.
    #[serde(default)]
    pub liked: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct NextResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<Entry>,
    pub exhausted: bool,
}

#[derive(Debug, Deserialize)]
pub struct FeedRequest {
    pub url: String,
}
