use serde::{Deserialize, Deserializer, Serialize};

/// One analysed résumé as returned by the analysis service.
///
/// `pros` and `cons` keep the order the service produced them in; missing
/// arrays deserialize as empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub filename: String,
    /// Match percentage, 0–100.
    #[serde(deserialize_with = "deserialize_score")]
    pub score: u8,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
}

/// Input to the report generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    #[serde(rename = "jobTitle", alias = "job_title")]
    pub job_title: String,
    #[serde(default)]
    pub results: Vec<CandidateResult>,
}

/// Accepts any JSON number and clamps it into 0..=100.
fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.round().clamp(0.0, 100.0) as u8)
}
