use serde::Deserialize;
use validator::Validate;

use crate::models::analysis::SkillSort;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAnalysisRequest {
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 255))]
    pub template: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalysisSortQuery {
    #[serde(default)]
    pub sort: SkillSort,
}
