//! Request and response structures for the content API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Light summary record as served on the summary page. Aggregate
/// counts arrive later through the stats endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub id: String,
    pub slug: Option<String>,
    pub title: String,
    pub author: String,
    pub summary: String,
    pub category: String,
    pub image_url: Option<String>,
    pub affiliate_link: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Aggregate engagement counts plus the one-decimal average rating.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryStats {
    pub likes_count: u64,
    pub views_count: u64,
    pub comments_count: u64,
    pub avg_rating: Option<f64>,
}

/// One comment on a summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSummaryRequest {
    pub title: String,
    pub author: String,
    pub summary: String,
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub affiliate_link: Option<String>,
}

/// Editable fields of a summary. The slug is not among them; it is the
/// canonical address and stays stable across edits.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSummaryRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub summary: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    /// Star rating, 1 through 5
    pub rating: u8,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubscribeRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct EnhanceRequest {
    pub description: String,
    #[serde(default)]
    pub steps: String,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    /// First page of the PDF as base64 JPEG
    pub preview: String,
}

/// The fixed thirteen-section structure the enhancement model is asked
/// to produce. Every field defaults to empty so a partial model answer
/// still deserializes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnhanceResponse {
    #[serde(default)]
    pub investment_synopsis: InvestmentSynopsis,
    #[serde(default)]
    pub returns_projections: ReturnsProjections,
    #[serde(default)]
    pub risk_assessment: RiskAssessment,
    #[serde(default)]
    pub historical_performance: HistoricalPerformance,
    #[serde(default)]
    pub liquidity_profile: LiquidityProfile,
    #[serde(default)]
    pub cost_structure: CostStructure,
    #[serde(default)]
    pub management_team: ManagementTeam,
    #[serde(default)]
    pub legal_compliance: LegalCompliance,
    #[serde(default)]
    pub operational_mechanics: OperationalMechanics,
    #[serde(default)]
    pub personal_alignment: PersonalAlignment,
    #[serde(default)]
    pub exit_strategy: ExitStrategy,
    #[serde(default)]
    pub key_metrics: KeyMetrics,
    #[serde(default)]
    pub red_flags: RedFlags,
}

impl EnhanceResponse {
    /// Fallback structure when the model output is not parseable: the
    /// original description survives in the synopsis, everything else
    /// stays empty.
    pub fn fallback(description: &str) -> Self {
        Self {
            investment_synopsis: InvestmentSynopsis {
                what_is_it: description.to_string(),
                ..InvestmentSynopsis::default()
            },
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvestmentSynopsis {
    #[serde(default)]
    pub what_is_it: String,
    #[serde(default)]
    pub who_offers_it: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub fit_check: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReturnsProjections {
    #[serde(default)]
    pub expected_returns: String,
    #[serde(default)]
    pub guaranteed: String,
    #[serde(default)]
    pub time_horizon: String,
    #[serde(default)]
    pub examples_check: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskAssessment {
    #[serde(default)]
    pub potential_issues: Vec<String>,
    #[serde(default)]
    pub capital_risk: String,
    #[serde(default)]
    pub risk_types: Vec<String>,
    #[serde(default)]
    pub legal_risks: String,
    #[serde(default)]
    pub affordability_check: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoricalPerformance {
    #[serde(default)]
    pub past_performance: String,
    #[serde(default)]
    pub verifiable_data: String,
    #[serde(default)]
    pub downturn_performance: String,
    #[serde(default)]
    pub disclaimer_check: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiquidityProfile {
    #[serde(default)]
    pub ease_of_withdrawal: String,
    #[serde(default)]
    pub lock_in_period: String,
    #[serde(default)]
    pub penalties: String,
    #[serde(default)]
    pub exit_check: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostStructure {
    #[serde(default)]
    pub management_fees: String,
    #[serde(default)]
    pub hidden_costs: String,
    #[serde(default)]
    pub impact_check: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagementTeam {
    #[serde(default)]
    pub key_personnel: String,
    #[serde(default)]
    pub track_record: String,
    #[serde(default)]
    pub credentials: String,
    #[serde(default)]
    pub conflicts: String,
    #[serde(default)]
    pub trust_check: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegalCompliance {
    #[serde(default)]
    pub regulatory_body: String,
    #[serde(default)]
    pub documentation: String,
    #[serde(default)]
    pub legal_history: String,
    #[serde(default)]
    pub scam_check: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationalMechanics {
    #[serde(default)]
    pub return_generation: String,
    #[serde(default)]
    pub investment_allocation: String,
    #[serde(default)]
    pub contingency_plan: String,
    #[serde(default)]
    pub simplicity_check: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonalAlignment {
    #[serde(default)]
    pub risk_tolerance: String,
    #[serde(default)]
    pub income_needs: String,
    #[serde(default)]
    pub tax_strategy: String,
    #[serde(default)]
    pub diversification: String,
    #[serde(default)]
    pub suitability_check: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExitStrategy {
    #[serde(default)]
    pub exit_process: String,
    #[serde(default)]
    pub transferability: String,
    #[serde(default)]
    pub buyer_availability: String,
    #[serde(default)]
    pub plan_check: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyMetrics {
    #[serde(default)]
    pub roi: String,
    #[serde(default)]
    pub npv: String,
    #[serde(default)]
    pub irr: String,
    #[serde(default)]
    pub payback_period: String,
    #[serde(default)]
    pub cash_flow: String,
    #[serde(default)]
    pub analysis_check: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedFlags {
    #[serde(default)]
    pub pressure_tactics: String,
    #[serde(default)]
    pub clarity_issues: String,
    #[serde(default)]
    pub risk_hype: String,
    #[serde(default)]
    pub instinct_check: String,
}
