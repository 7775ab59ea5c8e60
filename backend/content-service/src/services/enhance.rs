//! Description enhancement through the generative model API.
//!
//! The model is asked for the fixed thirteen-section JSON structure;
//! anything it returns that does not parse into that structure degrades
//! to the fallback where only the synopsis carries the original text.

use serde_json::{json, Value};
use tracing::{debug, error};

use crate::config::EnhanceConfig;
use crate::error::{AppError, Result};
use crate::models::EnhanceResponse;

const PROMPT: &str = "You are a globally recognized investment strategist and content expert. \
Enhance the following description and steps into a professional investment strategy for \
categories like book summaries, courses, quizzes, or business ideas. Return a JSON object with: \
investment_synopsis ({what_is_it, who_offers_it, goal, fit_check}), \
returns_projections ({expected_returns, guaranteed, time_horizon, examples_check}), \
risk_assessment ({potential_issues, capital_risk, risk_types, legal_risks, affordability_check}), \
historical_performance ({past_performance, verifiable_data, downturn_performance, disclaimer_check}), \
liquidity_profile ({ease_of_withdrawal, lock_in_period, penalties, exit_check}), \
cost_structure ({management_fees, hidden_costs, impact_check}), \
management_team ({key_personnel, track_record, credentials, conflicts, trust_check}), \
legal_compliance ({regulatory_body, documentation, legal_history, scam_check}), \
operational_mechanics ({return_generation, investment_allocation, contingency_plan, simplicity_check}), \
personal_alignment ({risk_tolerance, income_needs, tax_strategy, diversification, suitability_check}), \
exit_strategy ({exit_process, transferability, buyer_availability, plan_check}), \
key_metrics ({roi, npv, irr, payback_period, cash_flow, analysis_check}), \
red_flags ({pressure_tactics, clarity_issues, risk_hype, instinct_check}). \
Ensure content is sophisticated, value-driven, and actionable.";

pub struct EnhanceService {
    http: reqwest::Client,
    config: EnhanceConfig,
}

impl EnhanceService {
    pub fn new(config: EnhanceConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub async fn enhance(&self, description: &str, steps: &str) -> Result<EnhanceResponse> {
        let url = format!("{}?key={}", self.config.api_url, self.config.api_key);
        let request = json!({
            "contents": [{
                "parts": [
                    { "text": PROMPT },
                    { "text": format!("Description: {description}\nSteps: {steps}") },
                ],
            }],
            "generationConfig": { "temperature": 0.7, "maxOutputTokens": 2000 },
        });

        let resp = self.http.post(&url).json(&request).send().await?;
        let status = resp.status();
        let raw = resp.text().await?;
        if !status.is_success() {
            error!(status = status.as_u16(), "model api error: {}", raw);
            return Err(AppError::Upstream(format!(
                "model api {}: {}",
                status.as_u16(),
                raw
            )));
        }

        Ok(parse_model_output(&raw, description))
    }
}

/// Pull the generated text out of the model's response envelope and
/// parse it as the section structure. Every failure along the way lands
/// on the fallback rather than an error.
fn parse_model_output(raw: &str, description: &str) -> EnhanceResponse {
    let envelope: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            debug!("model response is not json, using fallback: {}", e);
            return EnhanceResponse::fallback(description);
        }
    };

    let Some(text) = generated_text(&envelope) else {
        debug!("model response has no candidate text, using fallback");
        return EnhanceResponse::fallback(description);
    };

    match serde_json::from_str::<EnhanceResponse>(strip_code_fence(&text)) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("candidate text is not the section structure, using fallback: {}", e);
            EnhanceResponse::fallback(description)
        }
    }
}

/// Concatenated text of the first candidate's parts.
fn generated_text(envelope: &Value) -> Option<String> {
    let parts = envelope
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Models often wrap JSON answers in ```json fences.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope_with(text: &str) -> String {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }] }
            }]
        })
        .to_string()
    }

    #[test]
    fn test_well_formed_candidate_parses_into_sections() {
        let sections = json!({
            "investment_synopsis": { "what_is_it": "a summary library", "goal": "learning" },
            "risk_assessment": { "potential_issues": ["scope creep"], "risk_types": [] },
        })
        .to_string();
        let parsed = parse_model_output(&envelope_with(&sections), "orig");
        assert_eq!(parsed.investment_synopsis.what_is_it, "a summary library");
        assert_eq!(parsed.investment_synopsis.goal, "learning");
        assert_eq!(parsed.risk_assessment.potential_issues, vec!["scope creep"]);
        // unmentioned sections default to empty
        assert!(parsed.key_metrics.roi.is_empty());
    }

    #[test]
    fn test_fenced_candidate_is_unwrapped() {
        let fenced = format!(
            "```json\n{}\n```",
            json!({ "investment_synopsis": { "what_is_it": "fenced" } })
        );
        let parsed = parse_model_output(&envelope_with(&fenced), "orig");
        assert_eq!(parsed.investment_synopsis.what_is_it, "fenced");
    }

    #[test]
    fn test_prose_candidate_falls_back_to_description() {
        let parsed = parse_model_output(&envelope_with("Sure! Here is my analysis..."), "orig");
        assert_eq!(parsed.investment_synopsis.what_is_it, "orig");
        assert!(parsed.returns_projections.expected_returns.is_empty());
    }

    #[test]
    fn test_non_json_response_falls_back() {
        let parsed = parse_model_output("<html>bad gateway</html>", "orig");
        assert_eq!(parsed.investment_synopsis.what_is_it, "orig");
    }
}
