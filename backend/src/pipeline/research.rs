//! Company research through a search-backed model on OpenRouter.
//!
//! The number of questions asked depends on how much the spreadsheet already
//! tells us about the company. A well-known name, or a row carrying both an
//! industry and a website, gets the three-question `Quick` pass. Anything else
//! gets the five-question `Deep` pass. Answers are filed into
//! [`CompanyResearch`] by the question they answer.

use async_trait::async_trait;
use common::model::prospect::ProspectRow;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::llm::{ChatMessage, OpenRouterClient};
use super::retry::{retry, RetryPolicy};
use super::{PipelineError, Researcher};

const WELL_KNOWN_COMPANIES: &[&str] = &[
    "salesforce", "snowflake", "hubspot", "adobe", "oracle", "sap", "microsoft", "google",
    "amazon", "meta", "apple", "ibm", "cisco", "dell", "intel", "zoom", "slack", "shopify",
    "stripe", "twilio", "datadog", "splunk", "servicenow", "workday", "atlassian", "dropbox",
    "zendesk", "intercom", "marketo", "eloqua", "pardot", "mailchimp", "sendgrid", "segment",
];

const FALLBACK_SYSTEM_PROMPT: &str = "You are a B2B company research analyst. Provide detailed, \
factual information about companies including their technology stack, business challenges, \
industry position, and recent developments. Be specific and data-driven.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResearchDepth {
    #[default]
    Quick,
    Deep,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyResearch {
    pub company_name: String,
    pub overview: String,
    pub pain_points: Vec<String>,
    pub tech_stack: Vec<String>,
    pub industry_context: String,
    pub recent_news: String,
    pub opportunities: Vec<String>,
    pub competitive_landscape: String,
    pub buyer_personas: String,
    pub depth_used: ResearchDepth,
    /// Every answer in query order, separated by `---` rules.
    pub raw_research: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPurpose {
    Overview,
    TechStack,
    PainPoints,
    News,
    Competition,
    Personas,
}

pub fn determine_depth(prospect: &ProspectRow) -> ResearchDepth {
    let name = prospect.company_name.trim().to_lowercase();
    if WELL_KNOWN_COMPANIES.contains(&name.as_str()) {
        return ResearchDepth::Quick;
    }
    if !prospect.industry.is_empty() && !prospect.website_url.is_empty() {
        return ResearchDepth::Quick;
    }
    ResearchDepth::Deep
}

pub fn research_queries(prospect: &ProspectRow, depth: ResearchDepth) -> Vec<(QueryPurpose, String)> {
    let company = &prospect.company_name;
    let url_hint = if prospect.website_url.is_empty() {
        String::new()
    } else {
        format!(" (website: {})", prospect.website_url)
    };
    let industry_hint = if prospect.industry.is_empty() {
        String::new()
    } else {
        format!(" in the {} industry", prospect.industry)
    };

    match depth {
        ResearchDepth::Quick => vec![
            (
                QueryPurpose::Overview,
                format!(
                    "Give me a comprehensive overview of {company}{url_hint}{industry_hint}. \
                     Include: what they do, company size, target market, key products/services, \
                     and their technology stack (CRM, marketing tools, data platforms they use)."
                ),
            ),
            (
                QueryPurpose::PainPoints,
                format!(
                    "What are the top business challenges and pain points for {company}{industry_hint}? \
                     Focus on: data quality issues, sales/marketing efficiency, lead generation, \
                     technology gaps, and competitive pressures."
                ),
            ),
            (
                QueryPurpose::News,
                format!(
                    "What are the latest news, initiatives, and strategic priorities for {company}? \
                     Include any recent funding, partnerships, product launches, or market expansion."
                ),
            ),
        ],
        ResearchDepth::Deep => vec![
            (
                QueryPurpose::Overview,
                format!(
                    "Provide a detailed company overview of {company}{url_hint}{industry_hint}. \
                     Include: founding year, headquarters, employee count, revenue range, \
                     key leadership, mission, and primary business model."
                ),
            ),
            (
                QueryPurpose::TechStack,
                format!(
                    "What technology stack does {company} use? Include: CRM systems, marketing \
                     automation platforms, data/analytics tools, sales enablement tools, \
                     cloud infrastructure, and any custom/proprietary technology."
                ),
            ),
            (
                QueryPurpose::PainPoints,
                format!(
                    "What are the key business pain points and challenges facing {company}? \
                     Focus specifically on: data quality/enrichment needs, SDR productivity, \
                     buyer intent visibility, lead scoring accuracy, ABM capabilities, \
                     and demand generation effectiveness."
                ),
            ),
            (
                QueryPurpose::Competition,
                format!(
                    "Describe the competitive landscape for {company}{industry_hint}. \
                     Who are their main competitors? What differentiates {company}? \
                     Where are they vulnerable competitively?"
                ),
            ),
            (
                QueryPurpose::Personas,
                format!(
                    "Who are the key buyer personas at {company} that would be involved in \
                     purchasing B2B data, sales intelligence, or marketing technology solutions? \
                     What are their typical priorities and decision criteria?"
                ),
            ),
        ],
    }
}

/// Files each answer under the field its question was asking about.
pub fn assemble_research(
    prospect: &ProspectRow,
    depth: ResearchDepth,
    answers: &[(QueryPurpose, String)],
) -> CompanyResearch {
    let answer = |purpose: QueryPurpose| -> &str {
        answers
            .iter()
            .find(|(p, _)| *p == purpose)
            .map(|(_, text)| text.as_str())
            .unwrap_or("")
    };

    let overview = answer(QueryPurpose::Overview);
    let pain_points = extract_bullet_points(answer(QueryPurpose::PainPoints));
    let tech_source = match answer(QueryPurpose::TechStack) {
        "" => overview,
        tech => tech,
    };

    CompanyResearch {
        company_name: prospect.company_name.clone(),
        overview: overview.to_string(),
        tech_stack: extract_bullet_points(tech_source),
        industry_context: overview.to_string(),
        recent_news: answer(QueryPurpose::News).to_string(),
        opportunities: pain_points.clone(),
        pain_points,
        competitive_landscape: answer(QueryPurpose::Competition).to_string(),
        buyer_personas: answer(QueryPurpose::Personas).to_string(),
        depth_used: depth,
        raw_research: answers
            .iter()
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n---\n\n"),
    }
}

/// Pulls list items out of free text.
///
/// Lines starting with `-`, `•`, `*` or `–` (and longer than 5 chars) win.
/// Without any, the first five sentences longer than 20 chars are used.
pub fn extract_bullet_points(text: &str) -> Vec<String> {
    const MARKERS: [char; 4] = ['-', '•', '*', '–'];

    let points: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with(MARKERS) && line.chars().count() > 5)
        .map(|line| line.trim_start_matches(|c: char| MARKERS.contains(&c) || c == ' ').trim())
        .filter(|cleaned| !cleaned.is_empty())
        .map(str::to_string)
        .collect();

    if !points.is_empty() {
        return points;
    }

    text.split('.')
        .map(str::trim)
        .filter(|s| s.chars().count() > 20)
        .take(5)
        .map(str::to_string)
        .collect()
}

pub fn load_system_prompt(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => FALLBACK_SYSTEM_PROMPT.to_string(),
    }
}

pub struct OpenRouterResearcher {
    llm: OpenRouterClient,
    model: String,
    system_prompt: String,
    policy: RetryPolicy,
}

impl OpenRouterResearcher {
    pub fn new(llm: OpenRouterClient, model: impl Into<String>, system_prompt: String) -> Self {
        Self {
            llm: llm.with_timeout(Duration::from_secs(60)),
            model: model.into(),
            system_prompt,
            policy: RetryPolicy::research(),
        }
    }
}

#[async_trait]
impl Researcher for OpenRouterResearcher {
    async fn research(&self, prospect: &ProspectRow) -> Result<CompanyResearch, PipelineError> {
        let depth = determine_depth(prospect);
        let queries = research_queries(prospect, depth);
        info!(
            "Researching {} ({:?}, {} queries)",
            prospect.company_name,
            depth,
            queries.len()
        );

        let label = format!("research query for {}", prospect.company_name);
        let mut answers = Vec::with_capacity(queries.len());
        for (purpose, query) in queries {
            let messages = [
                ChatMessage::system(self.system_prompt.clone()),
                ChatMessage::user(query),
            ];
            let text = retry(self.policy, &label, || {
                self.llm.chat(&self.model, &messages, None)
            })
            .await?;
            answers.push((purpose, text));
        }

        Ok(assemble_research(prospect, depth, &answers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prospect(name: &str, industry: &str, website: &str) -> ProspectRow {
        ProspectRow {
            row_index: 2,
            company_name: name.to_string(),
            industry: industry.to_string(),
            website_url: website.to_string(),
            contact_name: String::new(),
            contact_title: String::new(),
            extra_context: String::new(),
        }
    }

    #[test]
    fn depth_depends_on_fame_or_known_fields() {
        assert_eq!(determine_depth(&prospect(" Stripe ", "", "")), ResearchDepth::Quick);
        assert_eq!(
            determine_depth(&prospect("Tiny Co", "Retail", "tiny.co")),
            ResearchDepth::Quick
        );
        assert_eq!(determine_depth(&prospect("Tiny Co", "Retail", "")), ResearchDepth::Deep);
        assert_eq!(determine_depth(&prospect("Tiny Co", "", "")), ResearchDepth::Deep);
    }

    #[test]
    fn query_counts_follow_depth() {
        let p = prospect("Acme", "Retail", "acme.com");
        let quick = research_queries(&p, ResearchDepth::Quick);
        let deep = research_queries(&p, ResearchDepth::Deep);
        assert_eq!(quick.len(), 3);
        assert_eq!(deep.len(), 5);
        assert!(quick[0].1.contains("Acme (website: acme.com) in the Retail industry"));
        assert_eq!(deep[4].0, QueryPurpose::Personas);
    }

    #[test]
    fn bullets_are_cleaned() {
        let text = "Intro line\n- Legacy CRM data\n• Slow lead routing\n* ok\n– Manual reporting work\n";
        assert_eq!(
            extract_bullet_points(text),
            vec!["Legacy CRM data", "Slow lead routing", "Manual reporting work"]
        );
    }

    #[test]
    fn sentences_are_the_fallback() {
        let text = "Short one. This sentence is definitely long enough. Tiny. \
                    Another sufficiently long sentence here";
        assert_eq!(
            extract_bullet_points(text),
            vec![
                "This sentence is definitely long enough",
                "Another sufficiently long sentence here"
            ]
        );
    }

    #[test]
    fn deep_answers_fill_fields_by_purpose() {
        let p = prospect("Tiny Co", "", "");
        let answers = vec![
            (QueryPurpose::Overview, "Overview text".to_string()),
            (QueryPurpose::TechStack, "- Salesforce CRM\n- Snowflake".to_string()),
            (QueryPurpose::PainPoints, "- Dirty data\n- Low SDR output".to_string()),
            (QueryPurpose::Competition, "Rivals everywhere".to_string()),
            (QueryPurpose::Personas, "CMO and VP Sales".to_string()),
        ];

        let research = assemble_research(&p, ResearchDepth::Deep, &answers);
        assert_eq!(research.overview, "Overview text");
        assert_eq!(research.tech_stack, vec!["Salesforce CRM", "Snowflake"]);
        assert_eq!(research.pain_points, vec!["Dirty data", "Low SDR output"]);
        assert_eq!(research.opportunities, research.pain_points);
        assert_eq!(research.competitive_landscape, "Rivals everywhere");
        assert_eq!(research.buyer_personas, "CMO and VP Sales");
        assert_eq!(research.recent_news, "");
        assert_eq!(research.raw_research.matches("\n\n---\n\n").count(), 4);
    }

    #[test]
    fn missing_prompt_file_uses_fallback() {
        let prompt = load_system_prompt(Path::new("/nope/research_prompt.txt"));
        assert!(prompt.starts_with("You are a B2B company research analyst"));
    }
}
