//! Pitch writing: pick the catalog services to pitch, then have a model write the slides.

use async_trait::async_trait;
use common::model::prospect::ProspectRow;
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::catalog::{format_for_prompt, match_services, CatalogStore, ServiceDefinition};
use super::llm::{ChatMessage, OpenRouterClient};
use super::research::CompanyResearch;
use super::{ContentGenerator, PipelineError};
use crate::config::Settings;

const CANDIDATE_COUNT: usize = 5;
const SELECTED_COUNT: usize = 3;
const DEFAULT_SLIDE_COUNT: u32 = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideContent {
    pub slide_number: u32,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub speaker_notes: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PitchContent {
    pub company_name: String,
    pub slides: Vec<SlideContent>,
    pub mapped_services: Vec<ServiceDefinition>,
    /// Markdown handed to the deck builder.
    pub input_text: String,
}

impl PitchContent {
    pub fn card_count(&self) -> u32 {
        match self.slides.len() {
            0 => DEFAULT_SLIDE_COUNT,
            n => n as u32,
        }
    }
}

/// At most `max` chars of `text`, cut on a char boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Narrows the keyword candidates to the ids the model picked.
///
/// With three or fewer candidates the model is not consulted and they are
/// returned as-is. Unknown ids in the reply are ignored. If nothing usable
/// comes back, the first three candidates are used.
pub fn select_services(candidates: Vec<ServiceDefinition>, reply: &str) -> Vec<ServiceDefinition> {
    if candidates.len() <= SELECTED_COUNT {
        return candidates;
    }

    let mut selected: Vec<ServiceDefinition> = Vec::new();
    for line in reply.lines() {
        let id = line
            .trim()
            .trim_matches(|c: char| c == '-' || c == '*' || c == '`' || c.is_whitespace())
            .to_lowercase();
        if id.is_empty() || selected.iter().any(|s| s.id.to_lowercase() == id) {
            continue;
        }
        if let Some(svc) = candidates.iter().find(|s| s.id.to_lowercase() == id) {
            selected.push(svc.clone());
        }
    }

    if selected.is_empty() {
        candidates.into_iter().take(SELECTED_COUNT).collect()
    } else {
        selected.truncate(SELECTED_COUNT);
        selected
    }
}

struct SlideBuilder {
    number: u32,
    title: String,
    body: Vec<String>,
    notes: Vec<String>,
}

impl SlideBuilder {
    fn new(number: u32) -> Self {
        Self {
            number,
            title: String::new(),
            body: Vec::new(),
            notes: Vec::new(),
        }
    }

    fn finish(self) -> SlideContent {
        SlideContent {
            slide_number: self.number,
            title: self.title,
            body: self.body.join("\n").trim().to_string(),
            speaker_notes: self.notes.join("\n").trim().to_string(),
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    None,
    Body,
    Notes,
}

/// Parses `---SLIDE n---` / `TITLE:` / `BODY:` / `NOTES:` / `---END SLIDE---` blocks.
///
/// A slide whose number doesn't parse gets the previous number plus one. A
/// slide left open at the end of the text is still kept.
pub fn parse_slides(raw: &str) -> Vec<SlideContent> {
    let mut slides = Vec::new();
    let mut current: Option<SlideBuilder> = None;
    let mut last_number: u32 = 0;
    let mut section = Section::None;

    for line in raw.lines() {
        let stripped = line.trim();

        if stripped.starts_with("---END SLIDE---") {
            if let Some(slide) = current.take() {
                slides.push(slide.finish());
            }
            section = Section::None;
        } else if let Some(rest) = stripped.strip_prefix("---SLIDE") {
            if let Some(slide) = current.take() {
                slides.push(slide.finish());
            }
            let number = rest
                .replace("---", "")
                .trim()
                .trim_matches(|c| c == '[' || c == ']')
                .parse::<u32>()
                .unwrap_or(last_number.saturating_add(1));
            last_number = number;
            current = Some(SlideBuilder::new(number));
            section = Section::None;
        } else if let Some(title) = stripped.strip_prefix("TITLE:") {
            if let Some(slide) = current.as_mut() {
                slide.title = title.trim().to_string();
            }
            section = Section::None;
        } else if stripped == "BODY:" {
            section = Section::Body;
        } else if stripped == "NOTES:" {
            section = Section::Notes;
        } else if let Some(slide) = current.as_mut() {
            match section {
                Section::Body => slide.body.push(line.to_string()),
                Section::Notes => slide.notes.push(line.to_string()),
                Section::None => {}
            }
        }
    }

    if let Some(slide) = current {
        slides.push(slide.finish());
    }
    slides
}

/// Renders slides as the deck builder's markdown input, one `---`-separated card per slide.
pub fn build_deck_input_text(slides: &[SlideContent]) -> String {
    slides
        .iter()
        .map(|slide| {
            let mut part = format!("# {}\n\n{}", slide.title, slide.body);
            if !slide.speaker_notes.is_empty() {
                part.push_str(&format!("\n\n> **Speaker Notes:** {}", slide.speaker_notes));
            }
            part
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

fn service_mapping_prompt(
    seller: &str,
    prospect: &ProspectRow,
    research: &CompanyResearch,
    candidates: &[ServiceDefinition],
) -> String {
    let pains = research
        .pain_points
        .iter()
        .take(8)
        .map(|p| format!("- {}", p))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a B2B sales strategist for {seller}.\n\n\
         **Prospect:** {company} ({industry})\n\
         **Contact:** {contact}, {title}\n\n\
         **Research Summary:**\n{overview}\n\n\
         **Pain Points Found:**\n{pains}\n\n\
         **Available {seller} Services:**\n{services}\n\n\
         Select exactly 3 services that would be MOST relevant and impactful \
         for this prospect. Return ONLY the service IDs, one per line, \
         in order of relevance (most relevant first).\n\
         Format: Just the IDs, nothing else.",
        seller = seller,
        company = prospect.company_name,
        industry = prospect.industry,
        contact = prospect.contact_name,
        title = prospect.contact_title,
        overview = truncate_chars(&research.overview, 2000),
        pains = pains,
        services = format_for_prompt(candidates),
    )
}

fn pitch_prompt(
    seller: &str,
    prospect: &ProspectRow,
    research: &CompanyResearch,
    services: &[ServiceDefinition],
) -> String {
    let company = &prospect.company_name;
    let extra = if prospect.extra_context.is_empty() {
        String::new()
    } else {
        format!("- **Extra Context:** {}\n", prospect.extra_context)
    };

    format!(
        "You are an expert B2B pitch deck writer for {seller}.\n\n\
Create a persuasive, data-driven pitch deck for the following prospect.\n\n\
## PROSPECT INFO\n\
- **Company:** {company}\n\
- **Industry:** {industry}\n\
- **Website:** {website}\n\
- **Contact:** {contact}, {title}\n\
{extra}\n\
## RESEARCH ON PROSPECT\n\
{research}\n\n\
## {seller} SERVICES TO PITCH (Top 3)\n\
{services}\n\n\
## INSTRUCTIONS\n\
Generate a 15-slide pitch deck with the following structure. For each slide, provide:\n\
- A compelling title\n\
- Body content (2-4 paragraphs or bullet points)\n\
- Speaker notes (what the presenter should say/emphasize)\n\n\
### SLIDE STRUCTURE:\n\
1. **Title Slide** - \"{company} × {seller}: [Compelling value prop]\"\n\
2. **About {company}** - Show understanding of their business (from research)\n\
3. **Pain Point Discovery** - Present 3 key challenges as visual boxes (from research)\n\
4-6. **Deep Dive: Pain Point A** - Problem → Impact → {seller} Solution (Service 1)\n\
7-9. **Deep Dive: Pain Point B** - Problem → Impact → {seller} Solution (Service 2)\n\
10-12. **Deep Dive: Pain Point C** - Problem → Impact → {seller} Solution (Service 3)\n\
13. **ROI Summary** - Quantified impact across all 3 solutions\n\
14. **Why {seller}** - Credibility, scale, differentiators\n\
15. **Next Steps & CTA** - Clear action items with timeline\n\n\
### FORMATTING RULES:\n\
- Use specific data points from research (don't be generic)\n\
- Include concrete ROI metrics from the service catalog\n\
- Pain points must be SPECIFIC to {company}, not generic industry problems\n\
- Speaker notes should guide the presenter on emphasis and talking points\n\
- Keep slide body concise - presentations are visual, not walls of text\n\
- Use markdown formatting (headers, bullet points, bold) for clarity\n\n\
### OUTPUT FORMAT:\n\
For each slide, output exactly:\n\
---SLIDE [number]---\n\
TITLE: [slide title]\n\
BODY:\n\
[slide body content in markdown]\n\
NOTES:\n\
[speaker notes]\n\
---END SLIDE---\n\n\
Generate all 15 slides now.",
        seller = seller,
        company = company,
        industry = prospect.industry,
        website = prospect.website_url,
        contact = prospect.contact_name,
        title = prospect.contact_title,
        extra = extra,
        research = truncate_chars(&research.raw_research, 6000),
        services = format_for_prompt(services),
    )
}

pub struct OpenRouterContentGenerator {
    llm: OpenRouterClient,
    catalog: Arc<CatalogStore>,
    seller_name: String,
    mapping_model: String,
    mapping_max_tokens: u32,
    pitch_model: String,
    pitch_max_tokens: u32,
}

impl OpenRouterContentGenerator {
    pub fn new(llm: OpenRouterClient, catalog: Arc<CatalogStore>, settings: &Settings) -> Self {
        Self {
            llm,
            catalog,
            seller_name: settings.seller_name.clone(),
            mapping_model: settings.service_mapping_model.clone(),
            mapping_max_tokens: settings.service_mapping_max_tokens,
            pitch_model: settings.pitch_generation_model.clone(),
            pitch_max_tokens: settings.pitch_max_tokens,
        }
    }

    /// Picks the three catalog services most relevant to this prospect.
    pub async fn map_services(
        &self,
        prospect: &ProspectRow,
        research: &CompanyResearch,
    ) -> Result<Vec<ServiceDefinition>, PipelineError> {
        let catalog = self.catalog.get().await?;
        let candidates = match_services(research, &prospect.industry, &catalog, CANDIDATE_COUNT);
        if candidates.len() <= SELECTED_COUNT {
            return Ok(candidates);
        }

        let prompt = service_mapping_prompt(&self.seller_name, prospect, research, &candidates);
        let reply = self
            .llm
            .chat(
                &self.mapping_model,
                &[ChatMessage::user(prompt)],
                Some(self.mapping_max_tokens),
            )
            .await?;
        Ok(select_services(candidates, &reply))
    }
}

#[async_trait]
impl ContentGenerator for OpenRouterContentGenerator {
    async fn generate(
        &self,
        prospect: &ProspectRow,
        research: &CompanyResearch,
    ) -> Result<PitchContent, PipelineError> {
        let services = self.map_services(prospect, research).await?;
        info!(
            "Pitching {:?} to {}",
            services.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
            prospect.company_name
        );

        let prompt = pitch_prompt(&self.seller_name, prospect, research, &services);
        let raw = self
            .llm
            .chat(
                &self.pitch_model,
                &[ChatMessage::user(prompt)],
                Some(self.pitch_max_tokens),
            )
            .await?;

        let slides = parse_slides(&raw);
        if slides.is_empty() {
            return Err(PipelineError::MissingField {
                service: "OpenRouter",
                field: "slide blocks in the pitch reply",
            });
        }

        Ok(PitchContent {
            company_name: prospect.company_name.clone(),
            input_text: build_deck_input_text(&slides),
            slides,
            mapped_services: services,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svc(id: &str) -> ServiceDefinition {
        ServiceDefinition {
            id: id.to_string(),
            name: id.to_string(),
            tagline: String::new(),
            description: String::new(),
            pain_points_addressed: vec![],
            ideal_for_industries: vec![],
            roi_metrics: vec![],
            key_differentiators: vec![],
        }
    }

    fn ids(services: &[ServiceDefinition]) -> Vec<&str> {
        services.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn few_candidates_skip_the_model() {
        let picked = select_services(vec![svc("a"), svc("b")], "z\ny");
        assert_eq!(ids(&picked), vec!["a", "b"]);
    }

    #[test]
    fn model_order_wins_and_unknown_ids_drop() {
        let candidates = vec![svc("a"), svc("b"), svc("c"), svc("d"), svc("e")];
        let picked = select_services(candidates, "E\n\nnope\n- c\nA\nb\n");
        assert_eq!(ids(&picked), vec!["e", "c", "a"]);
    }

    #[test]
    fn useless_reply_falls_back_to_first_three() {
        let candidates = vec![svc("a"), svc("b"), svc("c"), svc("d")];
        let picked = select_services(candidates, "I recommend the following...");
        assert_eq!(ids(&picked), vec!["a", "b", "c"]);
    }

    #[test]
    fn parses_slide_blocks() {
        let raw = "Here you go:\n\
                   ---SLIDE 1---\n\
                   TITLE: Acme × Seller\n\
                   BODY:\n\
                   - Point one\n\
                   - Point two\n\
                   NOTES:\n\
                   Open strong.\n\
                   ---END SLIDE---\n\
                   ---SLIDE [x]---\n\
                   TITLE: About Acme\n\
                   BODY:\n\
                   Acme builds anvils.\n";

        let slides = parse_slides(raw);
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].slide_number, 1);
        assert_eq!(slides[0].title, "Acme × Seller");
        assert_eq!(slides[0].body, "- Point one\n- Point two");
        assert_eq!(slides[0].speaker_notes, "Open strong.");
        assert_eq!(slides[1].slide_number, 2);
        assert_eq!(slides[1].body, "Acme builds anvils.");
        assert_eq!(slides[1].speaker_notes, "");
    }

    #[test]
    fn unnumbered_slide_after_the_largest_number_does_not_overflow() {
        let raw = "---SLIDE 4294967295---\nTITLE: a\n---END SLIDE---\n---SLIDE x---\nTITLE: b\n";
        let slides = parse_slides(raw);
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[1].slide_number, u32::MAX);
        assert_eq!(slides[1].title, "b");
    }

    #[test]
    fn deck_input_text_joins_cards() {
        let slides = vec![
            SlideContent {
                slide_number: 1,
                title: "Hello".to_string(),
                body: "Body one".to_string(),
                speaker_notes: "Say hi".to_string(),
            },
            SlideContent {
                slide_number: 2,
                title: "Next".to_string(),
                body: "Body two".to_string(),
                speaker_notes: String::new(),
            },
        ];
        assert_eq!(
            build_deck_input_text(&slides),
            "# Hello\n\nBody one\n\n> **Speaker Notes:** Say hi\n\n---\n\n# Next\n\nBody two"
        );
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }

    #[test]
    fn card_count_defaults_to_fifteen() {
        assert_eq!(PitchContent::default().card_count(), 15);
    }
}
