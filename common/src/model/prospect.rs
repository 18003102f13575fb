use crate::requests::SingleProspect;
use serde::{Deserialize, Serialize};

/// One company record read from the uploaded spreadsheet.
///
/// `row_index` is the 1-based row of the sheet the record came from. The header
/// occupies row 1, so the first data row is 2. Prospects submitted through the
/// single-prospect form use row 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProspectRow {
    pub row_index: u32,
    pub company_name: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub website_url: String,
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub contact_title: String,
    /// Cells from columns that do not map to a known field, as `Header: value` pairs.
    #[serde(default)]
    pub extra_context: String,
}

impl ProspectRow {
    /// Row index used for prospects that did not come from a spreadsheet.
    pub const SINGLE_ROW: u32 = 0;

    /// Builds the pipeline input for a prospect entered by hand.
    pub fn from_single(single: &SingleProspect) -> Self {
        let mut parts = Vec::new();
        if !single.linkedin_url.is_empty() {
            parts.push(format!("LinkedIn: {}", single.linkedin_url));
        }
        if !single.email.is_empty() {
            parts.push(format!("Email: {}", single.email));
        }
        if !single.phone.is_empty() {
            parts.push(format!("Phone: {}", single.phone));
        }
        if !single.notes.is_empty() {
            parts.push(format!("Notes: {}", single.notes));
        }

        Self {
            row_index: Self::SINGLE_ROW,
            company_name: single.company.trim().to_string(),
            industry: String::new(),
            website_url: String::new(),
            contact_name: single.client_name.trim().to_string(),
            contact_title: single.role.trim().to_string(),
            extra_context: parts.join(" | "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_prospect_extra_context_skips_empty_fields() {
        let single = SingleProspect {
            client_name: "Dana Reyes".to_string(),
            company: " Acme Corp ".to_string(),
            role: "VP Sales".to_string(),
            linkedin_url: "https://linkedin.com/in/dana".to_string(),
            email: String::new(),
            phone: "555-0100".to_string(),
            notes: String::new(),
        };

        let row = ProspectRow::from_single(&single);
        assert_eq!(row.row_index, 0);
        assert_eq!(row.company_name, "Acme Corp");
        assert_eq!(row.contact_title, "VP Sales");
        assert_eq!(
            row.extra_context,
            "LinkedIn: https://linkedin.com/in/dana | Phone: 555-0100"
        );
    }
}
