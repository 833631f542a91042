use crate::calc::{Estimate, Estimation, ModifierOrigin, Modifiers};

pub const KEY_PROMPT_TEXT: &str = "Enter Public API key & refresh page for details";
const TITLE_PREFIX: &str = "GYM ENERGY";
const REQUIREMENT_LABEL: &str = "Next Gym Req";
const SPENT_LABEL: &str = "Spent in Gym";
const REMAINING_LABEL: &str = "Remaining E";
const NOT_APPLICABLE_TEXT: &str = "N/A";
const SPECIALIST_TEXT: &str = "Specialist";
const STATS_BASED_TEXT: &str = "Stats Based";
const API_BADGE: &str = "API";
const BONUS_BADGE: &str = "Music Store";

#[derive(Debug, Clone)]
pub(crate) struct PanelInput<'a> {
    pub title: &'a str,
    pub estimation: Option<Estimation>,
    pub api_badge: bool,
    pub bonus_badge: bool,
    pub updated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelBody {
    KeyPrompt,
    Qualitative,
    Values {
        requirement: String,
        spent: String,
        remaining: String,
        days: String,
    },
}

/// Text surface of the widget. Two equal views render identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub title: String,
    pub body: PanelBody,
    pub api_badge: bool,
    pub bonus_badge: bool,
    pub updated: bool,
}

impl PanelView {
    /// A view for an estimate computed outside a mounted widget.
    pub fn for_estimation(
        title: &str,
        estimation: Estimation,
        modifiers: &Modifiers,
        spent_offset: u64,
    ) -> Self {
        build_panel(&PanelInput {
            title,
            estimation: Some(estimation),
            api_badge: modifiers.origin == ModifierOrigin::Api,
            bonus_badge: modifiers.bonus_active,
            updated: spent_offset > 0,
        })
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!("{TITLE_PREFIX} | {}", self.title)];
        match &self.body {
            PanelBody::KeyPrompt => lines.push(KEY_PROMPT_TEXT.to_string()),
            PanelBody::Qualitative => {
                lines.push(format!("{REQUIREMENT_LABEL}: {NOT_APPLICABLE_TEXT}"));
                lines.push(format!("{SPENT_LABEL}: {SPECIALIST_TEXT}"));
                lines.push(format!("{REMAINING_LABEL}: {STATS_BASED_TEXT}"));
            }
            PanelBody::Values {
                requirement,
                spent,
                remaining,
                days,
            } => {
                let marker = if self.updated { " *" } else { "" };
                lines.push(format!("{REQUIREMENT_LABEL}: {requirement}"));
                lines.push(format!("{SPENT_LABEL}: {spent}{marker}"));
                lines.push(format!("{REMAINING_LABEL}: {remaining}{marker}"));
                lines.push(days.clone());
            }
        }
        if self.body != PanelBody::KeyPrompt {
            lines.push(format!(
                "[{}] [{}]",
                badge_text(API_BADGE, self.api_badge),
                badge_text(BONUS_BADGE, self.bonus_badge)
            ));
        }
        lines
    }

    pub fn render(&self) -> String {
        self.lines().join("\n")
    }
}

pub(crate) fn build_panel(input: &PanelInput<'_>) -> PanelView {
    let body = match input.estimation {
        None => PanelBody::KeyPrompt,
        Some(Estimation::NotApplicable) => PanelBody::Qualitative,
        Some(Estimation::Applicable(estimate)) => values_body(&estimate),
    };
    PanelView {
        title: input.title.to_string(),
        body,
        api_badge: input.api_badge,
        bonus_badge: input.bonus_badge,
        updated: input.updated,
    }
}

fn values_body(estimate: &Estimate) -> PanelBody {
    PanelBody::Values {
        requirement: format_thousands(estimate.adjusted_total),
        spent: format_span(estimate.spent_min, estimate.spent_max),
        remaining: format_span(estimate.remaining_min, estimate.remaining_max),
        days: format_days_left(estimate.projected_days),
    }
}

fn badge_text(label: &str, active: bool) -> String {
    if active {
        format!("{label}: on")
    } else {
        format!("{label}: off")
    }
}

fn format_span(low: u64, high: u64) -> String {
    if low == high {
        format_thousands(low)
    } else {
        format!("{} - {}", format_thousands(low), format_thousands(high))
    }
}

pub fn format_days_left(days: f64) -> String {
    format!("~{:.1} days left", days.max(0.0))
}

pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
