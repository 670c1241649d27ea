use crate::types::{Category, Slide};

/// One keyword rule: every group must match, a group matches when any of its
/// keywords occurs in the text
struct CategoryRule {
    category: Category,
    groups: &'static [&'static [&'static str]],
}

// Evaluated top to bottom, first match wins
static RULES: &[CategoryRule] = &[
    CategoryRule {
        category: Category::CurrentAllocation,
        groups: &[&["current"], &["allocation"]],
    },
    CategoryRule {
        category: Category::TargetAllocation,
        groups: &[&["target"], &["allocation"]],
    },
    CategoryRule {
        category: Category::Performance,
        groups: &[&["performance", "return"]],
    },
    CategoryRule {
        category: Category::RiskReward,
        groups: &[&["risk", "volatility", "sharpe"]],
    },
    CategoryRule {
        category: Category::Pacing,
        groups: &[&["pacing", "timeline", "implementation"]],
    },
    CategoryRule {
        category: Category::Fees,
        groups: &[&["fee", "cost"]],
    },
    CategoryRule {
        category: Category::Disclosures,
        groups: &[&["disclosure", "disclaimer"]],
    },
];

/// Keyword categorizer for slides. Pure: the same title and body always give
/// the same category.
pub struct SlideCategorizer;

impl Default for SlideCategorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SlideCategorizer {
    pub fn new() -> Self {
        Self
    }

    pub fn categorize(&self, title: &str, body: &str) -> Category {
        let haystack = format!("{title} {body}").to_lowercase();

        RULES
            .iter()
            .find(|rule| {
                rule.groups
                    .iter()
                    .all(|group| group.iter().any(|keyword| haystack.contains(keyword)))
            })
            .map(|rule| rule.category)
            .unwrap_or(Category::Appendix)
    }

    pub fn categorize_slide(&self, slide: &Slide) -> Category {
        self.categorize(&slide.title, &slide.body_text())
    }
}
