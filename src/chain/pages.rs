use anyhow::{Context, Result};
use regex::Regex;

use crate::model::{PageClassification, PageKind};
use crate::source::ExtractedPage;

const STRONG_SIGNAL_BONUS: usize = 3;
const MIN_PAGE_SCORE: usize = 2;

#[derive(Debug)]
pub struct PageClassifier {
    chain_indicators: Regex,
    tax_indicators: Regex,
}

/// Page numbers (1-based) routed to each sub-document, plus every page's vote.
#[derive(Debug, Clone, Default)]
pub struct PageSplit {
    pub chain_pages: Vec<usize>,
    pub tax_pages: Vec<usize>,
    pub classifications: Vec<PageClassification>,
}

impl PageSplit {
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.chain_pages.is_empty() {
            parts.push(format!("Found {} chain page(s)", self.chain_pages.len()));
        }
        if !self.tax_pages.is_empty() {
            parts.push(format!("Found {} tax page(s)", self.tax_pages.len()));
        }
        if parts.is_empty() {
            parts.push("No chain or tax pages identified".to_string());
        }
        parts.join(". ")
    }
}

impl PageClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            chain_indicators: Regex::new(
                r"(?i)CHAIN OF TITLE|FILED GRANTOR GRANTEE INSTRUMENT|GRANTOR GRANTEE INSTRUMENT BOOK-PAGE|WARRANTY DEED|DEED OF TRUST|TRUSTEE'S DEED",
            )
            .context("failed to compile chain page indicator regex")?,
            tax_indicators: Regex::new(
                r"(?i)TAX INFORMATION|TAX YEAR|ASSESSMENT|MILLAGE RATE|HOMESTEAD CREDIT|TAXES PAID IN FULL|TAX COLLECTOR|COUNTY SCHOOL TAX",
            )
            .context("failed to compile tax page indicator regex")?,
        })
    }

    /// Chain when the chain score beats the tax score and reaches the floor,
    /// tax on the mirror condition, otherwise other.
    pub fn classify(&self, text: &str) -> PageKind {
        let (chain_score, tax_score) = self.indicator_scores(text);
        if chain_score > tax_score && chain_score >= MIN_PAGE_SCORE {
            PageKind::Chain
        } else if tax_score > chain_score && tax_score >= MIN_PAGE_SCORE {
            PageKind::Tax
        } else {
            PageKind::Other
        }
    }

    pub fn score(&self, page: usize, text: &str) -> PageClassification {
        let (chain_score, tax_score) = self.indicator_scores(text);
        PageClassification {
            page,
            kind: self.classify(text),
            chain_score,
            tax_score,
        }
    }

    fn indicator_scores(&self, text: &str) -> (usize, usize) {
        let upper = text.to_uppercase();
        let mut chain_score = self.chain_indicators.find_iter(text).count();
        let mut tax_score = self.tax_indicators.find_iter(text).count();

        if upper.contains("CHAIN OF TITLE") {
            chain_score += STRONG_SIGNAL_BONUS;
        }
        if upper.contains("TAX INFORMATION") {
            tax_score += STRONG_SIGNAL_BONUS;
        }
        (chain_score, tax_score)
    }

    pub fn split(&self, pages: &[ExtractedPage]) -> PageSplit {
        let mut split = PageSplit::default();

        for page in pages {
            let classification = self.score(page.number, &page.text);
            match classification.kind {
                PageKind::Chain => split.chain_pages.push(page.number),
                PageKind::Tax => split.tax_pages.push(page.number),
                PageKind::Other => {}
            }
            split.classifications.push(classification);
        }

        split
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(number: usize, text: &str) -> ExtractedPage {
        ExtractedPage {
            number,
            text: text.to_string(),
            tables: Vec::new(),
        }
    }

    #[test]
    fn chain_heading_with_deed_mentions_is_chain() {
        let classifier = PageClassifier::new().expect("regexes compile");
        let text = "CHAIN OF TITLE\n10/17/2024 WARRANTY DEED 1024-18978\n11/18/2021 DEED OF TRUST 979-60";

        let scored = classifier.score(1, text);
        assert_eq!(scored.kind, PageKind::Chain);
        assert_eq!(scored.chain_score, 6);
        assert_eq!(scored.tax_score, 0);
    }

    #[test]
    fn tax_heading_with_assessment_terms_is_tax() {
        let classifier = PageClassifier::new().expect("regexes compile");
        let text = "TAX INFORMATION\nASSESSMENT 45,000\nMILLAGE RATE 102.5";

        assert_eq!(classifier.classify(text), PageKind::Tax);
    }

    #[test]
    fn incidental_keyword_stays_other() {
        let classifier = PageClassifier::new().expect("regexes compile");

        assert_eq!(classifier.classify("See recorded DEED for details."), PageKind::Other);
        assert_eq!(classifier.classify("One WARRANTY DEED mentioned."), PageKind::Other);
        assert_eq!(classifier.classify(""), PageKind::Other);
    }

    #[test]
    fn ties_are_other() {
        let classifier = PageClassifier::new().expect("regexes compile");
        let text = "WARRANTY DEED WARRANTY DEED TAX YEAR ASSESSMENT";

        assert_eq!(classifier.classify(text), PageKind::Other);
    }

    #[test]
    fn score_labels_pages_the_way_classify_does() {
        let classifier = PageClassifier::new().expect("regexes compile");
        for text in [
            "CHAIN OF TITLE\nWARRANTY DEED",
            "TAX INFORMATION\nTAX YEAR 2024",
            "WARRANTY DEED TAX YEAR",
            "",
        ] {
            assert_eq!(classifier.score(1, text).kind, classifier.classify(text), "{text}");
        }
    }

    #[test]
    fn split_routes_pages_by_label() {
        let classifier = PageClassifier::new().expect("regexes compile");
        let pages = vec![
            page(1, "Cover letter"),
            page(2, "CHAIN OF TITLE\nFILED GRANTOR GRANTEE INSTRUMENT BOOK-PAGE"),
            page(3, "TAX INFORMATION\nTAX YEAR 2024"),
            page(4, "continued WARRANTY DEED and DEED OF TRUST"),
        ];

        let split = classifier.split(&pages);
        assert_eq!(split.chain_pages, vec![2, 4]);
        assert_eq!(split.tax_pages, vec![3]);
        assert_eq!(split.classifications.len(), 4);
        assert_eq!(split.summary(), "Found 2 chain page(s). Found 1 tax page(s)");
    }
}
