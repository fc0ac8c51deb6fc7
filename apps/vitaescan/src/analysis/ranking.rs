//! Ranked view of analysis results for interactive display.
//!
//! Sorting here never feeds the PDF report, which keeps the service's order.

use serde::{Deserialize, Serialize};

use crate::models::candidate::CandidateResult;

const STRONG_MIN_SCORE: u8 = 80;
const VIABLE_MIN_SCORE: u8 = 60;

/// Colour band for a match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    /// ≥ 80, green.
    Strong,
    /// 60–79, yellow.
    Moderate,
    /// < 60, red.
    Weak,
}

impl ScoreTier {
    pub fn for_score(score: u8) -> Self {
        if score >= STRONG_MIN_SCORE {
            ScoreTier::Strong
        } else if score >= VIABLE_MIN_SCORE {
            ScoreTier::Moderate
        } else {
            ScoreTier::Weak
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Viable,
    NotRecommended,
}

impl Verdict {
    pub fn for_score(score: u8) -> Self {
        if score >= VIABLE_MIN_SCORE {
            Verdict::Viable
        } else {
            Verdict::NotRecommended
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Verdict::Viable => "Candidato Viable",
            Verdict::NotRecommended => "No Recomendado",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    /// 1-based; position 1 is the top match.
    pub position: usize,
    pub filename: String,
    pub score: u8,
    pub tier: ScoreTier,
    pub verdict: Verdict,
    pub verdict_label: String,
}

/// Sorts by score, highest first. Equal scores keep their input order.
pub fn rank_candidates(results: &[CandidateResult]) -> Vec<RankedCandidate> {
    let mut ordered: Vec<&CandidateResult> = results.iter().collect();
    ordered.sort_by(|a, b| b.score.cmp(&a.score));

    ordered
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            let verdict = Verdict::for_score(r.score);
            RankedCandidate {
                position: i + 1,
                filename: r.filename.clone(),
                score: r.score,
                tier: ScoreTier::for_score(r.score),
                verdict,
                verdict_label: verdict.label().to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(filename: &str, score: u8) -> CandidateResult {
        CandidateResult {
            filename: filename.to_string(),
            score,
            summary: String::new(),
            pros: vec![],
            cons: vec![],
        }
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(ScoreTier::for_score(100), ScoreTier::Strong);
        assert_eq!(ScoreTier::for_score(80), ScoreTier::Strong);
        assert_eq!(ScoreTier::for_score(79), ScoreTier::Moderate);
        assert_eq!(ScoreTier::for_score(60), ScoreTier::Moderate);
        assert_eq!(ScoreTier::for_score(59), ScoreTier::Weak);
        assert_eq!(ScoreTier::for_score(0), ScoreTier::Weak);
    }

    #[test]
    fn test_verdict_threshold() {
        assert_eq!(Verdict::for_score(60), Verdict::Viable);
        assert_eq!(Verdict::for_score(59).label(), "No Recomendado");
    }

    #[test]
    fn test_rank_sorts_descending_and_is_stable() {
        let results = vec![
            result("a.pdf", 40),
            result("b.pdf", 85),
            result("c.pdf", 85),
            result("d.pdf", 62),
        ];
        let ranked = rank_candidates(&results);
        let names: Vec<&str> = ranked.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["b.pdf", "c.pdf", "d.pdf", "a.pdf"]);
        assert_eq!(ranked[0].position, 1);
        assert_eq!(ranked[3].tier, ScoreTier::Weak);
        // Input slice is untouched.
        assert_eq!(results[0].filename, "a.pdf");
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank_candidates(&[]).is_empty());
    }
}
