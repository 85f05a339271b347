use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::fund::FundRecord;
use crate::models::holding::{MatchedHolding, RawHolding};
use crate::models::settings::MatcherConfig;

/// Ordered substring rewrites applied to a lowercased scheme name.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("&", " and "),
    ("(", " "),
    (")", " "),
    ("[", " "),
    ("]", " "),
    ("-", " "),
    ("_", " "),
    (",", " "),
];

/// Tokens that carry no identifying information.
const NOISE_TOKENS: &[&str] = &["plan", "scheme"];

/// Rewrites applied after noise removal, so "Direct Plan Growth" and
/// "Direct Growth" collapse into the same single token.
const PLAN_PHRASES: &[(&str, &str)] = &[
    ("direct growth", "direct-growth"),
    ("regular growth", "regular-growth"),
];

/// Plan keywords whose presence must agree between the two names.
const PLAN_KEYWORDS: &[&str] = &["growth", "dividend", "idcw", "direct", "regular"];

/// Alternative spellings of the major fund houses, in normalized form.
/// A holding's AMC and a fund that hit the same row are the same house.
const AMC_VARIANTS: &[&[&str]] = &[
    &["sbi", "state bank"],
    &["icici", "icici prudential"],
    &["hdfc"],
    &["axis"],
    &["kotak", "kotak mahindra"],
    &["aditya birla", "birla", "absl", "aditya birla sun life"],
    &["nippon", "nippon india", "reliance"],
    &["uti"],
    &["dsp", "dsp blackrock"],
    &["franklin", "franklin templeton"],
    &["mirae", "mirae asset"],
    &["tata"],
    &["bandhan", "idfc"],
    &["ppfas", "parag parikh"],
    &["motilal", "motilal oswal"],
    &["l and t", "lnt"],
    &["invesco", "invesco india"],
    &["canara", "canara robeco"],
    &["edelweiss"],
    &["quant"],
    &["sundaram"],
];

/// Normalize a scheme name for comparison: lowercase, punctuation to
/// spaces, `ltd`/`ltd.` spelled out, noise tokens dropped, single spaces,
/// then plan phrases joined into one token.
pub fn normalize_scheme_name(name: &str) -> String {
    let mut lowered = name.to_lowercase();
    for (from, to) in REPLACEMENTS {
        lowered = lowered.replace(from, to);
    }
    let mut normalized = lowered
        .split_whitespace()
        .filter(|t| !NOISE_TOKENS.contains(t))
        .map(|t| match t {
            "ltd" | "ltd." => "limited",
            other => other,
        })
        .collect::<Vec<_>>()
        .join(" ");
    for (from, to) in PLAN_PHRASES {
        normalized = normalized.replace(from, to);
    }
    normalized
}

fn plan_flags(normalized: &str) -> u8 {
    PLAN_KEYWORDS
        .iter()
        .enumerate()
        .filter(|(_, k)| normalized.contains(*k))
        .fold(0, |flags, (i, _)| flags | (1 << i))
}

fn token_set(normalized: &str) -> HashSet<String> {
    normalized.split_whitespace().map(str::to_string).collect()
}

/// `|A ∩ B| / |A ∪ B|`, 0 when both sets are empty.
fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|t| large.contains(*t)).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

fn contains_phrase(tokens: &[&str], phrase: &str) -> bool {
    let phrase: Vec<&str> = phrase.split_whitespace().collect();
    !phrase.is_empty() && tokens.windows(phrase.len()).any(|w| w == phrase.as_slice())
}

fn starts_with_phrase(tokens: &[&str], phrase: &str) -> bool {
    let phrase: Vec<&str> = phrase.split_whitespace().collect();
    !phrase.is_empty() && tokens.starts_with(&phrase)
}

/// Every variant row mentioned anywhere in an AMC name.
fn amc_variants_in(amc_normalized: &str) -> Vec<usize> {
    let tokens: Vec<&str> = amc_normalized.split_whitespace().collect();
    AMC_VARIANTS
        .iter()
        .enumerate()
        .filter(|(_, aliases)| aliases.iter().any(|a| contains_phrase(&tokens, a)))
        .map(|(i, _)| i)
        .collect()
}

/// The variant row a scheme name starts with, if any.
fn amc_variant_prefix(name_normalized: &str) -> Option<usize> {
    let tokens: Vec<&str> = name_normalized.split_whitespace().collect();
    AMC_VARIANTS
        .iter()
        .position(|aliases| aliases.iter().any(|a| starts_with_phrase(&tokens, a)))
}

/// Precomputed comparison data for one registry fund.
#[derive(Debug)]
pub struct PreparedFund<'a> {
    pub fund: &'a FundRecord,
    normalized: String,
    tokens: HashSet<String>,
    plan: u8,
    fund_house: String,
    amc_variant: Option<usize>,
}

/// A registry snapshot with every fund name normalized exactly once.
#[derive(Debug)]
pub struct PreparedRegistry<'a> {
    funds: Vec<PreparedFund<'a>>,
}

impl<'a> PreparedRegistry<'a> {
    pub fn len(&self) -> usize {
        self.funds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }
}

/// Comparison data for the holding side.
struct PreparedHolding {
    normalized: String,
    tokens: HashSet<String>,
    plan: u8,
    amc: String,
    amc_variants: Vec<usize>,
}

impl PreparedHolding {
    fn new(holding: &RawHolding) -> Self {
        let normalized = normalize_scheme_name(&holding.scheme_name);
        let amc = normalize_scheme_name(&holding.amc_name);
        Self {
            tokens: token_set(&normalized),
            plan: plan_flags(&normalized),
            amc_variants: amc_variants_in(&amc),
            normalized,
            amc,
        }
    }
}

/// The accepted candidate for a holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub scheme_code: String,
    pub score: f64,
}

/// Display band for a match score. Not used for match decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchConfidence {
    High,
    Medium,
    Low,
    NoMatch,
}

impl MatchConfidence {
    pub fn from_score(score: f64) -> Self {
        if (0.9..=1.0).contains(&score) {
            MatchConfidence::High
        } else if (0.8..0.9).contains(&score) {
            MatchConfidence::Medium
        } else if (0.7..0.8).contains(&score) {
            MatchConfidence::Low
        } else {
            MatchConfidence::NoMatch
        }
    }

    pub fn for_holding(holding: &MatchedHolding) -> Self {
        match (holding.is_matched(), holding.match_score) {
            (true, Some(score)) => Self::from_score(score),
            _ => MatchConfidence::NoMatch,
        }
    }
}

/// How many holdings found a registry match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    pub matched: usize,
    pub unmatched: usize,
}

impl MatchStats {
    pub fn of(holdings: &[MatchedHolding]) -> Self {
        let matched = holdings.iter().filter(|h| h.is_matched()).count();
        Self {
            matched,
            unmatched: holdings.len() - matched,
        }
    }
}

/// Resolves free-text scheme names to registry scheme codes.
///
/// Pure function of its inputs: no hidden state, and for a given registry
/// order the result is deterministic (on equal scores the earlier candidate
/// wins).
pub struct FundMatcher {
    config: MatcherConfig,
}

impl FundMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Normalize every fund name in the snapshot once.
    pub fn prepare<'a>(&self, registry: &'a [FundRecord]) -> PreparedRegistry<'a> {
        let funds = registry
            .iter()
            .map(|fund| {
                let normalized = normalize_scheme_name(&fund.scheme_name);
                PreparedFund {
                    fund,
                    tokens: token_set(&normalized),
                    plan: plan_flags(&normalized),
                    fund_house: fund.fund_house().to_lowercase(),
                    amc_variant: amc_variant_prefix(&normalized),
                    normalized,
                }
            })
            .collect();
        PreparedRegistry { funds }
    }

    /// Match every raw holding against the registry snapshot.
    pub fn match_holdings(
        &self,
        holdings: &[RawHolding],
        registry: &[FundRecord],
    ) -> Vec<MatchedHolding> {
        let prepared = self.prepare(registry);
        let matched: Vec<MatchedHolding> = holdings
            .iter()
            .map(|h| {
                let best = self.best_match(h, &prepared);
                MatchedHolding::unmatched(h.clone())
                    .with_match(best.as_ref().map(|c| c.scheme_code.clone()), best.map(|c| c.score))
            })
            .collect();
        self.log_stats(&matched, prepared.len());
        matched
    }

    /// Match already-reconciled holdings again. Identities are kept; any
    /// previous match result is ignored and replaced.
    pub fn rematch_holdings(
        &self,
        holdings: &[MatchedHolding],
        registry: &[FundRecord],
    ) -> Vec<MatchedHolding> {
        let prepared = self.prepare(registry);
        let matched: Vec<MatchedHolding> = holdings
            .iter()
            .map(|h| {
                let best = self.best_match(&h.holding, &prepared);
                h.with_match(best.as_ref().map(|c| c.scheme_code.clone()), best.map(|c| c.score))
            })
            .collect();
        self.log_stats(&matched, prepared.len());
        matched
    }

    /// The highest-scoring candidate strictly above the acceptance threshold.
    /// An exact normalized-name match is returned as soon as it is seen.
    pub fn best_match(
        &self,
        holding: &RawHolding,
        registry: &PreparedRegistry<'_>,
    ) -> Option<MatchCandidate> {
        let prepared = PreparedHolding::new(holding);
        let mut best: Option<MatchCandidate> = None;
        let mut best_score = 0.0;

        for fund in &registry.funds {
            if Self::is_exact(&prepared, fund) {
                return Some(MatchCandidate {
                    scheme_code: fund.fund.scheme_code.clone(),
                    score: 1.0,
                });
            }
            let score = self.weighted_score(&prepared, fund);
            if score > best_score && score > self.config.acceptance_threshold {
                best_score = score;
                best = Some(MatchCandidate {
                    scheme_code: fund.fund.scheme_code.clone(),
                    score,
                });
            }
        }

        if best.is_none() {
            debug!("No registry match for '{}'", holding.scheme_name);
        }
        best
    }

    /// Confidence score in [0, 1] for one holding/fund pair.
    pub fn score(&self, holding: &RawHolding, fund: &FundRecord) -> f64 {
        let registry = self.prepare(std::slice::from_ref(fund));
        let prepared = PreparedHolding::new(holding);
        let fund = &registry.funds[0];
        if Self::is_exact(&prepared, fund) {
            1.0
        } else {
            self.weighted_score(&prepared, fund)
        }
    }

    fn is_exact(holding: &PreparedHolding, fund: &PreparedFund<'_>) -> bool {
        !holding.normalized.is_empty() && holding.normalized == fund.normalized
    }

    fn weighted_score(&self, holding: &PreparedHolding, fund: &PreparedFund<'_>) -> f64 {
        let mut score = 0.0;
        if Self::amc_matches(holding, fund) {
            score += self.config.amc_weight;
        }
        score += self.config.token_weight * jaccard(&holding.tokens, &fund.tokens);
        if holding.plan == fund.plan {
            score += self.config.plan_weight;
        }
        score.min(1.0)
    }

    fn amc_matches(holding: &PreparedHolding, fund: &PreparedFund<'_>) -> bool {
        let house = fund.fund_house.as_str();
        let amc = holding.amc.as_str();
        if !house.is_empty() && !amc.is_empty() && (amc.contains(house) || house.contains(amc)) {
            return true;
        }
        fund.amc_variant
            .is_some_and(|variant| holding.amc_variants.contains(&variant))
    }

    fn log_stats(&self, matched: &[MatchedHolding], registry_size: usize) {
        let stats = MatchStats::of(matched);
        info!(
            "Matched {}/{} holdings against {registry_size} registry schemes",
            stats.matched,
            matched.len()
        );
    }
}

impl Default for FundMatcher {
    fn default() -> Self {
        Self::new(MatcherConfig::default())
    }
}
