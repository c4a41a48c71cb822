//! Commit helper: phrasing suggestions for a builder's commitment.
//!
//! Free text is sorted into a project [`Category`] by keyword, and the
//! category's templates are personalized with the first significant word
//! of the text. [`improve`] tidies a draft into the board's usual
//! "Building ... on Base" shape. Everything here is pure string work.

use serde::{Deserialize, Serialize};

/// Project category a description is matched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Lending, swaps, yield.
    Defi,
    /// Tokens, collectibles, digital art.
    Nft,
    /// Governance and treasuries.
    Dao,
    /// Developer tools, SDKs, APIs.
    Infrastructure,
    /// Communities and messaging.
    Social,
    /// Games.
    Gaming,
    /// Anything else.
    General,
}

/// Categories offered as one-click template sets, in display order.
pub const QUICK_CATEGORIES: [Category; 6] = [
    Category::Defi,
    Category::Nft,
    Category::Dao,
    Category::Infrastructure,
    Category::Social,
    Category::Gaming,
];

/// Keyword sets, checked in order. The first category with any keyword
/// contained in the lowercased text wins.
const KEYWORDS: [(Category, &[&str]); 6] = [
    (
        Category::Defi,
        &["defi", "lending", "borrow", "yield", "liquidity", "swap", "dex"],
    ),
    (
        Category::Nft,
        &["nft", "token", "collect", "art", "digital asset"],
    ),
    (
        Category::Dao,
        &["dao", "govern", "vote", "proposal", "treasury"],
    ),
    (
        Category::Infrastructure,
        &["tool", "infra", "sdk", "api", "developer"],
    ),
    (Category::Social, &["social", "community", "chat", "message"]),
    (Category::Gaming, &["game", "play", "earn", "battle"]),
];

/// Suggestions for an empty description.
const FALLBACK: [&str; 3] = [
    "Building innovative solutions on Base to empower the onchain economy",
    "Committed to shipping useful products for the Base community",
    "Creating tools that make blockchain more accessible on Base",
];

/// Leading verbs a personalized template rewrites.
const TEMPLATE_VERBS: [&str; 3] = ["Building", "Creating", "Developing"];

/// Openers [`improve`] leaves alone.
const OPENERS: [&str; 5] = ["building", "creating", "developing", "committed", "shipping"];

/// Shortest word used to personalize templates.
const MIN_KEYWORD_LEN: usize = 4;

/// Template sentences for a category.
pub const fn templates(category: Category) -> [&'static str; 3] {
    match category {
        Category::Defi => [
            "Building a decentralized lending protocol on Base for accessible finance",
            "Creating composable DeFi primitives to unlock liquidity on Base",
            "Developing yield optimization strategies for Base ecosystem growth",
        ],
        Category::Nft => [
            "Launching an NFT marketplace with zero gas minting on Base",
            "Building dynamic NFTs that evolve with onchain activity on Base",
            "Creating NFT infrastructure for digital identity on Base",
        ],
        Category::Dao => [
            "Developing DAO governance tools for decentralized decision-making on Base",
            "Building treasury management systems for Base communities",
            "Creating voting mechanisms for fair and transparent governance on Base",
        ],
        Category::Infrastructure => [
            "Building developer tools to accelerate Base ecosystem growth",
            "Creating scalable infrastructure for high-throughput dapps on Base",
            "Developing cross-chain bridges to connect Base with other networks",
        ],
        Category::Social => [
            "Building onchain social networks for authentic community engagement on Base",
            "Creating reputation systems for trusted interactions on Base",
            "Developing messaging protocols for decentralized communication on Base",
        ],
        Category::Gaming => [
            "Building onchain games with true asset ownership on Base",
            "Creating play-to-earn mechanics that reward skill and strategy on Base",
            "Developing gaming infrastructure for seamless blockchain integration on Base",
        ],
        Category::General => [
            "Committed to building the next generation of onchain applications on Base",
            "Shipping products that make blockchain accessible to everyone on Base",
            "Creating tools that empower builders in the Base ecosystem",
        ],
    }
}

/// Match a description to a category by substring.
pub fn classify(text: &str) -> Category {
    let lower = text.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map_or(Category::General, |(category, _)| *category)
}

/// First word of at least four ASCII word characters, lowercased.
fn first_keyword(text: &str) -> Option<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .find(|word| word.len() >= MIN_KEYWORD_LEN)
        .map(str::to_owned)
}

/// Replace the earliest template verb with `Building <keyword>-focused`.
fn personalize(template: &str, keyword: &str) -> String {
    let earliest = TEMPLATE_VERBS
        .iter()
        .filter_map(|verb| template.find(verb).map(|at| (at, verb.len())))
        .min_by_key(|(at, _)| *at);
    match earliest {
        Some((at, len)) => {
            let (head, rest) = template.split_at(at);
            let tail = rest.get(len..).unwrap_or_default();
            format!("{head}Building {keyword}-focused{tail}")
        }
        None => template.to_owned(),
    }
}

/// Suggestions for a description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestions {
    /// The matched category, absent for an empty description.
    pub category: Option<Category>,
    /// Candidate commitment sentences.
    pub suggestions: Vec<String>,
}

/// Suggest commitments for a free-text project description.
pub fn suggest(description: &str) -> Suggestions {
    if description.trim().is_empty() {
        return Suggestions {
            category: None,
            suggestions: FALLBACK.iter().map(|s| (*s).to_owned()).collect(),
        };
    }

    let category = classify(description);
    let keyword = first_keyword(description);
    let suggestions = templates(category)
        .iter()
        .map(|template| match &keyword {
            Some(keyword) => personalize(template, keyword),
            None => (*template).to_owned(),
        })
        .collect();
    Suggestions {
        category: Some(category),
        suggestions,
    }
}

/// The unmodified templates of one category.
pub fn quick_templates(category: Category) -> Suggestions {
    Suggestions {
        category: Some(category),
        suggestions: templates(category).iter().map(|s| (*s).to_owned()).collect(),
    }
}

fn starts_with_opener(text: &str) -> bool {
    let lower = text.to_lowercase();
    OPENERS.iter().any(|opener| lower.starts_with(opener))
}

fn with_first_char(text: &str, map: impl Fn(char) -> String) -> String {
    let mut chars = text.chars();
    chars
        .next()
        .map_or_else(String::new, |first| map(first) + chars.as_str())
}

/// Tidy a draft commitment.
///
/// Drops one trailing period, mentions Base, starts with a capital and
/// opens with a builder verb. Returns `None` for blank input.
pub fn improve(draft: &str) -> Option<String> {
    let draft = draft.trim();
    if draft.is_empty() {
        return None;
    }

    let mut text = draft.strip_suffix('.').unwrap_or(draft).to_owned();
    if !text.to_lowercase().contains("base") {
        text.push_str(" on Base");
    }
    text = with_first_char(&text, |c| c.to_uppercase().collect());
    if !starts_with_opener(&text) {
        text = format!(
            "Building {}",
            with_first_char(&text, |c| c.to_lowercase().collect())
        );
    }
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_checks_categories_in_order() {
        assert_eq!(classify("A lending protocol for small shops"), Category::Defi);
        assert_eq!(classify("Generative ART drops"), Category::Nft);
        assert_eq!(classify("treasury dashboards"), Category::Dao);
        assert_eq!(classify("an SDK for wallets"), Category::Infrastructure);
        assert_eq!(classify("group chat"), Category::Social);
        assert_eq!(classify("a battle arena"), Category::Gaming);
        assert_eq!(classify("coffee subscriptions"), Category::General);
        // "swap" and "token" both match; DeFi is checked first.
        assert_eq!(classify("token swap"), Category::Defi);
    }

    #[test]
    fn substring_matches_count() {
        // "earn" inside "learning" selects gaming.
        assert_eq!(classify("learning"), Category::Gaming);
    }

    #[test]
    fn empty_description_gets_fallback_ideas() {
        let result = suggest("   ");
        assert_eq!(result.category, None);
        assert_eq!(result.suggestions.len(), 3);
        assert_eq!(
            result.suggestions.first().map(String::as_str),
            Some("Building innovative solutions on Base to empower the onchain economy")
        );
    }

    #[test]
    fn suggestions_use_first_long_word() {
        let result = suggest("A lending protocol for small businesses");
        assert_eq!(result.category, Some(Category::Defi));
        assert_eq!(
            result.suggestions,
            vec![
                "Building lending-focused a decentralized lending protocol on Base for accessible finance",
                "Building lending-focused composable DeFi primitives to unlock liquidity on Base",
                "Building lending-focused yield optimization strategies for Base ecosystem growth",
            ]
        );
    }

    #[test]
    fn templates_without_a_leading_verb_are_rewritten_in_place() {
        let result = suggest("mint nfts");
        assert_eq!(result.category, Some(Category::Nft));
        assert_eq!(
            result.suggestions.first().map(String::as_str),
            Some("Launching an NFT marketplace with zero gas minting on Base")
        );
        assert_eq!(
            result.suggestions.get(1).map(String::as_str),
            Some("Building mint-focused dynamic NFTs that evolve with onchain activity on Base")
        );
        assert_eq!(
            result.suggestions.get(2).map(String::as_str),
            Some("Building mint-focused NFT infrastructure for digital identity on Base")
        );
    }

    #[test]
    fn short_words_leave_templates_untouched() {
        let result = suggest("a dao");
        assert_eq!(result.category, Some(Category::Dao));
        assert_eq!(result.suggestions, templates(Category::Dao).to_vec());
    }

    #[test]
    fn quick_templates_cover_six_categories() {
        assert_eq!(QUICK_CATEGORIES.len(), 6);
        assert!(!QUICK_CATEGORIES.contains(&Category::General));
        let gaming = quick_templates(Category::Gaming);
        assert_eq!(gaming.suggestions, templates(Category::Gaming).to_vec());
    }

    #[test]
    fn improve_adds_base_and_a_builder_verb() {
        assert_eq!(
            improve("a lending app for students."),
            Some("Building a lending app for students on Base".to_owned())
        );
    }

    #[test]
    fn improve_keeps_existing_opener_and_base_mention() {
        assert_eq!(
            improve("shipping a wallet on base."),
            Some("Shipping a wallet on base".to_owned())
        );
        assert_eq!(
            improve("Committed to Base"),
            Some("Committed to Base".to_owned())
        );
    }

    #[test]
    fn improve_ignores_blank_input() {
        assert_eq!(improve(""), None);
        assert_eq!(improve("  \n"), None);
    }

    #[test]
    fn category_serializes_lowercase() {
        assert_eq!(
            serde_yml::to_string(&Category::Infrastructure).ok().as_deref().map(str::trim),
            Some("infrastructure")
        );
    }
}
