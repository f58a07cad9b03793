//! Reading time estimation

use super::post::ContentBlock;

/// Assumed reading speed
pub const WORDS_PER_MINUTE: usize = 200;

/// Number of whitespace-separated tokens in `text`
pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Tokens across every heading and body segment
pub fn total_tokens(blocks: &[ContentBlock]) -> usize {
    blocks
        .iter()
        .map(|block| {
            let body: usize = block.body.0.iter().map(|n| count_tokens(&n.text)).sum();
            count_tokens(&block.heading) + body
        })
        .sum()
}

/// Minutes needed to read `tokens` words, rounded up
pub fn minutes_for_tokens(tokens: usize) -> usize {
    tokens.div_ceil(WORDS_PER_MINUTE)
}

/// Estimated minutes to read the given content
pub fn estimate_minutes(blocks: &[ContentBlock]) -> usize {
    minutes_for_tokens(total_tokens(blocks))
}
