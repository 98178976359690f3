//! Token-limit error detection.
//!
//! Providers phrase context overflow a dozen different ways; the gateway
//! matches the runner's error text against the known family and recovers
//! with one shrink-and-retry.

use std::sync::OnceLock;

use regex::Regex;

static TOKEN_LIMIT_RE: OnceLock<Regex> = OnceLock::new();

fn pattern() -> &'static Regex {
    TOKEN_LIMIT_RE.get_or_init(|| {
        Regex::new(
            r"(?i)context[ _]length|prompt too long|token limit|max[a-z _-]*token|maximum context|exceeded|num_ctx|input[a-z _-]*length|too many tokens|token count|context window",
        )
        .expect("token-limit pattern is valid")
    })
}

/// Whether an error message reports context overflow.
pub fn is_token_limit_error(message: &str) -> bool {
    pattern().is_match(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_the_known_phrasings() {
        let positives = [
            "This model's maximum context length is 8192 tokens",
            "context_length_exceeded",
            "Prompt too long (num_ctx exceeded)",
            "Request exceeds the token limit",
            "max_tokens exceeded for this request",
            "input is too long: input_length > 4096",
            "too many tokens in prompt",
            "token count over budget",
            "request does not fit the context window",
            "quota exceeded",
        ];
        for msg in positives {
            assert!(is_token_limit_error(msg), "should match: {msg}");
        }
    }

    #[test]
    fn ignores_unrelated_errors() {
        let negatives = [
            "connection refused",
            "model not found",
            "invalid api key",
            "upstream timed out",
        ];
        for msg in negatives {
            assert!(!is_token_limit_error(msg), "should not match: {msg}");
        }
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert!(is_token_limit_error("CONTEXT WINDOW FULL"));
        assert!(is_token_limit_error("Token Limit reached"));
    }
}
