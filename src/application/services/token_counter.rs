use std::sync::LazyLock;
use tiktoken_rs::CoreBPE;

static TOKENIZER: LazyLock<CoreBPE> = LazyLock::new(|| {
    tiktoken_rs::cl100k_base().expect("Failed to initialize cl100k_base tokenizer")
});

/// Number of `cl100k_base` tokens in `text`; this is the unit tenant quotas are billed in.
pub fn count_tokens(text: &str) -> u64 {
    TOKENIZER.encode_with_special_tokens(text).len() as u64
}
