use crate::analysis::token::Token;

/// Rewrites or drops tokens after tokenization. Filters must keep
/// `position`/`length` pointing at the original text.
pub trait TokenFilter: Send + Sync {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token>;

    fn name(&self) -> &str;

    fn clone_box(&self) -> Box<dyn TokenFilter>;
}
