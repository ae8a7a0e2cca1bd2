use serde::{Serialize, Deserialize};

/// One word produced by a tokenizer.
///
/// `position` is the byte offset of the word in the source text and
/// `length` its byte span there; both refer to the original text even
/// after filters rewrite `text`. `rank` is the weight the tokenizer
/// assigns to this occurrence (≥ 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub rank: u32,
    pub position: u32,
    pub length: u32,
}

impl Token {
    pub fn new(text: String, rank: u32, position: u32) -> Self {
        let length = text.len() as u32;
        Token {
            text,
            rank: rank.max(1),
            position,
            length,
        }
    }

    /// End of the byte range this token occupies in the source text.
    pub fn end(&self) -> u32 {
        self.position + self.length
    }
}
