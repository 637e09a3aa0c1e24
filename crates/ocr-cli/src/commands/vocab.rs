//! Vocab command - show how a label file is re-indexed into model classes

use anyhow::{Context as _, Result};
use clap::Args;
use line_ocr::{Tokenizer, BLANK_ID, CTC_OFFSET, PAD_ID};
use std::path::PathBuf;

#[derive(Args)]
pub struct VocabCommand {
    /// JSON vocabulary (token -> id)
    #[arg(long, value_name = "FILE")]
    vocab: PathBuf,

    /// Unknown token name
    #[arg(long, default_value = "<unk>")]
    unk: String,

    /// Number of entries to list (0 lists all)
    #[arg(long, default_value = "0")]
    limit: usize,
}

impl VocabCommand {
    pub fn execute(self) -> Result<()> {
        let tokenizer = Tokenizer::from_file(&self.vocab, &self.unk)
            .with_context(|| format!("Failed to load vocabulary {}", self.vocab.display()))?;

        for line in describe(&tokenizer, self.limit) {
            println!("{line}");
        }
        Ok(())
    }
}

fn describe(tokenizer: &Tokenizer, limit: usize) -> Vec<String> {
    let mut lines = vec![
        format!(
            "vocab_size: {}, classes: {} (blank={}, pad={}, offset={})",
            tokenizer.vocab_size(),
            tokenizer.num_classes(),
            BLANK_ID,
            PAD_ID,
            CTC_OFFSET
        ),
        "class\tid\ttoken".to_string(),
    ];

    let take = if limit == 0 { usize::MAX } else { limit };
    for (id, token) in tokenizer.tokens().enumerate().take(take) {
        let marker = if token == tokenizer.unk_token() {
            "\t(unknown, never emitted)"
        } else {
            ""
        };
        lines.push(format!("{}\t{}\t{:?}{}", id + CTC_OFFSET, id, token, marker));
    }
    lines
}
