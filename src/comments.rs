//! Comment sanitizing and posting.

use chrono::Utc;
use thiserror::Error;

use crate::models::{Comment, Trade};

/// Why a comment was not posted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommentError {
    #[error("Comment is empty")]
    Empty,

    #[error("Comment limit reached ({max} per trade)")]
    LimitReached { max: usize },

    #[error("Trade {0} not found")]
    UnknownTrade(u64),
}

/// Clean up user-entered comment text.
///
/// Drops control characters other than newline and tab, collapses every
/// whitespace run to a single space, trims both ends and truncates to
/// `max_len` characters. Applying it twice gives the same result.
pub fn sanitize(text: &str, max_len: usize) -> String {
    let printable: String = text
        .chars()
        .filter(|&c| {
            let code = c as u32;
            (code >= 32 && code != 127) || c == '\n' || c == '\t'
        })
        .collect();

    let collapsed = printable.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_len {
        return collapsed;
    }

    let truncated: String = collapsed.chars().take(max_len).collect();
    truncated.trim_end().to_string()
}

/// Sanitize `raw` and append it to `trade` as a new comment.
pub fn post_comment(
    trade: &mut Trade,
    comment_id: u64,
    author: &str,
    raw: &str,
    max_comments: usize,
    max_len: usize,
) -> Result<Comment, CommentError> {
    let text = sanitize(raw, max_len);
    if text.is_empty() {
        return Err(CommentError::Empty);
    }
    if trade.comments().len() >= max_comments {
        return Err(CommentError::LimitReached { max: max_comments });
    }

    let comment = Comment {
        id: comment_id,
        trade_id: trade.id,
        username: author.to_string(),
        text,
        timestamp: Utc::now(),
    };
    trade.push_comment(comment.clone());
    Ok(comment)
}
