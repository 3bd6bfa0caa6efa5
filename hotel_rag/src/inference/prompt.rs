use lazy_static::lazy_static;
use regex::Regex;

use crate::models::SearchResult;
use crate::services::graph_retriever;

lazy_static! {
    static ref THINK_BLOCK: Regex = Regex::new(r"(?s)<think>.*?</think>").unwrap();
}

/// Prompt handed to the generative model: the retrieved hotels, then the question.
pub fn format_prompt(query: &str, context: &[SearchResult]) -> String {
    format!(
        "You are a travel assistant. Answer the question using only the hotel \
         information below. If the information is not sufficient, say so.\n\n\
         Hotels:\n{}\n\nQuestion: {}\nAnswer:",
        graph_retriever::format_results(context),
        query.trim()
    )
}

/// Remove reasoning blocks some chat models emit before the answer.
pub fn strip_thinking(text: &str) -> String {
    THINK_BLOCK.replace_all(text, "").trim().to_string()
}
