//! Prompt templates for grounded answers

use crate::retrieval::ScoredChunk;

/// Prompt builder for document chat
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the context block from retrieved chunks, in retrieval order
    pub fn build_context(results: &[ScoredChunk]) -> String {
        let mut context = String::new();

        for (i, result) in results.iter().enumerate() {
            context.push_str(&format!(
                "[{}] {} (chunk {})\n\nContent:\n{}\n\n---\n\n",
                i + 1,
                result.chunk.source,
                result.chunk.index + 1,
                result.chunk.text
            ));
        }

        context
    }

    /// Build the full prompt sent to the generative model
    pub fn build_prompt(question: &str, context: &str, has_attachment: bool) -> String {
        let attachment_rule = if has_attachment {
            "\n6. The full document is attached; use it only to clarify the excerpts above"
        } else {
            ""
        };

        format!(
            r#"You are an assistant answering questions about a single document the user provided.

GROUNDING RULES:
1. Answer using the information in the CONTEXT below
2. If the answer is not in the context, say that the document does not contain it
3. Do not use outside knowledge to fill gaps
4. Quote or stay close to the source text for facts, names and numbers
5. Keep the answer concise; use short paragraphs or lists when it helps{attachment_rule}

CONTEXT FROM THE DOCUMENT:
{context}
QUESTION: {question}

Answer:"#,
            attachment_rule = attachment_rule,
            context = context,
            question = question.trim()
        )
    }

    /// Build context and prompt in one step
    pub fn for_question(question: &str, results: &[ScoredChunk], has_attachment: bool) -> String {
        Self::build_prompt(question, &Self::build_context(results), has_attachment)
    }
}
