//! Prompt templates for the question-answering pipeline.
//!
//! Templates use plain `format!()` interpolation so a missing variable is a compile error.

/// Generate a prompt that folds the current question into the rolling conversation summary.
///
/// # Arguments
/// * `previous_summary` - The summary carried over from earlier turns
/// * `question` - The question being asked now
///
/// # Example
/// ```
/// use quorum::llm::prompts::memory_summary_prompt;
///
/// let prompt = memory_summary_prompt("We discussed the Q3 budget.", "Who approved it?");
/// assert!(prompt.contains("Q3 budget"));
/// assert!(prompt.contains("Who approved it?"));
/// ```
pub fn memory_summary_prompt(previous_summary: &str, question: &str) -> String {
    format!(
        r#"You maintain a running summary of a conversation about meeting transcripts.

Previous summary:
{previous_summary}

New question:
{question}

Write an updated summary of the conversation in 2-3 sentences.
Keep names, decisions and topics that later questions may refer to.

Respond with only the summary, no preamble."#
    )
}

/// Generate a prompt that makes a follow-up question self-contained using conversation memory.
///
/// # Example
/// ```
/// use quorum::llm::prompts::enhance_question_prompt;
///
/// let prompt = enhance_question_prompt("The team debated the launch date.", "When was it set?");
/// assert!(prompt.contains("launch date"));
/// ```
pub fn enhance_question_prompt(memory: &str, question: &str) -> String {
    format!(
        r#"Previous conversation context:
{memory}

Current question:
{question}

Rewrite the current question so it is clear and specific on its own, resolving references
to the previous context. Never change what the user is asking for.

Respond with only the rewritten question, no explanation."#
    )
}

/// Generate a prompt that rewrites a question into a form suited for semantic search
/// over meeting transcripts.
///
/// # Example
/// ```
/// use quorum::llm::prompts::search_rewrite_prompt;
///
/// let prompt = search_rewrite_prompt("what did ops say about the outage");
/// assert!(prompt.contains("outage"));
/// ```
pub fn search_rewrite_prompt(question: &str) -> String {
    format!(
        r#"Rewrite the following question to improve semantic search over meeting transcripts.
Expand abbreviations and add the key terms a transcript would contain.
The rewritten question may be longer, but it must keep the user's intent exactly.

Question: {question}

Respond with only the rewritten question, no explanation."#
    )
}

/// Generate the structured-answer prompt.
///
/// The model must reply with a JSON object holding a short `answer` and a list of `quotes`,
/// each quote being a literal excerpt of the supplied context with its speaker label.
///
/// # Arguments
/// * `question` - The user's question
/// * `context` - The assembled grounding context
/// * `memory` - Optional conversation summary, omitted from the prompt when empty
pub fn structured_answer_prompt(question: &str, context: &str, memory: &str) -> String {
    let memory_block = if memory.trim().is_empty() {
        String::new()
    } else {
        format!("\n\nPrevious conversation context: {memory}")
    };

    format!(
        r#"You answer questions using meeting transcripts only.
Respond with a single JSON object in exactly this shape and nothing else:

{{
  "answer": "final answer grounded in the transcripts (5 sentences or fewer)",
  "quotes": [
    {{"text": "verbatim excerpt from the transcripts", "speaker": "Speaker 1"}}
  ]
}}

Question: {question}{memory_block}

Transcripts:
{context}

JSON:"#
    )
}

/// Generate the improvement prompt used for the single quality retry.
pub fn improve_answer_prompt(
    question: &str,
    previous_answer: &str,
    quality_score: u8,
    context: &str,
) -> String {
    format!(
        r#"You answer questions using meeting transcripts only.
The previous answer scored {quality_score}/5. Improve it.

Rules:
- Fix anything the reference material does not support.
- Remove vague wording and state the key facts directly.
- Keep it to 5 sentences or fewer.
- Never add information that is not in the reference material.

Question: {question}
Previous answer: {previous_answer}

Reference material:
{context}

Respond with a single JSON object and nothing else:
{{
  "answer": "improved answer without inline quotes",
  "quotes": [
    {{"text": "verbatim excerpt", "speaker": "Speaker 1"}}
  ]
}}"#
    )
}

/// Generate the 1-5 grading prompt for an answer.
///
/// # Example
/// ```
/// use quorum::llm::prompts::quality_evaluation_prompt;
///
/// let prompt = quality_evaluation_prompt("Who owns billing?", "Dana owns billing.");
/// assert!(prompt.contains("Dana owns billing."));
/// assert!(prompt.contains("1-5"));
/// ```
pub fn quality_evaluation_prompt(question: &str, answer: &str) -> String {
    format!(
        r#"Rate the quality of the following answer on a 1-5 scale.

Question: {question}
Answer: {answer}

Scale:
1: unrelated to the question
2: related but inaccurate
3: partially accurate
4: mostly accurate and useful
5: complete, accurate and very useful

Respond with only the number (for example: 4)."#
    )
}
