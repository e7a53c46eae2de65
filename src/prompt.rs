//! Prompt composition for the answer loop.
//!
//! One fixed template per question: retrieved context and the raw
//! question are embedded in delimited sections, with instructions that
//! keep the model grounded in the supplied context.

/// Emitted when the context holds no answer. Also returned directly by
/// the answer loop when retrieval finds nothing at all.
pub const FALLBACK: &str = "I'm sorry but I do not know the answer to your question. \
Please visit Microsoft Learn (https://learn.microsoft.com) or ask a question on \
StackOverflow (https://stackoverflow.com/questions/tagged/azure).";

/// Answer-grounding template. `{context}` and `{question}` are filled by
/// [`compose`]; `{fallback}` is the fixed no-answer message above.
const TEMPLATE: &str = "\
Use the following pieces of context to answer the question at the end. \
Question is enclosed in <question></question>.
Do keep the following things in mind when answering the question:
- If you don't know the answer, just say that you don't know, don't try to make up an answer.
- Keep the answer as concise as possible.
- Use only the context to answer the question. Context is enclosed in <context></context>
- The context contains one or more paragraph of text that is formatted as markdown. \
When answering, remove the sentences from the markdown that contain markdown links.
- If the answer is not found in context, simply output \"{fallback}\"
- Do not include the code in output unless the question is asked to produce the code.

<context>{context}</context>
<question>{question}</question>
";

/// Fill the template with retrieved context and the user's question.
pub fn compose(context: &str, question: &str) -> String {
    TEMPLATE
        .replace("{fallback}", FALLBACK)
        .replace("{context}", context)
        .replace("{question}", question)
}
