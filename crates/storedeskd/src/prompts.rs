//! Generation prompts for conversational replies, grounded answers and
//! tool-result narration.

use storedesk_shared::Language;

/// Answer rules shared by every generation prompt
fn answer_rules(language: Language, max_chars: usize) -> String {
    format!(
        r#"Answer rules:
1. Answer in at most {max_chars} characters.
2. Give only the point the customer asked for.
3. Be friendly but brief; skip unnecessary explanation.
4. NEVER make up facts. If you are not sure, answer exactly: "{dont_know}"
5. Respond in {language}."#,
        max_chars = max_chars,
        dont_know = language.dont_know(),
        language = language.english_name(),
    )
}

/// Plain conversational reply without retrieved context
pub fn conversational_prompt(message: &str, language: Language, max_chars: usize) -> String {
    format!(
        "You are a friendly staff member of this store.\n\n{}\n\nCustomer: {}\nStaff:",
        answer_rules(language, max_chars),
        message
    )
}

/// Answer grounded only in the retrieved store documents
pub fn retrieval_prompt(query: &str, context: &str, language: Language, max_chars: usize) -> String {
    format!(
        r#"You are a friendly staff member of this store.
Answer the customer's question using ONLY the store documents below.
If the documents do not contain the answer, do not guess.

{rules}

Store documents:
{context}

Customer question: {query}

Staff answer:"#,
        rules = answer_rules(language, max_chars),
        context = context,
        query = query,
    )
}

/// Narrate a structured tool result for the user
pub fn narration_prompt(
    message: &str,
    tool_name: &str,
    result_json: &str,
    language: Language,
    max_chars: usize,
) -> String {
    format!(
        r#"You are a helpful assistant for the store owner.
The tool "{tool_name}" was run for the request below. Explain its result.
Use ONLY the numbers and facts in the tool result; do not add anything that is not there.

{rules}

Request: {message}

Tool result (JSON):
{result_json}

Answer:"#,
        tool_name = tool_name,
        rules = answer_rules(language, max_chars),
        message = message,
        result_json = result_json,
    )
}
