/// Instruction block shared by every model template. The row text is
/// appended directly after the trailing `Text: `.
pub const PROMPT: &str = "As an Educational Assistant, create a multiple-choice question in Persian from a given text, ensuring that the question has one correct answer and three plausible distractors. Follow these guidelines:\n\
1- Identify key concepts and details.\n\
2- Use clear, concise, grammatically correct Persian.\n\
3- Correct answers must be directly from the text.\n\
4- Provide a question in the list format as follows:\n\
Question ? الف. Correct answer (پاسخ صحیح) ب. Incorrect answer (پاسخ غلط) ج. Incorrect answer (پاسخ غلط) د. Incorrect answer (پاسخ غلط)\n\nText: ";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_layout() {
        assert!(PROMPT.starts_with("As an Educational Assistant"));
        assert!(PROMPT.ends_with("(پاسخ غلط)\n\nText: "));
        // 說明 + 四條規則 + 範例格式
        assert_eq!(PROMPT.lines().count(), 8);
        assert!(PROMPT.contains("\n4- Provide a question in the list format as follows:\nQuestion ? الف."));
    }
}
