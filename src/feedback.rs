use crate::models::{Direction, Word};

pub struct FeedbackGenerator;

impl FeedbackGenerator {
    /// Spelling answers must match the term (case-insensitive); meaning answers only need
    /// to appear somewhere in the stored meaning. A blank meaning answer is always wrong,
    /// even though the empty string is trivially contained in every meaning.
    pub fn is_correct(direction: Direction, word: &Word, user_input: &str) -> bool {
        let answer = user_input.trim().to_lowercase();
        match direction {
            Direction::Spelling => answer == word.term.to_lowercase(),
            Direction::Meaning => !answer.is_empty() && word.meaning.to_lowercase().contains(&answer),
        }
    }

    pub fn expected_answer(direction: Direction, word: &Word) -> &str {
        match direction {
            Direction::Spelling => &word.term,
            Direction::Meaning => &word.meaning,
        }
    }

    pub fn generate_explanation(direction: Direction, word: &Word, user_input: &str, vocabulary: &[Word]) -> String {
        let trimmed_input = user_input.trim();

        let mut msg = format!(
            "正确答案是 {}。 你输入了: '{}'。 请继续加油！",
            Self::expected_answer(direction, word),
            trimmed_input
        );

        if let Some(pronunciation) = word.pronunciation.as_deref().filter(|p| !p.is_empty()) {
            msg.push_str(&format!("\n{} 读作 {}。", word.term, pronunciation));
        }

        if trimmed_input.is_empty() {
            return msg;
        }

        // Find if the input belongs to another word
        let confused = vocabulary
            .iter()
            .filter(|other| other.id != word.id)
            .find(|other| Self::is_correct(direction, other, trimmed_input));

        if let Some(other) = confused {
            match direction {
                Direction::Spelling => msg.push_str(&format!(
                    "\n你输入的 '{}' 是另一个单词，意思是 '{}'。",
                    other.term, other.meaning
                )),
                Direction::Meaning => msg.push_str(&format!(
                    "\n'{}' 是单词 '{}' 的意思。",
                    trimmed_input, other.term
                )),
            }
        }

        msg
    }
}
