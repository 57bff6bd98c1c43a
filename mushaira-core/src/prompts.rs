//! Instructions sent to the oracle.
//!
//! The wording stays in Persian: the oracle answers in the language it is
//! addressed in, and the feedback it writes is shown to the player as is.

/// Marker used in place of the required letter when there is none.
pub const NO_CONSTRAINT: &str = "ندارد";

/// System prompt for opening a game.
pub const OPENING_SYSTEM_PROMPT: &str =
    "تو یک استاد ادبیات فارسی و عاشق مشاعره هستی. با لحنی مودبانه و ادیبانه صحبت کن.";

/// System prompt for judging a turn.
pub const JUDGE_SYSTEM_PROMPT: &str = "تو یک استاد سخت‌گیر اما مهربان مشاعره هستی. \
فقط ابیات واقعی فارسی را بپذیر. اگر کاربر تقلب کرد یا جمله معمولی گفت، قبول نکن.";

/// Instruction asking for an opening verse.
pub fn opening_instruction(tool_name: &str) -> String {
    format!(
        r#"ما می‌خواهیم بازی مشاعره را شروع کنیم.
لطفاً یک بیت شعر زیبای فارسی از یک شاعر معروف (مثل حافظ، سعدی، مولانا) انتخاب کن و بازی را شروع کن.
پاسخ خود را فقط با فراخوانی ابزار {tool_name} بده، با این مقادیر:
isValid: true
message: "سلام! بیایید مشاعره کنیم. من شروع می‌کنم."
botVerse: (بیت شعر)
botVersePoet: (نام شاعر)
nextLetter: (حرف آخر بیت تو)"#
    )
}

/// Instruction asking the oracle to judge a verse and answer it.
pub fn verdict_instruction(tool_name: &str, verse_text: &str, required_letter: Option<char>) -> String {
    let letter = required_letter
        .map(String::from)
        .unwrap_or_else(|| NO_CONSTRAINT.to_string());

    format!(
        r#"کاربر یک بیت شعر ارسال کرده است: "{verse_text}".
قوانین:
1. بررسی کن آیا این یک بیت یا مصرع معنادار فارسی است؟
2. حرف لازم: {letter}. اگر حرف لازم وجود دارد، بررسی کن آیا بیت کاربر با همین حرف شروع شده است. (آ و ا یکی هستند).
3. اگر نامعتبر است، isValid: false و دلیل را در message بنویس.
4. اگر معتبر است، isValid: true. سپس خودت یک بیت شعر بگو که با حرف آخر بیت کاربر شروع شود و آن را در botVerse بگذار.
5. حرف آخر بیت خودت را در nextLetter بگذار.
6. نام شاعر را در botVersePoet بگذار.
7. اگر نمی‌توانی بیتی بگویی، isWinner: true بگذار و در message به کاربر تبریک بگو.
پاسخ خود را فقط با فراخوانی ابزار {tool_name} بده."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_instruction_embeds_verse_and_letter() {
        let prompt = verdict_instruction("record_verdict", "زبان فارسی زیباست", Some('ز'));
        assert!(prompt.contains("\"زبان فارسی زیباست\""));
        assert!(prompt.contains("حرف لازم: ز."));
        assert!(prompt.contains("record_verdict"));
    }

    #[test]
    fn test_verdict_instruction_without_constraint() {
        let prompt = verdict_instruction("record_verdict", "بیت", None);
        assert!(prompt.contains(&format!("حرف لازم: {NO_CONSTRAINT}.")));
    }

    #[test]
    fn test_opening_instruction_names_tool() {
        assert!(opening_instruction("record_verdict").contains("record_verdict"));
    }
}
