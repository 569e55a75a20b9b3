//! Canned reply texts and the keyword table.
//!
//! Each command has a Chinese and an English spelling that map to the same
//! reply. Lookup is an exact match on the trimmed, lowercased message text.

/// Reply for the study command.
pub const STUDY_REPLY: &str =
    "📚 開始學習！\n\n目前可學習：\n✅ 初級單字\n🔒 中級單字 (需訂閱)\n\n請選擇學習階段：";

/// Reply for the progress command.
pub const PROGRESS_REPLY: &str =
    "📊 您的學習進度：\n\n📚 初級單字：0/100\n🔒 中級單字：需要訂閱\n📖 總進度：0%";

/// Reply for the quiz command.
pub const QUIZ_REPLY: &str = "🎮 測驗功能！\n\n🔒 此功能需要訂閱付費版\n💎 升級後可享受：\n• 隨機20題測驗\n• 錯誤分析\n• 弱點改善建議";

/// Reply for the bookmark command.
pub const BOOKMARK_REPLY: &str =
    "⭐ 您的書籤單字：\n\n目前沒有書籤單字\n學習過程中可以將重要單字加入書籤！";

/// Reply for the subscribe command.
pub const SUBSCRIBE_REPLY: &str = "💎 訂閱付費版解鎖全功能！\n\n🆓 免費版：\n• 初級單字學習\n• 基礎進度追蹤\n• 書籤功能\n\n💎 付費版：\n• 完整學習路徑\n• 智能測驗系統\n• 錯誤分析報告\n• 個人化推薦";

/// Reply for the help command.
pub const HELP_REPLY: &str = "❓ 使用說明\n\n這是一個英檢單字學習 LINE Bot\n\n📱 手機用戶：使用下方選單\n💻 電腦用戶：輸入文字指令\n\n開發中功能會陸續開放！";

/// Reply for text that matches no command.
pub const DEFAULT_REPLY: &str = "歡迎使用英檢單字學習 Bot！\n\n🎯 可用指令：\n📚 學習 - 開始學習單字\n📊 進度 - 查看學習進度\n🎮 測驗 - 開始測驗\n⭐ 書籤 - 查看書籤單字\n💎 訂閱 - 升級到付費版\n❓ 說明 - 查看使用說明";

/// Reply sent when a user adds the bot.
pub const WELCOME_REPLY: &str = "🎉 歡迎加入英檢單字學習！\n\n我是您的英語學習夥伴，可以幫助您：\n📚 學習初級和中級單字\n📊 追蹤學習進度\n🎮 進行測驗練習\n⭐ 管理重要單字書籤\n\n輸入「說明」開始使用！";

/// Reply sent for any postback action.
pub const POSTBACK_REPLY: &str = "功能開發中，敬請期待！";

/// A keyword command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// Chinese keyword.
    pub zh: &'static str,
    /// English keyword, lowercase.
    pub en: &'static str,
    /// Reply text.
    pub reply: &'static str,
}

/// Fixed keyword table.
pub const COMMANDS: [Command; 6] = [
    Command { zh: "學習", en: "study", reply: STUDY_REPLY },
    Command { zh: "進度", en: "progress", reply: PROGRESS_REPLY },
    Command { zh: "測驗", en: "test", reply: QUIZ_REPLY },
    Command { zh: "書籤", en: "bookmark", reply: BOOKMARK_REPLY },
    Command { zh: "訂閱", en: "subscribe", reply: SUBSCRIBE_REPLY },
    Command { zh: "說明", en: "help", reply: HELP_REPLY },
];

/// Trims surrounding whitespace and lowercases.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Finds the command for already-normalized text.
pub fn lookup(normalized: &str) -> Option<&'static Command> {
    COMMANDS.iter().find(|command| command.zh == normalized || command.en == normalized)
}

/// Reply for raw message text, falling back to the default reply.
pub fn reply_for(text: &str) -> &'static str {
    lookup(&normalize(text)).map_or(DEFAULT_REPLY, |command| command.reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_spellings_share_reply() {
        for command in &COMMANDS {
            assert_eq!(reply_for(command.zh), reply_for(command.en));
            assert_eq!(reply_for(command.zh), command.reply);
        }
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        assert_eq!(reply_for(" Study "), STUDY_REPLY);
        assert_eq!(reply_for("STUDY"), STUDY_REPLY);
        assert_eq!(reply_for("study"), STUDY_REPLY);
        assert_eq!(reply_for("\n說明\t"), HELP_REPLY);
    }

    #[test]
    fn unmatched_text_gets_default_reply() {
        assert_eq!(reply_for("hello there"), DEFAULT_REPLY);
        assert_eq!(reply_for(""), DEFAULT_REPLY);
        assert_eq!(reply_for("study now"), DEFAULT_REPLY);
        assert!(!DEFAULT_REPLY.is_empty());
    }

    #[test]
    fn every_reply_is_non_empty() {
        assert!(COMMANDS.iter().all(|command| !command.reply.is_empty()));
        assert!(!WELCOME_REPLY.is_empty());
        assert!(!POSTBACK_REPLY.is_empty());
    }
}
