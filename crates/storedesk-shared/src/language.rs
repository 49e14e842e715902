//! Response languages and the fixed message templates for each.

use serde::{Deserialize, Serialize};

/// Languages the store desk can answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ko,
    En,
    Ja,
    Zh,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Language {
    pub const ALL: [Language; 4] = [Language::Ko, Language::En, Language::Ja, Language::Zh];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Ko => "ko",
            Self::En => "en",
            Self::Ja => "ja",
            Self::Zh => "zh",
        }
    }

    /// Parse a language code (`"en"`, `"KO"`, ...)
    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ko" => Some(Self::Ko),
            "en" => Some(Self::En),
            "ja" => Some(Self::Ja),
            "zh" => Some(Self::Zh),
            _ => None,
        }
    }

    /// Parse a code or a language name in any of the supported languages.
    pub fn from_name_or_code(s: &str) -> Option<Self> {
        if let Some(lang) = Self::from_code(s) {
            return Some(lang);
        }
        match s.trim().to_lowercase().as_str() {
            "korean" | "korea" | "한국어" | "한국말" => Some(Self::Ko),
            "english" | "영어" => Some(Self::En),
            "japanese" | "japan" | "일본어" | "日本語" => Some(Self::Ja),
            "chinese" | "china" | "중국어" | "中文" => Some(Self::Zh),
            _ => None,
        }
    }

    /// Name of the language written in that language
    pub fn native_name(&self) -> &'static str {
        match self {
            Self::Ko => "한국어",
            Self::En => "English",
            Self::Ja => "日本語",
            Self::Zh => "中文",
        }
    }

    /// Name used when instructing a model which language to answer in
    pub fn english_name(&self) -> &'static str {
        match self {
            Self::Ko => "Korean",
            Self::En => "English",
            Self::Ja => "Japanese",
            Self::Zh => "Chinese",
        }
    }

    /// "I don't know, please ask staff"
    pub fn dont_know(&self) -> &'static str {
        match self {
            Self::Ko => "제가 잘 모르겠어요. 죄송하지만 직원에게 문의해주세요.",
            Self::En => "I'm not sure about that. Please ask a staff member.",
            Self::Ja => "よく分かりません。申し訳ありませんが、スタッフにお尋ねください。",
            Self::Zh => "我不太清楚。抱歉，请咨询店员。",
        }
    }

    /// Suffix appended after a truncated answer, including its separator.
    pub fn more_detail_suffix(&self) -> &'static str {
        match self {
            Self::Ko => "\n\n더 자세히 설명해드릴까요?",
            Self::En => "\n\nWould you like more detail?",
            Self::Ja => "\n\nもっと詳しく説明しましょうか？",
            Self::Zh => "\n\n需要我详细说明吗？",
        }
    }

    /// Shown when a model or embedding service is unavailable
    pub fn apology(&self) -> &'static str {
        match self {
            Self::Ko => "죄송합니다. 일시적인 오류가 발생했습니다.",
            Self::En => "Sorry, something went wrong. Please try again.",
            Self::Ja => "申し訳ありません。一時的なエラーが発生しました。",
            Self::Zh => "抱歉，出现了暂时性错误。",
        }
    }

    /// Prefix for a failed tool call; the tool error follows it
    pub fn tool_failed(&self) -> &'static str {
        match self {
            Self::Ko => "요청을 처리하지 못했어요",
            Self::En => "I couldn't complete that request",
            Self::Ja => "リクエストを処理できませんでした",
            Self::Zh => "无法完成该请求",
        }
    }

    /// Confirmation written in the newly selected language
    pub fn changed_message(&self) -> &'static str {
        match self {
            Self::Ko => "언어가 한국어로 변경되었습니다.",
            Self::En => "Language changed to English.",
            Self::Ja => "言語が日本語に変更されました。",
            Self::Zh => "语言已切换为中文。",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_korean() {
        assert_eq!(Language::default(), Language::Ko);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Language::from_code("EN"), Some(Language::En));
        assert_eq!(Language::from_code(" zh "), Some(Language::Zh));
        assert_eq!(Language::from_code("fr"), None);
    }

    #[test]
    fn test_from_name_or_code() {
        assert_eq!(Language::from_name_or_code("English"), Some(Language::En));
        assert_eq!(Language::from_name_or_code("일본어"), Some(Language::Ja));
        assert_eq!(Language::from_name_or_code("中文"), Some(Language::Zh));
        assert_eq!(Language::from_name_or_code("klingon"), None);
    }

    #[test]
    fn test_serde_uses_codes() {
        assert_eq!(serde_json::to_string(&Language::Ja).unwrap(), "\"ja\"");
        let lang: Language = serde_json::from_str("\"ko\"").unwrap();
        assert_eq!(lang, Language::Ko);
    }

    #[test]
    fn test_every_language_has_templates() {
        for lang in Language::ALL {
            assert!(!lang.dont_know().is_empty());
            assert!(lang.more_detail_suffix().starts_with("\n\n"));
            assert!(!lang.apology().is_empty());
        }
    }
}
