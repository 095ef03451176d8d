//! Prompt construction for classification and summarization.
//!
//! Prompts are written in Japanese because the mail they operate on is.

use crate::mail::ParsedMessage;
use crate::pipeline::types::Category;

/// Body text beyond this many characters is dropped from the summary prompt.
pub const MAX_BODY_CHARS: usize = 8000;

/// Fixed instruction for the subject classifier.
pub fn classification_system_prompt() -> String {
    "あなたは送られてきたメールの件名を見て、「案件の情報」か「要員の情報」かを判別して仕分けするアシスタントです。\n\
     入力されるメールの件名を読み取り、以下のルールに従って仕分けし、出力フォーマットで出力してください。\n\n\
     # 参考情報\n\
     ・「要員」はエンジニアの紹介で、「案件」はエンジニアが働く現場での求人情報です。\n\
     ・「案件」メールは要員を募集する目的で送信されています。\n\
     ・「要員」メールはエンジニアが案件を探す目的で送信されています。\n\n\
     # 例\n\
     ## 案件の例\n\
     【エンド直 / 複数名募集】フロントエンドエンジニア / フルリモート（全国勤務可）/ 転職・採用支援サービスのフロントエンドエンジニア\n\
     【swiftフルリモ案件/即日】swift 4年/基本設計〜\n\
     ## 要員の例\n\
     【ネイティブアプリスペシャリスト（歴10年）/即日】リーダー◎/要件定義/顧客折衝◎/Swift/Kotlin\n\
     案件ください！！【弊社社員/8月〜/React・Next/基本設計〜運用・保守】AR（28歳・女性・戸田）\n\n\
     # 仕分け方法\n\
     {classification} には次の値を入れてください。\n\
     案件の場合: 案件\n\
     要員の場合: 要員\n\
     要員でも案件でもない場合: 不明\n\n\
     # 出力フォーマット（JSONのみを出力してください）\n\
     {\"classification\": \"{classification}\"}"
        .to_string()
}

/// User turn for the classifier: just the subject.
pub fn classification_user_prompt(subject: &str) -> String {
    format!("# メールの件名\n{subject}")
}

/// Category-specific instruction for the summarizer.
pub fn summary_system_prompt(category: Category) -> String {
    let (target, remote_rule, location_rule, reward_rule, age_rule) = match category {
        Category::CandidateProfile => (
            "要員",
            "メールの本文から要員がリモート勤務に対してどのような希望を持っているか読み取って\"常駐可能\"か\"基本リモート\"か\"一部リモート\"か\"フルリモート\"のいずれかを入力してください。",
            "メールの本文からエンジニアの最寄駅を読み取って駅名や地域を入力してください。",
            "メールの本文から希望の報酬額を読み取り「万円」単位で表示した際の数字部分のみを2桁か3桁で入力してください（例：450,000円は45、1,000,000円は100）。範囲指定されている場合は、下限の金額のみを入力してください（例：40〜50万円は、40）。",
            "メールの本文からエンジニアの年齢を読み取って入力してください。",
        ),
        Category::JobPosting => (
            "案件",
            "メールの本文から、リモート勤務に対してどのような要請のある案件かを読み取って\"常駐\"か\"基本リモート\"か\"一部リモート\"か\"フルリモート\"のいずれかを入力してください。",
            "メールの本文から案件の稼働現場を読み取って駅名や地域を入力してください。",
            "メールの本文から報酬額を読み取り「万円」単位で表示した際の数字部分のみを2桁か3桁で入力してください（例：450,000円は45、1,000,000円は100）。範囲指定されている場合は、上限の金額のみを入力してください（例：40〜50万円は、50）。",
            "メールの本文から募集しているエンジニアの年齢制限を読み取って入力してください。",
        ),
    };

    format!(
        "あなたは{target}の情報を読み取り必要な情報をJSONへ変換するアシスタントです。\n\
         入力されるメールの件名・本文・送信元・送信先を読み取り、以下のルールに従って最終出力フォーマットで出力してください。\n\n\
         # 各種ルール\n\
         * subject は、メールの件名をそのまま入力してください。\n\
         * email は、メールの送信元アドレスを入力してください。\n\
         * remote は、{remote_rule}\n\
         * date_and_time は、メールの本文から面談や稼働の日時が読み取れれば入力してください。\n\
         * location は、{location_rule}\n\
         * start_time は、メールの本文から稼働の開始時期を入力してください。\n\
         * reward は、{reward_rule}\n\
         * age は、{age_rule}\n\
         * domain は、メールの送信先アドレスのうち@より後の部分を入力してください。\n\
         * 読み取れない項目は空文字列にしてください。\n\n\
         # 最終出力フォーマット\n\
         下記をvalidなJSONとしてそのまま出力してください。コードブロックで囲まず、「json」という文字は絶対に出力しないでください。\n\
         {{\"subject\": \"\", \"email\": \"\", \"remote\": \"\", \"date_and_time\": \"\", \"location\": \"\", \"start_time\": \"\", \"reward\": \"\", \"age\": \"\", \"domain\": \"\"}}"
    )
}

/// User turn for the summarizer: the message fields, body truncated.
pub fn summary_user_prompt(message: &ParsedMessage) -> String {
    let body: String = message.body.chars().take(MAX_BODY_CHARS).collect();
    format!(
        "# 参考情報\n\
         メールの件名：{}\n\
         メールの送信元：{}\n\
         メールの送信先：{}\n\
         メールの内容：\n{}",
        message.subject, message.sender, message.recipient, body
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(body: &str) -> ParsedMessage {
        ParsedMessage {
            subject: "【即日】React案件 40〜50万円".into(),
            body: body.into(),
            sender: "sales@partner.example.com".into(),
            recipient: "inbox@ses.example.co.jp".into(),
            received_at: None,
            attachments: vec![],
        }
    }

    #[test]
    fn classification_prompt_defines_all_labels() {
        let prompt = classification_system_prompt();
        assert!(prompt.contains("案件の場合: 案件"));
        assert!(prompt.contains("要員の場合: 要員"));
        assert!(prompt.contains("不明"));
        assert!(prompt.contains("\"classification\""));
    }

    #[test]
    fn classification_user_prompt_carries_subject() {
        assert!(classification_user_prompt("Swift案件").ends_with("Swift案件"));
    }

    #[test]
    fn candidate_prompt_takes_lower_bound() {
        let prompt = summary_system_prompt(Category::CandidateProfile);
        assert!(prompt.contains("下限"));
        assert!(prompt.contains("常駐可能"));
        assert!(!prompt.contains("上限"));
    }

    #[test]
    fn job_prompt_takes_upper_bound() {
        let prompt = summary_system_prompt(Category::JobPosting);
        assert!(prompt.contains("上限"));
        assert!(prompt.contains("\"常駐\""));
        assert!(!prompt.contains("常駐可能"));
        assert!(prompt.contains("年齢制限"));
    }

    #[test]
    fn summary_prompts_request_every_field() {
        for category in [Category::JobPosting, Category::CandidateProfile] {
            let prompt = summary_system_prompt(category);
            for field in [
                "subject", "email", "remote", "date_and_time", "location", "start_time",
                "reward", "age", "domain",
            ] {
                assert!(prompt.contains(&format!("\"{field}\"")), "{field} missing");
            }
        }
    }

    #[test]
    fn summary_user_prompt_includes_addresses() {
        let prompt = summary_user_prompt(&message("単価 40〜50万円"));
        assert!(prompt.contains("sales@partner.example.com"));
        assert!(prompt.contains("inbox@ses.example.co.jp"));
        assert!(prompt.contains("単価 40〜50万円"));
    }

    #[test]
    fn summary_user_prompt_truncates_body() {
        let prompt = summary_user_prompt(&message(&"あ".repeat(MAX_BODY_CHARS * 2)));
        assert_eq!(prompt.matches('あ').count(), MAX_BODY_CHARS);
    }
}
