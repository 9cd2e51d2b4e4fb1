use crate::types::{TurnPrompt, TurnRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// 会話ジェネレーターの共通トレイト
///
/// これまでの履歴を渡すと、次に利用者が発音すべき英文を1件返す。
#[async_trait]
pub trait SentenceSource: Send {
    /// 次のターンの出題を取得
    ///
    /// # Arguments
    /// * `history` - これまでの（期待文, 認識結果）ペアの列
    async fn next_turn(&self, history: &[TurnRecord]) -> Result<TurnPrompt>;
}

// Gemini generateContent リクエスト/レスポンス

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

/// モデルに要求するJSONの形
#[derive(Debug, Deserialize)]
struct GeneratedTurn {
    ai: String,
    user: String,
}

/// Gemini API による会話生成
///
/// デイリースタンドアップの場面を模した会話を1ターンずつ生成する。
/// APIキーとモデル名は構築時に受け取り、グローバル状態には依存しない。
pub struct GeminiGenerator {
    api_key: String,
    model: String,
    user_name: String,
    client: reqwest::Client,
}

impl GeminiGenerator {
    pub fn new(api_key: String, model: String, user_name: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Gemini HTTPクライアント作成失敗")?;

        Ok(Self {
            api_key,
            model,
            user_name,
            client,
        })
    }

    /// 履歴を埋め込んだプロンプトを構築
    fn build_prompt(&self, history: &[TurnRecord]) -> String {
        let mut prompt = format!(
            "You are simulating a daily standup meeting for a software engineering team with only:\n\
             - Scrum Master (AI, facilitates the meeting).\n\
             - {} (User, Software Engineer).\n\
             \n\
             The user is practicing English pronunciation. Produce the NEXT exchange only:\n\
             one short line for the Scrum Master, and one short, natural reply the user\n\
             should say out loud (at most 15 words).\n",
            self.user_name
        );

        if !history.is_empty() {
            prompt.push_str("\nConversation so far (the user's reply as recognized by speech-to-text):\n");
            for record in history {
                prompt.push_str(&format!(
                    "- expected: \"{}\" / recognized: \"{}\"\n",
                    record.reference, record.transcript
                ));
            }
        }

        prompt.push_str(
            "\nEnsure that:\n\
             - The updates are realistic and varied in each run.\n\
             - The tone is conversational and natural.\n\
             - The response is formatted strictly as one JSON object with exactly\n\
               the keys \"ai\" and \"user\".\n\
             - Return ONLY the JSON object without additional text or formatting.\n",
        );

        prompt
    }

    /// モデルの返答テキストを出題にパース
    fn parse_reply(text: &str) -> Result<TurnPrompt> {
        // コードフェンス付きで返ってくることがあるので剥がす
        let trimmed = text
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();

        let turn: GeneratedTurn =
            serde_json::from_str(trimmed).context("Geminiレスポンスのパースに失敗")?;

        if turn.user.trim().is_empty() {
            anyhow::bail!("Geminiが空の出題を返しました");
        }

        Ok(TurnPrompt {
            context_line: Some(turn.ai),
            reference: turn.user,
        })
    }
}

#[async_trait]
impl SentenceSource for GeminiGenerator {
    async fn next_turn(&self, history: &[TurnRecord]) -> Result<TurnPrompt> {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: self.build_prompt(history),
                }],
            }],
            generation_config: Some(GenerationConfig { temperature: 0.9 }),
        };

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Gemini API リクエスト失敗")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API エラー: {} - {}", status, error_text);
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .context("Gemini API レスポンスパース失敗")?;

        if let Some(feedback) = gemini_response.prompt_feedback {
            if let Some(block_reason) = feedback.block_reason {
                anyhow::bail!("Gemini APIがリクエストをブロック: {}", block_reason);
            }
        }

        let text = gemini_response
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .context("Geminiレスポンスに候補がありません")?;

        Self::parse_reply(&text)
    }
}

/// 内蔵スクリプトによる出題
///
/// APIキーが設定されていない場合とテストで使用するフォールバック。
/// 固定の出題リストを順に繰り返す。
pub struct ScriptedGenerator {
    turns: Vec<TurnPrompt>,
    cursor: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(turns: Vec<TurnPrompt>) -> Self {
        Self {
            turns,
            cursor: AtomicUsize::new(0),
        }
    }
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self::new(vec![
            TurnPrompt {
                context_line: Some("Hello! How are you today?".to_string()),
                reference: "I'm good, thank you!".to_string(),
            },
            TurnPrompt {
                context_line: Some("What did you work on yesterday?".to_string()),
                reference: "I fixed the login bug yesterday.".to_string(),
            },
            TurnPrompt {
                context_line: Some("What are you working on today?".to_string()),
                reference: "Today I am writing tests for the payment service.".to_string(),
            },
            TurnPrompt {
                context_line: Some("Any blockers?".to_string()),
                reference: "No blockers at the moment.".to_string(),
            },
        ])
    }
}

#[async_trait]
impl SentenceSource for ScriptedGenerator {
    async fn next_turn(&self, _history: &[TurnRecord]) -> Result<TurnPrompt> {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst) % self.turns.len();
        Ok(self.turns[index].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reply_plain_json() {
        let prompt = GeminiGenerator::parse_reply(
            r#"{"ai": "Any blockers?", "user": "No blockers today."}"#,
        )
        .unwrap();
        assert_eq!(prompt.context_line.as_deref(), Some("Any blockers?"));
        assert_eq!(prompt.reference, "No blockers today.");
    }

    #[test]
    fn test_parse_reply_fenced_json() {
        let text = "```json\n{\"ai\": \"Good morning!\", \"user\": \"Good morning, team.\"}\n```";
        let prompt = GeminiGenerator::parse_reply(text).unwrap();
        assert_eq!(prompt.reference, "Good morning, team.");
    }

    #[test]
    fn test_parse_reply_rejects_garbage() {
        assert!(GeminiGenerator::parse_reply("not json at all").is_err());
        assert!(GeminiGenerator::parse_reply(r#"{"ai": "hi", "user": "  "}"#).is_err());
    }

    #[test]
    fn test_build_prompt_includes_history() {
        let generator = GeminiGenerator::new(
            "key".to_string(),
            "gemini-2.0-flash".to_string(),
            "Taro".to_string(),
        )
        .unwrap();

        let history = vec![TurnRecord {
            reference: "I'm good, thank you!".to_string(),
            transcript: "i am good thank you".to_string(),
        }];

        let prompt = generator.build_prompt(&history);
        assert!(prompt.contains("Taro"));
        assert!(prompt.contains("I'm good, thank you!"));
        assert!(prompt.contains("i am good thank you"));
    }

    #[tokio::test]
    async fn test_scripted_generator_cycles() {
        let generator = ScriptedGenerator::new(vec![
            TurnPrompt {
                context_line: None,
                reference: "one".to_string(),
            },
            TurnPrompt {
                context_line: None,
                reference: "two".to_string(),
            },
        ]);

        assert_eq!(generator.next_turn(&[]).await.unwrap().reference, "one");
        assert_eq!(generator.next_turn(&[]).await.unwrap().reference, "two");
        assert_eq!(generator.next_turn(&[]).await.unwrap().reference, "one");
    }
}
