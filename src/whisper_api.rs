use crate::config::WhisperConfig;
use crate::transcribe_backend::TranscriptionService;
use crate::types::{SampleI16, TranscriptWords, WordTiming};
use crate::wav_writer::pcm_to_wav_bytes;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;

/// OpenAI Whisper API レスポンス（verbose_json形式）
#[derive(Debug, Deserialize)]
struct WhisperVerboseResponse {
    text: String,
    #[serde(default)]
    words: Vec<WhisperWord>,
}

#[derive(Debug, Deserialize)]
struct WhisperWord {
    word: String,
    start: f64,
    end: f64,
}

/// OpenAI Whisper API バックエンド
///
/// 発話をWAVに変換してマルチパートでアップロードし、verbose_json
/// 形式で単語タイムスタンプ付きの結果を受け取る。
pub struct WhisperBackend {
    config: WhisperConfig,
    sample_rate: u32,
    client: reqwest::Client,
}

impl WhisperBackend {
    pub fn new(config: WhisperConfig, sample_rate: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Whisper API HTTPクライアント作成失敗")?;

        Ok(Self {
            config,
            sample_rate,
            client,
        })
    }

    /// Whisper APIを呼び出して文字起こし
    async fn transcribe_wav(&self, wav_data: Vec<u8>) -> Result<WhisperVerboseResponse> {
        let part = multipart::Part::bytes(wav_data)
            .file_name("audio.wav")
            .mime_str("audio/wav")?;

        let mut form = multipart::Form::new()
            .part("file", part)
            .text("model", self.config.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "word");

        if let Some(ref language) = self.config.language {
            form = form.text("language", language.clone());
        }

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .multipart(form)
            .send()
            .await
            .context("Whisper API リクエスト失敗")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Whisper API エラー: {} - {}", status, error_text);
        }

        let whisper_response: WhisperVerboseResponse = response
            .json::<WhisperVerboseResponse>()
            .await
            .context("Whisper API レスポンスパース失敗")?;

        Ok(whisper_response)
    }
}

#[async_trait]
impl TranscriptionService for WhisperBackend {
    async fn transcribe(&self, samples: &[SampleI16]) -> Result<TranscriptWords> {
        let wav_data = pcm_to_wav_bytes(samples, self.sample_rate)?;
        log::debug!("Whisper API: WAVデータサイズ {} バイト", wav_data.len());

        let response = self.transcribe_wav(wav_data).await?;
        log::debug!("Whisper API: 文字起こし結果 - {}", response.text);

        let words = response
            .words
            .into_iter()
            .map(|w| WordTiming {
                word: w.word,
                start_secs: w.start,
                end_secs: w.end,
            })
            .collect();

        Ok(TranscriptWords {
            text: response.text.trim().to_string(),
            words,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_response_parsing() {
        let json = r#"{
            "task": "transcribe",
            "language": "english",
            "duration": 1.5,
            "text": "Hello world.",
            "words": [
                {"word": "Hello", "start": 0.0, "end": 0.6},
                {"word": "world", "start": 0.6, "end": 1.1}
            ]
        }"#;

        let parsed: WhisperVerboseResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.text, "Hello world.");
        assert_eq!(parsed.words.len(), 2);
        assert_eq!(parsed.words[0].word, "Hello");
        assert_eq!(parsed.words[1].start, 0.6);
    }

    #[test]
    fn test_verbose_response_without_words() {
        // timestamp_granularities 非対応のレスポンスでも壊れない
        let json = r#"{"text": ""}"#;
        let parsed: WhisperVerboseResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.text, "");
        assert!(parsed.words.is_empty());
    }
}
