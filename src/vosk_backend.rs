use crate::transcribe_backend::TranscriptionService;
use crate::types::{SampleI16, TranscriptWords, WordTiming};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use vosk::{Model, Recognizer};

/// Vosk ローカルモデルによる文字起こしバックエンド
///
/// ネットワーク接続なしで動作する。モデルは
/// <https://alphacephei.com/vosk/models> から取得してモデルパスに
/// 展開しておく。
pub struct VoskBackend {
    model: Model,
    sample_rate: u32,
}

impl VoskBackend {
    pub fn new<P: AsRef<Path>>(model_path: P, sample_rate: u32) -> Result<Self> {
        let path = model_path.as_ref();
        if !path.exists() {
            anyhow::bail!(
                "Voskモデルが見つかりません: {:?} (https://alphacephei.com/vosk/models からダウンロード)",
                path
            );
        }

        let model = Model::new(path.to_string_lossy().as_ref())
            .with_context(|| format!("Voskモデルの読み込みに失敗: {:?}", path))?;

        log::info!("Voskモデルを読み込みました: {:?}", path);

        Ok(Self { model, sample_rate })
    }
}

#[async_trait]
impl TranscriptionService for VoskBackend {
    async fn transcribe(&self, samples: &[SampleI16]) -> Result<TranscriptWords> {
        let mut recognizer = Recognizer::new(&self.model, self.sample_rate as f32)
            .context("Vosk認識器の作成に失敗")?;
        recognizer.set_words(true);

        recognizer
            .accept_waveform(samples)
            .map_err(|e| anyhow::anyhow!("Vosk波形処理に失敗: {:?}", e))?;

        let result = recognizer
            .final_result()
            .single()
            .context("Vosk結果の取得に失敗")?;

        let words = result
            .result
            .iter()
            .map(|w| WordTiming {
                word: w.word.to_string(),
                start_secs: w.start as f64,
                end_secs: w.end as f64,
            })
            .collect();

        Ok(TranscriptWords {
            text: result.text.to_string(),
            words,
        })
    }
}
