use crate::align::{align, normalize_words};
use crate::config::Config;
use crate::generator::SentenceSource;
use crate::recorder::AudioCapture;
use crate::render;
use crate::segments::SegmentWriter;
use crate::transcribe_backend::TranscriptionService;
use crate::types::{TurnPrompt, TurnRecord};
use crate::wav_writer::UtteranceWriter;
use anyhow::{Context, Result};
use crossterm::style::Stylize;
use std::io::{BufRead, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 発音練習のセッションループ
///
/// 1ターンごとに 出題 → 録音 → 文字起こし → アライメント → 表示 を
/// 順番に実行する。外部サービスの呼び出しはすべて逐次で、途中で
/// 失敗したターンは破棄して次のターンへ進む。
///
/// 会話履歴はセッションが単独で所有し、ターン完了時のみ追記される。
pub struct Session {
    generator: Box<dyn SentenceSource>,
    transcriber: Box<dyn TranscriptionService>,
    capture: Box<dyn AudioCapture>,
    words_per_second: f64,
    min_duration_secs: f64,
    max_turns: u32,
    sample_rate: u32,
    recordings_dir: String,
    segment_dir: String,
    history: Vec<TurnRecord>,
    running: Arc<AtomicBool>,
    interactive: bool,
}

impl Session {
    /// 新しいセッションを作成
    ///
    /// 依存する外部サービスはすべて構築時に注入する。設定値も
    /// ここで受け取り、以降グローバル状態は参照しない。
    pub fn new(
        config: &Config,
        generator: Box<dyn SentenceSource>,
        transcriber: Box<dyn TranscriptionService>,
        capture: Box<dyn AudioCapture>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            generator,
            transcriber,
            capture,
            words_per_second: config.recording.words_per_second,
            min_duration_secs: config.recording.min_duration_secs,
            max_turns: config.generator.max_turns,
            sample_rate: config.audio.sample_rate,
            recordings_dir: config.output.recordings_dir.clone(),
            segment_dir: config.output.segment_dir.clone(),
            history: Vec::new(),
            running,
            interactive: std::io::stdin().is_terminal(),
        }
    }

    /// ENTER待ちの有効/無効を切り替え（テストや非対話実行用）
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    /// これまでの会話履歴
    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }

    /// セッションを実行
    ///
    /// 設定されたターン数だけ練習を繰り返す。Ctrl+Cで `running` が
    /// 落とされるとターン境界で停止する。
    pub async fn run(&mut self) -> Result<()> {
        let utterance_writer = UtteranceWriter::new(&self.recordings_dir, self.sample_rate)?;
        let segment_writer = SegmentWriter::new(&self.segment_dir, self.sample_rate);

        for turn in 0..self.max_turns {
            if !self.running.load(Ordering::SeqCst) {
                log::info!("停止要求によりセッションを終了します");
                break;
            }

            log::info!("ターン {}/{} を開始", turn + 1, self.max_turns);

            if let Err(e) = self.run_turn(&utterance_writer, &segment_writer).await {
                // リトライはしない。失敗したターンは破棄して次へ
                log::error!("ターン {} を中断: {:#}", turn + 1, e);
                println!("{}", format!("❌ エラー: {:#}", e).red());
            }
        }

        log::info!("セッション終了: {} ターン完了", self.history.len());

        Ok(())
    }

    /// 1ターン分の処理
    async fn run_turn(
        &mut self,
        utterance_writer: &UtteranceWriter,
        segment_writer: &SegmentWriter,
    ) -> Result<()> {
        let prompt = self
            .generator
            .next_turn(&self.history)
            .await
            .context("出題の取得に失敗")?;

        if let Some(line) = &prompt.context_line {
            println!("\n🤖 {}", line.as_str().cyan());
        }
        println!("\n🎯 次の文を発音してください: {}", prompt.reference.as_str().yellow());

        if self.interactive {
            self.wait_for_enter()?;
        }

        let duration = self.record_duration(&prompt);
        println!("\n🎤 {:.1}秒間 話してください...", duration);

        let samples = self
            .capture
            .record(duration)
            .context("録音に失敗")?;
        println!("✅ 録音完了");

        utterance_writer
            .write(&samples)
            .context("録音の保存に失敗")?;

        let transcript = self
            .transcriber
            .transcribe(&samples)
            .await
            .context("文字起こしに失敗")?;

        let reference_words = normalize_words(&prompt.reference);
        let spoken_words = normalize_words(&transcript.text);

        // 無音（空の文字起こし）は全単語の言い落としとして扱う
        let result = align(&reference_words, &spoken_words);

        println!("\n=== 発音チェック結果 ===");
        println!("📌 期待文: {}", prompt.reference.as_str().cyan());
        println!("🎤 発話:   {}", render::render_spoken_line(&result));
        for line in render::render_mistakes(&result) {
            println!("   {}", line);
        }
        println!("{}", render::render_summary(&result));

        if !transcript.words.is_empty() {
            segment_writer
                .write_segments(&samples, &transcript.words)
                .context("単語セグメントの書き出しに失敗")?;
            println!("✅ 単語ごとの音声を書き出しました");
        } else {
            log::debug!("単語タイムスタンプなし。セグメント書き出しをスキップ");
        }

        self.history.push(TurnRecord {
            reference: prompt.reference,
            transcript: transcript.text,
        });

        Ok(())
    }

    /// 期待文の語数から録音時間を算出
    fn record_duration(&self, prompt: &TurnPrompt) -> f64 {
        let word_count = prompt.reference.split_whitespace().count();
        let duration = word_count as f64 / self.words_per_second;
        duration.max(self.min_duration_secs)
    }

    fn wait_for_enter(&self) -> Result<()> {
        print!("ENTERキーで録音を開始...");
        std::io::stdout().flush().context("標準出力のフラッシュに失敗")?;

        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("標準入力の読み取りに失敗")?;

        Ok(())
    }
}
