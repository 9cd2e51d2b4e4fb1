//! hatsuon-coach - AI会話による英語発音練習CLI
//!
//! このクレートは、LLMが生成する会話文を利用者に発音させ、
//! 音声認識の結果と期待文を単語単位でアライメントして
//! 発音の誤りをハイライトするツールを提供します。
//!
//! # 主な機能
//!
//! - **会話生成**: Gemini APIでデイリースタンドアップ形式の出題を1ターンずつ生成
//! - **録音**: 期待文の語数から録音時間を自動算出してマイク録音
//! - **文字起こし**: OpenAI Whisper API（またはVoskローカルモデル）
//! - **発音評価**: 単語単位のLevenshteinアライメントで Match / Substitution / Omission / Insertion を判定
//! - **単語セグメント出力**: 単語タイムスタンプで発話を分割してWAV保存
//!
//! # アーキテクチャ
//!
//! ```text
//! [SentenceSource] ──出題──→ [Session] ──録音──→ [AudioCapture]
//!                                │                     │
//!                                │              [UtteranceWriter]
//!                                ↓
//!                      [TranscriptionService]
//!                                │
//!                                ↓
//!                   [align] → [render] → 端末表示
//!                                │
//!                         [SegmentWriter]
//! ```
//!
//! # 使用例
//!
//! ```no_run
//! use hatsuon_coach::config::Config;
//!
//! // 設定ファイルを読み込み
//! let config = Config::load_or_default("config.toml").unwrap();
//!
//! // またはデフォルト設定を生成
//! Config::write_default("config.toml").unwrap();
//! ```

pub mod align;
pub mod config;
pub mod generator;
pub mod recorder;
pub mod render;
pub mod segments;
pub mod session;
pub mod transcribe_backend;
pub mod types;
#[cfg(feature = "vosk")]
pub mod vosk_backend;
pub mod wav_writer;
pub mod whisper_api;
