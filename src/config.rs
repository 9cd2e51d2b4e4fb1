use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub transcribe: TranscribeConfig,
    pub whisper: Option<WhisperConfig>,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// オーディオ入力設定
///
/// マイクデバイスからの入力に関する設定。
///
/// # デフォルト値
///
/// - `device_id`: "default" (システムのデフォルトデバイス)
/// - `sample_rate`: 16000 Hz (音声認識エンジンの推奨値)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioConfig {
    #[serde(default = "default_device_id")]
    pub device_id: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

/// 録音時間の設定
///
/// 期待文の語数から録音時間を算出するための設定。
/// 録音時間は `max(語数 / words_per_second, min_duration_secs)` 秒。
///
/// # デフォルト値
///
/// - `words_per_second`: 2.0 語/秒
/// - `min_duration_secs`: 3.0 秒
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecordingConfig {
    #[serde(default = "default_words_per_second")]
    pub words_per_second: f64,
    #[serde(default = "default_min_duration_secs")]
    pub min_duration_secs: f64,
}

/// 文字起こしバックエンドの種類
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TranscribeBackendType {
    /// OpenAI Whisper API
    Whisper,
    /// Vosk ローカルモデル（`vosk` フィーチャが必要）
    Vosk,
}

/// 文字起こし設定
///
/// # デフォルト値
///
/// - `backend`: "whisper" (OpenAI Whisper API)
/// - `model_path`: "model" (Vosk バックエンド使用時のモデルディレクトリ)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscribeConfig {
    #[serde(default = "default_backend")]
    pub backend: TranscribeBackendType,
    #[serde(default = "default_model_path")]
    pub model_path: String,
}

/// OpenAI Whisper API 設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WhisperConfig {
    /// OpenAI API Key
    pub api_key: String,
    /// Whisper モデル名（通常 "whisper-1"）
    #[serde(default = "default_whisper_model")]
    pub model: String,
    /// 言語コード（"en" など）。省略可能
    pub language: Option<String>,
}

/// 会話ジェネレーター設定
///
/// 出題文を生成するLLM APIに関する設定。
///
/// # デフォルト値
///
/// - `model`: "gemini-2.0-flash"
/// - `user_name`: "you"
/// - `max_turns`: 5 ターン
///
/// `api_key` が空の場合はAPIを呼ばず、内蔵のスクリプト出題に
/// フォールバックする。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_generator_model")]
    pub model: String,
    #[serde(default = "default_user_name")]
    pub user_name: String,
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
}

/// 出力設定
///
/// WAVファイル出力とログに関する設定。
///
/// # デフォルト値
///
/// - `recordings_dir`: "./recordings"
/// - `segment_dir`: "./split_audio"
/// - `log_level`: "info"
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_recordings_dir")]
    pub recordings_dir: String,
    #[serde(default = "default_segment_dir")]
    pub segment_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default functions
fn default_device_id() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_words_per_second() -> f64 {
    2.0
}

fn default_min_duration_secs() -> f64 {
    3.0
}

fn default_backend() -> TranscribeBackendType {
    TranscribeBackendType::Whisper
}

fn default_model_path() -> String {
    "model".to_string()
}

fn default_whisper_model() -> String {
    "whisper-1".to_string()
}

fn default_generator_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_user_name() -> String {
    "you".to_string()
}

fn default_max_turns() -> u32 {
    5
}

fn default_recordings_dir() -> String {
    "./recordings".to_string()
}

fn default_segment_dir() -> String {
    "./split_audio".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            recording: RecordingConfig::default(),
            transcribe: TranscribeConfig::default(),
            whisper: None, // デフォルトではWhisper設定なし
            generator: GeneratorConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device_id: default_device_id(),
            sample_rate: default_sample_rate(),
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            words_per_second: default_words_per_second(),
            min_duration_secs: default_min_duration_secs(),
        }
    }
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            model_path: default_model_path(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_generator_model(),
            user_name: default_user_name(),
            max_turns: default_max_turns(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            recordings_dir: default_recordings_dir(),
            segment_dir: default_segment_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// 設定ファイルから読み込み
    ///
    /// TOML形式の設定ファイルをパースしてConfig構造体を生成する。
    ///
    /// # Arguments
    ///
    /// * `path` - 設定ファイルのパス
    ///
    /// # Errors
    ///
    /// ファイルの読み込みまたはパースに失敗した場合にエラーを返す。
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use hatsuon_coach::config::Config;
    /// let config = Config::from_file("config.toml").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("設定ファイルの読み込みに失敗: {:?}", path.as_ref()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "設定ファイルのパースに失敗")?;
        Ok(config)
    }

    /// デフォルト設定をファイルに書き出し
    ///
    /// デフォルト値を持つ設定ファイルを生成する。
    /// 既存のファイルは上書きされる。
    ///
    /// # Arguments
    ///
    /// * `path` - 出力先のパス
    ///
    /// # Errors
    ///
    /// ファイルの書き込みに失敗した場合にエラーを返す。
    pub fn write_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Config::default();
        let content =
            toml::to_string_pretty(&config).with_context(|| "設定のシリアライズに失敗")?;
        fs::write(path.as_ref(), content)
            .with_context(|| format!("設定ファイルの書き込みに失敗: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// 設定ファイルがあれば読み込み、なければデフォルトを使用
    ///
    /// # Errors
    ///
    /// ファイルが存在するがパースに失敗した場合にエラーを返す。
    /// ファイルが存在しない場合はエラーにならず、デフォルト設定を返す。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            log::warn!(
                "設定ファイルが見つかりません。デフォルト設定を使用します: {:?}",
                path.as_ref()
            );
            Ok(Config::default())
        }
    }
}
