use anyhow::{Context, Result};
use env_logger::Env;
use hatsuon_coach::config::{Config, TranscribeBackendType};
use hatsuon_coach::generator::{GeminiGenerator, ScriptedGenerator, SentenceSource};
use hatsuon_coach::recorder::CpalRecorder;
use hatsuon_coach::session::Session;
use hatsuon_coach::transcribe_backend::TranscriptionService;
use hatsuon_coach::whisper_api::WhisperBackend;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Voskバックエンドの構築（`vosk` フィーチャ有効時のみ利用可能）
#[cfg(feature = "vosk")]
fn build_vosk_backend(config: &Config) -> Result<Box<dyn TranscriptionService>> {
    Ok(Box::new(hatsuon_coach::vosk_backend::VoskBackend::new(
        &config.transcribe.model_path,
        config.audio.sample_rate,
    )?))
}

#[cfg(not(feature = "vosk"))]
fn build_vosk_backend(_config: &Config) -> Result<Box<dyn TranscriptionService>> {
    anyhow::bail!("voskバックエンドは `--features vosk` 付きでビルドした場合のみ利用できます")
}

#[tokio::main]
async fn main() -> Result<()> {
    // コマンドライン引数をパース
    let args: Vec<String> = std::env::args().collect();

    // デバイス一覧表示モード
    if args.len() > 1 && args[1] == "--show-interfaces" {
        env_logger::Builder::from_env(Env::default().default_filter_or("info"))
            .format_timestamp(None)
            .init();
        CpalRecorder::list_devices()?;
        return Ok(());
    }

    // 設定ファイル生成モード
    if args.len() > 1 && args[1] == "--generate-config" {
        let config_path = if args.len() > 2 {
            &args[2]
        } else {
            "config.toml"
        };
        Config::write_default(config_path)?;
        println!("設定ファイルを生成しました: {}", config_path);
        return Ok(());
    }

    // 設定ファイルのパス
    let config_path = if args.len() > 1 && !args[1].starts_with("--") {
        &args[1]
    } else {
        "config.toml"
    };

    // 設定を読み込み
    let config = Config::load_or_default(config_path)?;

    // ロガーを初期化（レベルは設定ファイルから、環境変数で上書き可能）
    env_logger::Builder::from_env(Env::default().default_filter_or(config.output.log_level.as_str()))
        .format_timestamp(None)
        .init();

    log::info!("hatsuon-coach を起動します");
    log::debug!("設定: {:?}", config);

    // Ctrl+C ハンドラを設定
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    ctrlc::set_handler(move || {
        log::info!("停止シグナルを受信しました...");
        running_clone.store(false, Ordering::SeqCst);
    })?;

    // 文字起こしバックエンドを作成
    let transcriber: Box<dyn TranscriptionService> = match config.transcribe.backend {
        TranscribeBackendType::Whisper => {
            let whisper = config
                .whisper
                .clone()
                .context("whisperバックエンドには [whisper] セクションの設定が必要です")?;
            Box::new(WhisperBackend::new(whisper, config.audio.sample_rate)?)
        }
        TranscribeBackendType::Vosk => build_vosk_backend(&config)?,
    };

    // 会話ジェネレーターを作成
    let generator: Box<dyn SentenceSource> = if config.generator.api_key.is_empty() {
        log::warn!("Gemini APIキーが未設定のため、内蔵の出題スクリプトを使用します");
        Box::new(ScriptedGenerator::default())
    } else {
        Box::new(GeminiGenerator::new(
            config.generator.api_key.clone(),
            config.generator.model.clone(),
            config.generator.user_name.clone(),
        )?)
    };

    // マイク録音を作成
    let recorder = CpalRecorder::new(&config.audio)?;

    // セッションを実行
    let mut session = Session::new(
        &config,
        generator,
        transcriber,
        Box::new(recorder),
        running,
    );
    session.run().await?;

    log::info!("hatsuon-coach を終了しました");

    Ok(())
}
