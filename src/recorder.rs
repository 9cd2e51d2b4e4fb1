use crate::config::AudioConfig;
use crate::types::SampleI16;
use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SizedSample};
use regex_lite::Regex;
use std::sync::mpsc;
use std::time::Duration;

/// 音声キャプチャの抽象
///
/// セッションループはこのトレイト越しに録音する。テストでは
/// スタブ実装に差し替えられる。
pub trait AudioCapture: Send {
    /// 指定した長さだけマイクから録音し、モノラルのPCMサンプルを返す
    fn record(&mut self, duration_secs: f64) -> Result<Vec<SampleI16>>;
}

/// cpal によるマイク録音
///
/// 指定時間だけ入力ストリームを開き、デバイスのフォーマットに
/// かかわらず 16bit モノラルに変換して返す。
pub struct CpalRecorder {
    device: cpal::Device,
    sample_rate: u32,
}

impl CpalRecorder {
    /// 新しいCpalRecorderを作成
    pub fn new(config: &AudioConfig) -> Result<Self> {
        let host = cpal::default_host();

        // デバイスを取得
        let device = if config.device_id == "default" {
            host.default_input_device()
                .context("デフォルト入力デバイスが見つかりません")?
        } else {
            // デバイスIDが指定されている場合は、デバイス一覧から検索
            Self::input_devices()?
                .into_iter()
                .find(|d| d.name().ok().as_deref() == Some(&config.device_id))
                .with_context(|| format!("デバイスが見つかりません: {}", config.device_id))?
        };

        log::info!("入力デバイス: {:?}", device.name());

        Ok(Self {
            device,
            sample_rate: config.sample_rate,
        })
    }

    /// ストリームを構築してサンプルを送出
    fn build_stream<T>(
        &self,
        stream_config: &cpal::StreamConfig,
        tx: mpsc::Sender<Vec<SampleI16>>,
    ) -> Result<cpal::Stream>
    where
        T: SizedSample + Sample + Send + 'static,
        <T as Sample>::Float: Into<f32>,
    {
        let num_channels = stream_config.channels as usize;

        let data_callback = move |data: &[T], _info: &cpal::InputCallbackInfo| {
            // インターリーブされたフレームの先頭チャンネルのみ使用（モノラル化）
            let mut mono = Vec::with_capacity(data.len() / num_channels);
            for frame in data.chunks(num_channels) {
                let f: f32 = frame[0].to_float_sample().into();
                let clamped = f.clamp(-1.0, 1.0);
                mono.push((clamped * i16::MAX as f32) as i16);
            }

            // 録音終了後は受信側がドロップされるので送信エラーは無視
            let _ = tx.send(mono);
        };

        let error_callback = move |err| {
            log::error!("ストリームエラー: {}", err);
        };

        let stream = self
            .device
            .build_input_stream(stream_config, data_callback, error_callback, None)
            .context("入力ストリームの構築に失敗")?;

        Ok(stream)
    }

    /// デバイス一覧を表示
    pub fn list_devices() -> Result<()> {
        println!("利用可能な入力デバイス:");
        println!();

        for (idx, device) in Self::input_devices()?.into_iter().enumerate() {
            let name = device.name()?;
            println!("  [{}] {}", idx, name);

            device.supported_input_configs()?.for_each(|config_range| {
                println!(
                    "      フォーマット: {:?}, {}-{}Hz, {}ch",
                    config_range.sample_format(),
                    config_range.min_sample_rate().0,
                    config_range.max_sample_rate().0,
                    config_range.channels()
                );
            });
            println!();
        }

        Ok(())
    }

    /// MacBook Air 本体・WebCam など、通常入力デバイスとして利用してはいけないデバイスを除外したデバイス一覧を取得
    fn input_devices() -> Result<Vec<cpal::Device>> {
        let host = cpal::default_host();
        let devices = host
            .input_devices()?
            .filter(|device| {
                if let Ok(name) = device.name() {
                    // 除外するデバイス名のリスト
                    let excluded_names_regex = Regex::new("MacBook (Air|Pro)|AirPods|iPhone|Webcam|Background|Microsoft Teams|ZoomAudioDevice").unwrap();
                    !excluded_names_regex.is_match(&name)
                } else {
                    true
                }
            })
            .collect();
        Ok(devices)
    }
}

impl AudioCapture for CpalRecorder {
    fn record(&mut self, duration_secs: f64) -> Result<Vec<SampleI16>> {
        let target_samples = (duration_secs * self.sample_rate as f64) as usize;

        // デバイスのデフォルトフォーマットを取得
        let default_config = self
            .device
            .default_input_config()
            .context("デフォルト入力設定が取得できません")?;

        let stream_config = cpal::StreamConfig {
            channels: default_config.channels(),
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let (tx, rx) = mpsc::channel::<Vec<SampleI16>>();

        let stream = match default_config.sample_format() {
            cpal::SampleFormat::F32 => self.build_stream::<f32>(&stream_config, tx)?,
            cpal::SampleFormat::I16 => self.build_stream::<i16>(&stream_config, tx)?,
            cpal::SampleFormat::U16 => self.build_stream::<u16>(&stream_config, tx)?,
            cpal::SampleFormat::I32 => self.build_stream::<i32>(&stream_config, tx)?,
            _ => anyhow::bail!("サポートされていないサンプルフォーマット"),
        };

        stream.play().context("ストリームの再生開始に失敗")?;
        log::info!("録音開始: {:.1}秒", duration_secs);

        let mut samples: Vec<SampleI16> = Vec::with_capacity(target_samples);
        while samples.len() < target_samples {
            match rx.recv_timeout(Duration::from_secs(2)) {
                Ok(chunk) => samples.extend_from_slice(&chunk),
                Err(_) => anyhow::bail!("録音中に音声データが届きませんでした"),
            }
        }

        drop(stream);
        samples.truncate(target_samples);

        log::info!("録音完了: {}サンプル", samples.len());

        Ok(samples)
    }
}
