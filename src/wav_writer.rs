use crate::types::SampleI16;
use anyhow::{Context, Result};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// 録音した発話のWAVファイル書き出し
///
/// 1回の発話をタイムスタンプ付きのファイル名で保存する
pub struct UtteranceWriter {
    output_dir: PathBuf,
    spec: hound::WavSpec,
}

impl UtteranceWriter {
    pub fn new<P: AsRef<Path>>(output_dir: P, sample_rate: u32) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();

        // 出力ディレクトリが存在しない場合は作成
        if !output_dir.exists() {
            fs::create_dir_all(&output_dir)
                .with_context(|| format!("出力ディレクトリの作成に失敗: {:?}", output_dir))?;
        }

        let spec = hound::WavSpec {
            channels: 1, // モノラル
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        Ok(Self { output_dir, spec })
    }

    /// 発話をWAVファイルとして書き込み、パスを返す
    pub fn write(&self, samples: &[SampleI16]) -> Result<PathBuf> {
        // ミリ秒まで含めて同一秒内の上書きを防ぐ
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S%3f");
        let filename = format!("utterance_{}.wav", timestamp);
        let filepath = self.output_dir.join(&filename);

        log::info!("WAVファイル作成: {:?}", filepath);

        let mut writer = hound::WavWriter::create(&filepath, self.spec)
            .with_context(|| format!("WAVファイルの作成に失敗: {:?}", filepath))?;

        for &sample in samples {
            writer
                .write_sample(sample)
                .with_context(|| "WAVファイルへのサンプル書き込みに失敗")?;
        }

        writer
            .finalize()
            .with_context(|| "WAVファイルのファイナライズに失敗")?;

        log::debug!(
            "WAVファイル書き込み完了: {}サンプル ({:.2}秒)",
            samples.len(),
            samples.len() as f64 / self.spec.sample_rate as f64
        );

        Ok(filepath)
    }
}

/// PCMデータをメモリ上のWAVフォーマットに変換
///
/// 文字起こしAPIへのアップロード用。ファイルを経由しない。
pub fn pcm_to_wav_bytes(samples: &[SampleI16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).context("WAVライター作成失敗")?;

        for &sample in samples {
            writer.write_sample(sample).context("WAV書き込み失敗")?;
        }

        writer.finalize().context("WAV finalize失敗")?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_utterance_writer_basic() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let writer = UtteranceWriter::new(temp_dir.path(), 16000)?;

        // サンプルデータを生成
        let samples: Vec<i16> = (0..16000)
            .map(|i| ((i as f32 * 0.1).sin() * 10000.0) as i16)
            .collect();

        let path = writer.write(&samples)?;
        assert!(path.exists());

        // ファイルが作成されたことを確認
        let files: Vec<_> = fs::read_dir(temp_dir.path())?
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(files.len(), 1);

        // 読み戻して内容を確認
        let mut reader = hound::WavReader::open(&path)?;
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.samples::<i16>().count(), 16000);

        Ok(())
    }

    #[test]
    fn test_pcm_to_wav_bytes() -> Result<()> {
        let samples: Vec<i16> = vec![0, 100, -100, 32000];
        let wav = pcm_to_wav_bytes(&samples, 16000)?;

        // RIFFヘッダーの確認
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");

        let mut reader = hound::WavReader::new(Cursor::new(wav))?;
        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read, samples);

        Ok(())
    }
}
