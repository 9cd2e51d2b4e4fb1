use crate::types::{SampleI16, WordTiming};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// 単語ごとの音声切り出し
///
/// 文字起こしエンジンの単語タイムスタンプに従って発話を分割し、
/// `word_{n}_{単語}.wav` として保存する。オフラインで聞き直して
/// 発音を確認する用途。
pub struct SegmentWriter {
    output_dir: PathBuf,
    sample_rate: u32,
}

impl SegmentWriter {
    pub fn new<P: AsRef<Path>>(output_dir: P, sample_rate: u32) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            sample_rate,
        }
    }

    /// 発話を単語ごとのWAVファイルに分割
    ///
    /// 出力ディレクトリは毎回クリアされる。前のターンのセグメントは
    /// 残さない。
    ///
    /// # Arguments
    /// * `samples` - 発話全体のPCMサンプル
    /// * `words` - 単語ごとのタイムスタンプ
    ///
    /// # Returns
    /// 書き出したファイルのパス一覧
    pub fn write_segments(
        &self,
        samples: &[SampleI16],
        words: &[WordTiming],
    ) -> Result<Vec<PathBuf>> {
        if self.output_dir.exists() {
            fs::remove_dir_all(&self.output_dir)
                .with_context(|| format!("セグメントディレクトリの削除に失敗: {:?}", self.output_dir))?;
        }
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("セグメントディレクトリの作成に失敗: {:?}", self.output_dir))?;

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut paths = Vec::with_capacity(words.len());

        for (i, word) in words.iter().enumerate() {
            let start = self.sample_index(word.start_secs).min(samples.len());
            let end = self.sample_index(word.end_secs).min(samples.len());
            if start >= end {
                log::warn!("空のセグメントをスキップ: {:?}", word);
                continue;
            }

            let filename = format!("word_{}_{}.wav", i + 1, sanitize_word(&word.word));
            let filepath = self.output_dir.join(&filename);

            let mut writer = hound::WavWriter::create(&filepath, spec)
                .with_context(|| format!("セグメントファイルの作成に失敗: {:?}", filepath))?;
            for &sample in &samples[start..end] {
                writer
                    .write_sample(sample)
                    .with_context(|| "セグメントへのサンプル書き込みに失敗")?;
            }
            writer
                .finalize()
                .with_context(|| "セグメントのファイナライズに失敗")?;

            paths.push(filepath);
        }

        log::info!(
            "単語セグメントを書き出しました: {} 件 → {:?}",
            paths.len(),
            self.output_dir
        );

        Ok(paths)
    }

    fn sample_index(&self, secs: f64) -> usize {
        (secs * self.sample_rate as f64) as usize
    }
}

/// ファイル名に使えない文字を除去
fn sanitize_word(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric() || *c == '\'')
        .collect()
}
