use crate::types::{SampleI16, TranscriptWords};
use anyhow::Result;
use async_trait::async_trait;

/// 文字起こしバックエンドの共通トレイト
///
/// 波形 → テキストの能力だけを公開する。セッションループと
/// アライメントエンジンを特定のエンジン実装から切り離すための境界。
#[async_trait]
pub trait TranscriptionService: Send {
    /// 1発話分のPCMサンプルを文字起こしする
    ///
    /// # Returns
    /// テキストと（エンジンが対応していれば）単語タイムスタンプ。
    /// 無音の場合はテキストが空文字列になる。
    async fn transcribe(&self, samples: &[SampleI16]) -> Result<TranscriptWords>;
}
