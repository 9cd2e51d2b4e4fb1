use serde::{Deserialize, Serialize};

/// 16ビット整数型のオーディオサンプル
///
/// PCM形式の音声データを表現するための型エイリアス。
/// -32768 から 32767 の範囲の値を取る。
pub type SampleI16 = i16;

/// 単語ごとの判定結果
///
/// 期待文と発話の単語アライメントにおける1単語分の判定。
///
/// # Examples
///
/// ```
/// # use hatsuon_coach::types::Verdict;
/// let verdict = Verdict::Substitution; // 言い間違い
/// ```
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// 正しく発音できた
    Match,

    /// 期待した単語とは別の単語が認識された
    Substitution,

    /// 期待した単語が発話されなかった
    Omission,

    /// 期待文に存在しない単語が発話された
    Insertion,
}

/// アライメント上の1位置に対応する判定
///
/// `reference` と `spoken` の少なくとも一方は必ず埋まっている。
/// Omission では `spoken` が、Insertion では `reference` が None になる。
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct WordVerdict {
    /// 期待文側の単語（Insertion の場合は None）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// 発話側の単語（Omission の場合は None）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spoken: Option<String>,

    /// 判定の種別
    pub verdict: Verdict,
}

impl WordVerdict {
    pub fn matched(word: impl Into<String>) -> Self {
        let word = word.into();
        Self {
            reference: Some(word.clone()),
            spoken: Some(word),
            verdict: Verdict::Match,
        }
    }

    pub fn substituted(reference: impl Into<String>, spoken: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            spoken: Some(spoken.into()),
            verdict: Verdict::Substitution,
        }
    }

    pub fn omitted(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            spoken: None,
            verdict: Verdict::Omission,
        }
    }

    pub fn inserted(spoken: impl Into<String>) -> Self {
        Self {
            reference: None,
            spoken: Some(spoken.into()),
            verdict: Verdict::Insertion,
        }
    }
}

/// 発音評価の結果
///
/// 期待文と発話の単語アライメント結果。左から右の順に並んだ
/// [`WordVerdict`] の列を保持する。
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct AlignmentResult {
    verdicts: Vec<WordVerdict>,
}

impl AlignmentResult {
    pub fn new(verdicts: Vec<WordVerdict>) -> Self {
        Self { verdicts }
    }

    pub fn verdicts(&self) -> &[WordVerdict] {
        &self.verdicts
    }

    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }

    /// Match 以外の判定の数
    pub fn mistake_count(&self) -> usize {
        self.verdicts
            .iter()
            .filter(|v| v.verdict != Verdict::Match)
            .count()
    }

    /// すべての単語が Match かどうか
    pub fn is_perfect(&self) -> bool {
        self.mistake_count() == 0
    }

    /// Insertion を除いた reference 側の単語列を復元
    pub fn reconstruct_reference(&self) -> Vec<String> {
        self.verdicts
            .iter()
            .filter(|v| v.verdict != Verdict::Insertion)
            .filter_map(|v| v.reference.clone())
            .collect()
    }

    /// Omission を除いた spoken 側の単語列を復元
    pub fn reconstruct_spoken(&self) -> Vec<String> {
        self.verdicts
            .iter()
            .filter(|v| v.verdict != Verdict::Omission)
            .filter_map(|v| v.spoken.clone())
            .collect()
    }
}

impl<'a> IntoIterator for &'a AlignmentResult {
    type Item = &'a WordVerdict;
    type IntoIter = std::slice::Iter<'a, WordVerdict>;

    fn into_iter(self) -> Self::IntoIter {
        self.verdicts.iter()
    }
}

/// 単語単位のタイムスタンプ
///
/// 文字起こしエンジンが返す、発話内での単語の開始/終了時刻。
/// 単語ごとの音声切り出しに使用する。
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct WordTiming {
    /// 認識された単語
    pub word: String,

    /// 発話先頭からの開始時刻（秒）
    pub start_secs: f64,

    /// 発話先頭からの終了時刻（秒）
    pub end_secs: f64,
}

/// 文字起こし結果
///
/// テキスト全体と、利用可能であれば単語ごとのタイムスタンプを保持する。
/// 無音の場合 `text` は空文字列になる。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TranscriptWords {
    /// 文字起こしテキスト
    pub text: String,

    /// 単語ごとのタイムスタンプ（エンジンが対応していない場合は空）
    pub words: Vec<WordTiming>,
}

/// 1ターン分の出題
///
/// 会話ジェネレーターが返す、AIの発言と利用者が発音すべき英文のペア。
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TurnPrompt {
    /// AI側の発言（会話の文脈。表示のみに使う）
    pub context_line: Option<String>,

    /// 利用者が発音すべき期待文
    pub reference: String,
}

/// 1ターン分の履歴
///
/// セッションループが追記していく会話履歴の1エントリ。
/// 次ターンの会話生成の入力になる。
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TurnRecord {
    /// 出題された期待文
    pub reference: String,

    /// 実際に認識された発話テキスト
    pub transcript: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_serialization() {
        let json = serde_json::to_string(&Verdict::Omission).unwrap();
        assert_eq!(json, r#""omission""#);

        let deserialized: Verdict = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, Verdict::Omission);
    }

    #[test]
    fn test_word_verdict_constructors() {
        let m = WordVerdict::matched("hello");
        assert_eq!(m.reference.as_deref(), Some("hello"));
        assert_eq!(m.spoken.as_deref(), Some("hello"));
        assert_eq!(m.verdict, Verdict::Match);

        let o = WordVerdict::omitted("world");
        assert_eq!(o.reference.as_deref(), Some("world"));
        assert!(o.spoken.is_none());

        let i = WordVerdict::inserted("uh");
        assert!(i.reference.is_none());
        assert_eq!(i.spoken.as_deref(), Some("uh"));
    }

    #[test]
    fn test_alignment_result_counts() {
        let result = AlignmentResult::new(vec![
            WordVerdict::matched("good"),
            WordVerdict::substituted("morning", "mourning"),
            WordVerdict::omitted("team"),
        ]);
        assert_eq!(result.len(), 3);
        assert_eq!(result.mistake_count(), 2);
        assert!(!result.is_perfect());
    }

    #[test]
    fn test_alignment_result_reconstruction() {
        let result = AlignmentResult::new(vec![
            WordVerdict::matched("i"),
            WordVerdict::inserted("uh"),
            WordVerdict::substituted("worked", "work"),
            WordVerdict::omitted("yesterday"),
        ]);
        assert_eq!(
            result.reconstruct_reference(),
            vec!["i".to_string(), "worked".to_string(), "yesterday".to_string()]
        );
        assert_eq!(
            result.reconstruct_spoken(),
            vec!["i".to_string(), "uh".to_string(), "work".to_string()]
        );
    }

    #[test]
    fn test_word_verdict_json_shape() {
        let json = serde_json::to_string(&WordVerdict::omitted("team")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["reference"], "team");
        assert_eq!(parsed["verdict"], "omission");
        assert!(parsed.get("spoken").is_none());
    }
}
