use crate::types::{AlignmentResult, WordVerdict};

/// バックトラック用に記録する遷移の種類
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    /// 斜め移動: Match または Substitution
    Diagonal,
    /// 縦移動: 期待文側の単語を消費（Omission）
    Up,
    /// 横移動: 発話側の単語を消費（Insertion）
    Left,
}

/// 単語単位のアライメント（Levenshtein DP）
///
/// 期待文と発話の単語列を最小編集距離で対応付け、各位置を
/// Match / Substitution / Omission / Insertion に分類する。
///
/// # アルゴリズム
///
/// 1. サイズ (|reference|+1) × (|spoken|+1) のコスト表を構築
/// 2. 一致コスト0（大文字小文字を無視して比較）、置換/脱落/挿入は各コスト1
/// 3. (|reference|, |spoken|) から (0, 0) へバックトラックし、
///    1ステップごとに判定を1件生成して最後に反転
///
/// # タイブレーク
///
/// 最小コストの経路が複数ある場合、斜め移動（Match/Substitution）を
/// 縦横より優先し、縦横が同コストなら縦移動（期待文側を先に消費）を
/// 選ぶ。同一入力に対して常に同一の結果を返す。
///
/// # 計算量
///
/// 時間・空間ともに O(|reference| × |spoken|)。対象は高々数十語の
/// 文なので問題にならない。
///
/// どちらか（あるいは両方）が空列でも正しく動作する全域関数であり、
/// エラーを返すことはない。
///
/// # Examples
///
/// ```
/// # use hatsuon_coach::align::align;
/// # use hatsuon_coach::types::Verdict;
/// let reference = vec!["good".to_string(), "morning".to_string()];
/// let spoken = vec!["good".to_string(), "mourning".to_string()];
/// let result = align(&reference, &spoken);
/// assert_eq!(result.verdicts()[0].verdict, Verdict::Match);
/// assert_eq!(result.verdicts()[1].verdict, Verdict::Substitution);
/// ```
pub fn align(reference: &[String], spoken: &[String]) -> AlignmentResult {
    let m = reference.len();
    let n = spoken.len();

    // cost[i][j]: reference[0..i) と spoken[0..j) を対応付ける最小編集数
    let mut cost = vec![vec![0u32; n + 1]; m + 1];
    let mut step = vec![vec![Step::Diagonal; n + 1]; m + 1];

    for i in 1..=m {
        cost[i][0] = i as u32;
        step[i][0] = Step::Up;
    }
    for j in 1..=n {
        cost[0][j] = j as u32;
        step[0][j] = Step::Left;
    }

    for i in 1..=m {
        for j in 1..=n {
            let sub_cost = if words_equal(&reference[i - 1], &spoken[j - 1]) {
                0
            } else {
                1
            };
            let diagonal = cost[i - 1][j - 1] + sub_cost;
            let up = cost[i - 1][j] + 1;
            let left = cost[i][j - 1] + 1;

            // 優先順: 斜め → 縦（Omission） → 横（Insertion）
            let best = diagonal.min(up).min(left);
            let chosen = if diagonal == best {
                Step::Diagonal
            } else if up == best {
                Step::Up
            } else {
                Step::Left
            };

            cost[i][j] = best;
            step[i][j] = chosen;
        }
    }

    // バックトラックで判定を逆順に生成
    let mut verdicts = Vec::with_capacity(m.max(n));
    let mut i = m;
    let mut j = n;
    while i > 0 || j > 0 {
        match step[i][j] {
            Step::Diagonal => {
                let reference_word = &reference[i - 1];
                let spoken_word = &spoken[j - 1];
                if words_equal(reference_word, spoken_word) {
                    verdicts.push(WordVerdict::matched(reference_word.clone()));
                } else {
                    verdicts.push(WordVerdict::substituted(
                        reference_word.clone(),
                        spoken_word.clone(),
                    ));
                }
                i -= 1;
                j -= 1;
            }
            Step::Up => {
                verdicts.push(WordVerdict::omitted(reference[i - 1].clone()));
                i -= 1;
            }
            Step::Left => {
                verdicts.push(WordVerdict::inserted(spoken[j - 1].clone()));
                j -= 1;
            }
        }
    }
    verdicts.reverse();

    AlignmentResult::new(verdicts)
}

/// 大文字小文字を無視した単語比較
fn words_equal(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// テキストを比較用の単語列に正規化
///
/// 句読点を除去し、小文字化して空白で分割する。文字起こし結果と
/// 期待文の両方に適用してからアライメントに渡す。
///
/// # Examples
///
/// ```
/// # use hatsuon_coach::align::normalize_words;
/// let words = normalize_words("Hello, world!");
/// assert_eq!(words, vec!["hello".to_string(), "world".to_string()]);
/// ```
pub fn normalize_words(text: &str) -> Vec<String> {
    text.chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Verdict;

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_both_empty() {
        let result = align(&[], &[]);
        assert!(result.is_empty());
    }

    #[test]
    fn test_identity() {
        let reference = words(&["i", "fixed", "the", "bug", "yesterday"]);
        let result = align(&reference, &reference);
        assert_eq!(result.len(), reference.len());
        assert!(result.is_perfect());
    }

    #[test]
    fn test_case_insensitive_match() {
        let result = align(&words(&["Hello"]), &words(&["hello"]));
        assert_eq!(result.len(), 1);
        assert_eq!(result.verdicts()[0].verdict, Verdict::Match);
    }

    #[test]
    fn test_total_omission() {
        let result = align(&words(&["hello", "world"]), &[]);
        assert_eq!(
            result.verdicts(),
            &[WordVerdict::omitted("hello"), WordVerdict::omitted("world")]
        );
    }

    #[test]
    fn test_total_insertion() {
        let result = align(&[], &words(&["hello"]));
        assert_eq!(result.verdicts(), &[WordVerdict::inserted("hello")]);
    }

    #[test]
    fn test_single_substitution() {
        let result = align(&words(&["cat"]), &words(&["bat"]));
        assert_eq!(result.verdicts(), &[WordVerdict::substituted("cat", "bat")]);
    }

    #[test]
    fn test_tie_break_consumes_reference_first() {
        // 最小コストの経路が複数あるケース。脱落は後ろの "b" に付く
        let result = align(&words(&["a", "b"]), &words(&["a"]));
        assert_eq!(
            result.verdicts(),
            &[WordVerdict::matched("a"), WordVerdict::omitted("b")]
        );
    }

    #[test]
    fn test_repeated_words_matched_independently() {
        let reference = words(&["very", "very", "good"]);
        let spoken = words(&["very", "good"]);
        let result = align(&reference, &spoken);
        assert_eq!(result.mistake_count(), 1);
        assert_eq!(
            result
                .verdicts()
                .iter()
                .filter(|v| v.verdict == Verdict::Match)
                .count(),
            2
        );
        assert_eq!(result.reconstruct_reference(), reference);
        assert_eq!(result.reconstruct_spoken(), spoken);
    }

    #[test]
    fn test_mixed_alignment() {
        let reference = words(&["i", "am", "working", "on", "the", "backend"]);
        let spoken = words(&["i", "am", "uh", "working", "on", "backend"]);
        let result = align(&reference, &spoken);

        assert_eq!(result.reconstruct_reference(), reference);
        assert_eq!(result.reconstruct_spoken(), spoken);
        assert_eq!(result.mistake_count(), 2); // "uh" の挿入と "the" の脱落
    }

    #[test]
    fn test_reconstruction_invariants() {
        let cases: Vec<(Vec<String>, Vec<String>)> = vec![
            (words(&["a", "b", "c"]), words(&["a", "x", "c", "d"])),
            (words(&["one"]), words(&["two", "three"])),
            (vec![], words(&["stray"])),
            (words(&["only", "reference"]), vec![]),
            (words(&["same", "same"]), words(&["same", "same"])),
        ];

        for (reference, spoken) in cases {
            let result = align(&reference, &spoken);
            assert_eq!(result.reconstruct_reference(), reference);
            assert_eq!(result.reconstruct_spoken(), spoken);
            for verdict in &result {
                assert!(verdict.reference.is_some() || verdict.spoken.is_some());
            }
        }
    }

    #[test]
    fn test_normalize_words() {
        assert_eq!(
            normalize_words("Hello, World! It's me."),
            words(&["hello", "world", "its", "me"])
        );
        assert_eq!(normalize_words(""), Vec::<String>::new());
        assert_eq!(normalize_words("   "), Vec::<String>::new());
    }
}
