use crate::types::{AlignmentResult, Verdict};
use crossterm::style::Stylize;

/// 発話行の色付きレンダリング
///
/// 正しく発音できた単語は緑、言い間違い・余分な単語は赤、
/// 言い落とした単語は括弧付きのグレーで表示する。
pub fn render_spoken_line(result: &AlignmentResult) -> String {
    let mut parts = Vec::with_capacity(result.len());

    for verdict in result {
        match verdict.verdict {
            Verdict::Match => {
                if let Some(word) = &verdict.spoken {
                    parts.push(format!("{}", word.as_str().green()));
                }
            }
            Verdict::Substitution | Verdict::Insertion => {
                if let Some(word) = &verdict.spoken {
                    parts.push(format!("{}", word.as_str().red()));
                }
            }
            Verdict::Omission => {
                if let Some(word) = &verdict.reference {
                    parts.push(format!("{}", format!("({})", word).dark_grey()));
                }
            }
        }
    }

    parts.join(" ")
}

/// 誤りの一覧（1誤り1行）
pub fn render_mistakes(result: &AlignmentResult) -> Vec<String> {
    let mut lines = Vec::new();

    for verdict in result {
        match verdict.verdict {
            Verdict::Match => {}
            Verdict::Substitution => {
                let reference = verdict.reference.as_deref().unwrap_or_default();
                let spoken = verdict.spoken.as_deref().unwrap_or_default();
                lines.push(format!(
                    "言い間違い: {} → {}",
                    reference.yellow(),
                    spoken.red()
                ));
            }
            Verdict::Omission => {
                let reference = verdict.reference.as_deref().unwrap_or_default();
                lines.push(format!("言い落とし: {}", reference.yellow()));
            }
            Verdict::Insertion => {
                let spoken = verdict.spoken.as_deref().unwrap_or_default();
                lines.push(format!("余分な単語: {}", spoken.red()));
            }
        }
    }

    lines
}

/// ターンのまとめ行
pub fn render_summary(result: &AlignmentResult) -> String {
    if result.is_perfect() {
        format!("{}", "✅ 完璧です！次の会話に進みましょう。".green())
    } else {
        format!(
            "{}",
            format!("⚠️ {} 箇所の誤りがあります。もう一度挑戦してみてください。", result.mistake_count()).red()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlignmentResult, WordVerdict};

    fn sample_result() -> AlignmentResult {
        AlignmentResult::new(vec![
            WordVerdict::matched("good"),
            WordVerdict::substituted("morning", "mourning"),
            WordVerdict::omitted("team"),
            WordVerdict::inserted("uh"),
        ])
    }

    #[test]
    fn test_spoken_line_contains_all_words() {
        let line = render_spoken_line(&sample_result());
        assert!(line.contains("good"));
        assert!(line.contains("mourning"));
        assert!(line.contains("(team)"));
        assert!(line.contains("uh"));
    }

    #[test]
    fn test_mistakes_one_line_each() {
        let lines = render_mistakes(&sample_result());
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("morning"));
        assert!(lines[0].contains("mourning"));
        assert!(lines[1].contains("team"));
        assert!(lines[2].contains("uh"));
    }

    #[test]
    fn test_summary_perfect() {
        let result = AlignmentResult::new(vec![WordVerdict::matched("hello")]);
        assert!(render_summary(&result).contains("完璧"));
        assert!(render_summary(&sample_result()).contains("3 箇所"));
    }
}
